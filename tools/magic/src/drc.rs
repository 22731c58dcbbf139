//! Run design rule checking (DRC) using Magic.

use crate::utils::{OutputFiles, execute_run_script};
use crate::{TEMPLATES, error::Error};
use anyhow::anyhow;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tera::Context;

/// Marker printed by the generated Tcl script once every command has run.
pub const COMPLETION_MARKER: &str = "__precheck_magic_drc_complete_0";

/// Parameters for running DRC using Magic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrcParams<'a> {
    /// The name of the cell to DRC check.
    pub cell_name: &'a str,
    /// The working directory.
    pub work_dir: &'a Path,
    /// The path to the GDS layout file, which must contain a cell named `cell_name`.
    pub gds_path: &'a Path,
    /// The Magic startup file selecting the technology.
    pub rcfile_path: &'a Path,
    /// Exported as `PDK_ROOT` for the startup file, if given.
    pub pdk_root: Option<&'a Path>,
    /// The path to which the DRC report should be written.
    pub drc_report_path: &'a Path,
    /// If given, the checked cell is saved here in Magic's native format.
    pub mag_path: Option<&'a Path>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DrcRunsetContext<'a> {
    cell_name: &'a str,
    work_dir: &'a Path,
    gds_path: &'a Path,
    rcfile_path: &'a Path,
    pdk_root: Option<&'a Path>,
    drc_report_path: &'a Path,
    mag_path: Option<&'a Path>,
    tcl_path: &'a Path,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrcGeneratedPaths {
    pub tcl_path: PathBuf,
    pub run_script_path: PathBuf,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DrcData {
    pub rule_checks: Vec<RuleCheck>,
}

impl DrcData {
    /// Total number of DRC errors across all rules.
    pub fn num_violations(&self) -> usize {
        self.rule_checks
            .iter()
            .map(|rc| rc.num_results as usize)
            .sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleCheck {
    pub reason: String,
    pub num_results: u32,
}

pub fn write_drc_files(params: &DrcParams) -> Result<DrcGeneratedPaths, Error> {
    fs::create_dir_all(params.work_dir)?;

    let tcl_path = params.work_dir.join("drc.tcl");
    let run_script_path = params.work_dir.join("run_magic.sh");

    let context = DrcRunsetContext {
        cell_name: params.cell_name,
        work_dir: params.work_dir,
        gds_path: params.gds_path,
        rcfile_path: params.rcfile_path,
        pdk_root: params.pdk_root,
        drc_report_path: params.drc_report_path,
        mag_path: params.mag_path,
        tcl_path: &tcl_path,
    };

    let context = Context::from_serialize(context)?;

    let contents = TEMPLATES.render("drc.tcl", &context)?;
    fs::write(&tcl_path, contents)?;

    let contents = TEMPLATES.render("run_magic.sh", &context)?;
    fs::write(&run_script_path, contents)?;

    Ok(DrcGeneratedPaths {
        tcl_path,
        run_script_path,
    })
}

/// Parses a report of alternating reason and error-count lines.
///
/// Rules with no errors are omitted from the result.
pub fn parse_drc_results(report_path: impl AsRef<Path>) -> Result<DrcData, Error> {
    let file = fs::File::open(&report_path)?;
    let rule_checks: Result<Vec<RuleCheck>, Error> = std::io::BufReader::new(file)
        .lines()
        .tuples()
        .map(|(reason, count)| -> Result<RuleCheck, Error> {
            let reason = reason?;
            let count = count?;
            let count = count
                .trim()
                .parse()
                .map_err(|e| anyhow!("failed to parse error count `{count}`: {e:?}"))?;
            Ok(RuleCheck {
                reason,
                num_results: count,
            })
        })
        .filter(|rc| rc.as_ref().map(|rc| rc.num_results > 0).unwrap_or(true))
        .collect();
    Ok(DrcData {
        rule_checks: rule_checks?,
    })
}

/// Run DRC using Magic.
pub fn run_drc(params: &DrcParams) -> Result<DrcData, Error> {
    let DrcGeneratedPaths {
        run_script_path, ..
    } = write_drc_files(params)?;
    let output_files: OutputFiles = execute_run_script(&run_script_path, params.work_dir, "drc")?;
    // Magic sometimes exits with exit code 0 even if one of the Tcl commands had an error.
    // This checks that Magic reached and executed the final Tcl command.
    if !fs::read_to_string(&output_files.stdout)?.contains(COMPLETION_MARKER) {
        return Err(anyhow!("magic did not complete successfully").into());
    }
    parse_drc_results(params.drc_report_path)
}

//! Run KLayout DRC runsets in batch mode.

use crate::rdb::{self, ReportDatabase};
use crate::utils::execute_run_script;
use crate::{TEMPLATES, error::Error};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;

pub struct DrcParams<'a> {
    pub work_dir: &'a Path,
    /// The GDS file passed to the runset as `input`.
    pub layout_path: &'a Path,
    /// The `.drc` script to run.
    pub runset_path: &'a Path,
    /// The report database the runset writes, passed as `report`.
    pub report_path: &'a Path,
    /// Additional `-rd name=value` variables, in order.
    pub variables: &'a IndexMap<String, String>,
}

#[derive(Serialize)]
struct RunVariable<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct DrcRunsetContext<'a> {
    work_dir: &'a Path,
    layout_path: &'a Path,
    runset_path: &'a Path,
    report_path: &'a Path,
    variables: Vec<RunVariable<'a>>,
}

pub fn write_drc_run_script(params: &DrcParams, name: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(params.work_dir)?;

    let run_script_path = params.work_dir.join(format!("run_{name}.sh"));

    let context = DrcRunsetContext {
        work_dir: params.work_dir,
        layout_path: params.layout_path,
        runset_path: params.runset_path,
        report_path: params.report_path,
        variables: params
            .variables
            .iter()
            .map(|(name, value)| RunVariable { name, value })
            .collect(),
    };
    let context = Context::from_serialize(context)?;

    let contents = TEMPLATES.render("run_klayout.sh", &context)?;
    fs::write(&run_script_path, contents)?;

    Ok(run_script_path)
}

/// Runs a DRC runset and loads the report database it produces.
///
/// `name` distinguishes the run script and log files of runs sharing a working directory.
pub fn run_drc(params: &DrcParams, name: &str) -> Result<ReportDatabase, Error> {
    if let Some(parent) = params.report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let run_script_path = write_drc_run_script(params, name)?;
    execute_run_script(&run_script_path, params.work_dir, name)?;
    rdb::load(params.report_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_script_passes_variables_in_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let variables = IndexMap::from([
            ("thr".to_string(), "8".to_string()),
            ("top_cell".to_string(), "tt_um_example".to_string()),
        ]);
        let params = DrcParams {
            work_dir: dir.path(),
            layout_path: Path::new("/designs/tt_um_example.gds"),
            runset_path: Path::new("/tech-files/nwell_urpm.drc"),
            report_path: Path::new("/reports/drc_nwell_urpm.xml"),
            variables: &variables,
        };
        let script = fs::read_to_string(write_drc_run_script(&params, "nwell_urpm")?)?;

        assert!(script.contains("klayout -b -r '/tech-files/nwell_urpm.drc'"));
        assert!(script.contains("-rd 'input=/designs/tt_um_example.gds'"));
        assert!(script.contains("-rd 'report=/reports/drc_nwell_urpm.xml'"));
        let thr = script.find("-rd 'thr=8'").unwrap();
        let top = script.find("-rd 'top_cell=tt_um_example'").unwrap();
        assert!(thr < top);
        Ok(())
    }

    #[test]
    #[ignore = "requires klayout and the precheck DRC runsets"]
    fn run_zero_area_check() -> anyhow::Result<()> {
        let gds = std::env::var("PRECHECK_TEST_GDS")?;
        let runset = std::env::var("PRECHECK_ZEROAREA_DRC")?;
        let dir = tempfile::tempdir()?;
        let report = dir.path().join("drc_zero_area.xml");
        let variables = IndexMap::from([("zero_area".to_string(), "true".to_string())]);
        let rdb = run_drc(
            &DrcParams {
                work_dir: dir.path(),
                layout_path: Path::new(&gds),
                runset_path: Path::new(&runset),
                report_path: &report,
                variables: &variables,
            },
            "zero_area",
        )?;
        assert!(rdb.is_empty());
        Ok(())
    }
}

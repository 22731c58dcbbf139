//! Adapters for external rule engines.
//!
//! An engine runs as a separate process and reports a number of violations.
//! A process that fails to run to completion is a tooling failure, distinct
//! from a clean run that finds violations.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::check::{CheckFailure, CheckResult};
use crate::config::PrecheckConfig;

/// One invocation of a rule engine.
#[derive(Debug, Clone)]
pub struct EngineRun<'a> {
    /// Short name of the rule computation, e.g. `feol`.
    ///
    /// Used in diagnostics and to name the engine's report file.
    pub name: &'a str,
    /// The rule script to run, for engines that take one.
    pub runset: Option<&'a str>,
    pub layout_path: &'a Path,
    pub top_cell: &'a str,
    /// Named parameters passed to the engine, in order.
    pub variables: IndexMap<String, String>,
}

/// Errors from running an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Magic(#[from] magic::error::Error),
    #[error(transparent)]
    KLayout(#[from] klayout::error::Error),
    #[error("{0}")]
    Other(String),
}

/// An external geometric or electrical rule engine.
pub trait RuleEngine {
    /// Name of the engine used in diagnostics.
    fn label(&self) -> &str;

    /// Runs the engine to completion, returning the number of reported violations.
    fn run(&self, run: &EngineRun<'_>) -> Result<usize, EngineError>;
}

/// Runs `run` on `engine` and fails if the engine breaks or reports any violation.
pub fn check_with_engine(engine: &dyn RuleEngine, run: &EngineRun<'_>) -> CheckResult {
    let label = engine.label();
    tracing::info!(
        engine = label,
        layout = %run.layout_path.display(),
        "running {label} {}",
        run.name
    );
    match engine.run(run) {
        Err(e) => Err(CheckFailure::tooling(format!(
            "{label} {} failed: {e}",
            run.name
        ))),
        Ok(0) => Ok(()),
        Ok(n) => Err(CheckFailure::violation(format!(
            "{label} {} failed with {n} DRC violations",
            run.name
        ))),
    }
}

/// DRC with Magic, using the PDK's startup file.
#[derive(Debug, Clone)]
pub struct MagicEngine {
    rcfile_path: PathBuf,
    pdk_root: PathBuf,
    reports_dir: PathBuf,
    work_dir: PathBuf,
}

impl MagicEngine {
    pub fn new(config: &PrecheckConfig) -> Self {
        Self {
            rcfile_path: config.magicrc_path(),
            pdk_root: config.pdk_root.clone(),
            reports_dir: config.reports_dir.clone(),
            work_dir: config.work_dir.join("magic"),
        }
    }

    /// The native report written by a run named `name`.
    pub fn report_path(&self, name: &str) -> PathBuf {
        self.reports_dir
            .join(format!("magic_{}.txt", name.to_lowercase()))
    }
}

impl RuleEngine for MagicEngine {
    fn label(&self) -> &str {
        "Magic"
    }

    fn run(&self, run: &EngineRun<'_>) -> Result<usize, EngineError> {
        std::fs::create_dir_all(&self.reports_dir).map_err(magic::error::Error::from)?;
        let report_path = self.report_path(run.name);
        let mag_path = report_path.with_extension("mag");
        let data = magic::drc::run_drc(&magic::drc::DrcParams {
            cell_name: run.top_cell,
            work_dir: &self.work_dir,
            gds_path: run.layout_path,
            rcfile_path: &self.rcfile_path,
            pdk_root: Some(&self.pdk_root),
            drc_report_path: &report_path,
            mag_path: Some(&mag_path),
        })?;
        for rc in &data.rule_checks {
            tracing::debug!(count = rc.num_results, "{}", rc.reason);
        }
        Ok(data.num_violations())
    }
}

/// Batch-mode DRC with KLayout runsets from the tech files directory.
#[derive(Debug, Clone)]
pub struct KLayoutEngine {
    config: PrecheckConfig,
    work_dir: PathBuf,
}

impl KLayoutEngine {
    pub fn new(config: &PrecheckConfig) -> Self {
        Self {
            config: config.clone(),
            work_dir: config.work_dir.join("klayout"),
        }
    }

    /// The report database written by a run named `name`.
    pub fn report_path(&self, name: &str) -> PathBuf {
        self.config.reports_dir.join(format!("drc_{name}.xml"))
    }
}

impl RuleEngine for KLayoutEngine {
    fn label(&self) -> &str {
        "KLayout"
    }

    fn run(&self, run: &EngineRun<'_>) -> Result<usize, EngineError> {
        let runset = run
            .runset
            .ok_or_else(|| EngineError::Other(format!("no runset given for {}", run.name)))?;
        let runset_path = self.config.runset_path(runset);
        let report_path = self.report_path(run.name);
        let rdb = klayout::drc::run_drc(
            &klayout::drc::DrcParams {
                work_dir: &self.work_dir,
                layout_path: run.layout_path,
                runset_path: &runset_path,
                report_path: &report_path,
                variables: &run.variables,
            },
            run.name,
        )?;
        for rc in &rdb.rule_checks {
            tracing::debug!(count = rc.num_results, "{}", rc.name);
        }
        Ok(rdb.num_items())
    }
}

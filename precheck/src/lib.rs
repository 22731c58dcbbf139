//! Tapeout prechecks for Tiny Tapeout GDS submissions.
//!
//! A run resolves the layout artifact, loads the project metadata next to it,
//! and executes a fixed battery of checks. Every check runs regardless of
//! earlier failures, and the results are written as a JUnit document and a
//! markdown summary.

use std::path::{Path, PathBuf};

use layout::Layout;

use crate::artifact::LayoutArtifact;
use crate::checks::{CheckContext, Engines};
use crate::config::PrecheckConfig;
use crate::engine::{KLayoutEngine, MagicEngine};
use crate::error::{Error, Result};
use crate::project::ProjectInfo;
use crate::report::{Report, ReportPaths};
use crate::tech::TechProfile;

pub mod artifact;
pub mod check;
pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod project;
pub mod report;
pub mod runner;
pub mod tech;

#[cfg(test)]
mod tests;

/// Validated inputs of a precheck run.
#[derive(Debug)]
pub struct Precheck {
    config: PrecheckConfig,
    artifact: LayoutArtifact,
    project: ProjectInfo,
    tech: TechProfile,
    layout: Layout,
    lef_path: PathBuf,
    verilog_path: PathBuf,
    mr_runset: String,
}

impl Precheck {
    /// Resolves and loads every input, failing before any check runs if one is unusable.
    pub fn prepare(mut config: PrecheckConfig, layout_path: impl AsRef<Path>) -> Result<Self> {
        config.reports_dir = absolute(&config.reports_dir)?;
        config.tech_files_dir = absolute(&config.tech_files_dir)?;
        config.work_dir = absolute(&config.work_dir)?;

        let artifact = LayoutArtifact::resolve(absolute(layout_path.as_ref())?)?;
        let info_path = ProjectInfo::find(artifact.dir())?;
        tracing::info!(path = %info_path.display(), "loading project metadata");
        let project = ProjectInfo::load(&info_path)?;
        project.validate(artifact.stem())?;

        tracing::info!(path = %artifact.source().display(), "loading layout");
        let layout = Layout::open(artifact.gds_path())?;
        tracing::info!(
            top = %layout.top_cell().name(),
            cells = layout.cells().count(),
            "loaded layout"
        );
        let unflattened = layout.unsupported_refs().count();
        if unflattened > 0 {
            tracing::warn!(
                references = unflattened,
                "layout contains references that geometry checks cannot flatten"
            );
        }

        let tech = TechProfile::new(config.tech);
        let mr_runset = config.mr_runset();
        tracing::info!(
            magicrc = %config.magicrc_path().display(),
            lyp = %config.lyp_path().display(),
            runsets = %config.tech_files_dir.display(),
            mr_runset = %mr_runset,
            "using PDK technology files"
        );
        Ok(Self {
            mr_runset,
            config,
            lef_path: artifact.lef_path(),
            verilog_path: artifact.verilog_path(),
            artifact,
            project,
            tech,
            layout,
        })
    }

    pub fn config(&self) -> &PrecheckConfig {
        &self.config
    }

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn context(&self) -> CheckContext<'_> {
        CheckContext {
            layout: &self.layout,
            project: &self.project,
            tech: &self.tech,
            gds_path: self.artifact.gds_path(),
            lef_path: &self.lef_path,
            verilog_path: &self.verilog_path,
            mr_runset: &self.mr_runset,
            threads: self.config.threads,
        }
    }

    /// Runs the battery against the given engines.
    pub fn run_with(&self, engines: Engines<'_>) -> Result<Report> {
        let checks = checks::battery(self.context(), engines)?;
        tracing::info!(checks = checks.len(), "running prechecks");
        Ok(runner::run(&checks))
    }

    /// Runs the battery with Magic and KLayout.
    pub fn run(&self) -> Result<Report> {
        let magic = MagicEngine::new(&self.config);
        let klayout = KLayoutEngine::new(&self.config);
        self.run_with(Engines {
            magic: &magic,
            klayout: &klayout,
        })
    }

    /// Writes the result documents to the reports directory and logs the summary.
    ///
    /// Returns the exit code of the checks. Failing to write the documents is
    /// logged but leaves the exit code unchanged.
    pub fn finish(&self, report: &Report) -> u8 {
        tracing::info!("{}", report.to_markdown());
        match report.write(&self.config.reports_dir) {
            Ok(ReportPaths { junit, markdown }) => tracing::info!(
                junit = %junit.display(),
                markdown = %markdown.display(),
                "wrote reports"
            ),
            Err(e) => tracing::error!("failed to write reports: {e}"),
        }
        if report.passed() {
            tracing::info!("precheck passed");
        } else {
            tracing::error!(failures = report.num_failures(), "precheck failed");
        }
        report.exit_code()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

//! Run configuration and derived tool paths.

use std::path::{Path, PathBuf};

use crate::tech::Tech;

/// The default PDK variant.
pub const DEFAULT_PDK_NAME: &str = "sky130A";

/// Settings for one precheck run.
#[derive(Debug, Clone)]
pub struct PrecheckConfig {
    /// Root of the installed PDKs, usually taken from `PDK_ROOT`.
    pub pdk_root: PathBuf,
    pub pdk_name: String,
    pub tech: Tech,
    /// Where result documents and native engine reports are written.
    pub reports_dir: PathBuf,
    /// Directory containing the KLayout DRC runsets.
    pub tech_files_dir: PathBuf,
    /// Scratch directory for generated run scripts and tool logs.
    pub work_dir: PathBuf,
    /// Worker threads requested from engines that support them.
    pub threads: usize,
}

impl PrecheckConfig {
    /// A configuration with default directories relative to the current directory.
    pub fn new(pdk_root: impl Into<PathBuf>) -> Self {
        Self {
            pdk_root: pdk_root.into(),
            pdk_name: DEFAULT_PDK_NAME.to_string(),
            tech: Tech::default(),
            reports_dir: PathBuf::from("reports"),
            tech_files_dir: PathBuf::from("tech-files"),
            work_dir: PathBuf::from("reports/work"),
            threads: default_threads(),
        }
    }

    fn libs_tech(&self) -> PathBuf {
        self.pdk_root.join(&self.pdk_name).join("libs.tech")
    }

    /// The Magic startup file for the configured PDK.
    pub fn magicrc_path(&self) -> PathBuf {
        self.libs_tech()
            .join("magic")
            .join(format!("{}.magicrc", self.pdk_name))
    }

    /// The KLayout layer properties file for the configured PDK.
    pub fn lyp_path(&self) -> PathBuf {
        self.libs_tech()
            .join("klayout/tech")
            .join(format!("{}.lyp", self.pdk_name))
    }

    /// Resolves a runset file name against the tech files directory.
    pub fn runset_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.tech_files_dir.join(name)
    }

    /// Name of the PDK's main KLayout DRC runset.
    pub fn mr_runset(&self) -> String {
        format!("{}_mr.drc", self.pdk_name)
    }
}

/// The number of available processing units, or 1 if unknown.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdk_paths() {
        let config = PrecheckConfig::new("/opt/pdk");
        assert_eq!(
            config.magicrc_path(),
            PathBuf::from("/opt/pdk/sky130A/libs.tech/magic/sky130A.magicrc")
        );
        assert_eq!(
            config.lyp_path(),
            PathBuf::from("/opt/pdk/sky130A/libs.tech/klayout/tech/sky130A.lyp")
        );
        assert_eq!(config.mr_runset(), "sky130A_mr.drc");
        assert_eq!(
            config.runset_path("nwell_urpm.drc"),
            PathBuf::from("tech-files/nwell_urpm.drc")
        );
        assert!(config.threads >= 1);
    }
}

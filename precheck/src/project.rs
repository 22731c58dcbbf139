//! Project metadata from `info.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Error, Result};

/// File name of the project metadata document.
pub const INFO_FILE: &str = "info.yaml";

/// Number of analog pin slots on a tile.
pub const ANALOG_PIN_SLOTS: u8 = 8;

#[derive(Debug, Deserialize)]
struct InfoYaml {
    project: ProjectSection,
    #[serde(default)]
    pinout: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    top_module: Option<String>,
    wokwi_id: Option<Value>,
    #[serde(default = "default_tiles")]
    tiles: String,
    #[serde(default)]
    analog_pins: u8,
    #[serde(default)]
    uses_3v3: bool,
}

fn default_tiles() -> String {
    "1x1".to_string()
}

/// Parsed project metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub top_module: String,
    /// Tile footprint, such as `1x2`.
    pub tiles: String,
    pub analog_pins: u8,
    /// Whether the project uses the 3.3V analog supply.
    pub uses_3v3: bool,
    /// Pin roles keyed by pin name (e.g. `ua[0]`). Unset roles are empty strings.
    pub pinout: IndexMap<String, String>,
}

impl ProjectInfo {
    /// Parses metadata from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let info: InfoYaml = serde_yaml::from_str(yaml)?;
        let project = info.project;
        let top_module = project.top_module.unwrap_or_else(|| {
            let wokwi_id = project
                .wokwi_id
                .as_ref()
                .map(scalar_to_string)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| "0".to_string());
            format!("tt_um_wokwi_{wokwi_id}")
        });
        let pinout = info
            .pinout
            .into_iter()
            .map(|(pin, role)| (pin, scalar_to_string(&role)))
            .collect();
        Ok(Self {
            top_module,
            tiles: project.tiles,
            analog_pins: project.analog_pins,
            uses_3v3: project.uses_3v3,
            pinout,
        })
    }

    /// Reads and parses the metadata file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml).map_err(|source| Error::InvalidInfo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Finds the nearest `info.yaml` in `start` or one of its ancestors.
    pub fn find(start: impl AsRef<Path>) -> Result<PathBuf> {
        let start = start.as_ref();
        start
            .ancestors()
            .map(|dir| dir.join(INFO_FILE))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| Error::InfoNotFound(start.to_path_buf()))
    }

    pub fn is_analog(&self) -> bool {
        self.analog_pins > 0
    }

    /// The declared role of analog pin `slot`, if it has one.
    pub fn analog_pin_role(&self, slot: u8) -> Option<&str> {
        self.pinout
            .get(&format!("ua[{slot}]"))
            .map(String::as_str)
            .filter(|role| !role.is_empty())
    }

    /// Checks metadata consistency and that the layout is named after the top module.
    pub fn validate(&self, layout_stem: &str) -> Result<()> {
        if self.uses_3v3 && !self.is_analog() {
            return Err(Error::ThreeVoltsWithoutAnalog);
        }
        if self.analog_pins > ANALOG_PIN_SLOTS {
            return Err(Error::TooManyAnalogPins(self.analog_pins));
        }
        if self.top_module != layout_stem {
            return Err(Error::TopModuleMismatch {
                top_module: self.top_module.clone(),
                stem: layout_stem.to_string(),
            });
        }
        Ok(())
    }
}

/// Renders a YAML scalar as text; null and `false` become the empty string.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

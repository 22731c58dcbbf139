//! Precondition failures.
//!
//! These abort a run before any check executes.

use std::path::PathBuf;

use arcstr::ArcStr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("layout file `{0}` not found")]
    ArtifactNotFound(PathBuf),
    #[error("layout file extension is neither .gds nor .gds.br: `{0}`")]
    UnrecognizedExtension(PathBuf),
    #[error("failed to decompress `{path}`: {source}")]
    Decompress {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("info.yaml not found in `{0}` or any of its parents")]
    InfoNotFound(PathBuf),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project metadata in `{path}`: {source}")]
    InvalidInfo {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("top module `{top_module}` does not match layout file name `{stem}`")]
    TopModuleMismatch { top_module: String, stem: String },
    #[error("Projects with 3v3 power need at least one analog pin")]
    ThreeVoltsWithoutAnalog,
    #[error("analog_pins is {0}, but only 8 analog pins are available")]
    TooManyAnalogPins(u8),
    #[error("PDK_ROOT environment variable not set")]
    MissingPdkRoot,
    #[error("failed to load layout: {0}")]
    Layout(#[from] layout::Error),
    #[error("duplicate check name `{0}`")]
    DuplicateCheck(ArcStr),
    #[error("failed to render report: {0}")]
    Xml(#[from] quick_xml::Error),
}

//! Layout error types.

use std::path::PathBuf;

use arcstr::ArcStr;

pub type Result<T> = std::result::Result<T, Error>;

/// An error encountered while loading or validating a layout.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read GDS file `{path}`: {message}")]
    Read { path: PathBuf, message: String },
    #[error("duplicate cell name: `{0}`")]
    DuplicateCell(ArcStr),
    #[error("cell `{cell}` instantiates undefined cell `{child}`")]
    UndefinedCell { cell: ArcStr, child: ArcStr },
    #[error("cell hierarchy contains a cycle through `{0}`")]
    Cycle(ArcStr),
    #[error("layout has no top-level cell")]
    NoTopCell,
    #[error("layout top level not unique: found {}", .0.join(", "))]
    MultipleTopCells(Vec<String>),
    #[error("unsupported GDS element in cell `{cell}`: {reason}")]
    Unsupported { cell: ArcStr, reason: String },
}

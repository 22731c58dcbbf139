//! Confinement of all geometry to the project area.

use geometry::bbox::Bbox;
use layout::Layout;

use crate::check::{CheckFailure, CheckResult};
use crate::checks::require_flattenable;
use crate::tech::TechProfile;

/// Fails unless the flattened top cell has exactly the extent of its boundary layer.
pub fn boundary_check(layout: &Layout, tech: &TechProfile) -> CheckResult {
    if layout.top_cells().len() != 1 {
        return Err(CheckFailure::violation("GDS top level not unique"));
    }
    require_flattenable(layout)?;

    let flat = layout.flatten();
    let extent = flat.bbox();
    let boundary = flat.on_layer(tech.boundary().layer).bbox();
    tracing::debug!(?extent, ?boundary, "compared bounding boxes");

    if extent == boundary {
        return Ok(());
    }
    Err(CheckFailure::violation(match (extent, boundary) {
        (Some(extent), Some(boundary)) => {
            format!("Shapes outside project area: layout extent {extent} exceeds boundary {boundary}")
        }
        _ => "Shapes outside project area".to_string(),
    }))
}

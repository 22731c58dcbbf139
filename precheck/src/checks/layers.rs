//! Layer allow-list check.

use itertools::Itertools;
use layout::Layout;

use crate::check::{CheckFailure, CheckResult};
use crate::tech::TechProfile;

pub fn layer_check(layout: &Layout, tech: &TechProfile) -> CheckResult {
    let present = layout.layers();
    let excess: Vec<_> = present.difference(tech.valid_layers()).collect();
    if excess.is_empty() {
        return Ok(());
    }
    Err(CheckFailure::violation(format!(
        "Invalid layers in GDS: {}",
        excess.iter().join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use geometry::prelude::*;
    use layout::{Cell, GdsLayer, LayoutBuilder, Text};

    use super::*;
    use crate::tech::Tech;

    fn layout(extra: Option<GdsLayer>) -> Layout {
        let mut cell = Cell::new("tt_um_example");
        cell.add_rect(GdsLayer(235, 4), Rect::from_sides(0, 0, 100, 100));
        cell.add_rect(GdsLayer(68, 20), Rect::from_sides(0, 0, 10, 10));
        cell.add_text(Text::new(GdsLayer(68, 5), "clk", Point::new(5, 5)));
        if let Some(layer) = extra {
            cell.add_rect(layer, Rect::from_sides(0, 0, 10, 10));
        }
        let mut builder = LayoutBuilder::new();
        builder.add_cell(cell).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn allowed_layers_pass() {
        let tech = TechProfile::new(Tech::Sky130);
        assert_eq!(layer_check(&layout(None), &tech), Ok(()));
    }

    #[test]
    fn excess_layer_is_named() {
        let tech = TechProfile::new(Tech::Sky130);
        let failure = layer_check(&layout(Some(GdsLayer(72, 20))), &tech).unwrap_err();
        assert_eq!(failure.message(), "Invalid layers in GDS: 72/20");
    }
}

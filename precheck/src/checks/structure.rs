//! Top cell name, forbidden layers, and presence of the boundary layer.

use layout::Layout;

use crate::check::{CheckResult, violations};
use crate::project::ProjectInfo;
use crate::tech::TechProfile;

pub fn structure_check(layout: &Layout, project: &ProjectInfo, tech: &TechProfile) -> CheckResult {
    let mut findings = Vec::new();

    let top = layout.top_cell().name();
    if top.as_str() != project.top_module {
        findings.push(format!(
            "Top macro name mismatch: expected {}, got {top}",
            project.top_module
        ));
    }

    for layer in tech.forbidden() {
        if layout.has_layer(layer.layer) {
            findings.push(format!("Forbidden layer {} found", layer.name));
        }
    }

    let boundary = tech.boundary();
    if !layout.has_layer(boundary.layer) {
        findings.push(format!("{boundary} layer not found"));
    }

    violations(findings)
}

#[cfg(test)]
mod tests {
    use geometry::rect::Rect;
    use layout::{Cell, GdsLayer, LayoutBuilder};

    use super::*;
    use crate::tech::Tech;

    fn layout(name: &str, layers: &[GdsLayer]) -> Layout {
        let mut cell = Cell::new(name);
        for &layer in layers {
            cell.add_rect(layer, Rect::from_sides(0, 0, 100, 100));
        }
        let mut builder = LayoutBuilder::new();
        builder.add_cell(cell).unwrap();
        builder.build().unwrap()
    }

    fn project() -> ProjectInfo {
        ProjectInfo::from_yaml_str("project:\n  top_module: tt_um_example\n").unwrap()
    }

    #[test]
    fn well_formed_layout_passes() {
        let tech = TechProfile::new(Tech::Sky130);
        let layout = layout("tt_um_example", &[tech.boundary().layer, GdsLayer(68, 20)]);
        assert_eq!(structure_check(&layout, &project(), &tech), Ok(()));
    }

    #[test]
    fn every_structural_problem_is_reported() {
        let tech = TechProfile::new(Tech::Sky130);
        let layout = layout("tt_um_Example", &[GdsLayer(72, 20)]);
        let failure = structure_check(&layout, &project(), &tech).unwrap_err();
        assert_eq!(
            failure.message(),
            "Top macro name mismatch: expected tt_um_example, got tt_um_Example; \
             Forbidden layer met5.drawing found; \
             prBoundary.boundary (235/4) layer not found"
        );
    }
}

//! The precheck battery.

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use layout::Layout;

use crate::check::{CheckFailure, CheckList, CheckResult};
use crate::engine::RuleEngine;
use crate::error::Result;
use crate::project::ProjectInfo;
use crate::tech::TechProfile;

pub mod analog;
pub mod boundary;
pub mod drc;
pub mod layers;
pub mod naming;
pub mod power;
pub mod structure;

/// Read-only inputs shared by every check.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub layout: &'a Layout,
    pub project: &'a ProjectInfo,
    pub tech: &'a TechProfile,
    /// The uncompressed layout given to external engines.
    pub gds_path: &'a Path,
    pub lef_path: &'a Path,
    pub verilog_path: &'a Path,
    /// The PDK's main KLayout DRC runset, run once per rule deck.
    pub mr_runset: &'a str,
    /// Worker threads requested from engines.
    pub threads: usize,
}

/// The engines backing the delegated checks.
#[derive(Clone, Copy)]
pub struct Engines<'a> {
    pub magic: &'a dyn RuleEngine,
    pub klayout: &'a dyn RuleEngine,
}

/// Declares every check, in execution order.
pub fn battery<'a>(ctx: CheckContext<'a>, engines: Engines<'a>) -> Result<CheckList<'a>> {
    let urpm_vars = IndexMap::from([
        ("thr".to_string(), ctx.threads.to_string()),
        ("top_cell".to_string(), ctx.project.top_module.clone()),
    ]);

    let mut checks = CheckList::new();
    checks
        .push("Magic DRC", move || drc::magic_drc(ctx, engines.magic))?
        .push("KLayout FEOL", move || {
            drc::klayout_drc(ctx, engines.klayout, "feol", ctx.mr_runset, &IndexMap::new())
        })?
        .push("KLayout BEOL", move || {
            drc::klayout_drc(ctx, engines.klayout, "beol", ctx.mr_runset, &IndexMap::new())
        })?
        .push("KLayout offgrid", move || {
            drc::klayout_drc(ctx, engines.klayout, "offgrid", ctx.mr_runset, &IndexMap::new())
        })?
        .push("KLayout pin label overlapping drawing", move || {
            drc::klayout_drc(
                ctx,
                engines.klayout,
                "pin_label_purposes_overlapping_drawing",
                "pin_label_purposes_overlapping_drawing.rb.drc",
                &IndexMap::new(),
            )
        })?
        .push("KLayout zero area", move || {
            drc::klayout_drc(
                ctx,
                engines.klayout,
                "zero_area",
                "zeroarea.rb.drc",
                &IndexMap::new(),
            )
        })?
        .push("Structure check", move || {
            structure::structure_check(ctx.layout, ctx.project, ctx.tech)
        })?
        .push("Boundary check", move || {
            boundary::boundary_check(ctx.layout, ctx.tech)
        })?
        .push("Power pin check", move || {
            power::power_pin_check(ctx.verilog_path, ctx.lef_path, ctx.project.uses_3v3)
        })?
        .push("Layer check", move || layers::layer_check(ctx.layout, ctx.tech))?
        .push("Cell name check", move || naming::cell_name_check(ctx.layout))?
        .push("urpm/nwell check", move || {
            drc::klayout_drc(
                ctx,
                engines.klayout,
                "nwell_urpm",
                "nwell_urpm.drc",
                &urpm_vars,
            )
        })?
        .push("Analog pin check", move || {
            analog::analog_pin_check(ctx.layout, ctx.project, ctx.tech)
        })?;
    Ok(checks)
}

/// Fails with a tooling error if flattening `layout` would leave out references.
pub(crate) fn require_flattenable(layout: &Layout) -> CheckResult {
    let skipped = layout
        .unsupported_refs()
        .map(|(cell, reference)| {
            format!(
                "cannot flatten {} in cell {}: {}",
                reference.child(),
                cell,
                reference.reason()
            )
        })
        .join("; ");
    if skipped.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::tooling(skipped))
    }
}

//! Checks delegated to external DRC engines.

use indexmap::IndexMap;
use layout::Layout;

use crate::check::{CheckResult, FailureKind};
use crate::checks::CheckContext;
use crate::engine::{EngineRun, RuleEngine, check_with_engine};

/// Full-chip DRC of the top module with Magic.
pub fn magic_drc(ctx: CheckContext<'_>, engine: &dyn RuleEngine) -> CheckResult {
    let run = EngineRun {
        name: "DRC",
        runset: None,
        layout_path: ctx.gds_path,
        top_cell: &ctx.project.top_module,
        variables: IndexMap::new(),
    };
    let result = check_with_engine(engine, &run);
    if let Err(failure) = &result {
        if failure.kind() == FailureKind::Tooling
            && !has_std_cells(ctx.layout, ctx.tech.std_cell_prefix())
        {
            tracing::warn!("No sky130 devices present - was the design flattened?");
        }
    }
    result
}

/// Runs `runset` with `{check}=true` followed by `variables`.
pub fn klayout_drc(
    ctx: CheckContext<'_>,
    engine: &dyn RuleEngine,
    check: &str,
    runset: &str,
    variables: &IndexMap<String, String>,
) -> CheckResult {
    let mut vars = IndexMap::from([(check.to_string(), "true".to_string())]);
    vars.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
    let run = EngineRun {
        name: check,
        runset: Some(runset),
        layout_path: ctx.gds_path,
        top_cell: &ctx.project.top_module,
        variables: vars,
    };
    check_with_engine(engine, &run)
}

fn has_std_cells(layout: &Layout, prefix: &str) -> bool {
    layout.cell_names().any(|name| name.starts_with(prefix))
}

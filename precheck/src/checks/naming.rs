//! Cell names must not contain hierarchy delimiters.

use layout::Layout;

use crate::check::{CheckResult, violations};

/// Characters downstream tools treat as hierarchy separators.
pub const INVALID_CELL_NAME_CHARS: [char; 2] = ['#', '/'];

pub fn cell_name_check(layout: &Layout) -> CheckResult {
    let findings = layout
        .cell_names()
        .flat_map(|name| {
            INVALID_CELL_NAME_CHARS
                .iter()
                .filter(move |c| name.contains(**c))
                .map(move |c| format!("Cell name {name} contains invalid character '{c}'"))
        })
        .collect();
    violations(findings)
}

//! Presence of supply nets in the netlist and cell-library exchange file.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::check::{CheckFailure, CheckResult, violations};

/// Ground net.
pub const VGND: &str = "VGND";
/// Digital supply net.
pub const VDPWR: &str = "VDPWR";
/// 3.3V analog supply net.
pub const VAPWR: &str = "VAPWR";

/// Older name of the digital supply net.
const LEGACY_VDPWR: &str = "VPWR";

/// Reads both files and checks their supply nets.
pub fn power_pin_check(verilog_path: &Path, lef_path: &Path, uses_3v3: bool) -> CheckResult {
    let read = |path: &Path| {
        fs::read_to_string(path).map_err(|e| {
            CheckFailure::tooling(format!("failed to read {}: {e}", path.display()))
        })
    };
    let verilog = strip_verilog_comments(&read(verilog_path)?)?;
    let lef = strip_lef_comments(&read(lef_path)?)?;
    check_power_nets(&verilog, &lef, uses_3v3)
}

/// Checks comment-free netlist and LEF text for the expected supply nets.
///
/// Ground and digital supply must always be present; the analog supply must be
/// present exactly when `uses_3v3` is set.
pub fn check_power_nets(verilog: &str, lef: &str, uses_3v3: bool) -> CheckResult {
    let mut findings = Vec::new();
    for (file_type, text) in [("Verilog", verilog), ("LEF", lef)] {
        let text = text.replace(LEGACY_VDPWR, VDPWR);
        for (net, expected) in [(VGND, true), (VDPWR, true), (VAPWR, uses_3v3)] {
            match (text.contains(net), expected) {
                (true, false) => findings.push(format!("{file_type} contains {net}")),
                (false, true) => findings.push(format!("{file_type} doesn't contain {net}")),
                _ => {}
            }
        }
    }
    violations(findings)
}

fn strip(text: &str, patterns: &[&str]) -> Result<String, CheckFailure> {
    let mut text = text.to_string();
    for pattern in patterns {
        let re = Regex::new(pattern)
            .map_err(|e| CheckFailure::fault(format!("invalid comment pattern: {e}")))?;
        text = re.replace_all(&text, "").into_owned();
    }
    Ok(text)
}

fn strip_verilog_comments(text: &str) -> Result<String, CheckFailure> {
    strip(text, &[r"(?s)/\*.*?\*/", r"//.*"])
}

fn strip_lef_comments(text: &str) -> Result<String, CheckFailure> {
    strip(text, &[r"#.*"])
}

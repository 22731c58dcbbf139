//! Analog pin connectivity.
//!
//! Each analog pin slot sits at a fixed position on the bottom edge of the
//! tile. A slot counts as connected if a via lands on the pin, or if routing
//! metal reaches into any of the four probe regions next to it. Connectivity
//! must agree with both the declared pin count and the pin-role mapping.

use layout::{Layout, PolygonSet};

use crate::check::{CheckResult, violations};
use crate::checks::require_flattenable;
use crate::project::{ANALOG_PIN_SLOTS, ProjectInfo};
use crate::tech::{AnalogPinProbes, TechProfile};

pub fn analog_pin_check(layout: &Layout, project: &ProjectInfo, tech: &TechProfile) -> CheckResult {
    if !project.is_analog() {
        tracing::debug!("no analog pins declared");
        return Ok(());
    }
    require_flattenable(layout)?;

    let flat = layout.flatten();
    let routing = flat.on_layer(tech.analog_routing().layer);
    let vias = flat.on_layer(tech.analog_via().layer);

    let mut findings = Vec::new();
    for slot in 0..ANALOG_PIN_SLOTS {
        let probes = tech.analog_pin_probes(slot, project.uses_3v3, layout.units());
        let connected = is_connected(&probes, &routing, &vias);
        let counted = slot < project.analog_pins;
        let mapped = project.analog_pin_role(slot).is_some();
        tracing::debug!(slot, connected, counted, mapped, "analog pin");
        findings.extend(disagreements(slot, connected, counted, mapped, project.analog_pins));
    }
    violations(findings)
}

fn is_connected(probes: &AnalogPinProbes, routing: &PolygonSet, vias: &PolygonSet) -> bool {
    vias.overlaps(&probes.over) || probes.neighbors().iter().any(|r| routing.overlaps(r))
}

/// Every way connectivity disagrees with the metadata, for one slot.
fn disagreements(
    slot: u8,
    connected: bool,
    counted: bool,
    mapped: bool,
    analog_pins: u8,
) -> Vec<String> {
    let mut out = Vec::new();
    if connected {
        if !counted {
            out.push(format!(
                "Analog pin {slot} connected but analog_pins is {analog_pins}"
            ));
        }
        if !mapped {
            out.push(format!(
                "Analog pin {slot} connected but pinout.ua[{slot}] is empty"
            ));
        }
    } else {
        if counted {
            out.push(format!(
                "Analog pin {slot} not connected but analog_pins is {analog_pins}"
            ));
        }
        if mapped {
            out.push(format!(
                "Analog pin {slot} not connected but pinout.ua[{slot}] is set"
            ));
        }
    }
    out
}

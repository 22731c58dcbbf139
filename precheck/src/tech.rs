//! Technology profiles.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use geometry::rect::Rect;
use layout::{GdsLayer, Units};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A supported process technology.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Tech {
    /// SkyWater 130nm.
    #[default]
    Sky130,
}

impl Display for Tech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sky130 => write!(f, "sky130"),
        }
    }
}

/// Error parsing a technology name.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown technology `{0}`")]
pub struct TechParseErr(String);

impl FromStr for Tech {
    type Err = TechParseErr;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sky130" => Ok(Self::Sky130),
            _ => Err(TechParseErr(s.to_string())),
        }
    }
}

/// A layer with its conventional `name.purpose` label.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NamedLayer {
    pub name: &'static str,
    pub layer: GdsLayer,
}

impl NamedLayer {
    pub const fn new(name: &'static str, layer: u16, datatype: u16) -> Self {
        Self {
            name,
            layer: GdsLayer(layer, datatype),
        }
    }
}

impl Display for NamedLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.layer)
    }
}

/// The probe rectangles of one analog pin slot, in database units.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AnalogPinProbes {
    /// The pin itself; checked for vias.
    pub over: Rect,
    /// Regions just outside each side of the pin; checked for routing metal.
    pub above: Rect,
    pub below: Rect,
    pub left: Rect,
    pub right: Rect,
}

impl AnalogPinProbes {
    /// The four rectangles adjacent to the pin.
    pub fn neighbors(&self) -> [Rect; 4] {
        [self.above, self.below, self.left, self.right]
    }
}

/// Process-specific layer assignments and pin geometry.
#[derive(Debug, Clone)]
pub struct TechProfile {
    tech: Tech,
    boundary: NamedLayer,
    forbidden: Vec<NamedLayer>,
    valid_layers: BTreeSet<GdsLayer>,
    analog_routing: NamedLayer,
    analog_via: NamedLayer,
    std_cell_prefix: &'static str,
    analog_pin_x: fn(u8, bool) -> Decimal,
}

/// Width of an analog pin, in microns.
const ANALOG_PIN_WIDTH: Decimal = dec!(0.9);
/// Height of an analog pin, in microns.
const ANALOG_PIN_HEIGHT: Decimal = dec!(1.0);
/// Gap between a pin edge and its adjacent probe, in microns.
const PROBE_GAP: Decimal = dec!(0.1);
/// Depth of the adjacent probes, in microns.
const PROBE_DEPTH: Decimal = dec!(0.4);

const SKY130_MET5: [NamedLayer; 3] = [
    NamedLayer::new("met5.drawing", 72, 20),
    NamedLayer::new("met5.pin", 72, 16),
    NamedLayer::new("met5.label", 72, 5),
];

/// Layers a sky130 tile may draw on.
const SKY130_VALID_LAYERS: &[(u16, u16)] = &[
    // Wells and implants.
    (64, 20),
    (64, 16),
    (64, 5),
    (64, 44),
    (122, 16),
    (64, 59),
    (64, 18),
    (74, 21),
    (75, 20),
    (93, 44),
    (94, 20),
    (95, 20),
    (11, 44),
    (125, 44),
    (78, 44),
    (18, 20),
    (80, 20),
    (92, 44),
    // Diffusion and poly.
    (65, 20),
    (65, 44),
    (66, 20),
    (66, 16),
    (66, 5),
    (66, 13),
    (66, 14),
    (66, 44),
    (66, 58),
    (66, 41),
    // Resistors and capacitors.
    (86, 20),
    (79, 20),
    (89, 44),
    // Local interconnect through met4.
    (67, 20),
    (67, 16),
    (67, 5),
    (67, 44),
    (67, 48),
    (67, 41),
    (68, 20),
    (68, 16),
    (68, 5),
    (68, 44),
    (68, 58),
    (68, 41),
    (69, 20),
    (69, 16),
    (69, 5),
    (69, 44),
    (69, 58),
    (69, 41),
    (70, 20),
    (70, 16),
    (70, 5),
    (70, 44),
    (70, 48),
    (70, 41),
    (71, 20),
    (71, 16),
    (71, 5),
    // Area identifiers.
    (81, 1),
    (81, 2),
    (81, 3),
    (81, 4),
    (81, 14),
    (81, 19),
    (81, 79),
    // Fill keep-outs, text, and outlines.
    (22, 20),
    (22, 21),
    (22, 22),
    (115, 42),
    (115, 43),
    (115, 44),
    (83, 44),
    (235, 4),
    (236, 0),
];

fn sky130_analog_pin_x(pin: u8, uses_3v3: bool) -> Decimal {
    let x = dec!(151.81) - dec!(19.32) * Decimal::from(pin);
    if uses_3v3 {
        x - dec!(15.64)
    } else {
        x
    }
}

impl TechProfile {
    pub fn new(tech: Tech) -> Self {
        match tech {
            Tech::Sky130 => Self {
                tech,
                boundary: NamedLayer::new("prBoundary.boundary", 235, 4),
                forbidden: SKY130_MET5.to_vec(),
                valid_layers: SKY130_VALID_LAYERS
                    .iter()
                    .map(|&(layer, datatype)| GdsLayer(layer, datatype))
                    .collect(),
                analog_routing: NamedLayer::new("met4.drawing", 71, 20),
                analog_via: NamedLayer::new("via3.drawing", 70, 44),
                std_cell_prefix: "sky130_fd_",
                analog_pin_x: sky130_analog_pin_x,
            },
        }
    }

    #[inline]
    pub fn tech(&self) -> Tech {
        self.tech
    }

    /// The layer outlining the project area.
    #[inline]
    pub fn boundary(&self) -> NamedLayer {
        self.boundary
    }

    /// Layers reserved for top-level routing.
    pub fn forbidden(&self) -> &[NamedLayer] {
        &self.forbidden
    }

    pub fn valid_layers(&self) -> &BTreeSet<GdsLayer> {
        &self.valid_layers
    }

    /// The metal layer analog pins are drawn on.
    #[inline]
    pub fn analog_routing(&self) -> NamedLayer {
        self.analog_routing
    }

    /// The via layer landing on analog pins from below.
    #[inline]
    pub fn analog_via(&self) -> NamedLayer {
        self.analog_via
    }

    /// Name prefix of the standard cell library.
    #[inline]
    pub fn std_cell_prefix(&self) -> &'static str {
        self.std_cell_prefix
    }

    /// Left edge of analog pin `pin`, in microns.
    pub fn analog_pin_x(&self, pin: u8, uses_3v3: bool) -> Decimal {
        (self.analog_pin_x)(pin, uses_3v3)
    }

    /// Probe rectangles for analog pin `pin`, converted to database units.
    pub fn analog_pin_probes(&self, pin: u8, uses_3v3: bool, units: Units) -> AnalogPinProbes {
        let x1 = self.analog_pin_x(pin, uses_3v3);
        let x2 = x1 + ANALOG_PIN_WIDTH;
        let (y1, y2) = (Decimal::ZERO, ANALOG_PIN_HEIGHT);
        let rect = |l: Decimal, b: Decimal, r: Decimal, t: Decimal| {
            Rect::from_sides(units.to_db(l), units.to_db(b), units.to_db(r), units.to_db(t))
        };
        let (near, far) = (PROBE_GAP, PROBE_GAP + PROBE_DEPTH);
        AnalogPinProbes {
            over: rect(x1, y1, x2, y2),
            above: rect(x1, y2 + near, x2, y2 + far),
            below: rect(x1, y1 - far, x2, y1 - near),
            left: rect(x1 - far, y1, x1 - near, y2),
            right: rect(x2 + near, y1, x2 + far, y2),
        }
    }
}

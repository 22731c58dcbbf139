use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use geometry::prelude::*;
use layout::{Cell, GdsLayer, Instance, Layout, LayoutBuilder, UnsupportedRef};
use tempfile::TempDir;
use test_log::test;

use crate::Precheck;
use crate::check::FailureKind;
use crate::checks::{CheckContext, Engines, battery};
use crate::config::PrecheckConfig;
use crate::engine::{EngineError, EngineRun, RuleEngine};
use crate::error::Error;
use crate::project::ProjectInfo;
use crate::report::{Report, Status};
use crate::runner;
use crate::tech::{Tech, TechProfile};

const BOUNDARY: GdsLayer = GdsLayer(235, 4);
const LI1: GdsLayer = GdsLayer(67, 20);
const MET1: GdsLayer = GdsLayer(68, 20);
const MET4: GdsLayer = GdsLayer(71, 20);

const BATTERY: [&str; 13] = [
    "Magic DRC",
    "KLayout FEOL",
    "KLayout BEOL",
    "KLayout offgrid",
    "KLayout pin label overlapping drawing",
    "KLayout zero area",
    "Structure check",
    "Boundary check",
    "Power pin check",
    "Layer check",
    "Cell name check",
    "urpm/nwell check",
    "Analog pin check",
];

const NETLIST: &str = "module tt_um_example (input wire VGND, input wire VDPWR);\nendmodule\n";
const LEF: &str = "MACRO tt_um_example\n  PIN VGND\n  END VGND\n  PIN VPWR\n  END VPWR\nEND tt_um_example\n";

/// An engine that reports a fixed number of violations.
struct Fake {
    label: &'static str,
    violations: usize,
}

impl Fake {
    fn clean(label: &'static str) -> Self {
        Self {
            label,
            violations: 0,
        }
    }
}

impl RuleEngine for Fake {
    fn label(&self) -> &str {
        self.label
    }

    fn run(&self, _run: &EngineRun<'_>) -> Result<usize, EngineError> {
        Ok(self.violations)
    }
}

/// A clean engine that remembers the runset of every run.
struct Recorder {
    label: &'static str,
    runs: RefCell<Vec<(String, Option<String>)>>,
}

impl Recorder {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            runs: RefCell::default(),
        }
    }
}

impl RuleEngine for Recorder {
    fn label(&self) -> &str {
        self.label
    }

    fn run(&self, run: &EngineRun<'_>) -> Result<usize, EngineError> {
        self.runs
            .borrow_mut()
            .push((run.name.to_string(), run.runset.map(str::to_string)));
        Ok(0)
    }
}

struct Panicking;

impl RuleEngine for Panicking {
    fn label(&self) -> &str {
        "Magic"
    }

    fn run(&self, _run: &EngineRun<'_>) -> Result<usize, EngineError> {
        panic!("engine crashed")
    }
}

/// A tile with a standard cell, routing metal, and the project boundary.
fn tile(extra: impl FnOnce(&mut Cell)) -> Layout {
    let mut inv = Cell::new("sky130_fd_sc_hd__inv_1");
    inv.add_rect(LI1, Rect::from_sides(0, 0, 460, 2_720));
    let mut top = Cell::new("tt_um_example");
    top.add_rect(BOUNDARY, Rect::from_sides(0, 0, 161_000, 111_520));
    top.add_rect(MET1, Rect::from_sides(10_000, 10_000, 20_000, 10_480));
    top.add_instance(Instance::new(
        "sky130_fd_sc_hd__inv_1",
        Transformation::translate(5_000, 5_000),
    ));
    extra(&mut top);
    let mut builder = LayoutBuilder::new();
    builder.add_cell(inv).unwrap();
    builder.add_cell(top).unwrap();
    builder.build().unwrap()
}

struct Fixture {
    layout: Layout,
    project: ProjectInfo,
    tech: TechProfile,
    _dir: TempDir,
    gds: PathBuf,
    lef: PathBuf,
    verilog: PathBuf,
}

impl Fixture {
    fn new(layout: Layout, info: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let lef = dir.path().join("tt_um_example.lef");
        let verilog = dir.path().join("tt_um_example.v");
        fs::write(&lef, LEF).unwrap();
        fs::write(&verilog, NETLIST).unwrap();
        Self {
            layout,
            project: ProjectInfo::from_yaml_str(info).unwrap(),
            tech: TechProfile::new(Tech::Sky130),
            gds: dir.path().join("tt_um_example.gds"),
            _dir: dir,
            lef,
            verilog,
        }
    }

    fn digital(layout: Layout) -> Self {
        Self::new(layout, "project:\n  top_module: tt_um_example\n")
    }

    fn ctx(&self) -> CheckContext<'_> {
        CheckContext {
            layout: &self.layout,
            project: &self.project,
            tech: &self.tech,
            gds_path: &self.gds,
            lef_path: &self.lef,
            verilog_path: &self.verilog,
            mr_runset: "sky130A_mr.drc",
            threads: 2,
        }
    }

    fn run(&self, magic: &dyn RuleEngine, klayout: &dyn RuleEngine) -> Report {
        let checks = battery(self.ctx(), Engines { magic, klayout }).unwrap();
        runner::run(&checks)
    }

    fn run_clean(&self) -> Report {
        self.run(&Fake::clean("Magic"), &Fake::clean("KLayout"))
    }
}

fn failures(report: &Report) -> Vec<(&str, &str)> {
    report
        .records()
        .iter()
        .filter_map(|r| r.failure().map(|f| (r.name().as_str(), f.message())))
        .collect()
}

#[test]
fn clean_tile_passes_every_check_in_order() {
    let report = Fixture::digital(tile(|_| {})).run_clean();
    let names: Vec<&str> = report.records().iter().map(|r| r.name().as_str()).collect();
    assert_eq!(names, BATTERY);
    assert!(failures(&report).is_empty());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn engine_violations_fail_only_their_checks() {
    let fixture = Fixture::digital(tile(|_| {}));
    let klayout = Fake {
        label: "KLayout",
        violations: 2,
    };
    let report = fixture.run(&Fake::clean("Magic"), &klayout);
    assert_eq!(report.records().len(), BATTERY.len());
    assert_eq!(
        failures(&report),
        [
            ("KLayout FEOL", "KLayout feol failed with 2 DRC violations"),
            ("KLayout BEOL", "KLayout beol failed with 2 DRC violations"),
            ("KLayout offgrid", "KLayout offgrid failed with 2 DRC violations"),
            (
                "KLayout pin label overlapping drawing",
                "KLayout pin_label_purposes_overlapping_drawing failed with 2 DRC violations"
            ),
            ("KLayout zero area", "KLayout zero_area failed with 2 DRC violations"),
            ("urpm/nwell check", "KLayout nwell_urpm failed with 2 DRC violations"),
        ]
    );
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn panicking_engine_is_isolated() {
    let fixture = Fixture::digital(tile(|_| {}));
    let report = fixture.run(&Panicking, &Fake::clean("KLayout"));

    assert_eq!(report.records().len(), BATTERY.len());
    let magic = &report.records()[0];
    assert_eq!(magic.status(), Status::Fail);
    let failure = magic.failure().unwrap();
    assert_eq!(failure.kind(), FailureKind::Fault);
    assert!(failure.message().contains("engine crashed"));
    assert!(report.records()[1..]
        .iter()
        .all(|r| r.status() == Status::Pass));
    assert_eq!(report.num_failures(), 1);
}

#[test]
fn runs_are_idempotent() {
    let fixture = Fixture::digital(tile(|top| {
        top.add_rect(GdsLayer(72, 20), Rect::from_sides(0, 0, 1_000, 1_000));
    }));
    let outcomes = |report: &Report| -> Vec<(String, Status, String)> {
        report
            .records()
            .iter()
            .map(|r| (r.name().to_string(), r.status(), r.diagnostic().to_string()))
            .collect()
    };
    let first = fixture.run_clean();
    let second = fixture.run_clean();
    assert_eq!(outcomes(&first), outcomes(&second));
    assert!(!first.passed());
}

#[test]
fn shape_one_unit_outside_boundary_fails_boundary_check() {
    let fixture = Fixture::digital(tile(|top| {
        top.add_rect(MET1, Rect::from_sides(160_000, 0, 161_001, 480));
    }));
    let report = fixture.run_clean();
    let failures = failures(&report);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Boundary check");
    assert!(failures[0].1.starts_with("Shapes outside project area"));
}

#[test]
fn unknown_layer_is_named_by_layer_check() {
    let fixture = Fixture::digital(tile(|top| {
        top.add_rect(GdsLayer(999, 0), Rect::from_sides(0, 0, 100, 100));
    }));
    let report = fixture.run_clean();
    assert_eq!(
        failures(&report),
        [("Layer check", "Invalid layers in GDS: 999/0")]
    );
}

#[test]
fn declaring_3v3_without_analog_supply_fails_power_check() {
    let info = "project:\n  top_module: tt_um_example\n  analog_pins: 1\n  uses_3v3: true\n\
                pinout:\n  ua[0]: vin\n";
    let tech = TechProfile::new(Tech::Sky130);
    let probes = tech.analog_pin_probes(0, true, layout::Units::default());
    let fixture = Fixture::new(
        tile(|top| {
            let over = probes.over;
            top.add_rect(
                MET4,
                Rect::from_sides(over.left(), over.top(), over.right(), over.top() + 5_000),
            );
        }),
        info,
    );
    let report = fixture.run_clean();
    assert_eq!(
        failures(&report),
        [(
            "Power pin check",
            "Verilog doesn't contain VAPWR; LEF doesn't contain VAPWR"
        )]
    );
}

#[test]
fn undercounted_analog_pins_fail_analog_check() {
    let tech = TechProfile::new(Tech::Sky130);
    let layout = tile(|top| {
        for slot in 0..2 {
            let over = tech
                .analog_pin_probes(slot, false, layout::Units::default())
                .over;
            top.add_rect(
                MET4,
                Rect::from_sides(over.left(), over.top(), over.right(), over.top() + 5_000),
            );
        }
    });
    let info = |pins: u8| {
        format!(
            "project:\n  top_module: tt_um_example\n  analog_pins: {pins}\n\
             pinout:\n  ua[0]: vin\n  ua[1]: vout\n"
        )
    };

    let fixture = Fixture::new(layout.clone(), &info(2));
    assert!(failures(&fixture.run_clean()).is_empty());

    let fixture = Fixture::new(layout, &info(1));
    assert_eq!(
        failures(&fixture.run_clean()),
        [(
            "Analog pin check",
            "Analog pin 1 connected but analog_pins is 1"
        )]
    );
}

#[test]
fn unflattenable_reference_fails_geometry_checks_only() {
    let layout = tile(|top| {
        top.add_unsupported_ref(UnsupportedRef::new(
            "sky130_fd_sc_hd__inv_1",
            "angle 45 is not a multiple of 90 degrees",
        ));
    });
    let expected = "cannot flatten sky130_fd_sc_hd__inv_1 in cell tt_um_example: \
                    angle 45 is not a multiple of 90 degrees";

    let report = Fixture::digital(layout.clone()).run_clean();
    assert_eq!(report.records().len(), BATTERY.len());
    assert_eq!(failures(&report), [("Boundary check", expected)]);
    let boundary = &report.records()[7];
    assert_eq!(boundary.failure().unwrap().kind(), FailureKind::Tooling);

    let info = "project:\n  top_module: tt_um_example\n  analog_pins: 1\n\
                pinout:\n  ua[0]: vin\n";
    let report = Fixture::new(layout, info).run_clean();
    assert_eq!(
        failures(&report),
        [("Boundary check", expected), ("Analog pin check", expected)]
    );
}

/// Writes a clean tile and its sibling files, returning the layout path.
fn write_submission(dir: &Path) -> anyhow::Result<PathBuf> {
    let pt = gds21::GdsPoint::new;
    let rect = |layer: i16, datatype: i16, l: i32, b: i32, r: i32, t: i32| -> gds21::GdsElement {
        gds21::GdsBoundary {
            layer,
            datatype,
            xy: vec![pt(l, b), pt(r, b), pt(r, t), pt(l, t), pt(l, b)],
            ..Default::default()
        }
        .into()
    };
    let mut top = gds21::GdsStruct::new("tt_um_example");
    top.elems = vec![
        rect(235, 4, 0, 0, 161_000, 111_520),
        rect(68, 20, 10_000, 10_000, 20_000, 10_480),
    ];
    let mut lib = gds21::GdsLibrary::new("tt_um_example");
    lib.structs.push(top);

    let gds = dir.join("tt_um_example.gds");
    lib.save(&gds).map_err(|e| anyhow::anyhow!("{e:?}"))?;
    fs::write(dir.join("tt_um_example.lef"), LEF)?;
    fs::write(dir.join("tt_um_example.v"), NETLIST)?;
    fs::write(dir.join("info.yaml"), "project:\n  top_module: tt_um_example\n")?;
    Ok(gds)
}

fn config(dir: &Path) -> PrecheckConfig {
    PrecheckConfig {
        reports_dir: dir.join("reports"),
        work_dir: dir.join("work"),
        ..PrecheckConfig::new(dir.join("pdk"))
    }
}

#[test]
fn klayout_checks_use_the_configured_pdk_runset() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gds = write_submission(dir.path())?;
    let precheck = Precheck::prepare(
        PrecheckConfig {
            pdk_name: "sky130B".to_string(),
            ..config(dir.path())
        },
        &gds,
    )?;
    assert_eq!(precheck.context().mr_runset, "sky130B_mr.drc");

    let klayout = Recorder::new("KLayout");
    let report = precheck.run_with(Engines {
        magic: &Recorder::new("Magic"),
        klayout: &klayout,
    })?;
    assert!(report.passed());

    let runs = klayout.runs.borrow();
    let runsets: Vec<(&str, Option<&str>)> = runs
        .iter()
        .map(|(name, runset)| (name.as_str(), runset.as_deref()))
        .collect();
    assert_eq!(
        runsets,
        [
            ("feol", Some("sky130B_mr.drc")),
            ("beol", Some("sky130B_mr.drc")),
            ("offgrid", Some("sky130B_mr.drc")),
            (
                "pin_label_purposes_overlapping_drawing",
                Some("pin_label_purposes_overlapping_drawing.rb.drc")
            ),
            ("zero_area", Some("zeroarea.rb.drc")),
            ("nwell_urpm", Some("nwell_urpm.drc")),
        ]
    );
    Ok(())
}

#[test]
fn finish_writes_reports_and_returns_check_outcome() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gds = write_submission(dir.path())?;
    let precheck = Precheck::prepare(config(dir.path()), &gds)?;
    let report = precheck.run_with(Engines {
        magic: &Fake::clean("Magic"),
        klayout: &Fake::clean("KLayout"),
    })?;

    assert_eq!(precheck.finish(&report), 0);
    assert!(dir.path().join("reports/results.xml").is_file());
    assert!(dir.path().join("reports/results.md").is_file());
    Ok(())
}

#[test]
fn unwritable_reports_keep_check_exit_code() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gds = write_submission(dir.path())?;
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, "")?;
    let precheck = Precheck::prepare(
        PrecheckConfig {
            reports_dir: blocked,
            ..config(dir.path())
        },
        &gds,
    )?;
    let klayout = Fake {
        label: "KLayout",
        violations: 1,
    };
    let report = precheck.run_with(Engines {
        magic: &Fake::clean("Magic"),
        klayout: &klayout,
    })?;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(precheck.finish(&report), 1);
    Ok(())
}

#[test]
fn prepare_rejects_missing_metadata() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gds = dir.path().join("tt_um_example.gds");
    fs::write(&gds, b"")?;
    let config = PrecheckConfig::new(dir.path());
    assert!(matches!(
        Precheck::prepare(config, &gds),
        Err(Error::InfoNotFound(_))
    ));
    Ok(())
}

#[test]
fn prepare_rejects_misnamed_layout() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gds = dir.path().join("tt_um_other.gds");
    fs::write(&gds, b"")?;
    fs::write(
        dir.path().join("info.yaml"),
        "project:\n  top_module: tt_um_example\n",
    )?;
    let config = PrecheckConfig::new(dir.path());
    match Precheck::prepare(config, &gds) {
        Err(Error::TopModuleMismatch { top_module, stem }) => {
            assert_eq!(top_module, "tt_um_example");
            assert_eq!(stem, "tt_um_other");
        }
        other => panic!("expected a top module mismatch, got {other:?}"),
    }
    Ok(())
}

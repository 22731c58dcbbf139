//! Check results and their rendering.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arcstr::ArcStr;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::check::{CheckFailure, CheckResult, FailureKind};
use crate::error::{Error, Result};

/// Name of the JUnit test suite.
pub const SUITE_NAME: &str = "Tiny Tapeout Prechecks";

const MARKDOWN_FOOTER: &str = "In case of failure, please reach out on [discord](https://tinytapeout.com/discord) for assistance.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Pass,
    Fail,
}

/// The recorded outcome of one check.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    name: ArcStr,
    failure: Option<CheckFailure>,
    elapsed: Duration,
}

impl CheckRecord {
    pub fn new(name: ArcStr, outcome: CheckResult, elapsed: Duration) -> Self {
        Self {
            name,
            failure: outcome.err(),
            elapsed,
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    pub fn status(&self) -> Status {
        if self.failure.is_some() {
            Status::Fail
        } else {
            Status::Pass
        }
    }

    #[inline]
    pub fn failure(&self) -> Option<&CheckFailure> {
        self.failure.as_ref()
    }

    /// The failure message, or an empty string if the check passed.
    pub fn diagnostic(&self) -> &str {
        self.failure.as_ref().map(CheckFailure::message).unwrap_or("")
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Paths of the written report files.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub junit: PathBuf,
    pub markdown: PathBuf,
}

/// The ordered results of a run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    records: Vec<CheckRecord>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: CheckRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CheckRecord] {
        &self.records
    }

    pub fn num_failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status() == Status::Fail)
            .count()
    }

    pub fn passed(&self) -> bool {
        self.num_failures() == 0
    }

    /// Process exit code: 0 if every check passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Renders the human-readable summary table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Tiny Tapeout Precheck Results\n\n");
        out.push_str("| Check | Result |\n|-----------|--------|\n");
        for record in &self.records {
            let result = match record.failure() {
                None => "✅".to_string(),
                Some(failure) => format!("❌ Fail: {}", escape_cell(failure.message())),
            };
            out.push_str(&format!("| {} | {} |\n", escape_cell(record.name()), result));
        }
        out.push('\n');
        out.push_str(MARKDOWN_FOOTER);
        out.push('\n');
        out
    }

    /// Renders a JUnit XML document.
    ///
    /// Rule violations are reported as `<failure>`s; tooling problems and
    /// internal faults as `<error>`s.
    pub fn to_junit(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("testsuites")))?;

        let errors = self
            .records
            .iter()
            .filter(|r| r.failure().is_some_and(|f| f.kind() != FailureKind::Violation))
            .count();
        let failures = self.num_failures() - errors;
        let total: Duration = self.records.iter().map(CheckRecord::elapsed).sum();

        let tests = self.records.len().to_string();
        let failures = failures.to_string();
        let errors = errors.to_string();
        let time = format_secs(total);
        writer.write_event(Event::Start(BytesStart::new("testsuite").with_attributes([
            ("name", SUITE_NAME),
            ("tests", tests.as_str()),
            ("failures", failures.as_str()),
            ("errors", errors.as_str()),
            ("time", time.as_str()),
        ])))?;

        for record in &self.records {
            let time = format_secs(record.elapsed());
            let case = BytesStart::new("testcase")
                .with_attributes([("name", record.name().as_str()), ("time", time.as_str())]);
            match record.failure() {
                None => writer.write_event(Event::Empty(case))?,
                Some(failure) => {
                    let tag = match failure.kind() {
                        FailureKind::Violation => "failure",
                        FailureKind::Tooling | FailureKind::Fault => "error",
                    };
                    let kind = failure.kind().to_string();
                    writer.write_event(Event::Start(case))?;
                    writer.write_event(Event::Start(BytesStart::new(tag).with_attributes([
                        ("message", failure.message()),
                        ("type", kind.as_str()),
                    ])))?;
                    writer.write_event(Event::Text(BytesText::new(failure.message())))?;
                    writer.write_event(Event::End(BytesEnd::new(tag)))?;
                    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
                }
            }
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
        writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

        let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
        xml.push('\n');
        Ok(xml)
    }

    /// Writes `results.xml` and `results.md` to `dir`, creating it if needed.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<ReportPaths> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let paths = ReportPaths {
            junit: dir.join("results.xml"),
            markdown: dir.join("results.md"),
        };
        write_file(&paths.junit, self.to_junit()?)?;
        write_file(&paths.markdown, self.to_markdown())?;
        Ok(paths)
    }
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn format_secs(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64())
}

/// Keeps a diagnostic on one table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        let mut report = Report::new();
        report.push(CheckRecord::new(
            "Magic DRC".into(),
            Ok(()),
            Duration::from_millis(1500),
        ));
        report.push(CheckRecord::new(
            "Layer check".into(),
            Err(CheckFailure::violation("Invalid layers in GDS: 72/20")),
            Duration::from_millis(10),
        ));
        report.push(CheckRecord::new(
            "KLayout FEOL".into(),
            Err(CheckFailure::tooling("KLayout feol failed: exit status: 1")),
            Duration::from_millis(20),
        ));
        report
    }

    #[test]
    fn markdown_has_one_row_per_check() {
        let md = sample().to_markdown();
        assert!(md.starts_with("# Tiny Tapeout Precheck Results\n\n| Check | Result |\n"));
        assert!(md.contains("| Magic DRC | ✅ |\n"));
        assert!(md.contains("| Layer check | ❌ Fail: Invalid layers in GDS: 72/20 |\n"));
        assert!(md.trim_end().ends_with(MARKDOWN_FOOTER));
    }

    #[test]
    fn markdown_escapes_table_syntax() {
        let mut report = Report::new();
        report.push(CheckRecord::new(
            "Power pin check".into(),
            Err(CheckFailure::violation("a | b\nc")),
            Duration::ZERO,
        ));
        assert!(report
            .to_markdown()
            .contains("| Power pin check | ❌ Fail: a \\| b<br>c |\n"));
    }

    #[test]
    fn junit_distinguishes_failures_and_errors() -> anyhow::Result<()> {
        let xml = sample().to_junit()?;
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            r#"<testsuite name="Tiny Tapeout Prechecks" tests="3" failures="1" errors="1" time="1.53">"#
        ));
        assert!(xml.contains(r#"<testcase name="Magic DRC" time="1.50"/>"#));
        assert!(xml.contains(
            r#"<failure message="Invalid layers in GDS: 72/20" type="violation">"#
        ));
        assert!(xml.contains(r#"<error message="KLayout feol failed: exit status: 1" type="tooling">"#));
        Ok(())
    }

    #[test]
    fn junit_escapes_messages() -> anyhow::Result<()> {
        let mut report = Report::new();
        report.push(CheckRecord::new(
            "Structure check".into(),
            Err(CheckFailure::violation("expected <tt_um_a> & got \"b\"")),
            Duration::ZERO,
        ));
        let xml = report.to_junit()?;
        assert!(xml.contains("expected &lt;tt_um_a&gt; &amp; got &quot;b&quot;"));
        Ok(())
    }

    #[test]
    fn exit_code_reflects_failures() {
        assert_eq!(sample().exit_code(), 1);
        assert_eq!(sample().num_failures(), 2);
        assert_eq!(Report::new().exit_code(), 0);
    }

    #[test]
    fn write_creates_both_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = sample().write(dir.path().join("reports"))?;
        assert!(fs::read_to_string(paths.junit)?.contains("<testsuites>"));
        assert!(fs::read_to_string(paths.markdown)?.contains("| KLayout FEOL |"));
        Ok(())
    }
}

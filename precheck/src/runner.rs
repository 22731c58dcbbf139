//! Sequential execution of a check list.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::check::{CheckFailure, CheckList};
use crate::report::{CheckRecord, Report};

/// Runs every check once, in order, and records each outcome.
///
/// A failing or panicking check never prevents later checks from running.
pub fn run(checks: &CheckList<'_>) -> Report {
    let mut report = Report::new();
    for check in checks.iter() {
        let span = tracing::info_span!("check", name = %check.name());
        let _guard = span.enter();
        tracing::info!("running {}", check.name());

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| check.run()))
            .unwrap_or_else(|payload| Err(CheckFailure::fault(panic_message(payload.as_ref()))));
        let elapsed = start.elapsed();

        match &outcome {
            Ok(()) => tracing::info!(?elapsed, "passed"),
            Err(failure) => tracing::error!(kind = %failure.kind(), ?elapsed, "failed: {failure}"),
        }
        report.push(CheckRecord::new(check.name().clone(), outcome, elapsed));
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("internal error: {detail}"),
        None => "internal error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::FailureKind;
    use crate::report::Status;
    use std::cell::Cell;
    use test_log::test;

    #[test]
    fn runs_every_check_in_order_despite_failures() {
        let calls = Cell::new(0);
        let mut checks = CheckList::new();
        checks
            .push("first", || {
                calls.set(calls.get() + 1);
                Err(CheckFailure::violation("bad"))
            })
            .unwrap()
            .push("second", || -> crate::check::CheckResult {
                calls.set(calls.get() + 1);
                panic!("index out of bounds")
            })
            .unwrap()
            .push("third", || {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap();

        let report = run(&checks);
        assert_eq!(calls.get(), 3);

        let names: Vec<&str> = report.records().iter().map(|r| r.name().as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);

        let second = &report.records()[1];
        assert_eq!(second.status(), Status::Fail);
        assert_eq!(second.failure().map(|f| f.kind()), Some(FailureKind::Fault));
        assert_eq!(second.diagnostic(), "internal error: index out of bounds");

        assert_eq!(report.records()[2].status(), Status::Pass);
        assert_eq!(report.records()[2].diagnostic(), "");
        assert_eq!(report.num_failures(), 2);
    }

    #[test]
    fn empty_list_produces_passing_report() {
        let report = run(&CheckList::new());
        assert!(report.records().is_empty());
        assert!(report.passed());
        assert_eq!(report.exit_code(), 0);
    }
}

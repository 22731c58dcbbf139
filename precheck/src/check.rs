//! Checks and their failures.

use std::fmt;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Why a check failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// A rule was not satisfied by the design.
    Violation,
    /// An external engine or input file could not be used.
    Tooling,
    /// The check itself broke, e.g. by panicking.
    Fault,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Violation => write!(f, "violation"),
            Self::Tooling => write!(f, "tooling"),
            Self::Fault => write!(f, "fault"),
        }
    }
}

/// A failed check, with a human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    kind: FailureKind,
    message: String,
}

impl CheckFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Violation, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Tooling, message)
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Fault, message)
    }

    #[inline]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CheckFailure {}

/// The outcome of running a check.
pub type CheckResult = std::result::Result<(), CheckFailure>;

/// Turns a list of findings into a single violation, or a pass if there are none.
pub(crate) fn violations(findings: Vec<String>) -> CheckResult {
    if findings.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::violation(findings.join("; ")))
    }
}

/// A named validation step.
///
/// The operation closes over the read-only inputs it needs and may be run
/// any number of times.
pub struct Check<'a> {
    name: ArcStr,
    op: Box<dyn Fn() -> CheckResult + 'a>,
}

impl<'a> Check<'a> {
    pub fn new(name: impl Into<ArcStr>, op: impl Fn() -> CheckResult + 'a) -> Self {
        Self {
            name: name.into(),
            op: Box::new(op),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    pub fn run(&self) -> CheckResult {
        (self.op)()
    }
}

impl fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish()
    }
}

/// An ordered list of checks with unique names.
#[derive(Debug, Default)]
pub struct CheckList<'a> {
    checks: Vec<Check<'a>>,
}

impl<'a> CheckList<'a> {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Appends a check, failing if one with the same name was already added.
    pub fn push(
        &mut self,
        name: impl Into<ArcStr>,
        op: impl Fn() -> CheckResult + 'a,
    ) -> Result<&mut Self> {
        let check = Check::new(name, op);
        if self.checks.iter().any(|c| c.name() == check.name()) {
            return Err(Error::DuplicateCheck(check.name().clone()));
        }
        self.checks.push(check);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Check<'a>> {
        self.checks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &ArcStr> {
        self.checks.iter().map(Check::name)
    }
}

//! # Assertions
//!
//! Declarative expectations registered before the exchange and evaluated
//! once against the captured response. Each [`Assertion`] is a value
//! carrying everything it needs to check the response and word its own
//! violations; the [`AssertionRegistry`] keeps them in registration order.

mod content;
mod header;
mod status;

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use thiserror::Error;

use crate::http::ResponseDescriptor;

pub use header::HeaderExpectations;
pub use status::status_name;
pub(crate) use status::status_mismatch;

/// One human-readable description of a failed expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation(String);

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signature of a caller-supplied check.
pub type Evaluator = Arc<dyn Fn(&ResponseDescriptor) -> Vec<Violation> + Send + Sync>;

/// Part of the response an assertion looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionTarget {
    StatusCode,
    Header(String),
    Body,
    Custom,
}

#[derive(Clone)]
enum Check {
    Status(StatusCode),
    SuccessStatus,
    ContentEquals(String),
    ContentContains(String),
    ContentNotContains(String),
    HeaderSingleNonNull { name: String },
    HeaderSingleValue { name: String, expected: String },
    HeaderNotWritten { name: String },
    HeaderValues { name: String, expected: Vec<String> },
    Custom { description: String, evaluator: Evaluator },
}

/// A single registered expectation.
#[derive(Clone)]
pub struct Assertion {
    check: Check,
}

impl Assertion {
    fn from_check(check: Check) -> Self {
        Self { check }
    }

    pub fn status_code(expected: StatusCode) -> Self {
        Self::from_check(Check::Status(expected))
    }

    pub fn success_status() -> Self {
        Self::from_check(Check::SuccessStatus)
    }

    pub fn content_equals(expected: impl Into<String>) -> Self {
        Self::from_check(Check::ContentEquals(expected.into()))
    }

    pub fn content_contains(needle: impl Into<String>) -> Self {
        Self::from_check(Check::ContentContains(needle.into()))
    }

    pub fn content_not_contains(needle: impl Into<String>) -> Self {
        Self::from_check(Check::ContentNotContains(needle.into()))
    }

    pub fn header_single_non_null(name: &str) -> Self {
        Self::from_check(Check::HeaderSingleNonNull {
            name: name.to_string(),
        })
    }

    pub fn header_single_value(name: &str, expected: impl Into<String>) -> Self {
        Self::from_check(Check::HeaderSingleValue {
            name: name.to_string(),
            expected: expected.into(),
        })
    }

    pub fn header_not_written(name: &str) -> Self {
        Self::from_check(Check::HeaderNotWritten {
            name: name.to_string(),
        })
    }

    pub fn header_values(name: &str, expected: Vec<String>) -> Self {
        Self::from_check(Check::HeaderValues {
            name: name.to_string(),
            expected,
        })
    }

    pub fn custom<F>(description: impl Into<String>, evaluator: F) -> Self
    where
        F: Fn(&ResponseDescriptor) -> Vec<Violation> + Send + Sync + 'static,
    {
        Self::from_check(Check::Custom {
            description: description.into(),
            evaluator: Arc::new(evaluator),
        })
    }

    pub fn target(&self) -> AssertionTarget {
        match &self.check {
            Check::Status(_) | Check::SuccessStatus => AssertionTarget::StatusCode,
            Check::ContentEquals(_) | Check::ContentContains(_) | Check::ContentNotContains(_) => {
                AssertionTarget::Body
            }
            Check::HeaderSingleNonNull { name }
            | Check::HeaderSingleValue { name, .. }
            | Check::HeaderNotWritten { name }
            | Check::HeaderValues { name, .. } => AssertionTarget::Header(name.clone()),
            Check::Custom { .. } => AssertionTarget::Custom,
        }
    }

    /// Check the response. Pure; never performs I/O.
    pub fn evaluate(&self, response: &ResponseDescriptor) -> Vec<Violation> {
        match &self.check {
            Check::Status(expected) => status::check_status(*expected, response),
            Check::SuccessStatus => status::check_success(response),
            Check::ContentEquals(expected) => content::check_equals(expected, response),
            Check::ContentContains(needle) => content::check_contains(needle, response),
            Check::ContentNotContains(needle) => content::check_not_contains(needle, response),
            Check::HeaderSingleNonNull { name } => header::check_single_non_null(name, response),
            Check::HeaderSingleValue { name, expected } => {
                header::check_single_value(name, expected, response)
            }
            Check::HeaderNotWritten { name } => header::check_not_written(name, response),
            Check::HeaderValues { name, expected } => {
                header::check_values(name, expected, response)
            }
            Check::Custom { evaluator, .. } => evaluator(response),
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.check {
            Check::Status(expected) => {
                write!(f, "status code should be {}", expected.as_u16())
            }
            Check::SuccessStatus => write!(f, "status code should be 2xx"),
            Check::ContentEquals(expected) => write!(f, "content should be '{expected}'"),
            Check::ContentContains(needle) => write!(f, "content should contain \"{needle}\""),
            Check::ContentNotContains(needle) => {
                write!(f, "content should not contain \"{needle}\"")
            }
            Check::HeaderSingleNonNull { name } => {
                write!(f, "header '{name}' should have one non-null value")
            }
            Check::HeaderSingleValue { name, expected } => {
                write!(f, "header '{name}' should equal '{expected}'")
            }
            Check::HeaderNotWritten { name } => write!(f, "header '{name}' should not be written"),
            Check::HeaderValues { name, expected } => {
                write!(f, "header '{name}' should have values {expected:?}")
            }
            Check::Custom { description, .. } => f.write_str(description),
        }
    }
}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Assertion").field(&self.to_string()).finish()
    }
}

/// Outcome of evaluating every registered assertion.
#[derive(Debug, Clone, Default)]
pub struct AssertionReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u128,
    pub violations: Vec<Violation>,
}

impl AssertionReport {
    pub fn is_success(&self) -> bool {
        self.violations.is_empty()
    }

    /// The aggregated failure, when anything was violated.
    pub fn into_failure(self) -> Option<AggregatedFailure> {
        AggregatedFailure::from_violations(self.violations)
    }
}

/// Ordered collection of assertions for one scenario.
#[derive(Debug, Clone, Default)]
pub struct AssertionRegistry {
    assertions: Vec<Assertion>,
}

impl AssertionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, assertion: Assertion) {
        self.assertions.push(assertion);
    }

    pub fn header(&mut self, name: impl Into<String>) -> HeaderExpectations<'_> {
        HeaderExpectations::new(name, self)
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter()
    }

    pub fn has_status_assertion(&self) -> bool {
        self.assertions
            .iter()
            .any(|assertion| assertion.target() == AssertionTarget::StatusCode)
    }

    /// Run every assertion in registration order.
    pub fn evaluate(&self, response: &ResponseDescriptor) -> AssertionReport {
        let started = Instant::now();
        let mut report = AssertionReport {
            total: self.assertions.len(),
            ..AssertionReport::default()
        };

        for assertion in &self.assertions {
            let violations = assertion.evaluate(response);
            if violations.is_empty() {
                report.passed += 1;
            } else {
                report.failed += 1;
                report.violations.extend(violations);
            }
        }

        report.duration_ms = started.elapsed().as_millis();
        report
    }
}

/// Every violation of one scenario, raised as a single failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AggregatedFailure {
    violations: Vec<Violation>,
    message: String,
}

impl AggregatedFailure {
    /// `None` when there is nothing to report.
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            return None;
        }

        let message = violations
            .iter()
            .map(Violation::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        Some(Self {
            violations,
            message,
        })
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

//! Header value expectations.
//!
//! Counting rules: only non-null values count. Zero values, one value and
//! several values each have their own message, and several values are
//! always listed in the order the host wrote them.

use super::{Assertion, AssertionRegistry, Violation};
use crate::http::ResponseDescriptor;

fn quoted(values: &[&str]) -> String {
    values
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn check_single_non_null(name: &str, response: &ResponseDescriptor) -> Vec<Violation> {
    let values = response.headers().non_null_values(name);
    match values.len() {
        0 => vec![Violation::new(format!(
            "Expected a single header value of '{name}', but no values were found on the response"
        ))],
        1 => Vec::new(),
        _ => vec![Violation::new(format!(
            "Expected a single header value of '{name}', but found multiple values on the response: {}",
            quoted(&values)
        ))],
    }
}

pub(crate) fn check_single_value(
    name: &str,
    expected: &str,
    response: &ResponseDescriptor,
) -> Vec<Violation> {
    let values = response.headers().non_null_values(name);
    match values.as_slice() {
        [] => vec![Violation::new(format!(
            "Expected a single header value of '{name}'='{expected}', but no values were found on the response"
        ))],
        [actual] if *actual == expected => Vec::new(),
        [actual] => vec![Violation::new(format!(
            "Expected a single header value of '{name}'='{expected}', but the actual value was '{actual}'"
        ))],
        many => vec![Violation::new(format!(
            "Expected a single header value of '{name}'='{expected}', but the actual values were {}",
            quoted(many)
        ))],
    }
}

pub(crate) fn check_not_written(name: &str, response: &ResponseDescriptor) -> Vec<Violation> {
    let values = response.headers().non_null_values(name);
    if values.is_empty() {
        return Vec::new();
    }

    vec![Violation::new(format!(
        "Expected no value for header '{name}', but found values {}",
        quoted(&values)
    ))]
}

pub(crate) fn check_values(
    name: &str,
    expected: &[String],
    response: &ResponseDescriptor,
) -> Vec<Violation> {
    let values = response.headers().non_null_values(name);
    if values.iter().copied().eq(expected.iter().map(String::as_str)) {
        return Vec::new();
    }

    let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    let message = if values.is_empty() {
        format!(
            "Expected header '{name}' to have values {}, but no values were found on the response",
            quoted(&expected)
        )
    } else {
        format!(
            "Expected header '{name}' to have values {}, but the actual values were {}",
            quoted(&expected),
            quoted(&values)
        )
    };
    vec![Violation::new(message)]
}

/// Fluent expectations about one response header.
///
/// Every call registers its own assertion, so a chain such as
/// `should_have_one_non_null_value().single_value_should_equal(..)` can
/// report both links when the header is wrong.
pub struct HeaderExpectations<'a> {
    name: String,
    registry: &'a mut AssertionRegistry,
}

impl<'a> HeaderExpectations<'a> {
    pub(crate) fn new(name: impl Into<String>, registry: &'a mut AssertionRegistry) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn should_have_one_non_null_value(self) -> Self {
        self.registry
            .register(Assertion::header_single_non_null(&self.name));
        self
    }

    pub fn single_value_should_equal(self, expected: impl Into<String>) -> Self {
        self.registry
            .register(Assertion::header_single_value(&self.name, expected));
        self
    }

    pub fn should_not_be_written(self) -> Self {
        self.registry
            .register(Assertion::header_not_written(&self.name));
        self
    }

    /// Exact, ordered list of values.
    pub fn should_have_values<S: AsRef<str>>(self, expected: &[S]) -> Self {
        self.registry.register(Assertion::header_values(
            &self.name,
            expected.iter().map(|value| value.as_ref().to_string()).collect(),
        ));
        self
    }
}

use http::StatusCode;

use super::Violation;
use crate::http::ResponseDescriptor;

/// `InternalServerError` for 500, `NotFound` for 404, `OK` for 200.
pub fn status_name(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect(),
        None => "Unknown".to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Body text worth showing next to a failed status check.
fn diagnostic_text(response: &ResponseDescriptor) -> Option<&str> {
    if !response.status().is_server_error() {
        return None;
    }
    let text = response.read_as_text();
    (!text.trim().is_empty()).then_some(text)
}

pub(crate) fn status_mismatch(expected: StatusCode, response: &ResponseDescriptor) -> Violation {
    let mut message = format!(
        "Expected status code {} ({}), but was {}",
        expected.as_u16(),
        status_name(expected),
        response.status().as_u16()
    );
    if let Some(text) = diagnostic_text(response) {
        message.push('\n');
        message.push_str(text);
    }
    Violation::new(message)
}

pub(crate) fn check_status(expected: StatusCode, response: &ResponseDescriptor) -> Vec<Violation> {
    if response.status() == expected {
        Vec::new()
    } else {
        vec![status_mismatch(expected, response)]
    }
}

pub(crate) fn check_success(response: &ResponseDescriptor) -> Vec<Violation> {
    if response.status().is_success() {
        return Vec::new();
    }

    let mut message = format!(
        "Expected a success status code (2xx), but was {}",
        response.status().as_u16()
    );
    if let Some(text) = diagnostic_text(response) {
        message.push('\n');
        message.push_str(text);
    }
    vec![Violation::new(message)]
}

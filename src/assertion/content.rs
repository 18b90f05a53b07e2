use super::Violation;
use crate::http::ResponseDescriptor;

/// Byte-exact; the text is only decoded to word the violation.
pub(crate) fn check_equals(expected: &str, response: &ResponseDescriptor) -> Vec<Violation> {
    if response.body().bytes().as_ref() == expected.as_bytes() {
        return Vec::new();
    }

    let actual = response.read_as_text();

    vec![Violation::new(format!(
        "Expected the content to be '{expected}', but was '{actual}'"
    ))]
}

pub(crate) fn check_contains(needle: &str, response: &ResponseDescriptor) -> Vec<Violation> {
    if response.read_as_text().contains(needle) {
        return Vec::new();
    }

    vec![Violation::new(format!(
        "The response body does not contain expected text \"{needle}\""
    ))]
}

pub(crate) fn check_not_contains(needle: &str, response: &ResponseDescriptor) -> Vec<Violation> {
    if !response.read_as_text().contains(needle) {
        return Vec::new();
    }

    vec![Violation::new(format!(
        "The response body should not contain text \"{needle}\""
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn hello() -> ResponseDescriptor {
        ResponseDescriptor::text(StatusCode::OK, "hello from the in memory host")
    }

    #[test]
    fn equal_content_passes() {
        assert!(check_equals("hello from the in memory host", &hello()).is_empty());
    }

    #[test]
    fn different_content_reports_both_sides() {
        let violations = check_equals("the wrong content", &hello());
        assert_eq!(
            violations[0].as_str(),
            "Expected the content to be 'the wrong content', but was 'hello from the in memory host'"
        );
    }

    #[test]
    fn invalid_utf8_never_equals_its_replacement_text() {
        let response = ResponseDescriptor::new(StatusCode::OK).with_body(vec![b'a', 0xff]);
        assert_eq!(response.read_as_text(), "a\u{fffd}");

        let violations = check_equals("a\u{fffd}", &response);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn trailing_whitespace_is_a_difference() {
        assert_eq!(check_equals("hello from the in memory host ", &hello()).len(), 1);
    }

    #[test]
    fn contains_messages() {
        assert!(check_contains("in memory", &hello()).is_empty());
        assert_eq!(
            check_contains("wrong text", &hello())[0].as_str(),
            "The response body does not contain expected text \"wrong text\""
        );
    }

    #[test]
    fn not_contains_messages() {
        assert!(check_not_contains("some random stuff", &hello()).is_empty());
        assert_eq!(
            check_not_contains("hello", &hello())[0].as_str(),
            "The response body should not contain text \"hello\""
        );
    }
}

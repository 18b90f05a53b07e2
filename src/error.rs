//! Error types for hostprobe.
//!
//! Configuration problems, transport problems and assertion failures are
//! kept in separate enums so a caller can tell "the scenario was declared
//! wrong" apart from "the system under test misbehaved".

use thiserror::Error;

use crate::assertion::AggregatedFailure;

/// Result type alias for scenario execution.
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// A scenario was declared incompletely or inconsistently.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No request target was declared; use a URL, an action or an input object")]
    MissingTarget,

    #[error("Conflicting request targets: {first} was already declared, cannot also use {second}")]
    ConflictingTarget { first: String, second: String },

    #[error("Unable to resolve a route for action `{0}`")]
    UnknownAction(String),

    #[error("Unable to resolve a route for input type `{0}`")]
    UnroutableInput(String),

    #[error("Route `{template}` requires a value for `{token}`")]
    MissingRouteValue { template: String, token: String },

    #[error("Input `{input}` has no field matching a token of `{template}` and no values usable as query parameters")]
    UnboundInput { input: String, template: String },

    #[error("Invalid request target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to encode the request body: {0}")]
    Body(#[source] CodecError),

    #[error("The scenario has already been executed")]
    AlreadyExecuted,

    #[error("Invalid scenario options: {0}")]
    InvalidOptions(String),
}

/// Body encoding or decoding failed.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode body as {content_type}: {reason}")]
    Encode { content_type: String, reason: String },

    #[error("Failed to decode body as {content_type}: {reason}")]
    Decode { content_type: String, reason: String },
}

/// The host adapter could not produce a response at all.
///
/// Failures inside the system under test are not host errors; they come
/// back as ordinary 5xx responses.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to read response: {0}")]
    ReadBody(String),

    #[error("Invalid request for this host: {0}")]
    InvalidRequest(String),
}

/// Everything a scenario execution can fail with.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Assertion(#[from] AggregatedFailure),
}

impl ScenarioError {
    /// The aggregated failure, if this error came from assertions.
    pub fn as_assertion_failure(&self) -> Option<&AggregatedFailure> {
        match self {
            ScenarioError::Assertion(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ScenarioError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Violation;

    #[test]
    fn assertion_error_is_transparent() {
        let failure =
            AggregatedFailure::from_violations(vec![Violation::new("first"), Violation::new("second")])
                .unwrap();
        let err = ScenarioError::from(failure);
        assert_eq!(err.to_string(), "first\nsecond");
        assert!(err.as_assertion_failure().is_some());
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_error_is_distinct() {
        let err = ScenarioError::from(ConfigError::MissingTarget);
        assert!(err.is_configuration());
        assert!(err.as_assertion_failure().is_none());
    }
}

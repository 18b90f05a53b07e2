//! # Scenario Options
//!
//! Host-wide defaults for how scenarios treat server errors and accept
//! types. Options deserialize from camelCase JSON so a test suite can keep
//! them in a fixture file; any scenario may override the server-error mode
//! for itself.

use serde::Deserialize;

use crate::error::ConfigError;

/// Which rule wins when fail-on-server-error meets an explicit status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerErrorPrecedence {
    /// A registered status-code assertion disables automatic promotion.
    #[default]
    ExplicitAssertions,
    /// A 5xx response always fails immediately.
    Promotion,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOptions {
    #[serde(default)]
    pub fail_on_server_error: bool,
    #[serde(default)]
    pub server_error_precedence: ServerErrorPrecedence,
    #[serde(default)]
    pub default_accept: Option<String>,
}

impl ScenarioOptions {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|err| ConfigError::InvalidOptions(err.to_string()))
    }

    pub fn fail_on_server_error(mut self, enabled: bool) -> Self {
        self.fail_on_server_error = enabled;
        self
    }

    pub fn server_error_precedence(mut self, precedence: ServerErrorPrecedence) -> Self {
        self.server_error_precedence = precedence;
        self
    }

    pub fn default_accept(mut self, content_type: impl Into<String>) -> Self {
        self.default_accept = Some(content_type.into());
        self
    }

    /// Whether a 5xx response should fail before assertions run.
    pub fn promotes_server_error(&self, has_status_assertion: bool) -> bool {
        if !self.fail_on_server_error {
            return false;
        }
        match self.server_error_precedence {
            ServerErrorPrecedence::ExplicitAssertions => !has_status_assertion,
            ServerErrorPrecedence::Promotion => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_do_not_promote() {
        let options = ScenarioOptions::default();
        assert!(!options.promotes_server_error(false));
        assert!(!options.promotes_server_error(true));
    }

    #[test]
    fn explicit_assertions_win_by_default() {
        let options = ScenarioOptions::default().fail_on_server_error(true);
        assert!(options.promotes_server_error(false));
        assert!(!options.promotes_server_error(true));
    }

    #[test]
    fn promotion_precedence_always_promotes() {
        let options = ScenarioOptions::default()
            .fail_on_server_error(true)
            .server_error_precedence(ServerErrorPrecedence::Promotion);
        assert!(options.promotes_server_error(true));
    }

    #[test]
    fn parses_camel_case_json() {
        let options = ScenarioOptions::from_json(
            r#"{"failOnServerError": true, "serverErrorPrecedence": "promotion", "defaultAccept": "text/plain"}"#,
        )
        .unwrap();

        assert!(options.fail_on_server_error);
        assert_eq!(options.server_error_precedence, ServerErrorPrecedence::Promotion);
        assert_eq!(options.default_accept.as_deref(), Some("text/plain"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options = ScenarioOptions::from_json("{}").unwrap();
        assert_eq!(options, ScenarioOptions::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ScenarioOptions::from_json("{\"failOnServerError\": \"maybe\"}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptions(_)));
    }
}

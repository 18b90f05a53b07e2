//! Route templates with `{token}` placeholders.

use std::collections::HashMap;

use reqwest::Url;

use super::InputFields;
use crate::error::ConfigError;

const BASE: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(String),
}

/// A parsed route such as `/memory/color/{Color}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(token) => Segment::Token(token.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: template.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Token names in the order they appear.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_token(&self, name: &str) -> bool {
        self.tokens().any(|token| token.eq_ignore_ascii_case(name))
    }

    /// Match a request path, returning token values on success.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, actual) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Literal(literal) => {
                    if !literal.eq_ignore_ascii_case(actual) {
                        return None;
                    }
                }
                Segment::Token(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(params)
    }

    /// Substitute input fields into the template.
    ///
    /// Fields naming a token fill that token; every other non-null field
    /// becomes a query parameter, in field order. Every token must be filled.
    pub fn bind(&self, input: &InputFields) -> Result<String, ConfigError> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Token(token) => {
                    let value = input.value_of(token).ok_or_else(|| {
                        ConfigError::MissingRouteValue {
                            template: self.raw.clone(),
                            token: token.clone(),
                        }
                    })?;
                    path.push_str(&encode_segment(value, &self.raw)?);
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }

        let query: Vec<(&str, &str)> = input
            .values()
            .filter(|(name, _)| !self.has_token(name))
            .collect();

        let matched_token = input.values().any(|(name, _)| self.has_token(name));
        if !input.is_marker() && !matched_token && query.is_empty() {
            return Err(ConfigError::UnboundInput {
                input: input.input_type().to_string(),
                template: self.raw.clone(),
            });
        }

        append_query(&path, &query)
    }
}

/// Percent-encode a route value so it stays exactly one path segment.
fn encode_segment(value: &str, template: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTarget {
        target: template.to_string(),
        reason: format!("route value `{value}` {reason}"),
    };
    if value.is_empty() || value == "." || value == ".." {
        return Err(invalid("cannot be used as a path segment"));
    }

    let mut url = Url::parse(BASE).map_err(|err| invalid(&err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot be used as a path segment"))?
        .clear()
        .push(value);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// Normalize `target` into a percent-encoded path and append query pairs.
pub(crate) fn append_query(target: &str, pairs: &[(&str, &str)]) -> Result<String, ConfigError> {
    let relative = if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{target}")
    };

    let mut url = Url::parse(BASE)
        .and_then(|base| base.join(&relative))
        .map_err(|err| ConfigError::InvalidTarget {
            target: target.to_string(),
            reason: err.to_string(),
        })?;

    if !pairs.is_empty() {
        let mut query_pairs = url.query_pairs_mut();
        for (key, value) in pairs {
            query_pairs.append_pair(key, value);
        }
    }

    Ok(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

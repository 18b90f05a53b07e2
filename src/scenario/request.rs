//! Request side of a scenario.
//!
//! [`RequestBuilder`] accumulates intent; [`SendExpression`] is the fluent
//! handle callers write against. Declaration mistakes are recorded when they
//! happen and reported by [`RequestBuilder::build`], before any exchange.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::codec::BodyCodec;
use crate::error::{CodecError, ConfigError};
use crate::http::{HeaderValues, HttpMethod, RequestBody, RequestDescriptor, TEXT_PLAIN};
use crate::options::ScenarioOptions;
use crate::routing::{InputFields, RouteInput, RouteResolver, append_query};

#[derive(Debug, Clone)]
enum Target {
    Url(String),
    Action {
        name: String,
        input: Option<InputFields>,
    },
    Input(InputFields),
}

impl Target {
    fn label(&self) -> String {
        match self {
            Target::Url(url) => format!("url `{url}`"),
            Target::Action { name, .. } => format!("action `{name}`"),
            Target::Input(input) => format!("input `{}`", input.input_type()),
        }
    }
}

#[derive(Debug, Clone)]
enum PendingBody {
    Object(Value),
    Raw { bytes: Bytes, content_type: String },
}

#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<HttpMethod>,
    target: Option<Target>,
    body: Option<PendingBody>,
    headers: HeaderValues,
    query: Vec<(String, String)>,
    accepts: Vec<String>,
    error: Option<ConfigError>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = Some(method);
    }

    fn record(&mut self, error: ConfigError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn set_target(&mut self, target: Target) {
        match &self.target {
            Some(existing) => {
                let error = ConfigError::ConflictingTarget {
                    first: existing.label(),
                    second: target.label(),
                };
                self.record(error);
            }
            None => self.target = Some(target),
        }
    }

    fn resolve_target(&self, resolver: &dyn RouteResolver) -> Result<String, ConfigError> {
        let path = match &self.target {
            None => return Err(ConfigError::MissingTarget),
            Some(Target::Url(url)) => url.clone(),
            Some(Target::Action { name, input }) => {
                let template = resolver
                    .resolve_action(name)
                    .ok_or_else(|| ConfigError::UnknownAction(name.clone()))?;
                match input {
                    Some(input) => template.bind(input)?,
                    None => template.bind(&InputFields::marker(name.as_str()))?,
                }
            }
            Some(Target::Input(input)) => {
                let template = resolver
                    .resolve_input(input.input_type())
                    .ok_or_else(|| ConfigError::UnroutableInput(input.input_type().to_string()))?;
                template.bind(input)?
            }
        };

        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        append_query(&path, &query)
    }

    /// Produce the immutable descriptor handed to the host.
    pub fn build(
        mut self,
        resolver: &dyn RouteResolver,
        codec: &dyn BodyCodec,
        options: &ScenarioOptions,
    ) -> Result<RequestDescriptor, ConfigError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let target = self.resolve_target(resolver)?;

        let body = match self.body {
            None => None,
            Some(PendingBody::Object(value)) => Some(RequestBody {
                bytes: codec.encode_value(&value).map_err(ConfigError::Body)?,
                content_type: codec.content_type().to_string(),
            }),
            Some(PendingBody::Raw {
                bytes,
                content_type,
            }) => Some(RequestBody {
                bytes,
                content_type,
            }),
        };

        let mut headers = self.headers;
        if let Some(body) = &body {
            if !headers.contains("Content-Type") {
                headers.set("Content-Type", body.content_type.clone());
            }
        }

        let mut accepts = self.accepts;
        if accepts.is_empty() {
            accepts.extend(options.default_accept.clone());
        }
        if !accepts.is_empty() {
            headers.set("Accept", accepts.join(", "));
        }

        headers.to_header_map()?;

        Ok(RequestDescriptor::new(
            self.method.unwrap_or_default(),
            target,
            body,
            headers,
            accepts,
        ))
    }
}

/// Fluent request declaration.
pub struct SendExpression<'a> {
    builder: &'a mut RequestBuilder,
}

impl<'a> SendExpression<'a> {
    pub(crate) fn new(builder: &'a mut RequestBuilder) -> Self {
        Self { builder }
    }

    /// Absolute or relative path, optionally with a query string.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.builder.set_target(Target::Url(url.into()));
        self
    }

    /// Target a named server-side action.
    pub fn action(self, name: impl Into<String>) -> Self {
        self.builder.set_target(Target::Action {
            name: name.into(),
            input: None,
        });
        self
    }

    /// Target a named action, filling its route tokens from `input`.
    pub fn action_with(self, name: impl Into<String>, input: &impl RouteInput) -> Self {
        self.builder.set_target(Target::Action {
            name: name.into(),
            input: Some(input.input_fields()),
        });
        self
    }

    /// Target whatever route handles this input type.
    pub fn input(self, input: &impl RouteInput) -> Self {
        self.builder.set_target(Target::Input(input.input_fields()));
        self
    }

    /// Serialize `value` as the request body through the host's codec.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.builder.body = Some(PendingBody::Object(value)),
            Err(err) => self.builder.record(ConfigError::Body(CodecError::Encode {
                content_type: "json".to_string(),
                reason: err.to_string(),
            })),
        }
        self
    }

    pub fn text(self, body: impl Into<String>) -> Self {
        self.body(Bytes::from(body.into()), TEXT_PLAIN)
    }

    pub fn body(self, bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.builder.body = Some(PendingBody::Raw {
            bytes: bytes.into(),
            content_type: content_type.into(),
        });
        self
    }

    /// Append an accepted content type.
    pub fn accepts(self, content_type: impl Into<String>) -> Self {
        self.builder.accepts.push(content_type.into());
        self
    }

    pub fn header(self, name: &str, value: impl Into<String>) -> Self {
        self.builder.headers.append(name, value);
        self
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.builder.headers.set("Content-Type", content_type);
        self
    }

    pub fn query(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder.query.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::routing::RouteTable;

    fn routes() -> RouteTable {
        RouteTable::new()
            .action("get_memory_hello", HttpMethod::Get, "/memory/hello")
            .action("get_memory_color", HttpMethod::Get, "/memory/color/{Color}")
            .input("InMemoryInput", HttpMethod::Get, "/memory/color/{Color}")
            .input("MarkerInput", HttpMethod::Get, "/memory/marker/text")
    }

    fn build(builder: RequestBuilder) -> Result<RequestDescriptor, ConfigError> {
        builder.build(&routes(), &JsonCodec, &ScenarioOptions::default())
    }

    #[test]
    fn url_target_defaults_to_get() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).url("memory/hello");

        let request = build(builder).unwrap();
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(request.target(), "/memory/hello");
        assert!(request.body().is_none());
    }

    #[test]
    fn missing_target_fails() {
        let builder = RequestBuilder::new();
        assert!(matches!(build(builder), Err(ConfigError::MissingTarget)));
    }

    #[test]
    fn second_target_conflicts() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .url("/memory/hello")
            .action("get_memory_hello");

        match build(builder) {
            Err(ConfigError::ConflictingTarget { first, second }) => {
                assert_eq!(first, "url `/memory/hello`");
                assert_eq!(second, "action `get_memory_hello`");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn action_resolves_through_routes() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).action("get_memory_hello");

        assert_eq!(build(builder).unwrap().target(), "/memory/hello");
    }

    #[test]
    fn action_with_tokens_needs_input() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).action("get_memory_color");
        assert!(matches!(
            build(builder),
            Err(ConfigError::MissingRouteValue { .. })
        ));

        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).action_with(
            "get_memory_color",
            &InputFields::new("InMemoryInput").field("Color", "Blue"),
        );
        assert_eq!(build(builder).unwrap().target(), "/memory/color/Blue");
    }

    #[test]
    fn unknown_action_fails() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).action("missing");
        assert!(matches!(build(builder), Err(ConfigError::UnknownAction(name)) if name == "missing"));
    }

    #[test]
    fn input_binds_route_tokens() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .input(&InputFields::new("InMemoryInput").field("Color", "Red"));

        assert_eq!(build(builder).unwrap().target(), "/memory/color/Red");
    }

    #[test]
    fn marker_input_uses_template_as_is() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).input(&InputFields::marker("MarkerInput"));

        assert_eq!(build(builder).unwrap().target(), "/memory/marker/text");
    }

    #[test]
    fn unroutable_input_fails() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).input(&InputFields::marker("Nowhere"));

        assert!(matches!(build(builder), Err(ConfigError::UnroutableInput(_))));
    }

    #[test]
    fn explicit_query_follows_input_query() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .input(
                &InputFields::new("InMemoryInput")
                    .field("Color", "Red")
                    .field("Shade", "dark"),
            )
            .query("page", "2");

        assert_eq!(
            build(builder).unwrap().target(),
            "/memory/color/Red?Shade=dark&page=2"
        );
    }

    #[test]
    fn json_body_is_encoded_with_content_type() {
        let mut builder = RequestBuilder::new();
        builder.set_method(HttpMethod::Post);
        SendExpression::new(&mut builder)
            .url("/memory/headers")
            .json(&serde_json::json!({ "key": "Foo", "value1": "Bar" }));

        let request = build(builder).unwrap();
        let body = request.body().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(&body.bytes[..], br#"{"key":"Foo","value1":"Bar"}"#);
        assert_eq!(request.headers().get("content-type"), Some("application/json"));
    }

    #[test]
    fn accepts_are_ordered_and_rendered() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .url("/memory/hello")
            .accepts("text/plain")
            .accepts("application/json");

        let request = build(builder).unwrap();
        assert_eq!(request.accepts(), ["text/plain", "application/json"]);
        assert_eq!(
            request.headers().get("Accept"),
            Some("text/plain, application/json")
        );
    }

    #[test]
    fn default_accept_applies_when_none_declared() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder).url("/memory/hello");

        let options = ScenarioOptions::default().default_accept("text/plain");
        let request = builder.build(&routes(), &JsonCodec, &options).unwrap();
        assert_eq!(request.accepts(), ["text/plain"]);
    }

    #[test]
    fn explicit_content_type_wins() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .url("/upload")
            .content_type("application/vnd.custom+json")
            .json(&serde_json::json!({}));

        let request = build(builder).unwrap();
        assert_eq!(
            request.headers().non_null_values("Content-Type"),
            vec!["application/vnd.custom+json"]
        );
    }

    #[test]
    fn invalid_request_header_is_reported() {
        let mut builder = RequestBuilder::new();
        SendExpression::new(&mut builder)
            .url("/memory/hello")
            .header("bad header", "x");

        assert!(matches!(build(builder), Err(ConfigError::InvalidHeader { .. })));
    }
}

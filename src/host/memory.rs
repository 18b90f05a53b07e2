//! In-process host.
//!
//! Routes map `(method, template)` pairs to synchronous handlers. No socket
//! is opened: `exchange` matches the target against the route list and
//! calls the handler directly. A handler that returns an error or panics
//! produces a 500 response whose body carries the failure text.

use std::collections::HashMap;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use super::HostAdapter;
use super::history::{ExchangeHistory, ExchangeRecord};
use crate::codec::{self, JsonCodec};
use crate::error::{CodecError, HostError};
use crate::http::{APPLICATION_JSON, HttpMethod, RequestDescriptor, ResponseDescriptor};
use crate::routing::{RouteResolver, RouteTable, RouteTemplate};

// ─── Responses ───────────────────────────────────────────────────────────────

/// Conversion from handler return values into a response.
pub trait IntoResponse {
    fn into_response(self) -> ResponseDescriptor;
}

impl IntoResponse for ResponseDescriptor {
    fn into_response(self) -> ResponseDescriptor {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> ResponseDescriptor {
        ResponseDescriptor::text(StatusCode::OK, self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> ResponseDescriptor {
        ResponseDescriptor::text(StatusCode::OK, self)
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> ResponseDescriptor {
        ResponseDescriptor::new(self)
    }
}

impl IntoResponse for (StatusCode, String) {
    fn into_response(self) -> ResponseDescriptor {
        ResponseDescriptor::text(self.0, self.1)
    }
}

impl<T: IntoResponse, E: Display> IntoResponse for Result<T, E> {
    fn into_response(self) -> ResponseDescriptor {
        match self {
            Ok(value) => value.into_response(),
            Err(err) => ResponseDescriptor::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

/// A JSON response through `serde_json`; encoding failures become a 500.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> ResponseDescriptor {
    match codec::encode(&JsonCodec, value) {
        Ok((bytes, content_type)) => ResponseDescriptor::new(status)
            .with_header("Content-Type", content_type)
            .with_body(bytes),
        Err(err) => ResponseDescriptor::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

// ─── Route Context ───────────────────────────────────────────────────────────

/// What a handler sees of the request.
pub struct RouteContext<'a> {
    request: &'a RequestDescriptor,
    params: HashMap<String, String>,
    query: Vec<(String, String)>,
}

impl<'a> RouteContext<'a> {
    fn new(request: &'a RequestDescriptor, params: HashMap<String, String>) -> Self {
        let query = Url::parse("http://localhost")
            .and_then(|base| base.join(request.target()))
            .map(|url| url.query_pairs().into_owned().collect())
            .unwrap_or_default();

        Self {
            request,
            params,
            query,
        }
    }

    pub fn request(&self) -> &RequestDescriptor {
        self.request
    }

    /// A route token value, matched case-insensitively.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First decoded query parameter with this name.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        self.request
            .body()
            .map(|body| String::from_utf8_lossy(&body.bytes).into_owned())
            .unwrap_or_default()
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let bytes = self
            .request
            .body()
            .map(|body| body.bytes.clone())
            .unwrap_or_else(Bytes::new);
        codec::decode(&JsonCodec, &bytes, Some(APPLICATION_JSON))
    }
}

// ─── Host ────────────────────────────────────────────────────────────────────

type BoxedHandler = Box<dyn Fn(&RouteContext<'_>) -> ResponseDescriptor + Send + Sync>;

struct MemoryRoute {
    method: HttpMethod,
    template: RouteTemplate,
    handler: BoxedHandler,
}

#[derive(Default)]
pub struct MemoryHostBuilder {
    routes: Vec<MemoryRoute>,
    table: RouteTable,
    history_capacity: Option<usize>,
}

impl MemoryHostBuilder {
    /// How many served exchanges to keep; zero disables recording.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }

    pub fn route<F, R>(mut self, method: HttpMethod, template: &str, handler: F) -> Self
    where
        F: Fn(&RouteContext<'_>) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.routes.push(MemoryRoute {
            method,
            template: RouteTemplate::parse(template),
            handler: Box::new(move |ctx| handler(ctx).into_response()),
        });
        self
    }

    /// Register a route that can also be targeted by action name.
    pub fn action<F, R>(mut self, name: &str, method: HttpMethod, template: &str, handler: F) -> Self
    where
        F: Fn(&RouteContext<'_>) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.table.insert_action(name, method, template);
        self.route(method, template, handler)
    }

    /// Register a route that can also be targeted by an input type.
    pub fn input<F, R>(mut self, input_type: &str, method: HttpMethod, template: &str, handler: F) -> Self
    where
        F: Fn(&RouteContext<'_>) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.table.insert_input(input_type, method, template);
        self.route(method, template, handler)
    }

    pub fn build(self) -> MemoryHost {
        MemoryHost {
            routes: self.routes,
            table: self.table,
            history: Mutex::new(
                self.history_capacity
                    .map(ExchangeHistory::with_capacity)
                    .unwrap_or_default(),
            ),
        }
    }
}

pub struct MemoryHost {
    routes: Vec<MemoryRoute>,
    table: RouteTable,
    history: Mutex<ExchangeHistory>,
}

impl MemoryHost {
    pub fn builder() -> MemoryHostBuilder {
        MemoryHostBuilder::default()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Snapshot of the served exchanges, oldest first.
    pub async fn history(&self) -> ExchangeHistory {
        self.history.lock().await.clone()
    }

    pub async fn last_exchange(&self) -> Option<ExchangeRecord> {
        self.history.lock().await.last().cloned()
    }

    fn dispatch(&self, request: &RequestDescriptor) -> ResponseDescriptor {
        let path = request.path();
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            path_matched = true;
            if route.method != request.method() {
                continue;
            }

            let ctx = RouteContext::new(request, params);
            return match panic::catch_unwind(AssertUnwindSafe(|| (route.handler)(&ctx))) {
                Ok(response) => response,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "handler panicked".to_string());
                    debug!(route = route.template.as_str(), %message, "handler panicked");
                    ResponseDescriptor::text(StatusCode::INTERNAL_SERVER_ERROR, message)
                }
            };
        }

        if path_matched {
            debug!(method = %request.method(), path, "method not allowed");
            ResponseDescriptor::text(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("Method {} is not allowed for {path}", request.method()),
            )
        } else {
            debug!(method = %request.method(), path, "no route matched");
            ResponseDescriptor::text(
                StatusCode::NOT_FOUND,
                format!("No route matches {} {path}", request.method()),
            )
        }
    }
}

#[async_trait]
impl HostAdapter for MemoryHost {
    async fn exchange(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, HostError> {
        let started = Instant::now();
        let response = self.dispatch(&request);

        self.history.lock().await.record(ExchangeRecord {
            request,
            response: response.clone(),
            duration_ms: started.elapsed().as_millis(),
        });

        Ok(response)
    }
}

impl RouteResolver for MemoryHost {
    fn resolve_action(&self, action: &str) -> Option<RouteTemplate> {
        self.table.resolve_action(action)
    }

    fn resolve_input(&self, input_type: &str) -> Option<RouteTemplate> {
        self.table.resolve_input(input_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HeaderValues;

    fn request(method: HttpMethod, target: &str) -> RequestDescriptor {
        RequestDescriptor::new(method, target.to_string(), None, HeaderValues::new(), Vec::new())
    }

    fn host() -> MemoryHost {
        MemoryHost::builder()
            .action("get_memory_hello", HttpMethod::Get, "/memory/hello", |_: &RouteContext<'_>| {
                "hello from the in memory host"
            })
            .input(
                "InMemoryInput",
                HttpMethod::Get,
                "/memory/color/{Color}",
                |ctx: &RouteContext<'_>| format!("The color is {}", ctx.param("Color").unwrap_or("?")),
            )
            .route(HttpMethod::Get, "/memory/search", |ctx: &RouteContext<'_>| {
                format!("searching {}", ctx.query("q").unwrap_or(""))
            })
            .route(HttpMethod::Get, "/memory/fail", |_: &RouteContext<'_>| {
                Err::<String, _>("the error text")
            })
            .route(HttpMethod::Get, "/memory/panic", |_: &RouteContext<'_>| -> String {
                panic!("not implemented")
            })
            .build()
    }

    #[tokio::test]
    async fn dispatches_to_matching_route() {
        let response = host().exchange(request(HttpMethod::Get, "/memory/hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.read_as_text(), "hello from the in memory host");
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn passes_route_tokens_and_query() {
        let host = host();
        let response = host.exchange(request(HttpMethod::Get, "/memory/color/Red")).await.unwrap();
        assert_eq!(response.read_as_text(), "The color is Red");

        let response = host
            .exchange(request(HttpMethod::Get, "/memory/search?q=dark+red"))
            .await
            .unwrap();
        assert_eq!(response.read_as_text(), "searching dark red");
    }

    #[tokio::test]
    async fn handler_errors_become_500() {
        let response = host().exchange(request(HttpMethod::Get, "/memory/fail")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.read_as_text(), "the error text");
    }

    #[tokio::test]
    async fn handler_panics_become_500() {
        let response = host().exchange(request(HttpMethod::Get, "/memory/panic")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.read_as_text(), "not implemented");
    }

    #[tokio::test]
    async fn unknown_path_is_404_and_wrong_method_is_405() {
        let host = host();
        let missing = host.exchange(request(HttpMethod::Get, "/nowhere")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let wrong = host.exchange(request(HttpMethod::Post, "/memory/hello")).await.unwrap();
        assert_eq!(wrong.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn records_history() {
        let host = host();
        host.exchange(request(HttpMethod::Get, "/memory/hello")).await.unwrap();
        host.exchange(request(HttpMethod::Get, "/nowhere")).await.unwrap();

        let history = host.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history.with_status(StatusCode::NOT_FOUND).count(), 1);
        assert_eq!(history.for_path("/memory/hello").count(), 1);

        let last = host.last_exchange().await.unwrap();
        assert_eq!(last.path(), "/nowhere");
        assert_eq!(last.request.method(), HttpMethod::Get);
        assert!(last.response.read_as_text().starts_with("No route matches"));
    }

    #[tokio::test]
    async fn history_capacity_is_configurable() {
        let host = MemoryHost::builder()
            .route(HttpMethod::Get, "/memory/hello", |_: &RouteContext<'_>| "hello")
            .history_capacity(0)
            .build();
        host.exchange(request(HttpMethod::Get, "/memory/hello")).await.unwrap();

        assert!(host.history().await.is_empty());
        assert!(host.last_exchange().await.is_none());
    }

    #[test]
    fn resolves_registered_names() {
        let host = host();
        assert_eq!(
            host.resolve_action("get_memory_hello").unwrap().as_str(),
            "/memory/hello"
        );
        assert!(host.resolve_input("InMemoryInput").is_some());
        assert!(host.resolve_input("Unknown").is_none());
    }

    #[test]
    fn json_response_sets_content_type() {
        let response = json_response(StatusCode::CREATED, &serde_json::json!({ "id": 1 }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.read_as_text(), r#"{"id":1}"#);
    }
}

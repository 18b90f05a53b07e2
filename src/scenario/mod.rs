//! # Scenarios
//!
//! A [`Scenario`] is one request plus the assertions about its response.
//! It moves through two states: `Declaring`, where the request and the
//! assertions are described and no I/O happens, and `Executed`, reached
//! by the single call to [`Scenario::execute`].
//!
//! Execution builds the request descriptor, performs exactly one exchange
//! through the host adapter, evaluates every assertion in registration
//! order and raises one [`AggregatedFailure`] carrying all violations.

mod host;
mod request;

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::assertion::{
    AggregatedFailure, Assertion, AssertionRegistry, AssertionReport, HeaderExpectations,
    Violation, status_mismatch,
};
use crate::codec::BodyCodec;
use crate::error::{CodecError, ConfigError, ScenarioError};
use crate::http::{HttpMethod, RequestDescriptor, ResponseDescriptor};

pub use host::{JsonResponse, ScenarioHost};
pub use request::{RequestBuilder, SendExpression};

struct Declaration {
    request: RequestBuilder,
    assertions: AssertionRegistry,
    fail_on_server_error: Option<bool>,
}

enum ScenarioState {
    Declaring(Box<Declaration>),
    Executed,
}

pub struct Scenario {
    state: ScenarioState,
    result: Option<ScenarioResult>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            state: ScenarioState::Declaring(Box::new(Declaration {
                request: RequestBuilder::new(),
                assertions: AssertionRegistry::new(),
                fail_on_server_error: None,
            })),
            result: None,
        }
    }

    fn declaration(&mut self) -> &mut Declaration {
        match &mut self.state {
            ScenarioState::Declaring(declaration) => declaration.as_mut(),
            ScenarioState::Executed => {
                panic!("scenario has already been executed; declarations are closed")
            }
        }
    }

    fn send(&mut self, method: HttpMethod) -> SendExpression<'_> {
        let declaration = self.declaration();
        declaration.request.set_method(method);
        SendExpression::new(&mut declaration.request)
    }

    // ─── Request side ────────────────────────────────────────────────────────

    pub fn get(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Get)
    }

    pub fn post(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Post)
    }

    pub fn put(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Put)
    }

    pub fn patch(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Patch)
    }

    pub fn delete(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Delete)
    }

    pub fn head(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Head)
    }

    pub fn options(&mut self) -> SendExpression<'_> {
        self.send(HttpMethod::Options)
    }

    /// The request expression without changing the method.
    pub fn request(&mut self) -> SendExpression<'_> {
        SendExpression::new(&mut self.declaration().request)
    }

    // ─── Response side ───────────────────────────────────────────────────────

    pub fn assert_that(&mut self, assertion: Assertion) -> &mut Self {
        self.declaration().assertions.register(assertion);
        self
    }

    /// Register a caller-supplied check.
    pub fn assert_with<F>(&mut self, description: impl Into<String>, evaluator: F) -> &mut Self
    where
        F: Fn(&ResponseDescriptor) -> Vec<Violation> + Send + Sync + 'static,
    {
        self.assert_that(Assertion::custom(description, evaluator))
    }

    pub fn status_code_should_be(&mut self, expected: StatusCode) -> &mut Self {
        self.assert_that(Assertion::status_code(expected))
    }

    pub fn status_code_should_be_ok(&mut self) -> &mut Self {
        self.status_code_should_be(StatusCode::OK)
    }

    pub fn status_code_should_be_success(&mut self) -> &mut Self {
        self.assert_that(Assertion::success_status())
    }

    pub fn content_should_be(&mut self, expected: impl Into<String>) -> &mut Self {
        self.assert_that(Assertion::content_equals(expected))
    }

    pub fn content_should_contain(&mut self, needle: impl Into<String>) -> &mut Self {
        self.assert_that(Assertion::content_contains(needle))
    }

    pub fn content_should_not_contain(&mut self, needle: impl Into<String>) -> &mut Self {
        self.assert_that(Assertion::content_not_contains(needle))
    }

    pub fn content_type_should_be(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.assert_that(Assertion::header_single_value("Content-Type", content_type))
    }

    pub fn header(&mut self, name: impl Into<String>) -> HeaderExpectations<'_> {
        self.declaration().assertions.header(name)
    }

    /// Override the host's fail-on-server-error mode for this scenario.
    pub fn fail_on_server_error(&mut self, enabled: bool) -> &mut Self {
        self.declaration().fail_on_server_error = Some(enabled);
        self
    }

    /// Treat any status, 5xx included, as plain data.
    pub fn ignore_status_code(&mut self) -> &mut Self {
        self.fail_on_server_error(false)
    }

    // ─── Execution ───────────────────────────────────────────────────────────

    pub fn is_executed(&self) -> bool {
        matches!(self.state, ScenarioState::Executed)
    }

    /// Captured exchange, once execution got that far.
    pub fn result(&self) -> Option<&ScenarioResult> {
        self.result.as_ref()
    }

    /// Perform the one exchange and evaluate every assertion.
    ///
    /// A second call fails with [`ConfigError::AlreadyExecuted`].
    pub async fn execute(&mut self, host: &ScenarioHost) -> Result<&ScenarioResult, ScenarioError> {
        let declaration = match std::mem::replace(&mut self.state, ScenarioState::Executed) {
            ScenarioState::Declaring(declaration) => declaration,
            ScenarioState::Executed => return Err(ConfigError::AlreadyExecuted.into()),
        };
        let Declaration {
            request,
            assertions,
            fail_on_server_error,
        } = *declaration;

        let request = request.build(host.resolver(), host.codec(), host.options())?;
        let span = info_span!(
            "scenario",
            method = %request.method(),
            target = request.target()
        );

        let response = host
            .adapter()
            .exchange(request.clone())
            .instrument(span.clone())
            .await?;

        let mut options = host.options().clone();
        if let Some(enabled) = fail_on_server_error {
            options.fail_on_server_error = enabled;
        }

        let report = span.in_scope(|| {
            debug!(
                status = response.status().as_u16(),
                size = response.body().len(),
                "exchange complete"
            );

            let promote = response.status().is_server_error()
                && options.promotes_server_error(assertions.has_status_assertion());
            if promote {
                warn!(
                    status = response.status().as_u16(),
                    "server error promoted to scenario failure"
                );
                AssertionReport {
                    total: assertions.len(),
                    failed: 1,
                    violations: vec![status_mismatch(StatusCode::OK, &response)],
                    ..AssertionReport::default()
                }
            } else {
                assertions.evaluate(&response)
            }
        });

        let failure = AggregatedFailure::from_violations(report.violations.clone());
        let result = self.result.insert(ScenarioResult {
            request,
            response,
            report,
            codec: host.codec_handle(),
        });

        match failure {
            Some(failure) => {
                span.in_scope(|| {
                    info!(violations = failure.violations().len(), "scenario failed");
                });
                Err(failure.into())
            }
            None => Ok(&*result),
        }
    }

    /// Execute and hand back the captured exchange.
    pub async fn run(mut self, host: &ScenarioHost) -> Result<ScenarioResult, ScenarioError> {
        self.execute(host).await?;
        self.result
            .take()
            .ok_or_else(|| ConfigError::AlreadyExecuted.into())
    }
}

/// The captured exchange of an executed scenario.
pub struct ScenarioResult {
    request: RequestDescriptor,
    response: ResponseDescriptor,
    report: AssertionReport,
    codec: Arc<dyn BodyCodec>,
}

impl ScenarioResult {
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn response(&self) -> &ResponseDescriptor {
        &self.response
    }

    pub fn report(&self) -> &AssertionReport {
        &self.report
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn read_as_text(&self) -> &str {
        self.response.read_as_text()
    }

    /// Decode the response body with the host's codec.
    pub fn read_as_json<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        self.response.read_as(self.codec.as_ref())
    }
}

impl fmt::Debug for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioResult")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("report", &self.report)
            .finish()
    }
}

//! Scenario-based request/response testing.
//!
//! A [`Scenario`] declares one HTTP request and a set of assertions about
//! the response, then executes the request exactly once against a host
//! adapter: an in-process [`MemoryHost`] or a live server behind
//! [`RemoteHost`]. Every assertion is evaluated and all violations are
//! reported together as one [`AggregatedFailure`].
//!
//! ```ignore
//! let host = ScenarioHost::for_memory(
//!     MemoryHost::builder()
//!         .action("hello", HttpMethod::Get, "/memory/hello", |_: &RouteContext<'_>| "hello")
//!         .build(),
//! );
//!
//! host.scenario(|s| {
//!     s.get().action("hello");
//!     s.content_should_be("hello");
//!     s.status_code_should_be_ok();
//! })
//! .await?;
//! ```

pub mod assertion;
pub mod codec;
pub mod error;
pub mod host;
pub mod http;
pub mod options;
pub mod routing;
pub mod scenario;

pub use assertion::{AggregatedFailure, Assertion, AssertionReport, Violation};
pub use codec::{BodyCodec, JsonCodec};
pub use error::{CodecError, ConfigError, HostError, Result, ScenarioError};
pub use host::{HostAdapter, MemoryHost, RemoteHost, RouteContext};
pub use crate::http::{HeaderValues, HttpMethod, RequestDescriptor, ResponseDescriptor};
pub use options::{ScenarioOptions, ServerErrorPrecedence};
pub use routing::{InputFields, RouteInput, RouteResolver, RouteTable};
pub use scenario::{JsonResponse, Scenario, ScenarioHost, ScenarioResult};

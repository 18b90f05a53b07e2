//! Host adapters: the things that turn a request descriptor into a
//! response descriptor.

mod history;
mod memory;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;
use crate::http::{RequestDescriptor, ResponseDescriptor};

pub use history::{DEFAULT_HISTORY_CAPACITY, ExchangeHistory, ExchangeRecord};
pub use memory::{IntoResponse, MemoryHost, MemoryHostBuilder, RouteContext, json_response};
pub use remote::RemoteHost;

/// Executes one request against the system under test.
///
/// Failures of the system under test come back as 5xx responses. An `Err`
/// means the adapter itself could not complete the exchange.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    async fn exchange(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, HostError>;
}

#[async_trait]
impl<T: HostAdapter + ?Sized> HostAdapter for Arc<T> {
    async fn exchange(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, HostError> {
        (**self).exchange(request).await
    }
}

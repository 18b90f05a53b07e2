//! Transport-independent request and response descriptors.

pub mod headers;
pub mod method;
pub mod request;
pub mod response;

pub use headers::HeaderValues;
pub use method::HttpMethod;
pub use request::{RequestBody, RequestDescriptor};
pub use response::{ResponseBody, ResponseDescriptor, APPLICATION_JSON, TEXT_PLAIN};

use bytes::Bytes;

use super::headers::HeaderValues;
use super::method::HttpMethod;

/// An encoded request body and its content type.
#[derive(Debug, Clone)]
pub struct RequestBody {
    pub bytes: Bytes,
    pub content_type: String,
}

/// The request handed to a host adapter.
///
/// Only the request builder constructs these; once built nothing can
/// change them.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: HttpMethod,
    target: String,
    body: Option<RequestBody>,
    headers: HeaderValues,
    accepts: Vec<String>,
}

impl RequestDescriptor {
    pub(crate) fn new(
        method: HttpMethod,
        target: String,
        body: Option<RequestBody>,
        headers: HeaderValues,
        accepts: Vec<String>,
    ) -> Self {
        Self {
            method,
            target,
            body,
            headers,
            accepts,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path plus query string, e.g. `/memory/color/Red?size=2`.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderValues {
        &self.headers
    }

    pub fn accepts(&self) -> &[String] {
        &self.accepts
    }
}

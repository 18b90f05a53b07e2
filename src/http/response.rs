use std::sync::OnceLock;

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use super::headers::HeaderValues;
use crate::codec::BodyCodec;
use crate::error::CodecError;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Raw response bytes with a lazily decoded text view.
#[derive(Debug, Clone, Default)]
pub struct ResponseBody {
    bytes: Bytes,
    text: OnceLock<String>,
}

impl ResponseBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            text: OnceLock::new(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Body decoded as UTF-8 (lossy); computed once and cached.
    pub fn read_as_text(&self) -> &str {
        self.text
            .get_or_init(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }
}

/// A response captured from a host adapter.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: HeaderValues,
    body: ResponseBody,
}

impl ResponseDescriptor {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderValues::new(),
            body: ResponseBody::default(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A `text/plain` response with the given body.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", TEXT_PLAIN)
            .with_body(Bytes::from(body.into()))
    }

    /// Append a header value; earlier values for the same name are kept.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = ResponseBody::new(body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderValues) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderValues {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderValues {
        &mut self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    pub fn read_as_text(&self) -> &str {
        self.body.read_as_text()
    }

    /// Decode the body into `T` through the given codec.
    pub fn read_as<T: DeserializeOwned>(&self, codec: &dyn BodyCodec) -> Result<T, CodecError> {
        crate::codec::decode(codec, self.body.bytes(), self.content_type())
    }
}

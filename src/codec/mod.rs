//! Body codecs.
//!
//! The engine never serializes anything itself. It hands values to a
//! [`BodyCodec`] and gets bytes plus a content type back, or the reverse.
//! `serde_json::Value` is the interchange shape so the trait stays
//! object-safe; the generic [`encode`] and [`decode`] helpers sit on top.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CodecError;
use crate::http::APPLICATION_JSON;

pub trait BodyCodec: Send + Sync {
    /// Content type written on encoded request bodies.
    fn content_type(&self) -> &str;

    fn encode_value(&self, value: &Value) -> Result<Bytes, CodecError>;

    fn decode_value(&self, bytes: &[u8], content_type: Option<&str>) -> Result<Value, CodecError>;

    fn decode_text(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Encode any serializable value, returning the bytes and content type.
pub fn encode<T: Serialize + ?Sized>(
    codec: &dyn BodyCodec,
    value: &T,
) -> Result<(Bytes, String), CodecError> {
    let value = serde_json::to_value(value).map_err(|err| CodecError::Encode {
        content_type: codec.content_type().to_string(),
        reason: err.to_string(),
    })?;
    let bytes = codec.encode_value(&value)?;
    Ok((bytes, codec.content_type().to_string()))
}

/// Decode bytes into `T` through the codec's intermediate value.
pub fn decode<T: DeserializeOwned>(
    codec: &dyn BodyCodec,
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<T, CodecError> {
    let value = codec.decode_value(bytes, content_type)?;
    serde_json::from_value(value).map_err(|err| CodecError::Decode {
        content_type: content_type.unwrap_or(codec.content_type()).to_string(),
        reason: err.to_string(),
    })
}

/// JSON bodies via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn encode_value(&self, value: &Value) -> Result<Bytes, CodecError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| CodecError::Encode {
                content_type: APPLICATION_JSON.to_string(),
                reason: err.to_string(),
            })
    }

    fn decode_value(&self, bytes: &[u8], content_type: Option<&str>) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::Decode {
            content_type: content_type.unwrap_or(APPLICATION_JSON).to_string(),
            reason: err.to_string(),
        })
    }
}

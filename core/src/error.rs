//! Error types for the feature store client.
//!
//! # Design
//! Two failure kinds reach the caller of a store operation: the transport
//! failed, or the body could not be turned into the expected entity. HTTP
//! status codes are not inspected on their own; a non-2xx response whose body
//! does not decode surfaces as `Decode`, with the status attached so the
//! caller can still tell what the server said.

use thiserror::Error;

/// Broad classification of a decode failure, mirroring `serde_json`'s own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorCategory {
    /// The input is not syntactically valid JSON.
    Syntax,
    /// Valid JSON with the wrong shape: missing required field, wrong type.
    Data,
    /// The input ended before a complete JSON value was read.
    Eof,
    /// The underlying reader failed.
    Io,
}

/// A JSON document could not be decoded into the requested entity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("decode failed ({category:?}): {message}")]
pub struct DecodeError {
    pub category: DecodeErrorCategory,
    pub message: String,
}

impl DecodeError {
    pub fn new(category: DecodeErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// True when the document was well-formed JSON but lacked a required
    /// field or carried a field of the wrong type.
    pub fn is_data(&self) -> bool {
        self.category == DecodeErrorCategory::Data
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let category = match err.classify() {
            Category::Syntax => DecodeErrorCategory::Syntax,
            Category::Data => DecodeErrorCategory::Data,
            Category::Eof => DecodeErrorCategory::Eof,
            Category::Io => DecodeErrorCategory::Io,
        };
        Self::new(category, err.to_string())
    }
}

/// A feature set that the service would reject on create.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("feature set name is undefined")]
    MissingName,

    #[error("feature set version is undefined")]
    MissingVersion,

    #[error("feature name is undefined")]
    MissingFeatureName,

    #[error("value for feature {0} is undefined")]
    MissingFeatureValue(String),

    #[error("data type for feature {0} is undefined")]
    MissingFeatureDataType(String),
}

/// Invalid client configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },
}

/// Errors returned by `FeatureStoreClient` and `FeatureStore` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connecting, sending the request or reading the response failed.
    #[error("transport failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The response body could not be decoded into the expected entity.
    /// `status` is the HTTP status that came with the body, when known.
    #[error("{}", decode_message(.status, .source))]
    Decode {
        status: Option<u16>,
        #[source]
        source: DecodeError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// The decode error behind this failure, if it is one.
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            ApiError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DecodeError> for ApiError {
    fn from(source: DecodeError) -> Self {
        ApiError::Decode {
            status: None,
            source,
        }
    }
}

fn decode_message(status: &Option<u16>, source: &DecodeError) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {source}"),
        None => source.to_string(),
    }
}

//! Synchronous client core for a remote feature store.
//!
//! # Overview
//! Creates, fetches and searches named, versioned feature sets over HTTP.
//! `FeatureStoreClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network; `FeatureStore` pairs it with a
//! `Transport` (by default the blocking `UreqTransport`) so every operation is
//! a single call.
//!
//! # Design
//! - `dto` is the only seam between JSON and the typed entities in `types`.
//!   Encoding sorts keys at every level; decoding builds nested entities from
//!   raw mappings and rejects missing required fields.
//! - The client keeps only its base URL. Each operation opens one connection,
//!   sends one request and reads the whole body.
//! - HTTP status codes are not a separate error kind: bodies are always
//!   decoded, and a body that does not fit the expected shape is a
//!   `DecodeError` tagged with the status.

pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use client::FeatureStoreClient;
pub use config::ClientConfig;
pub use dto::{decode, encode, Dto};
pub use error::{ApiError, ConfigError, DecodeError, DecodeErrorCategory, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::FeatureStore;
pub use transport::{Transport, UreqTransport};
pub use types::{Feature, FeatureSet, LabelsQuery, Page, PaginatedFeatureSets, Pagination, TextQuery};

//! Stateless HTTP request builder and response parser for the feature store.
//!
//! # Design
//! `FeatureStoreClient` holds only a base URL. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes the `HttpResponse`. The round-trip in between belongs to a
//! `Transport`; `FeatureStore` glues the three together.
//!
//! Response status codes are logged but not interpreted: every body is handed
//! to the decoder, so an error page surfaces as `ApiError::Decode` carrying the
//! status it arrived with.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dto;
use crate::error::{ApiError, DecodeError, DecodeErrorCategory};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{FeatureSet, LabelsQuery, Page, PaginatedFeatureSets, TextQuery};

const HEALTHCHECK_REPLY: &str = "pong";

/// Synchronous, stateless request builder for the feature store API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStoreClient {
    base_url: String,
}

impl FeatureStoreClient {
    /// Client for a plain-HTTP service at `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self::from_base_url(&format!("http://{host}:{port}"))
    }

    pub fn from_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::from_base_url(&config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_create_featureset(&self, featureset: &FeatureSet) -> Result<HttpRequest, ApiError> {
        let body = dto::encode(featureset).map_err(ApiError::Encode)?;
        Ok(HttpRequest::with_json(
            HttpMethod::Put,
            format!("{}/featureset/", self.base_url),
            body,
        ))
    }

    pub fn build_get_featureset_by_id(&self, id: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{}/featureset/id/{}",
            self.base_url,
            urlencoding::encode(id)
        ))
    }

    pub fn build_get_featureset_by_name(&self, name: &str, page: Page) -> HttpRequest {
        HttpRequest::get(format!(
            "{}/featureset/name/{}?{}",
            self.base_url,
            urlencoding::encode(name),
            paging_query(page)
        ))
    }

    pub fn build_search_featuresets_by_labels(
        &self,
        labels: &BTreeMap<String, String>,
        page: Page,
    ) -> Result<HttpRequest, ApiError> {
        let payload = LabelsQuery {
            labels: labels.clone(),
            limit: page.limit,
            page: page.page,
        };
        let body = dto::encode(&payload).map_err(ApiError::Encode)?;
        Ok(HttpRequest::with_json(
            HttpMethod::Post,
            format!("{}/labels", self.base_url),
            body,
        ))
    }

    /// Label search expressed as query parameters instead of a JSON body.
    pub fn build_search_featuresets_by_query_labels(
        &self,
        labels: &BTreeMap<String, String>,
        page: Page,
    ) -> HttpRequest {
        let mut query: Vec<String> = labels
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        query.push(paging_query(page));
        HttpRequest::get(format!("{}/labels?{}", self.base_url, query.join("&")))
    }

    pub fn build_search(&self, query: &str, page: Page) -> Result<HttpRequest, ApiError> {
        let payload = TextQuery {
            query: query.to_string(),
            limit: page.limit,
            page: page.page,
        };
        let body = dto::encode(&payload).map_err(ApiError::Encode)?;
        Ok(HttpRequest::with_json(
            HttpMethod::Post,
            format!("{}/search", self.base_url),
            body,
        ))
    }

    pub fn build_list_all(&self, page: Page) -> HttpRequest {
        HttpRequest::get(format!("{}/featureset/?{}", self.base_url, paging_query(page)))
    }

    pub fn build_ping(&self) -> HttpRequest {
        HttpRequest::get(format!("{}/healthcheck/featureset", self.base_url))
    }

    /// Parse the response of a create or get-by-id request.
    pub fn parse_featureset(&self, response: HttpResponse) -> Result<FeatureSet, ApiError> {
        decode_body(response)
    }

    /// Parse the response of any paginated listing or search request.
    pub fn parse_featuresets(&self, response: HttpResponse) -> Result<PaginatedFeatureSets, ApiError> {
        decode_body(response)
    }

    pub fn parse_ping(&self, response: HttpResponse) -> Result<(), ApiError> {
        log_status(&response);
        if response.body.trim() == HEALTHCHECK_REPLY {
            return Ok(());
        }
        Err(ApiError::Decode {
            status: Some(response.status),
            source: DecodeError::new(
                DecodeErrorCategory::Data,
                format!("expected {HEALTHCHECK_REPLY:?}, got {:?}", response.body),
            ),
        })
    }
}

fn paging_query(page: Page) -> String {
    format!("limit={}&page={}", page.limit, page.page)
}

fn log_status(response: &HttpResponse) {
    debug!(status = response.status, body_len = response.body.len(), "response received");
    if !response.is_success() {
        warn!(status = response.status, "non-success status, decoding body anyway");
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    log_status(&response);
    dto::decode(&response.body).map_err(|source| ApiError::Decode {
        status: Some(response.status),
        source,
    })
}

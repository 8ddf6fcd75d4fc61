//! One-call-per-operation facade over `FeatureStoreClient` and a `Transport`.

use std::collections::BTreeMap;

use crate::client::FeatureStoreClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{FeatureSet, Page, PaginatedFeatureSets};

/// Blocking feature store client.
///
/// Holds nothing but the immutable base URL and the transport, so a single
/// instance can be shared across threads when the transport allows it. Every
/// operation performs exactly one request on its own connection.
#[derive(Debug, Clone)]
pub struct FeatureStore<T = UreqTransport> {
    client: FeatureStoreClient,
    transport: T,
}

impl FeatureStore<UreqTransport> {
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_transport(FeatureStoreClient::new(host, port), UreqTransport)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(FeatureStoreClient::from_config(config), UreqTransport)
    }
}

impl<T: Transport> FeatureStore<T> {
    pub fn with_transport(client: FeatureStoreClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &FeatureStoreClient {
        &self.client
    }

    /// Uploads `featureset` and returns the stored copy as echoed by the
    /// service.
    pub fn create_featureset(&self, featureset: &FeatureSet) -> Result<FeatureSet, ApiError> {
        let req = self.client.build_create_featureset(featureset)?;
        self.client.parse_featureset(self.transport.execute(req)?)
    }

    pub fn get_featureset_by_id(&self, id: &str) -> Result<FeatureSet, ApiError> {
        let req = self.client.build_get_featureset_by_id(id);
        self.client.parse_featureset(self.transport.execute(req)?)
    }

    pub fn get_featureset_by_name(&self, name: &str, page: Page) -> Result<PaginatedFeatureSets, ApiError> {
        let req = self.client.build_get_featureset_by_name(name, page);
        self.client.parse_featuresets(self.transport.execute(req)?)
    }

    /// Feature sets carrying every one of `labels`.
    pub fn search_featuresets_by_labels(
        &self,
        labels: &BTreeMap<String, String>,
        page: Page,
    ) -> Result<PaginatedFeatureSets, ApiError> {
        let req = self.client.build_search_featuresets_by_labels(labels, page)?;
        self.client.parse_featuresets(self.transport.execute(req)?)
    }

    pub fn search_featuresets_by_query_labels(
        &self,
        labels: &BTreeMap<String, String>,
        page: Page,
    ) -> Result<PaginatedFeatureSets, ApiError> {
        let req = self.client.build_search_featuresets_by_query_labels(labels, page);
        self.client.parse_featuresets(self.transport.execute(req)?)
    }

    /// Free-text search.
    pub fn search(&self, query: &str, page: Page) -> Result<PaginatedFeatureSets, ApiError> {
        let req = self.client.build_search(query, page)?;
        self.client.parse_featuresets(self.transport.execute(req)?)
    }

    pub fn list_all(&self, page: Page) -> Result<PaginatedFeatureSets, ApiError> {
        let req = self.client.build_list_all(page);
        self.client.parse_featuresets(self.transport.execute(req)?)
    }

    pub fn ping(&self) -> Result<(), ApiError> {
        let req = self.client.build_ping();
        self.client.parse_ping(self.transport.execute(req)?)
    }
}

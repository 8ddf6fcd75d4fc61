//! Domain DTOs for the feature store API.
//!
//! # Design
//! There are two ways to build every entity. Typed construction goes through
//! `new` and the `with_*` builders and takes already-built sub-entities. Raw
//! construction goes through `TryFrom<serde_json::Value>` (or `dto::decode`)
//! and turns nested mappings into their typed counterparts recursively. Both
//! paths produce the same object graph; equality is structural everywhere.
//!
//! Collections use `BTreeMap` so that encoding emits keys in lexicographic
//! order at every level. Each instance owns its own containers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// A single named value with a declared data type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: Value,
    pub data_type: String,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: impl Into<Value>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            data_type: data_type.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingFeatureName);
        }
        if self.value.is_null() {
            return Err(ValidationError::MissingFeatureValue(self.name.clone()));
        }
        if self.data_type.trim().is_empty() {
            return Err(ValidationError::MissingFeatureDataType(self.name.clone()));
        }
        Ok(())
    }
}

/// A named, versioned collection of features with metadata labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSet {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub inserted_at: Option<String>,
}

impl FeatureSet {
    /// A feature set with no description, labels, features or insert time.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            labels: BTreeMap::new(),
            features: Vec::new(),
            inserted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_labels<K, V>(mut self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn with_inserted_at(mut self, inserted_at: impl Into<String>) -> Self {
        self.inserted_at = Some(inserted_at.into());
        self
    }

    /// Checks the same constraints the service applies on create.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.version.trim().is_empty() {
            return Err(ValidationError::MissingVersion);
        }
        self.features.iter().try_for_each(Feature::validate)
    }
}

/// Metadata describing one page of a paginated result.
///
/// All six fields are required on the wire; `prev` and `next` may be `null`
/// but must be present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    #[serde(deserialize_with = "required_option")]
    pub prev: Option<i64>,
    #[serde(deserialize_with = "required_option")]
    pub next: Option<i64>,
    #[serde(rename = "totalPage")]
    pub total_page: i64,
}

impl Pagination {
    /// Envelope for `total` items split into pages of `per_page`, positioned
    /// at the 1-based `page`. Negative counts are clamped to zero and
    /// non-positive `page`/`per_page` to one.
    pub fn for_page(total: i64, page: i64, per_page: i64) -> Self {
        let total = total.max(0);
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_page = total / per_page + i64::from(total % per_page != 0);
        Self {
            total,
            page,
            per_page,
            prev: (page > 1).then(|| page - 1),
            next: (page < total_page).then(|| page + 1),
            total_page,
        }
    }
}

/// A page of feature sets together with its pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedFeatureSets {
    pub pagination: Pagination,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<FeatureSet>,
}

impl PaginatedFeatureSets {
    pub fn new(pagination: Pagination, data: Vec<FeatureSet>) -> Self {
        Self { pagination, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Paging parameters shared by every listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub page: u32,
}

impl Page {
    pub fn new(limit: u32, page: u32) -> Self {
        Self { limit, page }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 10, page: 1 }
    }
}

/// Request payload for `POST /labels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelsQuery {
    pub labels: BTreeMap<String, String>,
    pub limit: u32,
    pub page: u32,
}

/// Request payload for `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextQuery {
    pub query: String,
    pub limit: u32,
    pub page: u32,
}

/// Treats an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// A field with `deserialize_with` loses serde's implicit "missing Option is
// None" rule, which makes the key mandatory while still allowing null.
fn required_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

//! JSON encoding and decoding for the feature store entities.
//!
//! `encode` writes keys in lexicographic order at every nesting level.
//! `decode` parses into a raw `serde_json::Value` first and then builds the
//! typed entity from it, so the same path serves both string input and
//! mappings that were already parsed elsewhere.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::{Feature, FeatureSet, PaginatedFeatureSets, Pagination};

/// An entity that crosses the wire as a JSON object.
pub trait Dto: Serialize + DeserializeOwned + Sized {
    /// Encode to a JSON string with sorted keys.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        encode(self)
    }

    /// Decode from a JSON string.
    fn from_json(json: &str) -> Result<Self, DecodeError> {
        decode(json)
    }

    /// Build from an already-parsed raw mapping.
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        from_value(value)
    }
}

impl Dto for Feature {}
impl Dto for FeatureSet {}
impl Dto for Pagination {}
impl Dto for PaginatedFeatureSets {}

/// Encode any serializable value with object keys sorted lexicographically.
///
/// Objects are sorted explicitly after conversion to `Value`, so the order
/// does not depend on whether `serde_json`'s map preserves insertion order.
pub fn encode<T: Serialize + ?Sized>(entity: &T) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(entity)?;
    value.sort_all_objects();
    serde_json::to_string(&value)
}

pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, DecodeError> {
    let raw: Value = serde_json::from_str(json)?;
    from_value(raw)
}

pub fn from_value<T: DeserializeOwned>(raw: Value) -> Result<T, DecodeError> {
    Ok(serde_json::from_value(raw)?)
}

macro_rules! impl_try_from_value {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = DecodeError;

                fn try_from(raw: Value) -> Result<Self, Self::Error> {
                    from_value(raw)
                }
            }
        )*
    };
}

impl_try_from_value!(Feature, FeatureSet, Pagination, PaginatedFeatureSets);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorCategory;
    use serde_json::json;

    fn sample_feature_set() -> FeatureSet {
        FeatureSet::new("price", "v1")
            .with_description("closing prices")
            .with_labels([("team", "fraud"), ("env", "prod")])
            .with_features([
                Feature::new("close", 10.25, "float"),
                Feature::new("ticker", "ACME", "string"),
                Feature::new("flags", json!({"b": true, "a": [1, 2]}), "object"),
            ])
            .with_inserted_at("2021-06-01T10:00:00Z")
    }

    #[test]
    fn feature_set_roundtrip_with_all_fields() {
        let fs = sample_feature_set();
        let back: FeatureSet = decode(&encode(&fs).unwrap()).unwrap();
        assert_eq!(back, fs);
    }

    #[test]
    fn feature_set_roundtrip_with_optional_fields_absent() {
        let fs = FeatureSet::new("price", "v1");
        let back = FeatureSet::from_json(&fs.to_json().unwrap()).unwrap();
        assert_eq!(back, fs);
    }

    #[test]
    fn paginated_roundtrip() {
        let page = PaginatedFeatureSets::new(
            Pagination::for_page(12, 2, 5),
            vec![sample_feature_set(), FeatureSet::new("volume", "v3")],
        );
        let back = PaginatedFeatureSets::from_json(&page.to_json().unwrap()).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn encode_sorts_keys_at_every_level() {
        let fs = FeatureSet::new("n", "1")
            .with_label("z", "1")
            .with_label("a", "2")
            .with_feature(Feature::new("f", json!({"y": 1, "x": 2}), "object"));
        assert_eq!(
            encode(&fs).unwrap(),
            r#"{"description":null,"features":[{"data_type":"object","name":"f","value":{"x":2,"y":1}}],"inserted_at":null,"labels":{"a":"2","z":"1"},"name":"n","version":"1"}"#
        );
    }

    #[test]
    fn encode_ignores_field_declaration_order() {
        #[derive(Serialize)]
        struct Inner {
            zeta: u8,
            alpha: u8,
        }

        #[derive(Serialize)]
        struct Outer {
            version: &'static str,
            name: &'static str,
            inner: Vec<Inner>,
        }

        let outer = Outer {
            version: "v1",
            name: "n",
            inner: vec![Inner { zeta: 1, alpha: 2 }],
        };
        assert_eq!(
            encode(&outer).unwrap(),
            r#"{"inner":[{"alpha":2,"zeta":1}],"name":"n","version":"v1"}"#
        );
    }

    #[test]
    fn encode_pagination_sorts_camel_case_keys() {
        let encoded = encode(&Pagination::for_page(3, 1, 10)).unwrap();
        assert_eq!(
            encoded,
            r#"{"next":null,"page":1,"perPage":10,"prev":null,"total":3,"totalPage":1}"#
        );
    }

    #[test]
    fn omitted_labels_and_features_default_to_empty() {
        let fs: FeatureSet = decode(r#"{"name":"price","version":"v1"}"#).unwrap();
        assert!(fs.labels.is_empty());
        assert!(fs.features.is_empty());
        assert_eq!(fs.description, None);
        assert_eq!(fs.inserted_at, None);
        assert_eq!(fs, FeatureSet::new("price", "v1"));
    }

    #[test]
    fn null_labels_and_features_default_to_empty() {
        let fs: FeatureSet =
            decode(r#"{"name":"price","version":"v1","labels":null,"features":null}"#).unwrap();
        assert_eq!(fs, FeatureSet::new("price", "v1"));
    }

    #[test]
    fn typed_and_raw_construction_agree() {
        let typed = FeatureSet::new("price", "v1")
            .with_label("team", "fraud")
            .with_features([Feature::new("close", 1.5, "float"), Feature::new("open", 2, "int")]);
        let raw = FeatureSet::try_from(json!({
            "name": "price",
            "version": "v1",
            "labels": {"team": "fraud"},
            "features": [
                {"name": "close", "value": 1.5, "data_type": "float"},
                {"name": "open", "value": 2, "data_type": "int"}
            ]
        }))
        .unwrap();
        assert_eq!(typed, raw);
    }

    #[test]
    fn raw_paginated_builds_nested_entities() {
        let page = PaginatedFeatureSets::try_from(json!({
            "pagination": {"total": 1, "page": 1, "perPage": 10, "prev": null, "next": null, "totalPage": 1},
            "data": [{"name": "price", "version": "v1", "features": [{"name": "f", "value": 0, "data_type": "int"}]}]
        }))
        .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.data[0].features[0], Feature::new("f", 0, "int"));
        assert_eq!(page.pagination, Pagination::for_page(1, 1, 10));
    }

    #[test]
    fn missing_version_is_a_data_error() {
        let err = decode::<FeatureSet>(r#"{"name": "x"}"#).unwrap_err();
        assert_eq!(err.category, DecodeErrorCategory::Data);
        assert!(err.message.contains("version"), "{err}");
    }

    #[test]
    fn feature_requires_value() {
        let err = Feature::from_json(r#"{"name":"f","data_type":"int"}"#).unwrap_err();
        assert!(err.is_data());
        assert!(err.message.contains("value"), "{err}");
    }

    #[test]
    fn feature_requires_data_type() {
        let err = Feature::from_json(r#"{"name":"f","value":1}"#).unwrap_err();
        assert!(err.message.contains("data_type"), "{err}");
    }

    #[test]
    fn nested_feature_missing_field_fails_whole_decode() {
        let err = decode::<FeatureSet>(
            r#"{"name":"price","version":"v1","features":[{"name":"f","value":1}]}"#,
        )
        .unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn pagination_requires_every_field() {
        let err = Pagination::from_json(r#"{"total":1,"page":1,"perPage":10,"prev":null,"next":null}"#)
            .unwrap_err();
        assert!(err.message.contains("totalPage"), "{err}");
    }

    #[test]
    fn paginated_requires_data() {
        let err = decode::<PaginatedFeatureSets>(
            r#"{"pagination":{"total":0,"page":1,"perPage":10,"prev":null,"next":null,"totalPage":0}}"#,
        )
        .unwrap_err();
        assert!(err.message.contains("data"), "{err}");
    }

    #[test]
    fn malformed_json_is_a_syntax_error() {
        let err = decode::<FeatureSet>("not json").unwrap_err();
        assert_eq!(err.category, DecodeErrorCategory::Syntax);
    }
}

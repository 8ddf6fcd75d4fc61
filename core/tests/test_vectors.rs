//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Request bodies are compared byte for byte,
//! since encoding fixes the key order.

use std::collections::BTreeMap;

use featurestore_core::{
    ApiError, FeatureSet, FeatureStoreClient, HttpMethod, HttpRequest, HttpResponse, Page,
    PaginatedFeatureSets,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8085";

fn client() -> FeatureStoreClient {
    FeatureStoreClient::from_base_url(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn simulated_response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected
        .get("headers")
        .and_then(Value::as_array)
        .map(|headers| {
            headers
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(req.headers, expected_headers, "{name}: headers");
    assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
}

fn assert_expected_error<T: std::fmt::Debug>(name: &str, result: Result<T, ApiError>, expected: &Value) {
    let err = result.unwrap_err();
    match expected["kind"].as_str().unwrap() {
        "Decode" => {
            let status = expected["status"].as_u64().map(|s| s as u16);
            assert!(
                matches!(err, ApiError::Decode { status: s, .. } if s == status),
                "{name}: expected Decode with status {status:?}, got {err:?}"
            );
        }
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

fn page_of(input: &Value) -> Page {
    Page::new(
        input["limit"].as_u64().unwrap() as u32,
        input["page"].as_u64().unwrap() as u32,
    )
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: FeatureSet = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_featureset(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let fs = c.parse_featureset(simulated_response(&case)).unwrap();
        let expected: FeatureSet = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(fs, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Get by id
// ---------------------------------------------------------------------------

#[test]
fn get_by_id_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/get_by_id.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_get_featureset_by_id(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_featureset(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_expected_error(name, result, expected_error);
        } else {
            let expected: FeatureSet =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Paginated operations
// ---------------------------------------------------------------------------

#[test]
fn paginated_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/paginated.json")) {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];

        let req = match case["operation"].as_str().unwrap() {
            "get_by_name" => {
                c.build_get_featureset_by_name(input["name"].as_str().unwrap(), page_of(input))
            }
            "search_by_labels" => {
                let labels: BTreeMap<String, String> =
                    serde_json::from_value(input["labels"].clone()).unwrap();
                c.build_search_featuresets_by_labels(&labels, page_of(input))
                    .unwrap()
            }
            "search" => c
                .build_search(input["query"].as_str().unwrap(), page_of(input))
                .unwrap(),
            "list_all" => c.build_list_all(page_of(input)),
            other => panic!("{name}: unknown operation: {other}"),
        };
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_featuresets(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_expected_error(name, result, expected_error);
        } else {
            let expected: PaginatedFeatureSets =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            let page = result.unwrap();
            assert_eq!(page.len(), expected.data.len(), "{name}: page size");
            assert_eq!(page, expected, "{name}: parsed result");
        }
    }
}

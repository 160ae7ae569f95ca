//! Verify `build_*` methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names an operation, the saved token (if any), the input body or
//! parameters, and the request the client must produce. Bodies are compared
//! as parsed JSON or decoded form pairs, not raw strings, so field ordering
//! does not cause false negatives.

use std::sync::Arc;

use api_core::{
    ApiClient, HttpMethod, HttpRequest, MemoryStore, MessageLog, ReqwestTransport, TokenStore,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3001";

fn client() -> ApiClient {
    ApiClient::new(
        BASE_URL,
        Arc::new(ReqwestTransport::new()),
        TokenStore::new(Arc::new(MemoryStore::new())),
        Arc::new(MessageLog::new()),
    )
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    pairs.sort();
    pairs
}

fn build(client: &ApiClient, operation: &str, path: &str, input: &Value) -> HttpRequest {
    let request = match operation {
        "create" => client.build_create(path, input),
        "createWithFormData" => client.build_create_with_form_data(path, input),
        "read" => client.build_read(path, input),
        "update" => client.build_update(path, input),
        "updateWithFormData" => client.build_update_with_form_data(path, input),
        "delete" => client.build_delete(path),
        other => panic!("unknown operation: {other}"),
    };
    request.unwrap()
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client();
        if let Some(token) = case["token"].as_str() {
            c.tokens().save_token(token).unwrap();
        }

        let req = build(
            &c,
            case["operation"].as_str().unwrap(),
            case["path"].as_str().unwrap(),
            &case["input"],
        );
        let expected = &case["expected_request"];

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(
            req.path,
            format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
            "{name}: path"
        );

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let mut query = req.query.clone();
        query.sort();
        assert_eq!(query, pairs(&expected["query"]), "{name}: query");

        if let Some(json_body) = expected.get("json_body") {
            let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&body, json_body, "{name}: json body");
        } else if let Some(form_body) = expected.get("form_body") {
            let mut fields: Vec<(String, String)> =
                serde_urlencoded::from_str(req.body.as_deref().unwrap()).unwrap();
            fields.sort();
            assert_eq!(fields, pairs(form_body), "{name}: form body");
        } else {
            assert!(req.body.is_none(), "{name}: body should be empty");
        }
    }
}

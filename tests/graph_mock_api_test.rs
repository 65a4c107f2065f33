//! Mock API tests for the Graph client.
//!
//! These use wiremock to simulate Graph API responses. Payload shapes
//! follow the documented Graph API formats for objects, error payloads,
//! and batch envelopes.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fbgraph::prelude::*;

/// Documented Graph error payload shape.
fn graph_error_body(error_type: &str, message: &str, code: i64) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "code": code,
            "fbtrace_id": "AbCdEfGh"
        }
    })
}

async fn client_for(server: &MockServer) -> GraphClient {
    GraphClient::builder()
        .with_base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn get_me_returns_decoded_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "123", "name": "Ada Lovelace"}))
                .insert_header("Content-Type", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let me = client.get("/me").await.unwrap();

    assert_eq!(me["id"], "123");
    assert_eq!(me["name"], "Ada Lovelace");
}

#[tokio::test]
async fn get_with_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("fields", "id,name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let params = Parameters::try_from(json!({"fields": "id,name"})).unwrap();
    let me = client.get_with("/me", params).await.unwrap();

    assert_eq!(me["id"], "123");
}

#[tokio::test]
async fn conditional_get_not_modified_yields_headers_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/photo"))
        .and(header("If-None-Match", "\"abc\""))
        .respond_with(ResponseTemplate::new(304).insert_header("ETag", "\"abc\""))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let params = Parameters::try_from(json!({"_etag_": "\"abc\""})).unwrap();
    let result = client.get_with("/me/photo", params).await.unwrap();

    // Headers-only object; never surfaced as an error. Header names are
    // normalized to lowercase by the HTTP stack.
    let object = result.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(result["headers"]["etag"], "\"abc\"");
}

#[tokio::test]
async fn conditional_get_with_fresh_data_wraps_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/photo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://cdn.example/pic.jpg"}))
                .insert_header("ETag", "\"def\""),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let params = Parameters::try_from(json!({"_etag_": "\"abc\""})).unwrap();
    let result = client.get_with("/me/photo", params).await.unwrap();

    assert_eq!(result["headers"]["etag"], "\"def\"");
    assert_eq!(result["body"]["url"], "https://cdn.example/pic.jpg");
}

#[tokio::test]
async fn post_sends_urlencoded_form_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/feed"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("message=hi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "post_1"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let params = Parameters::try_from(json!({"message": "hi"})).unwrap();
    let posted = client.post("/me/feed", params).await.unwrap();

    assert_eq!(posted["id"], "post_1");
}

#[tokio::test]
async fn post_streams_raw_payloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/photos"))
        .and(header("Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "photo_1"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let bytes = vec![0x89u8, b'P', b'N', b'G'];
    let params = Parameters::raw("image/png", Box::new(std::io::Cursor::new(bytes)));
    let uploaded = client.post("/me/photos", params).await.unwrap();

    assert_eq!(uploaded["id"], "photo_1");
}

#[tokio::test]
async fn delete_returns_decoded_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/post_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client.delete("/post_1").await.unwrap();

    assert_eq!(result, json!({"success": true}));
}

#[tokio::test]
async fn graph_error_payload_surfaces_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/unknown"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(graph_error_body(
                "GraphMethodException",
                "Unsupported get request.",
                100,
            )),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.get("/unknown").await.unwrap_err();

    match err {
        GraphError::ApiError {
            code,
            error_type,
            message,
            details,
            ..
        } => {
            assert_eq!(code, 100);
            assert_eq!(error_type.as_deref(), Some("GraphMethodException"));
            assert_eq!(message, "Unsupported get request.");
            assert_eq!(details.unwrap()["fbtrace_id"], "AbCdEfGh");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn oauth_exception_surfaces_as_oauth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(graph_error_body(
                "OAuthException",
                "Invalid OAuth access token.",
                190,
            )),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.get("/me").await.unwrap_err();

    assert!(matches!(err, GraphError::OAuthError { code: 190, .. }));
    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn batch_envelope_is_unwrapped_per_item() {
    let mock_server = MockServer::start().await;

    let envelope = json!([
        {
            "code": 200,
            "headers": [{"name": "Content-Type", "value": "application/json"}],
            "body": "{\"id\":\"123\"}"
        },
        {
            "code": 400,
            "headers": [],
            "body": "{\"error\":{\"message\":\"Unsupported get request.\",\"code\":100}}"
        }
    ]);

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("batch="))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let params = Parameters::try_from(json!({
        "batch": [
            {"method": "GET", "relative_url": "me"},
            {"method": "GET", "relative_url": "nope"}
        ]
    }))
    .unwrap();
    let results = client.post("", params).await.unwrap();

    assert_eq!(results[0], json!({"id": "123"}));
    assert_eq!(results[1]["error"]["code"], 100);
}

#[tokio::test]
async fn connection_failure_propagates_as_fatal_error() {
    // Nothing listens on this port; the fault carries no response.
    let client = GraphClient::builder()
        .with_base_url("http://127.0.0.1:9")
        .build()
        .unwrap();

    let err = client.get("/me").await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::ConnectionError(_) | GraphError::TimeoutError(_)
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn typed_results_deserialize_through_get_as() {
    #[derive(serde::Deserialize)]
    struct Profile {
        id: String,
        name: String,
    }

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "123", "name": "Ada Lovelace"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let profile: Profile = client.get_as("/me").await.unwrap();

    assert_eq!(profile.id, "123");
    assert_eq!(profile.name, "Ada Lovelace");
}

//! Error classification of failed HTTP responses.

use scmapi::{AddressCreate, ContainerQuery, ScmClient, ScmError, TagCreate};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vendor_error(code: &str, error_type: &str, message: &str) -> serde_json::Value {
    json!({
        "_errors": [{
            "code": code,
            "message": message,
            "details": {"errorType": error_type, "message": message}
        }],
        "_request_id": "7c2b0ab3-5a8c-4f6e-9f0e-1a2b3c4d5e6f"
    })
}

fn client(server: &MockServer) -> ScmClient {
    ScmClient::with_bearer_token("test-token", &server.uri()).unwrap()
}

#[tokio::test]
async fn test_name_not_unique_from_vendor_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/config/objects/v1/tags"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(vendor_error("E006", "Name Not Unique", "tag exists")),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .tags()
        .create(TagCreate::new("prod").in_folder("Texas"))
        .await
        .unwrap_err();

    match &err {
        ScmError::NameNotUnique(payload) => {
            assert_eq!(payload.error_code, "E006");
            assert_eq!(payload.http_status, 400);
            assert_eq!(payload.message, "tag exists");
            assert_eq!(
                payload.detail_str("request_id"),
                Some("7c2b0ab3-5a8c-4f6e-9f0e-1a2b3c4d5e6f")
            );
        }
        other => panic!("Expected NameNotUnique, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reference_not_zero_on_delete() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/config/objects/v1/addresses/{id}").as_str()))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(vendor_error("E009", "Reference Not Zero", "in use")),
        )
        .mount(&server)
        .await;

    let err = client(&server).addresses().delete(id).await.unwrap_err();
    assert!(matches!(err, ScmError::ReferenceNotZero(_)));
    assert_eq!(err.http_status(), Some(409));
}

#[tokio::test]
async fn test_missing_query_parameter_from_error_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config/objects/v1/addresses"))
        .respond_with(ResponseTemplate::new(400).set_body_json(vendor_error(
            "E003",
            "Missing Query Parameter",
            "folder is required",
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .addresses()
        .fetch("web-01", &ContainerQuery::folder("Texas"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::MissingQueryParameter(_)));
}

#[tokio::test]
async fn test_status_fallback_without_vendor_code() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/config/objects/v1/tags/{id}").as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such object"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/config/objects/v1/addresses/{id}").as_str()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "denied"})))
        .mount(&server)
        .await;

    let service = client(&server);

    let err = service.tags().get(id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.payload().unwrap().message, "no such object");

    let err = service.addresses().get(id).await.unwrap_err();
    assert!(matches!(err, ScmError::Authorization(_)));
}

#[tokio::test]
async fn test_unclassified_status_is_generic_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/config/objects/v1/addresses"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let err = client(&server)
        .addresses()
        .create(AddressCreate::fqdn("web", "web.example.com").in_folder("Texas"))
        .await
        .unwrap_err();

    match err {
        ScmError::Api(payload) => {
            assert_eq!(payload.http_status, 418);
            assert_eq!(payload.message, "HTTP 418");
        }
        other => panic!("Expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_server_side() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/config/objects/v1/tags"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(["not", "an", "object"])))
        .mount(&server)
        .await;

    let err = client(&server)
        .tags()
        .create(TagCreate::new("prod").in_folder("Texas"))
        .await
        .unwrap_err();

    match err {
        ScmError::InvalidObject(payload) => assert!(payload.is_server_side()),
        other => panic!("Expected InvalidObject, got {other:?}"),
    }
}

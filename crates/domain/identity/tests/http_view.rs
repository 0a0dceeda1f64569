//! Integration tests for the HTTP identity view against a mock store.

use pulseiq_identifiers::SessionId;
use pulseiq_identity::{HttpIdentityView, IdentityError, IdentityView};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_parses_a_known_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identities/s-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user_id": "u-42",
            "email": "buyer@example.com",
            "company": "Acme",
            "ltv_usd": 12_000.0
        })))
        .mount(&server)
        .await;

    let view = HttpIdentityView::new(server.uri()).expect("client");
    let identity = view
        .fetch(&SessionId::new("s-42"))
        .await
        .expect("fetch")
        .expect("identity present");

    assert_eq!(identity.ltv_usd, 12_000.0);
    assert_eq!(identity.company.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn missing_identity_is_none_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identities/anon"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let view = HttpIdentityView::new(server.uri()).expect("client");
    let identity = view.fetch(&SessionId::new("anon")).await.expect("fetch");
    assert!(identity.is_none());
}

#[tokio::test]
async fn server_error_surfaces_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identities/s-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let view = HttpIdentityView::new(server.uri()).expect("client");
    let error = view
        .fetch(&SessionId::new("s-1"))
        .await
        .expect_err("should fail");
    assert!(matches!(error, IdentityError::Status(503)));
}

#[tokio::test]
async fn probe_checks_the_health_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let view = HttpIdentityView::new(server.uri()).expect("client");
    assert!(view.probe().await.is_ok());
}

#[tokio::test]
async fn probe_fails_against_a_dead_store() {
    // Nothing is listening on this port.
    let view = HttpIdentityView::new("http://127.0.0.1:9").expect("client");
    assert!(matches!(
        view.probe().await,
        Err(IdentityError::Unavailable(_))
    ));
}

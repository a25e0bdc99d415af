//! Integration tests for token-authenticated API calls.

use serde_json::json;
use shopify_app_auth::auth::oauth::{exchange_access_token, OAuthError};
use shopify_app_auth::clients::ApiCallLimit;
use shopify_app_auth::{
    AccessToken, ApiCaller, ApiError, ApiKey, ApiSecretKey, HostUrl, HttpMethod, HttpRequest,
    InMemoryMerchantStore, MerchantConnection, MerchantStore, ShopDomain, ShopifyConfig,
};
use std::sync::Arc;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_config(server: &MockServer) -> Arc<ShopifyConfig> {
    Arc::new(
        ShopifyConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .app_url(HostUrl::new("https://myapp.example.com").unwrap())
            .api_host(HostUrl::new(server.uri()).unwrap())
            .build()
            .unwrap(),
    )
}

fn stored_connection(token: &str) -> MerchantConnection {
    MerchantConnection::new(
        ShopDomain::new("test-shop").unwrap(),
        AccessToken::new(token),
        "write_products".parse().unwrap(),
    )
}

#[tokio::test]
async fn test_server_error_status_matches_token_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/shop.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let config = create_config(&server);
    let caller = ApiCaller::new(Arc::clone(&config)).unwrap();

    let exchange = exchange_access_token(
        &config,
        caller.http_client(),
        "test-shop.myshopify.com",
        "code",
    )
    .await;
    assert!(matches!(
        exchange,
        Err(OAuthError::TokenExchangeFailed { status: 500, .. })
    ));

    let request = HttpRequest::get("/admin/shop.json").build().unwrap();
    let call = caller.call(&stored_connection("shpat_1"), &request).await;
    match call {
        Err(ApiError::Upstream { status, message, .. }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal Server Error"));
        }
        other => panic!("Expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn test_call_for_shop_uses_latest_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/products/1.json"))
        .and(header("X-Shopify-Access-Token", "shpat_new"))
        .and(body_json(json!({"product": {"title": "Renamed"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Shopify-Shop-Api-Call-Limit", "2/40")
                .set_body_json(json!({"product": {"id": 1, "title": "Renamed"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryMerchantStore::new();
    store.save(stored_connection("shpat_old")).await.unwrap();
    store.save(stored_connection("shpat_new")).await.unwrap();

    let caller = ApiCaller::new(create_config(&server)).unwrap();
    let request = HttpRequest::builder(HttpMethod::Put, "/admin/products/1.json")
        .body(json!({"product": {"title": "Renamed"}}))
        .build()
        .unwrap();

    let response = assert_ok!(
        caller
            .call_for_shop(&store, &ShopDomain::new("test-shop").unwrap(), &request)
            .await
    );

    assert_eq!(response.body["product"]["title"], "Renamed");
    assert_eq!(
        response.api_call_limit,
        Some(ApiCallLimit {
            request_count: 2,
            bucket_size: 40
        })
    );
}

#[tokio::test]
async fn test_upstream_error_carries_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/orders.json"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-Request-Id", "req-123")
                .set_body_json(json!({"errors": "Forbidden"})),
        )
        .mount(&server)
        .await;

    let caller = ApiCaller::new(create_config(&server)).unwrap();
    let request = HttpRequest::get("/admin/orders.json").build().unwrap();
    let error = caller
        .call(&stored_connection("shpat_1"), &request)
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(403));
    match error {
        ApiError::Upstream {
            message,
            error_reference,
            ..
        } => {
            assert_eq!(error_reference.as_deref(), Some("req-123"));
            assert!(message.contains("Forbidden"));
            assert!(message.contains("req-123"));
        }
        other => panic!("Expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_request_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let caller = ApiCaller::new(create_config(&server)).unwrap();
    let request = HttpRequest::builder(HttpMethod::Post, "/admin/webhooks.json").build();

    assert!(request.is_err());

    let unchecked = HttpRequest {
        http_method: HttpMethod::Post,
        endpoint: "/admin/webhooks.json".to_string(),
        body: None,
        query: Vec::new(),
        extra_headers: Vec::new(),
    };
    let result = caller.call(&stored_connection("shpat_1"), &unchecked).await;
    assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
}

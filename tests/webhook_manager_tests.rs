//! Integration tests for webhook subscription management.
//!
//! These tests run the manager against a mock platform and check the exact
//! requests it sends for registration, listing and deletion.

use serde_json::json;
use shopify_app_auth::auth::oauth::hmac::compute_signature_base64;
use shopify_app_auth::webhooks::{
    connection_id_from_path, verify_webhook, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC,
};
use shopify_app_auth::{
    AccessToken, ApiError, ApiKey, ApiSecretKey, HostUrl, InMemoryMerchantStore,
    MerchantConnection, MerchantStore, ShopDomain, ShopifyConfig, WebhookError, WebhookManager,
    WebhookTopics,
};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHOP: &str = "test-shop.myshopify.com";

fn create_config(server: &MockServer, webhooks: WebhookTopics) -> ShopifyConfig {
    ShopifyConfig::builder()
        .api_key(ApiKey::new("test-api-key").unwrap())
        .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
        .app_url(HostUrl::new("https://myapp.example.com").unwrap())
        .webhook_base_url(HostUrl::new("https://hooks.example.com/webhooks").unwrap())
        .api_host(HostUrl::new(server.uri()).unwrap())
        .webhooks(webhooks)
        .build()
        .unwrap()
}

/// Builds a manager over a store holding one connection for [`SHOP`].
async fn create_manager(
    server: &MockServer,
    webhooks: WebhookTopics,
) -> (WebhookManager, MerchantConnection) {
    let store = InMemoryMerchantStore::new();
    let connection = MerchantConnection::new(
        ShopDomain::new(SHOP).unwrap(),
        AccessToken::new("shpat_test"),
        "read_orders".parse().unwrap(),
    );
    store.save(connection.clone()).await.unwrap();

    let manager =
        WebhookManager::new(Arc::new(create_config(server, webhooks)), Arc::new(store)).unwrap();
    (manager, connection)
}

fn webhook_json(id: u64, topic: &str) -> serde_json::Value {
    json!({
        "id": id,
        "topic": topic,
        "address": "https://hooks.example.com/webhooks/orders/x",
        "format": "json",
        "created_at": "2024-01-01T00:00:00-05:00",
        "updated_at": "2024-01-01T00:00:00-05:00"
    })
}

fn posted_topics(requests: &[wiremock::Request]) -> Vec<String> {
    let mut topics: Vec<String> = requests
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["webhook"]["topic"].as_str().unwrap().to_string()
        })
        .collect();
    topics.sort();
    topics
}

// === Registration ===

#[tokio::test]
async fn test_required_webhooks_post_one_subscription_per_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/webhooks.json"))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"webhook": webhook_json(1, "orders/create")})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let webhooks = WebhookTopics::new().with("orders", ["create", "update"]).unwrap();
    let (manager, connection) = create_manager(&server, webhooks).await;

    let report = manager
        .register_webhooks_required_for_app(&connection.shop_domain)
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.attempted(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(posted_topics(&requests), vec!["orders/create", "orders/update"]);

    for request in requests {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let address = body["webhook"]["address"].as_str().unwrap();
        assert_eq!(connection_id_from_path(address), Some(connection.id));
        assert_eq!(body["webhook"]["format"], "json");
    }
}

#[tokio::test]
async fn test_registering_twice_sends_two_creates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/webhooks.json"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"webhook": webhook_json(7, "app/uninstalled")})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (manager, connection) = create_manager(&server, WebhookTopics::new()).await;

    for _ in 0..2 {
        let webhook = manager
            .register_webhook(&connection.shop_domain, "app", "uninstalled")
            .await
            .unwrap();
        assert_eq!(webhook.id, 7);
    }
}

#[tokio::test]
async fn test_partial_registration_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/webhooks.json"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": {"address": ["for this topic has already been taken"]}
        })))
        .mount(&server)
        .await;

    let webhooks = WebhookTopics::new().with("products", ["update"]).unwrap();
    let (manager, connection) = create_manager(&server, webhooks).await;

    let report = manager
        .register_webhooks_required_for_app(&connection.shop_domain)
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].subscription.full_topic(), "products/update");
    assert_eq!(report.failed[0].error.status(), Some(422));
}

#[tokio::test]
async fn test_unknown_shop_is_missing_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (manager, _connection) = create_manager(&server, WebhookTopics::new()).await;
    let other = ShopDomain::new("other-shop").unwrap();

    let result = manager.list_webhooks(&other).await;

    assert!(matches!(result, Err(ApiError::MissingCredentials { .. })));
}

// === Deletion ===

#[tokio::test]
async fn test_delete_all_lists_then_deletes_each() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/webhooks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "webhooks": [webhook_json(11, "orders/create"), webhook_json(12, "orders/update")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/webhooks/11.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/webhooks/12.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, connection) = create_manager(&server, WebhookTopics::new()).await;
    let report = manager
        .delete_all_webhooks(&connection.shop_domain)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.deleted, vec![11, 12]);
}

#[tokio::test]
async fn test_delete_all_issues_no_deletes_when_listing_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/webhooks.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": "[API] Invalid API key or access token"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (manager, connection) = create_manager(&server, WebhookTopics::new()).await;
    let result = manager.delete_all_webhooks(&connection.shop_domain).await;

    match result {
        Err(ApiError::Upstream { status, message, .. }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("Expected Upstream, got {other:?}"),
    }
}

// === Delivery verification ===

#[test]
fn test_delivery_built_from_headers_verifies() {
    let config = ShopifyConfig::builder()
        .api_key(ApiKey::new("test-api-key").unwrap())
        .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
        .app_url(HostUrl::new("https://myapp.example.com").unwrap())
        .build()
        .unwrap();
    let body = br#"{"id":820982911946154508}"#.to_vec();
    let signature = compute_signature_base64(&body, "test-secret");
    let headers: HashMap<&str, &str> = HashMap::from([
        (HEADER_HMAC, signature.as_str()),
        (HEADER_TOPIC, "orders/create"),
        (HEADER_SHOP_DOMAIN, SHOP),
    ]);

    let request =
        WebhookRequest::from_headers(body.clone(), |name| headers.get(name).copied()).unwrap();
    let context = verify_webhook(&config, &request).unwrap();
    assert_eq!(context.topic(), Some("orders/create"));

    let mut tampered = body;
    tampered.push(b' ');
    let request = WebhookRequest::new(tampered, signature.clone());
    assert_eq!(verify_webhook(&config, &request), Err(WebhookError::InvalidHmac));
}

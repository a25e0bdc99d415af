//! Remote webhook subscription management.

use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};

use crate::auth::MerchantConnection;
use crate::clients::{ApiCaller, ApiError, HttpMethod, HttpRequest};
use crate::config::{ShopDomain, ShopifyConfig};
use crate::store::{require_connection, MerchantStore};
use crate::webhooks::types::{
    Webhook, WebhookDeletionReport, WebhookFailure, WebhookSubscription, WebhookSyncReport,
};

const WEBHOOKS_ENDPOINT: &str = "/admin/webhooks.json";

/// Creates, lists and deletes a shop's webhook subscriptions.
///
/// Every operation first resolves the shop's [`MerchantConnection`] from the
/// store; a shop without one fails with [`ApiError::MissingCredentials`]
/// before any request is made.
///
/// Delivery addresses have the form
/// `{webhook_base_url}/{topic}/{connection id}`, so an incoming delivery can
/// be routed back to the connection it was registered for.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shopify_app_auth::{InMemoryMerchantStore, ShopDomain, WebhookManager};
/// # use shopify_app_auth::ShopifyConfig;
///
/// # async fn run(config: Arc<ShopifyConfig>) -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(InMemoryMerchantStore::new());
/// let manager = WebhookManager::new(config, store)?;
///
/// let shop = ShopDomain::new("my-store")?;
/// let report = manager.register_webhooks_required_for_app(&shop).await?;
/// println!("registered {} of {}", report.registered.len(), report.attempted());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct WebhookManager {
    caller: ApiCaller,
    store: Arc<dyn MerchantStore>,
}

// Verify WebhookManager is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookManager>();
};

impl WebhookManager {
    /// Creates a manager with its own [`ApiCaller`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(
        config: Arc<ShopifyConfig>,
        store: Arc<dyn MerchantStore>,
    ) -> Result<Self, ApiError> {
        Ok(Self::with_caller(ApiCaller::new(config)?, store))
    }

    /// Creates a manager around an existing caller.
    #[must_use]
    pub fn with_caller(caller: ApiCaller, store: Arc<dyn MerchantStore>) -> Self {
        Self { caller, store }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShopifyConfig {
        self.caller.config()
    }

    /// Returns the caller used for platform requests.
    #[must_use]
    pub const fn caller(&self) -> &ApiCaller {
        &self.caller
    }

    /// Returns the store connections are resolved from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MerchantStore> {
        &self.store
    }

    /// Builds the subscription for `topic/event` delivered to `connection`.
    #[must_use]
    pub fn webhook_descriptor(
        &self,
        connection: &MerchantConnection,
        topic: &str,
        event: &str,
    ) -> WebhookSubscription {
        let address = self
            .config()
            .webhook_base_url()
            .join(&format!("{topic}/{}", connection.id));
        WebhookSubscription::new(topic, event, address)
    }

    /// Creates one subscription for `shop`.
    ///
    /// Registering the same pair twice issues two create calls; whether the
    /// platform accepts the duplicate is up to the platform.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingCredentials`] if `shop` has no connection
    /// - [`ApiError::Upstream`] if the platform rejects the subscription
    /// - [`ApiError::Decode`] if the response does not contain a webhook
    pub async fn register_webhook(
        &self,
        shop: &ShopDomain,
        topic: &str,
        event: &str,
    ) -> Result<Webhook, ApiError> {
        let connection = require_connection(self.store.as_ref(), shop).await?;
        let subscription = self.webhook_descriptor(&connection, topic, event);
        self.create(&connection, &subscription).await
    }

    /// Starts [`register_webhook`](Self::register_webhook) on the runtime
    /// without waiting for it.
    ///
    /// The outcome is logged. Awaiting the handle is optional.
    pub fn spawn_register_webhook(
        &self,
        shop: ShopDomain,
        topic: impl Into<String>,
        event: impl Into<String>,
    ) -> JoinHandle<Result<Webhook, ApiError>> {
        let manager = self.clone();
        let topic = topic.into();
        let event = event.into();

        tokio::spawn(async move {
            let result = manager.register_webhook(&shop, &topic, &event).await;
            if let Err(error) = &result {
                tracing::warn!(
                    shop = %shop,
                    topic = %topic,
                    event = %event,
                    error = %error,
                    "Background webhook registration failed"
                );
            }
            result
        })
    }

    /// Creates every subscription the config declares for `shop`.
    ///
    /// One create call is issued per `(topic, event)` pair, all running
    /// concurrently. Individual failures are collected in the report rather
    /// than aborting the others.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingCredentials`] if `shop` has no connection
    /// - [`ApiError::Store`] if the store fails
    pub async fn register_webhooks_required_for_app(
        &self,
        shop: &ShopDomain,
    ) -> Result<WebhookSyncReport, ApiError> {
        let connection = require_connection(self.store.as_ref(), shop).await?;
        let mut tasks = JoinSet::new();

        for (topic, event) in self.config().webhooks().pairs() {
            let subscription = self.webhook_descriptor(&connection, topic, event);
            let manager = self.clone();
            let connection = connection.clone();
            tasks.spawn(async move {
                let result = manager.create(&connection, &subscription).await;
                (subscription, result)
            });
        }

        let mut report = WebhookSyncReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(webhook))) => report.registered.push(webhook),
                Ok((subscription, Err(error))) => {
                    tracing::warn!(
                        shop = %shop,
                        topic = %subscription.full_topic(),
                        error = %error,
                        "Webhook registration failed"
                    );
                    report.failed.push(WebhookFailure {
                        subscription,
                        error,
                    });
                }
                Err(error) => {
                    tracing::error!(
                        shop = %shop,
                        error = %error,
                        "Webhook registration task aborted"
                    );
                    report.aborted += 1;
                }
            }
        }

        report.registered.sort_by(|a, b| a.topic.cmp(&b.topic));
        report
            .failed
            .sort_by_key(|failure| failure.subscription.full_topic());

        tracing::info!(
            shop = %shop,
            registered = report.registered.len(),
            failed = report.failed.len(),
            "Registered required webhooks"
        );
        Ok(report)
    }

    /// Lists the shop's remote subscriptions.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingCredentials`] if `shop` has no connection
    /// - [`ApiError::Upstream`] if the platform rejects the call
    /// - [`ApiError::Decode`] if the response has no `webhooks` array
    pub async fn list_webhooks(&self, shop: &ShopDomain) -> Result<Vec<Webhook>, ApiError> {
        let connection = require_connection(self.store.as_ref(), shop).await?;
        self.list(&connection).await
    }

    /// Deletes one remote subscription.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingCredentials`] if `shop` has no connection
    /// - [`ApiError::Upstream`] if the platform rejects the call
    pub async fn delete_webhook(&self, shop: &ShopDomain, id: u64) -> Result<(), ApiError> {
        let connection = require_connection(self.store.as_ref(), shop).await?;
        self.delete(&connection, id).await
    }

    /// Deletes every remote subscription for `shop`.
    ///
    /// Lists first, then issues one delete per subscription. A failed
    /// delete is recorded and the remaining deletes still run.
    ///
    /// # Errors
    ///
    /// Any error from listing is returned as-is and no delete is issued.
    pub async fn delete_all_webhooks(
        &self,
        shop: &ShopDomain,
    ) -> Result<WebhookDeletionReport, ApiError> {
        let connection = require_connection(self.store.as_ref(), shop).await?;
        let webhooks = self.list(&connection).await?;

        let mut report = WebhookDeletionReport::default();
        for webhook in webhooks {
            match self.delete(&connection, webhook.id).await {
                Ok(()) => report.deleted.push(webhook.id),
                Err(error) => {
                    tracing::warn!(
                        shop = %shop,
                        webhook_id = webhook.id,
                        error = %error,
                        "Webhook deletion failed"
                    );
                    report.failed.push((webhook.id, error));
                }
            }
        }

        tracing::info!(
            shop = %shop,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Deleted webhooks"
        );
        Ok(report)
    }

    async fn create(
        &self,
        connection: &MerchantConnection,
        subscription: &WebhookSubscription,
    ) -> Result<Webhook, ApiError> {
        let request = HttpRequest::builder(HttpMethod::Post, WEBHOOKS_ENDPOINT)
            .body(subscription.to_payload())
            .build()?;
        let response = self.caller.call(connection, &request).await?;

        let webhook: Webhook = decode(&response.body["webhook"])?;
        tracing::debug!(
            shop = %connection.shop_domain,
            topic = %webhook.topic,
            webhook_id = webhook.id,
            "Webhook registered"
        );
        Ok(webhook)
    }

    async fn list(&self, connection: &MerchantConnection) -> Result<Vec<Webhook>, ApiError> {
        let request = HttpRequest::get(WEBHOOKS_ENDPOINT).build()?;
        let response = self.caller.call(connection, &request).await?;
        decode(&response.body["webhooks"])
    }

    async fn delete(&self, connection: &MerchantConnection, id: u64) -> Result<(), ApiError> {
        let request =
            HttpRequest::builder(HttpMethod::Delete, format!("/admin/webhooks/{id}.json"))
                .build()?;
        self.caller.call(connection, &request).await?;
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &serde_json::Value) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessToken, ApiKey, ApiSecretKey, HostUrl, WebhookTopics};
    use crate::store::InMemoryMerchantStore;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn manager_for(
        server: &MockServer,
        webhooks: WebhookTopics,
    ) -> (WebhookManager, MerchantConnection) {
        let config = ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .app_url(HostUrl::new("https://myapp.example.com").unwrap())
            .webhook_base_url(HostUrl::new("https://hooks.example.com").unwrap())
            .api_host(HostUrl::new(server.uri()).unwrap())
            .webhooks(webhooks)
            .build()
            .unwrap();
        let store = InMemoryMerchantStore::new();
        let connection = MerchantConnection::new(
            ShopDomain::new("my-store").unwrap(),
            AccessToken::new("tok"),
            Default::default(),
        );
        store.save(connection.clone()).await.unwrap();

        let manager = WebhookManager::new(Arc::new(config), Arc::new(store)).unwrap();
        (manager, connection)
    }

    fn webhook_json(id: u64, topic: &str) -> serde_json::Value {
        json!({
            "id": id,
            "topic": topic,
            "address": "https://hooks.example.com/x",
            "format": "json"
        })
    }

    #[tokio::test]
    async fn test_webhook_descriptor_addresses_connection() {
        let server = MockServer::start().await;
        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;

        let subscription = manager.webhook_descriptor(&connection, "orders", "create");
        assert_eq!(
            subscription.address,
            format!("https://hooks.example.com/orders/{}", connection.id)
        );
        assert_eq!(subscription.full_topic(), "orders/create");
    }

    #[tokio::test]
    async fn test_register_webhook_posts_subscription() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/webhooks.json"))
            .and(header("X-Shopify-Access-Token", "tok"))
            .and(body_partial_json(json!({
                "webhook": {"topic": "orders/create", "format": "json"}
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"webhook": webhook_json(7, "orders/create")})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;
        let webhook = manager
            .register_webhook(&connection.shop_domain, "orders", "create")
            .await
            .unwrap();

        assert_eq!(webhook.id, 7);
        assert_eq!(webhook.topic, "orders/create");
    }

    #[tokio::test]
    async fn test_register_webhook_without_connection_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (manager, _) = manager_for(&server, WebhookTopics::new()).await;
        let unknown = ShopDomain::new("unknown").unwrap();
        let result = manager.register_webhook(&unknown, "orders", "create").await;

        assert!(matches!(result, Err(ApiError::MissingCredentials { .. })));
    }

    #[tokio::test]
    async fn test_spawn_register_webhook_returns_result_through_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/webhooks.json"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"webhook": webhook_json(9, "app/uninstalled")})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;
        let handle =
            manager.spawn_register_webhook(connection.shop_domain.clone(), "app", "uninstalled");

        let webhook = handle.await.unwrap().unwrap();
        assert_eq!(webhook.id, 9);
    }

    #[tokio::test]
    async fn test_register_required_collects_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"webhook": {"topic": "orders/create"}})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"webhook": webhook_json(1, "orders/create")})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"webhook": {"topic": "orders/paid"}})))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({
                    "errors": {"address": ["for this topic has already been taken"]}
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let topics = WebhookTopics::new()
            .with("orders", ["create", "paid"])
            .unwrap();
        let (manager, connection) = manager_for(&server, topics).await;

        let report = manager
            .register_webhooks_required_for_app(&connection.shop_domain)
            .await
            .unwrap();

        assert_eq!(report.registered.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].subscription.full_topic(), "orders/paid");
        assert_eq!(report.failed[0].error.status(), Some(422));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_list_webhooks_rejects_unexpected_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/webhooks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hooks": []})))
            .mount(&server)
            .await;

        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;
        let result = manager.list_webhooks(&connection.shop_domain).await;

        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_delete_webhook_issues_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/webhooks/42.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;
        manager
            .delete_webhook(&connection.shop_domain, 42)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_continues_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/webhooks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "webhooks": [webhook_json(1, "orders/create"), webhook_json(2, "orders/paid")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/admin/webhooks/1.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": "Not Found"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/admin/webhooks/2.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (manager, connection) = manager_for(&server, WebhookTopics::new()).await;
        let report = manager
            .delete_all_webhooks(&connection.shop_domain)
            .await
            .unwrap();

        assert_eq!(report.deleted, vec![2]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
    }
}

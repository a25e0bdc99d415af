//! Verification of incoming webhook deliveries.
//!
//! The platform signs each delivery body with HMAC-SHA256 keyed by the
//! app's API secret and sends the base64 digest in [`HEADER_HMAC`].
//! [`verify_webhook`] checks that digest against the primary secret and then
//! the old one, so deliveries keep verifying during a secret rotation.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::webhooks::{verify_webhook, WebhookRequest};
//! use shopify_app_auth::auth::oauth::hmac::compute_signature_base64;
//! use shopify_app_auth::{ApiKey, ApiSecretKey, HostUrl, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = b"{\"id\":1}";
//! let request = WebhookRequest::new(body.to_vec(), compute_signature_base64(body, "my-secret"))
//!     .with_topic("orders/create")
//!     .with_shop_domain("my-store.myshopify.com");
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic(), Some("orders/create"));
//! ```

use crate::auth::oauth::hmac::{compute_signature_base64, constant_time_compare, matches_any_secret};
use crate::auth::ConnectionId;
use crate::config::{ShopDomain, ShopifyConfig};
use crate::webhooks::WebhookError;

/// Header carrying the base64 HMAC-SHA256 of the body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Header carrying the full topic, e.g. `orders/create`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// Header carrying the shop's domain.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// Header carrying the unique delivery id.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// An incoming delivery: the raw body plus the headers relevant to it.
///
/// The body must be the exact bytes received; re-serialized JSON will not
/// verify.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a request from the raw body and the [`HEADER_HMAC`] value.
    #[must_use]
    pub fn new(body: Vec<u8>, hmac_header: impl Into<String>) -> Self {
        Self {
            body,
            hmac_header: hmac_header.into(),
            topic: None,
            shop_domain: None,
            webhook_id: None,
        }
    }

    /// Builds a request from a header lookup, such as one over a framework's
    /// header map.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::MissingHeader`] if [`HEADER_HMAC`] is absent.
    pub fn from_headers<'a, F>(body: Vec<u8>, header: F) -> Result<Self, WebhookError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let hmac = header(HEADER_HMAC).ok_or(WebhookError::MissingHeader {
            header: HEADER_HMAC,
        })?;

        Ok(Self {
            body,
            hmac_header: hmac.to_string(),
            topic: header(HEADER_TOPIC).map(String::from),
            shop_domain: header(HEADER_SHOP_DOMAIN).map(String::from),
            webhook_id: header(HEADER_WEBHOOK_ID).map(String::from),
        })
    }

    /// Sets the topic header value.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the shop domain header value.
    #[must_use]
    pub fn with_shop_domain(mut self, shop_domain: impl Into<String>) -> Self {
        self.shop_domain = Some(shop_domain.into());
        self
    }

    /// Sets the delivery id header value.
    #[must_use]
    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the signature header value.
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }
}

/// Metadata of a delivery whose signature verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: Option<String>,
    shop_domain: Option<ShopDomain>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Returns the full topic, if the header was present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the shop domain, if the header was present and valid.
    #[must_use]
    pub const fn shop_domain(&self) -> Option<&ShopDomain> {
        self.shop_domain.as_ref()
    }

    /// Returns the delivery id, if the header was present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Checks `hmac_header` against the body signed with a single `secret`.
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    constant_time_compare(&compute_signature_base64(raw_body, secret), hmac_header)
}

/// Verifies a delivery with the primary secret, falling back to the old one.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidHmac`] if neither secret produces the
/// received signature.
pub fn verify_webhook(
    config: &ShopifyConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    let verified = matches_any_secret(config, request.hmac_header(), |secret| {
        compute_signature_base64(request.body(), secret)
    });

    if !verified {
        tracing::warn!(
            shop = request.shop_domain.as_deref().unwrap_or("unknown"),
            "Rejected webhook with invalid signature"
        );
        return Err(WebhookError::InvalidHmac);
    }

    Ok(WebhookContext {
        topic: request.topic.clone(),
        shop_domain: request
            .shop_domain
            .as_deref()
            .and_then(|domain| ShopDomain::new(domain).ok()),
        webhook_id: request.webhook_id.clone(),
    })
}

/// Extracts the connection id from a delivery path of the form
/// `.../{topic}/{connection id}`.
///
/// Returns `None` if the last segment is not a connection id.
///
/// ```rust
/// use shopify_app_auth::webhooks::connection_id_from_path;
///
/// let id = connection_id_from_path("/webhooks/orders/67e55044-10b1-426f-9247-bb680e5fe0c8");
/// assert!(id.is_some());
/// assert!(connection_id_from_path("/webhooks/orders/").is_none());
/// ```
#[must_use]
pub fn connection_id_from_path(path: &str) -> Option<ConnectionId> {
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    uuid::Uuid::parse_str(last).ok().map(ConnectionId::from)
}

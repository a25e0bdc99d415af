//! Configuration types for the app.
//!
//! # Overview
//!
//! - [`ShopifyConfig`]: immutable app credentials and settings
//! - [`ShopifyConfigBuilder`]: builder for [`ShopifyConfig`]
//! - [`ShopifySettings`]: the serde view of a host settings block
//! - [`WebhookTopics`]: required webhook subscriptions
//! - [`ApiKey`], [`ApiSecretKey`], [`AccessToken`], [`ShopDomain`], [`HostUrl`]:
//!   validated newtypes
//!
//! A config is built once at startup and passed to every component by
//! reference or inside an `Arc`. There is no global instance.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{ShopifyConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.callback_url(), "https://myapp.example.com/shopify/authenticate");
//! ```

mod newtypes;
mod settings;
mod webhook_topics;

pub use newtypes::{AccessToken, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use settings::ShopifySettings;
pub use webhook_topics::WebhookTopics;

use crate::auth::oauth::SignableOrder;
use crate::auth::AuthScopes;
use crate::error::ConfigError;
use serde::Serialize;

/// Path on the app that receives the OAuth redirect.
pub const DEFAULT_CALLBACK_PATH: &str = "/shopify/authenticate";

/// App credentials and settings.
///
/// # Key Rotation
///
/// When `old_api_secret_key` is set, signature checks that fail with the
/// primary secret are retried with the old one, so in-flight installs
/// survive a secret rotation.
///
/// # Platform Host
///
/// Requests go to `https://{shop_name}.myshopify.com` unless `api_host` is
/// set, in which case every shop is reached through that base URL. This is
/// how proxies and mock servers are wired in.
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    app_url: HostUrl,
    callback_path: String,
    nonce: Option<String>,
    webhook_base_url: Option<HostUrl>,
    webhooks: WebhookTopics,
    shop: Option<ShopDomain>,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    signable_order: SignableOrder,
}

impl ShopifyConfig {
    /// Creates a new builder for constructing a `ShopifyConfig`.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the app URL.
    #[must_use]
    pub const fn app_url(&self) -> &HostUrl {
        &self.app_url
    }

    /// Returns the callback path.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Returns the absolute OAuth redirect URI.
    #[must_use]
    pub fn callback_url(&self) -> String {
        self.app_url.join(&self.callback_path)
    }

    /// Returns the fixed OAuth state, if configured.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Returns the base URL webhook deliveries are addressed to.
    ///
    /// Falls back to the app URL.
    #[must_use]
    pub fn webhook_base_url(&self) -> &HostUrl {
        self.webhook_base_url.as_ref().unwrap_or(&self.app_url)
    }

    /// Returns the required webhook subscriptions.
    #[must_use]
    pub const fn webhooks(&self) -> &WebhookTopics {
        &self.webhooks
    }

    /// Returns the default shop, if configured.
    ///
    /// [`authorize_from_launch`](crate::auth::oauth::authorize_from_launch)
    /// uses it when the launch query has no `shop`.
    #[must_use]
    pub const fn shop(&self) -> Option<&ShopDomain> {
        self.shop.as_ref()
    }

    /// Returns the platform base URL override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the parameter ordering used to build signed messages.
    #[must_use]
    pub const fn signable_order(&self) -> SignableOrder {
        self.signable_order
    }

    /// Returns the base URL for platform calls concerning `shop`.
    ///
    /// ```rust
    /// use shopify_app_auth::{ShopifyConfig, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
    ///
    /// let config = ShopifyConfig::builder()
    ///     .api_key(ApiKey::new("key").unwrap())
    ///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
    ///     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
    ///     .build()
    ///     .unwrap();
    ///
    /// let shop = ShopDomain::new("foo.myshopify.com").unwrap();
    /// assert_eq!(config.platform_base_url(&shop), "https://foo.myshopify.com");
    /// ```
    #[must_use]
    pub fn platform_base_url(&self, shop: &ShopDomain) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}{}", shop.shop_name(), ShopDomain::SUFFIX),
            ToString::to_string,
        )
    }

    /// Returns the client-safe subset of the config for `shop`.
    ///
    /// The secret is never part of this view.
    #[must_use]
    pub fn public_config(&self, shop: &ShopDomain) -> PublicConfig {
        PublicConfig {
            app_url: self.app_url.to_string(),
            shop: shop.shop_name().to_string(),
            api_key: self.api_key.as_ref().to_string(),
            scopes: self.scopes.clone(),
        }
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Config values that can be handed to the embedded frontend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    /// Public app URL.
    pub app_url: String,
    /// Bare shop name.
    pub shop: String,
    /// App client id.
    pub api_key: String,
    /// Requested scopes.
    pub scopes: AuthScopes,
}

/// Builder for constructing [`ShopifyConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key` and `app_url`.
///
/// # Defaults
///
/// - `scopes`: Empty
/// - `callback_path`: [`DEFAULT_CALLBACK_PATH`]
/// - `webhook_base_url`: same as `app_url`
/// - `webhooks`: Empty
/// - `signable_order`: [`SignableOrder::Lexicographic`]
/// - everything else: `None`
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    app_url: Option<HostUrl>,
    callback_path: Option<String>,
    nonce: Option<String>,
    webhook_base_url: Option<HostUrl>,
    webhooks: Option<WebhookTopics>,
    shop: Option<ShopDomain>,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    signable_order: Option<SignableOrder>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous API secret key for rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public app URL (required).
    #[must_use]
    pub fn app_url(mut self, url: HostUrl) -> Self {
        self.app_url = Some(url);
        self
    }

    /// Sets the path that receives the OAuth redirect.
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    /// Sets a fixed OAuth `state` value.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the base URL webhook deliveries are addressed to.
    #[must_use]
    pub fn webhook_base_url(mut self, url: HostUrl) -> Self {
        self.webhook_base_url = Some(url);
        self
    }

    /// Sets the required webhook subscriptions.
    #[must_use]
    pub fn webhooks(mut self, webhooks: WebhookTopics) -> Self {
        self.webhooks = Some(webhooks);
        self
    }

    /// Sets a default shop.
    #[must_use]
    pub fn shop(mut self, shop: ShopDomain) -> Self {
        self.shop = Some(shop);
        self
    }

    /// Routes all platform calls through `host` instead of the shop domain.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets how query parameters are ordered before signing.
    #[must_use]
    pub const fn signable_order(mut self, order: SignableOrder) -> Self {
        self.signable_order = Some(order);
        self
    }

    /// Builds the [`ShopifyConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret_key` or `app_url` are not set.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let app_url = self
            .app_url
            .ok_or(ConfigError::MissingRequiredField { field: "app_url" })?;

        Ok(ShopifyConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            app_url,
            callback_path: self
                .callback_path
                .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string()),
            nonce: self.nonce,
            webhook_base_url: self.webhook_base_url,
            webhooks: self.webhooks.unwrap_or_default(),
            shop: self.shop,
            api_host: self.api_host,
            user_agent_prefix: self.user_agent_prefix,
            signable_order: self.signable_order.unwrap_or_default(),
        })
    }
}

//! Loading [`ShopifyConfig`] from a host settings block or the environment.

use super::{ApiKey, ApiSecretKey, HostUrl, ShopDomain, ShopifyConfig, WebhookTopics};
use crate::auth::AuthScopes;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// The `shopify` block of the host application's settings file.
///
/// Field names follow the settings file (`apiKey`, `appUrl`, ...).
///
/// ```rust
/// use shopify_app_auth::{ShopifyConfig, ShopifySettings};
///
/// let settings: ShopifySettings = serde_json::from_str(r#"{
///     "apiKey": "key",
///     "secret": "secret",
///     "scopes": "read_orders,write_products",
///     "appUrl": "https://myapp.example.com",
///     "url": "https://hooks.example.com",
///     "webhooks": {"orders": ["create", "update"]}
/// }"#).unwrap();
///
/// let config = ShopifyConfig::from_settings(settings).unwrap();
/// assert_eq!(config.webhooks().len(), 2);
/// assert_eq!(config.webhook_base_url().as_ref(), "https://hooks.example.com");
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifySettings {
    /// App client id.
    pub api_key: String,
    /// App shared secret.
    pub secret: String,
    /// Previous shared secret, accepted while a rotation is in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_secret: Option<String>,
    /// Requested OAuth scopes.
    #[serde(default)]
    pub scopes: AuthScopes,
    /// Public base URL of the app.
    pub app_url: String,
    /// Base URL that webhook deliveries are addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Fixed OAuth `state` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Required webhook subscriptions.
    #[serde(default)]
    pub webhooks: WebhookTopics,
    /// Default shop for single-merchant deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    /// Platform base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
}

impl ShopifyConfig {
    /// Builds a configuration from a deserialized settings block.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any value fails validation. An empty
    /// `apiKey` or `secret` is reported as [`ConfigError::EmptyApiKey`] or
    /// [`ConfigError::EmptyApiSecretKey`].
    pub fn from_settings(settings: ShopifySettings) -> Result<Self, ConfigError> {
        let mut builder = Self::builder()
            .api_key(ApiKey::new(settings.api_key)?)
            .api_secret_key(ApiSecretKey::new(settings.secret)?)
            .scopes(settings.scopes)
            .app_url(HostUrl::new(settings.app_url)?)
            .webhooks(settings.webhooks);

        if let Some(old) = settings.old_secret {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(url) = settings.url {
            builder = builder.webhook_base_url(HostUrl::new(url)?);
        }
        if let Some(nonce) = settings.nonce.filter(|n| !n.is_empty()) {
            builder = builder.nonce(nonce);
        }
        if let Some(shop) = settings.shop {
            builder = builder.shop(ShopDomain::new(shop)?);
        }
        if let Some(host) = settings.api_host {
            builder = builder.api_host(HostUrl::new(host)?);
        }

        builder.build()
    }

    /// Builds a configuration from `SHOPIFY_*` environment variables.
    ///
    /// See [`from_env_with`](Self::from_env_with) for the variable names.
    ///
    /// # Errors
    ///
    /// Same as [`from_env_with`](Self::from_env_with).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from variables resolved through `lookup`.
    ///
    /// | Variable | Required | Meaning |
    /// |----------|----------|---------|
    /// | `SHOPIFY_API_KEY` | yes | client id |
    /// | `SHOPIFY_API_SECRET` | yes | shared secret |
    /// | `SHOPIFY_APP_URL` | yes | public app URL |
    /// | `SHOPIFY_SCOPES` | no | comma-separated scopes |
    /// | `SHOPIFY_WEBHOOK_URL` | no | webhook base URL |
    /// | `SHOPIFY_NONCE` | no | fixed OAuth state |
    /// | `SHOPIFY_WEBHOOKS` | no | JSON object, topic to array of events |
    /// | `SHOPIFY_SHOP` | no | default shop |
    /// | `SHOPIFY_API_HOST` | no | platform base URL override |
    ///
    /// ```rust
    /// use shopify_app_auth::ShopifyConfig;
    ///
    /// let config = ShopifyConfig::from_env_with(|name| match name {
    ///     "SHOPIFY_API_KEY" => Some("key".into()),
    ///     "SHOPIFY_API_SECRET" => Some("secret".into()),
    ///     "SHOPIFY_APP_URL" => Some("https://myapp.example.com".into()),
    ///     "SHOPIFY_WEBHOOKS" => Some(r#"{"app": ["uninstalled"]}"#.into()),
    ///     _ => None,
    /// }).unwrap();
    ///
    /// assert_eq!(config.webhooks().len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for an absent required
    /// variable, [`ConfigError::InvalidWebhooks`] if `SHOPIFY_WEBHOOKS` is not
    /// valid JSON, or any validation error from the individual values.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingEnvVar { name })
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let webhooks = match optional("SHOPIFY_WEBHOOKS") {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidWebhooks {
                    reason: e.to_string(),
                })?
            }
            None => WebhookTopics::default(),
        };

        let scopes = match optional("SHOPIFY_SCOPES") {
            Some(raw) => raw.parse()?,
            None => AuthScopes::default(),
        };

        Self::from_settings(ShopifySettings {
            api_key: required("SHOPIFY_API_KEY")?,
            secret: required("SHOPIFY_API_SECRET")?,
            old_secret: optional("SHOPIFY_OLD_API_SECRET"),
            scopes,
            app_url: required("SHOPIFY_APP_URL")?,
            url: optional("SHOPIFY_WEBHOOK_URL"),
            nonce: optional("SHOPIFY_NONCE"),
            webhooks,
            shop: optional("SHOPIFY_SHOP"),
            api_host: optional("SHOPIFY_API_HOST"),
        })
    }
}

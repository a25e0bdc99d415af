//! # Shopify App Auth
//!
//! Merchant authorization and webhook setup for embedded Shopify apps.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ShopifyConfig`] and [`ShopifyConfigBuilder`],
//!   loadable from a settings block or the environment
//! - HMAC-SHA256 validation of app launches, OAuth callbacks and webhook
//!   deliveries, with key rotation support
//! - The OAuth install flow: authorize URL, code exchange and callback
//!   handling via [`auth::oauth`]
//! - Persistence of [`MerchantConnection`]s behind the [`MerchantStore`] trait
//! - Token-authenticated REST calls via [`ApiCaller`]
//! - Webhook subscription management via [`WebhookManager`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_app_auth::{ShopifyConfig, ApiKey, ApiSecretKey, HostUrl, WebhookTopics};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .app_url(HostUrl::new("https://your-app.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .webhooks(WebhookTopics::new().with("orders", ["create", "paid"]).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.callback_url(), "https://your-app.example.com/shopify/authenticate");
//! ```
//!
//! ## Install Flow
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopify_app_auth::{InMemoryMerchantStore, WebhookManager};
//! use shopify_app_auth::auth::oauth::{authorize_from_launch, AuthFlow, QueryParams};
//!
//! // App launch: redirect the merchant to the authorize URL
//! let redirect = authorize_from_launch(&config, &QueryParams::parse(launch_query))?;
//!
//! // Callback: verify, exchange the code, store the connection, set up webhooks
//! let manager = WebhookManager::new(Arc::new(config), Arc::new(InMemoryMerchantStore::new()))?;
//! let flow = AuthFlow::new(manager);
//! let outcome = flow.complete(QueryParams::parse(callback_query), Some(user_id)).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **Typed failures**: every remote call returns `Result`; non-2xx
//!   responses are errors, never data

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod store;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AuthScopes, ConnectionId, MerchantConnection};
pub use config::{
    AccessToken, ApiKey, ApiSecretKey, HostUrl, PublicConfig, ShopDomain, ShopifyConfig,
    ShopifyConfigBuilder, ShopifySettings, WebhookTopics,
};
pub use error::ConfigError;
pub use store::{InMemoryMerchantStore, MerchantStore, StoreError};

// Re-export HTTP client types
pub use clients::{ApiCaller, ApiError, HttpMethod, HttpRequest, HttpResponse};

// Re-export OAuth types for convenience
pub use auth::oauth::{
    authorize_from_launch, begin_auth, exchange_access_token, AuthFlow, AuthOutcome, AuthQuery,
    BeginAuthResult, OAuthError, QueryParams, StateParam, WebhookBootstrap,
};

// Re-export webhook types
pub use webhooks::{verify_webhook, Webhook, WebhookError, WebhookManager, WebhookRequest};

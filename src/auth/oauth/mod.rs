//! OAuth authorization for embedded apps.
//!
//! # Install Flow
//!
//! 1. **App launch** ([`authorize_from_launch`]): the admin opens the app
//!    with a signed query. Once the signature verifies, the merchant's
//!    browser is redirected to the authorize URL.
//! 2. **Authorize URL** ([`begin_auth`]): carries `client_id`, `scope`,
//!    `redirect_uri` and `state`.
//! 3. **Callback** ([`AuthFlow::complete`]): the platform redirects back with
//!    `code`, `hmac`, `signature`, `shop` and `state`. The flow verifies the
//!    signature and state, exchanges the code
//!    ([`exchange_access_token`]), stores the connection and registers the
//!    app's webhooks if the shop has none.
//!
//! # Security Features
//!
//! - **HMAC Validation**: every signed request is verified with HMAC-SHA256
//!   over its parameters, with `hmac` and `signature` excluded
//! - **CSRF Protection**: the `state` parameter is compared against the
//!   configured nonce or the value issued by [`begin_auth`]
//! - **Constant-Time Comparison**: signatures and state are compared in
//!   constant time
//! - **Key Rotation Support**: signatures made with the old API secret are
//!   still accepted when one is configured
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::{begin_auth, AuthQuery, QueryParams, OAuthError};
//! use shopify_app_auth::{ShopifyConfig, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let result = begin_auth(&config, &ShopDomain::new("my-store").unwrap());
//! assert!(result.auth_url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?"));
//!
//! let callback = QueryParams::parse("shop=my-store.myshopify.com&code=abc");
//! match AuthQuery::from_params(callback) {
//!     Err(OAuthError::MissingParameters { missing }) => {
//!         assert_eq!(missing, vec!["hmac", "signature", "state"]);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod begin_auth;
mod error;
mod flow;
pub mod hmac;
mod query;
mod state;
mod token_exchange;

pub use begin_auth::{authorize_from_launch, begin_auth, BeginAuthResult};
pub use error::OAuthError;
pub use flow::{AuthFlow, AuthOutcome, WebhookBootstrap};
pub use hmac::{compute_signature, verify_params, SignableOrder};
pub use query::{AuthQuery, QueryParams};
pub use state::StateParam;
pub use token_exchange::{exchange_access_token, AccessTokenResponse};

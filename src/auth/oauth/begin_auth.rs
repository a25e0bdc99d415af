//! OAuth authorization URL generation.
//!
//! [`begin_auth`] is the first step of the install flow: it builds the URL
//! the merchant's browser is redirected to. [`authorize_from_launch`] does
//! the same starting from the query string the platform sends when the app
//! is opened from the admin.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{ShopifyConfig, ApiKey, ApiSecretKey, ShopDomain, HostUrl};
//! use shopify_app_auth::auth::oauth::begin_auth;
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .nonce("fixed-nonce")
//!     .build()
//!     .unwrap();
//!
//! let shop = ShopDomain::new("test-shop").unwrap();
//! let result = begin_auth(&config, &shop);
//!
//! assert_eq!(
//!     result.auth_url,
//!     "https://test-shop.myshopify.com/admin/oauth/authorize\
//!      ?client_id=api-key\
//!      &scope=read_products%2Cwrite_orders\
//!      &redirect_uri=https%3A%2F%2Fmyapp.example.com%2Fshopify%2Fauthenticate\
//!      &state=fixed-nonce"
//! );
//! ```

use crate::auth::oauth::hmac::verify_params;
use crate::auth::oauth::{OAuthError, QueryParams, StateParam};
use crate::config::{ShopDomain, ShopifyConfig};

/// An authorization URL and the state it carries.
///
/// When no nonce is configured the state is random, and the caller must
/// keep it to compare against the callback.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The URL to redirect the merchant to.
    pub auth_url: String,
    /// The `state` parameter embedded in `auth_url`.
    pub state: StateParam,
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};

/// Builds the platform authorize URL for `shop`.
///
/// The query carries `client_id`, `scope`, `redirect_uri` and `state`, each
/// percent-encoded. `state` is the configured nonce, or a random
/// [`StateParam`] when none is set. No network access.
#[must_use]
pub fn begin_auth(config: &ShopifyConfig, shop: &ShopDomain) -> BeginAuthResult {
    let state = config
        .nonce()
        .map_or_else(StateParam::new, |nonce| StateParam::from_raw(nonce));

    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", config.callback_url()),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}{}/admin/oauth/authorize?{}",
        shop.shop_name(),
        ShopDomain::SUFFIX,
        query_string
    );

    tracing::debug!(shop = %shop, "Built OAuth authorization URL");

    BeginAuthResult { auth_url, state }
}

/// Starts the install flow from an app launch request.
///
/// The launch query must carry `hmac` and `signature`. The shop comes from
/// its `shop` parameter, or from [`ShopifyConfig::shop`] when the query has
/// none. When the signature also verifies, the authorize URL for that shop
/// is returned.
///
/// # Errors
///
/// - [`OAuthError::MissingParameters`] if `hmac` or `signature` is absent,
///   or `shop` is absent and no default shop is configured
/// - [`OAuthError::InvalidRequest`] if `shop` is not a valid shop domain
/// - [`OAuthError::SignatureMismatch`] if `hmac` does not verify
pub fn authorize_from_launch(
    config: &ShopifyConfig,
    params: &QueryParams,
) -> Result<BeginAuthResult, OAuthError> {
    let mut missing = params.missing(&["hmac", "signature", "shop"]);
    if config.shop().is_some() {
        missing.retain(|name| *name != "shop");
    }
    if !missing.is_empty() {
        return Err(OAuthError::MissingParameters {
            missing: missing.into_iter().map(str::to_string).collect(),
        });
    }

    let shop = match params.get("shop").filter(|value| !value.is_empty()) {
        Some(raw) => ShopDomain::new(raw).map_err(|e| OAuthError::InvalidRequest {
            reason: e.to_string(),
        })?,
        None => config
            .shop()
            .cloned()
            .ok_or_else(|| OAuthError::MissingParameters {
                missing: vec!["shop".to_string()],
            })?,
    };

    if !verify_params(params, config) {
        tracing::warn!(shop = %shop, "Rejected app launch with invalid signature");
        return Err(OAuthError::SignatureMismatch);
    }

    Ok(begin_auth(config, &shop))
}

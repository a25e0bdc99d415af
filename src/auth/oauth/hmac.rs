//! HMAC signatures for OAuth requests and webhook deliveries.
//!
//! OAuth redirects and app launches carry a hex-encoded HMAC-SHA256 of
//! their other query parameters in `hmac`. Webhook deliveries carry a
//! base64-encoded HMAC-SHA256 of the raw body in a header.
//!
//! # Security
//!
//! All comparisons are constant-time. When an old secret is configured,
//! verification falls back to it if the primary secret does not match.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::hmac::{compute_signature, signable_string};
//! use shopify_app_auth::auth::oauth::{QueryParams, SignableOrder};
//!
//! let params = QueryParams::parse("shop=foo.myshopify.com&code=abc&hmac=ignored");
//! let message = signable_string(&params, SignableOrder::Lexicographic);
//! assert_eq!(message, "code=abc&shop=foo.myshopify.com");
//!
//! let signature = compute_signature(&message, "my-api-secret");
//! assert_eq!(signature.len(), 64);
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::QueryParams;
use crate::config::ShopifyConfig;

type HmacSha256 = Hmac<Sha256>;

/// Parameters excluded from the signed message.
const EXCLUDED_PARAMS: [&str; 2] = ["hmac", "signature"];

/// How parameters are ordered when building the signed message.
///
/// The platform documents that parameters are sorted by key before
/// signing. Some older integrations signed parameters in the order they
/// arrived; `AsReceived` reproduces that behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignableOrder {
    /// Sort pairs by key, then by value.
    #[default]
    Lexicographic,
    /// Keep pairs in received order.
    AsReceived,
}

/// Builds the message that the `hmac` parameter signs.
///
/// Drops `hmac` and `signature`, then joins the remaining pairs as
/// `key=value` with `&`. Keys and values are percent-encoded like a
/// browser's `encodeURIComponent`: ASCII letters, digits and
/// `-_.!~*'()` are left as-is.
#[must_use]
pub fn signable_string(params: &QueryParams, order: SignableOrder) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| !EXCLUDED_PARAMS.contains(key))
        .collect();

    if order == SignableOrder::Lexicographic {
        pairs.sort_unstable();
    }

    pairs
        .iter()
        .map(|(key, value)| {
            format!("{}={}", encode_component(key), encode_component(value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(raw: &str) -> String {
    const UNRESERVED: [(&str, &str); 5] =
        [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")];

    let mut encoded = urlencoding::encode(raw).into_owned();
    for (escaped, literal) in UNRESERVED {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}

/// Computes a lowercase hex HMAC-SHA256 of `message`.
///
/// ```rust
/// use shopify_app_auth::auth::oauth::hmac::compute_signature;
///
/// assert_eq!(
///     compute_signature("message", "key"),
///     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
/// );
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Computes a standard base64 HMAC-SHA256 of raw bytes.
///
/// Used for webhook bodies, which are signed without UTF-8 interpretation.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Returns `true` if `received` matches a signature produced by `sign` with
/// the primary secret or, failing that, the old secret.
pub(crate) fn matches_any_secret<F>(config: &ShopifyConfig, received: &str, sign: F) -> bool
where
    F: Fn(&str) -> String,
{
    if constant_time_compare(&sign(config.api_secret_key().as_ref()), received) {
        return true;
    }

    config
        .old_api_secret_key()
        .is_some_and(|old| constant_time_compare(&sign(old.as_ref()), received))
}

/// Verifies the `hmac` parameter of an OAuth redirect or app launch.
///
/// Returns `false` when `hmac` is absent. Uses the parameter ordering
/// configured through [`ShopifyConfig::signable_order`].
#[must_use]
pub fn verify_params(params: &QueryParams, config: &ShopifyConfig) -> bool {
    let Some(received) = params.get("hmac") else {
        return false;
    };

    let message = signable_string(params, config.signable_order());
    matches_any_secret(config, received, |secret| {
        compute_signature(&message, secret)
    })
}

//! Query parameter handling for OAuth requests.

use crate::auth::oauth::OAuthError;
use std::borrow::Cow;

/// An ordered list of query parameters as received.
///
/// Keys may repeat; lookups return the first value. Ordering is preserved
/// so that signatures can be computed over the exact received sequence
/// when [`SignableOrder::AsReceived`](super::SignableOrder::AsReceived) is
/// configured.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::auth::oauth::QueryParams;
///
/// let params = QueryParams::parse("?shop=foo.myshopify.com&code=abc%20123&note=a+b");
/// assert_eq!(params.get("shop"), Some("foo.myshopify.com"));
/// assert_eq!(params.get("code"), Some("abc 123"));
/// assert_eq!(params.get("note"), Some("a b"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string, with or without the leading `?`.
    ///
    /// Percent-escapes are decoded and `+` is read as a space. Invalid UTF-8
    /// sequences are replaced rather than rejected.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        raw.split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(key), decode_component(value))
            })
            .collect()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first non-empty value for `key`.
    fn get_present(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Iterates pairs in received order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the names in `required` that are absent or empty.
    #[must_use]
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get_present(name).is_none())
            .collect()
    }

    /// Fails with [`OAuthError::MissingParameters`] listing every name in
    /// `required` that is absent or empty.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn require(&self, required: &[&str]) -> Result<(), OAuthError> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OAuthError::MissingParameters {
                missing: missing.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn decode_component(component: &str) -> String {
    let component = component.replace('+', " ");
    match urlencoding::decode_binary(component.as_bytes()) {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// The parameters of the OAuth redirect callback.
///
/// All five of `hmac`, `signature`, `shop`, `code` and `state` are required.
/// The full received parameter list is kept for signature verification.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::auth::oauth::{AuthQuery, OAuthError, QueryParams};
///
/// let params = QueryParams::parse("shop=foo.myshopify.com&code=abc");
/// let err = AuthQuery::from_params(params).unwrap_err();
/// assert!(matches!(
///     err,
///     OAuthError::MissingParameters { ref missing } if missing == &["hmac", "signature", "state"]
/// ));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthQuery {
    /// The signature to verify.
    pub hmac: String,
    /// The legacy signature parameter.
    pub signature: String,
    /// The merchant's shop domain.
    pub shop: String,
    /// The authorization code to exchange.
    pub code: String,
    /// The nonce round-tripped through the redirect.
    pub state: String,
    params: QueryParams,
}

impl AuthQuery {
    /// Parameter names the callback must carry.
    pub const REQUIRED: [&'static str; 5] = ["hmac", "signature", "shop", "code", "state"];

    /// Extracts the callback fields from `params`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingParameters`] naming every required
    /// parameter that is absent or empty.
    pub fn from_params(params: QueryParams) -> Result<Self, OAuthError> {
        params.require(&Self::REQUIRED)?;

        let field = |name: &str| params.get(name).unwrap_or_default().to_string();
        Ok(Self {
            hmac: field("hmac"),
            signature: field("signature"),
            shop: field("shop"),
            code: field("code"),
            state: field("state"),
            params,
        })
    }

    /// The full parameter list the callback was received with.
    #[must_use]
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_callback() -> QueryParams {
        QueryParams::parse(
            "hmac=deadbeef&signature=sig&shop=foo.myshopify.com&code=abc&state=nonce&timestamp=1",
        )
    }

    #[test]
    fn test_parse_keeps_received_order_and_duplicates() {
        let params = QueryParams::parse("b=2&a=1&b=3");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1"), ("b", "3")]);
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn test_parse_handles_missing_values_and_empty_segments() {
        let params = QueryParams::parse("flag&&key=");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("key"), Some(""));
    }

    #[test]
    fn test_parse_decodes_percent_escapes() {
        let params = QueryParams::parse("redirect=https%3A%2F%2Fexample.com%2Fcb");
        assert_eq!(params.get("redirect"), Some("https://example.com/cb"));
    }

    #[test]
    fn test_auth_query_extracts_fields() {
        let query = AuthQuery::from_params(full_callback()).unwrap();
        assert_eq!(query.shop, "foo.myshopify.com");
        assert_eq!(query.code, "abc");
        assert_eq!(query.state, "nonce");
        assert_eq!(query.params().get("timestamp"), Some("1"));
    }

    #[test]
    fn test_auth_query_lists_every_missing_field() {
        let err = AuthQuery::from_params(QueryParams::new()).unwrap_err();
        match err {
            OAuthError::MissingParameters { missing } => {
                assert_eq!(missing, vec!["hmac", "signature", "shop", "code", "state"]);
            }
            other => panic!("Expected MissingParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_auth_query_treats_empty_value_as_missing() {
        let params: QueryParams = [
            ("hmac", "h"),
            ("signature", "s"),
            ("shop", "foo.myshopify.com"),
            ("code", ""),
            ("state", "n"),
        ]
        .into_iter()
        .collect();

        let err = AuthQuery::from_params(params).unwrap_err();
        assert!(matches!(
            err,
            OAuthError::MissingParameters { ref missing } if missing == &["code"]
        ));
    }
}

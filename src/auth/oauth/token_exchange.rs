//! Authorization code exchange.
//!
//! After the merchant approves the install, the platform redirects back
//! with a short-lived `code`. [`exchange_access_token`] trades it for a
//! durable access token.

use serde::{Deserialize, Serialize};

use crate::auth::oauth::OAuthError;
use crate::auth::{AuthScopes, MerchantConnection};
use crate::config::{AccessToken, ShopDomain, ShopifyConfig};

/// Request body for the token endpoint.
#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Successful token endpoint response.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The durable access token.
    pub access_token: String,
    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,
}

/// Exchanges an authorization `code` for an access token.
///
/// POSTs `{client_id, client_secret, code}` as JSON to
/// `https://{shop_name}.myshopify.com/admin/oauth/access_token` (or the
/// configured `api_host`). On a 200 response the returned
/// [`MerchantConnection`] carries the normalized shop domain and the new
/// token; it is not persisted. Awaiting this function suspends only the
/// calling task.
///
/// # Errors
///
/// - [`OAuthError::InvalidRequest`] if `code` or `shop` is empty, or `shop`
///   is not a valid shop domain
/// - [`OAuthError::TokenExchangeFailed`] for any non-200 status, a transport
///   failure (`status` 0), or an unreadable 200 body
///
/// # Example
///
/// ```rust,no_run
/// use shopify_app_auth::auth::oauth::exchange_access_token;
/// # use shopify_app_auth::ShopifyConfig;
///
/// # use shopify_app_auth::auth::oauth::OAuthError;
/// # async fn run(config: &ShopifyConfig) -> Result<(), OAuthError> {
/// let client = reqwest::Client::new();
/// let connection =
///     exchange_access_token(config, &client, "foo.myshopify.com", "auth-code").await?;
/// assert_eq!(connection.shop_domain.as_ref(), "foo.myshopify.com");
/// # Ok(())
/// # }
/// ```
pub async fn exchange_access_token(
    config: &ShopifyConfig,
    client: &reqwest::Client,
    shop: &str,
    code: &str,
) -> Result<MerchantConnection, OAuthError> {
    if shop.trim().is_empty() || code.trim().is_empty() {
        return Err(OAuthError::InvalidRequest {
            reason: "shop OR code parameters missing".to_string(),
        });
    }

    let shop = ShopDomain::new(shop).map_err(|e| OAuthError::InvalidRequest {
        reason: e.to_string(),
    })?;

    let token_url = format!(
        "{}/admin/oauth/access_token",
        config.platform_base_url(&shop)
    );
    let request_body = AccessTokenRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    tracing::info!(shop = %shop, "Requesting permanent access token");

    let response = client
        .post(&token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: format!("Network error: {e}"),
        })?;

    let status = response.status().as_u16();

    if status != 200 {
        let error_body = response.text().await.unwrap_or_default();
        tracing::warn!(shop = %shop, status, "Access token exchange rejected");
        return Err(OAuthError::TokenExchangeFailed {
            status,
            message: error_body,
        });
    }

    let token_response: AccessTokenResponse =
        response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status,
                message: format!("Failed to parse token response: {e}"),
            })?;

    let scopes = token_response
        .scope
        .parse::<AuthScopes>()
        .ok()
        .filter(|granted| !granted.is_empty())
        .unwrap_or_else(|| config.scopes().clone());

    tracing::info!(shop = %shop, "Permanent access token generated");

    Ok(MerchantConnection::new(
        shop,
        AccessToken::new(token_response.access_token),
        scopes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ShopifyConfig {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .app_url(HostUrl::new("https://myapp.example.com").unwrap())
            .api_host(HostUrl::new(server.uri()).unwrap())
            .scopes("read_orders".parse().unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_code() {
        let server = MockServer::start().await;
        let config = config_for(&server);
        let client = reqwest::Client::new();

        let result = exchange_access_token(&config, &client, "x", "").await;
        assert!(matches!(result, Err(OAuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_shop() {
        let server = MockServer::start().await;
        let config = config_for(&server);
        let client = reqwest::Client::new();

        let result = exchange_access_token(&config, &client, "", "abc").await;
        assert!(matches!(result, Err(OAuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_exchange_rejects_foreign_domain() {
        let server = MockServer::start().await;
        let config = config_for(&server);
        let client = reqwest::Client::new();

        let result = exchange_access_token(&config, &client, "evil.example.com", "abc").await;
        assert!(matches!(result, Err(OAuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_exchange_returns_connection_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json(json!({
                "client_id": "test-api-key",
                "client_secret": "test-secret",
                "code": "abc"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "scope": "read_orders,write_orders"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let client = reqwest::Client::new();
        let connection = exchange_access_token(&config, &client, "foo.myshopify.com", "abc")
            .await
            .unwrap();

        assert_eq!(connection.shop_domain.as_ref(), "foo.myshopify.com");
        assert_eq!(connection.shop_domain.shop_name(), "foo");
        assert_eq!(connection.access_token.as_ref(), "tok");
        assert_eq!(connection.scopes.to_string(), "read_orders,write_orders");
    }

    #[tokio::test]
    async fn test_exchange_reports_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_request"))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let client = reqwest::Client::new();
        let result = exchange_access_token(&config, &client, "foo", "abc").await;

        match result {
            Err(OAuthError::TokenExchangeFailed { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid_request");
            }
            other => panic!("Expected TokenExchangeFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_reports_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let client = reqwest::Client::new();
        let result = exchange_access_token(&config, &client, "foo", "abc").await;

        assert!(matches!(
            result,
            Err(OAuthError::TokenExchangeFailed { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_exchange_reports_network_failure_as_status_zero() {
        let config = ShopifyConfig::builder()
            .api_key(ApiKey::new("k").unwrap())
            .api_secret_key(ApiSecretKey::new("s").unwrap())
            .app_url(HostUrl::new("https://myapp.example.com").unwrap())
            .api_host(HostUrl::new("http://127.0.0.1:1").unwrap())
            .build()
            .unwrap();
        let client = reqwest::Client::new();

        let result = exchange_access_token(&config, &client, "foo", "abc").await;
        assert!(matches!(
            result,
            Err(OAuthError::TokenExchangeFailed { status: 0, .. })
        ));
    }
}

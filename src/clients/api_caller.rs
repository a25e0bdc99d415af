//! Authenticated calls to the platform REST API.

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::MerchantConnection;
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::{first_header, HttpResponse};
use crate::config::{ShopDomain, ShopifyConfig};
use crate::store::{require_connection, MerchantStore};

/// The crate version, reported in the `User-Agent` header.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the merchant's access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Issues requests on behalf of a merchant using its stored access token.
///
/// Requests go to `https://{shop_name}.myshopify.com{endpoint}`, or to
/// `{api_host}{endpoint}` when the config overrides the platform host. No
/// request is retried.
///
/// Cloning is cheap; clones share the connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shopify_app_auth::clients::{ApiCaller, HttpRequest};
/// # use shopify_app_auth::{ShopifyConfig, MerchantConnection};
///
/// # async fn run(
/// #     config: Arc<ShopifyConfig>,
/// #     connection: MerchantConnection,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let caller = ApiCaller::new(config)?;
/// let request = HttpRequest::get("/admin/shop.json").build()?;
/// let response = caller.call(&connection, &request).await?;
/// println!("{}", response.body["shop"]["name"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ApiCaller {
    client: reqwest::Client,
    config: Arc<ShopifyConfig>,
    user_agent: String,
}

// Verify ApiCaller is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiCaller>();
};

impl ApiCaller {
    /// Creates a caller with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialised.
    pub fn new(config: Arc<ShopifyConfig>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a caller around an existing `reqwest` client.
    #[must_use]
    pub fn with_client(config: Arc<ShopifyConfig>, client: reqwest::Client) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}Shopify App Auth v{LIBRARY_VERSION} | Rust");

        Self {
            client,
            config,
            user_agent,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    /// Returns the shared configuration handle.
    #[must_use]
    pub const fn config_arc(&self) -> &Arc<ShopifyConfig> {
        &self.config
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Returns the `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Builds the absolute URL for `endpoint` on `shop`.
    #[must_use]
    pub fn url_for(&self, shop: &ShopDomain, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.platform_base_url(shop))
    }

    /// Sends `request` with the connection's access token.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingCredentials`] if the connection has no token
    /// - [`ApiError::InvalidRequest`] if the request fails verification
    /// - [`ApiError::Upstream`] for any non-2xx response
    /// - [`ApiError::Network`] if the request could not be sent
    /// - [`ApiError::Decode`] if a 2xx body is not JSON
    pub async fn call(
        &self,
        connection: &MerchantConnection,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        if !connection.is_active() {
            return Err(ApiError::MissingCredentials {
                shop: connection.shop_domain.to_string(),
            });
        }
        request.verify()?;

        let url = self.url_for(&connection.shop_domain, &request.endpoint);
        tracing::debug!(
            shop = %connection.shop_domain,
            method = %request.http_method,
            endpoint = %request.endpoint,
            "Calling Shopify API"
        );

        let mut builder = self
            .client
            .request(request.http_method.as_reqwest(), &url)
            .header(ACCESS_TOKEN_HEADER, connection.access_token.as_ref())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent);

        for (key, value) in &request.extra_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let res = builder.send().await?;

        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;

        if !(200..=299).contains(&code) {
            let body = serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }));
            let error_reference = first_header(&headers, "x-request-id").map(String::from);
            let message = Self::serialize_error(&body, error_reference.as_deref());

            tracing::warn!(
                shop = %connection.shop_domain,
                status = code,
                endpoint = %request.endpoint,
                "Shopify API call failed"
            );
            return Err(ApiError::Upstream {
                status: code,
                message,
                error_reference,
            });
        }

        let body = if body_text.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text).map_err(|e| ApiError::Decode {
                message: e.to_string(),
            })?
        };

        Ok(HttpResponse::new(code, headers, body))
    }

    /// Resolves the connection for `shop` from `store`, then calls.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call), plus [`ApiError::MissingCredentials`]
    /// when no connection is stored and [`ApiError::Store`] when the store
    /// fails.
    pub async fn call_for_shop(
        &self,
        store: &dyn MerchantStore,
        shop: &ShopDomain,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        let connection = require_connection(store, shop).await?;
        self.call(&connection, request).await
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn serialize_error(body: &serde_json::Value, request_id: Option<&str>) -> String {
        let mut error_body = serde_json::Map::new();

        for field in ["errors", "error", "raw_body"] {
            if let Some(value) = body.get(field) {
                error_body.insert(field.to_string(), value.clone());
            }
        }
        if body.get("error").is_some() {
            if let Some(desc) = body.get("error_description") {
                error_body.insert("error_description".to_string(), desc.clone());
            }
        }
        if let Some(request_id) = request_id {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::Value::Object(error_body).to_string()
    }
}

//! Requests made with a merchant's access token.

use std::fmt;

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods used against the platform REST API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A request against an endpoint path such as `/admin/webhooks.json`.
///
/// Bodies are always sent as JSON.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::clients::{HttpMethod, HttpRequest};
/// use serde_json::json;
///
/// let request = HttpRequest::builder(HttpMethod::Post, "/admin/webhooks.json")
///     .body(json!({"webhook": {"topic": "orders/create"}}))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.endpoint, "/admin/webhooks.json");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub http_method: HttpMethod,
    /// Absolute endpoint path, appended to the shop's base URL.
    pub endpoint: String,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Query parameters, sent in order.
    pub query: Vec<(String, String)>,
    /// Headers added to the defaults.
    pub extra_headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a new builder.
    #[must_use]
    pub fn builder(method: HttpMethod, endpoint: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, endpoint)
    }

    /// Shorthand for a GET request without parameters.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> HttpRequestBuilder {
        Self::builder(HttpMethod::Get, endpoint)
    }

    /// Checks the request before it is sent.
    ///
    /// # Errors
    ///
    /// - [`InvalidHttpRequestError::InvalidEndpoint`] if the endpoint does not start with `/`
    /// - [`InvalidHttpRequestError::MissingBody`] for POST or PUT without a body
    /// - [`InvalidHttpRequestError::UnexpectedBody`] for GET or DELETE with a body
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if !self.endpoint.starts_with('/') {
            return Err(InvalidHttpRequestError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
            });
        }

        let needs_body = matches!(self.http_method, HttpMethod::Post | HttpMethod::Put);
        match (needs_body, self.body.is_some()) {
            (true, false) => Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            }),
            (false, true) => Err(InvalidHttpRequestError::UnexpectedBody {
                method: self.http_method.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            request: HttpRequest {
                http_method: method,
                endpoint: endpoint.into(),
                body: None,
                query: Vec::new(),
                extra_headers: Vec::new(),
            },
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.extra_headers.push((key.into(), value.into()));
        self
    }

    /// Builds and verifies the request.
    ///
    /// # Errors
    ///
    /// See [`HttpRequest::verify`].
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        self.request.verify()?;
        Ok(self.request)
    }
}

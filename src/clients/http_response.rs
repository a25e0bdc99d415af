//! Responses from authenticated platform calls.

use std::collections::HashMap;

/// Rate limit state from the `X-Shopify-Shop-Api-Call-Limit` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiCallLimit {
    /// Requests currently counted against the bucket.
    pub request_count: u32,
    /// Bucket capacity.
    pub bucket_size: u32,
}

impl ApiCallLimit {
    /// Parses a header value of the form `"40/80"`.
    ///
    /// ```rust
    /// use shopify_app_auth::clients::ApiCallLimit;
    ///
    /// let limit = ApiCallLimit::parse("3/40").unwrap();
    /// assert_eq!(limit.request_count, 3);
    /// assert!(ApiCallLimit::parse("3").is_none());
    /// ```
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let (count, size) = header_value.trim().split_once('/')?;
        Some(Self {
            request_count: count.parse().ok()?,
            bucket_size: size.parse().ok()?,
        })
    }
}

/// A successful (2xx) response.
///
/// Header names are lowercase. An empty body is represented as `{}`.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub code: u16,
    /// Response headers, lowercase names.
    pub headers: HashMap<String, Vec<String>>,
    /// Parsed JSON body.
    pub body: serde_json::Value,
    /// Parsed rate limit header.
    pub api_call_limit: Option<ApiCallLimit>,
}

impl HttpResponse {
    /// Creates a response, parsing the rate limit header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let api_call_limit = first_header(&headers, "x-shopify-shop-api-call-limit")
            .and_then(ApiCallLimit::parse);

        Self {
            code,
            headers,
            body,
            api_call_limit,
        }
    }

    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        first_header(&self.headers, "x-request-id")
    }
}

pub(crate) fn first_header<'a>(
    headers: &'a HashMap<String, Vec<String>>,
    name: &str,
) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|values| values.first())
        .map(String::as_str)
}

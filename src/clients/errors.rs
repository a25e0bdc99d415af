//! Error types for authenticated platform calls.
//!
//! Every remote-call path returns `Result<_, ApiError>`; a non-2xx response
//! is an [`ApiError::Upstream`], never a value the caller has to inspect.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::clients::ApiError;
//!
//! let error = ApiError::Upstream {
//!     status: 404,
//!     message: r#"{"errors":"Not Found"}"#.to_string(),
//!     error_reference: None,
//! };
//! assert_eq!(error.status(), Some(404));
//! assert!(error.to_string().contains("404"));
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Error returned when a request fails validation before sending.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The endpoint is not an absolute path.
    #[error("Endpoint '{endpoint}' must start with '/'.")]
    InvalidEndpoint {
        /// The endpoint that was provided.
        endpoint: String,
    },

    /// A GET or DELETE request was given a body.
    #[error("Cannot send a body with {method}.")]
    UnexpectedBody {
        /// The HTTP method.
        method: String,
    },

    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Errors from calls made with a merchant's access token.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable connection exists for the shop.
    #[error("Missing credentials for Shopify API call to {shop}: no access token is stored")]
    MissingCredentials {
        /// The shop the call was for.
        shop: String,
    },

    /// The platform answered with a non-2xx status.
    ///
    /// `message` is a JSON object holding any `errors`, `error` and
    /// `error_description` fields of the response body.
    #[error("Shopify API returned {status}: {message}")]
    Upstream {
        /// The HTTP status code.
        status: u16,
        /// Serialized error details.
        message: String,
        /// The `X-Request-Id` of the response, if present.
        error_reference: Option<String>,
    },

    /// The request failed validation.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A successful response did not have the expected shape.
    #[error("Unexpected response body: {message}")]
    Decode {
        /// What was wrong with the body.
        message: String,
    },

    /// The merchant store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Returns the HTTP status for [`ApiError::Upstream`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// Verify ApiError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiError>();
};

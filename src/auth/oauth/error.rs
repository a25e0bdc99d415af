//! OAuth-specific error types.
//!
//! # Error Types
//!
//! - [`OAuthError::MissingParameters`]: required callback parameters are absent
//! - [`OAuthError::SignatureMismatch`]: the `hmac` parameter did not verify
//! - [`OAuthError::StateMismatch`]: the `state` parameter is not the expected nonce
//! - [`OAuthError::InvalidRequest`]: token exchange inputs are empty or malformed
//! - [`OAuthError::TokenExchangeFailed`]: the token endpoint rejected the code
//! - [`OAuthError::Store`]: the connection could not be persisted
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::OAuthError;
//!
//! let error = OAuthError::MissingParameters {
//!     missing: vec!["code".to_string(), "state".to_string()],
//! };
//! assert_eq!(error.to_string(), "Missing required OAuth parameters: code, state");
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during OAuth operations.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// One or more required query parameters are missing or empty.
    ///
    /// Raised before any other processing of the request.
    #[error("Missing required OAuth parameters: {}", missing.join(", "))]
    MissingParameters {
        /// Names of every missing parameter, in the order they were checked.
        missing: Vec<String>,
    },

    /// The request signature did not match.
    ///
    /// Treat as a security event: abort the flow and do not retry.
    #[error("OAuth request signature validation failed")]
    SignatureMismatch,

    /// The `state` parameter does not match the configured nonce.
    #[error("State parameter mismatch: received '{received}'")]
    StateMismatch {
        /// The state value received in the callback.
        received: String,
    },

    /// The token exchange was called with unusable inputs.
    #[error("Cannot generate access token: {reason}")]
    InvalidRequest {
        /// What was wrong with the inputs.
        reason: String,
    },

    /// The token endpoint returned a non-200 status, the request could not
    /// be sent, or the response body was unreadable.
    ///
    /// `status` is `0` when no response was received.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned, or 0 on transport failure.
        status: u16,
        /// The response body or transport error.
        message: String,
    },

    /// Persisting the merchant connection failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};

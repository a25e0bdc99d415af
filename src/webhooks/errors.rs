//! Webhook delivery error types.

use thiserror::Error;

/// Errors raised while verifying an incoming webhook delivery.
///
/// Errors from managing subscriptions are [`ApiError`](crate::clients::ApiError)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The delivery signature did not match the body.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// A required delivery header is absent.
    #[error("Missing webhook header: {header}")]
    MissingHeader {
        /// The header name.
        header: &'static str,
    },
}

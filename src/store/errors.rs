//! Merchant store error types.

use thiserror::Error;

/// Errors raised by a [`MerchantStore`](super::MerchantStore) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("Merchant store error: {message}")]
    Backend {
        /// Backend-specific description.
        message: String,
    },
}

impl StoreError {
    /// Wraps any displayable backend error.
    pub fn backend(error: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: error.to_string(),
        }
    }
}

//! Persistence of merchant connections.
//!
//! The [`MerchantStore`] trait is the seam between this crate and the host
//! application's database. [`InMemoryMerchantStore`] is a reference
//! implementation suitable for tests and single-process deployments.
//!
//! # Upsert Semantics
//!
//! [`MerchantStore::save`] is keyed by shop domain. Saving a connection for
//! a shop that is already stored replaces the token and scopes in a single
//! write while keeping the existing id and `created_at`. The owner is
//! replaced only when the new connection carries one. A merchant
//! who re-authorizes therefore never ends up with two records.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{
//!     AccessToken, InMemoryMerchantStore, MerchantConnection, MerchantStore, ShopDomain,
//! };
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryMerchantStore::new();
//! let shop = ShopDomain::new("my-store").unwrap();
//!
//! let first =
//!     MerchantConnection::new(shop.clone(), AccessToken::new("tok-1"), Default::default());
//! let id = store.save(first).await.unwrap();
//!
//! let second =
//!     MerchantConnection::new(shop.clone(), AccessToken::new("tok-2"), Default::default());
//! assert_eq!(store.save(second).await.unwrap(), id);
//!
//! let stored = store.find(&shop).await.unwrap().unwrap();
//! assert_eq!(stored.access_token.as_ref(), "tok-2");
//! # });
//! ```

mod errors;
mod memory;

pub use errors::StoreError;
pub use memory::InMemoryMerchantStore;

use crate::auth::{ConnectionId, MerchantConnection};
use crate::clients::ApiError;
use crate::config::ShopDomain;
use async_trait::async_trait;

/// Storage for merchant connections, one per shop domain.
#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Inserts or replaces the connection for `connection.shop_domain`.
    ///
    /// Returns the id of the stored record, which is the existing id when
    /// the shop was already stored. A replacement without an owner keeps
    /// the stored owner.
    async fn save(&self, connection: MerchantConnection) -> Result<ConnectionId, StoreError>;

    /// Looks up the connection for `shop`.
    async fn find(&self, shop: &ShopDomain) -> Result<Option<MerchantConnection>, StoreError>;

    /// Looks up a connection by id.
    async fn find_by_id(&self, id: ConnectionId)
        -> Result<Option<MerchantConnection>, StoreError>;

    /// Removes the connection for `shop`, returning it if one existed.
    async fn delete(&self, shop: &ShopDomain) -> Result<Option<MerchantConnection>, StoreError>;
}

impl std::fmt::Debug for dyn MerchantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MerchantStore")
    }
}

/// Resolves the connection for `shop`, treating absence as missing
/// credentials.
///
/// # Errors
///
/// - [`ApiError::MissingCredentials`] if no connection is stored or its
///   token is empty
/// - [`ApiError::Store`] if the backend fails
pub async fn require_connection(
    store: &dyn MerchantStore,
    shop: &ShopDomain,
) -> Result<MerchantConnection, ApiError> {
    match store.find(shop).await? {
        Some(connection) if connection.is_active() => Ok(connection),
        _ => Err(ApiError::MissingCredentials {
            shop: shop.to_string(),
        }),
    }
}

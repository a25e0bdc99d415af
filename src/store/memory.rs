//! In-memory merchant store.

use super::{MerchantStore, StoreError};
use crate::auth::{ConnectionId, MerchantConnection};
use crate::config::ShopDomain;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A [`MerchantStore`] backed by a `HashMap` behind a Tokio `RwLock`.
///
/// Cloning yields a handle to the same map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMerchantStore {
    connections: Arc<RwLock<HashMap<ShopDomain, MerchantConnection>>>,
}

impl InMemoryMerchantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn save(&self, mut connection: MerchantConnection) -> Result<ConnectionId, StoreError> {
        let mut connections = self.connections.write().await;

        if let Some(existing) = connections.get(&connection.shop_domain) {
            connection.id = existing.id;
            connection.created_at = existing.created_at;
            connection.owner_account_id = connection
                .owner_account_id
                .or_else(|| existing.owner_account_id.clone());
            connection.updated_at = Utc::now();
            tracing::debug!(shop = %connection.shop_domain, "Replacing stored merchant connection");
        }

        let id = connection.id;
        connections.insert(connection.shop_domain.clone(), connection);
        Ok(id)
    }

    async fn find(&self, shop: &ShopDomain) -> Result<Option<MerchantConnection>, StoreError> {
        Ok(self.connections.read().await.get(shop).cloned())
    }

    async fn find_by_id(
        &self,
        id: ConnectionId,
    ) -> Result<Option<MerchantConnection>, StoreError> {
        Ok(self
            .connections
            .read()
            .await
            .values()
            .find(|connection| connection.id == id)
            .cloned())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<Option<MerchantConnection>, StoreError> {
        Ok(self.connections.write().await.remove(shop))
    }
}

// Verify InMemoryMerchantStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InMemoryMerchantStore>();
};

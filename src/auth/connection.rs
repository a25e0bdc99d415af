//! Merchant connection records.
//!
//! A [`MerchantConnection`] is created when a token exchange succeeds and
//! holds everything needed to call the platform on a merchant's behalf.

use crate::auth::AuthScopes;
use crate::config::{AccessToken, ShopDomain};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored merchant connection.
///
/// Also used as the trailing path segment of webhook delivery addresses, so
/// that deliveries can be routed back to the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An authorized merchant: shop domain, access token and owning account.
///
/// One connection exists per shop domain. The access token is masked in
/// `Debug` output.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::{AccessToken, MerchantConnection, ShopDomain};
///
/// let connection = MerchantConnection::new(
///     ShopDomain::new("my-store").unwrap(),
///     AccessToken::new("shpat_abc"),
///     "read_orders".parse().unwrap(),
/// );
///
/// assert!(connection.is_active());
/// assert!(!format!("{connection:?}").contains("shpat_abc"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantConnection {
    /// Unique identifier of this connection.
    pub id: ConnectionId,

    /// The merchant's shop.
    pub shop_domain: ShopDomain,

    /// The durable access token.
    pub access_token: AccessToken,

    /// The scopes granted with the token.
    pub scopes: AuthScopes,

    /// The local account that installed the app, if known.
    pub owner_account_id: Option<String>,

    /// When the connection was first stored.
    pub created_at: DateTime<Utc>,

    /// When the token was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl MerchantConnection {
    /// Creates a connection with a fresh id and no owner.
    #[must_use]
    pub fn new(shop_domain: ShopDomain, access_token: AccessToken, scopes: AuthScopes) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            shop_domain,
            access_token,
            scopes,
            owner_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the owning account.
    #[must_use]
    pub fn with_owner(mut self, owner_account_id: impl Into<String>) -> Self {
        self.owner_account_id = Some(owner_account_id.into());
        self
    }

    /// Returns `true` if the connection carries a usable token.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty()
    }
}

// Verify MerchantConnection is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MerchantConnection>();
};

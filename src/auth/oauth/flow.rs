//! The OAuth callback handler.
//!
//! [`AuthFlow::complete`] runs every step after the merchant approves the
//! install: parameter checks, signature and state verification, the code
//! exchange, persistence of the connection and the webhook bootstrap.

use std::sync::Arc;

use crate::auth::oauth::hmac::{constant_time_compare, verify_params};
use crate::auth::oauth::{exchange_access_token, AuthQuery, OAuthError, QueryParams, StateParam};
use crate::auth::MerchantConnection;
use crate::clients::ApiError;
use crate::config::ShopifyConfig;
use crate::store::MerchantStore;
use crate::webhooks::{WebhookManager, WebhookSyncReport};

/// What happened to the shop's webhooks after authorization.
///
/// None of these outcomes fail the flow.
#[derive(Debug)]
pub enum WebhookBootstrap {
    /// No webhooks are configured, so nothing was listed.
    NotConfigured,
    /// The shop had no subscriptions; the required set was registered.
    Registered(WebhookSyncReport),
    /// The shop already had subscriptions; nothing was registered.
    Skipped {
        /// Number of existing remote subscriptions.
        existing: usize,
    },
    /// Listing or registering failed.
    Failed(ApiError),
}

/// The result of a completed callback.
#[derive(Debug)]
pub struct AuthOutcome {
    /// The stored connection.
    pub connection: MerchantConnection,
    /// The webhook bootstrap result.
    pub webhooks: WebhookBootstrap,
}

/// Completes OAuth callbacks against a store and webhook manager.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shopify_app_auth::auth::oauth::{AuthFlow, QueryParams};
/// use shopify_app_auth::{InMemoryMerchantStore, WebhookManager};
/// # use shopify_app_auth::ShopifyConfig;
///
/// # async fn run(
/// #     config: Arc<ShopifyConfig>,
/// #     raw_query: &str,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(InMemoryMerchantStore::new());
/// let flow = AuthFlow::new(WebhookManager::new(config, store)?);
///
/// let outcome = flow.complete(QueryParams::parse(raw_query), Some("user-1".to_string())).await?;
/// println!("authorized {}", outcome.connection.shop_domain);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct AuthFlow {
    config: Arc<ShopifyConfig>,
    store: Arc<dyn MerchantStore>,
    webhooks: WebhookManager,
}

// Verify AuthFlow is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthFlow>();
};

impl AuthFlow {
    /// Creates a flow sharing the manager's config and store.
    #[must_use]
    pub fn new(webhooks: WebhookManager) -> Self {
        Self {
            config: Arc::clone(webhooks.caller().config_arc()),
            store: Arc::clone(webhooks.store()),
            webhooks,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    /// Handles a callback, checking `state` against the configured nonce.
    ///
    /// Without a configured nonce the state is not checked; use
    /// [`complete_with_state`](Self::complete_with_state) to compare it
    /// against the value returned by
    /// [`begin_auth`](crate::auth::oauth::begin_auth).
    ///
    /// # Errors
    ///
    /// - [`OAuthError::MissingParameters`] listing every absent parameter
    /// - [`OAuthError::SignatureMismatch`] if `hmac` does not verify
    /// - [`OAuthError::StateMismatch`] if `state` is not the nonce
    /// - [`OAuthError::InvalidRequest`] or [`OAuthError::TokenExchangeFailed`]
    ///   from the code exchange
    /// - [`OAuthError::Store`] if the connection cannot be saved
    pub async fn complete(
        &self,
        params: QueryParams,
        owner_account_id: Option<String>,
    ) -> Result<AuthOutcome, OAuthError> {
        let expected = self.config.nonce().map(String::from);
        self.run(params, expected.as_deref(), owner_account_id)
            .await
    }

    /// Handles a callback, checking `state` against `expected`.
    ///
    /// # Errors
    ///
    /// Same as [`complete`](Self::complete).
    pub async fn complete_with_state(
        &self,
        params: QueryParams,
        expected: &StateParam,
        owner_account_id: Option<String>,
    ) -> Result<AuthOutcome, OAuthError> {
        self.run(params, Some(expected.as_ref()), owner_account_id)
            .await
    }

    async fn run(
        &self,
        params: QueryParams,
        expected_state: Option<&str>,
        owner_account_id: Option<String>,
    ) -> Result<AuthOutcome, OAuthError> {
        let query = AuthQuery::from_params(params)?;

        if !verify_params(query.params(), &self.config) {
            tracing::warn!(shop = %query.shop, "Rejected OAuth callback with invalid signature");
            return Err(OAuthError::SignatureMismatch);
        }

        if let Some(expected) = expected_state {
            if !constant_time_compare(&query.state, expected) {
                tracing::warn!(shop = %query.shop, "Rejected OAuth callback with unexpected state");
                return Err(OAuthError::StateMismatch {
                    received: query.state,
                });
            }
        }

        let mut connection = exchange_access_token(
            &self.config,
            self.webhooks.caller().http_client(),
            &query.shop,
            &query.code,
        )
        .await?;
        if let Some(owner) = owner_account_id {
            connection = connection.with_owner(owner);
        }

        let id = self.store.save(connection.clone()).await?;
        let connection = match self.store.find_by_id(id).await? {
            Some(stored) => stored,
            None => MerchantConnection { id, ..connection },
        };
        tracing::info!(
            shop = %connection.shop_domain,
            connection_id = %id,
            "Merchant connection stored"
        );

        let webhooks = self.bootstrap_webhooks(&connection).await;
        Ok(AuthOutcome {
            connection,
            webhooks,
        })
    }

    async fn bootstrap_webhooks(&self, connection: &MerchantConnection) -> WebhookBootstrap {
        if self.config.webhooks().is_empty() {
            return WebhookBootstrap::NotConfigured;
        }
        let shop = &connection.shop_domain;

        let existing = match self.webhooks.list_webhooks(shop).await {
            Ok(existing) => existing,
            Err(error) => {
                tracing::warn!(
                    shop = %shop,
                    error = %error,
                    "Could not list webhooks after authorization"
                );
                return WebhookBootstrap::Failed(error);
            }
        };
        if !existing.is_empty() {
            tracing::debug!(shop = %shop, existing = existing.len(), "Webhooks already registered");
            return WebhookBootstrap::Skipped {
                existing: existing.len(),
            };
        }

        match self.webhooks.register_webhooks_required_for_app(shop).await {
            Ok(report) => WebhookBootstrap::Registered(report),
            Err(error) => {
                tracing::warn!(
                    shop = %shop,
                    error = %error,
                    "Could not register webhooks after authorization"
                );
                WebhookBootstrap::Failed(error)
            }
        }
    }
}

//! Webhook subscriptions and delivery verification.
//!
//! The app declares the `(topic, event)` pairs it needs in
//! [`ShopifyConfig::webhooks`](crate::ShopifyConfig::webhooks).
//! [`WebhookManager`] creates them remotely through the REST endpoint
//! `/admin/webhooks.json`, lists them and deletes them. The platform is the
//! only record of which subscriptions exist.
//!
//! Incoming deliveries are checked with [`verify_webhook`].
//!
//! # Error Handling
//!
//! Subscription management returns [`ApiError`](crate::clients::ApiError);
//! delivery verification returns [`WebhookError`].

mod errors;
mod manager;
mod types;
mod verification;

pub use errors::WebhookError;
pub use manager::WebhookManager;
pub use types::{
    Webhook, WebhookDeletionReport, WebhookFailure, WebhookSubscription, WebhookSyncReport,
};
pub use verification::{
    connection_id_from_path, verify_hmac, verify_webhook, WebhookContext, WebhookRequest,
    HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};

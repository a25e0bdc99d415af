//! Webhook subscription types.
//!
//! Subscriptions are owned by the platform. Locally the app only declares
//! the `(topic, event)` pairs it needs; a pair goes from absent to
//! registered with one create call and back to absent with one delete
//! call. Nothing is tracked locally after creation.

use serde::{Deserialize, Serialize};

use crate::clients::ApiError;

/// A webhook subscription as stored on the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    /// Remote id.
    pub id: u64,
    /// Full topic, e.g. `orders/create`.
    pub topic: String,
    /// Delivery address.
    pub address: String,
    /// Payload format.
    #[serde(default = "default_format")]
    pub format: String,
    /// Creation timestamp reported by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp reported by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_format() -> String {
    WebhookSubscription::FORMAT.to_string()
}

/// A subscription to create: one `(topic, event)` pair and where to deliver it.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::webhooks::WebhookSubscription;
/// use serde_json::json;
///
/// let subscription =
///     WebhookSubscription::new("orders", "create", "https://hooks.example.com/orders/42");
/// assert_eq!(subscription.full_topic(), "orders/create");
/// assert_eq!(
///     subscription.to_payload(),
///     json!({"webhook": {
///         "topic": "orders/create",
///         "address": "https://hooks.example.com/orders/42",
///         "format": "json"
///     }})
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookSubscription {
    /// Topic, e.g. `orders`.
    pub topic: String,
    /// Event, e.g. `create`.
    pub event: String,
    /// Delivery address.
    pub address: String,
}

impl WebhookSubscription {
    /// The only payload format requested.
    pub const FORMAT: &'static str = "json";

    /// Creates a subscription descriptor.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            address: address.into(),
        }
    }

    /// Returns `topic/event`.
    #[must_use]
    pub fn full_topic(&self) -> String {
        format!("{}/{}", self.topic, self.event)
    }

    /// Returns the create request body.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "webhook": {
                "topic": self.full_topic(),
                "address": self.address,
                "format": Self::FORMAT,
            }
        })
    }
}

/// A subscription that could not be created.
#[derive(Debug)]
pub struct WebhookFailure {
    /// The subscription that was attempted.
    pub subscription: WebhookSubscription,
    /// Why it failed.
    pub error: ApiError,
}

/// Outcome of registering every required subscription.
#[derive(Debug, Default)]
pub struct WebhookSyncReport {
    /// Subscriptions created, ordered by topic.
    pub registered: Vec<Webhook>,
    /// Subscriptions that failed, ordered by topic.
    pub failed: Vec<WebhookFailure>,
    /// Registration tasks that panicked or were cancelled.
    pub aborted: usize,
}

impl WebhookSyncReport {
    /// Returns `true` if every attempted registration succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.aborted == 0
    }

    /// Number of registrations attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.registered.len() + self.failed.len() + self.aborted
    }
}

/// Outcome of deleting every remote subscription for a shop.
#[derive(Debug, Default)]
pub struct WebhookDeletionReport {
    /// Ids deleted.
    pub deleted: Vec<u64>,
    /// Ids whose delete call failed.
    pub failed: Vec<(u64, ApiError)>,
}

impl WebhookDeletionReport {
    /// Returns `true` if every delete succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

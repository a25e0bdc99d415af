//! The static table of webhook subscriptions an app requires.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Maps a webhook topic (e.g. `orders`) to the events the app subscribes to
/// (e.g. `create`, `update`).
///
/// Topics iterate in sorted order; events keep their declared order. Each
/// `(topic, event)` pair becomes one remote subscription named
/// `topic/event`.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::WebhookTopics;
///
/// let topics: WebhookTopics =
///     serde_json::from_str(r#"{"orders": ["create", "update"], "app": ["uninstalled"]}"#)
///         .unwrap();
///
/// let pairs: Vec<(&str, &str)> = topics.pairs().collect();
/// assert_eq!(pairs, vec![("app", "uninstalled"), ("orders", "create"), ("orders", "update")]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WebhookTopics {
    topics: BTreeMap<String, Vec<String>>,
}

impl WebhookTopics {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `events` under `topic`, appending to any events already present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWebhooks`] if the topic or an event is
    /// empty or contains a `/`.
    pub fn insert<I, S>(&mut self, topic: impl Into<String>, events: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topic = topic.into();
        Self::validate_segment(&topic, "topic")?;

        let entry = self.topics.entry(topic).or_default();
        for event in events {
            let event = event.into();
            Self::validate_segment(&event, "event")?;
            if !entry.contains(&event) {
                entry.push(event);
            }
        }
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn with<I, S>(mut self, topic: impl Into<String>, events: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(topic, events)?;
        Ok(self)
    }

    /// Iterates every `(topic, event)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.topics.iter().flat_map(|(topic, events)| {
            events
                .iter()
                .map(move |event| (topic.as_str(), event.as_str()))
        })
    }

    /// Returns the events declared for `topic`.
    #[must_use]
    pub fn events(&self, topic: &str) -> Option<&[String]> {
        self.topics.get(topic).map(Vec::as_slice)
    }

    /// Number of `(topic, event)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }

    /// Returns `true` if no pair is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate_segment(value: &str, kind: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidWebhooks {
                reason: format!("{kind} cannot be empty"),
            });
        }
        if value.contains('/') {
            return Err(ConfigError::InvalidWebhooks {
                reason: format!("{kind} '{value}' must not contain '/'"),
            });
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for WebhookTopics {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        let mut topics = Self::new();
        for (topic, events) in raw {
            topics.insert(topic, events).map_err(de::Error::custom)?;
        }
        Ok(topics)
    }
}

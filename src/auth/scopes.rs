//! OAuth scope handling.
//!
//! This module provides the [`AuthScopes`] type: the ordered list of scopes
//! an app requests during installation.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An ordered, de-duplicated sequence of OAuth scopes.
///
/// Scopes keep the order in which they were declared so that the `scope`
/// parameter of the authorization URL is stable across restarts.
///
/// # Implied Scopes
///
/// `write_foo` implies `read_foo` (and `unauthenticated_write_foo` implies
/// `unauthenticated_read_foo`). Implied scopes are honoured by
/// [`covers`](Self::covers) but are not added to the requested list.
///
/// # Serialization
///
/// Serializes to a comma-separated string. Deserializes from either a
/// comma-separated string or an array of strings:
///
/// ```rust
/// use shopify_app_auth::AuthScopes;
///
/// let from_str: AuthScopes = serde_json::from_str(r#""read_products,write_orders""#).unwrap();
/// let from_list: AuthScopes =
///     serde_json::from_str(r#"["read_products", "write_orders"]"#).unwrap();
/// assert_eq!(from_str, from_list);
/// assert_eq!(from_str.to_string(), "read_products,write_orders");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: Vec<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of declared scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns an iterator over the scopes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Returns `true` if this scope set grants every scope in `other`,
    /// taking implied read scopes into account.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.iter().all(|required| {
            self.iter().any(|granted| {
                granted == required || Self::implied_scope(granted).as_deref() == Some(required)
            })
        })
    }

    fn implied_scope(scope: &str) -> Option<String> {
        scope
            .strip_prefix("unauthenticated_write_")
            .map(|rest| format!("unauthenticated_read_{rest}"))
            .or_else(|| {
                scope
                    .strip_prefix("write_")
                    .map(|rest| format!("read_{rest}"))
            })
    }

    fn push(&mut self, scope: &str) -> Result<(), ConfigError> {
        let scope = scope.trim();
        if scope.is_empty() {
            return Ok(());
        }

        if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidScopes {
                reason: format!("Invalid characters in scope: '{scope}'"),
            });
        }

        if !self.scopes.iter().any(|s| s == scope) {
            self.scopes.push(scope.to_string());
        }
        Ok(())
    }

    fn from_list<I, S>(scopes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut auth_scopes = Self::new();
        for scope in scopes {
            auth_scopes.push(scope.as_ref())?;
        }
        Ok(auth_scopes)
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_list(s.split(','))
    }
}

impl TryFrom<Vec<String>> for AuthScopes {
    type Error = ConfigError;

    fn try_from(scopes: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_list(scopes)
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scopes.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScopes {
            Joined(String),
            List(Vec<String>),
        }

        match RawScopes::deserialize(deserializer)? {
            RawScopes::Joined(s) => s.parse().map_err(de::Error::custom),
            RawScopes::List(list) => Self::from_list(list).map_err(de::Error::custom),
        }
    }
}

//! Login hook for the host application's account system.
//!
//! After [`AuthFlow::complete`](crate::auth::oauth::AuthFlow::complete)
//! stores a connection, the host logs the owning user in through its own
//! session machinery. [`login_handler`] is the piece of that hand-off this
//! crate owns: it recognizes login requests coming from this flow and
//! returns the principal to create a session for.

use serde::{Deserialize, Serialize};

/// A login request as passed through the host's login pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Set when the request comes from the platform authorization flow.
    #[serde(default)]
    pub shopify: bool,
    /// The account to log in.
    pub user_id: String,
}

impl LoginRequest {
    /// Creates a request originating from the authorization flow.
    #[must_use]
    pub fn shopify(user_id: impl Into<String>) -> Self {
        Self {
            shopify: true,
            user_id: user_id.into(),
        }
    }
}

/// The account a session should be created for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPrincipal {
    /// The account id.
    pub user_id: String,
}

/// Returns the principal for requests from the authorization flow.
///
/// Returns `None` for any other request, including one with an empty user
/// id, so the host's other login handlers can run.
///
/// ```rust
/// use shopify_app_auth::auth::{login_handler, LoginRequest};
///
/// let principal = login_handler(&LoginRequest::shopify("user-1")).unwrap();
/// assert_eq!(principal.user_id, "user-1");
///
/// let other = LoginRequest { shopify: false, user_id: "user-1".to_string() };
/// assert!(login_handler(&other).is_none());
/// ```
#[must_use]
pub fn login_handler(request: &LoginRequest) -> Option<LoginPrincipal> {
    if !request.shopify || request.user_id.is_empty() {
        return None;
    }

    tracing::debug!(user_id = %request.user_id, "Accepted platform login");
    Some(LoginPrincipal {
        user_id: request.user_id.clone(),
    })
}

//! Authentication types.
//!
//! - [`AuthScopes`]: the ordered scope list requested at install
//! - [`MerchantConnection`]: an authorized shop and its access token
//! - [`oauth`]: the install flow, signature validation and code exchange
//! - [`login_handler`]: the hook that logs the owning account in afterwards

mod connection;
mod login;
pub mod oauth;
mod scopes;

pub use connection::{ConnectionId, MerchantConnection};
pub use login::{login_handler, LoginPrincipal, LoginRequest};
pub use scopes::AuthScopes;

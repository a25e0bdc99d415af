//! Authenticated calls to the platform REST API.
//!
//! - [`ApiCaller`]: sends [`HttpRequest`]s with a merchant's access token
//! - [`HttpResponse`]: status, headers and JSON body of a 2xx response
//! - [`ApiError`]: every way a call can fail, including non-2xx statuses
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopify_app_auth::clients::{ApiCaller, ApiError, HttpRequest};
//! # use shopify_app_auth::{ShopifyConfig, InMemoryMerchantStore, ShopDomain};
//!
//! # async fn run(
//! #     config: Arc<ShopifyConfig>,
//! #     store: InMemoryMerchantStore,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let caller = ApiCaller::new(config)?;
//! let shop = ShopDomain::new("my-store")?;
//! let request = HttpRequest::get("/admin/shop.json").build()?;
//!
//! match caller.call_for_shop(&store, &shop, &request).await {
//!     Ok(response) => println!("{}", response.body),
//!     Err(ApiError::Upstream { status, message, .. }) => eprintln!("{status}: {message}"),
//!     Err(other) => return Err(other.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod api_caller;
mod errors;
mod http_request;
mod http_response;

pub use api_caller::{ApiCaller, ACCESS_TOKEN_HEADER, LIBRARY_VERSION};
pub use errors::{ApiError, InvalidHttpRequestError};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{ApiCallLimit, HttpResponse};

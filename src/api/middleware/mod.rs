//! API middleware.

mod auth;
mod rate_limit;
mod redirect;

pub use auth::{auth_middleware, require_superuser, CurrentUser};
pub use rate_limit::{rate_limit_auth_middleware, rate_limit_middleware, RateLimitError};
pub use redirect::redirect_to_root;

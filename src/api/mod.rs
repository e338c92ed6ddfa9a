//! API layer - HTTP handlers and middleware
//!
//! This module contains all HTTP-related concerns:
//! - JSON and HTML request handlers
//! - Middleware (session authentication, rate limiting, redirects)
//! - Custom extractors
//! - Session cookie transport
//! - Route definitions

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod session;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use session::{redirect_with, SessionSettings};
pub use state::{AppState, RateLimits};

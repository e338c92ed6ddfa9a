//! HTTP request handlers.

pub mod auth_handler;
pub mod pages;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use pages::page_routes;
pub use user_handler::{authenticated_route, user_routes};

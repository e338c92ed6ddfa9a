//! Auth Portal - email/password authentication web application
//!
//! Registration, login and logout over an `HttpOnly` session cookie,
//! password reset and email verification, served as HTML pages and a
//! JSON API.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users and password hashing
//! - **services**: Authentication backend, JWT strategy and user manager
//! - **infra**: Database, repositories and cache backends
//! - **jobs**: Email jobs and delivery
//! - **api**: HTTP handlers, pages, middleware, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Make an account superuser
//! cargo run -- users promote admin@example.com
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::{Cache, CacheStore, MemoryCache};

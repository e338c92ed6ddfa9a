//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection, migrations and repositories
//! - Caching (Redis or in-process)

pub mod cache;
pub mod db;
pub mod repositories;

pub use cache::{Cache, CacheStore, MemoryCache};
pub use db::{Database, Migrator};
pub use repositories::{UserRepository, UserStore};

#[cfg(test)]
pub use repositories::MockUserRepository;

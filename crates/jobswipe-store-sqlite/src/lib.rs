//! SQLite backend for JobSwipe.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Writes to `matches` and `messages` are
//! published on an in-process broadcast channel, standing in for the change
//! feed of a hosted database.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

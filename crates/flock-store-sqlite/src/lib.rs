//! SQLite backend for the Flock membership store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every aggregate write runs inside one
//! SQLite transaction.

mod encode;
mod queries;
mod schema;
mod store;

pub mod error;
pub mod password;

pub use error::{Error, Result};
pub use store::SqliteStore;

//! SQLite backend for the edge identity tasks.
//!
//! One database holds both sides the tasks reconcile: the relational models
//! (environments, features, feature states, users, webhooks) and the identity
//! documents, stored as whole JSON items.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

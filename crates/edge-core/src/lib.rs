//! Core types and collaborator traits for edge identity consistency.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! describes the relational models the tasks read, the denormalised identity
//! document kept at the edge, and the feature-state change events that feed
//! outbound webhooks.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod error;
pub mod model;
pub mod state;
pub mod store;
pub mod webhook;

pub use error::{Error, Result};

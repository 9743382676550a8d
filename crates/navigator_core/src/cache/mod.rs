//! Read-through query cache.
//!
//! # Responsibility
//! - Serve repeated list/item reads without touching the store.
//! - Drop cached reads for a table when a confirmed mutation invalidates it.
//!
//! # Invariants
//! - Failed fetches are never cached.
//! - Invalidation of a table drops its list key and every item key.
//! - The generation of a table increases on every invalidation.

pub mod query_cache;

pub use query_cache::{QueryCache, QueryKey};

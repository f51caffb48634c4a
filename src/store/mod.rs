//! Persisted canonical state, keyed by resource name
//!
//! The CLI keeps one [`CanonicalState`](crate::model::CanonicalState) per
//! declared resource in an embedded Fjall keyspace:
//!
//! - `resources`: `resource:{name}` -> CanonicalState (JSON)
//!
//! A resource confirmed absent is removed, never kept as a tombstone.

mod error;
mod state;

pub use error::{Result, StoreError};
pub use state::StateStore;

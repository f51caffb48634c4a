//! Remote representation to canonical state
//!
//! - [`to_canonical`] - pure mapping of a [`RemoteApplication`](crate::model::RemoteApplication)
//! - [`VhostPattern`] - default vs. additional hostname classification

mod translator;
mod vhost;

pub use translator::{to_canonical, to_canonical_lossy};
pub use vhost::{VhostPartition, VhostPattern};

//! Remote application inventory collaborator
//!
//! - [`InventoryApi`] - operations the engine consumes
//! - [`HttpInventory`] - client for the v2 HTTP API
//! - [`InMemoryInventory`] - local stand-in with failure injection

mod error;
mod http;
mod memory;
mod traits;

pub use error::{InventoryError, Result};
pub use http::HttpInventory;
pub use memory::InMemoryInventory;
pub use traits::InventoryApi;

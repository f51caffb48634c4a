//! Runtime variant catalog lookup

mod resolver;

pub use resolver::{CatalogResolver, ResolveError, select_latest};

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod model;
pub mod normalizer;
pub mod observability;
pub mod router;
pub mod store;
pub mod translate;

//! Data model shared by the normalizer, the translator and the engine
//!
//! - [`DesiredSpecification`] - operator input with tri-state fields
//! - [`ProvisioningRequest`] - fully resolved creation request
//! - [`RemoteApplication`] - inventory representation
//! - [`CanonicalState`] - reconciled state handed back to the caller

mod error;
mod field;
mod owner;
mod remote;
mod request;
mod spec;
mod state;
mod variant;

pub use error::ValidationError;
pub use field::Field;
pub use owner::Owner;
pub use remote::{FlavorRef, Identity, RemoteApplication, RemoteDeployment, RemoteInstance, RemoteVhost};
pub use request::{ForceHttps, ProvisioningRequest};
pub use spec::{ApplicationKind, DesiredSpecification, PhpSettings, SpecCollections};
pub use state::CanonicalState;
pub use variant::VariantDescriptor;

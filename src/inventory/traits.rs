use async_trait::async_trait;
use std::collections::BTreeMap;

use super::error::Result;
use crate::model::{Identity, Owner, ProvisioningRequest, RemoteApplication, VariantDescriptor};

/// Operations consumed from the remote application inventory.
///
/// Implementations own transport, authentication and timeouts. Nothing here
/// retries.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Full runtime catalog, optionally restricted to an organization
    async fn list_available_variants(
        &self,
        organization: Option<&str>,
    ) -> Result<Vec<VariantDescriptor>>;

    async fn get_caller_identity(&self) -> Result<Identity>;

    async fn create_application(
        &self,
        owner: &Owner,
        request: &ProvisioningRequest,
    ) -> Result<RemoteApplication>;

    async fn get_application(&self, owner: &Owner, app_id: &str) -> Result<RemoteApplication>;

    async fn delete_application(&self, owner: &Owner, app_id: &str) -> Result<()>;

    async fn list_tags(&self, owner: &Owner, app_id: &str) -> Result<Vec<String>>;

    async fn set_environment(
        &self,
        owner: &Owner,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()>;

    async fn add_vhost(&self, owner: &Owner, app_id: &str, hostname: &str) -> Result<()>;
}

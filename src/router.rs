//! Owner-scoped dispatch to the inventory
//!
//! Applications live either under the caller's own account or under an
//! organization. [`OwnerRouter::route`] picks the matching
//! [`ApplicationOwnerApi`] implementation; the engine never branches on the
//! owner itself.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ReconcileError;
use crate::inventory::{InventoryApi, InventoryError};
use crate::model::{Owner, ProvisioningRequest, RemoteApplication};

type Result<T> = std::result::Result<T, ReconcileError>;

/// Application lifecycle calls bound to one owner.
#[async_trait]
pub trait ApplicationOwnerApi: Send + Sync {
    fn owner(&self) -> &Owner;

    /// Identity probe run before substantive calls.
    ///
    /// Fails with `UpstreamAuth` when the session cannot act as its owner.
    async fn verify_identity(&self) -> Result<()>;

    async fn create(&self, request: &ProvisioningRequest) -> Result<RemoteApplication>;

    async fn get(&self, app_id: &str) -> Result<RemoteApplication>;

    async fn delete(&self, app_id: &str) -> Result<()>;

    async fn tags(&self, app_id: &str) -> Result<Vec<String>>;

    async fn set_environment(
        &self,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()>;

    async fn add_vhost(&self, app_id: &str, hostname: &str) -> Result<()>;
}

pub struct OwnerRouter;

impl OwnerRouter {
    pub fn route(inventory: Arc<dyn InventoryApi>, owner: Owner) -> Box<dyn ApplicationOwnerApi> {
        debug!(owner = %owner, "Routing application calls");
        match owner {
            Owner::SelfAccount => Box::new(SelfScope { inventory }),
            Owner::Organization(id) => Box::new(OrganizationScope {
                inventory,
                owner: Owner::Organization(id),
            }),
        }
    }
}

/// Applications owned by the authenticated account.
pub struct SelfScope {
    inventory: Arc<dyn InventoryApi>,
}

/// Applications owned by an organization.
pub struct OrganizationScope {
    inventory: Arc<dyn InventoryApi>,
    owner: Owner,
}

static SELF_OWNER: Owner = Owner::SelfAccount;

#[async_trait]
impl ApplicationOwnerApi for SelfScope {
    fn owner(&self) -> &Owner {
        &SELF_OWNER
    }

    async fn verify_identity(&self) -> Result<()> {
        match self.inventory.get_caller_identity().await {
            Ok(identity) => {
                debug!(user_id = %identity.id, "Verified caller identity");
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Identity probe failed");
                Err(ReconcileError::UpstreamAuth(auth_detail(error)))
            }
        }
    }

    async fn create(&self, request: &ProvisioningRequest) -> Result<RemoteApplication> {
        Ok(self.inventory.create_application(&SELF_OWNER, request).await?)
    }

    async fn get(&self, app_id: &str) -> Result<RemoteApplication> {
        Ok(self.inventory.get_application(&SELF_OWNER, app_id).await?)
    }

    async fn delete(&self, app_id: &str) -> Result<()> {
        Ok(self.inventory.delete_application(&SELF_OWNER, app_id).await?)
    }

    async fn tags(&self, app_id: &str) -> Result<Vec<String>> {
        Ok(self.inventory.list_tags(&SELF_OWNER, app_id).await?)
    }

    async fn set_environment(
        &self,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(self
            .inventory
            .set_environment(&SELF_OWNER, app_id, environment)
            .await?)
    }

    async fn add_vhost(&self, app_id: &str, hostname: &str) -> Result<()> {
        Ok(self.inventory.add_vhost(&SELF_OWNER, app_id, hostname).await?)
    }
}

#[async_trait]
impl ApplicationOwnerApi for OrganizationScope {
    fn owner(&self) -> &Owner {
        &self.owner
    }

    // Organization calls authenticate on every request.
    async fn verify_identity(&self) -> Result<()> {
        Ok(())
    }

    async fn create(&self, request: &ProvisioningRequest) -> Result<RemoteApplication> {
        Ok(self.inventory.create_application(&self.owner, request).await?)
    }

    async fn get(&self, app_id: &str) -> Result<RemoteApplication> {
        Ok(self.inventory.get_application(&self.owner, app_id).await?)
    }

    async fn delete(&self, app_id: &str) -> Result<()> {
        Ok(self.inventory.delete_application(&self.owner, app_id).await?)
    }

    async fn tags(&self, app_id: &str) -> Result<Vec<String>> {
        Ok(self.inventory.list_tags(&self.owner, app_id).await?)
    }

    async fn set_environment(
        &self,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(self
            .inventory
            .set_environment(&self.owner, app_id, environment)
            .await?)
    }

    async fn add_vhost(&self, app_id: &str, hostname: &str) -> Result<()> {
        Ok(self.inventory.add_vhost(&self.owner, app_id, hostname).await?)
    }
}

fn auth_detail(error: InventoryError) -> String {
    match error {
        InventoryError::Unauthorized { status, body } | InventoryError::Request { status, body } => {
            format!("HTTP {}: {}", status, body)
        }
        other => other.to_string(),
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::owner::Owner;

/// Reconciled representation of an application, persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalState {
    pub id: String,
    pub name: String,
    pub description: String,
    pub instance_type: String,
    pub zone: String,
    pub deploy_type: String,
    pub deploy_url: String,
    pub organization_id: Option<String>,
    pub owner_id: String,

    pub min_instances: u32,
    pub max_instances: u32,
    pub max_allowed_instances: u32,
    pub min_flavor: String,
    pub max_flavor: String,

    pub separate_build: bool,
    pub build_flavor: Option<String>,

    pub homogeneous: bool,
    pub sticky_sessions: bool,
    pub cancel_on_push: bool,
    pub force_https: bool,

    pub favorite: bool,
    pub archived: bool,
    pub tags: Vec<String>,

    /// Platform-generated hostname, if the application has one
    pub vhost: Option<String>,
    pub additional_vhosts: BTreeSet<String>,
}

impl CanonicalState {
    pub fn owner(&self) -> Owner {
        Owner::from_organization(self.organization_id.as_deref())
    }
}

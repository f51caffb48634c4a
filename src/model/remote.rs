use serde::{Deserialize, Serialize};

/// Application as returned by the inventory API.
///
/// Flags keep the remote encoding: `force_https` is `ENABLED`/`DISABLED`
/// and `homogeneous` has the inverse polarity of the operator attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteApplication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub owner_id: String,
    pub instance: RemoteInstance,
    #[serde(default)]
    pub deployment: RemoteDeployment,
    #[serde(default)]
    pub vhosts: Vec<RemoteVhost>,

    #[serde(default)]
    pub homogeneous: bool,
    #[serde(default)]
    pub sticky_sessions: bool,
    #[serde(default)]
    pub cancel_on_push: bool,
    #[serde(default)]
    pub force_https: String,

    #[serde(default)]
    pub separate_build: bool,
    #[serde(default)]
    pub build_flavor: Option<FlavorRef>,

    #[serde(default, rename = "favourite")]
    pub favorite: bool,
    #[serde(default)]
    pub archived: bool,
    /// Filled from the tag listing, not from the application payload
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RemoteApplication {
    pub fn hostnames(&self) -> impl Iterator<Item = &str> {
        self.vhosts.iter().map(|vhost| vhost.fqdn.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInstance {
    #[serde(rename = "type")]
    pub instance_type: String,
    #[serde(default)]
    pub version: String,
    pub min_instances: u32,
    pub max_instances: u32,
    #[serde(default)]
    pub max_allowed_instances: u32,
    pub min_flavor: FlavorRef,
    pub max_flavor: FlavorRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDeployment {
    #[serde(default, rename = "type")]
    pub deploy_type: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVhost {
    pub fqdn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRef {
    pub name: String,
}

impl From<&str> for FlavorRef {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Caller identity returned by the identity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

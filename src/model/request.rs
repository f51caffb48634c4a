use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::owner::Owner;

/// Remote encoding of the force-https switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForceHttps {
    Enabled,
    Disabled,
}

impl ForceHttps {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceHttps::Enabled => "ENABLED",
            ForceHttps::Disabled => "DISABLED",
        }
    }

    pub fn is_enabled(self) -> bool {
        self == ForceHttps::Enabled
    }

    /// Decode the remote string. Anything but `ENABLED` reads as off.
    pub fn decode(raw: &str) -> bool {
        raw == ForceHttps::Enabled.as_str()
    }
}

impl From<bool> for ForceHttps {
    fn from(enabled: bool) -> Self {
        if enabled {
            ForceHttps::Enabled
        } else {
            ForceHttps::Disabled
        }
    }
}

/// Fully resolved application creation request.
///
/// The serialized form is the creation payload. Owner, additional hostnames
/// and environment are consumed by the follow-up calls and never sent in the
/// body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    pub name: String,
    pub description: String,
    pub zone: String,
    pub deploy: String,

    pub instance_type: String,
    pub instance_variant: String,
    pub instance_version: String,

    pub min_instances: u32,
    pub max_instances: u32,
    pub min_flavor: String,
    pub max_flavor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_build: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_flavor: Option<String>,

    /// Remote polarity: the inverse of the operator's `homogeneous`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homogeneous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky_sessions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_on_push: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_https: Option<ForceHttps>,

    #[serde(rename = "favourite", skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(skip)]
    pub owner: Owner,
    #[serde(skip)]
    pub additional_vhosts: BTreeSet<String>,
    #[serde(skip)]
    pub environment: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_force_https_encoding() {
        assert_eq!(ForceHttps::from(true).as_str(), "ENABLED");
        assert_eq!(ForceHttps::from(false).as_str(), "DISABLED");
        assert!(ForceHttps::decode("ENABLED"));
        assert!(!ForceHttps::decode("DISABLED"));
        assert!(!ForceHttps::decode("enabled"));
        assert!(!ForceHttps::decode(""));
    }

    #[test]
    fn test_payload_omits_unset_flags_and_local_fields() {
        let request = ProvisioningRequest {
            name: "api".into(),
            description: "api".into(),
            zone: "par".into(),
            deploy: "git".into(),
            instance_type: "php".into(),
            instance_variant: "var_php".into(),
            instance_version: "8.2".into(),
            min_instances: 1,
            max_instances: 1,
            min_flavor: "XS".into(),
            max_flavor: "XS".into(),
            separate_build: None,
            build_flavor: None,
            homogeneous: Some(false),
            sticky_sessions: None,
            cancel_on_push: None,
            force_https: Some(ForceHttps::Enabled),
            favorite: Some(true),
            archived: None,
            tags: vec![],
            owner: Owner::Organization("orga_1".into()),
            additional_vhosts: BTreeSet::from(["www.example.com".to_string()]),
            environment: BTreeMap::new(),
        };

        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["instanceVersion"], json!("8.2"));
        assert_eq!(payload["forceHttps"], json!("ENABLED"));
        assert_eq!(payload["favourite"], json!(true));
        assert_eq!(payload["homogeneous"], json!(false));
        assert!(payload.get("stickySessions").is_none());
        assert!(payload.get("buildFlavor").is_none());
        assert!(payload.get("owner").is_none());
        assert!(payload.get("additionalVhosts").is_none());
    }
}

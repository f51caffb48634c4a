use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::error::ValidationError;
use super::field::Field;
use super::request::{ForceHttps, ProvisioningRequest};
use super::state::CanonicalState;

const PHP_SLUG: &str = "php";

/// Operator-declared state of one application resource.
///
/// Every optional attribute is a [`Field`] so that "not set" and "set to
/// null" stay distinguishable until the normalizer applies its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredSpecification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub description: Field<String>,

    /// Instance type slug resolved against the variant catalog
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub zone: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub deploy_type: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub min_instances: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub max_instances: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub min_flavor: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub max_flavor: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub separate_build: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub build_flavor: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub homogeneous: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub sticky_sessions: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub cancel_on_push: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub force_https: Field<bool>,

    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub favorite: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub archived: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub tags: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub additional_vhosts: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub organization_id: Field<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub kind: ApplicationKind,
}

/// Runtime-specific settings layered on top of the generic application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "runtime", rename_all = "lowercase")]
pub enum ApplicationKind {
    #[default]
    Generic,
    Php(PhpSettings),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhpSettings {
    pub php_version: Option<String>,
    pub webroot: Option<String>,
    pub dev_dependencies: Option<bool>,
}

impl PhpSettings {
    fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(version) = &self.php_version {
            env.insert("CC_PHP_VERSION".to_string(), version.clone());
        }
        if let Some(webroot) = &self.webroot {
            env.insert("CC_WEBROOT".to_string(), webroot.clone());
        }
        if self.dev_dependencies == Some(true) {
            env.insert("CC_PHP_DEV_DEPENDENCIES".to_string(), "install".to_string());
        }
        env
    }
}

/// Tags and additional hostnames read and checked from a specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecCollections {
    pub tags: Vec<String>,
    pub additional_vhosts: BTreeSet<String>,
}

impl DesiredSpecification {
    /// Slug used to look the runtime up in the variant catalog.
    pub fn instance_slug(&self) -> Result<&str, ValidationError> {
        let slug = self.instance_type.trim();
        if slug.is_empty() {
            return Err(ValidationError::MissingField {
                field: "instance_type",
            });
        }
        if matches!(self.kind, ApplicationKind::Php(_)) && slug != PHP_SLUG {
            return Err(ValidationError::RuntimeMismatch(slug.to_string()));
        }
        Ok(slug)
    }

    /// Owning organization, trimmed. Blank ids mean the calling account.
    pub fn organization(&self) -> Option<&str> {
        self.organization_id
            .value()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    /// Operator environment with the runtime's own variables layered over it.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = self.environment.clone();
        if let ApplicationKind::Php(php) = &self.kind {
            env.extend(php.environment());
        }
        env
    }

    /// Read tags and additional hostnames, rejecting blank or repeated
    /// entries and malformed hostnames.
    pub fn collections(&self) -> Result<SpecCollections, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }

        let tags = self.tags.value().cloned().unwrap_or_default();
        check_entries("tags", &tags)?;

        let vhosts = self.additional_vhosts.value().cloned().unwrap_or_default();
        check_entries("additional_vhosts", &vhosts)?;
        if let Some(invalid) = vhosts.iter().find(|host| !is_hostname(host)) {
            return Err(ValidationError::InvalidHostname(invalid.clone()));
        }

        Ok(SpecCollections {
            tags,
            additional_vhosts: vhosts.into_iter().collect(),
        })
    }
}

/// Re-express a request as a fully specified desired state.
impl From<&ProvisioningRequest> for DesiredSpecification {
    fn from(request: &ProvisioningRequest) -> Self {
        Self {
            name: request.name.clone(),
            description: Field::Value(request.description.clone()),
            instance_type: request.instance_type.clone(),
            zone: Field::Value(request.zone.clone()),
            deploy_type: Field::Value(request.deploy.clone()),
            min_instances: Field::Value(request.min_instances),
            max_instances: Field::Value(request.max_instances),
            min_flavor: Field::Value(request.min_flavor.clone()),
            max_flavor: Field::Value(request.max_flavor.clone()),
            separate_build: Field::from_option(request.separate_build),
            build_flavor: Field::from_option(request.build_flavor.clone()),
            homogeneous: Field::from_option(request.homogeneous.map(|value| !value)),
            sticky_sessions: Field::from_option(request.sticky_sessions),
            cancel_on_push: Field::from_option(request.cancel_on_push),
            force_https: Field::from_option(request.force_https.map(ForceHttps::is_enabled)),
            favorite: Field::from_option(request.favorite),
            archived: Field::from_option(request.archived),
            tags: Field::Value(request.tags.clone()),
            additional_vhosts: Field::Value(request.additional_vhosts.iter().cloned().collect()),
            organization_id: Field::from_option(
                request.owner.organization_id().map(str::to_string),
            ),
            environment: request.environment.clone(),
            kind: ApplicationKind::Generic,
        }
    }
}

/// Desired state that reproduces a reconciled application.
///
/// The platform hostname and the environment are not part of the
/// reconciled state and are left out.
impl From<&CanonicalState> for DesiredSpecification {
    fn from(state: &CanonicalState) -> Self {
        Self {
            name: state.name.clone(),
            description: Field::Value(state.description.clone()),
            instance_type: state.instance_type.clone(),
            zone: Field::Value(state.zone.clone()),
            deploy_type: Field::Value(state.deploy_type.clone()),
            min_instances: Field::Value(state.min_instances),
            max_instances: Field::Value(state.max_instances),
            min_flavor: Field::Value(state.min_flavor.clone()),
            max_flavor: Field::Value(state.max_flavor.clone()),
            separate_build: Field::Value(state.separate_build),
            build_flavor: Field::from_option(state.build_flavor.clone()),
            homogeneous: Field::Value(state.homogeneous),
            sticky_sessions: Field::Value(state.sticky_sessions),
            cancel_on_push: Field::Value(state.cancel_on_push),
            force_https: Field::Value(state.force_https),
            favorite: Field::Value(state.favorite),
            archived: Field::Value(state.archived),
            tags: Field::Value(state.tags.clone()),
            additional_vhosts: Field::Value(state.additional_vhosts.iter().cloned().collect()),
            organization_id: Field::from_option(state.organization_id.clone()),
            environment: BTreeMap::new(),
            kind: ApplicationKind::Generic,
        }
    }
}

fn check_entries(field: &'static str, entries: &[String]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.trim().is_empty() {
            return Err(ValidationError::BlankEntry { field, index });
        }
        if !seen.insert(entry.as_str()) {
            return Err(ValidationError::DuplicateEntry {
                field,
                value: entry.clone(),
            });
        }
    }
    Ok(())
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '*'))
}

//! Desired specification to provisioning request

use tracing::debug;

use crate::catalog::CatalogResolver;
use crate::config::DefaultsConfig;
use crate::error::ReconcileError;
use crate::inventory::InventoryApi;
use crate::model::{
    DesiredSpecification, Field, ForceHttps, Owner, ProvisioningRequest, SpecCollections,
    ValidationError, VariantDescriptor,
};

const DEFAULT_INSTANCE_COUNT: u32 = 1;

/// Resolves the runtime variant and applies the default rules.
pub struct Normalizer<'a> {
    inventory: &'a dyn InventoryApi,
    defaults: &'a DefaultsConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(inventory: &'a dyn InventoryApi, defaults: &'a DefaultsConfig) -> Self {
        Self {
            inventory,
            defaults,
        }
    }

    /// # Errors
    ///
    /// `Validation` for malformed input collections, `Resolution` when no
    /// catalog variant matches. A failed catalog read keeps its upstream
    /// error.
    pub async fn normalize(
        &self,
        spec: &DesiredSpecification,
    ) -> Result<ProvisioningRequest, ReconcileError> {
        let slug = spec.instance_slug()?;
        let collections = spec.collections()?;

        let variant = CatalogResolver::new(self.inventory)
            .resolve(slug, spec.organization())
            .await?;

        Ok(build_request(spec, &variant, self.defaults, collections))
    }
}

/// Normalize against an already resolved variant.
pub fn normalize_with(
    spec: &DesiredSpecification,
    variant: &VariantDescriptor,
    defaults: &DefaultsConfig,
) -> Result<ProvisioningRequest, ValidationError> {
    spec.instance_slug()?;
    let collections = spec.collections()?;
    Ok(build_request(spec, variant, defaults, collections))
}

fn build_request(
    spec: &DesiredSpecification,
    variant: &VariantDescriptor,
    defaults: &DefaultsConfig,
    collections: SpecCollections,
) -> ProvisioningRequest {
    let separate_build = spec.separate_build.value().copied();
    let build_flavor = match separate_build {
        Some(true) => Some(pick_flavor(
            &spec.build_flavor,
            variant,
            &variant.default_build_flavor,
        )),
        _ => None,
    };

    let request = ProvisioningRequest {
        name: spec.name.clone(),
        description: string_or(&spec.description, &spec.name),
        zone: string_or(&spec.zone, &defaults.zone),
        deploy: string_or(&spec.deploy_type, &defaults.deploy_type),

        instance_type: variant.slug.clone(),
        instance_variant: variant.variant_id.clone(),
        instance_version: variant.version.clone(),

        min_instances: spec.min_instances.value().copied().unwrap_or(DEFAULT_INSTANCE_COUNT),
        max_instances: spec.max_instances.value().copied().unwrap_or(DEFAULT_INSTANCE_COUNT),
        min_flavor: pick_flavor(&spec.min_flavor, variant, &variant.default_flavor),
        max_flavor: pick_flavor(&spec.max_flavor, variant, &variant.default_flavor),

        separate_build,
        build_flavor,

        homogeneous: spec.homogeneous.value().map(|homogeneous| !homogeneous),
        sticky_sessions: spec.sticky_sessions.value().copied(),
        cancel_on_push: spec.cancel_on_push.value().copied(),
        force_https: spec.force_https.value().copied().map(ForceHttps::from),

        favorite: spec.favorite.value().copied(),
        archived: spec.archived.value().copied(),
        tags: collections.tags,

        owner: Owner::from_organization(spec.organization()),
        additional_vhosts: collections.additional_vhosts,
        environment: spec.environment(),
    };

    debug!(
        name = %request.name,
        variant_id = %request.instance_variant,
        min_flavor = %request.min_flavor,
        max_flavor = %request.max_flavor,
        "Normalized provisioning request"
    );
    request
}

fn string_or(field: &Field<String>, default: &str) -> String {
    field
        .value()
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// The operator's flavor when the variant offers it, the default otherwise.
fn pick_flavor(chosen: &Field<String>, variant: &VariantDescriptor, default: &str) -> String {
    match chosen {
        Field::Value(name) if variant.has_flavor(name) => name.clone(),
        _ => default.to_string(),
    }
}

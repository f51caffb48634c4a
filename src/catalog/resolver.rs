use thiserror::Error;
use tracing::{debug, info};

use crate::inventory::{InventoryApi, InventoryError};
use crate::model::VariantDescriptor;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no enabled variant matches instance type '{0}'")]
    NotFound(String),

    #[error("failed to list available variants: {0}")]
    Catalog(#[from] InventoryError),
}

/// Resolves an instance type slug to its newest enabled catalog variant.
///
/// The catalog is read on every call; nothing is cached between resolutions.
pub struct CatalogResolver<'a> {
    inventory: &'a dyn InventoryApi,
}

impl<'a> CatalogResolver<'a> {
    pub fn new(inventory: &'a dyn InventoryApi) -> Self {
        Self { inventory }
    }

    pub async fn resolve(
        &self,
        slug: &str,
        organization: Option<&str>,
    ) -> Result<VariantDescriptor, ResolveError> {
        let catalog = self.inventory.list_available_variants(organization).await?;
        debug!(slug, entries = catalog.len(), "Fetched variant catalog");

        let variant = select_latest(catalog, slug)
            .ok_or_else(|| ResolveError::NotFound(slug.to_string()))?;

        info!(
            slug,
            variant_id = %variant.variant_id,
            version = %variant.version,
            "Resolved runtime variant"
        );
        Ok(variant)
    }
}

/// Pick the enabled entry for `slug` with the greatest version.
///
/// Versions compare as plain strings, so "1.9" beats "1.10". Entries sharing
/// the greatest version resolve to the last one listed.
pub fn select_latest(
    catalog: impl IntoIterator<Item = VariantDescriptor>,
    slug: &str,
) -> Option<VariantDescriptor> {
    let matching: Vec<VariantDescriptor> = catalog
        .into_iter()
        .filter(|variant| variant.enabled)
        .filter(|variant| variant.slug == slug)
        .collect();

    let latest_version = matching.iter().map(|variant| variant.version.as_str()).max()?.to_string();

    matching
        .into_iter()
        .filter(|variant| variant.version == latest_version)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;

    fn variant(slug: &str, id: &str, version: &str) -> VariantDescriptor {
        VariantDescriptor::builder()
            .slug(slug)
            .variant_id(id)
            .version(version)
            .default_flavor("XS")
            .default_build_flavor("M")
            .build()
    }

    #[test]
    fn test_versions_compare_lexicographically() {
        let catalog = vec![
            variant("node", "var_a", "1.0"),
            variant("node", "var_b", "1.9"),
            variant("node", "var_c", "1.10"),
        ];

        let selected = select_latest(catalog, "node").unwrap();
        assert_eq!(selected.version, "1.9");
        assert_eq!(selected.variant_id, "var_b");
    }

    #[test]
    fn test_disabled_and_foreign_variants_are_ignored() {
        let mut disabled = variant("node", "var_disabled", "9.0");
        disabled.enabled = false;

        let catalog = vec![
            disabled,
            variant("php", "var_php", "8.3"),
            variant("node", "var_node", "2.0"),
        ];

        let selected = select_latest(catalog, "node").unwrap();
        assert_eq!(selected.variant_id, "var_node");
    }

    #[test]
    fn test_version_tie_takes_last_listed() {
        let catalog = vec![
            variant("node", "var_first", "20"),
            variant("node", "var_second", "20"),
        ];

        assert_eq!(select_latest(catalog, "node").unwrap().variant_id, "var_second");
    }

    #[test]
    fn test_no_match() {
        let mut disabled = variant("php", "var_php", "8.2");
        disabled.enabled = false;
        assert!(select_latest(vec![disabled], "php").is_none());
        assert!(select_latest(Vec::new(), "php").is_none());
    }

    #[tokio::test]
    async fn test_resolve_reads_catalog_every_time() {
        let inventory = InMemoryInventory::new("cleverapps.io");
        inventory.add_variant(variant("php", "var_old", "8.1"));

        let resolver = CatalogResolver::new(&inventory);
        assert_eq!(resolver.resolve("php", None).await.unwrap().version, "8.1");

        inventory.add_variant(variant("php", "var_new", "8.2"));
        assert_eq!(resolver.resolve("php", Some("orga_1")).await.unwrap().version, "8.2");

        assert_eq!(
            inventory.calls(),
            vec!["list_available_variants", "list_available_variants:orga_1"]
        );
    }

    #[tokio::test]
    async fn test_resolve_unknown_slug() {
        let inventory = InMemoryInventory::new("cleverapps.io");
        let resolver = CatalogResolver::new(&inventory);

        let error = resolver.resolve("cobol", None).await.unwrap_err();
        assert!(matches!(error, ResolveError::NotFound(slug) if slug == "cobol"));
    }
}

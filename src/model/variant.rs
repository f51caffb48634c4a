use bon::Builder;

/// Catalog entry describing one runtime variant at one version.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct VariantDescriptor {
    /// Instance type slug, e.g. `php` or `node`
    #[builder(into)]
    pub slug: String,
    #[builder(into)]
    pub variant_id: String,
    #[builder(into)]
    pub version: String,
    #[builder(default = true)]
    pub enabled: bool,
    #[builder(into)]
    pub default_flavor: String,
    #[builder(into)]
    pub default_build_flavor: String,
    #[builder(default)]
    pub flavors: Vec<String>,
}

impl VariantDescriptor {
    pub fn has_flavor(&self, name: &str) -> bool {
        self.flavors.iter().any(|flavor| flavor == name)
    }
}

//! HTTP client for the v2 application inventory API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::error::{InventoryError, Result};
use super::traits::InventoryApi;
use crate::config::ApiConfig;
use crate::model::{
    FlavorRef, Identity, Owner, ProvisioningRequest, RemoteApplication, VariantDescriptor,
};

/// Inventory client over HTTPS with bearer authentication
#[derive(Debug, Clone)]
pub struct HttpInventory {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpInventory {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| InventoryError::Transport(format!("invalid endpoint: {}", e)))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            token: config.token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                InventoryError::Transport(format!("endpoint {} cannot be a base URL", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn owner_url(&self, owner: &Owner, tail: &[&str]) -> Result<Url> {
        let mut segments = match owner {
            Owner::SelfAccount => vec!["v2", "self"],
            Owner::Organization(id) => vec!["v2", "organisations", id.as_str()],
        };
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = body_text(response.text().await);
    debug!(%url, status = status.as_u16(), "Inventory request rejected");

    Err(match status {
        StatusCode::NOT_FOUND => InventoryError::NotFound(if body.is_empty() {
            url.path().to_string()
        } else {
            body
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InventoryError::Unauthorized {
            status: status.as_u16(),
            body,
        },
        _ => InventoryError::Request {
            status: status.as_u16(),
            body,
        },
    })
}

/// Catalog entry as served by `/v2/products/instances`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableInstanceView {
    version: String,
    variant: VariantView,
    #[serde(default)]
    enabled: bool,
    default_flavor: FlavorRef,
    #[serde(default)]
    build_flavor: Option<FlavorRef>,
    #[serde(default)]
    flavors: Vec<FlavorRef>,
}

#[derive(Debug, Deserialize)]
struct VariantView {
    id: String,
    slug: String,
}

impl From<AvailableInstanceView> for VariantDescriptor {
    fn from(view: AvailableInstanceView) -> Self {
        let default_build_flavor = view
            .build_flavor
            .map(|flavor| flavor.name)
            .unwrap_or_else(|| view.default_flavor.name.clone());

        VariantDescriptor {
            slug: view.variant.slug,
            variant_id: view.variant.id,
            version: view.version,
            enabled: view.enabled,
            default_flavor: view.default_flavor.name,
            default_build_flavor,
            flavors: view.flavors.into_iter().map(|flavor| flavor.name).collect(),
        }
    }
}

#[async_trait]
impl InventoryApi for HttpInventory {
    async fn list_available_variants(
        &self,
        organization: Option<&str>,
    ) -> Result<Vec<VariantDescriptor>> {
        let mut request = self
            .client
            .get(self.url(&["v2", "products", "instances"])?);
        if let Some(organization) = organization {
            request = request.query(&[("for", organization)]);
        }

        let views: Vec<AvailableInstanceView> = self.send_json(request).await?;
        Ok(views.into_iter().map(VariantDescriptor::from).collect())
    }

    async fn get_caller_identity(&self) -> Result<Identity> {
        let request = self.client.get(self.url(&["v2", "self"])?);
        self.send_json(request).await
    }

    async fn create_application(
        &self,
        owner: &Owner,
        request: &ProvisioningRequest,
    ) -> Result<RemoteApplication> {
        let url = self.owner_url(owner, &["applications"])?;
        self.send_json(self.client.post(url).json(request)).await
    }

    async fn get_application(&self, owner: &Owner, app_id: &str) -> Result<RemoteApplication> {
        let url = self.owner_url(owner, &["applications", app_id])?;
        self.send_json(self.client.get(url)).await
    }

    async fn delete_application(&self, owner: &Owner, app_id: &str) -> Result<()> {
        let url = self.owner_url(owner, &["applications", app_id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn list_tags(&self, owner: &Owner, app_id: &str) -> Result<Vec<String>> {
        let url = self.owner_url(owner, &["applications", app_id, "tags"])?;
        self.send_json(self.client.get(url)).await
    }

    async fn set_environment(
        &self,
        owner: &Owner,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()> {
        let url = self.owner_url(owner, &["applications", app_id, "env"])?;
        self.send(self.client.put(url).json(environment)).await?;
        Ok(())
    }

    async fn add_vhost(&self, owner: &Owner, app_id: &str, hostname: &str) -> Result<()> {
        let url = self.owner_url(owner, &["applications", app_id, "vhosts", hostname])?;
        self.send(self.client.put(url)).await?;
        Ok(())
    }
}

/// Error body of a rejected request; a body that cannot be read is
/// described rather than dropped.
fn body_text<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_body_is_described() {
        assert_eq!(body_text::<&str>(Ok("boom".into())), "boom");
        assert_eq!(
            body_text(Err("connection reset")),
            "<unreadable body: connection reset>"
        );
    }

    fn inventory(endpoint: &str) -> HttpInventory {
        let config = ApiConfig {
            endpoint: endpoint.to_string(),
            ..ApiConfig::default()
        };
        HttpInventory::new(&config).unwrap()
    }

    #[test]
    fn test_owner_urls() {
        let inventory = inventory("https://api.example.com/");

        let url = inventory
            .owner_url(&Owner::SelfAccount, &["applications", "app_1"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/self/applications/app_1");

        let url = inventory
            .owner_url(&Owner::Organization("orga_1".into()), &["applications"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v2/organisations/orga_1/applications"
        );
    }

    #[test]
    fn test_path_segments_are_escaped() {
        let inventory = inventory("https://api.example.com");
        let url = inventory
            .owner_url(&Owner::SelfAccount, &["applications", "app 1/../x"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v2/self/applications/app%201%2F..%2Fx"
        );
    }

    #[test]
    fn test_build_flavor_falls_back_to_default_flavor() {
        let view: AvailableInstanceView = serde_json::from_value(serde_json::json!({
            "type": "php",
            "version": "8.2",
            "variant": { "id": "var_php", "slug": "php" },
            "enabled": true,
            "defaultFlavor": { "name": "XS" },
            "flavors": [{ "name": "XS" }, { "name": "S" }]
        }))
        .unwrap();

        let descriptor = VariantDescriptor::from(view);
        assert_eq!(descriptor.slug, "php");
        assert_eq!(descriptor.default_build_flavor, "XS");
        assert_eq!(descriptor.flavors, vec!["XS", "S"]);
    }
}

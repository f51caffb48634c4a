//! In-memory inventory for tests and local development
//!
//! Behaves like the remote API for the operations the engine consumes and
//! can be told to fail individual calls.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::error::{InventoryError, Result};
use super::traits::InventoryApi;
use crate::model::{
    FlavorRef, ForceHttps, Identity, Owner, ProvisioningRequest, RemoteApplication,
    RemoteDeployment, RemoteInstance, RemoteVhost, VariantDescriptor,
};

const MAX_ALLOWED_INSTANCES: u32 = 40;

#[derive(Debug, Default)]
struct Inner {
    variants: Vec<VariantDescriptor>,
    identity: Option<Identity>,
    applications: BTreeMap<String, (Owner, RemoteApplication)>,
    environments: BTreeMap<String, BTreeMap<String, String>>,
    failing_vhosts: BTreeSet<String>,
    fail_environment: bool,
    fail_tags: bool,
    blank_tag: bool,
    fail_catalog: bool,
    calls: Vec<String>,
}

#[derive(Debug)]
pub struct InMemoryInventory {
    platform_domain: String,
    inner: Mutex<Inner>,
}

impl InMemoryInventory {
    pub fn new(platform_domain: impl Into<String>) -> Self {
        let inner = Inner {
            identity: Some(Identity {
                id: "user_local".to_string(),
                email: None,
                name: None,
            }),
            ..Inner::default()
        };

        Self {
            platform_domain: platform_domain.into(),
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_variant(&self, variant: VariantDescriptor) {
        self.lock().variants.push(variant);
    }

    /// Make the identity probe fail with 401
    pub fn revoke_identity(&self) {
        self.lock().identity = None;
    }

    pub fn fail_vhost(&self, hostname: impl Into<String>) {
        self.lock().failing_vhosts.insert(hostname.into());
    }

    pub fn fail_environment(&self) {
        self.lock().fail_environment = true;
    }

    pub fn fail_tags(&self) {
        self.lock().fail_tags = true;
    }

    /// Make tag listings carry an extra empty tag
    pub fn return_blank_tag(&self) {
        self.lock().blank_tag = true;
    }

    pub fn fail_catalog(&self) {
        self.lock().fail_catalog = true;
    }

    pub fn insert_application(&self, owner: Owner, application: RemoteApplication) {
        self.lock()
            .applications
            .insert(application.id.clone(), (owner, application));
    }

    /// Drop an application behind the engine's back
    pub fn forget_application(&self, app_id: &str) {
        self.lock().applications.remove(app_id);
    }

    pub fn application(&self, app_id: &str) -> Option<RemoteApplication> {
        self.lock()
            .applications
            .get(app_id)
            .map(|(_, application)| application.clone())
    }

    pub fn update_application(&self, app_id: &str, update: impl FnOnce(&mut RemoteApplication)) {
        if let Some((_, application)) = self.lock().applications.get_mut(app_id) {
            update(application);
        }
    }

    pub fn environment(&self, app_id: &str) -> Option<BTreeMap<String, String>> {
        self.lock().environments.get(app_id).cloned()
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn owned<'a>(
        inner: &'a mut Inner,
        owner: &Owner,
        app_id: &str,
    ) -> Result<&'a mut RemoteApplication> {
        match inner.applications.get_mut(app_id) {
            Some((app_owner, application)) if app_owner == owner => Ok(application),
            _ => Err(InventoryError::NotFound(format!(
                "application {} not found for {}",
                app_id, owner
            ))),
        }
    }

    fn build_application(
        &self,
        owner_id: String,
        request: &ProvisioningRequest,
    ) -> RemoteApplication {
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("app_{}", suffix);

        RemoteApplication {
            name: request.name.clone(),
            description: request.description.clone(),
            zone: request.zone.clone(),
            owner_id,
            instance: RemoteInstance {
                instance_type: request.instance_type.clone(),
                version: request.instance_version.clone(),
                min_instances: request.min_instances,
                max_instances: request.max_instances,
                max_allowed_instances: MAX_ALLOWED_INSTANCES,
                min_flavor: FlavorRef::from(request.min_flavor.as_str()),
                max_flavor: FlavorRef::from(request.max_flavor.as_str()),
            },
            deployment: RemoteDeployment {
                deploy_type: request.deploy.to_uppercase(),
                url: format!("git+ssh://push.{}/{}.git", self.platform_domain, id),
            },
            vhosts: vec![RemoteVhost {
                fqdn: format!("app-{}.{}", suffix, self.platform_domain),
            }],
            homogeneous: request.homogeneous.unwrap_or(false),
            sticky_sessions: request.sticky_sessions.unwrap_or(false),
            cancel_on_push: request.cancel_on_push.unwrap_or(false),
            force_https: request
                .force_https
                .unwrap_or(ForceHttps::Disabled)
                .as_str()
                .to_string(),
            separate_build: request.separate_build.unwrap_or(false),
            build_flavor: request
                .build_flavor
                .as_deref()
                .map(FlavorRef::from),
            favorite: request.favorite.unwrap_or(false),
            archived: request.archived.unwrap_or(false),
            tags: request.tags.clone(),
            id,
        }
    }
}

#[async_trait]
impl InventoryApi for InMemoryInventory {
    async fn list_available_variants(
        &self,
        organization: Option<&str>,
    ) -> Result<Vec<VariantDescriptor>> {
        let mut inner = self.lock();
        inner.calls.push(match organization {
            Some(id) => format!("list_available_variants:{}", id),
            None => "list_available_variants".to_string(),
        });
        if inner.fail_catalog {
            return Err(InventoryError::Request {
                status: 503,
                body: "catalog unavailable".to_string(),
            });
        }
        Ok(inner.variants.clone())
    }

    async fn get_caller_identity(&self) -> Result<Identity> {
        let mut inner = self.lock();
        inner.calls.push("get_caller_identity".to_string());
        inner.identity.clone().ok_or_else(|| InventoryError::Unauthorized {
            status: 401,
            body: "invalid or expired token".to_string(),
        })
    }

    async fn create_application(
        &self,
        owner: &Owner,
        request: &ProvisioningRequest,
    ) -> Result<RemoteApplication> {
        let mut inner = self.lock();
        inner.calls.push(format!("create_application:{}", owner));

        let owner_id = match owner {
            Owner::SelfAccount => inner
                .identity
                .as_ref()
                .map(|identity| identity.id.clone())
                .unwrap_or_default(),
            Owner::Organization(id) => id.clone(),
        };
        let application = self.build_application(owner_id, request);

        inner
            .applications
            .insert(application.id.clone(), (owner.clone(), application.clone()));
        let mut created = application;
        created.tags.clear();
        Ok(created)
    }

    async fn get_application(&self, owner: &Owner, app_id: &str) -> Result<RemoteApplication> {
        let mut inner = self.lock();
        inner.calls.push(format!("get_application:{}", app_id));
        let mut application = Self::owned(&mut inner, owner, app_id)?.clone();
        application.tags.clear();
        Ok(application)
    }

    async fn delete_application(&self, owner: &Owner, app_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("delete_application:{}", app_id));
        Self::owned(&mut inner, owner, app_id)?;
        inner.applications.remove(app_id);
        inner.environments.remove(app_id);
        Ok(())
    }

    async fn list_tags(&self, owner: &Owner, app_id: &str) -> Result<Vec<String>> {
        let mut inner = self.lock();
        inner.calls.push(format!("list_tags:{}", app_id));
        if inner.fail_tags {
            return Err(InventoryError::Request {
                status: 503,
                body: "tag service unavailable".to_string(),
            });
        }
        let blank_tag = inner.blank_tag;
        let mut tags = Self::owned(&mut inner, owner, app_id)?.tags.clone();
        if blank_tag {
            tags.push(String::new());
        }
        Ok(tags)
    }

    async fn set_environment(
        &self,
        owner: &Owner,
        app_id: &str,
        environment: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("set_environment:{}", app_id));
        if inner.fail_environment {
            return Err(InventoryError::Request {
                status: 400,
                body: "invalid environment variable name".to_string(),
            });
        }
        Self::owned(&mut inner, owner, app_id)?;
        inner
            .environments
            .insert(app_id.to_string(), environment.clone());
        Ok(())
    }

    async fn add_vhost(&self, owner: &Owner, app_id: &str, hostname: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("add_vhost:{}", hostname));
        if inner.failing_vhosts.contains(hostname) {
            return Err(InventoryError::Request {
                status: 409,
                body: format!("vhost {} is already registered", hostname),
            });
        }
        let application = Self::owned(&mut inner, owner, app_id)?;
        if !application.vhosts.iter().any(|vhost| vhost.fqdn == hostname) {
            application.vhosts.push(RemoteVhost {
                fqdn: hostname.to_string(),
            });
        }
        Ok(())
    }
}

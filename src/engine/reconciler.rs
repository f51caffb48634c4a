use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::context::ReconcileContext;
use super::diagnostics::Diagnostics;
use super::lifecycle::{Lifecycle, Operation, Phase};
use crate::error::ReconcileError;
use crate::model::{CanonicalState, DesiredSpecification, Owner, RemoteVhost, ValidationError};
use crate::normalizer::Normalizer;
use crate::router::{ApplicationOwnerApi, OwnerRouter};
use crate::translate::{to_canonical, to_canonical_lossy};

/// Outcome of one engine invocation.
///
/// Failures never escape as errors; they are reported through
/// `diagnostics` next to whatever state was reached.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub operation_id: Uuid,
    pub phase: Phase,
    pub state: Option<CanonicalState>,
    pub diagnostics: Diagnostics,
}

impl Reconciled {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }
}

enum Fetch {
    Found(CanonicalState),
    Gone,
    Failed,
}

/// Drives create, read, update, delete and import of application resources.
#[derive(Clone)]
pub struct Reconciler {
    ctx: ReconcileContext,
}

impl Reconciler {
    pub fn new(ctx: ReconcileContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ReconcileContext {
        &self.ctx
    }

    /// Provision a new application from a desired specification.
    ///
    /// Resolution, identity and creation failures abort with no state.
    /// Once the application exists, tag, environment and vhost failures are
    /// reported but the created application is still returned.
    pub async fn create(&self, spec: &DesiredSpecification) -> Reconciled {
        let operation_id = Uuid::now_v7();
        let span = info_span!("create", %operation_id, name = %spec.name);
        self.run_create(operation_id, spec).instrument(span).await
    }

    /// Refresh persisted state from the remote application.
    ///
    /// A missing application yields `Phase::Absent` with no state and no
    /// error. Any other failure keeps the prior state.
    pub async fn read(&self, prior: &CanonicalState) -> Reconciled {
        let operation_id = Uuid::now_v7();
        let span = info_span!("read", %operation_id, app_id = %prior.id);
        self.run_read(operation_id, prior).instrument(span).await
    }

    /// In-place updates are not supported; the prior state is kept as is.
    pub async fn update(&self, spec: &DesiredSpecification, prior: &CanonicalState) -> Reconciled {
        let operation_id = Uuid::now_v7();
        let span = info_span!("update", %operation_id, app_id = %prior.id);

        async {
            let mut lifecycle = Lifecycle::begin(Operation::Update);
            let mut diagnostics = Diagnostics::new();
            debug!(name = %spec.name, "Update is a no-op, keeping prior state");

            let phase = complete(&mut lifecycle, Phase::Created, &mut diagnostics);
            self.finish(operation_id, phase, Some(prior.clone()), diagnostics)
        }
        .instrument(span)
        .await
    }

    /// Delete the remote application. A missing application counts as deleted.
    pub async fn delete(&self, prior: &CanonicalState) -> Reconciled {
        let operation_id = Uuid::now_v7();
        let span = info_span!("delete", %operation_id, app_id = %prior.id);
        self.run_delete(operation_id, prior).instrument(span).await
    }

    /// Adopt an existing remote application by identifier.
    pub async fn import(&self, app_id: &str, organization: Option<&str>) -> Reconciled {
        let operation_id = Uuid::now_v7();
        let span = info_span!("import", %operation_id, app_id);
        self.run_import(operation_id, app_id, organization)
            .instrument(span)
            .await
    }

    async fn run_create(&self, operation_id: Uuid, spec: &DesiredSpecification) -> Reconciled {
        let ctx = &self.ctx;
        let mut lifecycle = Lifecycle::begin(Operation::Create);
        let mut diagnostics = Diagnostics::new();

        let normalizer = Normalizer::new(ctx.inventory().as_ref(), ctx.defaults());
        let request = match ctx.guard(normalizer.normalize(spec)).await {
            Ok(request) => request,
            Err(error) => {
                diagnostics.add_error(normalize_summary(&error), error);
                return self.finish(operation_id, lifecycle.abandon(), None, diagnostics);
            }
        };

        let scope = OwnerRouter::route(ctx.inventory().clone(), request.owner.clone());
        let owner = scope.owner().clone();

        if let Err(error) = ctx.guard(scope.verify_identity()).await {
            diagnostics.add_error("Request error while fetching self user", error);
            return self.finish(operation_id, lifecycle.abandon(), None, diagnostics);
        }

        let mut application = match ctx.guard(scope.create(&request)).await {
            Ok(application) => application,
            Err(error) => {
                diagnostics.add_error(
                    format!("Request error while creating application for {}", owner),
                    error,
                );
                return self.finish(operation_id, lifecycle.abandon(), None, diagnostics);
            }
        };
        ctx.metrics().application_created();
        info!(app_id = %application.id, owner = %owner, "Created application");

        application.tags = match ctx.guard(scope.tags(&application.id)).await {
            Ok(tags) => tags,
            Err(error) => {
                warn!(app_id = %application.id, error = %error, "Keeping requested tags");
                diagnostics.add_error(
                    format!("Request error while fetching application tags for {}", owner),
                    error,
                );
                request.tags.clone()
            }
        };

        if !self.skip_when_cancelled(&mut diagnostics) && !request.environment.is_empty() {
            match ctx
                .guard(scope.set_environment(&application.id, &request.environment))
                .await
            {
                Ok(()) => debug!(
                    app_id = %application.id,
                    variables = request.environment.len(),
                    "Set environment"
                ),
                Err(error) => {
                    diagnostics.add_error("Request error while setting environment variables", error)
                }
            }
        }

        if !self.skip_when_cancelled(&mut diagnostics) {
            let registered = self
                .register_vhosts(
                    scope.as_ref(),
                    &application.id,
                    &request.additional_vhosts,
                    &mut diagnostics,
                )
                .await;
            application
                .vhosts
                .extend(registered.into_iter().map(|fqdn| RemoteVhost { fqdn }));
        }

        // The application exists remotely, so its id must reach state.
        let (state, problem) = to_canonical_lossy(&application, &owner, ctx.vhosts());
        if let Some(error) = problem {
            warn!(app_id = %application.id, error = %error, "Dropped blank entries from created application");
            diagnostics.add_error("Invalid application returned by the API", error.into());
        }

        let phase = complete(&mut lifecycle, Phase::Created, &mut diagnostics);
        self.finish(operation_id, phase, Some(state), diagnostics)
    }

    /// True when cancellation was requested. Adds the cancellation
    /// diagnostic unless an earlier call already reported it.
    fn skip_when_cancelled(&self, diagnostics: &mut Diagnostics) -> bool {
        if !self.ctx.is_cancelled() {
            return false;
        }
        if !diagnostics.was_cancelled() {
            diagnostics.add_error("Operation cancelled", ReconcileError::Cancelled);
        }
        true
    }

    /// Register additional hostnames concurrently, returning those that
    /// succeeded. Each failure gets its own diagnostic.
    async fn register_vhosts(
        &self,
        scope: &dyn ApplicationOwnerApi,
        app_id: &str,
        desired: &BTreeSet<String>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let hostnames = self.ctx.vhosts().registrable(desired);
        for hostname in desired.iter().filter(|host| self.ctx.vhosts().is_default(host)) {
            diagnostics.add_warning(
                "Ignoring platform hostname",
                format!("{} is assigned by the platform and is not registered", hostname),
            );
        }

        let calls = hostnames.iter().map(|hostname| async move {
            let result = self.ctx.guard(scope.add_vhost(app_id, hostname)).await;
            (*hostname, result)
        });

        let mut registered = Vec::new();
        for (hostname, result) in join_all(calls).await {
            match result {
                Ok(()) => {
                    info!(app_id, hostname, "Registered vhost");
                    registered.push(hostname.to_string());
                }
                Err(error) => {
                    warn!(app_id, hostname, error = %error, "Failed to register vhost");
                    diagnostics.add_error(
                        format!("Request error while adding vhost {}", hostname),
                        error,
                    );
                }
            }
        }
        registered
    }

    async fn run_read(&self, operation_id: Uuid, prior: &CanonicalState) -> Reconciled {
        let mut lifecycle = Lifecycle::begin(Operation::Read);
        let mut diagnostics = Diagnostics::new();

        match self.fetch(&prior.owner(), &prior.id, &mut diagnostics).await {
            Fetch::Found(state) => {
                self.ctx.metrics().application_refreshed();
                let phase = complete(&mut lifecycle, Phase::Created, &mut diagnostics);
                self.finish(operation_id, phase, Some(state), diagnostics)
            }
            Fetch::Gone => {
                self.ctx.metrics().application_absent();
                warn!("Application no longer exists, clearing state");
                let phase = complete(&mut lifecycle, Phase::Absent, &mut diagnostics);
                self.finish(operation_id, phase, None, diagnostics)
            }
            Fetch::Failed => {
                self.finish(operation_id, lifecycle.abandon(), Some(prior.clone()), diagnostics)
            }
        }
    }

    async fn run_delete(&self, operation_id: Uuid, prior: &CanonicalState) -> Reconciled {
        let ctx = &self.ctx;
        let mut lifecycle = Lifecycle::begin(Operation::Delete);
        let mut diagnostics = Diagnostics::new();

        let scope = OwnerRouter::route(ctx.inventory().clone(), prior.owner());
        if let Err(error) = ctx.guard(scope.verify_identity()).await {
            diagnostics.add_error("Request error while fetching self user", error);
            return self.finish(operation_id, lifecycle.abandon(), Some(prior.clone()), diagnostics);
        }

        match ctx.guard(scope.delete(&prior.id)).await {
            Ok(()) => {
                ctx.metrics().application_deleted();
                info!("Deleted application");
            }
            Err(error) if error.is_not_found() => {
                debug!("Application already gone");
            }
            Err(error) => {
                diagnostics.add_error(
                    format!("Request error while deleting application for {}", scope.owner()),
                    error,
                );
                return self.finish(
                    operation_id,
                    lifecycle.abandon(),
                    Some(prior.clone()),
                    diagnostics,
                );
            }
        }

        let phase = complete(&mut lifecycle, Phase::Absent, &mut diagnostics);
        self.finish(operation_id, phase, None, diagnostics)
    }

    async fn run_import(
        &self,
        operation_id: Uuid,
        app_id: &str,
        organization: Option<&str>,
    ) -> Reconciled {
        let mut diagnostics = Diagnostics::new();
        if app_id.trim().is_empty() {
            diagnostics.add_error(
                "Invalid import identifier",
                ValidationError::MissingField { field: "id" }.into(),
            );
            return self.finish(operation_id, Phase::Planned, None, diagnostics);
        }

        // The identifier is taken as is, then read like persisted state.
        let mut lifecycle = Lifecycle::begin(Operation::Read);
        let owner = Owner::from_organization(organization);

        match self.fetch(&owner, app_id, &mut diagnostics).await {
            Fetch::Found(state) => {
                info!(owner = %owner, "Imported application");
                let phase = complete(&mut lifecycle, Phase::Created, &mut diagnostics);
                self.finish(operation_id, phase, Some(state), diagnostics)
            }
            Fetch::Gone => {
                diagnostics.add_error(
                    format!("Cannot import application {}", app_id),
                    ReconcileError::NotFound(format!("application {} for {}", app_id, owner)),
                );
                let phase = complete(&mut lifecycle, Phase::Absent, &mut diagnostics);
                self.finish(operation_id, phase, None, diagnostics)
            }
            Fetch::Failed => {
                lifecycle.abandon();
                self.finish(operation_id, Phase::Planned, None, diagnostics)
            }
        }
    }

    /// Identity probe, application read and tag read for one identifier.
    async fn fetch(&self, owner: &Owner, app_id: &str, diagnostics: &mut Diagnostics) -> Fetch {
        let ctx = &self.ctx;
        let scope = OwnerRouter::route(ctx.inventory().clone(), owner.clone());

        if let Err(error) = ctx.guard(scope.verify_identity()).await {
            diagnostics.add_error("Request error while fetching self user", error);
            return Fetch::Failed;
        }

        let mut application = match ctx.guard(scope.get(app_id)).await {
            Ok(application) => application,
            Err(error) if error.is_not_found() => return Fetch::Gone,
            Err(error) => {
                diagnostics.add_error(
                    format!("Request error while reading application for {}", owner),
                    error,
                );
                return Fetch::Failed;
            }
        };

        application.tags = match ctx.guard(scope.tags(&application.id)).await {
            Ok(tags) => tags,
            Err(error) if error.is_not_found() => return Fetch::Gone,
            Err(error) => {
                diagnostics.add_error(
                    format!("Request error while fetching application tags for {}", owner),
                    error,
                );
                return Fetch::Failed;
            }
        };

        match to_canonical(&application, owner, ctx.vhosts()) {
            Ok(state) => Fetch::Found(state),
            Err(error) => {
                diagnostics.add_error("Invalid application returned by the API", error.into());
                Fetch::Failed
            }
        }
    }

    fn finish(
        &self,
        operation_id: Uuid,
        phase: Phase,
        state: Option<CanonicalState>,
        diagnostics: Diagnostics,
    ) -> Reconciled {
        if diagnostics.has_error() {
            self.ctx.metrics().reconciliation_failed();
            for diagnostic in diagnostics.errors() {
                error!(%phase, summary = %diagnostic.summary, detail = %diagnostic.detail, "Reconciliation error");
            }
        } else {
            info!(%phase, "Reconciliation finished");
        }

        Reconciled {
            operation_id,
            phase,
            state,
            diagnostics,
        }
    }
}

fn complete(lifecycle: &mut Lifecycle, target: Phase, diagnostics: &mut Diagnostics) -> Phase {
    match lifecycle.complete(target) {
        Ok(phase) => phase,
        Err(error) => {
            diagnostics.add_warning("Unexpected lifecycle transition", error.to_string());
            lifecycle.abandon()
        }
    }
}

fn normalize_summary(error: &ReconcileError) -> &'static str {
    match error {
        ReconcileError::Validation(_) => "Invalid application specification",
        ReconcileError::Resolution(_) => "Unable to resolve runtime variant",
        ReconcileError::Cancelled => "Operation cancelled",
        _ => "Request error while listing available variants",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultsConfig;
    use crate::inventory::InMemoryInventory;
    use crate::model::{Field, VariantDescriptor};
    use crate::observability::Metrics;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryInventory>, Reconciler) {
        let inventory = Arc::new(InMemoryInventory::new("cleverapps.io"));
        inventory.add_variant(
            VariantDescriptor::builder()
                .slug("node")
                .variant_id("var_node")
                .version("20")
                .default_flavor("nano")
                .default_build_flavor("S")
                .flavors(vec!["nano".into(), "S".into()])
                .build(),
        );
        let ctx = ReconcileContext::new(
            inventory.clone(),
            DefaultsConfig::default(),
            Arc::new(Metrics::new()),
        )
        .unwrap();
        (inventory, Reconciler::new(ctx))
    }

    fn spec() -> DesiredSpecification {
        DesiredSpecification {
            name: "api".into(),
            instance_type: "node".into(),
            tags: Field::Value(vec!["prod".into()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_commits_state() {
        let (inventory, reconciler) = setup();

        let outcome = reconciler.create(&spec()).await;
        assert!(outcome.is_success(), "{:?}", outcome.diagnostics);
        assert_eq!(outcome.phase, Phase::Created);

        let state = outcome.state.unwrap();
        assert_eq!(state.tags, vec!["prod"]);
        assert!(state.vhost.unwrap().starts_with("app-"));
        assert!(inventory.application(&state.id).is_some());
        assert_eq!(reconciler.context().metrics().snapshot().created, 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_aborts_before_probe() {
        let (inventory, reconciler) = setup();
        let mut spec = spec();
        spec.instance_type = "ruby".into();

        let outcome = reconciler.create(&spec).await;
        assert_eq!(outcome.phase, Phase::Planned);
        assert!(outcome.state.is_none());
        assert_eq!(
            outcome.diagnostics.errors().next().unwrap().summary,
            "Unable to resolve runtime variant"
        );
        assert_eq!(inventory.calls(), vec!["list_available_variants"]);
    }

    #[tokio::test]
    async fn test_tag_failure_keeps_created_application() {
        let (inventory, reconciler) = setup();
        inventory.fail_tags();

        let outcome = reconciler.create(&spec()).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.phase, Phase::Created);
        assert_eq!(outcome.state.unwrap().tags, vec!["prod"]);
    }

    #[tokio::test]
    async fn test_update_keeps_prior_state() {
        let (inventory, reconciler) = setup();
        let created = reconciler.create(&spec()).await.state.unwrap();
        let calls_before = inventory.calls().len();

        let mut changed = spec();
        changed.description = Field::Value("something else".into());
        let outcome = reconciler.update(&changed, &created).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.phase, Phase::Created);
        assert_eq!(outcome.state, Some(created));
        assert_eq!(inventory.calls().len(), calls_before);
    }
}

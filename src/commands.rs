use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use converge::config::Config;
use converge::engine::{Phase, ReconcileContext, Reconciled, Reconciler};
use converge::inventory::{HttpInventory, InventoryApi};
use converge::model::DesiredSpecification;
use converge::normalizer::Normalizer;
use converge::observability::Metrics;
use converge::store::StateStore;

use crate::AnyError;
use crate::cli::{Cli, Commands};

#[derive(Debug, Error)]
enum CommandError {
    #[error("no stored state for resource '{0}'")]
    UnknownResource(String),

    #[error("resource '{0}' is already managed")]
    AlreadyManaged(String),

    #[error("{operation} finished with {errors} error(s)")]
    Failed { operation: &'static str, errors: usize },
}

pub async fn run(cli: Cli, config: Config) -> Result<(), AnyError> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let inventory: Arc<dyn InventoryApi> = Arc::new(HttpInventory::new(&config.api)?);
    let metrics = Arc::new(Metrics::new());
    let ctx = ReconcileContext::new(inventory, config.defaults.clone(), metrics.clone())?
        .with_cancellation(cancel.clone());
    let reconciler = Reconciler::new(ctx);

    let result = match cli.command {
        Commands::Plan(args) => plan(&reconciler, &args.spec).await,
        Commands::Apply(args) => {
            let store = StateStore::open(&config.store.path)?;
            apply(&reconciler, &store, &args.spec).await
        }
        Commands::Refresh(args) => {
            let store = StateStore::open(&config.store.path)?;
            refresh(&reconciler, &store, args.name).await
        }
        Commands::Destroy(args) => {
            let store = StateStore::open(&config.store.path)?;
            destroy(&reconciler, &store, &args.name).await
        }
        Commands::Import(args) => {
            let store = StateStore::open(&config.store.path)?;
            import(
                &reconciler,
                &store,
                &args.name,
                &args.id,
                args.organization.as_deref(),
            )
            .await
        }
    };

    info!(metrics = ?metrics.snapshot(), "Done");
    cancel.cancel();
    result
}

fn load_spec(path: &Path) -> Result<DesiredSpecification, AnyError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

async fn plan(reconciler: &Reconciler, spec_path: &Path) -> Result<(), AnyError> {
    let spec = load_spec(spec_path)?;
    let ctx = reconciler.context();

    let normalizer = Normalizer::new(ctx.inventory().as_ref(), ctx.defaults());
    let request = ctx.guard(normalizer.normalize(&spec)).await?;

    let plan = serde_json::json!({
        "owner": request.owner.to_string(),
        "request": &request,
        "additional_vhosts": &request.additional_vhosts,
        "environment": request.environment.keys().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn apply(
    reconciler: &Reconciler,
    store: &StateStore,
    spec_path: &Path,
) -> Result<(), AnyError> {
    let spec = load_spec(spec_path)?;

    let outcome = match store.get(&spec.name)? {
        Some(prior) => {
            let updated = reconciler.update(&spec, &prior).await;
            match &updated.state {
                Some(state) => reconciler.read(state).await,
                None => updated,
            }
        }
        None => reconciler.create(&spec).await,
    };

    commit(store, &spec.name, &outcome)?;
    report("apply", &outcome)
}

async fn refresh(
    reconciler: &Reconciler,
    store: &StateStore,
    name: Option<String>,
) -> Result<(), AnyError> {
    let names = match name {
        Some(name) => vec![name],
        None => store.names()?,
    };

    let mut errors = 0;
    for name in names {
        let prior = store
            .get(&name)?
            .ok_or_else(|| CommandError::UnknownResource(name.clone()))?;

        let outcome = reconciler.read(&prior).await;
        commit(store, &name, &outcome)?;
        if outcome.phase == Phase::Absent {
            warn!(resource = %name, "Resource is gone, state removed");
        }
        if let Err(error) = report("refresh", &outcome) {
            warn!(resource = %name, error = %error, "Refresh failed");
            errors += 1;
        }
        if reconciler.context().is_cancelled() {
            break;
        }
    }

    if errors > 0 {
        return Err(CommandError::Failed {
            operation: "refresh",
            errors,
        }
        .into());
    }
    Ok(())
}

async fn destroy(reconciler: &Reconciler, store: &StateStore, name: &str) -> Result<(), AnyError> {
    let prior = store
        .get(name)?
        .ok_or_else(|| CommandError::UnknownResource(name.to_string()))?;

    let outcome = reconciler.delete(&prior).await;
    commit(store, name, &outcome)?;
    report("destroy", &outcome)
}

async fn import(
    reconciler: &Reconciler,
    store: &StateStore,
    name: &str,
    app_id: &str,
    organization: Option<&str>,
) -> Result<(), AnyError> {
    if store.get(name)?.is_some() {
        return Err(CommandError::AlreadyManaged(name.to_string()).into());
    }

    let outcome = reconciler.import(app_id, organization).await;
    commit(store, name, &outcome)?;
    report("import", &outcome)
}

/// Store whatever state the operation reached.
fn commit(store: &StateStore, name: &str, outcome: &Reconciled) -> Result<(), AnyError> {
    match (&outcome.state, outcome.phase) {
        (Some(state), _) => store.put(name, state)?,
        (None, Phase::Absent) => store.remove(name)?,
        (None, _) => return Ok(()),
    }
    store.persist()?;
    Ok(())
}

fn report(operation: &'static str, outcome: &Reconciled) -> Result<(), AnyError> {
    for diagnostic in outcome.diagnostics.iter() {
        eprintln!(
            "{}: {}\n  {}",
            diagnostic.severity, diagnostic.summary, diagnostic.detail
        );
    }

    if let Some(state) = &outcome.state {
        println!("{}", serde_json::to_string_pretty(state)?);
    }

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CommandError::Failed {
            operation,
            errors: outcome.diagnostics.errors().count(),
        }
        .into())
    }
}

/// Cancel in-flight reconciliation on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => return,
    }

    info!("Shutdown signal received, cancelling");
    cancel.cancel();
}

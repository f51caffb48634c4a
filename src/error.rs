use thiserror::Error;

use crate::catalog::ResolveError;
use crate::inventory::InventoryError;
use crate::model::ValidationError;

/// Failure of one reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The remote resource is absent; drives state removal
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("identity verification failed: {0}")]
    UpstreamAuth(String),

    #[error("{}", upstream_message(.status, .body))]
    UpstreamRequest { status: Option<u16>, body: String },

    #[error("no usable runtime variant: {0}")]
    Resolution(String),

    #[error("invalid specification: {0}")]
    Validation(#[from] ValidationError),

    #[error("operation cancelled before completion")]
    Cancelled,
}

fn upstream_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!(
            "An unexpected error was encountered while requesting the API (HTTP {}): {}",
            status, body
        ),
        None => format!(
            "An unexpected error was encountered while requesting the API: {}",
            body
        ),
    }
}

impl ReconcileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound(_))
    }
}

impl From<InventoryError> for ReconcileError {
    fn from(error: InventoryError) -> Self {
        match error {
            InventoryError::NotFound(what) => ReconcileError::NotFound(what),
            InventoryError::Unauthorized { status, body }
            | InventoryError::Request { status, body } => ReconcileError::UpstreamRequest {
                status: Some(status),
                body,
            },
            InventoryError::Transport(detail) | InventoryError::Decode(detail) => {
                ReconcileError::UpstreamRequest {
                    status: None,
                    body: detail,
                }
            }
        }
    }
}

impl From<ResolveError> for ReconcileError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Catalog(error) => ReconcileError::from(error),
            ResolveError::NotFound(_) => ReconcileError::Resolution(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_body_is_kept_verbatim() {
        let error = ReconcileError::from(InventoryError::Request {
            status: 500,
            body: "{\"message\":\"boom\"}".into(),
        });
        assert_eq!(
            error,
            ReconcileError::UpstreamRequest {
                status: Some(500),
                body: "{\"message\":\"boom\"}".into()
            }
        );
        assert!(error.to_string().contains("(HTTP 500): {\"message\":\"boom\"}"));
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let error = ReconcileError::from(InventoryError::NotFound("app_1".into()));
        assert!(error.is_not_found());
    }

    #[test]
    fn test_catalog_failure_stays_upstream() {
        let error = ReconcileError::from(ResolveError::Catalog(InventoryError::Request {
            status: 503,
            body: "catalog down".into(),
        }));
        assert_eq!(
            error,
            ReconcileError::UpstreamRequest {
                status: Some(503),
                body: "catalog down".into()
            }
        );

        let error = ReconcileError::from(ResolveError::NotFound("ruby".into()));
        assert!(matches!(error, ReconcileError::Resolution(_)));
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let error = ReconcileError::from(InventoryError::Transport("connection reset".into()));
        assert_eq!(
            error.to_string(),
            "An unexpected error was encountered while requesting the API: connection reset"
        );
    }
}

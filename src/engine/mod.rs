//! Reconciliation engine
//!
//! [`Reconciler`] runs one lifecycle operation at a time against the
//! inventory described by a [`ReconcileContext`] and reports the reached
//! [`Phase`], the resulting state and any [`Diagnostics`].

mod context;
mod diagnostics;
mod lifecycle;
mod reconciler;

pub use context::ReconcileContext;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use lifecycle::{Lifecycle, Operation, Phase, TransitionError};
pub use reconciler::{Reconciled, Reconciler};

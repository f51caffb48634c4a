use std::fmt;
use thiserror::Error;

/// Where a resource stands from the engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Planned,
    Creating,
    Created,
    Reading,
    Updating,
    Deleting,
    Absent,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planned => "planned",
            Phase::Creating => "creating",
            Phase::Created => "created",
            Phase::Reading => "reading",
            Phase::Updating => "updating",
            Phase::Deleting => "deleting",
            Phase::Absent => "absent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Phase an operation must start from
    pub fn origin(self) -> Phase {
        match self {
            Operation::Create => Phase::Planned,
            Operation::Read | Operation::Update | Operation::Delete => Phase::Created,
        }
    }

    /// Phase held while the operation runs
    pub fn transient(self) -> Phase {
        match self {
            Operation::Create => Phase::Creating,
            Operation::Read => Phase::Reading,
            Operation::Update => Phase::Updating,
            Operation::Delete => Phase::Deleting,
        }
    }

    fn allows(self, target: Phase) -> bool {
        matches!(
            (self, target),
            (Operation::Create, Phase::Created)
                | (Operation::Read, Phase::Created | Phase::Absent)
                | (Operation::Update, Phase::Created)
                | (Operation::Delete, Phase::Absent)
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {operation} a resource in phase {phase}")]
    InvalidStart { operation: Operation, phase: Phase },

    #[error("{operation} cannot end in phase {target}")]
    InvalidTarget { operation: Operation, target: Phase },

    #[error("no operation in progress")]
    Idle,
}

/// Phase tracker for one resource.
///
/// `Planned -> Creating -> Created`, `Created -> Reading -> Created | Absent`,
/// `Created -> Updating -> Created`, `Created -> Deleting -> Absent`.
/// An abandoned operation falls back to the phase it started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    phase: Phase,
    running: Option<Operation>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::at(Phase::Planned)
    }
}

impl Lifecycle {
    pub fn at(phase: Phase) -> Self {
        Self {
            phase,
            running: None,
        }
    }

    /// Lifecycle already running `operation` from its origin phase
    pub fn begin(operation: Operation) -> Self {
        Self {
            phase: operation.transient(),
            running: Some(operation),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn start(&mut self, operation: Operation) -> Result<(), TransitionError> {
        if self.running.is_some() || self.phase != operation.origin() {
            return Err(TransitionError::InvalidStart {
                operation,
                phase: self.phase,
            });
        }
        self.phase = operation.transient();
        self.running = Some(operation);
        Ok(())
    }

    pub fn complete(&mut self, target: Phase) -> Result<Phase, TransitionError> {
        let operation = self.running.ok_or(TransitionError::Idle)?;
        if !operation.allows(target) {
            return Err(TransitionError::InvalidTarget { operation, target });
        }
        self.phase = target;
        self.running = None;
        Ok(target)
    }

    pub fn abandon(&mut self) -> Phase {
        if let Some(operation) = self.running.take() {
            self.phase = operation.origin();
        }
        self.phase
    }
}

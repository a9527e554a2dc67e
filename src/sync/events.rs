//! Sync health notifications
//!
//! The engine reports what happened to remote propagation without ever
//! waiting on the listener.

use std::fmt;

/// Which remote call a propagation made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOp {
    Upsert,
    Remove,
}

impl fmt::Display for PropagationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationOp::Upsert => write!(f, "upsert"),
            PropagationOp::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Pre-existing local projects were uploaded to an empty remote store
    Migrated { uploaded: usize },
    /// Remote listing failed; local data was served instead
    Degraded { reason: String },
    /// Remote store was empty but none of the local projects could be
    /// uploaded; migration is attempted again on the next reconcile
    MigrationFailed { attempted: usize },
    /// A remote call for one project was confirmed
    Propagated { op: PropagationOp, project_id: String },
    /// A remote call for one project failed and will not be retried
    PropagationFailed {
        op: PropagationOp,
        project_id: String,
        reason: String,
    },
}

/// Listener for [`SyncEvent`]s
///
/// Called inline from the engine and from propagation tasks, so
/// implementations must return quickly.
pub trait SyncObserver: Send + Sync {
    fn on_event(&self, _event: &SyncEvent) {}
}

impl<F> SyncObserver for F
where
    F: Fn(&SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: &SyncEvent) {
        self(event)
    }
}

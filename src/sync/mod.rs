//! Synchronization orchestrator
//!
//! - engine.rs: SyncEngine, the per-session reconcile/write/delete/import state machine
//! - events.rs: SyncEvent and the SyncObserver hook for sync-health reporting
//! - backup.rs: backup document parsing and export

pub mod backup;
pub mod engine;
pub mod events;

pub use backup::{parse_backup, BackupDocument};
pub use engine::{ProjectSource, Reconciliation, SyncEngine, SyncState};
pub use events::{PropagationOp, SyncEvent, SyncObserver};

// Hormung Sync - local-first storage and cloud synchronization for site projects
//
// Field devices record reports, crew, photos and expenses per project. Every
// change is committed to a local SQLite store first and then propagated to
// the shared remote store on a best-effort basis:
// - database: local store adapter (SQLite)
// - remote: remote store client (HTTP)
// - sync: the reconciling engine tying both together
// - models: the Project document and its embedded children

pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod models;
pub mod remote;
pub mod sync;

pub use config::{RemoteConfig, SyncConfig};
pub use database::{DatabaseManager, LocalStore};
pub use error::{RemoteError, StorageError, SyncError, SyncResult};
pub use identity::Identity;
pub use models::{Expense, ExpenseCategory, Photo, Project, Report, TeamMember};
pub use remote::{HttpRemoteStore, RemoteStore};
pub use sync::{
    BackupDocument, ProjectSource, PropagationOp, Reconciliation, SyncEngine, SyncEvent,
    SyncObserver, SyncState,
};

/// Install the stderr logger (reads RUST_LOG, defaults to `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

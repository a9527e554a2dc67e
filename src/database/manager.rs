// Database manager for the local project store
// Owns the SQLite connection and hands out one shared handle per database file

use anyhow::{Context, Result};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use super::migrations;
use crate::error::StorageError;

/// Open stores, keyed by resolved database path
static OPEN_STORES: Lazy<DashMap<PathBuf, Weak<DatabaseManager>>> = Lazy::new(DashMap::new);

/// Database manager that owns the SQLite connection
pub struct DatabaseManager {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl DatabaseManager {
    /// Open (or create) the store at `db_path`.
    ///
    /// Idempotent: while a handle for the same file is alive, every call
    /// returns that handle instead of opening a second connection.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Arc<Self>, StorageError> {
        let key = resolve_path(db_path.as_ref())?;

        // The entry guard holds the shard lock, so racing opens of the same
        // path serialize here and observe the first one's handle.
        let mut entry = OPEN_STORES.entry(key.clone()).or_default();
        if let Some(existing) = entry.value().upgrade() {
            return Ok(existing);
        }

        let manager = Arc::new(Self::new(key)?);
        *entry.value_mut() = Arc::downgrade(&manager);
        Ok(manager)
    }

    /// Create a new DatabaseManager with the database at the specified path
    fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .context("Failed to open database")?;

        Self::initialize(&conn)?;

        log::info!("Local store opened at: {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        })
    }

    /// Create a private in-memory store
    pub fn in_memory() -> Result<Arc<Self>, StorageError> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        Self::initialize(&conn)?;

        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
            db_path: None,
        }))
    }

    fn initialize(conn: &Connection) -> Result<()> {
        // WAL is not available for in-memory databases; ignore the refusal.
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");
        conn.execute_batch("PRAGMA synchronous = NORMAL;")
            .context("Failed to configure database")?;

        migrations::run_migrations(conn)
            .context("Failed to run database migrations")?;

        Ok(())
    }

    /// Execute a function with access to the database connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock()
            .map_err(|e| StorageError::Unavailable(format!("Failed to lock database connection: {}", e)))?;
        f(&mut conn).map_err(StorageError::from)
    }

    /// Get the database path (None for in-memory stores)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

impl Drop for DatabaseManager {
    fn drop(&mut self) {
        if let Some(path) = &self.db_path {
            // Only forget the entry if it still points at a dead handle.
            OPEN_STORES.remove_if(path, |_, weak| weak.strong_count() == 0);
        }
    }
}

/// Resolve the registry key for a database file, creating its directory.
fn resolve_path(db_path: &Path) -> Result<PathBuf, StorageError> {
    let file_name = db_path.file_name().ok_or_else(|| {
        StorageError::Unavailable(format!("Invalid database path: {:?}", db_path))
    })?;

    let parent = match db_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create database directory {:?}", parent))?;

    let parent = parent
        .canonicalize()
        .with_context(|| format!("Failed to resolve database directory {:?}", parent))?;

    Ok(parent.join(file_name))
}

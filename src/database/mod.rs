// Local store adapter
// SQLite persistence of whole Project documents keyed by project id

pub mod manager;
pub mod migrations;
pub mod projects_repo;

pub use manager::DatabaseManager;

use crate::error::StorageError;
use crate::models::Project;

/// Persistent key-value store of projects, owned by the sync engine
///
/// Implementations must survive process restarts. Every method fails with
/// [`StorageError`] when the underlying store is unusable.
pub trait LocalStore: Send + Sync {
    fn get_all(&self) -> Result<Vec<Project>, StorageError>;

    fn put(&self, project: &Project) -> Result<(), StorageError>;

    /// Overwrite the given projects, leaving all others untouched
    fn put_many(&self, projects: &[Project]) -> Result<(), StorageError> {
        for project in projects {
            self.put(project)?;
        }
        Ok(())
    }

    /// Remove a project; an absent id is not an error
    fn delete(&self, id: &str) -> Result<(), StorageError>;
}

impl LocalStore for DatabaseManager {
    fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        self.get_all_projects()
    }

    fn put(&self, project: &Project) -> Result<(), StorageError> {
        self.put_project(project)
    }

    fn put_many(&self, projects: &[Project]) -> Result<(), StorageError> {
        self.put_projects(projects)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.delete_project(id)
    }
}

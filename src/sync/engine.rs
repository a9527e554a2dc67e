//! Sync engine - local-first reconciliation between the device store and
//! the remote store
//!
//! Every mutation is committed to the local store before the call returns;
//! the matching remote call is then fired in the background and its outcome
//! is only reported to the observer. Propagation is at-most-once and
//! unordered: two writes to the same project issued close together may reach
//! the server in either order, and the last one received wins there.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::task::TaskTracker;

use super::backup::{parse_backup, BackupDocument};
use super::events::{PropagationOp, SyncEvent, SyncObserver};
use crate::config::SyncConfig;
use crate::database::{DatabaseManager, LocalStore};
use crate::error::{RemoteError, StorageError, SyncError, SyncResult};
use crate::identity::Identity;
use crate::models::Project;
use crate::remote::{HttpRemoteStore, RemoteStore};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Reconciling,
    /// No identity; the remote store is never touched
    LocalOnly,
    /// Identity present; remote failures degrade individual calls in place
    Online,
}

/// Where the project set returned by a reconcile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSource {
    /// Local store (no identity, or the remote store could not be reached)
    Local,
    /// Remote store, now mirrored into the local store
    Remote,
    /// Local store, just uploaded to an empty remote store
    Migrated { uploaded: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub projects: Vec<Project>,
    pub source: ProjectSource,
}

impl Reconciliation {
    fn new(projects: Vec<Project>, source: ProjectSource) -> Self {
        Self { projects, source }
    }
}

/// A pending remote call
enum Propagation {
    Upsert(Project),
    Remove(String),
}

impl Propagation {
    fn op(&self) -> PropagationOp {
        match self {
            Propagation::Upsert(_) => PropagationOp::Upsert,
            Propagation::Remove(_) => PropagationOp::Remove,
        }
    }

    fn project_id(&self) -> &str {
        match self {
            Propagation::Upsert(project) => &project.id,
            Propagation::Remove(id) => id,
        }
    }

    async fn run(&self, remote: &dyn RemoteStore, identity: &Identity) -> Result<(), RemoteError> {
        match self {
            Propagation::Upsert(project) => remote.upsert(identity, project).await,
            Propagation::Remove(id) => remote.remove(identity, id).await,
        }
    }
}

/// One session's view of the project data, bound to a caller identity
pub struct SyncEngine {
    identity: Option<Identity>,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    observer: Option<Arc<dyn SyncObserver>>,
    state: RwLock<SyncState>,
    /// Serializes reconciles so at most one remote listing is in flight
    reconcile_lock: Mutex<()>,
    propagations: TaskTracker,
}

impl SyncEngine {
    pub fn new(
        identity: Option<Identity>,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            identity,
            local,
            remote,
            observer: None,
            state: RwLock::new(SyncState::Uninitialized),
            reconcile_lock: Mutex::new(()),
            propagations: TaskTracker::new(),
        }
    }

    /// Open the configured local store and HTTP remote for a session
    pub fn from_config(config: &SyncConfig) -> anyhow::Result<Self> {
        let local = DatabaseManager::open(&config.database_path)?;
        let remote = HttpRemoteStore::new(config.remote.clone())?;
        let identity = Identity::from_optional(config.identity.as_deref());

        log::info!(
            "Sync session starting ({}), remote endpoint {}",
            if identity.is_some() { "signed in" } else { "no identity" },
            remote.endpoint()
        );

        Ok(Self::new(identity, local, Arc::new(remote)))
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub async fn state(&self) -> SyncState {
        *self.state.read().await
    }

    async fn set_state(&self, state: SyncState) {
        let mut current = self.state.write().await;
        if *current != state {
            log::info!("Sync state {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    fn notify(&self, event: SyncEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    /// Every locally stored project
    pub fn list_local(&self) -> SyncResult<Vec<Project>> {
        self.local.get_all().map_err(|e| {
            log::error!("Failed to read local store: {}", e);
            e.into()
        })
    }

    /// Decide which store is authoritative and return the project set.
    ///
    /// Local projects missing from a non-empty remote set are neither
    /// deleted nor uploaded here; they stay in the local store untouched.
    pub async fn reconcile(&self) -> SyncResult<Reconciliation> {
        let _guard = self.reconcile_lock.lock().await;
        self.set_state(SyncState::Reconciling).await;

        let result = match self.identity.clone() {
            None => self.list_local().map(|p| Reconciliation::new(p, ProjectSource::Local)),
            Some(identity) => self.reconcile_with_remote(&identity).await,
        };

        let settled = if self.identity.is_some() {
            SyncState::Online
        } else {
            SyncState::LocalOnly
        };
        self.set_state(settled).await;

        if let Ok(reconciliation) = &result {
            log::info!(
                "Reconciled {} project(s) from {:?}",
                reconciliation.projects.len(),
                reconciliation.source
            );
        }
        result
    }

    async fn reconcile_with_remote(&self, identity: &Identity) -> SyncResult<Reconciliation> {
        let remote_projects = match self.remote.list(identity).await {
            Ok(projects) => projects,
            Err(err) => {
                log::warn!("Remote list failed, serving local data: {}", err);
                self.notify(SyncEvent::Degraded { reason: err.to_string() });
                return self
                    .list_local()
                    .map(|p| Reconciliation::new(p, ProjectSource::Local));
            }
        };

        if remote_projects.is_empty() {
            return self.reconcile_empty_remote(identity).await;
        }

        if let Err(err) = self.local.put_many(&remote_projects) {
            // The remote answer is still authoritative for this read.
            log::warn!("Failed to refresh local cache from remote: {}", err);
        } else {
            self.log_local_only(&remote_projects);
        }

        Ok(Reconciliation::new(remote_projects, ProjectSource::Remote))
    }

    async fn reconcile_empty_remote(&self, identity: &Identity) -> SyncResult<Reconciliation> {
        let local = match self.local.get_all() {
            Ok(local) => local,
            Err(err) => {
                log::warn!("Local store unavailable, serving empty remote set: {}", err);
                return Ok(Reconciliation::new(Vec::new(), ProjectSource::Remote));
            }
        };

        if local.is_empty() {
            return Ok(Reconciliation::new(local, ProjectSource::Remote));
        }

        let uploaded = self.migrate(identity, &local).await;
        if uploaded == 0 {
            log::warn!("Migration uploaded none of {} local project(s)", local.len());
            self.notify(SyncEvent::MigrationFailed { attempted: local.len() });
            return Ok(Reconciliation::new(local, ProjectSource::Local));
        }

        log::info!("Migrated {} of {} local project(s) to remote", uploaded, local.len());
        self.notify(SyncEvent::Migrated { uploaded });
        Ok(Reconciliation::new(local, ProjectSource::Migrated { uploaded }))
    }

    /// Upload local projects one at a time; returns how many succeeded.
    async fn migrate(&self, identity: &Identity, projects: &[Project]) -> usize {
        let mut uploaded = 0;
        for project in projects {
            if self.upsert_now(identity, project).await {
                uploaded += 1;
            }
        }
        uploaded
    }

    /// Awaited upsert; failures are reported, never returned.
    async fn upsert_now(&self, identity: &Identity, project: &Project) -> bool {
        match self.remote.upsert(identity, project).await {
            Ok(()) => {
                self.notify(SyncEvent::Propagated {
                    op: PropagationOp::Upsert,
                    project_id: project.id.clone(),
                });
                true
            }
            Err(err) => {
                log::warn!("Remote upsert of project {} failed: {}", project.id, err);
                self.notify(SyncEvent::PropagationFailed {
                    op: PropagationOp::Upsert,
                    project_id: project.id.clone(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    fn log_local_only(&self, remote_projects: &[Project]) {
        let Ok(local) = self.local.get_all() else {
            return;
        };
        let orphaned = local
            .iter()
            .filter(|p| !remote_projects.iter().any(|r| r.id == p.id))
            .count();
        if orphaned > 0 {
            log::info!(
                "{} local project(s) are not present remotely and were left untouched",
                orphaned
            );
        }
    }

    /// Commit a whole project locally, then propagate it in the background.
    pub async fn write(&self, project: &Project) -> SyncResult<()> {
        project.validate().map_err(SyncError::InvalidProject)?;
        self.local.put(project).map_err(|e| self.local_failure("save", &project.id, e))?;
        log::debug!("Project {} committed locally", project.id);

        if let Some(identity) = self.identity.clone() {
            self.spawn_propagation(identity, Propagation::Upsert(project.clone()));
        }
        Ok(())
    }

    /// Create an empty project and commit it like any other write
    pub async fn create_project(
        &self,
        name: impl Into<String>,
        client: impl Into<String>,
    ) -> SyncResult<Project> {
        let project = Project::new(name, client);
        self.write(&project).await?;
        Ok(project)
    }

    /// Remove a project locally, then propagate the removal in the background.
    pub async fn delete_project(&self, id: &str) -> SyncResult<()> {
        self.local.delete(id).map_err(|e| self.local_failure("delete", id, e))?;
        log::debug!("Project {} deleted locally", id);

        if let Some(identity) = self.identity.clone() {
            self.spawn_propagation(identity, Propagation::Remove(id.to_string()));
        }
        Ok(())
    }

    /// Load a snapshot, awaiting each remote upsert in turn, then reconcile.
    pub async fn import_backup(&self, projects: Vec<Project>) -> SyncResult<Reconciliation> {
        log::info!("Importing {} project(s) from backup", projects.len());

        // Validate everything up front so a bad snapshot writes nothing.
        for project in &projects {
            project.validate().map_err(SyncError::InvalidProject)?;
        }

        for project in &projects {
            self.local
                .put(project)
                .map_err(|e| self.local_failure("import", &project.id, e))?;

            if let Some(identity) = &self.identity {
                self.upsert_now(identity, project).await;
            }
        }

        self.reconcile().await
    }

    /// Parse a `{"projects": [...]}` document and import it.
    ///
    /// A malformed document is rejected before anything is written.
    pub async fn import_backup_json(&self, text: &str) -> SyncResult<Reconciliation> {
        let projects = parse_backup(text)?;
        self.import_backup(projects).await
    }

    /// Snapshot of the local store as a backup document
    pub fn export_backup(&self) -> SyncResult<BackupDocument> {
        Ok(BackupDocument::new(self.list_local()?))
    }

    /// Wait for every background propagation started so far.
    pub async fn flush(&self) {
        self.propagations.close();
        self.propagations.wait().await;
        self.propagations.reopen();
    }

    fn local_failure(&self, action: &str, id: &str, err: StorageError) -> SyncError {
        log::error!("Failed to {} project {} locally: {}", action, id, err);
        err.into()
    }

    fn spawn_propagation(&self, identity: Identity, job: Propagation) {
        let remote = Arc::clone(&self.remote);
        let observer = self.observer.clone();

        self.propagations.spawn(async move {
            let op = job.op();
            let project_id = job.project_id().to_string();

            let event = match job.run(remote.as_ref(), &identity).await {
                Ok(()) => {
                    log::debug!("Remote {} of project {} confirmed", op, project_id);
                    SyncEvent::Propagated { op, project_id }
                }
                Err(err) => {
                    log::warn!("Remote {} of project {} failed: {}", op, project_id, err);
                    SyncEvent::PropagationFailed {
                        op,
                        project_id,
                        reason: err.to_string(),
                    }
                }
            };

            if let Some(observer) = observer {
                observer.on_event(&event);
            }
        });
    }
}

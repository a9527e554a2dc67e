#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hormung_sync::{
    DatabaseManager, Identity, LocalStore, Project, RemoteError, RemoteStore, StorageError,
    SyncEngine, SyncEvent, SyncObserver,
};

/// Remote call as seen by [`MemoryRemote`]
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List(String),
    Upsert(String, String),
    Remove(String, String),
}

/// In-memory stand-in for the sync server, one namespace per identity
#[derive(Default)]
pub struct MemoryRemote {
    rows: Mutex<HashMap<String, BTreeMap<String, Project>>>,
    calls: Mutex<Vec<RemoteCall>>,
    fail_list: AtomicBool,
    deny_list: AtomicBool,
    fail_upsert: AtomicBool,
    fail_remove: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, user: &str, project: Project) {
        self.rows
            .lock()
            .unwrap()
            .entry(user.to_string())
            .or_default()
            .insert(project.id.clone(), project);
    }

    /// Projects stored for `user`, sorted by id
    pub fn projects_for(&self, user: &str) -> Vec<Project> {
        self.rows
            .lock()
            .unwrap()
            .get(user)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Upsert(..)))
            .count()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make `list` reject the identity as the server does with a 401
    pub fn set_deny_list(&self, deny: bool) {
        self.deny_list.store(deny, Ordering::SeqCst);
    }

    pub fn set_fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn list(&self, identity: &Identity) -> Result<Vec<Project>, RemoteError> {
        self.record(RemoteCall::List(identity.as_str().to_string()));
        if self.deny_list.load(Ordering::SeqCst) {
            return Err(RemoteError::Unauthorized);
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RemoteError::Status(500));
        }
        Ok(self.projects_for(identity.as_str()))
    }

    async fn upsert(&self, identity: &Identity, project: &Project) -> Result<(), RemoteError> {
        self.record(RemoteCall::Upsert(identity.as_str().to_string(), project.id.clone()));
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        self.seed(identity.as_str(), project.clone());
        Ok(())
    }

    async fn remove(&self, identity: &Identity, id: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::Remove(identity.as_str().to_string(), id.to_string()));
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        if let Some(rows) = self.rows.lock().unwrap().get_mut(identity.as_str()) {
            rows.remove(id);
        }
        Ok(())
    }
}

/// Local store whose every operation fails
pub struct BrokenLocal;

impl LocalStore for BrokenLocal {
    fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn put(&self, _: &Project) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn delete(&self, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

/// Observer that keeps every event it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn migrations(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SyncEvent::Migrated { .. }))
            .count()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_event(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub local: Arc<DatabaseManager>,
    pub remote: Arc<MemoryRemote>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            local: DatabaseManager::in_memory().unwrap(),
            remote: MemoryRemote::new(),
            observer: RecordingObserver::new(),
        }
    }

    /// A session over this harness's stores for `user` (None = signed out)
    pub fn engine(&self, user: Option<&str>) -> SyncEngine {
        SyncEngine::new(
            Identity::from_optional(user),
            self.local.clone(),
            self.remote.clone(),
        )
        .with_observer(self.observer.clone())
    }

    pub fn local_projects(&self) -> Vec<Project> {
        sorted(self.local.get_all_projects().unwrap())
    }
}

pub fn sorted(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by(|a, b| a.id.cmp(&b.id));
    projects
}

pub fn project(id: &str, name: &str) -> Project {
    Project::with_id(id, name, "ACME")
}

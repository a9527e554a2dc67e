//! Remote store client
//!
//! Identity-scoped list/upsert/delete against the durable backend. Calls are
//! single attempts: no retries, no backoff, no queueing.

pub mod http;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::identity::Identity;
use crate::models::Project;

pub use http::HttpRemoteStore;

/// Durable store shared across a user's devices
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every project stored for `identity`
    async fn list(&self, identity: &Identity) -> Result<Vec<Project>, RemoteError>;

    /// Insert or replace a project by id; idempotent
    async fn upsert(&self, identity: &Identity, project: &Project) -> Result<(), RemoteError>;

    /// Delete a project by id; absent on the server is not an error
    async fn remove(&self, identity: &Identity, id: &str) -> Result<(), RemoteError>;
}

//! HTTP implementation of the remote store
//!
//! Speaks the `/sync` JSON protocol: `GET` lists, `POST {"project": ..}`
//! upserts, `DELETE ?id=..` removes. The identity travels in a header.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::RemoteStore;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::identity::Identity;
use crate::models::Project;

/// `GET /sync` response
#[derive(Debug, Deserialize)]
struct ListResponse {
    /// Missing or null is treated as an empty list. Entries are decoded one
    /// by one so a single bad document does not hide the rest.
    #[serde(default)]
    projects: Option<Vec<serde_json::Value>>,
}

/// `POST /sync` request
#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    project: &'a Project,
}

/// Remote store reached over HTTP
pub struct HttpRemoteStore {
    config: RemoteConfig,
    endpoint: String,
    client: Client,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint(),
            config,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn scoped(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        request.header(self.config.identity_header.as_str(), identity.as_str())
    }
}

/// Map a response status onto the error taxonomy
fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(RemoteError::Unauthorized)
    } else {
        Err(RemoteError::Status(status.as_u16()))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self, identity: &Identity) -> Result<Vec<Project>, RemoteError> {
        let response = self
            .scoped(self.client.get(&self.endpoint), identity)
            .send()
            .await?;
        let response = check_status(response)?;

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let projects: Vec<Project> = body
            .projects
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(project) => Some(project),
                Err(e) => {
                    log::warn!("Skipping undecodable remote project #{}: {}", index, e);
                    None
                }
            })
            .collect();

        log::debug!("Remote list returned {} project(s)", projects.len());
        Ok(projects)
    }

    async fn upsert(&self, identity: &Identity, project: &Project) -> Result<(), RemoteError> {
        let response = self
            .scoped(self.client.post(&self.endpoint), identity)
            .json(&UpsertRequest { project })
            .send()
            .await?;
        check_status(response)?;

        log::debug!("Remote upsert of project {} confirmed", project.id);
        Ok(())
    }

    async fn remove(&self, identity: &Identity, id: &str) -> Result<(), RemoteError> {
        let response = self
            .scoped(self.client.delete(&self.endpoint), identity)
            .query(&[("id", id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("Remote delete of project {}: already absent", id);
            return Ok(());
        }
        check_status(response)?;

        log::debug!("Remote delete of project {} confirmed", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> HttpRemoteStore {
        HttpRemoteStore::new(RemoteConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..RemoteConfig::default()
        })
        .unwrap()
    }

    fn user() -> Identity {
        Identity::new("u1").unwrap()
    }

    #[tokio::test]
    async fn test_list_sends_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sync"))
            .and(header("x-user-id", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [{"id": "p1", "name": "Site A", "client": "ACME", "reports": [], "expenses": []}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let projects = store_for(&server).list(&user()).await.unwrap();

        assert_eq!(projects, vec![Project::with_id("p1", "Site A", "ACME")]);
    }

    #[tokio::test]
    async fn test_list_without_projects_key_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(store_for(&server).list(&user()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_maps_401_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
            .mount(&server)
            .await;

        let err = store_for(&server).list(&user()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized));
    }

    #[tokio::test]
    async fn test_list_maps_500_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Fetch Error"})))
            .mount(&server)
            .await;

        let err = store_for(&server).list(&user()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status(500)));
    }

    #[tokio::test]
    async fn test_list_rejects_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = store_for(&server).list(&user()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_list_skips_only_the_undecodable_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [
                    {"id": "p1", "name": "Site A", "client": "ACME"},
                    {"id": "p2", "name": "Site B", "expenses": [{"id": "e1", "date": "2024-05-02", "amount": "doze"}]},
                    {"name": "no id"}
                ]
            })))
            .mount(&server)
            .await;

        let projects = store_for(&server).list(&user()).await.unwrap();

        assert_eq!(projects, vec![Project::with_id("p1", "Site A", "ACME")]);
    }

    #[tokio::test]
    async fn test_upsert_posts_whole_project() {
        let server = MockServer::start().await;
        let project = Project::with_id("p1", "Site A", "ACME");
        Mock::given(method("POST"))
            .and(path("/api/sync"))
            .and(header("x-user-id", "u1"))
            .and(body_json(json!({
                "project": {"id": "p1", "name": "Site A", "client": "ACME", "reports": [], "expenses": []}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).upsert(&user(), &project).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_passes_id_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/sync"))
            .and(query_param("id", "p1"))
            .and(header("x-user-id", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).remove(&user(), "p1").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_absent_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        store_for(&server).remove(&user(), "gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let store = HttpRemoteStore::new(RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..RemoteConfig::default()
        })
        .unwrap();

        let err = store.list(&user()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }
}

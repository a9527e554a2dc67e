//! Configuration for a sync session
//!
//! Values come from defaults, then `HORMUNG_*` environment variables, then
//! command-line flags (applied by the binary).

use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "HORMUNG_DB_PATH";
pub const ENV_SYNC_URL: &str = "HORMUNG_SYNC_URL";
pub const ENV_USER_ID: &str = "HORMUNG_USER_ID";
pub const ENV_SYNC_TIMEOUT_SECS: &str = "HORMUNG_SYNC_TIMEOUT_SECS";

/// Remote store client configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Path of the sync resource, joined onto `base_url`
    pub sync_path: String,
    /// Header carrying the caller identity
    pub identity_header: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4321".to_string(),
            sync_path: "/api/sync".to_string(),
            identity_header: "x-user-id".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.sync_path.trim_start_matches('/')
        )
    }
}

/// Everything needed to start a session
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_path: PathBuf,
    pub remote: RemoteConfig,
    /// Raw user id; blank means no identity
    pub identity: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hormung-sync");

        Self {
            database_path: data_dir.join("hormung.db"),
            remote: RemoteConfig::default(),
            identity: None,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by any `HORMUNG_*` variables that are set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_SYNC_URL) {
            config.remote.base_url = url;
        }
        if let Some(user) = lookup(ENV_USER_ID) {
            config.identity = Some(user);
        }
        if let Some(secs) = lookup(ENV_SYNC_TIMEOUT_SECS) {
            match secs.parse() {
                Ok(secs) => config.remote.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid {}: {:?}", ENV_SYNC_TIMEOUT_SECS, secs),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = RemoteConfig {
            base_url: "https://example.com/".to_string(),
            ..RemoteConfig::default()
        };
        assert_eq!(config.endpoint(), "https://example.com/api/sync");
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/x.db"),
            (ENV_USER_ID, "u1"),
            (ENV_SYNC_TIMEOUT_SECS, "5"),
        ]);
        let config = SyncConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.identity.as_deref(), Some("u1"));
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.remote.identity_header, "x-user-id");
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let config = SyncConfig::from_lookup(|k| {
            (k == ENV_SYNC_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(config.remote.timeout_secs, 30);
    }
}

//! Backup documents
//!
//! A backup is `{"projects": [...]}`. Parsing is all-or-nothing so a bad
//! file never leaves a partial import behind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};
use crate::models::Project;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

impl BackupDocument {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            exported_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse a backup file, filling in missing `reports`/`expenses` lists.
pub fn parse_backup(text: &str) -> SyncResult<Vec<Project>> {
    let mut doc: Value = serde_json::from_str(text)
        .map_err(|e| SyncError::MalformedImport(format!("not valid JSON: {}", e)))?;

    let projects = doc
        .get_mut("projects")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| SyncError::MalformedImport("missing \"projects\" list".to_string()))?;

    projects
        .iter_mut()
        .enumerate()
        .map(|(index, raw)| -> SyncResult<Project> {
            normalize_project(raw);
            let project: Project = serde_json::from_value(raw.take()).map_err(|e| {
                SyncError::MalformedImport(format!("project #{} is invalid: {}", index, e))
            })?;
            project.validate().map_err(|e| {
                SyncError::MalformedImport(format!("project #{} is invalid: {}", index, e))
            })?;
            Ok(project)
        })
        .collect()
}

/// Older exports may carry `null` children; treat them as empty.
fn normalize_project(raw: &mut Value) {
    if let Some(obj) = raw.as_object_mut() {
        for key in ["reports", "expenses"] {
            match obj.get(key) {
                None | Some(Value::Null) => {
                    obj.insert(key.to_string(), Value::Array(Vec::new()));
                }
                _ => {}
            }
        }
    }
}

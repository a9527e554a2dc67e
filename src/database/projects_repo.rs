// Projects repository for the local store
// Whole-document reads and writes of Project rows

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::DatabaseManager;
use crate::error::StorageError;
use crate::models::Project;

impl DatabaseManager {
    /// Get every stored project (order not significant)
    pub fn get_all_projects(&self) -> Result<Vec<Project>, StorageError> {
        let rows = self.with_connection(|conn| get_all_rows_impl(conn))?;
        rows.into_iter()
            .map(|(id, data)| {
                serde_json::from_str(&data).map_err(|source| StorageError::Corrupt { id, source })
            })
            .collect()
    }

    /// Get a single project by id
    pub fn get_project(&self, id: &str) -> Result<Option<Project>, StorageError> {
        let data = self.with_connection(|conn| get_row_impl(conn, id))?;
        data.map(|data| {
            serde_json::from_str(&data).map_err(|source| StorageError::Corrupt {
                id: id.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Insert or overwrite a project keyed by its id
    pub fn put_project(&self, project: &Project) -> Result<(), StorageError> {
        self.with_connection(|conn| put_project_impl(conn, project))
    }

    /// Overwrite several projects in one transaction
    pub fn put_projects(&self, projects: &[Project]) -> Result<(), StorageError> {
        self.with_connection(|conn| {
            let tx = conn.transaction().context("Failed to begin transaction")?;
            for project in projects {
                put_project_impl(&tx, project)?;
            }
            tx.commit().context("Failed to commit projects")?;
            Ok(())
        })
    }

    /// Delete a project; deleting an absent id is a no-op
    pub fn delete_project(&self, id: &str) -> Result<(), StorageError> {
        self.with_connection(|conn| delete_project_impl(conn, id))
    }

    /// Number of stored projects
    pub fn count_projects(&self) -> Result<usize, StorageError> {
        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
                .context("Failed to count projects")?;
            Ok(count as usize)
        })
    }
}

fn get_all_rows_impl(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT id, data FROM projects"
    ).context("Failed to prepare get_all_projects query")?;

    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .context("Failed to query projects")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect projects")
}

fn get_row_impl(conn: &Connection, id: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT data FROM projects WHERE id = ?",
        params![id],
        |row| row.get(0),
    );

    match result {
        Ok(data) => Ok(Some(data)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get project"),
    }
}

fn put_project_impl(conn: &Connection, project: &Project) -> Result<()> {
    let data = serde_json::to_string(project)
        .with_context(|| format!("Failed to serialize project {}", project.id))?;

    conn.execute(
        r#"
        INSERT INTO projects (id, name, client, data, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            client = excluded.client,
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
        params![
            project.id,
            project.name,
            project.client,
            data,
            chrono::Utc::now().to_rfc3339(),
        ],
    ).with_context(|| format!("Failed to save project {}", project.id))?;

    Ok(())
}

fn delete_project_impl(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM projects WHERE id = ?",
        params![id],
    ).context("Failed to delete project")?;

    Ok(())
}

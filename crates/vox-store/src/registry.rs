//! Durable CRUD for projects and their documents.

use std::path::Path;

use sqlx::SqlitePool;

use crate::error::{Result, StoreError};
use crate::types::{Document, DocumentId, DocumentKind, NewDocument, Project};

type ProjectTuple = (String, String, String, String);

type DocumentTuple = (
    i64,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
);

fn project_from_tuple(t: ProjectTuple) -> Project {
    Project {
        id: t.0,
        name: t.1,
        path: t.2,
        created_at: t.3,
    }
}

fn document_from_tuple(t: DocumentTuple) -> Result<Document> {
    let kind: DocumentKind = t.2.parse().map_err(StoreError::Corrupt)?;
    Ok(Document {
        id: DocumentId(t.0),
        project_id: t.1,
        kind,
        title: t.3,
        content: t.4,
        file_path: t.5,
        created_at: t.6,
    })
}

/// Fresh opaque project id: the first 16 hex digits of a random UUID.
fn new_project_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    pool: SqlitePool,
}

impl ProjectRegistry {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register `path` as a project, or return the project already registered there.
    ///
    /// The path is canonicalised first so `./repo` and `/abs/repo` resolve to
    /// the same row. `name` defaults to the final path component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if the path does not exist, or a
    /// database error.
    pub async fn create_project(&self, path: &Path, name: Option<&str>) -> Result<Project> {
        let canonical = path.canonicalize().map_err(|e| StoreError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !canonical.is_dir() {
            return Err(StoreError::InvalidPath {
                path: canonical,
                reason: "not a directory".into(),
            });
        }
        let path_str = canonical.to_string_lossy().into_owned();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .map(str::to_owned)
            .or_else(|| {
                canonical
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| path_str.clone());

        let inserted = sqlx::query(
            "INSERT INTO projects (id, name, path) VALUES (?, ?, ?) ON CONFLICT(path) DO NOTHING",
        )
        .bind(new_project_id())
        .bind(&name)
        .bind(&path_str)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let project = self
            .get_project_by_path(&path_str)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("project row for {path_str} vanished")))?;
        if inserted == 0 {
            tracing::debug!(project_id = %project.id, path = %path_str, "project already registered");
        } else {
            tracing::info!(project_id = %project.id, path = %path_str, "project registered");
        }
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let row: Option<ProjectTuple> =
            sqlx::query_as("SELECT id, name, path, created_at FROM projects WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(project_from_tuple))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_project_by_path(&self, path: &str) -> Result<Option<Project>> {
        let row: Option<ProjectTuple> =
            sqlx::query_as("SELECT id, name, path, created_at FROM projects WHERE path = ?")
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(project_from_tuple))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectTuple> = sqlx::query_as(
            "SELECT id, name, path, created_at FROM projects ORDER BY created_at, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(project_from_tuple).collect())
    }

    /// Delete a project and, by cascade, its documents.
    ///
    /// Returns `false` if no such project existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns an error if the project does not exist or the insert fails.
    pub async fn add_document(&self, project_id: &str, doc: &NewDocument) -> Result<Document> {
        let row: DocumentTuple = sqlx::query_as(
            "INSERT INTO documents (project_id, type, title, content, file_path) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, project_id, type, title, content, file_path, created_at",
        )
        .bind(project_id)
        .bind(doc.kind.as_str())
        .bind(doc.title.as_deref())
        .bind(&doc.content)
        .bind(doc.file_path.as_deref())
        .fetch_one(&self.pool)
        .await?;
        document_from_tuple(row)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row carries an unknown type.
    pub async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        let rows: Vec<DocumentTuple> = sqlx::query_as(
            "SELECT id, project_id, type, title, content, file_path, created_at \
             FROM documents WHERE project_id = ? ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(document_from_tuple).collect()
    }

    /// Fetch a document, scoped to its owning project.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_document(&self, project_id: &str, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<DocumentTuple> = sqlx::query_as(
            "SELECT id, project_id, type, title, content, file_path, created_at \
             FROM documents WHERE project_id = ? AND id = ?",
        )
        .bind(project_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(document_from_tuple).transpose()
    }

    /// Returns `false` if the project has no document with that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_document(&self, project_id: &str, id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE project_id = ? AND id = ?")
            .bind(project_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_documents(&self, project_id: &str) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

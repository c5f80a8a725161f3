//! Project repository contract and SQLite implementation.
//!
//! # Invariants
//! - A project created through `create_project_with_column` is committed
//!   together with its first column or not at all.

use super::board_repo::{expect_changed, SqliteBoardRepository};
use super::column_repo::insert_column;
use super::{RepoError, RepoResult};
use crate::model::board::{Column, EntityKind, Project, ProjectId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT id, name, description, created_at FROM projects";

/// Repository interface for project records.
pub trait ProjectRepository {
    /// Creates a project and its first column in one transaction.
    fn create_project_with_column(
        &self,
        name: &str,
        description: &str,
        column_name: &str,
    ) -> RepoResult<(Project, Column)>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists all projects ordered by name.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Writes name and description. `created_at` is never changed.
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    /// Deletes one project together with its columns, tasks and comments.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

impl ProjectRepository for SqliteBoardRepository<'_> {
    fn create_project_with_column(
        &self,
        name: &str,
        description: &str,
        column_name: &str,
    ) -> RepoResult<(Project, Column)> {
        self.in_immediate_transaction(|| {
            let project = insert_project(self.conn, name, description)?;
            let column = insert_column(self.conn, project.id, column_name)?;
            Ok((project, column))
        })
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        select_project(self.conn, id)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?2, description = ?3 WHERE id = ?1;",
            params![project.id, project.name, project.description],
        )?;
        expect_changed(changed, EntityKind::Project, project.id)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        expect_changed(changed, EntityKind::Project, id)
    }
}

fn insert_project(conn: &Connection, name: &str, description: &str) -> RepoResult<Project> {
    conn.execute(
        "INSERT INTO projects (name, description) VALUES (?1, ?2);",
        params![name, description],
    )?;
    let id = conn.last_insert_rowid();
    select_project(conn, id)?
        .ok_or_else(|| RepoError::InvalidData(format!("project {id} vanished after insert")))
}

fn select_project(conn: &Connection, id: ProjectId) -> RepoResult<Option<Project>> {
    let project = conn
        .query_row(
            &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_project_row,
        )
        .optional()?;
    Ok(project)
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

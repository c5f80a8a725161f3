//! Column repository contract and SQLite implementation.
//!
//! # Invariants
//! - New columns are appended after the highest priority in their project.
//! - Listings are ordered `priority ASC, id ASC`.
//! - Only `update_priority` writes `columns.priority` after creation.
//! - Names are unique per project; a clashing write fails with `DuplicateName`.

use super::board_repo::{
    expect_changed, is_unique_violation, next_priority, SqliteBoardRepository,
};
use super::{RepoError, RepoResult, SiblingStore};
use crate::model::board::{Column, ColumnId, EntityKind, ProjectId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMN_SELECT_SQL: &str = "SELECT id, project_id, name, priority FROM columns";

/// Repository interface for column records.
pub trait ColumnRepository {
    /// Creates one column at the end of its project.
    fn create_column(&self, project_id: ProjectId, name: &str) -> RepoResult<Column>;
    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>>;
    /// Lists one project's columns in display order.
    fn list_columns(&self, project_id: ProjectId) -> RepoResult<Vec<Column>>;
    fn rename_column(&self, id: ColumnId, name: &str) -> RepoResult<()>;
    /// Deletes one column and its tasks. Remaining siblings keep their priorities.
    fn delete_column(&self, id: ColumnId) -> RepoResult<()>;
    /// Returns whether `name` is already used by another column of the project.
    fn column_name_taken(
        &self,
        project_id: ProjectId,
        name: &str,
        excluding: Option<ColumnId>,
    ) -> RepoResult<bool>;
}

impl ColumnRepository for SqliteBoardRepository<'_> {
    fn create_column(&self, project_id: ProjectId, name: &str) -> RepoResult<Column> {
        self.in_immediate_transaction(|| insert_column(self.conn, project_id, name))
    }

    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>> {
        let column = self
            .conn
            .query_row(
                &format!("{COLUMN_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_column_row,
            )
            .optional()?;
        Ok(column)
    }

    fn list_columns(&self, project_id: ProjectId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY priority ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn rename_column(&self, id: ColumnId, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE columns SET name = ?2 WHERE id = ?1;",
                params![id, name],
            )
            .map_err(|err| duplicate_name_or(err, name))?;
        expect_changed(changed, EntityKind::Column, id)
    }

    fn delete_column(&self, id: ColumnId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM columns WHERE id = ?1;", [id])?;
        expect_changed(changed, EntityKind::Column, id)
    }

    fn column_name_taken(
        &self,
        project_id: ProjectId,
        name: &str,
        excluding: Option<ColumnId>,
    ) -> RepoResult<bool> {
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM columns
                WHERE project_id = ?1
                  AND name = ?2
                  AND (?3 IS NULL OR id != ?3)
            );",
            params![project_id, name, excluding],
            |row| row.get(0),
        )?;
        Ok(taken == 1)
    }
}

impl SiblingStore<Column> for SqliteBoardRepository<'_> {
    fn load_entity(&self, id: ColumnId) -> RepoResult<Option<Column>> {
        self.get_column(id)
    }

    fn list_siblings(&self, project_id: ProjectId) -> RepoResult<Vec<Column>> {
        self.list_columns(project_id)
    }

    fn update_priority(&self, id: ColumnId, priority: f64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE columns SET priority = ?2 WHERE id = ?1;",
            params![id, priority],
        )?;
        expect_changed(changed, EntityKind::Column, id)
    }

    fn with_sibling_lock<T, Failure>(
        &self,
        op: impl FnOnce() -> Result<T, Failure>,
    ) -> Result<T, Failure>
    where
        Failure: From<RepoError>,
    {
        self.in_immediate_transaction(op)
    }
}

/// Appends one column to its project. Callers hold the write transaction.
pub(crate) fn insert_column(
    conn: &Connection,
    project_id: ProjectId,
    name: &str,
) -> RepoResult<Column> {
    let priority = next_priority(conn, "columns", "project_id", project_id)?;
    conn.execute(
        "INSERT INTO columns (project_id, name, priority) VALUES (?1, ?2, ?3);",
        params![project_id, name, priority],
    )
    .map_err(|err| duplicate_name_or(err, name))?;
    Ok(Column {
        id: conn.last_insert_rowid(),
        project_id,
        name: name.to_string(),
        priority,
    })
}

fn duplicate_name_or(err: rusqlite::Error, name: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::DuplicateName {
            kind: EntityKind::Column,
            name: name.to_string(),
        };
    }
    err.into()
}

fn parse_column_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        priority: row.get("priority")?,
    })
}

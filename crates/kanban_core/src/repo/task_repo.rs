//! Task repository contract and SQLite implementation.
//!
//! # Invariants
//! - New tasks are appended after the highest priority in their column.
//! - Listings are ordered `priority ASC, id ASC`.
//! - Editing a task never changes its priority.

use super::board_repo::{expect_changed, next_priority, SqliteBoardRepository};
use super::{RepoError, RepoResult, SiblingStore};
use crate::model::board::{ColumnId, EntityKind, Task, TaskId};
use rusqlite::{params, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT id, column_id, name, description, priority FROM tasks";

/// Repository interface for task records.
pub trait TaskRepository {
    /// Creates one task at the end of its column.
    fn create_task(&self, column_id: ColumnId, name: &str, description: &str) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists one column's tasks in display order.
    fn list_tasks(&self, column_id: ColumnId) -> RepoResult<Vec<Task>>;
    fn update_task(&self, id: TaskId, name: &str, description: &str) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

impl TaskRepository for SqliteBoardRepository<'_> {
    fn create_task(&self, column_id: ColumnId, name: &str, description: &str) -> RepoResult<Task> {
        self.in_immediate_transaction(|| {
            let priority = next_priority(self.conn, "tasks", "column_id", column_id)?;
            self.conn.execute(
                "INSERT INTO tasks (column_id, name, description, priority)
                 VALUES (?1, ?2, ?3, ?4);",
                params![column_id, name, description, priority],
            )?;
            Ok(Task {
                id: self.conn.last_insert_rowid(),
                column_id,
                name: name.to_string(),
                description: description.to_string(),
                priority,
            })
        })
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("{TASK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_task_row,
            )
            .optional()?;
        Ok(task)
    }

    fn list_tasks(&self, column_id: ColumnId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE column_id = ?1
             ORDER BY priority ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([column_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, name: &str, description: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET name = ?2, description = ?3 WHERE id = ?1;",
            params![id, name, description],
        )?;
        expect_changed(changed, EntityKind::Task, id)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        expect_changed(changed, EntityKind::Task, id)
    }
}

impl SiblingStore<Task> for SqliteBoardRepository<'_> {
    fn load_entity(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.get_task(id)
    }

    fn list_siblings(&self, column_id: ColumnId) -> RepoResult<Vec<Task>> {
        self.list_tasks(column_id)
    }

    fn update_priority(&self, id: TaskId, priority: f64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET priority = ?2 WHERE id = ?1;",
            params![id, priority],
        )?;
        expect_changed(changed, EntityKind::Task, id)
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

fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        column_id: row.get("column_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        priority: row.get("priority")?,
    })
}

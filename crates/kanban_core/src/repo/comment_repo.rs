//! Comment repository contract and SQLite implementation.

use super::board_repo::{expect_changed, SqliteBoardRepository};
use super::{RepoError, RepoResult};
use crate::model::board::{Comment, CommentId, EntityKind, TaskId};
use rusqlite::{params, OptionalExtension, Row};

const COMMENT_SELECT_SQL: &str = "SELECT id, task_id, text, created_at FROM comments";

/// Repository interface for comment records.
pub trait CommentRepository {
    fn create_comment(&self, task_id: TaskId, text: &str) -> RepoResult<Comment>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Lists one task's comments, newest first.
    fn list_comments(&self, task_id: TaskId) -> RepoResult<Vec<Comment>>;
    fn delete_comment(&self, id: CommentId) -> RepoResult<()>;
}

impl CommentRepository for SqliteBoardRepository<'_> {
    fn create_comment(&self, task_id: TaskId, text: &str) -> RepoResult<Comment> {
        self.conn.execute(
            "INSERT INTO comments (task_id, text) VALUES (?1, ?2);",
            params![task_id, text],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_comment(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("comment {id} missing after insert"))
        })
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let comment = self
            .conn
            .query_row(
                &format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_comment_row,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_comments(&self, task_id: TaskId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE task_id = ?1
             ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([task_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1;", [id])?;
        expect_changed(changed, EntityKind::Comment, id)
    }
}

fn parse_comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
    })
}

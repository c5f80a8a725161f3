//! SQLite-backed board repository.
//!
//! # Responsibility
//! - Own the connection handle shared by project/column/task/comment stores.
//! - Verify the connection is migrated before any query runs.
//! - Provide the immediate-transaction lock used around sibling moves.
//!
//! Record-specific queries live next to their contracts in
//! `project_repo`, `column_repo`, `task_repo` and `comment_repo`.

use super::{RepoError, RepoResult};
use crate::db::migrations::latest_version;
use crate::model::board::EntityKind;
use rusqlite::{Connection, Transaction, TransactionBehavior};

const REQUIRED_TABLES: [&str; 4] = ["projects", "columns", "tasks", "comments"];

/// SQLite board repository over one migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteBoardRepository<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_board_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Runs `op` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken before `op` reads anything, so a competing
    /// writer waits (up to the connection busy timeout) instead of working
    /// from a stale snapshot. Returning `Err` from `op` rolls back.
    pub(crate) fn in_immediate_transaction<T, E>(
        &self,
        op: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(RepoError::from(err)))?;
        let value = op()?;
        tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
        Ok(value)
    }
}

/// Next append-at-end priority for one sibling group.
///
/// `table` and `container_column` are compile-time identifiers, never input.
pub(crate) fn next_priority(
    conn: &Connection,
    table: &'static str,
    container_column: &'static str,
    container_id: i64,
) -> RepoResult<f64> {
    let next = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(priority), 0.0) + 1.0
             FROM {table}
             WHERE {container_column} = ?1;"
        ),
        [container_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Whether `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Maps a zero-row UPDATE/DELETE to `NotFound`.
pub(crate) fn expect_changed(changed: usize, kind: EntityKind, id: i64) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound { kind, id });
    }
    Ok(())
}

fn ensure_board_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::SqliteBoardRepository;
    use crate::db::open_db_in_memory;
    use crate::repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteBoardRepository::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn failed_transaction_body_rolls_back() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteBoardRepository::try_new(&conn).unwrap();

        let result: Result<(), RepoError> = repo.in_immediate_transaction(|| {
            conn.execute("INSERT INTO projects (name) VALUES ('temp');", [])?;
            Err(RepoError::InvalidData("abort".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

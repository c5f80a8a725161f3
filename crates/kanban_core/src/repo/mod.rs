//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per record kind.
//! - Define the sibling store contract consumed by the reorder core.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Sibling listings are ordered `priority ASC, id ASC`.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::board::EntityKind;
use crate::ordering::OrderedEntity;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod board_repo;
pub mod column_repo;
pub mod comment_repo;
pub mod project_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all board record kinds.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target record does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// A uniqueness constraint rejected the write.
    DuplicateName { kind: EntityKind, name: String },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} name `{name}` is already taken")
            }
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read/write collaborator for reordering one kind of sibling.
///
/// Column and task stores are structurally identical; the reorder core only
/// sees this trait.
pub trait SiblingStore<E: OrderedEntity> {
    /// Loads one entity by id.
    fn load_entity(&self, id: i64) -> RepoResult<Option<E>>;

    /// Lists the whole sibling group of `container_id`, ascending by priority.
    fn list_siblings(&self, container_id: E::ContainerId) -> RepoResult<Vec<E>>;

    /// Persists a new priority for one entity. Touches exactly one row.
    fn update_priority(&self, id: i64, priority: f64) -> RepoResult<()>;

    /// Runs a read-modify-write on one sibling group.
    ///
    /// Stores that can lock the group override this so concurrent moves
    /// serialize. The default runs `op` as-is with per-row atomicity only.
    fn with_sibling_lock<T, Failure>(
        &self,
        op: impl FnOnce() -> Result<T, Failure>,
    ) -> Result<T, Failure>
    where
        Failure: From<RepoError>,
    {
        op()
    }
}

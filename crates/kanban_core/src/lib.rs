//! Core domain logic for the kanban board backend.
//! This crate is the single source of truth for board ordering invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::board::{
    Board, BoardColumn, BoardTask, Column, ColumnId, Comment, CommentId, EntityKind, Project,
    ProjectId, Task, TaskId,
};
pub use ordering::{clamp_position, interpolate_priority, OrderedEntity, Placement};
pub use repo::board_repo::SqliteBoardRepository;
pub use repo::column_repo::ColumnRepository;
pub use repo::comment_repo::CommentRepository;
pub use repo::project_repo::ProjectRepository;
pub use repo::task_repo::TaskRepository;
pub use repo::{RepoError, RepoResult, SiblingStore};
pub use service::board_service::{
    BoardRepository, BoardService, BoardServiceError, BoardServiceResult, DEFAULT_COLUMN_NAME,
};
pub use service::reorder_service::{ReorderError, ReorderService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

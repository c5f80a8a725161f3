//! Request layer for the kanban board backend.
//!
//! # Responsibility
//! - Resolve process configuration and start logging.
//! - Map board routes onto core services with status-coded JSON responses.

pub mod api;
pub mod config;

pub use api::{
    ApiResponse, KanbanApi, NewColumn, NewComment, NewProject, NewTask, STATUS_BAD_REQUEST,
    STATUS_CONFLICT, STATUS_CREATED, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND, STATUS_OK,
};
pub use config::ApiConfig;

//! Request handlers for the board API.
//!
//! # Responsibility
//! - Expose one handler per board route, taking raw path/query strings and
//!   JSON bodies the way a router hands them over.
//! - Translate core errors into status codes with a JSON error body.
//!
//! # Invariants
//! - Handlers never panic; every outcome is an `ApiResponse`.
//! - Non-numeric ids and positions are rejected with 400 before any storage
//!   access. Numeric positions are passed through and clamped by the core.
//! - Each call opens its own connection; nothing is shared across calls.

use crate::config::ApiConfig;
use kanban_core::db::open_db;
use kanban_core::{
    init_logging, BoardService, BoardServiceError, ColumnId, CommentId, LoggingError, ProjectId,
    ReorderError, ReorderService, SqliteBoardRepository, TaskId,
};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Response envelope: status code plus JSON (or empty) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(body) => Self { status, body },
            Err(err) => Self::error(
                STATUS_INTERNAL_ERROR,
                format!("response encoding failed: {err}"),
            ),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "error": message.into() }).to_string();
        Self { status, body }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of `POST project`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST column`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewColumn {
    pub project_id: ProjectId,
    pub name: String,
}

/// Body of `POST task`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub column_id: ColumnId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST comment`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub task_id: TaskId,
    pub text: String,
}

/// Services bound to one request's connection.
struct Services<'conn> {
    board: BoardService<SqliteBoardRepository<'conn>>,
    reorder: ReorderService<SqliteBoardRepository<'conn>>,
}

enum ApiFailure {
    Board(BoardServiceError),
    Reorder(ReorderError),
    Unavailable(String),
}

impl From<BoardServiceError> for ApiFailure {
    fn from(value: BoardServiceError) -> Self {
        Self::Board(value)
    }
}

impl From<ReorderError> for ApiFailure {
    fn from(value: ReorderError) -> Self {
        Self::Reorder(value)
    }
}

impl ApiFailure {
    fn status(&self) -> u16 {
        match self {
            Self::Board(BoardServiceError::InvalidName(_)) => STATUS_BAD_REQUEST,
            Self::Board(BoardServiceError::DuplicateColumnName { .. }) => STATUS_CONFLICT,
            Self::Board(BoardServiceError::NotFound { .. }) => STATUS_NOT_FOUND,
            Self::Reorder(ReorderError::NotFound { .. }) => STATUS_NOT_FOUND,
            Self::Board(BoardServiceError::Repo(_))
            | Self::Reorder(ReorderError::Storage(_))
            | Self::Unavailable(_) => STATUS_INTERNAL_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Board(err) => err.to_string(),
            Self::Reorder(err) => err.to_string(),
            Self::Unavailable(message) => message.clone(),
        }
    }
}

/// Board API bound to one configuration.
pub struct KanbanApi {
    config: ApiConfig,
}

impl KanbanApi {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// Builds the API and starts file logging when `log_dir` is configured.
    pub fn start(config: ApiConfig) -> Result<Self, LoggingError> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(config.log_level, log_dir)?;
        }
        Ok(Self::new(config))
    }

    /// [`KanbanApi::start`] with config read from the environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::start(ApiConfig::from_env()?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Liveness probe. Does not touch storage.
    pub fn health(&self) -> ApiResponse {
        ApiResponse::json(
            STATUS_OK,
            &serde_json::json!({
                "status": kanban_core::ping(),
                "version": kanban_core::core_version(),
            }),
        )
    }

    /// `GET projects`
    pub fn get_projects(&self) -> ApiResponse {
        self.run("get_projects", STATUS_OK, |s| {
            s.board.list_projects().map_err(Into::into)
        })
    }

    /// `GET board/:project_id`
    pub fn get_board(&self, project_id: &str) -> ApiResponse {
        with_id(project_id, "project", |id| {
            self.run("get_board", STATUS_OK, |s| {
                s.board.load_board(id).map_err(Into::into)
            })
        })
    }

    /// `GET columns/:project_id`
    pub fn get_columns(&self, project_id: &str) -> ApiResponse {
        with_id(project_id, "project", |id| {
            self.run("get_columns", STATUS_OK, |s| {
                s.board.list_columns(id).map_err(Into::into)
            })
        })
    }

    /// `GET column/:column_id`
    pub fn get_column(&self, column_id: &str) -> ApiResponse {
        with_id(column_id, "column", |id| {
            self.run("get_column", STATUS_OK, |s| {
                s.board.get_column(id).map_err(Into::into)
            })
        })
    }

    /// `GET tasks/:column_id`
    pub fn get_tasks(&self, column_id: &str) -> ApiResponse {
        with_id(column_id, "column", |id| {
            self.run("get_tasks", STATUS_OK, |s| {
                s.board.list_tasks(id).map_err(Into::into)
            })
        })
    }

    /// `GET task/:task_id`
    pub fn get_task(&self, task_id: &str) -> ApiResponse {
        with_id(task_id, "task", |id| {
            self.run("get_task", STATUS_OK, |s| {
                s.board.get_task(id).map_err(Into::into)
            })
        })
    }

    /// `GET comments/:task_id`
    pub fn get_comments(&self, task_id: &str) -> ApiResponse {
        with_id(task_id, "task", |id| {
            self.run("get_comments", STATUS_OK, |s| {
                s.board.list_comments(id).map_err(Into::into)
            })
        })
    }

    /// `GET comment/:comment_id`
    pub fn get_comment(&self, comment_id: &str) -> ApiResponse {
        with_id(comment_id, "comment", |id| {
            self.run("get_comment", STATUS_OK, |s| {
                s.board.get_comment(id).map_err(Into::into)
            })
        })
    }

    /// `POST project`
    pub fn create_project(&self, body: &str) -> ApiResponse {
        with_body(body, |request: NewProject| {
            self.run("create_project", STATUS_CREATED, |s| {
                s.board
                    .create_project(request.name, request.description)
                    .map_err(Into::into)
            })
        })
    }

    /// `POST column`
    pub fn create_column(&self, body: &str) -> ApiResponse {
        with_body(body, |request: NewColumn| {
            self.run("create_column", STATUS_CREATED, |s| {
                s.board
                    .create_column(request.project_id, request.name)
                    .map_err(Into::into)
            })
        })
    }

    /// `POST task`
    pub fn create_task(&self, body: &str) -> ApiResponse {
        with_body(body, |request: NewTask| {
            self.run("create_task", STATUS_CREATED, |s| {
                s.board
                    .create_task(request.column_id, request.name, request.description)
                    .map_err(Into::into)
            })
        })
    }

    /// `POST comment`
    pub fn create_comment(&self, body: &str) -> ApiResponse {
        with_body(body, |request: NewComment| {
            self.run("create_comment", STATUS_CREATED, |s| {
                s.board
                    .create_comment(request.task_id, request.text)
                    .map_err(Into::into)
            })
        })
    }

    /// `DELETE project/:project_id`
    pub fn delete_project(&self, project_id: &str) -> ApiResponse {
        with_id(project_id, "project", |id| {
            self.run_empty("delete_project", |s| {
                s.board.delete_project(id).map_err(Into::into)
            })
        })
    }

    /// `DELETE column/:column_id`
    pub fn delete_column(&self, column_id: &str) -> ApiResponse {
        with_id(column_id, "column", |id| {
            self.run_empty("delete_column", |s| {
                s.board.delete_column(id).map_err(Into::into)
            })
        })
    }

    /// `DELETE task/:task_id`
    pub fn delete_task(&self, task_id: &str) -> ApiResponse {
        with_id(task_id, "task", |id| {
            self.run_empty("delete_task", |s| s.board.delete_task(id).map_err(Into::into))
        })
    }

    /// `DELETE comment/:comment_id`
    pub fn delete_comment(&self, comment_id: &str) -> ApiResponse {
        with_id(comment_id, "comment", |id: CommentId| {
            self.run_empty("delete_comment", |s| {
                s.board.delete_comment(id).map_err(Into::into)
            })
        })
    }

    /// `PUT column/:column_id/position?pos=N`
    ///
    /// Responds with the column as re-read after the move.
    pub fn move_column(&self, column_id: &str, position: &str) -> ApiResponse {
        with_id(column_id, "column", |id| {
            with_position(position, |position| {
                self.run("move_column", STATUS_OK, |s| {
                    s.reorder.move_column(id, position)?;
                    s.board.get_column(id).map_err(Into::into)
                })
            })
        })
    }

    /// `PUT task/:task_id/position?pos=N`
    ///
    /// Responds with the task as re-read after the move.
    pub fn move_task(&self, task_id: &str, position: &str) -> ApiResponse {
        with_id(task_id, "task", |id| {
            with_position(position, |position| {
                self.run("move_task", STATUS_OK, |s| {
                    s.reorder.move_task(id, position)?;
                    s.board.get_task(id).map_err(Into::into)
                })
            })
        })
    }

    /// Routes one request by method and path, e.g. `PUT task/4/position?pos=0`.
    ///
    /// Leading and trailing slashes are ignored. Unknown routes answer 404.
    pub fn handle(&self, method: &str, path: &str, body: &str) -> ApiResponse {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let method = method.to_ascii_uppercase();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["health"]) => self.health(),
            ("GET", ["projects"]) => self.get_projects(),
            ("GET", ["board", id]) => self.get_board(id),
            ("GET", ["columns", id]) => self.get_columns(id),
            ("GET", ["column", id]) => self.get_column(id),
            ("GET", ["tasks", id]) => self.get_tasks(id),
            ("GET", ["task", id]) => self.get_task(id),
            ("GET", ["comments", id]) => self.get_comments(id),
            ("GET", ["comment", id]) => self.get_comment(id),
            ("POST", ["project"]) => self.create_project(body),
            ("POST", ["column"]) => self.create_column(body),
            ("POST", ["task"]) => self.create_task(body),
            ("POST", ["comment"]) => self.create_comment(body),
            ("DELETE", ["project", id]) => self.delete_project(id),
            ("DELETE", ["column", id]) => self.delete_column(id),
            ("DELETE", ["task", id]) => self.delete_task(id),
            ("DELETE", ["comment", id]) => self.delete_comment(id),
            ("PUT", ["column", id, "position"]) => match query_param(query, "pos") {
                Some(position) => self.move_column(id, position),
                None => missing_position(),
            },
            ("PUT", ["task", id, "position"]) => match query_param(query, "pos") {
                Some(position) => self.move_task(id, position),
                None => missing_position(),
            },
            _ => ApiResponse::error(STATUS_NOT_FOUND, format!("no route for {method} {path}")),
        }
    }

    fn run<T: Serialize>(
        &self,
        operation: &'static str,
        status: u16,
        op: impl FnOnce(&Services<'_>) -> Result<T, ApiFailure>,
    ) -> ApiResponse {
        match self.with_services(op) {
            Ok(value) => ApiResponse::json(status, &value),
            Err(failure) => failure_response(operation, failure),
        }
    }

    fn run_empty(
        &self,
        operation: &'static str,
        op: impl FnOnce(&Services<'_>) -> Result<(), ApiFailure>,
    ) -> ApiResponse {
        match self.with_services(op) {
            Ok(()) => ApiResponse::empty(STATUS_OK),
            Err(failure) => failure_response(operation, failure),
        }
    }

    fn with_services<T>(
        &self,
        op: impl FnOnce(&Services<'_>) -> Result<T, ApiFailure>,
    ) -> Result<T, ApiFailure> {
        let conn = open_db(&self.config.db_path)
            .map_err(|err| ApiFailure::Unavailable(format!("board DB open failed: {err}")))?;
        let repo = SqliteBoardRepository::try_new(&conn)
            .map_err(|err| ApiFailure::Unavailable(format!("board repo init failed: {err}")))?;
        let services = Services {
            board: BoardService::new(repo),
            reorder: ReorderService::new(repo),
        };
        op(&services)
    }
}

fn failure_response(operation: &'static str, failure: ApiFailure) -> ApiResponse {
    let status = failure.status();
    let message = failure.message();
    if status >= STATUS_INTERNAL_ERROR {
        error!(
            "event=api_request module=api status=error operation={operation} http_status={status} error={message}"
        );
    } else {
        warn!(
            "event=api_request module=api status=rejected operation={operation} http_status={status} error={message}"
        );
    }
    ApiResponse::error(status, message)
}

fn query_param<'q>(query: &'q str, key: &str) -> Option<&'q str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

fn missing_position() -> ApiResponse {
    ApiResponse::error(STATUS_BAD_REQUEST, "missing `pos` query parameter")
}

fn with_id(raw: &str, label: &str, f: impl FnOnce(i64) -> ApiResponse) -> ApiResponse {
    match raw.trim().parse::<i64>() {
        Ok(id) => f(id),
        Err(_) => ApiResponse::error(
            STATUS_BAD_REQUEST,
            format!("{raw} is not a valid {label} ID, it must be a number"),
        ),
    }
}

/// Parses a requested position. Integers past the i64 range saturate, since
/// the core clamps them anyway.
fn with_position(raw: &str, f: impl FnOnce(i64) -> ApiResponse) -> ApiResponse {
    match parse_position(raw) {
        Some(position) => f(position),
        None => ApiResponse::error(
            STATUS_BAD_REQUEST,
            format!("{raw} is not a valid position, it must be a number"),
        ),
    }
}

fn parse_position(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(position) => Some(position),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn with_body<T: DeserializeOwned>(body: &str, f: impl FnOnce(T) -> ApiResponse) -> ApiResponse {
    match serde_json::from_str::<T>(body) {
        Ok(request) => f(request),
        Err(err) => ApiResponse::error(STATUS_BAD_REQUEST, format!("invalid request body: {err}")),
    }
}

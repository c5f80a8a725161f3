//! Board CRUD use-case service.
//!
//! # Responsibility
//! - Validate names and parent existence above the repository layer.
//! - Provide create/get/list/update/delete for projects, columns, tasks and
//!   comments, plus the full board projection.
//!
//! # Invariants
//! - Names are trimmed with whitespace runs collapsed; blank names are rejected.
//! - Column names are unique within one project.
//! - A new project always starts with one column.
//! - Nothing here writes a priority after creation; reordering belongs to
//!   `ReorderService`.

use crate::model::board::{
    Board, BoardColumn, BoardTask, Column, ColumnId, Comment, CommentId, EntityKind, Project,
    ProjectId, Task, TaskId,
};
use crate::repo::column_repo::ColumnRepository;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Name given to the column seeded into every new project.
pub const DEFAULT_COLUMN_NAME: &str = "Default";

/// All record repositories a board service needs.
pub trait BoardRepository:
    ProjectRepository + ColumnRepository + TaskRepository + CommentRepository
{
}

impl<T> BoardRepository for T where
    T: ProjectRepository + ColumnRepository + TaskRepository + CommentRepository
{
}

/// Errors from board service operations.
#[derive(Debug)]
pub enum BoardServiceError {
    /// Name or text is blank after normalization.
    InvalidName(EntityKind),
    /// Another column of the project already uses this name.
    DuplicateColumnName { project_id: ProjectId, name: String },
    /// Target record or its parent does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(EntityKind::Comment) => write!(f, "comment text must not be blank"),
            Self::InvalidName(kind) => write!(f, "{kind} name must not be blank"),
            Self::DuplicateColumnName { project_id, name } => write!(
                f,
                "column name `{name}` already exists in project {project_id}"
            ),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// Board CRUD service facade.
pub struct BoardService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> BoardService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a project seeded with one [`DEFAULT_COLUMN_NAME`] column.
    pub fn create_project(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> BoardServiceResult<Project> {
        let name = normalize_name(name.into(), EntityKind::Project)?;
        let description = description.into().trim().to_string();
        let (project, column) =
            self.repo
                .create_project_with_column(&name, &description, DEFAULT_COLUMN_NAME)?;
        debug!(
            "event=project_create module=board status=ok id={} column_id={}",
            project.id, column.id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> BoardServiceResult<Project> {
        self.repo
            .get_project(id)?
            .ok_or(BoardServiceError::NotFound {
                kind: EntityKind::Project,
                id,
            })
    }

    pub fn list_projects(&self) -> BoardServiceResult<Vec<Project>> {
        self.repo.list_projects().map_err(Into::into)
    }

    /// Replaces a project's name and description.
    pub fn update_project(
        &self,
        id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> BoardServiceResult<Project> {
        let name = normalize_name(name.into(), EntityKind::Project)?;
        let mut project = self.get_project(id)?;
        project.name = name;
        project.description = description.into().trim().to_string();
        self.repo.update_project(&project)?;
        Ok(project)
    }

    /// Deletes a project with everything it contains.
    pub fn delete_project(&self, id: ProjectId) -> BoardServiceResult<()> {
        self.repo.delete_project(id)?;
        debug!("event=project_delete module=board status=ok id={id}");
        Ok(())
    }

    /// Appends a column to the end of a project.
    pub fn create_column(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
    ) -> BoardServiceResult<Column> {
        let name = normalize_name(name.into(), EntityKind::Column)?;
        self.get_project(project_id)?;
        self.ensure_column_name_free(project_id, &name, None)?;
        let column = self
            .repo
            .create_column(project_id, &name)
            .map_err(|err| column_name_conflict(err, project_id))?;
        debug!(
            "event=column_create module=board status=ok id={} project_id={project_id}",
            column.id
        );
        Ok(column)
    }

    pub fn get_column(&self, id: ColumnId) -> BoardServiceResult<Column> {
        self.repo.get_column(id)?.ok_or(BoardServiceError::NotFound {
            kind: EntityKind::Column,
            id,
        })
    }

    /// Lists a project's columns in display order.
    pub fn list_columns(&self, project_id: ProjectId) -> BoardServiceResult<Vec<Column>> {
        self.get_project(project_id)?;
        self.repo.list_columns(project_id).map_err(Into::into)
    }

    pub fn rename_column(
        &self,
        id: ColumnId,
        name: impl Into<String>,
    ) -> BoardServiceResult<Column> {
        let name = normalize_name(name.into(), EntityKind::Column)?;
        let mut column = self.get_column(id)?;
        self.ensure_column_name_free(column.project_id, &name, Some(id))?;
        self.repo
            .rename_column(id, &name)
            .map_err(|err| column_name_conflict(err, column.project_id))?;
        column.name = name;
        Ok(column)
    }

    /// Deletes a column and its tasks; sibling columns are not renumbered.
    pub fn delete_column(&self, id: ColumnId) -> BoardServiceResult<()> {
        self.repo.delete_column(id)?;
        debug!("event=column_delete module=board status=ok id={id}");
        Ok(())
    }

    /// Appends a task to the end of a column.
    pub fn create_task(
        &self,
        column_id: ColumnId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> BoardServiceResult<Task> {
        let name = normalize_name(name.into(), EntityKind::Task)?;
        self.get_column(column_id)?;
        let task = self
            .repo
            .create_task(column_id, &name, description.into().trim())?;
        debug!(
            "event=task_create module=board status=ok id={} column_id={column_id}",
            task.id
        );
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> BoardServiceResult<Task> {
        self.repo.get_task(id)?.ok_or(BoardServiceError::NotFound {
            kind: EntityKind::Task,
            id,
        })
    }

    /// Lists a column's tasks in display order.
    pub fn list_tasks(&self, column_id: ColumnId) -> BoardServiceResult<Vec<Task>> {
        self.get_column(column_id)?;
        self.repo.list_tasks(column_id).map_err(Into::into)
    }

    /// Replaces a task's name and description. Its position is kept.
    pub fn update_task(
        &self,
        id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> BoardServiceResult<Task> {
        let name = normalize_name(name.into(), EntityKind::Task)?;
        let description = description.into().trim().to_string();
        self.repo.update_task(id, &name, &description)?;
        self.get_task(id)
    }

    pub fn delete_task(&self, id: TaskId) -> BoardServiceResult<()> {
        self.repo.delete_task(id)?;
        debug!("event=task_delete module=board status=ok id={id}");
        Ok(())
    }

    /// Adds a comment to a task. Text keeps its line breaks but must not be blank.
    pub fn create_comment(
        &self,
        task_id: TaskId,
        text: impl Into<String>,
    ) -> BoardServiceResult<Comment> {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return Err(BoardServiceError::InvalidName(EntityKind::Comment));
        }
        self.get_task(task_id)?;
        self.repo.create_comment(task_id, text).map_err(Into::into)
    }

    pub fn get_comment(&self, id: CommentId) -> BoardServiceResult<Comment> {
        self.repo.get_comment(id)?.ok_or(BoardServiceError::NotFound {
            kind: EntityKind::Comment,
            id,
        })
    }

    /// Lists a task's comments, newest first.
    pub fn list_comments(&self, task_id: TaskId) -> BoardServiceResult<Vec<Comment>> {
        self.get_task(task_id)?;
        self.repo.list_comments(task_id).map_err(Into::into)
    }

    pub fn delete_comment(&self, id: CommentId) -> BoardServiceResult<()> {
        self.repo.delete_comment(id).map_err(Into::into)
    }

    /// Loads one project with columns, tasks and comments in display order.
    pub fn load_board(&self, project_id: ProjectId) -> BoardServiceResult<Board> {
        let project = self.get_project(project_id)?;
        let mut columns = Vec::new();
        for column in self.repo.list_columns(project_id)? {
            let mut tasks = Vec::new();
            for task in self.repo.list_tasks(column.id)? {
                let comments = self.repo.list_comments(task.id)?;
                tasks.push(BoardTask { task, comments });
            }
            columns.push(BoardColumn { column, tasks });
        }
        Ok(Board { project, columns })
    }

    fn ensure_column_name_free(
        &self,
        project_id: ProjectId,
        name: &str,
        excluding: Option<ColumnId>,
    ) -> BoardServiceResult<()> {
        if self.repo.column_name_taken(project_id, name, excluding)? {
            return Err(BoardServiceError::DuplicateColumnName {
                project_id,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Maps a unique-index rejection to the same error as the pre-check, for
/// writes that lost a race against a concurrent create or rename.
fn column_name_conflict(err: RepoError, project_id: ProjectId) -> BoardServiceError {
    match err {
        RepoError::DuplicateName { name, .. } => {
            BoardServiceError::DuplicateColumnName { project_id, name }
        }
        other => other.into(),
    }
}

fn normalize_name(value: String, kind: EntityKind) -> BoardServiceResult<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        return Err(BoardServiceError::InvalidName(kind));
    }
    Ok(collapsed.into_owned())
}

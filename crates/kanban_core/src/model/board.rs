//! Board records and read projections.
//!
//! # Invariants
//! - Columns are siblings within one project; tasks are siblings within one
//!   column. Sorting siblings by `priority ASC` gives display order.
//! - Records never hold back-references to their containers; the container is
//!   identified by id only.

use crate::ordering::OrderedEntity;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type ProjectId = i64;
pub type ColumnId = i64;
pub type TaskId = i64;
pub type CommentId = i64;

/// Record category, used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Column,
    Task,
    Comment,
}

impl EntityKind {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Column => "column",
            Self::Task => "task",
            Self::Comment => "comment",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level board container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Ordered column inside one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub project_id: ProjectId,
    pub name: String,
    /// Ordering key within `project_id`.
    #[serde(skip)]
    pub priority: f64,
}

/// Ordered task inside one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub name: String,
    pub description: String,
    /// Ordering key within `column_id`.
    #[serde(skip)]
    pub priority: f64,
}

/// Free-text note attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub text: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl OrderedEntity for Column {
    type ContainerId = ProjectId;

    const KIND: EntityKind = EntityKind::Column;

    fn id(&self) -> i64 {
        self.id
    }

    fn container_id(&self) -> ProjectId {
        self.project_id
    }

    fn priority(&self) -> f64 {
        self.priority
    }
}

impl OrderedEntity for Task {
    type ContainerId = ColumnId;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> i64 {
        self.id
    }

    fn container_id(&self) -> ColumnId {
        self.column_id
    }

    fn priority(&self) -> f64 {
        self.priority
    }
}

/// Full board read model: one project with its columns in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    #[serde(flatten)]
    pub project: Project,
    pub columns: Vec<BoardColumn>,
}

/// Column projection inside a [`Board`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardColumn {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<BoardTask>,
}

/// Task projection inside a [`BoardColumn`]; comments are newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardTask {
    #[serde(flatten)]
    pub task: Task,
    pub comments: Vec<Comment>,
}

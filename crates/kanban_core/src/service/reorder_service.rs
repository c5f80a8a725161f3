//! Sibling reorder use-case service.
//!
//! # Responsibility
//! - Move one column within its project, or one task within its column, to a
//!   requested index.
//! - Compose sibling listing, position clamping and priority interpolation,
//!   then persist the mover's new priority.
//!
//! # Invariants
//! - A move writes at most one row: the mover's priority. Siblings are never
//!   rewritten and no rank is stored.
//! - Out-of-range or negative positions are clamped, never rejected.
//! - Groups with fewer than two members are left untouched.
//! - Storage failures surface unchanged and are not retried.

use crate::model::board::{Column, ColumnId, EntityKind, Task, TaskId};
use crate::ordering::{clamp_position, interpolate_priority, OrderedEntity, Placement};
use crate::repo::{RepoError, SiblingStore};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from reorder operations.
#[derive(Debug)]
pub enum ReorderError {
    /// Moved entity does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Sibling read or priority write failed.
    Storage(RepoError),
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReorderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for ReorderError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Storage(other),
        }
    }
}

/// What one move did, for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MoveOutcome {
    SingleSibling,
    AlreadyInPlace { position: usize },
    Moved { position: usize, priority: f64 },
}

/// Reorder service facade over a sibling store.
pub struct ReorderService<S> {
    store: S,
}

impl<S> ReorderService<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Moves one column to `requested_position` within its project.
    pub fn move_column(&self, id: ColumnId, requested_position: i64) -> Result<(), ReorderError>
    where
        S: SiblingStore<Column>,
    {
        self.move_entity::<Column>(id, requested_position)
    }

    /// Moves one task to `requested_position` within its column.
    pub fn move_task(&self, id: TaskId, requested_position: i64) -> Result<(), ReorderError>
    where
        S: SiblingStore<Task>,
    {
        self.move_entity::<Task>(id, requested_position)
    }

    /// Moves entity `id` to `requested_position` among its siblings.
    ///
    /// # Side effects
    /// - At most one `update_priority` call.
    /// - Emits `entity_move` logging events with outcome and duration.
    pub fn move_entity<E>(&self, id: i64, requested_position: i64) -> Result<(), ReorderError>
    where
        E: OrderedEntity,
        S: SiblingStore<E>,
    {
        let started_at = Instant::now();
        let kind = E::KIND;

        let result = self
            .store
            .with_sibling_lock(|| self.move_locked::<E>(id, requested_position));

        match &result {
            Ok(MoveOutcome::Moved { position, priority }) => info!(
                "event=entity_move module=reorder status=ok kind={kind} id={id} requested_position={requested_position} position={position} priority={priority} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Ok(MoveOutcome::AlreadyInPlace { position }) => info!(
                "event=entity_move module=reorder status=noop reason=in_place kind={kind} id={id} requested_position={requested_position} position={position} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Ok(MoveOutcome::SingleSibling) => info!(
                "event=entity_move module=reorder status=noop reason=single_sibling kind={kind} id={id} requested_position={requested_position} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=entity_move module=reorder status=error kind={kind} id={id} requested_position={requested_position} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }

        result.map(|_| ())
    }

    fn move_locked<E>(&self, id: i64, requested_position: i64) -> Result<MoveOutcome, ReorderError>
    where
        E: OrderedEntity,
        S: SiblingStore<E>,
    {
        let entity = self
            .store
            .load_entity(id)?
            .ok_or(ReorderError::NotFound { kind: E::KIND, id })?;

        let siblings = self.store.list_siblings(entity.container_id())?;
        if siblings.len() < 2 {
            return Ok(MoveOutcome::SingleSibling);
        }

        let position = clamp_position(requested_position, siblings.len());
        let priorities: Vec<f64> = siblings.iter().map(|sibling| sibling.priority()).collect();

        match interpolate_priority(&priorities, position, entity.priority()) {
            Placement::Unchanged => Ok(MoveOutcome::AlreadyInPlace { position }),
            Placement::Reassigned(priority) => {
                self.store.update_priority(id, priority)?;
                Ok(MoveOutcome::Moved { position, priority })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReorderError, ReorderService};
    use crate::db::DbError;
    use crate::model::board::{EntityKind, Task};
    use crate::repo::{RepoError, RepoResult, SiblingStore};
    use std::cell::{Cell, RefCell};

    /// In-memory task store with one column and optional write failure.
    struct FakeTaskStore {
        tasks: RefCell<Vec<Task>>,
        writes: Cell<usize>,
        fail_writes: bool,
    }

    impl FakeTaskStore {
        fn with_priorities(priorities: &[f64]) -> Self {
            let tasks = priorities
                .iter()
                .enumerate()
                .map(|(index, priority)| Task {
                    id: index as i64 + 1,
                    column_id: 7,
                    name: format!("task {}", index + 1),
                    description: String::new(),
                    priority: *priority,
                })
                .collect();
            Self {
                tasks: RefCell::new(tasks),
                writes: Cell::new(0),
                fail_writes: false,
            }
        }

        fn priority_of(&self, id: i64) -> f64 {
            self.tasks
                .borrow()
                .iter()
                .find(|task| task.id == id)
                .map(|task| task.priority)
                .unwrap()
        }
    }

    impl SiblingStore<Task> for &FakeTaskStore {
        fn load_entity(&self, id: i64) -> RepoResult<Option<Task>> {
            Ok(self.tasks.borrow().iter().find(|task| task.id == id).cloned())
        }

        fn list_siblings(&self, column_id: i64) -> RepoResult<Vec<Task>> {
            let mut siblings: Vec<Task> = self
                .tasks
                .borrow()
                .iter()
                .filter(|task| task.column_id == column_id)
                .cloned()
                .collect();
            siblings.sort_by(|a, b| a.priority.total_cmp(&b.priority));
            Ok(siblings)
        }

        fn update_priority(&self, id: i64, priority: f64) -> RepoResult<()> {
            if self.fail_writes {
                return Err(RepoError::Db(DbError::Sqlite(
                    rusqlite::Error::QueryReturnedNoRows,
                )));
            }
            self.writes.set(self.writes.get() + 1);
            let mut tasks = self.tasks.borrow_mut();
            let task = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(RepoError::NotFound {
                    kind: EntityKind::Task,
                    id,
                })?;
            task.priority = priority;
            Ok(())
        }
    }

    #[test]
    fn interior_move_writes_only_the_mover() {
        let store = FakeTaskStore::with_priorities(&[1.0, 3.0, 7.0]);
        let service = ReorderService::new(&store);

        service.move_task(3, 1).unwrap();

        assert_eq!(store.writes.get(), 1);
        assert_eq!(store.priority_of(3), 2.0);
        assert_eq!(store.priority_of(1), 1.0);
        assert_eq!(store.priority_of(2), 3.0);
    }

    #[test]
    fn single_sibling_move_is_a_silent_noop() {
        let store = FakeTaskStore::with_priorities(&[4.0]);
        let service = ReorderService::new(&store);

        service.move_task(1, 10).unwrap();

        assert_eq!(store.writes.get(), 0);
        assert_eq!(store.priority_of(1), 4.0);
    }

    #[test]
    fn move_onto_own_slot_skips_the_write() {
        let store = FakeTaskStore::with_priorities(&[1.0, 3.0, 7.0]);
        let service = ReorderService::new(&store);

        service.move_task(2, 1).unwrap();

        assert_eq!(store.writes.get(), 0);
        assert_eq!(store.priority_of(2), 3.0);
    }

    #[test]
    fn missing_entity_is_not_found() {
        let store = FakeTaskStore::with_priorities(&[1.0, 2.0]);
        let service = ReorderService::new(&store);

        let err = service.move_task(99, 0).unwrap_err();
        assert!(matches!(
            err,
            ReorderError::NotFound {
                kind: EntityKind::Task,
                id: 99
            }
        ));
    }

    #[test]
    fn write_failure_surfaces_and_leaves_priorities_untouched() {
        let mut store = FakeTaskStore::with_priorities(&[1.0, 3.0, 7.0]);
        store.fail_writes = true;
        let service = ReorderService::new(&store);

        let err = service.move_task(1, 2).unwrap_err();
        assert!(matches!(err, ReorderError::Storage(RepoError::Db(_))));
        assert_eq!(store.priority_of(1), 1.0);
    }
}

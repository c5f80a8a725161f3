use kanban_core::db::{open_db, open_db_in_memory};
use kanban_core::{
    BoardService, Column, ColumnId, EntityKind, ProjectId, ReorderError, ReorderService,
    SqliteBoardRepository, Task, TaskId,
};
use rusqlite::Connection;
use std::thread;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

/// Creates a project whose only column holds `count` tasks, returned in display order.
fn column_with_tasks(conn: &Connection, count: usize) -> (ColumnId, Vec<TaskId>) {
    let service = BoardService::new(SqliteBoardRepository::try_new(conn).unwrap());
    let project = service.create_project("board", "").unwrap();
    let column = service.list_columns(project.id).unwrap().remove(0);
    let ids = (0..count)
        .map(|index| {
            service
                .create_task(column.id, format!("task {index}"), "")
                .unwrap()
                .id
        })
        .collect();
    (column.id, ids)
}

fn task_order(conn: &Connection, column_id: ColumnId) -> Vec<TaskId> {
    tasks(conn, column_id).into_iter().map(|task| task.id).collect()
}

fn tasks(conn: &Connection, column_id: ColumnId) -> Vec<Task> {
    let service = BoardService::new(SqliteBoardRepository::try_new(conn).unwrap());
    service.list_tasks(column_id).unwrap()
}

fn set_priority(conn: &Connection, table: &str, id: i64, priority: f64) {
    conn.execute(
        &format!("UPDATE {table} SET priority = ?2 WHERE id = ?1;"),
        rusqlite::params![id, priority],
    )
    .unwrap();
}

fn priority_of(conn: &Connection, table: &str, id: i64) -> f64 {
    conn.query_row(
        &format!("SELECT priority FROM {table} WHERE id = ?1;"),
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn moved_task_lands_on_every_requested_index() {
    for size in 2..6 {
        for mover in 0..size {
            for target in 0..size {
                let conn = setup();
                let (column_id, ids) = column_with_tasks(&conn, size);
                let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

                reorder.move_task(ids[mover], target as i64).unwrap();

                let order = task_order(&conn, column_id);
                assert_eq!(
                    order.iter().position(|id| *id == ids[mover]),
                    Some(target),
                    "size={size} mover={mover} target={target}"
                );
            }
        }
    }
}

#[test]
fn out_of_range_positions_are_clamped() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 4);
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[1], 100).unwrap();
    assert_eq!(task_order(&conn, column_id).last(), Some(&ids[1]));

    reorder.move_task(ids[1], -5).unwrap();
    assert_eq!(task_order(&conn, column_id).first(), Some(&ids[1]));
}

#[test]
fn boundary_moves_step_past_the_edge_priority() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 3);
    for (id, priority) in ids.iter().zip([2.0, 5.0, 9.0]) {
        set_priority(&conn, "tasks", *id, priority);
    }
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[0], 2).unwrap();
    let last = priority_of(&conn, "tasks", ids[0]);
    assert!(last > 9.0);
    assert_eq!(last, 9.5);
    assert_eq!(task_order(&conn, column_id), vec![ids[1], ids[2], ids[0]]);

    set_priority(&conn, "tasks", ids[0], 2.0);
    reorder.move_task(ids[2], 0).unwrap();
    let first = priority_of(&conn, "tasks", ids[2]);
    assert!(first < 2.0);
    assert_eq!(first, 1.5);
    assert_eq!(task_order(&conn, column_id), vec![ids[2], ids[0], ids[1]]);
}

#[test]
fn edge_moves_rewrite_priority_even_when_already_in_place() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 3);
    for (id, priority) in ids.iter().zip([2.0, 5.0, 9.0]) {
        set_priority(&conn, "tasks", *id, priority);
    }
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[0], 0).unwrap();
    assert_eq!(priority_of(&conn, "tasks", ids[0]), 1.5);
    assert_eq!(task_order(&conn, column_id), ids);

    reorder.move_task(ids[2], 2).unwrap();
    assert_eq!(priority_of(&conn, "tasks", ids[2]), 9.5);
    assert_eq!(task_order(&conn, column_id), ids);
    assert_eq!(priority_of(&conn, "tasks", ids[1]), 5.0);
}

#[test]
fn interior_move_interpolates_between_neighbors() {
    let conn = setup();
    let (_, ids) = column_with_tasks(&conn, 3);
    for (id, priority) in ids.iter().zip([1.0, 3.0, 7.0]) {
        set_priority(&conn, "tasks", *id, priority);
    }
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[2], 1).unwrap();

    assert_eq!(priority_of(&conn, "tasks", ids[2]), 2.0);
    assert_eq!(priority_of(&conn, "tasks", ids[0]), 1.0);
    assert_eq!(priority_of(&conn, "tasks", ids[1]), 3.0);
}

#[test]
fn moving_to_current_interior_slot_leaves_priority_unchanged() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 3);
    let before = tasks(&conn, column_id);
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[1], 1).unwrap();
    reorder.move_task(ids[1], 1).unwrap();

    assert_eq!(tasks(&conn, column_id), before);
}

#[test]
fn single_task_column_move_is_a_noop() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 1);
    let before = priority_of(&conn, "tasks", ids[0]);
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    reorder.move_task(ids[0], 7).unwrap();

    assert_eq!(priority_of(&conn, "tasks", ids[0]), before);
    assert_eq!(task_order(&conn, column_id), ids);
}

#[test]
fn repeated_insertion_into_one_gap_yields_distinct_ordered_priorities() {
    let conn = setup();
    let (column_id, ids) = column_with_tasks(&conn, 6);
    for (id, priority) in ids.iter().zip([1.0, 2.0, 5.0, 10.0, 11.0, 12.0]) {
        set_priority(&conn, "tasks", *id, priority);
    }
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    for id in &ids[3..] {
        reorder.move_task(*id, 1).unwrap();
    }

    let inserted: Vec<f64> = ids[3..]
        .iter()
        .map(|id| priority_of(&conn, "tasks", *id))
        .collect();
    for value in &inserted {
        assert!(*value > 1.0 && *value < 2.0, "{value} escaped (1, 2)");
    }
    assert!(inserted[2] < inserted[1] && inserted[1] < inserted[0]);
    assert_eq!(
        task_order(&conn, column_id),
        vec![ids[0], ids[5], ids[4], ids[3], ids[1], ids[2]]
    );
}

#[test]
fn moving_a_missing_task_is_not_found() {
    let conn = setup();
    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    let err = reorder.move_task(42, 0).unwrap_err();
    assert!(matches!(
        err,
        ReorderError::NotFound {
            kind: EntityKind::Task,
            id: 42
        }
    ));
}

#[test]
fn columns_reorder_within_their_project_only() {
    let conn = setup();
    let service = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let project = service.create_project("p", "").unwrap();
    let other = service.create_project("q", "").unwrap();
    let todo = service.create_column(project.id, "To do").unwrap();
    let done = service.create_column(project.id, "Done").unwrap();
    let other_columns = service.list_columns(other.id).unwrap();

    let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    reorder.move_column(done.id, 0).unwrap();

    let order: Vec<ColumnId> = column_order(&service, project.id);
    assert_eq!(order[0], done.id);
    assert_eq!(order[2], todo.id);
    assert_eq!(service.list_columns(other.id).unwrap(), other_columns);

    let err = reorder.move_column(9_999, 1).unwrap_err();
    assert!(matches!(
        err,
        ReorderError::NotFound {
            kind: EntityKind::Column,
            ..
        }
    ));
}

fn column_order(
    service: &BoardService<SqliteBoardRepository<'_>>,
    project_id: ProjectId,
) -> Vec<ColumnId> {
    service
        .list_columns(project_id)
        .unwrap()
        .into_iter()
        .map(|column: Column| column.id)
        .collect()
}

#[test]
fn concurrent_moves_into_one_gap_stay_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let conn = open_db(&path).unwrap();
    let (column_id, ids) = column_with_tasks(&conn, 6);
    drop(conn);

    let movers = ids[2..].to_vec();
    let handles: Vec<_> = movers
        .into_iter()
        .map(|id| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let reorder = ReorderService::new(SqliteBoardRepository::try_new(&conn).unwrap());
                for _ in 0..5 {
                    reorder.move_task(id, 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let priorities: Vec<f64> = tasks(&conn, column_id)
        .into_iter()
        .map(|task| task.priority)
        .collect();
    assert_eq!(priorities.len(), 6);
    for pair in priorities.windows(2) {
        assert!(pair[0] < pair[1], "priorities collided: {priorities:?}");
    }
    assert_eq!(task_order(&conn, column_id)[0], ids[0]);
}

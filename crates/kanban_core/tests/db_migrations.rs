use kanban_core::db::migrations::latest_version;
use kanban_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "projects");
    assert_table_exists(&conn, "columns");
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "comments");
}

#[test]
fn priority_columns_are_real() {
    let conn = open_db_in_memory().unwrap();

    for table in ["columns", "tasks"] {
        let declared: String = conn
            .query_row(
                &format!("SELECT type FROM pragma_table_info('{table}') WHERE name = 'priority';"),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(declared, "REAL", "{table}.priority");
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kanban.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO projects (name) VALUES ('kept');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_project_cascades_to_its_contents() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO projects (id, name) VALUES (1, 'p');
         INSERT INTO columns (id, project_id, name, priority) VALUES (1, 1, 'c', 1.0);
         INSERT INTO tasks (id, column_id, name, priority) VALUES (1, 1, 't', 1.0);
         INSERT INTO comments (task_id, text) VALUES (1, 'hi');
         DELETE FROM projects WHERE id = 1;",
    )
    .unwrap();

    for table in ["columns", "tasks", "comments"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "{table} should be empty");
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

#[test]
fn column_names_are_unique_per_project_in_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO projects (id, name) VALUES (1, 'p');
         INSERT INTO columns (project_id, name, priority) VALUES (1, 'Doing', 1.0);",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO columns (project_id, name, priority) VALUES (1, 'Doing', 2.0);",
        [],
    );
    assert!(duplicate.is_err());
}

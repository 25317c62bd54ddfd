//! Adapter tests against a file-backed database.

use oxide_record_core::schema::{ColumnOptions, ColumnType, TableDefinition, TableSchema};
use oxide_record_core::{Adapter, AdapterError, SqlValue, Statement};
use oxide_record_sqlite::{SqliteAdapter, SqliteDialect};

fn notes_table() -> TableSchema {
    let mut table = TableSchema::new("notes");
    table
        .add_column(
            "id",
            ColumnType::Integer,
            None,
            ColumnOptions {
                auto_increment: true,
                ..ColumnOptions::default()
            },
        )
        .unwrap();
    table
        .add_column(
            "body",
            ColumnType::Text,
            None,
            ColumnOptions {
                unique: true,
                ..ColumnOptions::default()
            },
        )
        .unwrap();
    table.set_primary_key("id");
    table
}

fn connect(path: &std::path::Path) -> SqliteAdapter {
    SqliteAdapter::connect(&format!("sqlite://{}?mode=rwc", path.display())).unwrap()
}

fn insert(body: &str) -> Statement {
    Statement::prepare("INSERT INTO notes (body) VALUES (:body)").bind("body", body)
}

#[test]
fn test_rows_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    {
        let mut adapter = connect(&path);
        adapter
            .execute_script(&SqliteDialect::new().create_table(&notes_table()))
            .unwrap();
        adapter.execute(&insert("first")).unwrap();
        let result = adapter.execute(&insert("second")).unwrap();
        assert_eq!(result.last_insert_id, Some(SqlValue::Int(2)));
        assert_eq!(adapter.last_insert_id(), Some(SqlValue::Int(2)));
    }

    let mut adapter = connect(&path);
    let rows = adapter
        .query(&Statement::prepare("SELECT body FROM notes ORDER BY id"))
        .unwrap();
    let bodies: Vec<&SqlValue> = rows.iter().map(|row| &row["body"]).collect();
    assert_eq!(
        bodies,
        [&SqlValue::Text("first".into()), &SqlValue::Text("second".into())]
    );
    assert_eq!(adapter.table_columns("notes").unwrap(), ["id", "body"]);
    assert!(adapter.table_columns("missing").unwrap().is_empty());
}

#[test]
fn test_rolled_back_insert_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = connect(&dir.path().join("notes.db"));
    adapter
        .execute_script(&SqliteDialect::new().create_table(&notes_table()))
        .unwrap();

    adapter.begin_transaction().unwrap();
    adapter.execute(&insert("draft")).unwrap();
    adapter.roll_back().unwrap();

    let rows = adapter
        .query(&Statement::prepare("SELECT COUNT(*) AS n FROM notes"))
        .unwrap();
    assert_eq!(rows[0]["n"], SqlValue::Int(0));
}

#[test]
fn test_constraint_violation_is_backend_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = connect(&dir.path().join("notes.db"));
    adapter
        .execute_script(&SqliteDialect::new().create_table(&notes_table()))
        .unwrap();

    adapter.execute(&insert("same")).unwrap();
    assert!(matches!(
        adapter.execute(&insert("same")),
        Err(AdapterError::Backend(_))
    ));
}

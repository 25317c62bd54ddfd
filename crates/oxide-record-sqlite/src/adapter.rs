//! Blocking SQLite adapter built on sqlx.
//!
//! The adapter owns a single-threaded tokio runtime and one
//! [`SqliteConnection`]; every call blocks on the runtime until sqlx answers.

use oxide_record_core::{Adapter, AdapterError, Dialect, ExecResult, Row, SqlValue, Statement};
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row as _, Sqlite, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::dialect::SqliteDialect;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// An [`Adapter`] for SQLite.
pub struct SqliteAdapter {
    connection: SqliteConnection,
    runtime: Runtime,
    dialect: SqliteDialect,
    in_transaction: bool,
    last_insert_id: Option<SqlValue>,
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("in_transaction", &self.in_transaction)
            .field("last_insert_id", &self.last_insert_id)
            .finish_non_exhaustive()
    }
}

impl SqliteAdapter {
    /// Connects to `url`, e.g. `sqlite::memory:` or
    /// `sqlite://app.db?mode=rwc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the connection fails.
    pub fn connect(url: &str) -> Result<Self, AdapterError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let connection = runtime
            .block_on(SqliteConnection::connect(url))
            .map_err(AdapterError::backend)?;
        info!(url = %url, "connected to sqlite");
        Ok(Self {
            connection,
            runtime,
            dialect: SqliteDialect,
            in_transaction: false,
            last_insert_id: None,
        })
    }

    /// Connects to a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the connection fails.
    pub fn in_memory() -> Result<Self, AdapterError> {
        Self::connect("sqlite::memory:")
    }

    /// Runs one or more statements without parameters, e.g. a schema script.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite rejects the script.
    pub fn execute_script(&mut self, sql: &str) -> Result<(), AdapterError> {
        debug!(sql = %sql, "executing script");
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.connection))
            .map_err(AdapterError::backend)?;
        Ok(())
    }

    fn run_control(&mut self, sql: &'static str) -> Result<(), AdapterError> {
        debug!(sql = %sql, "transaction control");
        self.runtime
            .block_on(sqlx::query(sql).execute(&mut self.connection))
            .map_err(AdapterError::backend)?;
        Ok(())
    }
}

impl Adapter for SqliteAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, AdapterError> {
        let (sql, values) = statement.to_positional()?;
        debug!(sql = %sql, params = values.len(), "sqlite query");

        let query = values.into_iter().fold(sqlx::query(&sql), bind_param);
        let rows = self
            .runtime
            .block_on(query.fetch_all(&mut self.connection))
            .map_err(AdapterError::backend)?;
        rows.iter().map(decode_row).collect()
    }

    fn execute(&mut self, statement: &Statement) -> Result<ExecResult, AdapterError> {
        let (sql, values) = statement.to_positional()?;
        debug!(sql = %sql, params = values.len(), "sqlite execute");

        let query = values.into_iter().fold(sqlx::query(&sql), bind_param);
        let result = self
            .runtime
            .block_on(query.execute(&mut self.connection))
            .map_err(AdapterError::backend)?;

        let last_insert_id = sql
            .trim_start()
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
            .then(|| SqlValue::Int(result.last_insert_rowid()));
        if last_insert_id.is_some() {
            self.last_insert_id.clone_from(&last_insert_id);
        }

        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id,
        })
    }

    fn begin_transaction(&mut self) -> Result<(), AdapterError> {
        if self.in_transaction {
            return Err(AdapterError::Transaction(String::from(
                "a transaction is already open",
            )));
        }
        self.run_control("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), AdapterError> {
        if !self.in_transaction {
            return Err(AdapterError::Transaction(String::from(
                "commit without an open transaction",
            )));
        }
        self.run_control("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn roll_back(&mut self) -> Result<(), AdapterError> {
        if !self.in_transaction {
            return Err(AdapterError::Transaction(String::from(
                "rollback without an open transaction",
            )));
        }
        self.in_transaction = false;
        self.run_control("ROLLBACK")
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn last_insert_id(&self) -> Option<SqlValue> {
        self.last_insert_id.clone()
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, AdapterError> {
        let query = sqlx::query("SELECT name FROM pragma_table_info(?)").bind(table);
        let rows = self
            .runtime
            .block_on(query.fetch_all(&mut self.connection))
            .map_err(AdapterError::backend)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(AdapterError::backend))
            .collect()
    }
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Converts a result row using each value's storage class. Integers in a
/// column declared `BOOLEAN` become booleans.
fn decode_row(row: &SqliteRow) -> Result<Row, AdapterError> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).map_err(AdapterError::backend)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            let declared = column.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" if declared == "BOOLEAN" => SqlValue::Bool(
                    row.try_get_unchecked::<bool, _>(index)
                        .map_err(AdapterError::backend)?,
                ),
                "INTEGER" | "INT8" | "INT4" => SqlValue::Int(
                    row.try_get_unchecked::<i64, _>(index)
                        .map_err(AdapterError::backend)?,
                ),
                "REAL" | "FLOAT" | "DOUBLE" => SqlValue::Float(
                    row.try_get_unchecked::<f64, _>(index)
                        .map_err(AdapterError::backend)?,
                ),
                "BLOB" => SqlValue::Blob(
                    row.try_get_unchecked::<Vec<u8>, _>(index)
                        .map_err(AdapterError::backend)?,
                ),
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index).map_err(|e| {
                    AdapterError::Decode(format!("column {}: {e}", column.name()))
                })?),
            }
        };
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_storage_classes() {
        let mut adapter = SqliteAdapter::in_memory().unwrap();
        adapter
            .execute_script(
                "CREATE TABLE t (i INTEGER, f REAL, s TEXT, b BLOB, flag BOOLEAN, n TEXT)",
            )
            .unwrap();
        let insert = Statement::prepare("INSERT INTO t VALUES (:i, :f, :s, :b, :flag, :n)")
            .bind("i", 7)
            .bind("f", 1.5)
            .bind("s", "x")
            .bind("b", vec![1_u8, 2])
            .bind("flag", true)
            .bind("n", Option::<i64>::None);
        let result = adapter.execute(&insert).unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(SqlValue::Int(1)));

        let rows = adapter.query(&Statement::prepare("SELECT * FROM t")).unwrap();
        let row = &rows[0];
        assert_eq!(row["i"], SqlValue::Int(7));
        assert_eq!(row["f"], SqlValue::Float(1.5));
        assert_eq!(row["s"], SqlValue::Text("x".into()));
        assert_eq!(row["b"], SqlValue::Blob(vec![1, 2]));
        assert_eq!(row["flag"], SqlValue::Bool(true));
        assert_eq!(row["n"], SqlValue::Null);
    }

    #[test]
    fn test_transaction_state() {
        let mut adapter = SqliteAdapter::in_memory().unwrap();
        assert!(!adapter.in_transaction());
        assert!(matches!(adapter.commit(), Err(AdapterError::Transaction(_))));

        adapter.begin_transaction().unwrap();
        assert!(adapter.in_transaction());
        assert!(matches!(
            adapter.begin_transaction(),
            Err(AdapterError::Transaction(_))
        ));
        adapter.roll_back().unwrap();
        assert!(!adapter.in_transaction());
    }

    #[test]
    fn test_unbound_parameter() {
        let mut adapter = SqliteAdapter::in_memory().unwrap();
        let result = adapter.query(&Statement::prepare("SELECT :missing"));
        assert!(matches!(result, Err(AdapterError::UnboundParameter(name)) if name == "missing"));
    }
}

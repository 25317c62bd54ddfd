//! # oxide-record-sqlite
//!
//! SQLite backend for oxide-record.
//!
//! - [`SqliteAdapter`] implements the `Adapter` contract on top of a sqlx
//!   connection, blocking on a private single-threaded tokio runtime.
//! - [`SqliteDialect`] renders query descriptors (standard `LIMIT n OFFSET o`,
//!   `COUNT(*)` wrapper for total rows) and `CREATE TABLE` statements from a
//!   `TableDefinition`.
//!
//! # How SQLite differs from other dialects
//!
//! - **[Type affinity]**: any column can store any value. Result values are
//!   decoded by their storage class, except integers in `BOOLEAN` columns
//!   which come back as booleans.
//! - **No found-rows counter**: unlike MySQL's `SQL_CALC_FOUND_ROWS`, the
//!   total row count is a second `SELECT COUNT(*)` over the unlimited query.
//! - **[AUTOINCREMENT]**: only on an `INTEGER PRIMARY KEY` column.
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [AUTOINCREMENT]: https://www.sqlite.org/autoinc.html
//!
//! ## Example
//!
//! ```rust
//! use oxide_record_core::{Adapter, Statement};
//! use oxide_record_sqlite::SqliteAdapter;
//!
//! let mut adapter = SqliteAdapter::in_memory().unwrap();
//! adapter
//!     .execute_script("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
//!     .unwrap();
//!
//! let insert = Statement::prepare("INSERT INTO users (name) VALUES (:name)").bind("name", "Ann");
//! let result = adapter.execute(&insert).unwrap();
//! assert_eq!(result.rows_affected, 1);
//! ```

mod adapter;
mod dialect;

pub use adapter::SqliteAdapter;
pub use dialect::SqliteDialect;

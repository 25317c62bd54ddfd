//! # oxide-record-core
//!
//! Shared building blocks for the oxide-record data layer.
//!
//! This crate provides:
//! - [`SqlValue`] and the [`ToSqlValue`] conversion trait
//! - The [`QueryDescriptor`] and its filter/join/order/limit value types
//! - [`Statement`], SQL text with named `:name` parameters
//! - The [`Adapter`] contract that backend drivers implement
//! - [`Dialect`] renderers turning descriptors into statements
//! - The [`TableDefinition`] contract for DDL tooling
//!
//! ## Rendering a query
//!
//! ```rust
//! use oxide_record_core::dialect::{Dialect, GenericDialect};
//! use oxide_record_core::query::{Condition, QueryDescriptor};
//!
//! let mut query = QueryDescriptor::new("users");
//! query.add_filter("id", 5);
//! query.add_filter("name", Condition::like("A%"));
//!
//! let statement = GenericDialect.build_select(&query);
//! assert_eq!(
//!     statement.sql(),
//!     "SELECT main_table.* FROM users main_table \
//!      WHERE main_table.id = :p0 AND main_table.name LIKE :p1"
//! );
//! assert_eq!(
//!     statement.interpolated(),
//!     "SELECT main_table.* FROM users main_table \
//!      WHERE main_table.id = 5 AND main_table.name LIKE 'A%'"
//! );
//! ```

pub mod adapter;
pub mod dialect;
pub mod query;
pub mod schema;
pub mod statement;
pub mod value;

pub use adapter::{Adapter, AdapterError, ExecResult, Row};
pub use dialect::{Dialect, GenericDialect, MysqlDialect};
pub use query::{Condition, Filter, QueryDescriptor, QueryError};
pub use schema::{TableDefinition, TableSchema};
pub use statement::{Param, Statement};
pub use value::{ParamType, SqlValue, ToSqlValue};

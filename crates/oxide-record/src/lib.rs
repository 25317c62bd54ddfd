//! # oxide-record
//!
//! An Active-Record data layer: describe a query against one table, fetch it
//! lazily into entities, then mutate and save them back with dirty tracking.
//!
//! This crate provides:
//! - [`Resource`], a chainable query builder that caches its results
//! - [`Model`] and [`Hooks`] for entity types, usually via `#[derive(Model)]`
//! - [`ActiveRecord`] with `load`, `save` and `delete` for every model
//! - [`Record`] and [`ChangeSet`] for field storage and snapshot diffs
//! - [`Database`], [`Registry`] and [`DatabaseConfig`] to wire it together
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_record::{ActiveRecord, Condition, Database, DatabaseConfig, Model, Record};
//!
//! #[derive(Debug, Default, Model)]
//! #[model(table = "users")]
//! struct User {
//!     record: Record,
//! }
//!
//! fn example() -> oxide_record::Result<()> {
//!     let mut db = Database::connect(&DatabaseConfig::sqlite("sqlite::memory:"))?;
//!     db.register::<User>()?;
//!
//!     // Insert
//!     let mut user = User::default();
//!     user.set("name", "Ann").set("is_active", true);
//!     user.save(&mut db, false)?;
//!
//!     // Query
//!     let mut active = db
//!         .resource::<User>()?
//!         .add_filter("is_active", true)
//!         .add_filter("name", Condition::like("A%"))
//!         .add_order("name", "ASC")?;
//!     let names = active.get_column("name")?;
//!
//!     // Load, update, delete
//!     let mut ann = User::default();
//!     ann.load(&mut db, user.get_id().cloned())?;
//!     ann.set("name", "Anne");
//!     ann.save(&mut db, false)?;
//!     ann.delete(&mut db)?;
//!     Ok(())
//! }
//! ```

extern crate self as oxide_record;

mod config;
mod database;
mod error;
mod model;
mod record;
mod registry;
mod resource;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{RecordError, Result};
pub use model::{ActiveRecord, Hooks, Model, ResourceDefinition};
pub use record::{ChangeSet, FieldValue, Record};
pub use registry::Registry;
pub use resource::{Item, Resource};

pub use oxide_record_core::query::{Condition, Filter, JoinKind, OrderDirection};
pub use oxide_record_core::{
    Adapter, AdapterError, Dialect, ExecResult, ParamType, Row, SqlValue, Statement, ToSqlValue,
};

#[cfg(feature = "derive")]
pub use oxide_record_derive::Model;

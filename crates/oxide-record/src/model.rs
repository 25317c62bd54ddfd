//! Model traits and the active-record persistence logic.
//!
//! A model is any type that owns a [`Record`] and names its table through a
//! [`ResourceDefinition`]. Every model gets [`ActiveRecord`] for free:
//!
//! ```ignore
//! use oxide_record::{ActiveRecord, Database, Model, Record};
//!
//! #[derive(Debug, Default, Model)]
//! #[model(table = "users")]
//! struct User {
//!     record: Record,
//! }
//!
//! let mut user = User::default();
//! user.set("name", "Ann");
//! user.save(&mut db, false)?;           // INSERT, id assigned
//! user.set("name", "Anne");
//! user.save(&mut db, false)?;           // UPDATE users SET name = :name ...
//! ```

use oxide_record_core::adapter::ExecResult;
use oxide_record_core::{Adapter, Dialect, Param, SqlValue, Statement, ToSqlValue};
use tracing::{debug, error};

use crate::database::Database;
use crate::error::{RecordError, Result};
use crate::record::{FieldValue, Record};

/// Table and primary key of a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDefinition {
    table: String,
    primary_key: String,
}

impl ResourceDefinition {
    /// Creates a definition.
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
        }
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key column name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Checks that both names are present.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] when either name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(RecordError::Configuration(String::from(
                "resource has no table name",
            )));
        }
        if self.primary_key.trim().is_empty() {
            return Err(RecordError::Configuration(format!(
                "resource for table {} has no primary key",
                self.table
            )));
        }
        Ok(())
    }
}

/// Lifecycle stages run around load, save and delete.
///
/// Every stage defaults to a no-op. An error returned by a stage aborts the
/// operation and is returned unchanged.
pub trait Hooks {
    /// Runs before the row is fetched.
    fn before_load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs after the row was hydrated.
    fn after_load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs before changes are computed.
    fn before_save(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs after a save that had changes.
    fn after_save(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs before the row is deleted.
    fn before_delete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs after the row was deleted.
    fn after_delete(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An entity backed by one row of a table.
///
/// Usually implemented with `#[derive(Model)]`.
pub trait Model: Default + Hooks + 'static {
    /// Returns the table and primary key of this model.
    fn definition() -> ResourceDefinition;

    /// Returns the field storage.
    fn record(&self) -> &Record;

    /// Returns the field storage mutably.
    fn record_mut(&mut self) -> &mut Record;

    /// Returns a field value.
    fn get(&self, field: &str) -> Option<&SqlValue> {
        self.record().get(field)
    }

    /// Sets a field value.
    fn set<V: ToSqlValue>(&mut self, field: &str, value: V) -> &mut Self {
        self.record_mut().set(field, value);
        self
    }

    /// Sets a field to the result of a sub-query, typically
    /// [`Resource::to_statement`](crate::Resource::to_statement).
    fn set_subquery(&mut self, field: &str, statement: Statement) -> &mut Self {
        self.record_mut().set_subquery(field, statement);
        self
    }

    /// Whether the entity was hydrated from the database.
    fn is_loaded(&self) -> bool {
        self.record().is_loaded()
    }
}

/// Load, save and delete for any [`Model`].
pub trait ActiveRecord: Model {
    /// Loads the row identified by `id`, or by the entity's own primary key
    /// when `id` is `None`. Does nothing if the entity is already loaded.
    ///
    /// # Errors
    ///
    /// - [`RecordError::MissingIdentifier`] when no id is available
    /// - [`RecordError::NotFound`] when no row matches
    /// - [`RecordError::MultipleRows`] when more than one row matches
    /// - hook and adapter errors
    fn load(&mut self, db: &mut Database, id: Option<SqlValue>) -> Result<()>;

    /// Persists the fields that differ from the snapshot. Updates when the
    /// primary key is set and `force_insert` is false, inserts otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Write`] when the statement fails (the
    /// transaction is rolled back), or hook and adapter errors.
    fn save(&mut self, db: &mut Database, force_insert: bool) -> Result<()>;

    /// Deletes the backing row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotLoaded`] for an entity that was never loaded,
    /// [`RecordError::Write`] when the statement fails, or hook errors.
    fn delete(&mut self, db: &mut Database) -> Result<()>;

    /// Returns the primary key value, if set.
    fn get_id(&self) -> Option<&SqlValue>;
}

impl<M: Model> ActiveRecord for M {
    fn load(&mut self, db: &mut Database, id: Option<SqlValue>) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let id = match id.filter(|v| !v.is_null()) {
            Some(id) => id,
            None => present_id(self).ok_or(RecordError::MissingIdentifier)?,
        };

        self.before_load()?;

        let resource = db.resource::<Self>()?;
        let primary_key = resource.primary_key().to_string();
        let mut items = resource.add_filter(&primary_key, id).into_items()?;
        if items.len() != 1 {
            return Err(if items.is_empty() {
                RecordError::NotFound
            } else {
                RecordError::MultipleRows(items.len())
            });
        }
        let mut item = items.remove(0);
        *self.record_mut() = std::mem::take(item.record_mut());

        self.after_load()
    }

    fn save(&mut self, db: &mut Database, force_insert: bool) -> Result<()> {
        self.before_save()?;

        if !self.record().has_changes() {
            return Ok(());
        }

        let definition = db.definition::<Self>()?;
        let table = definition.table();
        let primary_key = definition.primary_key();
        let adapter = db.adapter_mut();
        let columns = adapter.table_columns(table)?;
        let known = |field: &str| columns.is_empty() || columns.iter().any(|c| c == field);

        match present_id(self) {
            Some(id) if !force_insert => {
                let changes = self.record().changes();
                let fields: Vec<(&str, &FieldValue)> = changes
                    .iter()
                    .filter(|(field, _)| *field != primary_key && known(field))
                    .collect();
                if fields.is_empty() {
                    debug!(table = %table, "no writable columns changed; skipping update");
                } else {
                    let statement =
                        update_statement(adapter.dialect(), table, primary_key, id, &fields);
                    write(adapter, &statement)?;
                }
            }
            id => {
                let record = self.record();
                let values = record
                    .data()
                    .iter()
                    .filter(|(field, value)| !(field.as_str() == primary_key && value.is_null()))
                    .map(|(field, value)| (field.as_str(), FieldValue::Value(value.clone())));
                let subqueries = record.subqueries().iter().map(|(field, statement)| {
                    (field.as_str(), FieldValue::Subquery(statement.clone()))
                });
                let fields: Vec<(&str, FieldValue)> = values
                    .chain(subqueries)
                    .filter(|(field, _)| known(field))
                    .collect();
                let fields: Vec<(&str, &FieldValue)> =
                    fields.iter().map(|(f, v)| (*f, v)).collect();

                let statement = insert_statement(adapter.dialect(), table, &fields);
                let result = write(adapter, &statement)?;

                if id.is_none() {
                    let generated = result
                        .last_insert_id
                        .or_else(|| adapter.last_insert_id());
                    if let Some(generated) = generated {
                        self.record_mut().set(primary_key, generated);
                    }
                }
            }
        }

        self.record_mut().commit_snapshot();
        self.after_save()
    }

    fn delete(&mut self, db: &mut Database) -> Result<()> {
        if !self.is_loaded() {
            return Err(RecordError::NotLoaded);
        }

        let definition = db.definition::<Self>()?;
        self.before_delete()?;

        if let Some(id) = present_id(self) {
            let adapter = db.adapter_mut();
            let statement = delete_statement(
                adapter.dialect(),
                definition.table(),
                definition.primary_key(),
                id,
            );
            write(adapter, &statement)?;
        }

        self.after_delete()
    }

    fn get_id(&self) -> Option<&SqlValue> {
        self.get(Self::definition().primary_key())
    }
}

/// The primary key value when it is set and not NULL.
fn present_id<M: Model>(model: &M) -> Option<SqlValue> {
    model.get_id().filter(|v| !v.is_null()).cloned()
}

/// Collects the bindings of a write statement under generated `:pN` names.
/// Column and table names only appear quoted in the SQL text.
struct WriteBinder<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<Param>,
    next: usize,
}

impl<'d> WriteBinder<'d> {
    const fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
            next: 0,
        }
    }

    fn quote(&self, identifier: &str) -> String {
        self.dialect.quote_identifier(identifier)
    }

    fn next_name(&mut self) -> String {
        let name = format!("p{}", self.next);
        self.next += 1;
        name
    }

    fn bind(&mut self, value: SqlValue) -> String {
        let name = self.next_name();
        let param_type = value.param_type();
        let placeholder = format!(":{name}");
        self.params.push(Param {
            name,
            value,
            param_type,
        });
        placeholder
    }

    /// Returns the SQL that refers to `value`. Sub-queries are inlined in
    /// parentheses with their parameters renamed under a fresh prefix.
    fn value(&mut self, value: &FieldValue) -> String {
        match value {
            FieldValue::Value(value) => self.bind(value.clone()),
            FieldValue::Subquery(subquery) => {
                let prefix = self.next_name();
                let subquery = subquery.with_prefix(&prefix);
                self.params.extend_from_slice(subquery.params());
                format!("({})", subquery.sql())
            }
        }
    }

    fn finish(self, sql: String) -> Statement {
        let mut statement = Statement::prepare(sql);
        for param in self.params {
            statement.bind_value(&param.name, param.value, Some(param.param_type));
        }
        statement
    }
}

fn update_statement(
    dialect: &dyn Dialect,
    table: &str,
    primary_key: &str,
    id: SqlValue,
    fields: &[(&str, &FieldValue)],
) -> Statement {
    let mut binder = WriteBinder::new(dialect);
    let assignments: Vec<String> = fields
        .iter()
        .map(|(field, value)| format!("{} = {}", binder.quote(field), binder.value(value)))
        .collect();
    let id = binder.bind(id);
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {id}",
        binder.quote(table),
        assignments.join(", "),
        binder.quote(primary_key)
    );
    binder.finish(sql)
}

fn insert_statement(
    dialect: &dyn Dialect,
    table: &str,
    fields: &[(&str, &FieldValue)],
) -> Statement {
    let mut binder = WriteBinder::new(dialect);
    if fields.is_empty() {
        let sql = format!("INSERT INTO {} DEFAULT VALUES", binder.quote(table));
        return binder.finish(sql);
    }

    let names: Vec<String> = fields.iter().map(|(field, _)| binder.quote(field)).collect();
    let values: Vec<String> = fields.iter().map(|(_, value)| binder.value(value)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        binder.quote(table),
        names.join(", "),
        values.join(", ")
    );
    binder.finish(sql)
}

fn delete_statement(
    dialect: &dyn Dialect,
    table: &str,
    primary_key: &str,
    id: SqlValue,
) -> Statement {
    let mut binder = WriteBinder::new(dialect);
    let id = binder.bind(id);
    let sql = format!(
        "DELETE FROM {} WHERE {} = {id}",
        binder.quote(table),
        binder.quote(primary_key)
    );
    binder.finish(sql)
}

/// Runs a write statement inside a transaction. An already open transaction
/// is joined; otherwise one is opened and committed on success. Any failure
/// rolls back the open transaction, joined or not.
fn write(adapter: &mut dyn Adapter, statement: &Statement) -> Result<ExecResult> {
    let owned = !adapter.in_transaction();
    if owned {
        adapter
            .begin_transaction()
            .map_err(|source| RecordError::Write { source })?;
    }

    debug!(sql = %statement.sql(), params = statement.params().len(), "executing write");
    let outcome = match adapter.execute(statement) {
        Ok(result) if owned => adapter.commit().map(|()| result),
        other => other,
    };

    outcome.map_err(|source| {
        error!(error = %source, sql = %statement.sql(), "write failed");
        if adapter.in_transaction() {
            if let Err(e) = adapter.roll_back() {
                error!(error = %e, "rollback failed");
            }
        }
        RecordError::Write { source }
    })
}

//! Table descriptions for DDL tooling.
//!
//! The query and persistence layers never read these types; they exist so
//! schema tooling can describe a table once and let a dialect render it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::SqlValue;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Integer (64-bit).
    Integer,
    /// Variable-length character string; uses the column length.
    Varchar,
    /// Unbounded text.
    Text,
    /// Boolean.
    Boolean,
    /// Floating point.
    Float,
    /// Decimal number.
    Decimal,
    /// Date and time.
    DateTime,
    /// Binary large object.
    Blob,
}

/// Per-column options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOptions {
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether values must be unique.
    pub unique: bool,
    /// Whether the backend generates values.
    pub auto_increment: bool,
    /// Default value.
    pub default: Option<SqlValue>,
}

/// One column of a table description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Data type.
    pub column_type: ColumnType,
    /// Length for sized types.
    pub length: Option<u32>,
    /// Options.
    pub options: ColumnOptions,
}

/// Errors raised while editing a table description.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The column is already defined.
    #[error("column {0} already exists")]
    DuplicateColumn(String),

    /// The column is not defined.
    #[error("column {0} does not exist")]
    UnknownColumn(String),
}

/// The table description contract used by DDL tooling.
pub trait TableDefinition {
    /// Sets the table name.
    fn set_table_name(&mut self, name: &str);
    /// Returns the table name.
    fn table_name(&self) -> &str;
    /// Sets the storage engine (MySQL only).
    fn set_engine(&mut self, engine: &str);
    /// Returns the storage engine, if set.
    fn engine(&self) -> Option<&str>;
    /// Sets the character set.
    fn set_charset(&mut self, charset: &str);
    /// Returns the character set, if set.
    fn charset(&self) -> Option<&str>;
    /// Adds a column.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateColumn`] if the name is taken.
    fn add_column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        length: Option<u32>,
        options: ColumnOptions,
    ) -> Result<(), SchemaError>;
    /// Replaces the options of a column.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownColumn`] if the column is not defined.
    fn alter_column(&mut self, name: &str, options: ColumnOptions) -> Result<(), SchemaError>;
    /// Drops a column.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownColumn`] if the column is not defined.
    fn drop_column(&mut self, name: &str) -> Result<(), SchemaError>;
    /// Returns all columns in definition order.
    fn columns(&self) -> &[ColumnDefinition];
    /// Returns one column.
    fn column(&self, name: &str) -> Option<&ColumnDefinition>;
    /// Sets the primary key column.
    fn set_primary_key(&mut self, column: &str);
    /// Returns the primary key column, if set.
    fn primary_key(&self) -> Option<&str>;
}

/// In-memory [`TableDefinition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    engine: Option<String>,
    charset: Option<String>,
    columns: Vec<ColumnDefinition>,
    primary_key: Option<String>,
}

impl TableSchema {
    /// Creates an empty description of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl TableDefinition for TableSchema {
    fn set_table_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn table_name(&self) -> &str {
        &self.name
    }

    fn set_engine(&mut self, engine: &str) {
        self.engine = Some(engine.to_string());
    }

    fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    fn set_charset(&mut self, charset: &str) {
        self.charset = Some(charset.to_string());
    }

    fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    fn add_column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        length: Option<u32>,
        options: ColumnOptions,
    ) -> Result<(), SchemaError> {
        if self.column(name).is_some() {
            return Err(SchemaError::DuplicateColumn(name.to_string()));
        }
        self.columns.push(ColumnDefinition {
            name: name.to_string(),
            column_type,
            length,
            options,
        });
        Ok(())
    }

    fn alter_column(&mut self, name: &str, options: ColumnOptions) -> Result<(), SchemaError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))?;
        column.options = options;
        Ok(())
    }

    fn drop_column(&mut self, name: &str) -> Result<(), SchemaError> {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        if self.columns.len() == before {
            return Err(SchemaError::UnknownColumn(name.to_string()));
        }
        if self.primary_key.as_deref() == Some(name) {
            self.primary_key = None;
        }
        Ok(())
    }

    fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn set_primary_key(&mut self, column: &str) {
        self.primary_key = Some(column.to_string());
    }

    fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_schema_columns() {
        let mut table = TableSchema::new("users");
        table
            .add_column("id", ColumnType::Integer, None, ColumnOptions::default())
            .unwrap();
        table
            .add_column("name", ColumnType::Varchar, Some(150), ColumnOptions::default())
            .unwrap();
        table.set_primary_key("id");

        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.column("name").unwrap().length, Some(150));
        assert_eq!(
            table.add_column("id", ColumnType::Integer, None, ColumnOptions::default()),
            Err(SchemaError::DuplicateColumn("id".into()))
        );
    }

    #[test]
    fn test_alter_and_drop() {
        let mut table = TableSchema::new("users");
        table
            .add_column("email", ColumnType::Text, None, ColumnOptions::default())
            .unwrap();
        table
            .alter_column(
                "email",
                ColumnOptions {
                    unique: true,
                    ..ColumnOptions::default()
                },
            )
            .unwrap();
        assert!(table.column("email").unwrap().options.unique);

        table.drop_column("email").unwrap();
        assert!(table.column("email").is_none());
        assert_eq!(
            table.drop_column("email"),
            Err(SchemaError::UnknownColumn("email".into()))
        );
    }
}

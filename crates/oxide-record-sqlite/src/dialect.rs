//! SQLite dialect implementation.

use oxide_record_core::schema::{ColumnDefinition, ColumnType, TableDefinition};
use oxide_record_core::{Dialect, SqlValue};

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the declared SQLite type for a column.
    ///
    /// Booleans are declared `BOOLEAN` so the adapter can decode them back to
    /// booleans; SQLite stores them as 0/1 either way.
    #[must_use]
    pub fn type_name(&self, column: &ColumnDefinition) -> String {
        match column.column_type {
            ColumnType::Integer => String::from("INTEGER"),
            ColumnType::Varchar => column
                .length
                .map_or_else(|| String::from("TEXT"), |len| format!("VARCHAR({len})")),
            ColumnType::Text | ColumnType::DateTime => String::from("TEXT"),
            ColumnType::Boolean => String::from("BOOLEAN"),
            ColumnType::Float => String::from("REAL"),
            ColumnType::Decimal => String::from("NUMERIC"),
            ColumnType::Blob => String::from("BLOB"),
        }
    }

    /// Renders `CREATE TABLE IF NOT EXISTS` for a table description.
    #[must_use]
    pub fn create_table(&self, table: &dyn TableDefinition) -> String {
        let primary_key = table.primary_key();
        let columns: Vec<String> = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c, primary_key == Some(c.name.as_str())))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            self.quote_identifier(table.table_name()),
            columns.join(",\n  ")
        )
    }

    fn column_definition(&self, column: &ColumnDefinition, primary_key: bool) -> String {
        let mut parts = vec![self.quote_identifier(&column.name), self.type_name(column)];

        if primary_key {
            parts.push(String::from("PRIMARY KEY"));
            if column.options.auto_increment {
                parts.push(String::from("AUTOINCREMENT"));
            }
        } else {
            if !column.options.nullable {
                parts.push(String::from("NOT NULL"));
            }
            if column.options.unique {
                parts.push(String::from("UNIQUE"));
            }
        }

        if let Some(default) = &column.options.default {
            let default = match default {
                SqlValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
                other => other.to_sql_inline(),
            };
            parts.push(format!("DEFAULT {default}"));
        }

        parts.join(" ")
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_quote(&self) -> char {
        '"' // SQLite also accepts backticks, but double quotes are standard
    }
}

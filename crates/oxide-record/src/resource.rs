//! Query builder and result collection.
//!
//! A [`Resource`] accumulates a [`QueryDescriptor`] for one table, renders it
//! through the adapter's dialect, executes it lazily and caches the hydrated
//! entities until [`Resource::reset`] is called.
//!
//! Builder methods consume and return the resource so they can be chained:
//!
//! ```ignore
//! let mut users = db
//!     .resource::<User>()?
//!     .add_filter("is_active", true)
//!     .add_filter("name", Condition::like("A%"))
//!     .add_order("name", "ASC")?
//!     .add_limit(10, None);
//!
//! for user in users.get_all_items()? {
//!     println!("{:?}", user.get("name"));
//! }
//! ```

use oxide_record_core::query::{JoinKind, OrderDirection};
use oxide_record_core::{
    Adapter, AdapterError, Filter, QueryDescriptor, Row, SqlValue, Statement, ToSqlValue,
};
use tracing::{debug, warn};

use crate::error::{RecordError, Result};
use crate::model::{Model, ResourceDefinition};

/// One element of [`Resource::to_array`].
#[derive(Debug, Clone, PartialEq)]
pub enum Item<'r, M> {
    /// A reference to a cached entity.
    Entity(&'r M),
    /// The entity's fields.
    Row(Row),
}

/// A lazily executed query over the table of `M`.
pub struct Resource<'a, M: Model> {
    adapter: &'a mut dyn Adapter,
    definition: ResourceDefinition,
    query: QueryDescriptor,
    items: Option<Vec<M>>,
}

impl<M: Model> std::fmt::Debug for Resource<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("definition", &self.definition)
            .field("query", &self.query)
            .field("fetched", &self.items.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl<'a, M: Model> Resource<'a, M> {
    /// Creates a resource for `definition` on `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] when the table or primary key
    /// name is empty.
    pub fn new(adapter: &'a mut dyn Adapter, definition: ResourceDefinition) -> Result<Self> {
        definition.validate()?;
        let query = QueryDescriptor::new(definition.table());
        Ok(Self {
            adapter,
            definition,
            query,
            items: None,
        })
    }

    /// Table and primary key this resource reads.
    #[must_use]
    pub const fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    /// The accumulated query.
    #[must_use]
    pub const fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        self.definition.table()
    }

    /// Primary key column name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.definition.primary_key()
    }

    /// Adds a column to the select list.
    #[must_use]
    pub fn add_column_to_select(mut self, column: &str) -> Self {
        self.query.add_column(column);
        self
    }

    /// Adds several columns to the select list.
    #[must_use]
    pub fn add_columns_to_select(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.query.add_column(column);
        }
        self
    }

    /// Removes a column from the select list.
    #[must_use]
    pub fn remove_column_from_select(mut self, column: &str) -> Self {
        self.query.remove_column(column);
        self
    }

    /// Removes several columns from the select list.
    #[must_use]
    pub fn remove_columns_from_select(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.query.remove_column(column);
        }
        self
    }

    /// Adds a filter. A bare value filters on equality; a
    /// [`Condition`](oxide_record_core::Condition) with an unknown operator
    /// key is ignored.
    #[must_use]
    pub fn add_filter(mut self, column: &str, filter: impl Into<Filter>) -> Self {
        let filter = filter.into();
        let key = match &filter {
            Filter::Condition(condition) => condition.key().to_string(),
            Filter::Scalar(_) => String::from("eq"),
        };
        if !self.query.add_filter(column, filter) {
            warn!(column = %column, operator = %key, "dropping filter with unknown operator");
        }
        self
    }

    /// Adds a raw expression filter. `{column}` in the template is replaced by
    /// the qualified column and each `?` is bound to the next value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Validation`] when the number of `?` markers does
    /// not match the number of values.
    pub fn add_expression_filter<V: ToSqlValue>(
        mut self,
        column: &str,
        expression: &str,
        values: Vec<V>,
    ) -> Result<Self> {
        self.query.add_expression(column, expression, values)?;
        Ok(self)
    }

    /// Adds an inner join keyed by `alias`.
    #[must_use]
    pub fn add_join(self, (alias, table): (&str, &str), on: &str, columns: &[&str]) -> Self {
        self.join(alias, table, on, columns, JoinKind::Inner)
    }

    /// Adds a left join keyed by `alias`.
    #[must_use]
    pub fn add_left_join(self, (alias, table): (&str, &str), on: &str, columns: &[&str]) -> Self {
        self.join(alias, table, on, columns, JoinKind::Left)
    }

    fn join(
        mut self,
        alias: &str,
        table: &str,
        on: &str,
        columns: &[&str],
        kind: JoinKind,
    ) -> Self {
        self.query.add_join(alias, table, on, columns, kind);
        self
    }

    /// Limits the result. `(count, None)` reads the first `count` rows;
    /// `(offset, Some(count))` skips `offset` rows first.
    #[must_use]
    pub fn add_limit(mut self, first: u64, second: Option<u64>) -> Self {
        self.query.set_limit(first, second);
        self
    }

    /// Orders by `column`. `direction` must be `"ASC"` or `"DESC"`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Validation`] for any other direction.
    pub fn add_order(self, column: &str, direction: &str) -> Result<Self> {
        let direction: OrderDirection = direction.parse()?;
        Ok(self.add_order_by(column, direction))
    }

    /// Orders by `column` with a typed direction.
    #[must_use]
    pub fn add_order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.query.add_order(column, direction);
        self
    }

    /// Selects distinct values of `column`.
    #[must_use]
    pub fn add_distinct(mut self, column: &str) -> Self {
        self.query.set_distinct(column);
        self
    }

    /// Groups by `column`.
    #[must_use]
    pub fn add_group_by(mut self, column: &str) -> Self {
        self.query.set_group_by(column);
        self
    }

    /// Asks the dialect to track the row count ignoring the limit, for
    /// dialects that need it at select time.
    #[must_use]
    pub fn calculate_found_rows(mut self) -> Self {
        self.query.set_calc_found_rows(true);
        self
    }

    /// Renders the select with values inlined, for display. Nothing runs.
    #[must_use]
    pub fn get_query(&self) -> String {
        self.to_statement().interpolated()
    }

    /// Renders the parameterized select.
    #[must_use]
    pub fn to_statement(&self) -> Statement {
        self.adapter.dialect().build_select(&self.query)
    }

    /// Renders the parameterized delete for the current filters.
    #[must_use]
    pub fn delete_statement(&self) -> Statement {
        self.adapter.dialect().build_delete(&self.query)
    }

    /// Runs caller-supplied SQL and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the adapter fails.
    pub fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        let statement = Statement::prepare(sql);
        debug!(sql = %statement.sql(), "executing raw query");
        Ok(self.adapter.query(&statement)?)
    }

    /// Deletes every row matching the current filters and returns the number
    /// of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the adapter fails.
    pub fn delete(&mut self) -> Result<u64> {
        let statement = self.delete_statement();
        debug!(sql = %statement.sql(), params = statement.params().len(), "deleting rows");
        let result = self.adapter.execute(&statement)?;
        Ok(result.rows_affected)
    }

    /// Fetches the rows once and returns the cached entities.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn get_all_items(&mut self) -> Result<&[M]> {
        if self.items.is_none() {
            let statement = self.to_statement();
            debug!(
                table = %self.definition.table(),
                sql = %statement.sql(),
                params = statement.params().len(),
                "fetching rows"
            );
            let rows = self.adapter.query(&statement)?;
            let items = rows
                .into_iter()
                .map(|row| {
                    let mut item = M::default();
                    item.record_mut().hydrate(row);
                    item
                })
                .collect();
            self.items = Some(items);
        }
        Ok(self.items.as_deref().unwrap_or_default())
    }

    /// Number of fetched entities.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn count(&mut self) -> Result<usize> {
        Ok(self.get_all_items()?.len())
    }

    /// Returns the entity at `index`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn get_item_by_index(&mut self, index: usize) -> Result<Option<&M>> {
        Ok(self.get_all_items()?.get(index))
    }

    /// Returns the first entity, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn get_first_item(&mut self) -> Result<Option<&M>> {
        self.get_item_by_index(0)
    }

    /// Projects one field across every entity. Entities without the field
    /// yield [`SqlValue::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn get_column(&mut self, name: &str) -> Result<Vec<SqlValue>> {
        Ok(self
            .get_all_items()?
            .iter()
            .map(|item| item.record().get(name).cloned().unwrap_or(SqlValue::Null))
            .collect())
    }

    /// Returns the entities, or their field maps when `recursive` is set.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn to_array(&mut self, recursive: bool) -> Result<Vec<Item<'_, M>>> {
        let items = self.get_all_items()?;
        Ok(items
            .iter()
            .map(|item| {
                if recursive {
                    Item::Row(item.record().data().clone())
                } else {
                    Item::Entity(item)
                }
            })
            .collect())
    }

    /// Returns the fetched rows as a JSON array of objects.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails and
    /// [`RecordError::Validation`] if a row cannot be serialized.
    pub fn to_json(&mut self) -> Result<serde_json::Value> {
        let rows: Vec<&Row> = self
            .get_all_items()?
            .iter()
            .map(|item| item.record().data())
            .collect();
        serde_json::to_value(rows).map_err(|e| RecordError::Validation(e.to_string()))
    }

    /// Fetches and hands over the entities.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if the query fails.
    pub fn into_items(mut self) -> Result<Vec<M>> {
        self.get_all_items()?;
        Ok(self.items.take().unwrap_or_default())
    }

    /// Fetches, then asks the database how many rows the query matches
    /// without its limit.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Adapter`] if either query fails or the count
    /// cannot be read.
    pub fn get_total_rows(&mut self) -> Result<u64> {
        self.get_all_items()?;

        let dialect = self.adapter.dialect();
        let column = dialect.total_rows_column();
        let statement = dialect.build_total_rows(&self.query);
        debug!(sql = %statement.sql(), "counting total rows");

        let rows = self.adapter.query(&statement)?;
        let total = rows
            .first()
            .and_then(|row| row.get(column))
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| {
                AdapterError::Decode(format!("missing {column} column in count result"))
            })?;
        u64::try_from(total).map_err(|e| AdapterError::Decode(e.to_string()).into())
    }

    /// Drops the cached entities so the next read fetches again. The query
    /// itself is kept.
    pub fn reset(&mut self) {
        self.items = None;
        self.adapter.cleanup();
    }

    /// Whether rows have been fetched since creation or the last reset.
    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        self.items.is_some()
    }
}

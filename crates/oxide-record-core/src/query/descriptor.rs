//! The query descriptor: everything needed to render one single-table SELECT
//! (or DELETE), accumulated incrementally.

use std::fmt;
use std::str::FromStr;

use super::filter::{ExpressionFilter, Filter, FilterCondition};
use super::QueryError;
use crate::value::{SqlValue, ToSqlValue};

/// Alias of the queried table.
pub const MAIN_TABLE: &str = "main_table";

/// Default select entry.
pub const MAIN_TABLE_WILDCARD: &str = "main_table.*";

/// Qualifies a bare column with `main_table.`. Qualified names and
/// expressions such as `COUNT(*)` pass through.
#[must_use]
pub fn qualify(column: &str) -> String {
    if column.contains('.') || column.contains('(') {
        column.to_string()
    } else {
        format!("{MAIN_TABLE}.{column}")
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// `INNER JOIN`
    #[default]
    Inner,
    /// `LEFT JOIN`
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A joined table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Alias the joined table is known by (the join key).
    pub alias: String,
    /// Joined table name.
    pub table: String,
    /// `ON` clause.
    pub on: String,
    /// Extra selected columns as given.
    pub columns: Vec<String>,
    /// Join type.
    pub kind: JoinKind,
}

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = QueryError;

    /// Only the exact keywords `ASC` and `DESC` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(QueryError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Qualified column.
    pub column: String,
    /// Direction.
    pub direction: OrderDirection,
}

/// `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    /// Rows to skip.
    pub offset: u64,
    /// Rows to return.
    pub count: u64,
}

/// Accumulated description of a query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    table: String,
    select: Vec<String>,
    joins: Vec<JoinSpec>,
    filters: Vec<FilterCondition>,
    expressions: Vec<ExpressionFilter>,
    orders: Vec<OrderSpec>,
    limit: Option<LimitSpec>,
    distinct: Option<String>,
    group_by: Option<String>,
    calc_found_rows: bool,
}

impl QueryDescriptor {
    /// Creates a descriptor selecting `main_table.*` from `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: vec![MAIN_TABLE_WILDCARD.to_string()],
            joins: Vec::new(),
            filters: Vec::new(),
            expressions: Vec::new(),
            orders: Vec::new(),
            limit: None,
            distinct: None,
            group_by: None,
            calc_found_rows: false,
        }
    }

    /// Adds a select column. A bare column is qualified and replaces the
    /// `main_table.*` wildcard.
    pub fn add_column(&mut self, column: &str) {
        if !column.contains('.') {
            self.select.retain(|c| c != MAIN_TABLE_WILDCARD);
        }
        let column = qualify(column);
        if !self.select.contains(&column) {
            self.select.push(column);
        }
    }

    /// Removes a select column.
    pub fn remove_column(&mut self, column: &str) {
        let column = qualify(column);
        self.select.retain(|c| *c != column);
    }

    /// Adds a filter. Returns `false` when the operator is unknown and the
    /// filter was dropped.
    pub fn add_filter(&mut self, column: &str, filter: impl Into<Filter>) -> bool {
        match FilterCondition::resolve(qualify(column), filter) {
            Some(condition) => {
                self.filters.push(condition);
                true
            }
            None => false,
        }
    }

    /// Adds a raw expression filter.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ExpressionArity`] when the number of `?` markers
    /// does not match the number of values.
    pub fn add_expression<V: ToSqlValue>(
        &mut self,
        column: &str,
        expression: &str,
        values: Vec<V>,
    ) -> Result<(), QueryError> {
        let markers = ExpressionFilter::marker_count(expression);
        if markers != values.len() {
            return Err(QueryError::ExpressionArity {
                expected: markers,
                given: values.len(),
            });
        }
        self.expressions.push(ExpressionFilter {
            column: qualify(column),
            expression: expression.to_string(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        });
        Ok(())
    }

    /// Registers a join keyed by `alias`, replacing an earlier join with the
    /// same alias. Without extra columns `alias.*` is selected; otherwise each
    /// column is selected qualified by the alias.
    pub fn add_join(
        &mut self,
        alias: &str,
        table: &str,
        on: &str,
        columns: &[&str],
        kind: JoinKind,
    ) {
        let join = JoinSpec {
            alias: alias.to_string(),
            table: table.to_string(),
            on: on.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            kind,
        };

        let selected: Vec<String> = if columns.is_empty() {
            vec![format!("{alias}.*")]
        } else {
            columns
                .iter()
                .map(|c| {
                    if c.contains('.') {
                        (*c).to_string()
                    } else {
                        format!("{alias}.{c}")
                    }
                })
                .collect()
        };
        for column in selected {
            if !self.select.contains(&column) {
                self.select.push(column);
            }
        }

        match self.joins.iter_mut().find(|j| j.alias == join.alias) {
            Some(existing) => *existing = join,
            None => self.joins.push(join),
        }
    }

    /// Sets the limit. With one argument it is the row count (offset 0); with
    /// two it is `(offset, count)`.
    pub fn set_limit(&mut self, first: u64, second: Option<u64>) {
        self.limit = Some(match second {
            None => LimitSpec {
                offset: 0,
                count: first,
            },
            Some(count) => LimitSpec {
                offset: first,
                count,
            },
        });
    }

    /// Appends an ordering.
    pub fn add_order(&mut self, column: &str, direction: OrderDirection) {
        self.orders.push(OrderSpec {
            column: qualify(column),
            direction,
        });
    }

    /// Sets the distinct column.
    pub fn set_distinct(&mut self, column: &str) {
        self.distinct = Some(qualify(column));
    }

    /// Sets the group-by column.
    pub fn set_group_by(&mut self, column: &str) {
        self.group_by = Some(qualify(column));
    }

    /// Asks dialects that need it to track the unlimited row count.
    pub fn set_calc_found_rows(&mut self, enabled: bool) {
        self.calc_found_rows = enabled;
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Select list.
    #[must_use]
    pub fn select(&self) -> &[String] {
        &self.select
    }

    /// Joins in registration order.
    #[must_use]
    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    /// Filters in insertion order.
    #[must_use]
    pub fn filters(&self) -> &[FilterCondition] {
        &self.filters
    }

    /// Expression filters in insertion order.
    #[must_use]
    pub fn expressions(&self) -> &[ExpressionFilter] {
        &self.expressions
    }

    /// Orderings.
    #[must_use]
    pub fn orders(&self) -> &[OrderSpec] {
        &self.orders
    }

    /// Limit, if set.
    #[must_use]
    pub const fn limit(&self) -> Option<LimitSpec> {
        self.limit
    }

    /// Distinct column, if set.
    #[must_use]
    pub fn distinct(&self) -> Option<&str> {
        self.distinct.as_deref()
    }

    /// Group-by column, if set.
    #[must_use]
    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    /// Whether the unlimited row count should be tracked.
    #[must_use]
    pub const fn calc_found_rows(&self) -> bool {
        self.calc_found_rows
    }

    /// Values of every filter and expression, in render order.
    #[must_use]
    pub fn bound_values(&self) -> Vec<SqlValue> {
        self.filters
            .iter()
            .flat_map(|f| f.operand.values().iter().cloned())
            .chain(self.expressions.iter().flat_map(|e| e.values.iter().cloned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, Operator};

    #[test]
    fn test_default_select() {
        let query = QueryDescriptor::new("users");
        assert_eq!(query.select(), ["main_table.*"]);
    }

    #[test]
    fn test_unqualified_column_removes_wildcard_once() {
        let mut query = QueryDescriptor::new("users");
        query.add_column("name");
        query.add_column("email");
        query.add_column("name");
        assert_eq!(query.select(), ["main_table.name", "main_table.email"]);
    }

    #[test]
    fn test_qualified_column_keeps_wildcard() {
        let mut query = QueryDescriptor::new("users");
        query.add_column("g.name");
        assert_eq!(query.select(), ["main_table.*", "g.name"]);
    }

    #[test]
    fn test_expression_column_is_not_qualified() {
        let mut query = QueryDescriptor::new("orders");
        query.add_column("COUNT(*)");
        assert_eq!(query.select(), ["COUNT(*)"]);
    }

    #[test]
    fn test_remove_column_is_qualified() {
        let mut query = QueryDescriptor::new("users");
        query.add_column("name");
        query.add_column("email");
        query.remove_column("name");
        assert_eq!(query.select(), ["main_table.email"]);
    }

    #[test]
    fn test_filter_columns_are_qualified() {
        let mut query = QueryDescriptor::new("users");
        assert!(query.add_filter("id", 5));
        assert!(query.add_filter("g.name", Condition::like("adm%")));
        assert_eq!(query.filters()[0].column, "main_table.id");
        assert_eq!(query.filters()[1].column, "g.name");
        assert_eq!(query.filters()[1].operator, Operator::Like);
    }

    #[test]
    fn test_unknown_filter_operator_is_dropped() {
        let mut query = QueryDescriptor::new("users");
        assert!(!query.add_filter("id", Condition::new("almost", 5)));
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_limit_forms() {
        let mut query = QueryDescriptor::new("users");
        query.set_limit(5, None);
        assert_eq!(query.limit(), Some(LimitSpec { offset: 0, count: 5 }));
        query.set_limit(10, Some(5));
        assert_eq!(query.limit(), Some(LimitSpec { offset: 10, count: 5 }));
    }

    #[test]
    fn test_order_direction_parsing() {
        assert_eq!("ASC".parse::<OrderDirection>().unwrap(), OrderDirection::Asc);
        assert_eq!("DESC".parse::<OrderDirection>().unwrap(), OrderDirection::Desc);
        assert!(matches!(
            "asc".parse::<OrderDirection>(),
            Err(QueryError::InvalidDirection(d)) if d == "asc"
        ));
        assert!("DOWN".parse::<OrderDirection>().is_err());
    }

    #[test]
    fn test_join_without_columns_selects_wildcard() {
        let mut query = QueryDescriptor::new("users");
        query.add_join("g", "groups", "g.id = main_table.group_id", &[], JoinKind::Inner);
        assert_eq!(query.select(), ["main_table.*", "g.*"]);
        assert_eq!(query.joins()[0].table, "groups");
    }

    #[test]
    fn test_join_columns_are_alias_qualified() {
        let mut query = QueryDescriptor::new("users");
        query.add_join(
            "g",
            "groups",
            "g.id = main_table.group_id",
            &["name", "x.other"],
            JoinKind::Left,
        );
        assert_eq!(query.select(), ["main_table.*", "g.name", "x.other"]);
        assert_eq!(query.joins()[0].kind, JoinKind::Left);
    }

    #[test]
    fn test_join_same_alias_replaces() {
        let mut query = QueryDescriptor::new("users");
        query.add_join("g", "groups", "a", &[], JoinKind::Inner);
        query.add_join("g", "teams", "b", &[], JoinKind::Left);
        assert_eq!(query.joins().len(), 1);
        assert_eq!(query.joins()[0].table, "teams");
    }

    #[test]
    fn test_expression_arity() {
        let mut query = QueryDescriptor::new("users");
        assert!(query
            .add_expression("created_at", "DATE({column}) BETWEEN ? AND ?", vec!["a", "b"])
            .is_ok());
        assert!(matches!(
            query.add_expression("created_at", "DATE({column}) = ?", Vec::<i64>::new()),
            Err(QueryError::ExpressionArity { expected: 1, given: 0 })
        ));
        assert_eq!(query.expressions().len(), 1);
        assert_eq!(query.expressions()[0].column, "main_table.created_at");
    }

    #[test]
    fn test_expression_arity_ignores_quoted_marker() {
        let mut query = QueryDescriptor::new("faq");
        assert!(query
            .add_expression("question", "{column} LIKE '%?' AND {column} != ?", vec!["x"])
            .is_ok());
        assert!(matches!(
            query.add_expression("question", "{column} = '?'", vec!["x"]),
            Err(QueryError::ExpressionArity { expected: 0, given: 1 })
        ));
    }

    #[test]
    fn test_distinct_and_group_by_are_qualified() {
        let mut query = QueryDescriptor::new("users");
        query.set_distinct("email");
        query.set_group_by("group_id");
        assert_eq!(query.distinct(), Some("main_table.email"));
        assert_eq!(query.group_by(), Some("main_table.group_id"));
    }
}

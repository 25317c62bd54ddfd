//! Renders a [`QueryDescriptor`] into a parameterized [`Statement`].

use tracing::warn;

use super::Dialect;
use crate::query::{FilterCondition, Operand, Operator, QueryDescriptor, MAIN_TABLE};
use crate::statement::Statement;
use crate::value::SqlValue;

/// Collects bound values under generated `:pN` names.
struct Binder {
    statement: Statement,
    next: usize,
}

impl Binder {
    fn new() -> Self {
        Self {
            statement: Statement::default(),
            next: 0,
        }
    }

    fn bind(&mut self, value: &SqlValue) -> String {
        let name = format!("p{}", self.next);
        self.next += 1;
        self.statement.bind_value(&name, value.clone(), None);
        format!(":{name}")
    }

    fn push(&mut self, sql: &str) {
        self.statement.push_sql(sql);
    }

    fn finish(self) -> Statement {
        self.statement
    }
}

/// Renders the full SELECT. Without `paginate` the ORDER BY and LIMIT clauses
/// are left out.
pub(crate) fn select<D: Dialect + ?Sized>(
    dialect: &D,
    query: &QueryDescriptor,
    paginate: bool,
) -> Statement {
    let mut binder = Binder::new();
    write_select(dialect, query, paginate, &mut binder);
    binder.finish()
}

/// Wraps the unpaginated SELECT in a `COUNT(*)`.
pub(crate) fn count_wrapper<D: Dialect + ?Sized>(
    dialect: &D,
    query: &QueryDescriptor,
) -> Statement {
    let mut binder = Binder::new();
    binder.push("SELECT COUNT(*) AS ");
    binder.push(dialect.total_rows_column());
    binder.push(" FROM (");
    write_select(dialect, query, false, &mut binder);
    binder.push(") counted");
    binder.finish()
}

/// Renders a DELETE restricted by the descriptor's filters.
pub(crate) fn delete(query: &QueryDescriptor) -> Statement {
    if !query.joins().is_empty() {
        warn!(table = %query.table(), "Ignoring joins in DELETE");
    }

    let mut binder = Binder::new();
    binder.push("DELETE FROM ");
    binder.push(query.table());
    write_where(query, true, &mut binder);
    binder.finish()
}

fn write_select<D: Dialect + ?Sized>(
    dialect: &D,
    query: &QueryDescriptor,
    paginate: bool,
    binder: &mut Binder,
) {
    binder.push("SELECT ");
    if let Some(modifier) = dialect.select_modifier(query) {
        binder.push(modifier);
        binder.push(" ");
    }

    let mut columns: Vec<&str> = Vec::with_capacity(query.select().len() + 1);
    if let Some(distinct) = query.distinct() {
        binder.push("DISTINCT ");
        columns.push(distinct);
    }
    columns.extend(
        query
            .select()
            .iter()
            .map(String::as_str)
            .filter(|c| Some(*c) != query.distinct()),
    );
    binder.push(&columns.join(", "));

    binder.push(" FROM ");
    binder.push(query.table());
    binder.push(" ");
    binder.push(MAIN_TABLE);

    for join in query.joins() {
        binder.push(&format!(
            " {} {} {} ON {}",
            join.kind.sql(),
            join.table,
            join.alias,
            join.on
        ));
    }

    write_where(query, false, binder);

    if let Some(group_by) = query.group_by() {
        binder.push(" GROUP BY ");
        binder.push(group_by);
    }

    if !paginate {
        return;
    }

    if !query.orders().is_empty() {
        let parts: Vec<String> = query
            .orders()
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.sql()))
            .collect();
        binder.push(" ORDER BY ");
        binder.push(&parts.join(", "));
    }

    if let Some(limit) = query.limit() {
        binder.push(" ");
        binder.push(&dialect.limit_clause(limit));
    }
}

fn write_where(query: &QueryDescriptor, strip_alias: bool, binder: &mut Binder) {
    let column_name = |column: &str| -> String {
        if strip_alias {
            column
                .strip_prefix(MAIN_TABLE)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(column)
                .to_string()
        } else {
            column.to_string()
        }
    };

    let mut conditions: Vec<String> = Vec::new();

    for filter in query.filters() {
        let column = column_name(&filter.column);
        conditions.push(condition_sql(&column, filter, binder));
    }

    for expression in query.expressions() {
        let column = column_name(&expression.column);
        conditions.push(expression.render(&column, |value| binder.bind(value)));
    }

    if !conditions.is_empty() {
        binder.push(" WHERE ");
        binder.push(&conditions.join(" AND "));
    }
}

fn condition_sql(column: &str, filter: &FilterCondition, binder: &mut Binder) -> String {
    let op = filter.operator;
    match op {
        Operator::Null | Operator::NotNull => format!("{column} {}", op.sql()),
        Operator::In | Operator::Nin => {
            let values = filter.operand.values();
            if values.is_empty() {
                // An empty set matches nothing; its negation matches everything.
                return String::from(if op == Operator::In { "1 = 0" } else { "1 = 1" });
            }
            let placeholders: Vec<String> = values.iter().map(|v| binder.bind(v)).collect();
            format!("{column} {} ({})", op.sql(), placeholders.join(", "))
        }
        _ => {
            let value = match &filter.operand {
                Operand::Value(v) => v.clone(),
                Operand::List(values) => values.first().cloned().unwrap_or(SqlValue::Null),
                Operand::None => SqlValue::Null,
            };
            format!("{column} {} {}", op.sql(), binder.bind(&value))
        }
    }
}

//! Filter conditions.
//!
//! A filter is a `(column, operator, value)` triple. Operators are addressed by
//! their short keys (`eq`, `gteq`, `not-null`, ...); a key outside the fixed set
//! does not produce a filter at all.

use std::fmt;

use crate::value::{SqlValue, ToSqlValue};

/// The fixed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gteq,
    /// `<=`
    Lteq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    Nlike,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    Nin,
    /// `IS NULL`
    Null,
    /// `IS NOT NULL`
    NotNull,
}

impl Operator {
    /// All operators, in key order.
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Lt,
        Self::Gteq,
        Self::Lteq,
        Self::Like,
        Self::Nlike,
        Self::In,
        Self::Nin,
        Self::Null,
        Self::NotNull,
    ];

    /// Looks an operator up by key. Unknown keys yield `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Returns the operator key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gteq => "gteq",
            Self::Lteq => "lteq",
            Self::Like => "like",
            Self::Nlike => "nlike",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Null => "null",
            Self::NotNull => "not-null",
        }
    }

    /// Returns the SQL operator text.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gteq => ">=",
            Self::Lteq => "<=",
            Self::Like => "LIKE",
            Self::Nlike => "NOT LIKE",
            Self::In => "IN",
            Self::Nin => "NOT IN",
            Self::Null => "IS NULL",
            Self::NotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No value (`null`, `not-null`).
    None,
    /// A single value.
    Value(SqlValue),
    /// A list of values (`in`, `nin`).
    List(Vec<SqlValue>),
}

impl Operand {
    /// Returns the values carried by this operand.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        match self {
            Self::None => &[],
            Self::Value(v) => std::slice::from_ref(v),
            Self::List(values) => values,
        }
    }
}

/// An operator key paired with its operand, not yet attached to a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    key: String,
    operand: Operand,
}

impl Condition {
    /// Creates a condition from an operator key and a value.
    ///
    /// The key is not checked here; an unknown key is dropped when the
    /// condition is added to a query.
    pub fn new<V: ToSqlValue>(key: &str, value: V) -> Self {
        Self {
            key: key.to_string(),
            operand: Operand::Value(value.to_sql_value()),
        }
    }

    /// Creates a condition from an operator key and a list of values.
    pub fn list<V: ToSqlValue>(key: &str, values: Vec<V>) -> Self {
        Self {
            key: key.to_string(),
            operand: Operand::List(values.into_iter().map(ToSqlValue::to_sql_value).collect()),
        }
    }

    fn keyed(op: Operator, operand: Operand) -> Self {
        Self {
            key: op.key().to_string(),
            operand,
        }
    }

    /// `column = value`
    pub fn eq<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Eq, Operand::Value(value.to_sql_value()))
    }

    /// `column != value`
    pub fn neq<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Neq, Operand::Value(value.to_sql_value()))
    }

    /// `column > value`
    pub fn gt<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Gt, Operand::Value(value.to_sql_value()))
    }

    /// `column < value`
    pub fn lt<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Lt, Operand::Value(value.to_sql_value()))
    }

    /// `column >= value`
    pub fn gteq<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Gteq, Operand::Value(value.to_sql_value()))
    }

    /// `column <= value`
    pub fn lteq<V: ToSqlValue>(value: V) -> Self {
        Self::keyed(Operator::Lteq, Operand::Value(value.to_sql_value()))
    }

    /// `column LIKE pattern`
    pub fn like(pattern: &str) -> Self {
        Self::keyed(Operator::Like, Operand::Value(pattern.to_sql_value()))
    }

    /// `column NOT LIKE pattern`
    pub fn nlike(pattern: &str) -> Self {
        Self::keyed(Operator::Nlike, Operand::Value(pattern.to_sql_value()))
    }

    /// `column IN (values)`
    pub fn in_list<V: ToSqlValue>(values: Vec<V>) -> Self {
        Self::list(Operator::In.key(), values)
    }

    /// `column NOT IN (values)`
    pub fn not_in_list<V: ToSqlValue>(values: Vec<V>) -> Self {
        Self::list(Operator::Nin.key(), values)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null() -> Self {
        Self::keyed(Operator::Null, Operand::None)
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null() -> Self {
        Self::keyed(Operator::NotNull, Operand::None)
    }

    /// Returns the operator key as given.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// What `add_filter` accepts: a bare value (shorthand for `eq`) or a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A bare value, compared with `=`.
    Scalar(SqlValue),
    /// An explicit condition.
    Condition(Condition),
}

impl Filter {
    /// Normalizes the filter to a condition.
    #[must_use]
    pub fn into_condition(self) -> Condition {
        match self {
            Self::Scalar(value) => Condition::eq(value),
            Self::Condition(condition) => condition,
        }
    }
}

impl<T: ToSqlValue> From<T> for Filter {
    fn from(value: T) -> Self {
        Self::Scalar(value.to_sql_value())
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

/// A filter attached to a (qualified) column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Qualified column name.
    pub column: String,
    /// Operator.
    pub operator: Operator,
    /// Operand.
    pub operand: Operand,
}

impl FilterCondition {
    /// Resolves a filter against a column. Returns `None` when the operator key
    /// is not one of the known operators.
    pub fn resolve(column: String, filter: impl Into<Filter>) -> Option<Self> {
        let condition = filter.into().into_condition();
        let operator = Operator::parse(&condition.key)?;
        Some(Self {
            column,
            operator,
            operand: condition.operand,
        })
    }
}

/// A raw condition for cases the operator set cannot express.
///
/// The expression may reference the column as `{column}` and marks each bound
/// value with `?`. A `?` inside a quoted literal is plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionFilter {
    /// Qualified column name.
    pub column: String,
    /// Expression template.
    pub expression: String,
    /// Values for the `?` markers, in order.
    pub values: Vec<SqlValue>,
}

impl ExpressionFilter {
    /// Counts the `?` markers of `template` outside quoted text.
    #[must_use]
    pub fn marker_count(template: &str) -> usize {
        let mut count = 0;
        replace_markers(template, |_| {
            count += 1;
            String::from("?")
        });
        count
    }

    /// Renders the expression for `column`, replacing the n-th marker with
    /// `bind(n-th value)`.
    pub fn render(&self, column: &str, mut bind: impl FnMut(&SqlValue) -> String) -> String {
        let template = self.expression.replace("{column}", column);
        let mut values = self.values.iter();
        replace_markers(&template, |_| {
            values.next().map_or_else(|| String::from("?"), &mut bind)
        })
    }
}

/// Rewrites each `?` outside single quotes, double quotes and backticks.
/// The closure receives the marker index.
fn replace_markers(template: &str, mut replace: impl FnMut(usize) -> String) -> String {
    let mut out = String::with_capacity(template.len());
    let mut quote: Option<char> = None;
    let mut index = 0;

    for c in template.chars() {
        match (quote, c) {
            (Some(q), c) => {
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            (None, '\'' | '"' | '`') => {
                quote = Some(c);
                out.push(c);
            }
            (None, '?') => {
                out.push_str(&replace(index));
                index += 1;
            }
            (None, c) => out.push(c),
        }
    }
    out
}

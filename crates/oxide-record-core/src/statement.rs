//! Prepared statements with named parameters.
//!
//! A [`Statement`] is SQL text using `:name` placeholders plus the values bound
//! to those names. Adapters translate it into whatever their backend expects
//! (see [`Statement::to_positional`]).

use std::convert::Infallible;

use crate::adapter::AdapterError;
use crate::value::{ParamType, SqlValue, ToSqlValue};

/// A value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Placeholder name without the leading `:`.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
    /// Explicit parameter type.
    pub param_type: ParamType,
}

/// SQL text plus its named parameter bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    /// Prepares a statement from SQL text. Nothing is bound yet.
    pub fn prepare(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds `value` to the placeholder `name` (with or without the leading
    /// `:`). Without an explicit type the value's own [`ParamType`] is used.
    /// Binding the same name twice replaces the earlier value.
    pub fn bind_value<V: ToSqlValue>(
        &mut self,
        name: &str,
        value: V,
        param_type: Option<ParamType>,
    ) -> &mut Self {
        let name = name.trim_start_matches(':').to_string();
        let value = value.to_sql_value();
        let param_type = param_type.unwrap_or_else(|| value.param_type());
        let param = Param {
            name,
            value,
            param_type,
        };

        match self.params.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
        self
    }

    /// Builder form of [`Statement::bind_value`] with the default type.
    #[must_use]
    pub fn bind<V: ToSqlValue>(mut self, name: &str, value: V) -> Self {
        self.bind_value(name, value, None);
        self
    }

    /// Returns the SQL text with its `:name` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound parameters in binding order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Looks up a bound parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Param> {
        let name = name.trim_start_matches(':');
        self.params.iter().find(|p| p.name == name)
    }

    /// Renders the statement with every bound value inlined, for display and
    /// logging. Unbound placeholders are left as they are.
    #[must_use]
    pub fn interpolated(&self) -> String {
        let rendered: Result<String, Infallible> = rewrite_placeholders(&self.sql, |name| {
            Ok(self
                .param(name)
                .map_or_else(|| format!(":{name}"), |p| p.value.to_sql_inline()))
        });
        match rendered {
            Ok(sql) => sql,
            Err(never) => match never {},
        }
    }

    /// Translates the statement to `?` placeholders, returning the values in
    /// the order their placeholders appear. A name used twice is bound twice.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnboundParameter`] when a placeholder has no
    /// bound value.
    pub fn to_positional(&self) -> Result<(String, Vec<SqlValue>), AdapterError> {
        let mut values = Vec::with_capacity(self.params.len());
        let sql = rewrite_placeholders(&self.sql, |name| -> Result<String, AdapterError> {
            let param = self
                .param(name)
                .ok_or_else(|| AdapterError::UnboundParameter(name.to_string()))?;
            values.push(param.value.clone());
            Ok(String::from("?"))
        })?;
        Ok((sql, values))
    }

    /// Returns a copy whose placeholders and bindings are renamed to
    /// `{prefix}_{name}`, so the statement can be embedded in another one.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let renamed: Result<String, Infallible> =
            rewrite_placeholders(&self.sql, |name| Ok(format!(":{prefix}_{name}")));
        let sql = match renamed {
            Ok(sql) => sql,
            Err(never) => match never {},
        };
        let params = self
            .params
            .iter()
            .map(|p| Param {
                name: format!("{prefix}_{}", p.name),
                value: p.value.clone(),
                param_type: p.param_type,
            })
            .collect();
        Self { sql, params }
    }

    /// Appends SQL text.
    pub(crate) fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends another statement's text and bindings.
    pub fn append(&mut self, other: &Self) {
        self.sql.push_str(&other.sql);
        for param in &other.params {
            self.bind_value(&param.name, param.value.clone(), Some(param.param_type));
        }
    }
}

/// Rewrites every `:name` placeholder in `sql` with the output of `replace`.
///
/// Text inside single quotes, double quotes and backticks is copied untouched,
/// as are `::` casts.
///
/// # Errors
///
/// Propagates the first error returned by `replace`.
pub fn rewrite_placeholders<E>(
    sql: &str,
    mut replace: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((index, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            ':' => match chars.peek() {
                Some((_, ':')) => {
                    out.push_str("::");
                    chars.next();
                }
                Some((_, next)) if next.is_ascii_alphabetic() || *next == '_' => {
                    let start = index + 1;
                    let mut end = start;
                    while let Some((i, n)) = chars.peek() {
                        if n.is_ascii_alphanumeric() || *n == '_' {
                            end = *i + n.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(&replace(&sql[start..end])?);
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_value_strips_colon_and_replaces() {
        let mut stmt = Statement::prepare("UPDATE users SET name = :name WHERE id = :id");
        stmt.bind_value(":name", "Ann", None);
        stmt.bind_value("id", 5, None);
        stmt.bind_value("name", "Bob", None);

        assert_eq!(stmt.params().len(), 2);
        assert_eq!(stmt.param("name").unwrap().value, SqlValue::Text("Bob".into()));
        assert_eq!(stmt.param(":id").unwrap().param_type, ParamType::Int);
    }

    #[test]
    fn test_explicit_param_type() {
        let mut stmt = Statement::prepare("SELECT :v");
        stmt.bind_value("v", 1.5, Some(ParamType::Str));
        assert_eq!(stmt.param("v").unwrap().param_type, ParamType::Str);
    }

    #[test]
    fn test_interpolated() {
        let stmt = Statement::prepare("SELECT * FROM users WHERE name = :name AND id = :id")
            .bind("name", "O'Brien")
            .bind("id", 5);
        assert_eq!(
            stmt.interpolated(),
            "SELECT * FROM users WHERE name = 'O''Brien' AND id = 5"
        );
    }

    #[test]
    fn test_to_positional_follows_text_order() {
        let stmt = Statement::prepare("UPDATE t SET a = :a, b = :b WHERE id = :id")
            .bind("id", 1)
            .bind("b", "x")
            .bind("a", true);
        let (sql, values) = stmt.to_positional().unwrap();
        assert_eq!(sql, "UPDATE t SET a = ?, b = ? WHERE id = ?");
        assert_eq!(
            values,
            vec![SqlValue::Bool(true), SqlValue::Text("x".into()), SqlValue::Int(1)]
        );
    }

    #[test]
    fn test_to_positional_unbound() {
        let stmt = Statement::prepare("SELECT * FROM t WHERE id = :id");
        assert!(matches!(
            stmt.to_positional(),
            Err(AdapterError::UnboundParameter(name)) if name == "id"
        ));
    }

    #[test]
    fn test_placeholders_inside_literals_are_ignored() {
        let stmt = Statement::prepare("SELECT ':x', \"a:b\", c::text FROM t WHERE id = :id")
            .bind("id", 2);
        let (sql, values) = stmt.to_positional().unwrap();
        assert_eq!(sql, "SELECT ':x', \"a:b\", c::text FROM t WHERE id = ?");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_with_prefix() {
        let stmt = Statement::prepare("SELECT id FROM g WHERE name = :p0").bind("p0", "admins");
        let prefixed = stmt.with_prefix("group_id");
        assert_eq!(prefixed.sql(), "SELECT id FROM g WHERE name = :group_id_p0");
        assert_eq!(prefixed.params()[0].name, "group_id_p0");
    }
}

//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. A dialect renders
//! query descriptors into statements; adapters expose the dialect they speak.

mod generic;
mod mysql;
mod render;

pub use generic::GenericDialect;
pub use mysql::MysqlDialect;

use crate::query::{LimitSpec, QueryDescriptor};
use crate::statement::Statement;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier. Embedded quote characters are doubled.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Keyword placed right after `SELECT`, if the query needs one.
    fn select_modifier(&self, _query: &QueryDescriptor) -> Option<&'static str> {
        None
    }

    /// Renders the `LIMIT` clause.
    fn limit_clause(&self, limit: LimitSpec) -> String {
        if limit.offset == 0 {
            format!("LIMIT {}", limit.count)
        } else {
            format!("LIMIT {} OFFSET {}", limit.count, limit.offset)
        }
    }

    /// Column name under which [`Dialect::build_total_rows`] reports its count.
    fn total_rows_column(&self) -> &'static str {
        "total"
    }

    /// Renders the SELECT described by `query`.
    fn build_select(&self, query: &QueryDescriptor) -> Statement {
        render::select(self, query, true)
    }

    /// Renders a DELETE restricted by the filters of `query`.
    fn build_delete(&self, query: &QueryDescriptor) -> Statement {
        render::delete(query)
    }

    /// Renders the statement that counts every row `query` matches,
    /// regardless of its limit. The default wraps the unpaginated SELECT in
    /// `COUNT(*)`.
    fn build_total_rows(&self, query: &QueryDescriptor) -> Statement {
        render::count_wrapper(self, query)
    }
}

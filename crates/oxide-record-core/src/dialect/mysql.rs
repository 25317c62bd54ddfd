//! MySQL dialect.
//!
//! MySQL counts the rows a limited query would have matched through
//! `SQL_CALC_FOUND_ROWS` on the select and a follow-up `SELECT FOUND_ROWS()`.

use super::Dialect;
use crate::query::{LimitSpec, QueryDescriptor};
use crate::statement::Statement;

/// MySQL / MariaDB dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn select_modifier(&self, query: &QueryDescriptor) -> Option<&'static str> {
        query.calc_found_rows().then_some("SQL_CALC_FOUND_ROWS")
    }

    fn limit_clause(&self, limit: LimitSpec) -> String {
        format!("LIMIT {}, {}", limit.offset, limit.count)
    }

    fn build_total_rows(&self, _query: &QueryDescriptor) -> Statement {
        Statement::prepare(format!("SELECT FOUND_ROWS() AS {}", self.total_rows_column()))
    }
}

//! Query description types.
//!
//! This module provides the filter, join, order and limit value types and the
//! [`QueryDescriptor`] that aggregates them.

mod descriptor;
mod filter;

pub use descriptor::{
    qualify, JoinKind, JoinSpec, LimitSpec, OrderDirection, OrderSpec, QueryDescriptor,
    MAIN_TABLE, MAIN_TABLE_WILDCARD,
};
pub use filter::{Condition, ExpressionFilter, Filter, FilterCondition, Operand, Operator};

use thiserror::Error;

/// Errors raised while describing a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Order direction other than `ASC` or `DESC`.
    #[error("invalid order direction: ASC or DESC expected, {0} given")]
    InvalidDirection(String),

    /// Expression filter markers and values do not line up.
    #[error("expression expects {expected} values, {given} given")]
    ExpressionArity {
        /// Number of `?` markers in the expression.
        expected: usize,
        /// Number of values supplied.
        given: usize,
    },
}

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use oxide_record::{Adapter, AdapterError, Dialect, ExecResult, Row, SqlValue, Statement};
use oxide_record_core::GenericDialect;

/// One call made against the fake adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(Statement),
    Execute(Statement),
    Begin,
    Commit,
    RollBack,
    TableColumns(String),
    Cleanup,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    pub results: VecDeque<Vec<Row>>,
    pub columns: Vec<String>,
    pub fail_execute: bool,
    pub next_insert_id: i64,
    pub in_transaction: bool,
    pub last_insert_id: Option<SqlValue>,
}

impl FakeState {
    /// Calls that touched the database, ignoring `cleanup`.
    pub fn statements(&self) -> Vec<&Statement> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Query(s) | Call::Execute(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn executed(&self) -> Vec<&Statement> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Execute(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Records every call and answers from queued results.
#[derive(Debug, Clone, Default)]
pub struct FakeAdapter {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known table columns; empty means the table cannot be described.
    pub fn with_columns(self, columns: &[&str]) -> Self {
        self.state.borrow_mut().columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.borrow_mut().results.push_back(rows);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn fail_execute(&self, fail: bool) {
        self.state.borrow_mut().fail_execute = fail;
    }
}

impl Adapter for FakeAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &GenericDialect
    }

    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Query(statement.clone()));
        Ok(state.results.pop_front().unwrap_or_default())
    }

    fn execute(&mut self, statement: &Statement) -> Result<ExecResult, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Execute(statement.clone()));
        if state.fail_execute {
            return Err(AdapterError::Decode(String::from("simulated failure")));
        }

        let last_insert_id = if statement.sql().starts_with("INSERT") {
            state.next_insert_id += 1;
            Some(SqlValue::Int(state.next_insert_id))
        } else {
            None
        };
        state.last_insert_id.clone_from(&last_insert_id);
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id,
        })
    }

    fn begin_transaction(&mut self) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Begin);
        state.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Commit);
        state.in_transaction = false;
        Ok(())
    }

    fn roll_back(&mut self) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::RollBack);
        state.in_transaction = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.state.borrow().in_transaction
    }

    fn last_insert_id(&self) -> Option<SqlValue> {
        self.state.borrow().last_insert_id.clone()
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::TableColumns(table.to_string()));
        Ok(state.columns.clone())
    }

    fn cleanup(&mut self) {
        self.state.borrow_mut().calls.push(Call::Cleanup);
    }
}

/// Builds a row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// Routes tracing output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

use crate::{Result, SqlWriter, Value};
use std::sync::Arc;

/// Purpose of a cursor, backends may route reads and writes to different connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Read,
    Write,
}

/// One row produced by a cursor, with the column labels shared across the result set.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: Arc<[String]>,
    pub values: Box<[Value]>,
}

impl RowLabeled {
    pub fn new(labels: Arc<[String]>, values: Box<[Value]>) -> Self {
        Self { labels, values }
    }
}

/// Executed statement state: forward only rows, generated key and affected rows count.
pub trait Cursor: Send {
    fn execute(&mut self, statement: &str, parameters: &[Value]) -> Result<()>;
    /// Execute the same statement once per parameters row.
    fn execute_many(&mut self, statement: &str, rows: &[Vec<Value>]) -> Result<()>;
    /// Column labels of the last executed statement.
    fn columns(&self) -> &[String];
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns()
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
    }
    /// Next row, `None` once exhausted.
    fn fetch(&mut self) -> Result<Option<RowLabeled>>;
    fn last_insert_id(&self) -> Option<Value>;
    fn rows_affected(&self) -> u64;
    fn close(&mut self) -> Result<()>;
}

/// Capability object implemented by each backend.
pub trait Backend: Send {
    fn name(&self) -> &'static str;
    /// Dialect used to render the statements executed through this backend.
    fn sql_writer(&self) -> Box<dyn SqlWriter>;
    /// Connect or reuse the live connection, returns whether a new one was established.
    fn connect(&mut self) -> Result<bool>;
    fn close(&mut self) -> Result<()>;
    /// Liveness probe.
    fn is_active(&mut self) -> bool;
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    fn cursor(&mut self, intent: Intent) -> Result<Box<dyn Cursor>>;
    fn last_insert_id(&self, cursor: &dyn Cursor) -> Option<Value> {
        cursor.last_insert_id()
    }
    fn rows_affected(&self, cursor: &dyn Cursor) -> u64 {
        cursor.rows_affected()
    }
}

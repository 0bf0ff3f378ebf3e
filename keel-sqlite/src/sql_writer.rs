use keel_core::{Context, SqlWriter};
use std::fmt::Write;

/// SQLite dialect: `?` placeholders and `LIMIT -1` to express an offset without limit.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for SqliteSqlWriter {
    fn write_select_with_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        offset: u64,
    ) {
        let _ = write!(out, "{} LIMIT -1 OFFSET {}", query, offset);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }
}

use crate::{Context, SqlWriter, writer::write_integer};
use std::fmt::Write;

/// MySQL dialect, `%s` placeholders and `LIMIT offset, count` pagination.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlSqlWriter {}

impl MySqlSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for MySqlSqlWriter {
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push_str("%s");
    }

    fn write_select_with_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        offset: u64,
    ) {
        let _ = write!(out, "{} LIMIT ", query);
        write_integer!(out, offset);
        out.push_str(", 18446744073709551615");
    }

    fn write_select_with_pagination(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        limit: u64,
        offset: u64,
    ) {
        let _ = write!(out, "{} LIMIT ", query);
        write_integer!(out, offset);
        out.push_str(", ");
        write_integer!(out, limit);
    }

    fn write_select_with_count(&self, _context: &mut Context, out: &mut String, query: &str) {
        let _ = write!(out, "SELECT COUNT(*) FROM ({}) as t0", query);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("START TRANSACTION");
    }
}

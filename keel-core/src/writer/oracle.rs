use crate::{Context, FieldKind, OpCode, SqlWriter, Value, writer::write_integer};
use std::fmt::Write;

/// Oracle dialect: numbered `:aN` placeholders, ROWNUM pagination and `REGEXP_LIKE` for the case
/// insensitive operators.
#[derive(Default, Debug, Clone, Copy)]
pub struct OracleSqlWriter {}

impl OracleSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for OracleSqlWriter {
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        out.push_str(":a");
        write_integer!(out, context.counter);
        context.counter += 1;
    }

    fn write_operation(
        &self,
        context: &mut Context,
        out: &mut String,
        op: OpCode,
        column: &str,
        values: &[String],
    ) {
        if op.is_case_insensitive() {
            let value = values.first().map(String::as_str).unwrap_or_default();
            let _ = write!(out, "REGEXP_LIKE({}, {}, 'i')", column, value);
            return;
        }
        crate::GenericSqlWriter::new().write_operation(context, out, op, column, values);
    }

    fn cast_value(&self, op: OpCode, kind: FieldKind, values: &mut [Value]) {
        if !op.is_case_insensitive() {
            crate::GenericSqlWriter::new().cast_value(op, kind, values);
            return;
        }
        let Some(Value::Varchar(Some(value))) = values.first_mut() else {
            return;
        };
        let pattern = value.replace('.', "\\.").replace('*', ".*");
        *value = match op {
            OpCode::IEq => format!("^{}$", pattern),
            OpCode::IStartsWith => format!("^{}", pattern),
            _ => pattern,
        };
    }

    fn write_insert_with_lastid(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &str,
        columns: &str,
        values: &str,
        pk_column: &str,
    ) {
        self.write_insert(context, out, table, columns, values);
        let _ = write!(out, " RETURNING {} INTO :insert_id", pk_column);
    }

    fn write_select_with_limit(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        limit: u64,
    ) {
        let _ = write!(out, "SELECT A.*, ROWNUM FROM ({}) A WHERE ROWNUM <= ", query);
        write_integer!(out, limit);
    }

    fn write_select_with_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        offset: u64,
    ) {
        let _ = write!(out, "SELECT A.*, ROWNUM FROM ({}) A WHERE ROWNUM >= ", query);
        write_integer!(out, offset);
    }

    fn write_select_with_pagination(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        limit: u64,
        offset: u64,
    ) {
        let _ = write!(
            out,
            "SELECT * FROM (SELECT A.*, ROWNUM r_num FROM ({}) A WHERE ROWNUM <= ",
            query
        );
        write_integer!(out, limit);
        out.push_str(") WHERE r_num >= ");
        write_integer!(out, offset);
    }

    fn write_select_with_count(&self, _context: &mut Context, out: &mut String, query: &str) {
        let _ = write!(out, "SELECT COUNT(1) FROM ({})", query);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("SET TRANSACTION READ WRITE");
    }
}

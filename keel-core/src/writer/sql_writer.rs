use crate::{
    Connector, FieldKind, Fragment, JoinType, OpCode, Order, Value, separated_by, writer::Context,
};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
pub(crate) use write_integer;

/// Rendered pieces of a select statement, empty pieces are omitted.
#[derive(Default, Debug, Clone, Copy)]
pub struct SelectParts<'a> {
    pub distinct: bool,
    pub columns: &'a str,
    pub table: &'a str,
    pub join: &'a str,
    pub condition: &'a str,
    pub group_by: &'a str,
    pub having: &'a str,
    pub order_by: &'a str,
}

/// Dialect printer converting the query builders' pieces into concrete SQL.
///
/// Every method has the generic rendering as default, dialects override the ones whose syntax
/// differs. Values never appear inline, they are bound through [`SqlWriter::write_placeholder`].
pub trait SqlWriter: Send + Sync {
    /// Whether the current fragment context allows alias declaration.
    fn alias_declaration(&self, context: &mut Context) -> bool {
        matches!(
            context.fragment,
            Fragment::SqlSelectFrom | Fragment::SqlJoin
        )
    }

    /// Interpolation token for the next bound parameter.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push('?');
    }

    fn write_connector(&self, _context: &mut Context, out: &mut String, connector: Connector) {
        out.push_str(match connector {
            Connector::And => " AND ",
            Connector::Or => " OR ",
            Connector::Comma => ", ",
        });
    }

    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: JoinType) {
        out.push_str(match join_type {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT OUTER",
            JoinType::Right => "RIGHT OUTER",
            JoinType::Outer => "FULL OUTER",
        });
    }

    fn write_order(&self, _context: &mut Context, out: &mut String, order: Order) {
        out.push_str(match order {
            Order::ASC => "ASC",
            Order::DESC => "DESC",
        });
    }

    /// Render a table, declaring its alias where the fragment allows it.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, table: &str, alias: &str) {
        out.push_str(table);
        if !alias.is_empty() && self.alias_declaration(context) {
            let _ = write!(out, " {}", alias);
        }
    }

    /// Render a column, prefixed with the table alias when columns are qualified.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, alias: &str, column: &str) {
        if context.qualify_columns && !alias.is_empty() {
            let _ = write!(out, "{}.", alias);
        }
        out.push_str(column);
    }

    fn write_column_with_alias(
        &self,
        _context: &mut Context,
        out: &mut String,
        column: &str,
        alias: &str,
    ) {
        let _ = write!(out, "{} AS {}", column, alias);
    }

    /// Render one condition, `values` are the already rendered placeholders or subquery.
    fn write_operation(
        &self,
        _context: &mut Context,
        out: &mut String,
        op: OpCode,
        column: &str,
        values: &[String],
    ) {
        let value = values.first().map(String::as_str).unwrap_or_default();
        let _ = match op {
            OpCode::Eq => write!(out, "{} = {}", column, value),
            OpCode::Ne => write!(out, "{} != {}", column, value),
            OpCode::Lt => write!(out, "{} < {}", column, value),
            OpCode::Lte => write!(out, "{} <= {}", column, value),
            OpCode::Gt => write!(out, "{} > {}", column, value),
            OpCode::Gte => write!(out, "{} >= {}", column, value),
            OpCode::IsNull | OpCode::Is => write!(out, "{} IS NULL", column),
            OpCode::IsNotNull => write!(out, "{} IS NOT NULL", column),
            OpCode::In | OpCode::NotIn => {
                out.push_str(column);
                out.push_str(if op == OpCode::In { " IN (" } else { " NOT IN (" });
                separated_by(out, values, |out, v| out.push_str(v), ", ");
                out.push(')');
                Ok(())
            }
            OpCode::Between => write!(
                out,
                "{} BETWEEN {} AND {}",
                column,
                value,
                values.get(1).map(String::as_str).unwrap_or_default()
            ),
            OpCode::Contains | OpCode::StartsWith => write!(out, "{} LIKE {}", column, value),
            OpCode::IEq => write!(out, "LOWER({}) = LOWER({})", column, value),
            OpCode::IContains | OpCode::IStartsWith => {
                write!(out, "LOWER({}) LIKE LOWER({})", column, value)
            }
        };
    }

    /// Operator specific transformation of the bound values.
    fn cast_value(&self, op: OpCode, _kind: FieldKind, values: &mut [Value]) {
        let Some(Value::Varchar(Some(value))) = values.first_mut() else {
            return;
        };
        match op {
            OpCode::Contains | OpCode::IContains => *value = format!("%{}%", value),
            OpCode::StartsWith | OpCode::IStartsWith => value.push('%'),
            _ => {}
        }
    }

    fn write_negated(&self, _context: &mut Context, out: &mut String, statement: &str) {
        let _ = write!(out, "NOT {}", statement);
    }

    fn write_combine(&self, _context: &mut Context, out: &mut String, statement: &str) {
        let _ = write!(out, "({})", statement);
    }

    fn write_negated_combine(&self, _context: &mut Context, out: &mut String, statement: &str) {
        let _ = write!(out, "NOT ({})", statement);
    }

    fn write_join_clause(
        &self,
        context: &mut Context,
        out: &mut String,
        join_type: JoinType,
        table: &str,
        alias: &str,
        on: &str,
    ) {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_join_type(&mut context.current, out, join_type);
        out.push_str(" JOIN ");
        self.write_table_ref(&mut context.current, out, table, alias);
        let _ = write!(out, " ON {}", on);
    }

    fn write_insert(
        &self,
        _context: &mut Context,
        out: &mut String,
        table: &str,
        columns: &str,
        values: &str,
    ) {
        let _ = write!(out, "INSERT INTO {} ({}) VALUES ({})", table, columns, values);
    }

    /// Insert requesting the generated primary key back.
    fn write_insert_with_lastid(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &str,
        columns: &str,
        values: &str,
        _pk_column: &str,
    ) {
        self.write_insert(context, out, table, columns, values);
    }

    fn write_update(
        &self,
        _context: &mut Context,
        out: &mut String,
        table: &str,
        set: &str,
        condition: &str,
    ) {
        let _ = write!(out, "UPDATE {} SET {}", table, set);
        if !condition.is_empty() {
            let _ = write!(out, " WHERE {}", condition);
        }
    }

    fn write_delete(&self, _context: &mut Context, out: &mut String, table: &str, condition: &str) {
        let _ = write!(out, "DELETE FROM {}", table);
        if !condition.is_empty() {
            let _ = write!(out, " WHERE {}", condition);
        }
    }

    fn write_select(&self, _context: &mut Context, out: &mut String, parts: &SelectParts) {
        out.push_str("SELECT ");
        if parts.distinct {
            out.push_str("DISTINCT ");
        }
        let _ = write!(out, "{} FROM {}", parts.columns, parts.table);
        for (keyword, part) in [
            ("", parts.join),
            ("WHERE ", parts.condition),
            ("GROUP BY ", parts.group_by),
            ("HAVING ", parts.having),
            ("ORDER BY ", parts.order_by),
        ] {
            if !part.is_empty() {
                let _ = write!(out, " {}{}", keyword, part);
            }
        }
    }

    fn write_select_with_limit(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        limit: u64,
    ) {
        let _ = write!(out, "{} LIMIT ", query);
        write_integer!(out, limit);
    }

    fn write_select_with_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        query: &str,
        offset: u64,
    ) {
        let _ = write!(out, "{} OFFSET ", query);
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
        let _ = write!(out, "{} LIMIT ", query);
        write_integer!(out, limit);
        out.push_str(" OFFSET ");
        write_integer!(out, offset);
    }

    fn write_select_with_count(&self, _context: &mut Context, out: &mut String, query: &str) {
        let _ = write!(out, "SELECT COUNT(*) FROM ({}) AS t0", query);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN TRANSACTION");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }
}

/// Standard SQL rendering, `?` placeholders.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}

use crate::{
    Condition, Connector, Context, Expression, ExpressionSet, Field, Operand, Query, Result, Selection,
    SqlWriter, Value, separated_by,
};
use indexmap::IndexMap;

/// Where clause accumulated by the filtered statements, an AND set of conditions.
#[derive(Debug, Clone)]
pub struct Filter(ExpressionSet);

impl Default for Filter {
    fn default() -> Self {
        Self(ExpressionSet::empty(Connector::And))
    }
}

impl Filter {
    pub fn condition(&self) -> &ExpressionSet {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// AND `condition` onto the accumulated conditions.
    pub(crate) fn push(&mut self, condition: impl Into<Condition>) {
        let current = std::mem::replace(&mut self.0, ExpressionSet::empty(Connector::And));
        self.0 = current.and(condition);
    }

    pub(crate) fn extend(&mut self, expressions: Vec<Expression>) {
        if !expressions.is_empty() {
            self.push(ExpressionSet::new(Connector::And, expressions));
        }
    }

    /// Render the accumulated conditions, `aliases` maps model names to table aliases.
    pub(crate) fn write(
        &self,
        writer: &dyn SqlWriter,
        context: &mut Context,
        out: &mut String,
        parameters: &mut Vec<Value>,
        aliases: &IndexMap<String, String>,
    ) -> Result<()> {
        write_set(writer, context, out, parameters, &self.0, aliases)
    }
}

pub(crate) fn alias_of<'a>(aliases: &'a IndexMap<String, String>, field: &Field) -> &'a str {
    aliases
        .get(field.model())
        .map(String::as_str)
        .unwrap_or_default()
}

pub(crate) fn write_column(
    writer: &dyn SqlWriter,
    context: &mut Context,
    out: &mut String,
    field: &Field,
    aliases: &IndexMap<String, String>,
) {
    writer.write_column_ref(context, out, alias_of(aliases, field), field.column());
}

fn write_set(
    writer: &dyn SqlWriter,
    context: &mut Context,
    out: &mut String,
    parameters: &mut Vec<Value>,
    set: &ExpressionSet,
    aliases: &IndexMap<String, String>,
) -> Result<()> {
    let mut items = Vec::with_capacity(set.children.len());
    for child in &set.children {
        let mut item = String::new();
        match child {
            Condition::Set(v) => write_set(writer, context, &mut item, parameters, v, aliases)?,
            Condition::Expression(v) => {
                write_expression(writer, context, &mut item, parameters, v, aliases)?
            }
        }
        items.push(item);
    }
    let mut separator = String::new();
    writer.write_connector(context, &mut separator, set.connector);
    let mut joined = String::new();
    separated_by(&mut joined, &items, |out, v| out.push_str(v), &separator);
    if joined.is_empty() {
        return Ok(());
    }
    let mut combined = String::new();
    writer.write_combine(context, &mut combined, &joined);
    if set.negated {
        writer.write_negated(context, out, &combined);
    } else {
        out.push_str(&combined);
    }
    Ok(())
}

fn write_expression(
    writer: &dyn SqlWriter,
    context: &mut Context,
    out: &mut String,
    parameters: &mut Vec<Value>,
    expression: &Expression,
    aliases: &IndexMap<String, String>,
) -> Result<()> {
    let field = &expression.field;
    let mut values = Vec::new();
    let mut data = Vec::new();
    match &expression.value {
        _ if expression.op.is_null_test() => {}
        Operand::Query(query) => {
            let mut query = (**query).clone();
            if query.is_default_selection() {
                let pk = query.model().pk().clone();
                query = query.fields([Selection::Field(pk)]);
            }
            let mut statement = String::new();
            query.write_query(writer, context, &mut statement, &mut data)?;
            values.push(statement);
        }
        Operand::List(list) => {
            for value in list {
                let mut placeholder = String::new();
                writer.write_placeholder(context, &mut placeholder);
                values.push(placeholder);
                data.push(field.to_storage(value.clone())?);
            }
        }
        Operand::Value(value) if !value.is_null() => {
            let mut placeholder = String::new();
            writer.write_placeholder(context, &mut placeholder);
            values.push(placeholder);
            data.push(field.to_storage(value.clone())?);
        }
        Operand::Value(..) => {}
    }
    let mut column = String::new();
    write_column(writer, context, &mut column, field, aliases);
    let mut statement = String::new();
    writer.write_operation(context, &mut statement, expression.op, &column, &values);
    if expression.negated {
        writer.write_negated_combine(context, out, &statement);
    } else {
        out.push_str(&statement);
    }
    if !matches!(expression.value, Operand::Query(..)) {
        writer.cast_value(expression.op, field.kind(), &mut data);
    }
    parameters.extend(data);
    Ok(())
}

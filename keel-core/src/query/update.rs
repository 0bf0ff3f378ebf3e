use super::search::write_column;
use crate::{
    Condition, Context, Expression, Filter, Fragment, KeelError, Model, OpCode, Operand, Query,
    Result, SqlWriter, Value, separated_by,
};
use indexmap::IndexMap;

/// Update statement builder.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    model: Model,
    data: IndexMap<String, Value>,
    filter: Filter,
}

impl UpdateQuery {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            data: Default::default(),
            filter: Default::default(),
        }
    }

    /// Accumulate the values to assign.
    pub fn set<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.data.extend(
            values
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.into())),
        );
        self
    }

    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.filter.push(condition);
        self
    }

    pub fn filter_by<I, K, V>(mut self, filters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        let expressions = Expression::convert(&self.model, filters)?;
        self.filter.extend(expressions);
        Ok(self)
    }
}

impl Query for UpdateQuery {
    /// Affected rows.
    type Output = u64;

    fn model(&self) -> &Model {
        &self.model
    }

    fn sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        let mut context = Context::new(Fragment::SqlUpdateSet, false);
        let mut data = self.data.iter().collect::<Vec<_>>();
        data.sort_by(|a, b| a.0.cmp(b.0));
        let mut items = Vec::with_capacity(data.len());
        let mut parameters = Vec::with_capacity(data.len());
        for (name, value) in data {
            let Some(field) = self.model.field(name) else {
                continue;
            };
            if value.is_null() && !field.is_nullable() {
                return Err(KeelError::validation(format!(
                    "Field {}.{} is not nullable",
                    self.model.name(),
                    field.name()
                )));
            }
            let mut column = String::new();
            write_column(writer, &mut context, &mut column, field, &IndexMap::new());
            let mut placeholder = String::new();
            writer.write_placeholder(&mut context, &mut placeholder);
            let mut item = String::new();
            writer.write_operation(&mut context, &mut item, OpCode::Eq, &column, &[placeholder]);
            items.push(item);
            parameters.push(field.to_storage(value.clone())?);
        }
        let mut set = String::new();
        separated_by(&mut set, &items, |out, v| out.push_str(v), ", ");
        let mut condition = String::new();
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            self.filter.write(
                writer,
                &mut context.current,
                &mut condition,
                &mut parameters,
                &IndexMap::new(),
            )?;
        }
        let mut out = String::new();
        writer.write_update(&mut context, &mut out, self.model.table(), &set, &condition);
        Ok((out, parameters))
    }

    fn execute(&self) -> Result<u64> {
        let database = self.model.database()?;
        let (statement, parameters) = self.sql_with(database.sql_writer())?;
        let mut cursor = database.execute_write(&statement, &parameters)?;
        let rows = database.rows_affected(&*cursor)?;
        cursor.close()?;
        Ok(rows)
    }
}

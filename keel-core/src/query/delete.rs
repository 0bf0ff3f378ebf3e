use crate::{
    Condition, Context, Expression, Filter, Fragment, Model, Operand, Query, Result, SqlWriter,
    Value,
};
use indexmap::IndexMap;

/// Delete statement builder.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    model: Model,
    filter: Filter,
}

impl DeleteQuery {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            filter: Default::default(),
        }
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

impl Query for DeleteQuery {
    /// Affected rows.
    type Output = u64;

    fn model(&self) -> &Model {
        &self.model
    }

    fn sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        let mut context = Context::new(Fragment::SqlDeleteFromWhere, false);
        let mut condition = String::new();
        let mut parameters = Vec::new();
        self.filter.write(
            writer,
            &mut context,
            &mut condition,
            &mut parameters,
            &IndexMap::new(),
        )?;
        let mut out = String::new();
        writer.write_delete(&mut context, &mut out, self.model.table(), &condition);
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

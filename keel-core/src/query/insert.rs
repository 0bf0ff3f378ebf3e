use crate::{Context, Fragment, KeelError, Model, Query, Result, SqlWriter, Value, separated_by};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
enum InsertData {
    Values(IndexMap<String, Value>),
    Bulk {
        names: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

/// Insert statement builder, a single row or the same statement over many rows.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    model: Model,
    data: InsertData,
}

impl InsertQuery {
    /// Single row insert starting from the model's defaults.
    pub fn new(model: Model) -> Self {
        let data = InsertData::Values(model.defaults().clone());
        Self { model, data }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self.data, InsertData::Bulk { .. })
    }

    /// Merge field values, switching a bulk insert back to a single row one.
    pub fn set<I, K, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        if self.is_bulk() {
            self.data = InsertData::Values(self.model.defaults().clone());
        }
        let InsertData::Values(data) = &mut self.data else {
            return Ok(self);
        };
        for (name, value) in values {
            let name = name.as_ref();
            let Some(field) = self.model.field(name) else {
                log::debug!("Skipping the value of {}, {} has no such field", name, self.model.name());
                continue;
            };
            data.insert(field.name().to_string(), field.to_application(value.into())?);
        }
        Ok(self)
    }

    /// Bulk insert of `rows`, each one holding the values of `names` in order.
    pub fn set_bulk<N: AsRef<str>>(
        mut self,
        names: impl IntoIterator<Item = N>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let names = names
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>();
        if names.is_empty() || rows.is_empty() {
            return Err(KeelError::validation(
                "Not enough arguments for bulk insert",
            ));
        }
        for name in &names {
            if self.model.field(name).is_none() {
                return Err(KeelError::query(format!(
                    "Field {} is not defined in model {}",
                    name,
                    self.model.name()
                )));
            }
        }
        if let Some(row) = rows.iter().find(|v| v.len() != names.len()) {
            return Err(KeelError::validation(format!(
                "Bulk insert row has {} values for {} columns",
                row.len(),
                names.len()
            )));
        }
        self.data = InsertData::Bulk { names, rows };
        Ok(self)
    }

    /// Statement and the parameters of every row to execute it with.
    fn render(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Vec<Value>>)> {
        let mut context = Context::new(Fragment::SqlInsertInto, false);
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut out = String::new();
        let rows = match &self.data {
            InsertData::Values(data) => {
                let mut data = data.iter().collect::<Vec<_>>();
                data.sort_by(|a, b| a.0.cmp(b.0));
                let mut parameters = Vec::new();
                for (name, value) in data {
                    let Some(field) = self.model.field(name) else {
                        continue;
                    };
                    if !value.is_null() || field.is_nullable() {
                        columns.push(field.column());
                        let mut placeholder = String::new();
                        writer.write_placeholder(&mut context, &mut placeholder);
                        placeholders.push(placeholder);
                        parameters.push(field.to_storage(value.clone())?);
                    }
                }
                let (columns, values) = Self::join(&columns, &placeholders);
                writer.write_insert_with_lastid(
                    &mut context,
                    &mut out,
                    self.model.table(),
                    &columns,
                    &values,
                    self.model.pk().column(),
                );
                vec![parameters]
            }
            InsertData::Bulk { names, rows } => {
                let fields = names
                    .iter()
                    .map(|v| self.model.field_or_err(v))
                    .collect::<Result<Vec<_>>>()?;
                for field in &fields {
                    columns.push(field.column());
                    let mut placeholder = String::new();
                    writer.write_placeholder(&mut context, &mut placeholder);
                    placeholders.push(placeholder);
                }
                let (columns, values) = Self::join(&columns, &placeholders);
                writer.write_insert(&mut context, &mut out, self.model.table(), &columns, &values);
                rows.iter()
                    .map(|row| {
                        row.iter()
                            .zip(&fields)
                            .map(|(value, field)| field.to_storage(value.clone()))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };
        Ok((out, rows))
    }

    fn join(columns: &[&str], placeholders: &[String]) -> (String, String) {
        let mut a = String::new();
        separated_by(&mut a, columns, |out, v| out.push_str(v), ", ");
        let mut b = String::new();
        separated_by(&mut b, placeholders, |out, v| out.push_str(v), ", ");
        (a, b)
    }
}

impl Query for InsertQuery {
    /// Generated primary key, `None` unless the model is auto increment.
    type Output = Option<Value>;

    fn model(&self) -> &Model {
        &self.model
    }

    /// Parameters of a bulk insert are the rows flattened.
    fn sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        let (statement, rows) = self.render(writer)?;
        Ok((statement, rows.into_iter().flatten().collect()))
    }

    fn execute(&self) -> Result<Option<Value>> {
        let database = self.model.database()?;
        let (statement, rows) = self.render(database.sql_writer())?;
        let mut cursor = if self.is_bulk() {
            database.execute_write_many(&statement, &rows)?
        } else {
            database.execute_write(&statement, rows.first().map(Vec::as_slice).unwrap_or_default())?
        };
        let id = database.last_insert_id(&*cursor)?;
        cursor.close()?;
        Ok(id.filter(|v| self.model.is_auto_increment() && !v.is_null()))
    }
}

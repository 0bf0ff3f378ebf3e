use crate::{Model, Query, QueryResult, Result, SqlWriter, Value};

/// Literal statement with positional parameters, executed with write intent.
#[derive(Debug, Clone)]
pub struct RawQuery {
    model: Model,
    statement: String,
    parameters: Vec<Value>,
}

impl RawQuery {
    pub fn new(model: Model, statement: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            model,
            statement: statement.into(),
            parameters,
        }
    }

    pub fn statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

impl Query for RawQuery {
    type Output = QueryResult;

    fn model(&self) -> &Model {
        &self.model
    }

    fn sql_with(&self, _writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        Ok((self.statement.clone(), self.parameters.clone()))
    }

    fn execute(&self) -> Result<QueryResult> {
        let database = self.model.database()?;
        let cursor = database.execute_write(&self.statement, &self.parameters)?;
        Ok(QueryResult::new(self.model.clone(), cursor, true, Vec::new()))
    }
}

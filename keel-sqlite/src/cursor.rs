use crate::extract::{Parameter, extract_value};
use keel_core::{Cursor, Error, Result, RowLabeled, Value};
use rusqlite::{Connection, params_from_iter};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

/// Cursor over a shared connection, the rows of a query are read eagerly on execution.
pub struct SqliteCursor {
    connection: Option<Arc<Mutex<Connection>>>,
    labels: Arc<[String]>,
    rows: VecDeque<RowLabeled>,
    last_insert_id: Option<Value>,
    rows_affected: u64,
}

impl SqliteCursor {
    pub(crate) fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection: Some(connection),
            labels: Arc::new([]),
            rows: VecDeque::new(),
            last_insert_id: None,
            rows_affected: 0,
        }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        let Some(connection) = &self.connection else {
            return Err(Error::msg("The cursor is closed"));
        };
        connection
            .lock()
            .map_err(|_| Error::msg("The sqlite connection lock is poisoned"))
    }
}

impl Cursor for SqliteCursor {
    fn execute(&mut self, statement: &str, parameters: &[Value]) -> Result<()> {
        let connection = self.connection()?;
        let mut prepared = connection.prepare(statement)?;
        let labels = prepared
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Arc<[String]>>();
        let count = labels.len();
        let parameters = params_from_iter(parameters.iter().map(Parameter));
        let mut rows = VecDeque::new();
        let mut rows_affected = 0;
        if count == 0 {
            rows_affected = prepared.execute(parameters)? as u64;
        } else {
            let mut result = prepared.query(parameters)?;
            while let Some(row) = result.next()? {
                let values = (0..count)
                    .map(|i| extract_value(row, i))
                    .collect::<Result<Box<[_]>>>()?;
                rows.push_back(RowLabeled::new(labels.clone(), values));
            }
        }
        let last_insert_id = Value::Int64(Some(connection.last_insert_rowid()));
        drop(prepared);
        drop(connection);
        self.labels = labels;
        self.rows = rows;
        self.rows_affected = rows_affected;
        self.last_insert_id = Some(last_insert_id);
        Ok(())
    }

    fn execute_many(&mut self, statement: &str, rows: &[Vec<Value>]) -> Result<()> {
        let connection = self.connection()?;
        let mut prepared = connection.prepare(statement)?;
        let mut rows_affected = 0;
        for row in rows {
            rows_affected += prepared.execute(params_from_iter(row.iter().map(Parameter)))? as u64;
        }
        let last_insert_id = Value::Int64(Some(connection.last_insert_rowid()));
        drop(prepared);
        drop(connection);
        self.labels = Arc::new([]);
        self.rows.clear();
        self.rows_affected = rows_affected;
        self.last_insert_id = Some(last_insert_id);
        Ok(())
    }

    fn columns(&self) -> &[String] {
        &self.labels
    }

    fn fetch(&mut self) -> Result<Option<RowLabeled>> {
        Ok(self.rows.pop_front())
    }

    fn last_insert_id(&self) -> Option<Value> {
        self.last_insert_id.clone()
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    fn close(&mut self) -> Result<()> {
        self.connection = None;
        self.rows.clear();
        Ok(())
    }
}

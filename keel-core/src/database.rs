use crate::{
    Backend, Cursor, Error, Intent, KeelError, Result, SqlWriter, Value, truncate_long,
};
use std::{
    fmt::{self, Debug},
    sync::{Arc, Mutex, MutexGuard},
};

/// Shared handle to a backend, bound to the models that live on it.
///
/// The backend sits behind a mutex: connection establishment, liveness checks and transactions
/// are serialized. Cursors are independent once returned.
pub struct Database {
    name: &'static str,
    writer: Box<dyn SqlWriter>,
    backend: Mutex<Box<dyn Backend>>,
}

impl Database {
    pub fn new(backend: impl Backend + 'static) -> Arc<Self> {
        Arc::new(Self {
            name: backend.name(),
            writer: backend.sql_writer(),
            backend: Mutex::new(Box::new(backend)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sql_writer(&self) -> &dyn SqlWriter {
        self.writer.as_ref()
    }

    fn backend(&self) -> Result<MutexGuard<'_, Box<dyn Backend>>> {
        self.backend.lock().map_err(|_| {
            let error = Error::msg(format!("The {} backend lock is poisoned", self.name));
            log::error!("{}", error);
            error
        })
    }

    /// Connect or reuse the connection, returns whether a new one was established.
    pub fn connect(&self) -> Result<bool> {
        let is_new = self.backend()?.connect()?;
        if is_new {
            log::info!("Connected to the {} backend", self.name);
        }
        Ok(is_new)
    }

    pub fn is_active(&self) -> bool {
        self.backend().map(|mut v| v.is_active()).unwrap_or(false)
    }

    pub fn close(&self) -> Result<()> {
        self.backend()?.close()?;
        log::info!("Closed the {} backend connection", self.name);
        Ok(())
    }

    fn cursor(backend: &mut dyn Backend, intent: Intent) -> Result<Box<dyn Cursor>> {
        if backend.connect()? {
            log::info!("Connected to the {} backend", backend.name());
        }
        backend.cursor(intent)
    }

    fn run(
        cursor: &mut dyn Cursor,
        statement: &str,
        parameters: &[Value],
        execute: impl FnOnce(&mut dyn Cursor) -> Result<()>,
    ) -> Result<()> {
        log::debug!(
            "{} {:?}",
            truncate_long!(statement),
            parameters
        );
        if let Err(e) = execute(cursor) {
            if let Err(e) = cursor.close() {
                log::error!("{:#}", e);
            }
            let error = KeelError::database(e, statement, parameters);
            log::error!("{}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Execute a read statement, the returned cursor holds the rows.
    pub fn execute_read(&self, statement: &str, parameters: &[Value]) -> Result<Box<dyn Cursor>> {
        let mut backend = self.backend()?;
        let mut cursor = Self::cursor(&mut **backend, Intent::Read)?;
        drop(backend);
        Self::run(&mut *cursor, statement, parameters, |c| {
            c.execute(statement, parameters)
        })?;
        Ok(cursor)
    }

    /// Execute a write statement inside a transaction.
    pub fn execute_write(&self, statement: &str, parameters: &[Value]) -> Result<Box<dyn Cursor>> {
        self.commit_on_success(|backend| {
            let mut cursor = Self::cursor(backend, Intent::Write)?;
            Self::run(&mut *cursor, statement, parameters, |c| {
                c.execute(statement, parameters)
            })?;
            Ok(cursor)
        })
    }

    /// Execute a write statement once per row, inside a single transaction.
    pub fn execute_write_many(
        &self,
        statement: &str,
        rows: &[Vec<Value>],
    ) -> Result<Box<dyn Cursor>> {
        self.commit_on_success(|backend| {
            let mut cursor = Self::cursor(backend, Intent::Write)?;
            let flat = rows.iter().flatten().cloned().collect::<Vec<_>>();
            Self::run(&mut *cursor, statement, &flat, |c| {
                c.execute_many(statement, rows)
            })?;
            Ok(cursor)
        })
    }

    /// Run `f` between begin and commit, rolling back when it fails.
    pub fn commit_on_success<T>(
        &self,
        f: impl FnOnce(&mut dyn Backend) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.backend()?;
        let backend: &mut dyn Backend = &mut **guard;
        if backend.connect()? {
            log::info!("Connected to the {} backend", backend.name());
        }
        backend.begin()?;
        match f(backend) {
            Ok(v) => {
                backend.commit()?;
                Ok(v)
            }
            Err(e) => {
                log::warn!("Rolling back the transaction: {:#}", e);
                if let Err(rollback) = backend.rollback() {
                    log::error!("{:#}", rollback);
                }
                Err(e)
            }
        }
    }

    pub fn last_insert_id(&self, cursor: &dyn Cursor) -> Result<Option<Value>> {
        Ok(self.backend()?.last_insert_id(cursor))
    }

    pub fn rows_affected(&self, cursor: &dyn Cursor) -> Result<u64> {
        Ok(self.backend()?.rows_affected(cursor))
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

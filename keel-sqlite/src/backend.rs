use crate::{SqliteCursor, SqliteSqlWriter};
use keel_core::{Backend, Cursor, Error, Intent, Result, SqlWriter};
use rusqlite::{Connection, OpenFlags};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone)]
enum Location {
    Memory,
    File(PathBuf, OpenFlags),
}

/// Blocking SQLite backend, every cursor shares the backend's single connection.
pub struct SqliteBackend {
    location: Location,
    writer: SqliteSqlWriter,
    connection: Option<Arc<Mutex<Connection>>>,
}

impl SqliteBackend {
    pub const NAME: &'static str = "sqlite";

    /// Backend for `sqlite://:memory:` or `sqlite://<path>[?mode=ro|rw|rwc]`, the database is
    /// opened lazily on the first connect.
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let prefix = format!("{}://", Self::NAME);
        let Some(rest) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key != "mode" {
                log::warn!("Ignoring the sqlite connection parameter `{}`", key);
                continue;
            }
            flags = match value.as_ref() {
                "ro" => OpenFlags::SQLITE_OPEN_READ_ONLY,
                "rw" => OpenFlags::SQLITE_OPEN_READ_WRITE,
                "rwc" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                "memory" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_MEMORY,
                _ => {
                    let error = Error::msg(format!("Unknown sqlite open mode `{}`", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
        }
        let location = if path.is_empty() || path == ":memory:" {
            Location::Memory
        } else {
            Location::File(PathBuf::from(path), flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        };
        Ok(Self {
            location,
            writer: SqliteSqlWriter::new(),
            connection: None,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            writer: SqliteSqlWriter::new(),
            connection: None,
        }
    }

    fn open(&self) -> Result<Connection> {
        Ok(match &self.location {
            Location::Memory => Connection::open_in_memory()?,
            Location::File(path, flags) => Connection::open_with_flags(path, *flags)?,
        })
    }

    fn execute_batch(&mut self, statement: &str) -> Result<()> {
        self.connect()?;
        let Some(connection) = &self.connection else {
            return Err(Error::msg("The sqlite backend is not connected"));
        };
        log::debug!("{}", statement);
        let connection = connection
            .lock()
            .map_err(|_| Error::msg("The sqlite connection lock is poisoned"))?;
        connection.execute_batch(statement).map_err(|e| {
            let error = Error::new(e).context(format!("While executing `{}`", statement));
            log::error!("{:#}", error);
            error
        })
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sql_writer(&self) -> Box<dyn SqlWriter> {
        Box::new(self.writer)
    }

    fn connect(&mut self) -> Result<bool> {
        if self.connection.is_some() && self.is_active() {
            return Ok(false);
        }
        let connection = self.open()?;
        self.connection = Some(Arc::new(Mutex::new(connection)));
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.connection = None;
        Ok(())
    }

    fn is_active(&mut self) -> bool {
        let Some(connection) = &self.connection else {
            return false;
        };
        connection
            .lock()
            .map(|v| v.query_row("SELECT 1", [], |_| Ok(())).is_ok())
            .unwrap_or(false)
    }

    fn begin(&mut self) -> Result<()> {
        let mut statement = String::new();
        self.writer.write_transaction_begin(&mut statement);
        self.execute_batch(&statement)
    }

    fn commit(&mut self) -> Result<()> {
        let mut statement = String::new();
        self.writer.write_transaction_commit(&mut statement);
        self.execute_batch(&statement)
    }

    fn rollback(&mut self) -> Result<()> {
        let mut statement = String::new();
        self.writer.write_transaction_rollback(&mut statement);
        self.execute_batch(&statement)
    }

    fn cursor(&mut self, _intent: Intent) -> Result<Box<dyn Cursor>> {
        self.connect()?;
        let Some(connection) = &self.connection else {
            return Err(Error::msg("The sqlite backend is not connected"));
        };
        Ok(Box::new(SqliteCursor::new(connection.clone())))
    }
}

impl Default for SqliteBackend {
    fn default() -> Self {
        Self::in_memory()
    }
}

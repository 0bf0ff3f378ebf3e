use keel::{Backend, Cursor, Error, GenericSqlWriter, Intent, Result, RowLabeled, SqlWriter, Value};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Default)]
struct Script {
    executed: Vec<(String, Vec<Value>)>,
    events: Vec<String>,
    results: VecDeque<Result<(Arc<[String]>, Vec<Box<[Value]>>)>>,
    last_insert_id: Option<Value>,
    rows_affected: u64,
}

/// Handle to inspect and script a [`RecordingBackend`] after it was moved into a database.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Script>>);

impl Recorder {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rows returned by the next executed statement.
    pub fn push_rows(&self, labels: &[&str], rows: Vec<Vec<Value>>) {
        let labels = labels.iter().map(|v| v.to_string()).collect::<Arc<[_]>>();
        let rows = rows.into_iter().map(Vec::into_boxed_slice).collect();
        self.script().results.push_back(Ok((labels, rows)));
    }

    /// Failure of the next executed statement.
    pub fn push_error(&self, message: &str) {
        self.script()
            .results
            .push_back(Err(Error::msg(message.to_string())));
    }

    pub fn set_last_insert_id(&self, value: impl Into<Value>) {
        self.script().last_insert_id = Some(value.into());
    }

    pub fn set_rows_affected(&self, value: u64) {
        self.script().rows_affected = value;
    }

    /// Executed statements with their parameters, in order.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.script().executed.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.script()
            .executed
            .iter()
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Connection, transaction and cursor events, in order.
    pub fn events(&self) -> Vec<String> {
        self.script().events.clone()
    }

    pub fn clear(&self) {
        let mut script = self.script();
        script.executed.clear();
        script.events.clear();
        script.results.clear();
    }
}

/// In memory backend recording every statement and replaying scripted rows.
pub struct RecordingBackend {
    recorder: Recorder,
    writer: fn() -> Box<dyn SqlWriter>,
    connected: bool,
}

impl RecordingBackend {
    pub fn new() -> (Self, Recorder) {
        Self::with_writer(|| Box::new(GenericSqlWriter::new()))
    }

    pub fn with_writer(writer: fn() -> Box<dyn SqlWriter>) -> (Self, Recorder) {
        let recorder = Recorder::default();
        (
            Self {
                recorder: recorder.clone(),
                writer,
                connected: false,
            },
            recorder,
        )
    }

    fn event(&self, event: &str) {
        self.recorder.script().events.push(event.to_string());
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn sql_writer(&self) -> Box<dyn SqlWriter> {
        (self.writer)()
    }

    fn connect(&mut self) -> Result<bool> {
        if self.connected {
            return Ok(false);
        }
        self.connected = true;
        self.event("connect");
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.event("close");
        Ok(())
    }

    fn is_active(&mut self) -> bool {
        self.connected
    }

    fn begin(&mut self) -> Result<()> {
        self.event("begin");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.event("commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.event("rollback");
        Ok(())
    }

    fn cursor(&mut self, intent: Intent) -> Result<Box<dyn Cursor>> {
        self.event(match intent {
            Intent::Read => "cursor read",
            Intent::Write => "cursor write",
        });
        Ok(Box::new(RecordingCursor {
            recorder: self.recorder.clone(),
            labels: Arc::new([]),
            rows: VecDeque::new(),
            last_insert_id: None,
            rows_affected: 0,
        }))
    }
}

struct RecordingCursor {
    recorder: Recorder,
    labels: Arc<[String]>,
    rows: VecDeque<RowLabeled>,
    last_insert_id: Option<Value>,
    rows_affected: u64,
}

impl Cursor for RecordingCursor {
    fn execute(&mut self, statement: &str, parameters: &[Value]) -> Result<()> {
        let mut script = self.recorder.script();
        script
            .executed
            .push((statement.to_string(), parameters.to_vec()));
        self.last_insert_id = script.last_insert_id.clone();
        self.rows_affected = script.rows_affected;
        let (labels, rows) = script
            .results
            .pop_front()
            .unwrap_or_else(|| Ok((Arc::new([]), Vec::new())))?;
        self.rows = rows
            .into_iter()
            .map(|v| RowLabeled::new(labels.clone(), v))
            .collect();
        self.labels = labels;
        Ok(())
    }

    fn execute_many(&mut self, statement: &str, rows: &[Vec<Value>]) -> Result<()> {
        for row in rows {
            self.execute(statement, row)?;
        }
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
        self.recorder.script().events.push("cursor closed".into());
        Ok(())
    }
}

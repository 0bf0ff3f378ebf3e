use crate::{Cursor, Field, Instance, KeelError, Model, Result, RowLabeled, Value};
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    ops::{Deref, DerefMut},
};

/// Lazy sequence of instances read from an executed select.
///
/// Rows are pulled from the cursor one at a time. In naive mode every row becomes one instance of
/// the root model, in graph mode the row is split by the model each selected field belongs to and
/// the related objects are attached to the root instance. The cursor closes once exhausted.
pub struct QueryResult {
    model: Model,
    cursor: Option<Box<dyn Cursor>>,
    naive: bool,
    fields: Vec<Field>,
    keep_cache: bool,
    cached: Vec<Instance>,
    scoped: bool,
}

impl QueryResult {
    pub fn new(model: Model, cursor: Box<dyn Cursor>, naive: bool, fields: Vec<Field>) -> Self {
        Self {
            model,
            cursor: Some(cursor),
            naive,
            fields,
            keep_cache: false,
            cached: Vec::new(),
            scoped: false,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn is_naive(&self) -> bool {
        self.naive
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Keep every yielded instance so that it can be replayed.
    pub fn cache(&mut self, value: bool) -> &mut Self {
        self.keep_cache = value;
        self
    }

    pub fn close_cursor(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(e) = cursor.close() {
                log::warn!("Could not close the cursor: {:#}", e);
            }
        }
    }

    /// The cached instances, available once the cursor is closed.
    pub fn replay(&self) -> Result<&[Instance]> {
        if self.cursor.is_some() {
            return Err(KeelError::ResultUnavailable(
                "The result is still reading from its cursor".into(),
            )
            .into());
        }
        if self.cached.is_empty() {
            return Err(
                KeelError::ResultUnavailable("Requested data was not cached".into()).into(),
            );
        }
        Ok(&self.cached)
    }

    /// Iterate without closing the cursor on exhaustion, it closes when the guard drops.
    pub fn scoped(&mut self) -> ScopedResult<'_> {
        self.scoped = true;
        ScopedResult(self)
    }

    pub fn collect_all(self) -> Result<Vec<Instance>> {
        self.collect()
    }

    fn materialize(&self, row: RowLabeled) -> Result<Instance> {
        if self.naive {
            return Instance::load(
                &self.model,
                row.labels.iter().map(String::as_str).zip(row.values),
            );
        }
        let mut buckets = IndexMap::<&str, Vec<(&str, Value)>>::new();
        for (field, value) in self.fields.iter().zip(row.values) {
            buckets
                .entry(field.model())
                .or_default()
                .push((field.name(), value));
        }
        Self::assemble(&self.model, &buckets)
    }

    fn assemble(model: &Model, buckets: &IndexMap<&str, Vec<(&str, Value)>>) -> Result<Instance> {
        let values = buckets
            .get(model.name())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut instance = Instance::load(model, values.iter().map(|(k, v)| (*k, v.clone())))?;
        for (name, related) in model.relations() {
            let Some(values) = buckets.get(related.name()) else {
                continue;
            };
            // Outer join without a match
            if values.iter().all(|(_, v)| v.is_null()) {
                continue;
            }
            let Some(reference) = model.field(name).and_then(|v| v.foreign_key()) else {
                continue;
            };
            let child = Self::assemble(related, buckets)?;
            instance.attach(&reference.related_name, child)?;
        }
        Ok(instance)
    }
}

impl Iterator for QueryResult {
    type Item = Result<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match cursor.fetch() {
            Ok(Some(row)) => {
                let result = self.materialize(row);
                if self.keep_cache {
                    if let Ok(instance) = &result {
                        self.cached.push(instance.clone());
                    }
                }
                Some(result)
            }
            Ok(None) => {
                if !self.scoped {
                    self.close_cursor();
                }
                None
            }
            Err(e) => {
                self.close_cursor();
                Some(Err(e))
            }
        }
    }
}

impl Drop for QueryResult {
    fn drop(&mut self) {
        self.close_cursor();
    }
}

impl Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("model", &self.model)
            .field("naive", &self.naive)
            .field("open", &self.is_open())
            .field("cached", &self.cached.len())
            .finish()
    }
}

/// Scoped acquisition of a [`QueryResult`], see [`QueryResult::scoped`].
pub struct ScopedResult<'a>(&'a mut QueryResult);

impl Deref for ScopedResult<'_> {
    type Target = QueryResult;
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl DerefMut for ScopedResult<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl Iterator for ScopedResult<'_> {
    type Item = Result<Instance>;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl Drop for ScopedResult<'_> {
    fn drop(&mut self) {
        self.0.close_cursor();
        self.0.scoped = false;
    }
}

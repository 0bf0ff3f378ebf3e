mod delete;
mod insert;
mod raw;
mod search;
mod select;
mod update;

pub use delete::*;
pub use insert::*;
pub use raw::*;
pub use search::*;
pub use select::*;
pub use update::*;

use crate::{Model, Result, SqlWriter, Value};

/// Statement builder bound to one model and the backend of that model.
///
/// Rendering is pure and can be repeated, `execute` runs the statement once per call.
pub trait Query {
    type Output;

    fn model(&self) -> &Model;

    /// Render the statement text and its ordered parameters with `writer`.
    fn sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)>;

    /// Render with the dialect of the model's database.
    fn sql(&self) -> Result<(String, Vec<Value>)> {
        self.sql_with(self.model().database()?.sql_writer())
    }

    fn execute(&self) -> Result<Self::Output>;
}

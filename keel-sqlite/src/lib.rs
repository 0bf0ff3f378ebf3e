mod backend;
mod cursor;
mod extract;
mod sql_writer;

pub use backend::*;
pub use cursor::*;
pub use sql_writer::*;

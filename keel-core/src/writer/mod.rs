mod context;
mod mysql;
mod oracle;
mod sql_writer;

pub use context::*;
pub use mysql::*;
pub use oracle::*;
pub use sql_writer::*;

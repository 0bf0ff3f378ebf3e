mod as_value;
mod backend;
mod database;
mod error;
mod expression;
mod field;
mod instance;
mod join;
mod model;
mod query;
mod result;
mod session;
mod util;
mod value;
mod writer;

pub use as_value::*;
pub use backend::*;
pub use database::*;
pub use error::*;
pub use expression::*;
pub use field::*;
pub use instance::*;
pub use join::*;
pub use model::*;
pub use query::*;
pub use result::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub use writer::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

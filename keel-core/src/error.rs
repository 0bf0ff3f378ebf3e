use crate::{Error, Value, separated_by};
use std::fmt::Write;

/// Failure categories raised by the mapping layer.
///
/// Always travels inside [`Error`], inspect it with `error.downcast_ref::<KeelError>()`.
#[derive(Debug, thiserror::Error)]
pub enum KeelError {
    /// The request violates a contract before reaching the backend.
    #[error("{0}")]
    Validation(String),
    /// Malformed query construction.
    #[error("{0}")]
    Query(String),
    /// The backend failed while executing a statement, `message` already contains the text of
    /// `native`.
    #[error("{message}")]
    Database {
        message: String,
        statement: String,
        parameters: Vec<Value>,
        native: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// A single row was requested but none matched.
    #[error("No data with the defined conditions")]
    NoData,
    /// The result set cannot be iterated again.
    #[error("{0}")]
    ResultUnavailable(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl KeelError {
    pub fn validation(message: impl Into<String>) -> Error {
        Error::new(KeelError::Validation(message.into()))
    }

    pub fn query(message: impl Into<String>) -> Error {
        Error::new(KeelError::Query(message.into()))
    }

    /// Wrap a native backend error together with the statement that produced it.
    pub fn database(native: Error, statement: &str, parameters: &[Value]) -> Error {
        let mut message = String::new();
        let _ = write!(message, "{:#} (\"{}\" ", native, statement);
        write_parameters(&mut message, parameters);
        message.push(')');
        let message = message.replace(['\n', '\r'], "");
        Error::new(KeelError::Database {
            message,
            statement: statement.to_string(),
            parameters: parameters.to_vec(),
            native: native.into(),
        })
    }

    pub fn is_no_data(error: &Error) -> bool {
        matches!(error.downcast_ref::<KeelError>(), Some(KeelError::NoData))
    }
}

pub(crate) fn write_parameters(out: &mut String, parameters: &[Value]) {
    out.push('[');
    separated_by(
        out,
        parameters,
        |out, v| {
            let _ = write!(out, "{}", v);
        },
        ", ",
    );
    out.push(']');
}

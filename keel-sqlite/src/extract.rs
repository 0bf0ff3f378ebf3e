use keel_core::{Error, Result, Value};
use rusqlite::{
    Row,
    types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef},
};

/// Statement parameter borrowed from a [`Value`].
pub(crate) struct Parameter<'a>(pub(crate) &'a Value);

impl ToSql for Parameter<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Boolean(Some(v)) => ToSqlOutput::Owned(SqliteValue::Integer(*v as i64)),
            Value::Int64(Some(v)) => ToSqlOutput::Owned(SqliteValue::Integer(*v)),
            Value::Float64(Some(v)) => ToSqlOutput::Owned(SqliteValue::Real(*v)),
            Value::Varchar(Some(v)) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Date(Some(..)) | Value::Time(Some(..)) | Value::Timestamp(Some(..)) => {
                match self.0.to_text() {
                    Some(v) => ToSqlOutput::Owned(SqliteValue::Text(v)),
                    None => ToSqlOutput::Owned(SqliteValue::Null),
                }
            }
            _ => ToSqlOutput::Owned(SqliteValue::Null),
        })
    }
}

/// Untyped value of the column `index`, the field kinds convert it on assignment.
pub(crate) fn extract_value(row: &Row, index: usize) -> Result<Value> {
    Ok(match row.get_ref(index)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(String::from_utf8(v.to_vec())?)),
        ValueRef::Blob(..) => {
            let error = Error::msg(format!("Column {} holds a blob, which is not supported", index));
            log::error!("{:#}", error);
            return Err(error);
        }
    })
}

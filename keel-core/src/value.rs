use std::fmt::{self, Display};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};

/// Dynamically typed value moved between instances, parameters and rows.
///
/// Every variant carries an `Option` so that a NULL keeps its type, `Value::Null` is the
/// untyped NULL.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Varchar(Option<String>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (l, r) if l.is_null() && r.is_null() => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    /// The NULL of the same type.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
        }
    }

    /// Truthiness used by keyword filters (`field__isnull=false`).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(Some(v)) => *v,
            Value::Int64(Some(v)) => *v != 0,
            Value::Float64(Some(v)) => *v != 0.0,
            Value::Varchar(Some(v)) => !v.is_empty(),
            v => !v.is_null(),
        }
    }

    /// Textual form used when a backend binds temporal values as text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Boolean(Some(v)) => Some(v.to_string()),
            Value::Int64(Some(v)) => Some(itoa::Buffer::new().format(*v).to_string()),
            Value::Float64(Some(v)) => Some(v.to_string()),
            Value::Varchar(Some(v)) => Some(v.clone()),
            Value::Date(Some(v)) => v.format(format_description!("[year]-[month]-[day]")).ok(),
            Value::Time(Some(v)) => v
                .format(format_description!(
                    "[hour]:[minute]:[second].[subsecond digits:6]"
                ))
                .ok(),
            Value::Timestamp(Some(v)) => v
                .format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
                ))
                .ok(),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            v if v.is_null() => f.write_str("NULL"),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v),
            Value::Date(..) | Value::Time(..) | Value::Timestamp(..) => {
                write!(f, "'{}'", self.to_text().unwrap_or_default())
            }
            v => f.write_str(&v.to_text().unwrap_or_default()),
        }
    }
}

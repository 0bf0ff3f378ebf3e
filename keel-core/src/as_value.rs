use crate::{Error, Result, Value, truncate_long};
use atoi::FromRadix10Signed;
use std::any;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Conversion between native Rust types and the dynamic [`Value`].
///
/// `try_from_value` accepts the canonical variant of the type and a few lossless alternatives
/// (numeric text for numbers, `0`/`1` for booleans, text in the usual formats for temporal
/// types). Anything else is an error naming the offending value and the target type.
///
/// # Examples
/// ```rust
/// use keel_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int64(Some(42))));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL for this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse a full string into `Self`.
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input.as_ref()),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} into {}",
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_empty_value() -> Value {
                    Value::Int64(None)
                }
                fn as_value(self) -> Value {
                    Value::Int64(Some(self as i64))
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let v = match value {
                        Value::Int64(Some(v)) => v,
                        Value::Boolean(Some(v)) => v as i64,
                        Value::Float64(Some(v)) if v.fract() == 0.0 => v as i64,
                        Value::Varchar(Some(ref v)) => <i64 as AsValue>::parse(v)?,
                        ref v => return Err(mismatch::<Self>(v)),
                    };
                    <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    })
                }
                fn parse(input: impl AsRef<str>) -> Result<Self> {
                    let input = input.as_ref().trim();
                    let (v, consumed) = i64::from_radix_10_signed(input.as_bytes());
                    if consumed == 0 || consumed != input.len() {
                        return Err(Error::msg(format!(
                            "Cannot parse `{}` as {}",
                            truncate_long!(input),
                            any::type_name::<Self>()
                        )));
                    }
                    <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    })
                }
            }
        )+
    };
}
impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_as_value_float {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_empty_value() -> Value {
                    Value::Float64(None)
                }
                fn as_value(self) -> Value {
                    Value::Float64(Some(self as f64))
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Float64(Some(v)) => Ok(v as _),
                        Value::Int64(Some(v)) => Ok(v as _),
                        Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                        ref v => Err(mismatch::<Self>(v)),
                    }
                }
                fn parse(input: impl AsRef<str>) -> Result<Self> {
                    let input = input.as_ref().trim();
                    fast_float::parse::<$source, _>(input).map_err(|_| {
                        Error::msg(format!(
                            "Cannot parse `{}` as {}",
                            truncate_long!(input),
                            any::type_name::<Self>()
                        ))
                    })
                }
            }
        )+
    };
}
impl_as_value_float!(f32, f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref v => Err(mismatch::<Self>(v)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        match input.as_ref().trim() {
            "1" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "false" | "FALSE" | "False" => Ok(false),
            v => Err(Error::msg(format!("Cannot parse `{}` as bool", truncate_long!(v)))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            ref v if !v.is_null() => v.to_text().ok_or_else(|| mismatch::<Self>(v)),
            ref v => Err(mismatch::<Self>(v)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        Ok(input.as_ref().to_string())
    }
}

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_string()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Err(mismatch::<Self>(&value))
    }
}

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];
const TIMESTAMP_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

fn from_unix_timestamp(seconds: i64) -> Result<PrimitiveDateTime> {
    let v = OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| Error::new(e).context(format!("Invalid unix timestamp {}", seconds)))?;
    Ok(PrimitiveDateTime::new(v.date(), v.time()))
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Int64(Some(v)) => Ok(from_unix_timestamp(v)?.date()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref v => Err(mismatch::<Self>(v)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        if let Ok(v) = Date::parse(input, DATE) {
            return Ok(v);
        }
        <PrimitiveDateTime as AsValue>::parse(input).map(|v| v.date())
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            Value::Int64(Some(v)) => Ok(from_unix_timestamp(v)?.time()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref v => Err(mismatch::<Self>(v)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        TIME_FORMATS
            .iter()
            .find_map(|format| Time::parse(input, *format).ok())
            .ok_or_else(|| Error::msg(format!("Cannot parse `{}` as Time", truncate_long!(input))))
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Date(Some(v)) => Ok(v.midnight()),
            Value::Int64(Some(v)) => from_unix_timestamp(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref v => Err(mismatch::<Self>(v)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| PrimitiveDateTime::parse(input, *format).ok())
            .or_else(|| Date::parse(input, DATE).ok().map(|v| v.midnight()))
            .ok_or_else(|| {
                Error::msg(format!(
                    "Cannot parse `{}` as PrimitiveDateTime",
                    truncate_long!(input)
                ))
            })
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

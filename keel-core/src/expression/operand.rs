use crate::{SelectQuery, Value};
use time::{Date, PrimitiveDateTime, Time};

/// Right hand side of a condition.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Value),
    List(Vec<Value>),
    /// Nested select, rendered inline.
    Query(Box<SelectQuery>),
}

impl Operand {
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Value(v) if v.is_null())
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Operand::Value(v) => v.is_truthy(),
            Operand::List(v) => !v.is_empty(),
            Operand::Query(..) => true,
        }
    }
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Value(Value::Null)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(value: Vec<Value>) -> Self {
        Operand::List(value)
    }
}

impl From<SelectQuery> for Operand {
    fn from(value: SelectQuery) -> Self {
        Operand::Query(Box::new(value))
    }
}

macro_rules! impl_operand_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Operand {
                fn from(value: $source) -> Self {
                    Operand::Value(value.into())
                }
            }
            impl From<Option<$source>> for Operand {
                fn from(value: Option<$source>) -> Self {
                    Operand::Value(value.into())
                }
            }
            impl<const N: usize> From<[$source; N]> for Operand {
                fn from(value: [$source; N]) -> Self {
                    Operand::List(value.into_iter().map(Into::into).collect())
                }
            }
        )+
    };
}
impl_operand_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    Date,
    Time,
    PrimitiveDateTime,
);

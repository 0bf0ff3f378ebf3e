use crate::{KeelError, Result};
use std::{fmt, str::FromStr};

/// Separator between the field name and the operator suffix in keyword filters.
pub const OP_SEPARATOR: &str = "__";

/// Operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    IsNull,
    IsNotNull,
    /// Explicit null test, only accepts a NULL value.
    Is,
    In,
    NotIn,
    Between,
    Contains,
    StartsWith,
    IEq,
    IContains,
    IStartsWith,
}

impl OpCode {
    pub const ALL: [OpCode; 17] = [
        OpCode::Eq,
        OpCode::Ne,
        OpCode::Lt,
        OpCode::Lte,
        OpCode::Gt,
        OpCode::Gte,
        OpCode::IsNull,
        OpCode::IsNotNull,
        OpCode::Is,
        OpCode::In,
        OpCode::NotIn,
        OpCode::Between,
        OpCode::Contains,
        OpCode::StartsWith,
        OpCode::IEq,
        OpCode::IContains,
        OpCode::IStartsWith,
    ];

    /// Suffix used in keyword filters.
    pub fn suffix(&self) -> &'static str {
        match self {
            OpCode::Eq => "eq",
            OpCode::Ne => "ne",
            OpCode::Lt => "lt",
            OpCode::Lte => "lte",
            OpCode::Gt => "gt",
            OpCode::Gte => "gte",
            OpCode::IsNull => "isnull",
            OpCode::IsNotNull => "isnotnull",
            OpCode::Is => "is",
            OpCode::In => "in",
            OpCode::NotIn => "nin",
            OpCode::Between => "between",
            OpCode::Contains => "contains",
            OpCode::StartsWith => "startswith",
            OpCode::IEq => "ieq",
            OpCode::IContains => "icontains",
            OpCode::IStartsWith => "istartswith",
        }
    }

    /// Case insensitive variants.
    pub fn is_case_insensitive(&self) -> bool {
        matches!(self, OpCode::IEq | OpCode::IContains | OpCode::IStartsWith)
    }

    /// Operators rendering without a value.
    pub fn is_null_test(&self) -> bool {
        matches!(self, OpCode::IsNull | OpCode::IsNotNull | OpCode::Is)
    }
}

impl FromStr for OpCode {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self> {
        OpCode::ALL
            .into_iter()
            .find(|op| op.suffix() == value)
            .ok_or_else(|| KeelError::validation(format!("Unknown operator code `{}`", value)))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Joins the children of an expression set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connector {
    And,
    Or,
    Comma,
}

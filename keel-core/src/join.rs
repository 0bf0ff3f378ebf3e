use crate::{Error, Field, KeelError};
use std::str::FromStr;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        let patterns: &[(&[&str], JoinType)] = &[
            (&["INNER", "INNER JOIN", "JOIN"], JoinType::Inner),
            (&["LEFT", "LEFT OUTER", "LEFT JOIN", "LEFT OUTER JOIN"], JoinType::Left),
            (&["RIGHT", "RIGHT OUTER", "RIGHT JOIN", "RIGHT OUTER JOIN"], JoinType::Right),
            (&["FULL", "OUTER", "FULL OUTER", "FULL OUTER JOIN", "OUTER JOIN"], JoinType::Outer),
        ];
        patterns
            .iter()
            .find(|(keywords, _)| keywords.contains(&normalized.as_str()))
            .map(|(_, join_type)| *join_type)
            .ok_or_else(|| KeelError::validation(format!("Unknown join type `{}`", value)))
    }
}

/// One resolved join condition, `lhs = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join: JoinType,
    pub lhs: Field,
    pub rhs: Field,
}

use crate::{Expression, KeelError, Model, OP_SEPARATOR, OpCode, Operand, Result};
use std::str::FromStr;

impl Expression {
    /// Convert keyword filters (`name` or `name__suffix` to value) into conditions on `model`.
    ///
    /// Unknown suffixes fall back to equality on the whole key, unknown fields are skipped.
    pub fn convert<I, K, V>(model: &Model, filters: I) -> Result<Vec<Expression>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        let mut result = Vec::new();
        for (key, value) in filters {
            let key = key.as_ref();
            let (name, op) = match key.rsplit_once(OP_SEPARATOR) {
                Some((name, suffix)) => match OpCode::from_str(suffix) {
                    Ok(op) => (name, op),
                    Err(..) => (key, OpCode::Eq),
                },
                None => (key, OpCode::Eq),
            };
            let Some(field) = model.field(name) else {
                log::debug!("Skipping the filter `{}`, {} has no such field", key, model.name());
                continue;
            };
            let mut value: Operand = value.into();
            let op = match op {
                OpCode::IsNull | OpCode::IsNotNull => {
                    let op = match (op, value.is_truthy()) {
                        (OpCode::IsNull, false) => OpCode::IsNotNull,
                        (_, false) => OpCode::IsNull,
                        (op, true) => op,
                    };
                    value = Operand::default();
                    op
                }
                OpCode::Is | OpCode::Eq if value.is_null() => OpCode::IsNull,
                OpCode::Is => {
                    return Err(KeelError::validation(format!(
                        "The filter `{}` only accepts a null value",
                        key
                    )));
                }
                op => op,
            };
            result.push(Expression::new(field.clone(), op, value));
        }
        Ok(result)
    }
}

use crate::{Connector, Field, KeelError, OpCode, Operand, Result};
use std::{collections::BTreeSet, ops::Not, str::FromStr};

/// One condition: a field, an operator and the value it is compared to.
#[derive(Debug, Clone)]
pub struct Expression {
    pub(crate) field: Field,
    pub(crate) op: OpCode,
    pub(crate) value: Operand,
    pub(crate) negated: bool,
}

impl Expression {
    /// Equality against NULL becomes a null test, as in the keyword filters.
    pub fn new(field: Field, op: OpCode, value: impl Into<Operand>) -> Self {
        let value = value.into();
        let op = match op {
            OpCode::Eq | OpCode::Is if value.is_null() => OpCode::IsNull,
            OpCode::Ne if value.is_null() => OpCode::IsNotNull,
            op => op,
        };
        Self {
            field,
            op,
            value,
            negated: false,
        }
    }
    pub fn field(&self) -> &Field {
        &self.field
    }
    pub fn op(&self) -> OpCode {
        self.op
    }
    pub fn value(&self) -> &Operand {
        &self.value
    }
    pub fn is_negated(&self) -> bool {
        self.negated
    }
    /// Models referenced by this condition.
    pub fn models(&self) -> BTreeSet<String> {
        BTreeSet::from([self.field.model().to_string()])
    }
    /// Toggle the negation flag.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
    pub fn and(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::And, [Condition::from(self), other.into()])
    }
    pub fn or(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::Or, [Condition::from(self), other.into()])
    }
}

impl Not for Expression {
    type Output = Expression;
    fn not(self) -> Self::Output {
        self.negate()
    }
}

/// Connected list of conditions.
///
/// A direct child that is a non negated set with the same connector is flattened into the new
/// set, `(a AND b) AND c` is stored as `a AND b AND c`.
#[derive(Debug, Clone)]
pub struct ExpressionSet {
    pub(crate) connector: Connector,
    pub(crate) children: Vec<Condition>,
    pub(crate) negated: bool,
    models: BTreeSet<String>,
}

impl ExpressionSet {
    pub fn new<C: Into<Condition>>(connector: Connector, children: impl IntoIterator<Item = C>) -> Self {
        let mut result = Self {
            connector,
            children: Vec::new(),
            negated: false,
            models: BTreeSet::new(),
        };
        for child in children {
            result.push(child.into());
        }
        result
    }

    pub fn empty(connector: Connector) -> Self {
        Self::new::<Condition>(connector, [])
    }

    fn push(&mut self, child: Condition) {
        self.models.extend(child.models());
        match child {
            Condition::Set(set) if set.connector == self.connector && !set.negated => {
                self.children.extend(set.children);
            }
            child => self.children.push(child),
        }
    }

    pub fn connector(&self) -> Connector {
        self.connector
    }
    pub fn children(&self) -> &[Condition] {
        &self.children
    }
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
    pub fn is_negated(&self) -> bool {
        self.negated
    }
    pub fn models(&self) -> &BTreeSet<String> {
        &self.models
    }
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
    pub fn and(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::And, [Condition::from(self), other.into()])
    }
    pub fn or(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::Or, [Condition::from(self), other.into()])
    }
}

impl Not for ExpressionSet {
    type Output = ExpressionSet;
    fn not(self) -> Self::Output {
        self.negate()
    }
}

/// Either a single condition or a connected set of them.
#[derive(Debug, Clone)]
pub enum Condition {
    Expression(Expression),
    Set(ExpressionSet),
}

impl Condition {
    pub fn models(&self) -> BTreeSet<String> {
        match self {
            Condition::Expression(v) => v.models(),
            Condition::Set(v) => v.models().clone(),
        }
    }
    pub fn is_negated(&self) -> bool {
        match self {
            Condition::Expression(v) => v.negated,
            Condition::Set(v) => v.negated,
        }
    }
    pub fn negate(self) -> Self {
        match self {
            Condition::Expression(v) => Condition::Expression(v.negate()),
            Condition::Set(v) => Condition::Set(v.negate()),
        }
    }
    pub fn and(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::And, [self, other.into()])
    }
    pub fn or(self, other: impl Into<Condition>) -> ExpressionSet {
        ExpressionSet::new(Connector::Or, [self, other.into()])
    }
}

impl From<Expression> for Condition {
    fn from(value: Expression) -> Self {
        Condition::Expression(value)
    }
}

impl From<ExpressionSet> for Condition {
    fn from(value: ExpressionSet) -> Self {
        Condition::Set(value)
    }
}

impl Field {
    /// Condition with the operator given by its code, failing on unknown codes and on null tests
    /// given a value.
    pub fn op(&self, code: &str, value: impl Into<Operand>) -> Result<Expression> {
        let op = OpCode::from_str(code)?;
        let value = value.into();
        if op.is_null_test() && !value.is_null() {
            return Err(KeelError::validation(format!(
                "The operator `{}` on {}.{} only accepts a null value",
                code,
                self.model(),
                self.name()
            )));
        }
        Ok(Expression::new(self.clone(), op, value))
    }
    pub fn equals(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Eq, value)
    }
    pub fn not_equals(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Ne, value)
    }
    pub fn lt(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Lt, value)
    }
    pub fn lte(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Lte, value)
    }
    pub fn gt(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Gt, value)
    }
    pub fn gte(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Gte, value)
    }
    pub fn in_(&self, values: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::In, values)
    }
    pub fn not_in(&self, values: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::NotIn, values)
    }
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Result<Expression> {
        let (Operand::Value(low), Operand::Value(high)) = (low.into(), high.into()) else {
            return Err(KeelError::validation(
                "Between expects two scalar bounds",
            ));
        };
        Ok(Expression::new(self.clone(), OpCode::Between, vec![low, high]))
    }
    pub fn is_null(&self) -> Expression {
        Expression::new(self.clone(), OpCode::IsNull, Operand::default())
    }
    pub fn is_not_null(&self) -> Expression {
        Expression::new(self.clone(), OpCode::IsNotNull, Operand::default())
    }
    pub fn contains(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::Contains, value)
    }
    pub fn startswith(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::StartsWith, value)
    }
    pub fn iequals(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::IEq, value)
    }
    pub fn icontains(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::IContains, value)
    }
    pub fn istartswith(&self, value: impl Into<Operand>) -> Expression {
        Expression::new(self.clone(), OpCode::IStartsWith, value)
    }
}

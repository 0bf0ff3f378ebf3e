use crate::{AsValue, Error, KeelError, Model, Result, Value};
use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};
use time::{Date, PrimitiveDateTime, Time};

static DECLARATION_ORDINAL: AtomicU64 = AtomicU64::new(0);

/// Next value of the process wide field declaration sequence.
fn next_ordinal() -> u64 {
    DECLARATION_ORDINAL.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Conversion strategy between the stored and the application representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    Float,
    /// Stored as `1` / `0`.
    Boolean,
    /// Fixed length text, truncated to the maximum length when stored.
    Char(usize),
    /// Variable length text, truncated to the maximum length when stored.
    Varchar(usize),
    DateTime,
    Date,
    Time,
}

impl FieldKind {
    pub const CHAR_MAX_LENGTH: usize = 1000;
    pub const VARCHAR_MAX_LENGTH: usize = 3000;

    /// The typed NULL of this kind.
    pub fn empty_value(&self) -> Value {
        match self {
            FieldKind::Integer | FieldKind::Number => Value::Int64(None),
            FieldKind::Float => Value::Float64(None),
            FieldKind::Boolean => Value::Boolean(None),
            FieldKind::Char(..) | FieldKind::Varchar(..) => Value::Varchar(None),
            FieldKind::DateTime => Value::Timestamp(None),
            FieldKind::Date => Value::Date(None),
            FieldKind::Time => Value::Time(None),
        }
    }

    /// Convert a value coming from the application or from a row into the application form.
    pub fn to_application(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(match self {
                FieldKind::Char(..) | FieldKind::Varchar(..) => Value::Varchar(Some(String::new())),
                _ => self.empty_value(),
            });
        }
        Ok(match self {
            FieldKind::Integer | FieldKind::Number => i64::try_from_value(value)?.as_value(),
            FieldKind::Float => f64::try_from_value(value)?.as_value(),
            FieldKind::Boolean => bool::try_from_value(value)?.as_value(),
            FieldKind::Char(..) | FieldKind::Varchar(..) => String::try_from_value(value)?.as_value(),
            FieldKind::DateTime => PrimitiveDateTime::try_from_value(value)?.as_value(),
            FieldKind::Date => Date::try_from_value(value)?.as_value(),
            FieldKind::Time => Time::try_from_value(value)?.as_value(),
        })
    }

    /// Convert an application value into the form bound as a statement parameter.
    pub fn to_storage(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(self.empty_value());
        }
        Ok(match self {
            FieldKind::Boolean => Value::Int64(Some(bool::try_from_value(value)? as i64)),
            FieldKind::Char(max) | FieldKind::Varchar(max) => {
                let mut v = String::try_from_value(value)?;
                if let Some((i, _)) = v.char_indices().nth(*max) {
                    v.truncate(i);
                }
                Value::Varchar(Some(v))
            }
            _ => self.to_application(value)?,
        })
    }
}

/// Producer of default values, resolved once at registration.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Producer(fn() -> Value),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

/// Declaration of one mapped attribute, turned into a [`Field`] by the model registration.
#[derive(Clone)]
pub struct FieldDef {
    pub(crate) column: Option<String>,
    pub(crate) kind: FieldKind,
    pub(crate) nullable: bool,
    pub(crate) primary: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) alias: Option<String>,
    pub(crate) ordinal: u64,
    pub(crate) reference: Option<ReferenceDef>,
}

#[derive(Clone)]
pub(crate) struct ReferenceDef {
    pub(crate) model: Model,
    pub(crate) field: Field,
    pub(crate) related_name: Option<String>,
    pub(crate) reverse_name: Option<String>,
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            column: None,
            kind,
            nullable: false,
            primary: false,
            default: None,
            alias: None,
            ordinal: next_ordinal(),
            reference: None,
        }
    }
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }
    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }
    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }
    pub fn char() -> Self {
        Self::new(FieldKind::Char(FieldKind::CHAR_MAX_LENGTH))
    }
    pub fn varchar() -> Self {
        Self::new(FieldKind::Varchar(FieldKind::VARCHAR_MAX_LENGTH))
    }
    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }
    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }
    pub fn time() -> Self {
        Self::new(FieldKind::Time)
    }

    /// Foreign key to the primary key of `model`, with the same kind.
    pub fn foreign_key(model: &Model) -> Self {
        let field = model.pk().clone();
        Self::references(model, field)
    }

    /// Foreign key to the field `name` of `model`.
    pub fn foreign_key_to(model: &Model, name: &str) -> Result<Self> {
        let field = model.field_or_err(name)?.clone();
        Ok(Self::references(model, field))
    }

    fn references(model: &Model, field: Field) -> Self {
        let mut result = Self::new(field.kind());
        result.reference = Some(ReferenceDef {
            model: model.clone(),
            field,
            related_name: None,
            reverse_name: None,
        });
        result
    }

    /// Override the column name, by default the field name.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Override the maximum length of a text field.
    pub fn max_length(mut self, max: usize) -> Self {
        self.kind = match self.kind {
            FieldKind::Char(..) => FieldKind::Char(max),
            FieldKind::Varchar(..) => FieldKind::Varchar(max),
            kind => kind,
        };
        self
    }

    pub fn primary(mut self) -> Result<Self> {
        if self.nullable {
            return Err(KeelError::validation(
                "A nullable field cannot be the primary key",
            ));
        }
        self.primary = true;
        Ok(self)
    }

    pub fn nullable(mut self) -> Result<Self> {
        if self.primary {
            return Err(KeelError::validation(
                "A primary key field cannot be nullable",
            ));
        }
        self.nullable = true;
        Ok(self)
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_with(mut self, producer: fn() -> Value) -> Self {
        self.default = Some(DefaultValue::Producer(producer));
        self
    }

    /// Display name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Singular accessor on the owning side of a foreign key.
    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        if let Some(reference) = &mut self.reference {
            reference.related_name = Some(name.into());
        }
        self
    }

    /// Collection accessor on the referenced side of a foreign key.
    pub fn reverse_name(mut self, name: impl Into<String>) -> Self {
        if let Some(reference) = &mut self.reference {
            reference.reverse_name = Some(name.into());
        }
        self
    }

    pub(crate) fn into_field(
        self,
        model: &str,
        table: &str,
        name: &str,
    ) -> Field {
        let column = self
            .column
            .as_deref()
            .unwrap_or(name)
            .to_lowercase();
        let reference = self.reference.map(|r| ForeignKey {
            related_name: r.related_name.unwrap_or_else(|| r.model.name().to_lowercase()),
            reverse_name: r
                .reverse_name
                .unwrap_or_else(|| format!("{}_set", model.to_lowercase())),
            model: r.model.name().to_string(),
            field: r.field,
        });
        Field(Arc::new(FieldInner {
            name: name.to_string(),
            column,
            kind: self.kind,
            nullable: self.nullable,
            primary: self.primary,
            default: self.default.map(|v| v.resolve()),
            alias: self.alias,
            ordinal: self.ordinal,
            model: model.to_string(),
            table: table.to_string(),
            reference,
        }))
    }
}

/// Link held by a foreign key field.
#[derive(Debug)]
pub struct ForeignKey {
    /// Referenced model name.
    pub model: String,
    /// Referenced field.
    pub field: Field,
    pub related_name: String,
    pub reverse_name: String,
}

#[derive(Debug)]
struct FieldInner {
    name: String,
    column: String,
    kind: FieldKind,
    nullable: bool,
    primary: bool,
    default: Option<Value>,
    alias: Option<String>,
    ordinal: u64,
    model: String,
    table: String,
    reference: Option<ForeignKey>,
}

/// Registered field, owned by exactly one model. Cheap to clone.
#[derive(Clone)]
pub struct Field(Arc<FieldInner>);

impl Field {
    pub fn name(&self) -> &str {
        &self.0.name
    }
    pub fn column(&self) -> &str {
        &self.0.column
    }
    pub fn kind(&self) -> FieldKind {
        self.0.kind
    }
    pub fn is_nullable(&self) -> bool {
        self.0.nullable
    }
    pub fn is_primary(&self) -> bool {
        self.0.primary
    }
    pub fn default_value(&self) -> Option<&Value> {
        self.0.default.as_ref()
    }
    pub fn alias(&self) -> Option<&str> {
        self.0.alias.as_deref()
    }
    pub fn ordinal(&self) -> u64 {
        self.0.ordinal
    }
    /// Name of the owning model.
    pub fn model(&self) -> &str {
        &self.0.model
    }
    pub fn table(&self) -> &str {
        &self.0.table
    }
    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        self.0.reference.as_ref()
    }

    pub fn to_application(&self, value: Value) -> Result<Value> {
        self.0.kind.to_application(value).map_err(|e| self.conversion_error(e))
    }

    pub fn to_storage(&self, value: Value) -> Result<Value> {
        self.0.kind.to_storage(value).map_err(|e| self.conversion_error(e))
    }

    fn conversion_error(&self, error: Error) -> Error {
        KeelError::validation(format!(
            "Invalid value for field {}.{}: {:#}",
            self.0.model, self.0.name, error
        ))
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.model == other.0.model && self.0.name == other.0.name)
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.model.hash(state);
        self.0.name.hash(state);
    }
}

impl Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}.{})", self.0.model, self.0.name)
    }
}

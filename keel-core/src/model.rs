use crate::{
    Database, DeleteQuery, Expression, Field, FieldDef, InsertQuery, Instance, KeelError,
    OP_SEPARATOR, OpCode, Operand, Ordering, RawQuery, Result, SelectQuery, Selection,
    UpdateQuery, Value,
};
use indexmap::IndexMap;
use std::{
    collections::HashSet,
    fmt::{self, Debug},
    str::FromStr,
    sync::{Arc, RwLock, Weak},
};

/// Registration descriptor of a mapped type, consumed by [`ModelBuilder::register`].
pub struct ModelBuilder {
    name: String,
    table: Option<String>,
    database: Option<Arc<Database>>,
    auto_increment: Option<bool>,
    ordering: Option<Vec<String>>,
    base: Option<Model>,
    fields: Vec<(String, FieldDef)>,
}

impl ModelBuilder {
    /// Table name, by default the model name in lowercase.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    pub fn database(mut self, database: Arc<Database>) -> Self {
        self.database = Some(database);
        self
    }

    /// Whether the backend generates the primary key on insert.
    pub fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = Some(value);
        self
    }

    /// Default ordering of `select()`, a leading `-` sorts descending.
    pub fn ordering<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.ordering = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Inherit backend, auto increment and ordering from `base` unless set here.
    pub fn extends(mut self, base: &Model) -> Self {
        self.base = Some(base.clone());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldDef) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Build the immutable schema.
    ///
    /// Fields are laid out in declaration order first, the foreign keys are then wired into this
    /// model's relations and the referenced models' reverse relations.
    pub fn register(self) -> Result<Model> {
        let base = self.base.as_ref().map(|v| &v.0);
        let table = self.table.unwrap_or_else(|| self.name.to_lowercase());
        let database = self
            .database
            .or_else(|| base.and_then(|v| v.database.clone()));
        let auto_increment = self
            .auto_increment
            .or_else(|| base.map(|v| v.auto_increment))
            .unwrap_or(false);
        let ordering_names = self
            .ordering
            .or_else(|| base.map(|v| v.ordering_names.clone()))
            .unwrap_or_default();

        let mut definitions = self.fields;
        definitions.sort_by_key(|(_, def)| def.ordinal);
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(definitions.len());
        let mut columns = IndexMap::new();
        let mut defaults = IndexMap::new();
        let mut references = Vec::new();
        for (name, def) in definitions {
            if !names.insert(name.clone()) {
                return Err(KeelError::validation(format!(
                    "Field {}.{} is declared twice",
                    self.name, name
                )));
            }
            if let Some(reference) = &def.reference {
                references.push((name.clone(), reference.model.clone()));
            }
            let field = def.into_field(&self.name, &table, &name);
            if columns
                .insert(field.column().to_string(), name.clone())
                .is_some()
            {
                return Err(KeelError::validation(format!(
                    "Column {} of {} is mapped twice",
                    field.column(),
                    self.name
                )));
            }
            if let Some(value) = field.default_value() {
                defaults.insert(name, value.clone());
            }
            fields.push(field);
        }

        let mut primary = fields.iter().filter(|v| v.is_primary());
        let Some(pk) = primary.next().cloned() else {
            return Err(KeelError::validation(format!(
                "Model {} has no primary key field",
                self.name
            )));
        };
        if let Some(other) = primary.next() {
            return Err(KeelError::validation(format!(
                "Model {} declares more than one primary key ({} and {})",
                self.name,
                pk.name(),
                other.name()
            )));
        }

        let ordering = ordering_names
            .iter()
            .map(|name| {
                let (name, descending) = match name.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (name.as_str(), false),
                };
                let field = fields
                    .iter()
                    .find(|v| v.name() == name)
                    .cloned()
                    .ok_or_else(|| {
                        KeelError::validation(format!(
                            "Ordering of {} refers to the unknown field {}",
                            self.name, name
                        ))
                    })?;
                Ok(if descending {
                    Ordering::desc(field)
                } else {
                    Ordering::asc(field)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let relations = references.into_iter().collect::<IndexMap<_, _>>();
        let model = Model(Arc::new(ModelInner {
            name: self.name,
            table,
            database,
            auto_increment,
            ordering,
            ordering_names,
            fields,
            pk,
            columns,
            defaults,
            relations,
            reverse_relations: RwLock::new(IndexMap::new()),
        }));
        for (name, related) in &model.0.relations {
            let Some(reverse_name) = model
                .field(name)
                .and_then(|v| v.foreign_key())
                .map(|v| v.reverse_name.clone())
            else {
                continue;
            };
            let mut reverse = related.0.reverse_relations.write().map_err(|_| {
                KeelError::query(format!("Reverse relations of {} are poisoned", related.name()))
            })?;
            reverse.insert(reverse_name, Arc::downgrade(&model.0));
        }
        log::debug!("Registered model {} on table {}", model.name(), model.table());
        Ok(model)
    }
}

pub(crate) struct ModelInner {
    name: String,
    table: String,
    database: Option<Arc<Database>>,
    auto_increment: bool,
    ordering: Vec<Ordering>,
    ordering_names: Vec<String>,
    fields: Vec<Field>,
    pk: Field,
    columns: IndexMap<String, String>,
    defaults: IndexMap<String, Value>,
    relations: IndexMap<String, Model>,
    reverse_relations: RwLock<IndexMap<String, Weak<ModelInner>>>,
}

/// Registered mapped type. Cheap to clone, compares by name.
#[derive(Clone)]
pub struct Model(Arc<ModelInner>);

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            table: None,
            database: None,
            auto_increment: None,
            ordering: None,
            base: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
    pub fn table(&self) -> &str {
        &self.0.table
    }
    pub fn is_auto_increment(&self) -> bool {
        self.0.auto_increment
    }
    pub fn ordering(&self) -> &[Ordering] {
        &self.0.ordering
    }
    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.0.fields
    }
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.fields.iter().map(Field::name)
    }
    pub fn pk(&self) -> &Field {
        &self.0.pk
    }
    /// Default values resolved at registration.
    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.0.defaults
    }
    /// Column name to field name.
    pub fn columns(&self) -> &IndexMap<String, String> {
        &self.0.columns
    }
    /// Foreign key field name to referenced model.
    pub fn relations(&self) -> &IndexMap<String, Model> {
        &self.0.relations
    }
    /// Reverse accessor name to owning model, for the models still alive.
    pub fn reverse_relations(&self) -> IndexMap<String, Model> {
        self.0
            .reverse_relations
            .read()
            .map(|v| {
                v.iter()
                    .filter_map(|(k, v)| v.upgrade().map(|v| (k.clone(), Model(v))))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn database(&self) -> Result<&Arc<Database>> {
        self.0.database.as_ref().ok_or_else(|| {
            KeelError::validation(format!("Model {} is not bound to a database", self.name()))
        })
    }

    /// Field by name, or by column name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.0
            .fields
            .iter()
            .find(|v| v.name() == name)
            .or_else(|| {
                let name = self.0.columns.get(&name.to_lowercase())?;
                self.0.fields.iter().find(|v| v.name() == name)
            })
    }

    pub fn field_or_err(&self, name: &str) -> Result<&Field> {
        self.field(name).ok_or_else(|| {
            KeelError::validation(format!("Model {} has no field {}", self.name(), name))
        })
    }

    /// Foreign key of this model referencing `model`, optionally restricted to the field `name`.
    pub fn related_field(&self, model: &Model, name: Option<&str>) -> Option<&Field> {
        self.0
            .relations
            .iter()
            .find(|(field, related)| *related == model && name.is_none_or(|v| v == field.as_str()))
            .and_then(|(field, _)| self.field(field))
    }

    /// Foreign key of `model` referencing this model.
    pub fn reverse_related_field(&self, model: &Model, name: Option<&str>) -> Option<Field> {
        let owned = self
            .reverse_relations()
            .values()
            .any(|v| v == model);
        if !owned {
            return None;
        }
        model.related_field(self, name).cloned()
    }

    pub fn relation_exists(&self, model: &Model) -> bool {
        self.related_field(model, None).is_some() || self.reverse_related_field(model, None).is_some()
    }

    pub fn raw(&self, statement: impl Into<String>, parameters: Vec<Value>) -> RawQuery {
        RawQuery::new(self.clone(), statement, parameters)
    }

    pub fn insert<I, K, V>(&self, values: I) -> Result<InsertQuery>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        InsertQuery::new(self.clone()).set(values)
    }

    pub fn insert_many<N: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = N>,
        rows: Vec<Vec<Value>>,
    ) -> Result<InsertQuery> {
        InsertQuery::new(self.clone()).set_bulk(names, rows)
    }

    pub fn update<I, K, V>(&self, values: I) -> UpdateQuery
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        UpdateQuery::new(self.clone()).set(values)
    }

    pub fn delete(&self) -> DeleteQuery {
        DeleteQuery::new(self.clone())
    }

    /// Select query with the default ordering applied.
    pub fn select(&self) -> SelectQuery {
        SelectQuery::new(self.clone()).sort(self.0.ordering.clone())
    }

    pub fn select_fields<S: Into<Selection>>(
        &self,
        fields: impl IntoIterator<Item = S>,
    ) -> SelectQuery {
        self.select().fields(fields)
    }

    pub fn instance<I, K, V>(&self, values: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Instance::new(self, values)
    }

    /// The single instance matching the keyword filters.
    pub fn get<I, K, V>(&self, filters: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        self.select().filter_by(filters)?.one()
    }

    /// Construct and insert a new instance.
    pub fn create<I, K, V>(&self, values: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut instance = Instance::new(self, values)?;
        instance.save()?;
        Ok(instance)
    }

    /// The instance matching `filters`, created from the plain filters and `defaults` when
    /// missing. The flag tells whether it was created.
    pub fn get_or_create<K, V>(
        &self,
        filters: impl IntoIterator<Item = (K, V)>,
        defaults: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(Instance, bool)>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let filters = filters
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect::<Vec<(String, Value)>>();
        match self.get(filters.iter().map(|(k, v)| (k, Operand::Value(v.clone())))) {
            Ok(instance) => return Ok((instance, false)),
            Err(e) if KeelError::is_no_data(&e) => {}
            Err(e) => return Err(e),
        }
        let mut values = filters
            .into_iter()
            .filter_map(|(k, v)| match k.rsplit_once(OP_SEPARATOR) {
                None => Some((k, v)),
                Some((name, suffix)) => match OpCode::from_str(suffix) {
                    Ok(OpCode::Eq) => Some((name.to_string(), v)),
                    Ok(..) => None,
                    Err(..) => Some((k, v)),
                },
            })
            .filter(|(k, _)| self.field(k).is_some())
            .collect::<IndexMap<_, _>>();
        for (k, v) in defaults {
            values.insert(k.as_ref().to_string(), v.into());
        }
        Ok((self.create(values)?, true))
    }

    /// Conditions equivalent to the keyword filters, resolved on this model.
    pub fn convert<I, K, V>(&self, filters: I) -> Result<Vec<Expression>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        Expression::convert(self, filters)
    }

    /// Close the backend connections of this model.
    pub fn close_session(&self) -> Result<()> {
        self.database()?.close()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Model {}

impl Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model({})", self.0.name)
    }
}

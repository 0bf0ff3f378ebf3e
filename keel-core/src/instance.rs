use crate::{AsValue, KeelError, Model, Query, Result, SelectQuery, Selection, Value};
use indexmap::{IndexMap, IndexSet};

/// One mapped record: field values, the new record flag and the dirty fields.
///
/// Dirty fields are tracked only once the record has been inserted or loaded.
#[derive(Debug, Clone)]
pub struct Instance {
    model: Model,
    values: IndexMap<String, Value>,
    related: IndexMap<String, Instance>,
    new: bool,
    dirty: IndexSet<String>,
}

impl Instance {
    /// New record, defaults first and then `values`.
    pub fn new<I, K, V>(model: &Model, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut result = Self::blank(model)?;
        for (name, value) in values {
            result.set(name.as_ref(), value)?;
        }
        Ok(result)
    }

    /// Record read from the backend, labels are field names, column names or field aliases.
    /// Labels the model does not map are ignored.
    pub(crate) fn load<'a>(
        model: &Model,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Self> {
        let mut result = Self::blank(model)?;
        for (label, value) in values {
            let field = model
                .field(label)
                .or_else(|| model.fields().iter().find(|f| f.alias() == Some(label)));
            if let Some(field) = field {
                let name = field.name().to_string();
                result.set(&name, value)?;
            }
        }
        result.new = false;
        Ok(result)
    }

    fn blank(model: &Model) -> Result<Self> {
        let mut result = Self {
            model: model.clone(),
            values: IndexMap::new(),
            related: IndexMap::new(),
            new: true,
            dirty: IndexSet::new(),
        };
        for (name, value) in model.defaults() {
            result.set(name, value.clone())?;
        }
        Ok(result)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Value of the field (or column) `name`, `None` when never assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let field = self.model.field(name)?;
        self.values.get(field.name())
    }

    pub fn get_as<T: AsValue>(&self, name: &str) -> Result<T> {
        self.model.field_or_err(name)?;
        T::try_from_value(self.get(name).cloned().unwrap_or_default())
    }

    /// Assign a field, converting the value to its application form.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.model.field_or_err(name)?.clone();
        let value = field.to_application(value.into())?;
        if !self.new {
            if field == *self.model.pk() {
                // Primary key reassignment is not tracked.
            } else if self.values.get(field.name()).unwrap_or(&Value::Null) != &value {
                self.dirty.insert(field.name().to_string());
            }
        }
        self.values.insert(field.name().to_string(), value);
        Ok(())
    }

    /// Primary key value, `None` when unset or NULL.
    pub fn pk(&self) -> Option<&Value> {
        self.values
            .get(self.model.pk().name())
            .filter(|v| !v.is_null())
    }

    pub fn set_pk(&mut self, value: impl Into<Value>) -> Result<()> {
        let name = self.model.pk().name().to_string();
        self.set(&name, value)
    }

    /// Every field in declaration order, unassigned ones as typed NULL.
    pub fn field_values(&self) -> IndexMap<String, Value> {
        self.model
            .fields()
            .iter()
            .map(|f| {
                let value = self
                    .values
                    .get(f.name())
                    .cloned()
                    .unwrap_or_else(|| f.kind().empty_value());
                (f.name().to_string(), value)
            })
            .collect()
    }

    /// Related object attached through the forward accessor `name`.
    pub fn related(&self, name: &str) -> Option<&Instance> {
        self.related.get(name)
    }

    pub(crate) fn attach(&mut self, name: &str, instance: Instance) -> Result<()> {
        let reference = self.model.fields().iter().find_map(|f| {
            f.foreign_key()
                .filter(|fk| fk.related_name == name)
                .map(|fk| (f.name().to_string(), fk.field.name().to_string()))
        });
        if let Some((field, target)) = reference {
            if let Some(value) = instance.get(&target).filter(|v| !v.is_null()).cloned() {
                self.values.insert(field, value);
            }
        }
        self.related.insert(name.to_string(), instance);
        Ok(())
    }

    /// Related object through the forward accessor (or foreign key field) `name`, loaded from
    /// the backend when not attached yet.
    pub fn fetch_related(&mut self, name: &str) -> Result<Option<&Instance>> {
        let Some((field, related)) = self.model.relations().iter().find_map(|(field, model)| {
            let field = self.model.field(field)?;
            let fk = field.foreign_key()?;
            (fk.related_name == name || field.name() == name).then(|| (field.clone(), model.clone()))
        }) else {
            return Err(KeelError::validation(format!(
                "Model {} has no relation {}",
                self.model.name(),
                name
            )));
        };
        let Some(fk) = field.foreign_key() else {
            return Ok(None);
        };
        let key = fk.related_name.clone();
        if self.related.contains_key(&key) {
            return Ok(self.related.get(&key));
        }
        let Some(value) = self.get(field.name()).filter(|v| !v.is_null()).cloned() else {
            return Ok(None);
        };
        let instance = match related.select().filter(fk.field.equals(value)).one() {
            Ok(instance) => instance,
            Err(e) if field.is_nullable() && KeelError::is_no_data(&e) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.related.insert(key.clone(), instance);
        Ok(self.related.get(&key))
    }

    /// Query over the records of another model referencing this one through the reverse
    /// accessor `name`.
    pub fn reverse(&self, name: &str) -> Result<SelectQuery> {
        let Some(owner) = self.model.reverse_relations().get(name).cloned() else {
            return Err(KeelError::validation(format!(
                "Model {} has no reverse relation {}",
                self.model.name(),
                name
            )));
        };
        let Some((field, target)) = owner.fields().iter().find_map(|f| {
            f.foreign_key()
                .filter(|fk| fk.reverse_name == name && fk.model == self.model.name())
                .map(|fk| (f.clone(), fk.field.clone()))
        }) else {
            return Err(KeelError::validation(format!(
                "Model {} has no foreign key for {}",
                owner.name(),
                name
            )));
        };
        let value = self.get(target.name()).cloned().unwrap_or_default();
        Ok(owner.select().filter(field.equals(value)))
    }

    /// Insert a new record or update the dirty fields of a loaded one.
    pub fn save(&mut self) -> Result<()> {
        let model = self.model.clone();
        let pk = self.pk().cloned();
        match pk {
            Some(pk) if !self.new && !self.dirty.is_empty() => {
                let values = self
                    .dirty
                    .iter()
                    .map(|name| (name.clone(), self.values.get(name).cloned().unwrap_or_default()))
                    .collect::<Vec<_>>();
                model
                    .update(values)
                    .filter(model.pk().equals(pk))
                    .execute()?;
            }
            _ if self.new => {
                let mut values = self.field_values();
                if model.is_auto_increment() {
                    values.shift_remove(model.pk().name());
                }
                let id = model.insert(values)?.execute()?;
                if let Some(id) = id.filter(|_| model.is_auto_increment()) {
                    self.set_pk(id)?;
                }
                self.new = false;
            }
            None => {
                return Err(KeelError::validation(format!(
                    "Cannot save a loaded {} without a primary key",
                    model.name()
                )));
            }
            Some(..) => {}
        }
        self.dirty.clear();
        Ok(())
    }

    /// Delete the record by primary key, returns the affected rows.
    pub fn delete_instance(&self) -> Result<u64> {
        let Some(pk) = self.pk().cloned() else {
            return Err(KeelError::validation(format!(
                "Cannot delete a {} without a primary key",
                self.model.name()
            )));
        };
        self.model
            .delete()
            .filter(self.model.pk().equals(pk))
            .execute()
    }

    /// Reload `fields` (every field when empty) from the backend.
    pub fn refresh(&mut self, fields: &[&str]) -> Result<()> {
        let Some(pk) = self.pk().cloned() else {
            return Err(KeelError::validation(format!(
                "Cannot refresh a {} without a primary key",
                self.model.name()
            )));
        };
        let names = if fields.is_empty() {
            self.model.field_names().map(str::to_string).collect::<Vec<_>>()
        } else {
            fields
                .iter()
                .map(|v| self.model.field_or_err(v).map(|f| f.name().to_string()))
                .collect::<Result<Vec<_>>>()?
        };
        let fresh = self
            .model
            .select_fields(names.iter().map(|v| Selection::from(v.as_str())))
            .filter(self.model.pk().equals(pk))
            .one()?;
        for name in names {
            let value = fresh.get(&name).cloned().unwrap_or_default();
            self.dirty.shift_remove(&name);
            self.values.insert(name, value);
        }
        Ok(())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.pk().is_some() && self.pk() == other.pk()
    }
}

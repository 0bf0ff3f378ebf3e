use crate::{
    AsValue, Condition, Context, Error, Expression, Field, Filter, Fragment, Instance, Join, JoinType,
    KeelError, Model, OP_SEPARATOR, OpCode, Operand, Ordering, Query, QueryResult, Result,
    SelectParts, SqlWriter, Value, separated_by,
};
use super::search::write_column;
use indexmap::{IndexMap, IndexSet};
use std::str::FromStr;

/// Item accepted by [`SelectQuery::fields`].
#[derive(Debug, Clone)]
pub enum Selection {
    /// Field (or column) of the root model.
    Name(String),
    Field(Field),
    /// Every field of the model.
    Model(Model),
    /// The named fields of the model.
    ModelNames(Model, Vec<String>),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Name(value.to_string())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::Name(value)
    }
}

impl From<Field> for Selection {
    fn from(value: Field) -> Self {
        Selection::Field(value)
    }
}

impl From<&Field> for Selection {
    fn from(value: &Field) -> Self {
        Selection::Field(value.clone())
    }
}

impl From<Model> for Selection {
    fn from(value: Model) -> Self {
        Selection::Model(value)
    }
}

impl From<&Model> for Selection {
    fn from(value: &Model) -> Self {
        Selection::Model(value.clone())
    }
}

impl<S: AsRef<str>> From<(&Model, &[S])> for Selection {
    fn from((model, names): (&Model, &[S])) -> Self {
        Selection::ModelNames(
            model.clone(),
            names.iter().map(|v| v.as_ref().to_string()).collect(),
        )
    }
}

/// Item accepted by [`SelectQuery::sort`], names resolve on the active model and a leading `-`
/// sorts descending.
#[derive(Debug, Clone)]
pub enum OrderItem {
    Name(String),
    Field(Field),
    Ordering(Ordering),
}

impl From<&str> for OrderItem {
    fn from(value: &str) -> Self {
        OrderItem::Name(value.to_string())
    }
}

impl From<String> for OrderItem {
    fn from(value: String) -> Self {
        OrderItem::Name(value)
    }
}

impl From<Field> for OrderItem {
    fn from(value: Field) -> Self {
        OrderItem::Field(value)
    }
}

impl From<&Field> for OrderItem {
    fn from(value: &Field) -> Self {
        OrderItem::Field(value.clone())
    }
}

impl From<Ordering> for OrderItem {
    fn from(value: Ordering) -> Self {
        OrderItem::Ordering(value)
    }
}

/// Item accepted by [`SelectQuery::group`].
#[derive(Debug, Clone)]
pub enum GroupItem {
    Name(String),
    Field(Field),
    Model(Model),
}

impl From<&str> for GroupItem {
    fn from(value: &str) -> Self {
        GroupItem::Name(value.to_string())
    }
}

impl From<Field> for GroupItem {
    fn from(value: Field) -> Self {
        GroupItem::Field(value)
    }
}

impl From<&Field> for GroupItem {
    fn from(value: &Field) -> Self {
        GroupItem::Field(value.clone())
    }
}

impl From<&Model> for GroupItem {
    fn from(value: &Model) -> Self {
        GroupItem::Model(value.clone())
    }
}

/// Select statement builder.
///
/// Joins switch the rendering to qualified columns: the root model gets an alias the first time
/// a join is added, then every joined model gets the next free `tN` alias unless an explicit one
/// was requested. The same aliases tell the result which model each selected column belongs to.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    model: Model,
    active: Model,
    filter: Filter,
    distinct: bool,
    fields: IndexSet<Field>,
    order_by: Vec<Ordering>,
    group_by: Vec<Field>,
    limit: Option<u64>,
    offset: Option<u64>,
    joins: IndexMap<String, (Model, Vec<Join>)>,
    aliases: IndexMap<String, String>,
    naive: bool,
}

impl SelectQuery {
    pub fn new(model: Model) -> Self {
        Self {
            active: model.clone(),
            model,
            filter: Default::default(),
            distinct: false,
            fields: Default::default(),
            order_by: Default::default(),
            group_by: Default::default(),
            limit: None,
            offset: None,
            joins: Default::default(),
            aliases: Default::default(),
            naive: false,
        }
    }

    /// Model that filters, sorting and grouping by name currently resolve on.
    pub fn active_model(&self) -> &Model {
        &self.active
    }

    pub fn filter_condition(&self) -> &Filter {
        &self.filter
    }

    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    pub fn joins(&self) -> impl Iterator<Item = (&Model, &Join)> {
        self.joins
            .values()
            .flat_map(|(model, joins)| joins.iter().map(move |join| (model, join)))
    }

    fn known_model(&self, name: &str) -> Option<&Model> {
        if self.model.name() == name {
            return Some(&self.model);
        }
        self.joins
            .get(name)
            .map(|(model, _)| model)
            .or_else(|| self.model.relations().values().find(|v| v.name() == name))
    }

    /// Add fields to the selection.
    ///
    /// Unless the query is distinct, the primary key of the root model and of every model
    /// a selected field belongs to is included as well.
    pub fn fields<S: Into<Selection>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        let items = fields.into_iter().map(Into::into).collect::<Vec<_>>();
        if !self.distinct && !items.is_empty() {
            self.fields.insert(self.model.pk().clone());
        }
        for item in items {
            match item {
                Selection::Name(name) => {
                    if let Some(field) = self.model.field(&name) {
                        self.fields.insert(field.clone());
                    }
                }
                Selection::Field(field) => {
                    if !self.distinct {
                        if let Some(pk) = self.known_model(field.model()).map(|v| v.pk().clone()) {
                            self.fields.insert(pk);
                        }
                    }
                    self.fields.insert(field);
                }
                Selection::Model(model) => self.fields.extend(model.fields().iter().cloned()),
                Selection::ModelNames(model, names) => {
                    self.fields
                        .extend(names.iter().filter_map(|v| model.field(v)).cloned());
                }
            }
        }
        self
    }

    pub(crate) fn is_default_selection(&self) -> bool {
        self.fields.is_empty()
    }

    /// Selected fields in rendering order, by default the root model's fields followed by the
    /// fields of each joined model.
    pub fn selected_fields(&self) -> Vec<Field> {
        if !self.fields.is_empty() {
            return self.fields.iter().cloned().collect();
        }
        let mut result = self.model.fields().to_vec();
        for (model, _) in self.joins.values() {
            result.extend(model.fields().iter().cloned());
        }
        result
    }

    fn generate_alias(aliases: &IndexMap<String, String>, alias: Option<&str>) -> String {
        let mut counter: i64 = if alias.is_some() { -1 } else { 0 };
        let mut candidate = alias.map(str::to_string);
        loop {
            let value = candidate
                .take()
                .unwrap_or_else(|| format!("t{}", aliases.len() as i64 + counter + 1));
            if !aliases.values().any(|v| *v == value) {
                return value;
            }
            counter += 1;
        }
    }

    fn set_alias(&mut self, model: &Model, alias: Option<&str>) {
        if !self.aliases.contains_key(self.model.name()) {
            let value = Self::generate_alias(&self.aliases, None);
            self.aliases.insert(self.model.name().to_string(), value);
        }
        let value = Self::generate_alias(&self.aliases, alias);
        self.aliases.insert(model.name().to_string(), value);
    }

    /// Join `model` through a foreign key of the active model, or a foreign key of `model`
    /// referencing the active model. `on` restricts the foreign key field by name.
    pub fn join(
        mut self,
        model: &Model,
        join_type: JoinType,
        on: Option<&str>,
        alias: Option<&str>,
    ) -> Result<Self> {
        let (lhs, rhs) = if let Some(lhs) = self.active.related_field(model, on) {
            let rhs = lhs
                .foreign_key()
                .map(|v| v.field.clone())
                .unwrap_or_else(|| model.pk().clone());
            (lhs.clone(), rhs)
        } else if let Some(rhs) = self.active.reverse_related_field(model, on) {
            let lhs = rhs
                .foreign_key()
                .map(|v| v.field.clone())
                .unwrap_or_else(|| self.active.pk().clone());
            (lhs, rhs)
        } else {
            return Err(KeelError::validation(format!(
                "No relation found between models {} and {}",
                self.active.name(),
                model.name()
            )));
        };
        self.joins
            .entry(model.name().to_string())
            .or_insert_with(|| (model.clone(), Vec::new()))
            .1
            .push(Join {
                join: join_type,
                lhs,
                rhs,
            });
        self.set_alias(model, alias);
        Ok(self)
    }

    /// Make `model` the active model, it must be the root or a joined model.
    pub fn to(mut self, model: &Model) -> Result<Self> {
        if *model != self.model && !self.joins.contains_key(model.name()) {
            return Err(KeelError::validation(format!(
                "Model {} must be joined before it can be activated",
                model.name()
            )));
        }
        self.active = model.clone();
        Ok(self)
    }

    /// Distinct rows, drops the root primary key from the selection and disables the ordering.
    pub fn distinct(mut self, value: bool) -> Self {
        self.distinct = value;
        self.fields.shift_remove(self.model.pk());
        self
    }

    pub fn limit(mut self, rows: u64) -> Self {
        self.limit = Some(rows);
        self
    }

    pub fn offset(mut self, rows: u64) -> Self {
        self.offset = Some(rows);
        self
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Force single model materialization even when tables are aliased.
    pub fn naive(mut self, value: bool) -> Self {
        self.naive = value;
        self
    }

    pub fn is_naive(&self) -> bool {
        self.naive || self.aliases.is_empty()
    }

    /// Append sort items, names the active model does not know are ignored.
    pub fn sort<O: Into<OrderItem>>(mut self, items: impl IntoIterator<Item = O>) -> Self {
        for item in items {
            let ordering = match item.into() {
                OrderItem::Name(name) => {
                    let (name, descending) = match name.strip_prefix('-') {
                        Some(name) => (name, true),
                        None => (name.as_str(), false),
                    };
                    let Some(field) = self.active.field(name) else {
                        log::debug!("Skipping the sort on {}, unknown field", name);
                        continue;
                    };
                    if descending {
                        field.desc()
                    } else {
                        field.asc()
                    }
                }
                OrderItem::Field(field) => field.asc(),
                OrderItem::Ordering(ordering) => ordering,
            };
            self.order_by.push(ordering);
        }
        self
    }

    /// Replace the current sort items.
    pub fn sort_force<O: Into<OrderItem>>(mut self, items: impl IntoIterator<Item = O>) -> Self {
        self.order_by.clear();
        self.sort(items)
    }

    pub fn group<G: Into<GroupItem>>(mut self, items: impl IntoIterator<Item = G>) -> Self {
        for item in items {
            match item.into() {
                GroupItem::Name(name) => {
                    if let Some(field) = self.active.field(&name) {
                        self.group_by.push(field.clone());
                    }
                }
                GroupItem::Field(field) => self.group_by.push(field),
                GroupItem::Model(model) => self.group_by.extend(model.fields().iter().cloned()),
            }
        }
        self
    }

    pub fn having(self, _condition: impl Into<Condition>) -> Result<Self> {
        Err(KeelError::NotImplemented("The having clause").into())
    }

    /// AND a condition onto the where clause.
    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.filter.push(condition);
        self
    }

    /// AND keyword filters. A key resolves on the active model, or on the first joined model
    /// declaring the field when the active model does not.
    pub fn filter_by<I, K, V>(mut self, filters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        let mut expressions = Vec::new();
        for (key, value) in filters {
            let key = key.as_ref();
            expressions.extend(Expression::convert(self.scope_of(key), [(key, value)])?);
        }
        self.filter.extend(expressions);
        Ok(self)
    }

    fn scope_of(&self, key: &str) -> &Model {
        let name = key
            .rsplit_once(OP_SEPARATOR)
            .filter(|(_, suffix)| OpCode::from_str(suffix).is_ok())
            .map(|(name, _)| name)
            .unwrap_or(key);
        if self.active.field(name).is_some() {
            return &self.active;
        }
        self.joins
            .values()
            .map(|(model, _)| model)
            .find(|model| model.field(name).is_some())
            .unwrap_or(&self.active)
    }

    /// Render into `out`, sharing the placeholder counter of `context`.
    pub(crate) fn write_query(
        &self,
        writer: &dyn SqlWriter,
        outer: &mut Context,
        out: &mut String,
        parameters: &mut Vec<Value>,
    ) -> Result<()> {
        let mut context = Context {
            counter: outer.counter,
            ..Context::new(Fragment::SqlSelect, !self.aliases.is_empty())
        };
        let aliases = &self.aliases;

        let mut columns = String::new();
        separated_by(
            &mut columns,
            self.selected_fields(),
            |out, field| {
                let mut column = String::new();
                write_column(writer, &mut context, &mut column, &field, aliases);
                match field.alias() {
                    Some(alias) => writer.write_column_with_alias(&mut context, out, &column, alias),
                    None => out.push_str(&column),
                }
            },
            ", ",
        );

        let mut table = String::new();
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectFrom);
            let alias = aliases
                .get(self.model.name())
                .map(String::as_str)
                .unwrap_or_default();
            writer.write_table_ref(&mut context.current, &mut table, self.model.table(), alias);
        }

        let mut join = String::new();
        for (model, item) in self.joins() {
            let mut lhs = String::new();
            write_column(writer, &mut context, &mut lhs, &item.lhs, aliases);
            let mut rhs = String::new();
            write_column(writer, &mut context, &mut rhs, &item.rhs, aliases);
            let mut on = String::new();
            writer.write_operation(&mut context, &mut on, OpCode::Eq, &lhs, &[rhs]);
            if !join.is_empty() {
                join.push(' ');
            }
            let alias = aliases
                .get(model.name())
                .map(String::as_str)
                .unwrap_or_default();
            writer.write_join_clause(&mut context, &mut join, item.join, model.table(), alias, &on);
        }

        let mut condition = String::new();
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            self.filter
                .write(writer, &mut context.current, &mut condition, parameters, aliases)?;
        }

        let mut group_by = String::new();
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            separated_by(
                &mut group_by,
                &self.group_by,
                |out, field| write_column(writer, &mut context.current, out, field, aliases),
                ", ",
            );
        }

        let mut order_by = String::new();
        if !self.distinct {
            let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                &mut order_by,
                &self.order_by,
                |out, ordering| {
                    write_column(writer, &mut context.current, out, &ordering.field, aliases);
                    out.push(' ');
                    writer.write_order(&mut context.current, out, ordering.order);
                },
                ", ",
            );
        }

        let mut statement = String::new();
        writer.write_select(
            &mut context,
            &mut statement,
            &SelectParts {
                distinct: self.distinct,
                columns: &columns,
                table: &table,
                join: &join,
                condition: &condition,
                group_by: &group_by,
                having: "",
                order_by: &order_by,
            },
        );
        match (
            self.limit.filter(|v| *v > 0),
            self.offset.filter(|v| *v > 0),
        ) {
            (Some(limit), None) => {
                writer.write_select_with_limit(&mut context, out, &statement, limit)
            }
            (None, Some(offset)) => {
                writer.write_select_with_offset(&mut context, out, &statement, offset)
            }
            (Some(limit), Some(offset)) => {
                writer.write_select_with_pagination(&mut context, out, &statement, limit, offset)
            }
            (None, None) => out.push_str(&statement),
        }
        outer.counter = context.counter;
        Ok(())
    }

    /// Render the counting statement wrapping this query without its ordering.
    pub fn count_sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        let mut query = self.clone();
        query.order_by.clear();
        let (statement, parameters) = query.sql_with(writer)?;
        let mut out = String::new();
        writer.write_select_with_count(&mut Context::default(), &mut out, &statement);
        Ok((out, parameters))
    }

    /// Number of rows matching the query.
    pub fn count(&self) -> Result<u64> {
        let database = self.model.database()?;
        let (statement, parameters) = self.count_sql_with(database.sql_writer())?;
        let mut cursor = database.execute_read(&statement, &parameters)?;
        let row = cursor.fetch();
        cursor.close()?;
        let value = row?
            .and_then(|v| v.values.first().cloned())
            .unwrap_or(Value::Int64(Some(0)));
        let count = Option::<i64>::try_from_value(value)?.unwrap_or_default();
        u64::try_from(count).map_err(|_| Error::msg(format!("Invalid row count {}", count)))
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// The first object of the result, failing with [`KeelError::NoData`] when there is none.
    pub fn one(&self) -> Result<Instance> {
        let mut result = self.execute()?;
        let instance = match result.next() {
            Some(instance) => instance?,
            None => return Err(KeelError::NoData.into()),
        };
        result.close_cursor();
        Ok(instance)
    }

    pub fn first(&self) -> Result<Instance> {
        self.clone().limit(1).one()
    }
}

impl Query for SelectQuery {
    type Output = QueryResult;

    fn model(&self) -> &Model {
        &self.model
    }

    fn sql_with(&self, writer: &dyn SqlWriter) -> Result<(String, Vec<Value>)> {
        let mut out = String::new();
        let mut parameters = Vec::new();
        self.write_query(writer, &mut Context::default(), &mut out, &mut parameters)?;
        Ok((out, parameters))
    }

    fn execute(&self) -> Result<QueryResult> {
        let database = self.model.database()?;
        let (statement, parameters) = self.sql_with(database.sql_writer())?;
        let cursor = database.execute_read(&statement, &parameters)?;
        Ok(QueryResult::new(
            self.model.clone(),
            cursor,
            self.is_naive(),
            self.selected_fields(),
        ))
    }
}

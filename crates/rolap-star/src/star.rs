use crate::aggregate::AggregateCandidate;
use crate::error::StarError;
use crate::warning::{warn, Warning, WarningKind};
use rolap_bitkey::BitKey;
use rolap_model::{
    Aggregator, CatalogConfig, Expression, Level, Measure, Relation, Table as TableDef,
};
use std::collections::HashSet;
use std::fmt;

/// Identity of a star: the fact table alias, then every filter's dialect and
/// SQL text in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarKey(Vec<String>);

impl StarKey {
    pub fn for_fact(fact: &TableDef) -> Self {
        let mut parts = vec![fact.alias().to_string()];
        for filter in &fact.filters {
            parts.push(filter.dialect.clone());
            parts.push(filter.sql.clone());
        }
        Self(parts)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

/// Handle of a star column. The index doubles as the column's bit position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl ColumnId {
    pub fn bit_position(self) -> usize {
        self.0
    }
}

/// `left = right`, where `left` is a column of the parent table and `right`
/// the key of the child table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JoinCondition {
    pub left: Expression,
    pub right: Expression,
}

impl JoinCondition {
    pub fn new(left: Expression, right: Expression) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// The edge from a joined table up to its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Join {
    pub parent: TableId,
    pub condition: JoinCondition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Key,
    Name,
    Ordinal,
    Caption,
    Parent,
    Property,
    Measure(Aggregator),
}

#[derive(Clone, Debug)]
pub struct Column {
    id: ColumnId,
    name: String,
    table: TableId,
    expression: Expression,
    kind: ColumnKind,
    name_column: Option<ColumnId>,
    parent_column: Option<ColumnId>,
    usage_prefix: Option<String>,
}

impl Column {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn bit_position(&self) -> usize {
        self.id.bit_position()
    }

    /// Level, property or measure name the column was registered for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    /// The expression, qualified with the owning table's alias.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// For a key column, the column holding the level's member names.
    pub fn name_column(&self) -> Option<ColumnId> {
        self.name_column
    }

    /// For a key column, the key column of the level above. For ordinal,
    /// caption, parent and property columns, the key column of their level.
    pub fn parent_column(&self) -> Option<ColumnId> {
        self.parent_column
    }

    pub fn usage_prefix(&self) -> Option<&str> {
        self.usage_prefix.as_deref()
    }
}

/// Columns are the same column when they read the same expression from the
/// same table.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.expression == other.expression
    }
}

impl Eq for Column {}

#[derive(Clone, Debug)]
pub(crate) struct TableNode {
    alias: String,
    relation: TableDef,
    join: Option<Join>,
    columns: Vec<ColumnId>,
    children: Vec<TableId>,
}

impl TableNode {
    fn answers_to(&self, name: &str) -> bool {
        self.alias == name || self.relation.answers_to(name)
    }
}

/// Everything needed to register one column against a level's table.
struct NewColumn<'a> {
    name: &'a str,
    expression: &'a Expression,
    kind: ColumnKind,
    name_column: Option<ColumnId>,
    parent_column: Option<ColumnId>,
    usage_prefix: Option<&'a str>,
}

/// The join tree of one fact table and the columns registered on it.
#[derive(Clone, Debug)]
pub struct Star {
    key: StarKey,
    tables: Vec<TableNode>,
    columns: Vec<Column>,
    aliases: HashSet<String>,
    allocated: BitKey,
    strict_level_tables: bool,
    pub(crate) aggregates: Vec<AggregateCandidate>,
}

const FACT: TableId = TableId(0);

impl Star {
    pub fn new(fact: &TableDef, config: &CatalogConfig) -> Self {
        let alias = fact.alias().to_string();
        let mut aliases = HashSet::new();
        aliases.insert(alias.clone());
        Self {
            key: StarKey::for_fact(fact),
            tables: vec![TableNode {
                alias,
                relation: fact.clone(),
                join: None,
                columns: Vec::new(),
                children: Vec::new(),
            }],
            columns: Vec::new(),
            aliases,
            allocated: BitKey::with_capacity(config.initial_column_capacity),
            strict_level_tables: config.strict_level_tables,
            aggregates: Vec::new(),
        }
    }

    pub fn key(&self) -> &StarKey {
        &self.key
    }

    pub fn fact_table(&self) -> TableRef<'_> {
        self.table(FACT)
    }

    pub fn fact_table_id(&self) -> TableId {
        FACT
    }

    pub fn table(&self, id: TableId) -> TableRef<'_> {
        TableRef { star: self, id }
    }

    /// All tables, parents before children.
    pub fn tables(&self) -> impl Iterator<Item = TableRef<'_>> {
        (0..self.tables.len()).map(move |idx| self.table(TableId(idx)))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Find a table anywhere in the star by its (uniquified) alias.
    pub fn find_table(&self, alias: &str) -> Option<TableRef<'_>> {
        self.tables().find(|t| t.alias() == alias)
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.columns[id.0]
    }

    /// The column owning bit position `bit`.
    pub fn column_at(&self, bit: usize) -> Option<&Column> {
        self.columns.get(bit)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// A copy of the key holding every allocated bit position.
    pub fn allocated_key(&self) -> BitKey {
        self.allocated.clone()
    }

    /// A key holding the bit positions of `columns`.
    pub fn key_for_columns<I>(&self, columns: I) -> BitKey
    where
        I: IntoIterator<Item = ColumnId>,
    {
        let mut key = BitKey::with_capacity(self.columns.len());
        for id in columns {
            key.set(id.bit_position());
        }
        key
    }

    pub fn lookup_column(&self, alias: &str, expression: &Expression) -> Option<&Column> {
        self.find_table(alias)?.lookup_column(expression)
    }

    fn node(&self, id: TableId) -> &TableNode {
        &self.tables[id.0]
    }

    pub(crate) fn find_ancestor(&self, from: TableId, name: &str) -> Option<TableId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.node(id);
            if node.answers_to(name) {
                return Some(id);
            }
            current = node.join.as_ref().map(|j| j.parent);
        }
        None
    }

    /// Join `relation` below `parent`, returning the table the rest of the
    /// hierarchy hangs from.
    ///
    /// For a single table that is the table itself. For a join tree the left
    /// side is joined first and the right side is joined below it, so the
    /// result is the last table of the chain. A table already joined to the
    /// same parent on the same condition is reused.
    pub fn add_join(
        &mut self,
        parent: TableId,
        relation: &Relation,
        condition: JoinCondition,
    ) -> Result<TableId, StarError> {
        match relation {
            Relation::Table(def) => Ok(match self.find_child(parent, def, &condition) {
                Some(existing) => existing,
                None => self.add_child(parent, def, condition),
            }),
            Relation::Join(join) => {
                let left = self.add_join(parent, &join.left, condition)?;
                let left_alias = join.left_alias();
                let left_table = self.find_ancestor(left, left_alias).ok_or_else(|| {
                    StarError::UnresolvedAlias {
                        star: self.fact_table().alias().to_string(),
                        alias: left_alias.to_string(),
                    }
                })?;
                let condition = JoinCondition::new(
                    Expression::column(self.node(left_table).alias.clone(), join.left_key.clone()),
                    Expression::column(join.right_alias(), join.right_key.clone()),
                );
                self.add_join(left, &join.right, condition)
            }
        }
    }

    fn find_child(
        &self,
        parent: TableId,
        def: &TableDef,
        condition: &JoinCondition,
    ) -> Option<TableId> {
        self.node(parent).children.iter().copied().find(|&id| {
            let child = self.node(id);
            child.relation == *def
                && child.join.as_ref().is_some_and(|join| {
                    join.condition.left == condition.left
                        && join.condition.right == condition.right.with_table_alias(&child.alias)
                })
        })
    }

    fn add_child(&mut self, parent: TableId, def: &TableDef, condition: JoinCondition) -> TableId {
        let alias = self.allocate_alias(def.alias());
        let id = TableId(self.tables.len());
        let condition = JoinCondition::new(condition.left, condition.right.with_table_alias(&alias));
        log::debug!(
            "star {}: joining {} as {alias} on {condition}",
            self.fact_table().alias(),
            def.name
        );
        self.tables.push(TableNode {
            alias,
            relation: def.clone(),
            join: Some(Join { parent, condition }),
            columns: Vec::new(),
            children: Vec::new(),
        });
        self.tables[parent.0].children.push(id);
        id
    }

    fn allocate_alias(&mut self, candidate: &str) -> String {
        let alias = if self.aliases.contains(candidate) {
            let mut suffix = 1;
            loop {
                let alias = format!("{candidate}_{suffix}");
                if !self.aliases.contains(&alias) {
                    break alias;
                }
                suffix += 1;
            }
        } else {
            candidate.to_string()
        };
        self.aliases.insert(alias.clone());
        alias
    }

    /// Register the columns of `level` against `table` (or the ancestor the
    /// level's expressions name) and return the level's key column.
    ///
    /// Returns `None` for a level without a key expression.
    pub fn make_columns(
        &mut self,
        table: TableId,
        level: &Level,
        parent_column: Option<ColumnId>,
        usage_prefix: Option<&str>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<ColumnId>, StarError> {
        let Some(key) = &level.key else {
            return Ok(None);
        };

        let name_column = match &level.name_expression {
            Some(expression) => Some(self.make_level_column(
                table,
                level,
                NewColumn {
                    name: &level.name,
                    expression,
                    kind: ColumnKind::Name,
                    name_column: None,
                    parent_column: None,
                    usage_prefix,
                },
                warnings,
            )?),
            None => None,
        };

        let key_column = self.make_level_column(
            table,
            level,
            NewColumn {
                name: &level.name,
                expression: key,
                kind: ColumnKind::Key,
                name_column,
                parent_column,
                usage_prefix,
            },
            warnings,
        )?;

        let extras = [
            (ColumnKind::Ordinal, &level.ordinal),
            (ColumnKind::Caption, &level.caption),
            (ColumnKind::Parent, &level.parent),
        ];
        for (kind, expression) in extras {
            if let Some(expression) = expression {
                self.make_level_column(
                    table,
                    level,
                    NewColumn {
                        name: &level.name,
                        expression,
                        kind,
                        name_column: None,
                        parent_column: Some(key_column),
                        usage_prefix,
                    },
                    warnings,
                )?;
            }
        }

        for property in &level.properties {
            self.make_level_column(
                table,
                level,
                NewColumn {
                    name: &property.name,
                    expression: &property.expression,
                    kind: ColumnKind::Property,
                    name_column: None,
                    parent_column: Some(key_column),
                    usage_prefix,
                },
                warnings,
            )?;
        }

        Ok(Some(key_column))
    }

    fn make_level_column(
        &mut self,
        table: TableId,
        level: &Level,
        wanted: NewColumn<'_>,
        warnings: &mut Vec<Warning>,
    ) -> Result<ColumnId, StarError> {
        let target = match wanted.expression.table_alias().or(level.table.as_deref()) {
            None => table,
            Some(name) => match self.find_ancestor(table, name) {
                Some(found) => found,
                None if self.strict_level_tables => {
                    return Err(StarError::LevelTableNotFound {
                        level: level.name.clone(),
                        table: name.to_string(),
                    });
                }
                None => {
                    warn(
                        warnings,
                        WarningKind::LevelTableNotFound,
                        format!(
                            "level {} references table {name}, which is not joined above {}; registering {} against {}",
                            level.name,
                            self.node(table).alias,
                            wanted.expression,
                            self.node(table).alias,
                        ),
                    );
                    table
                }
            },
        };

        let expression = wanted.expression.with_table_alias(&self.node(target).alias);
        if let Some(existing) = self.table(target).lookup_column(&expression) {
            let id = existing.id;
            let column = &mut self.columns[id.0];
            // A level named by its own key: the key role wins.
            if wanted.kind == ColumnKind::Key && column.kind == ColumnKind::Name {
                column.kind = ColumnKind::Key;
            }
            if column.kind == wanted.kind && column.parent_column.is_none() {
                column.parent_column = wanted.parent_column;
            }
            // A name column that is also the key column would point at itself.
            if wanted.name_column != Some(id) && column.name_column.is_none() {
                column.name_column = wanted.name_column;
            }
            return Ok(id);
        }

        Ok(self.add_column(Column {
            id: ColumnId(self.columns.len()),
            name: wanted.name.to_string(),
            table: target,
            expression,
            kind: wanted.kind,
            name_column: wanted.name_column,
            parent_column: wanted.parent_column,
            usage_prefix: wanted.usage_prefix.map(str::to_string),
        }))
    }

    /// Register a measure as a fact table column.
    pub fn register_measure(&mut self, measure: &Measure) -> ColumnId {
        let expression = match measure.expression.table_alias() {
            Some(_) => measure.expression.clone(),
            None => measure
                .expression
                .with_table_alias(&self.node(FACT).alias),
        };
        let kind = ColumnKind::Measure(measure.aggregator);
        let existing = self
            .fact_table()
            .columns()
            .find(|c| c.kind == kind && c.name == measure.name && c.expression == expression)
            .map(Column::id);
        if let Some(id) = existing {
            return id;
        }

        self.add_column(Column {
            id: ColumnId(self.columns.len()),
            name: measure.name.clone(),
            table: FACT,
            expression,
            kind,
            name_column: None,
            parent_column: None,
            usage_prefix: None,
        })
    }

    fn add_column(&mut self, column: Column) -> ColumnId {
        let id = column.id;
        debug_assert_eq!(id.0, self.columns.len(), "bit positions are allocated in order");
        self.allocated.set(id.bit_position());
        self.tables[column.table.0].columns.push(id);
        self.columns.push(column);
        id
    }

    fn fmt_table(&self, f: &mut fmt::Formatter<'_>, id: TableId, depth: usize) -> fmt::Result {
        let node = self.node(id);
        let indent = depth * 2;
        write!(f, "{:indent$}{} ({})", "", node.alias, node.relation.name)?;
        if let Some(join) = &node.join {
            write!(f, " on {}", join.condition)?;
        }
        writeln!(f)?;
        for &column in &node.columns {
            let column = self.column(column);
            writeln!(
                f,
                "{:indent$}  #{} {}: {}",
                "",
                column.bit_position(),
                column.name,
                column.expression
            )?;
        }
        for &child in &node.children {
            self.fmt_table(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_table(f, FACT, 0)
    }
}

/// A borrowed view of one table of a [`Star`].
#[derive(Clone, Copy)]
pub struct TableRef<'a> {
    star: &'a Star,
    id: TableId,
}

impl<'a> TableRef<'a> {
    fn node(&self) -> &'a TableNode {
        self.star.node(self.id)
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// The alias the table is known by in this star. Unique within the star.
    pub fn alias(&self) -> &'a str {
        &self.node().alias
    }

    pub fn relation(&self) -> &'a TableDef {
        &self.node().relation
    }

    pub fn is_fact(&self) -> bool {
        self.id == FACT
    }

    pub fn join(&self) -> Option<&'a Join> {
        self.node().join.as_ref()
    }

    pub fn parent(&self) -> Option<TableRef<'a>> {
        self.join().map(|join| self.star.table(join.parent))
    }

    pub fn children(&self) -> impl Iterator<Item = TableRef<'a>> + 'a {
        let star = self.star;
        self.node().children.iter().map(move |&id| star.table(id))
    }

    pub fn columns(&self) -> impl Iterator<Item = &'a Column> + 'a {
        let star = self.star;
        self.node().columns.iter().map(move |&id| star.column(id))
    }

    /// This table or the closest parent whose alias or declared name is `name`.
    pub fn find_ancestor(&self, name: &str) -> Option<TableRef<'a>> {
        self.star
            .find_ancestor(self.id, name)
            .map(|id| self.star.table(id))
    }

    /// This table or the first table below it (depth first) answering to `name`.
    pub fn find_descendant(&self, name: &str) -> Option<TableRef<'a>> {
        if self.node().answers_to(name) {
            return Some(*self);
        }
        self.children().find_map(|child| child.find_descendant(name))
    }

    pub fn lookup_column(&self, expression: &Expression) -> Option<&'a Column> {
        self.columns().find(|c| &c.expression == expression)
    }
}

impl fmt::Debug for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRef")
            .field("id", &self.id)
            .field("alias", &self.alias())
            .finish()
    }
}

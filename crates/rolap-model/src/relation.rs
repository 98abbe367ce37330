use crate::expr::SqlFragment;
use serde::{Deserialize, Serialize};

/// A physical table, optionally aliased and filtered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    /// `WHERE` fragments applied whenever the table is read, per dialect.
    #[serde(default)]
    pub filters: Vec<SqlFragment>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            schema: None,
            filters: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_filter(mut self, filter: SqlFragment) -> Self {
        self.filters.push(filter);
        self
    }

    /// The alias the table is referenced by; its name when no alias is set.
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether `name` refers to this table, by alias first and then by name.
    pub fn answers_to(&self, name: &str) -> bool {
        self.alias() == name || self.name == name
    }
}

/// A join between two relations.
///
/// `left_key` is a column of the left side, `right_key` a column of the right
/// side. When a side is itself a join, the alias of the table holding the key
/// must be given explicitly or is taken from that join's leftmost table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    #[serde(default)]
    pub left_alias: Option<String>,
    pub left_key: String,
    pub left: Relation,
    #[serde(default)]
    pub right_alias: Option<String>,
    pub right_key: String,
    pub right: Relation,
}

impl Join {
    pub fn left_alias(&self) -> &str {
        self.left_alias
            .as_deref()
            .unwrap_or_else(|| self.left.leftmost().alias())
    }

    pub fn right_alias(&self) -> &str {
        self.right_alias
            .as_deref()
            .unwrap_or_else(|| self.right.leftmost().alias())
    }

    /// Exchange the two sides, keys and aliases included.
    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.left_alias, &mut self.right_alias);
        std::mem::swap(&mut self.left_key, &mut self.right_key);
        std::mem::swap(&mut self.left, &mut self.right);
    }
}

/// A table or a tree of joined tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Relation {
    Table(Table),
    Join(Box<Join>),
}

impl Relation {
    pub fn table(name: impl Into<String>) -> Self {
        Relation::Table(Table::new(name))
    }

    pub fn join(
        left: Relation,
        left_key: impl Into<String>,
        right: Relation,
        right_key: impl Into<String>,
    ) -> Self {
        Relation::Join(Box::new(Join {
            left_alias: None,
            left_key: left_key.into(),
            left,
            right_alias: None,
            right_key: right_key.into(),
            right,
        }))
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Relation::Table(table) => Some(table),
            Relation::Join(_) => None,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Relation::Join(_))
    }

    /// The leftmost table of the tree.
    pub fn leftmost(&self) -> &Table {
        match self {
            Relation::Table(table) => table,
            Relation::Join(join) => join.left.leftmost(),
        }
    }

    /// Tables in left-to-right order.
    pub fn tables(&self) -> Vec<&Table> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<&'a Table>) {
        match self {
            Relation::Table(table) => out.push(table),
            Relation::Join(join) => {
                join.left.collect_tables(out);
                join.right.collect_tables(out);
            }
        }
    }

    /// Find a table by alias or name.
    pub fn find(&self, name: &str) -> Option<&Table> {
        let tables = self.tables();
        tables
            .iter()
            .find(|t| t.alias() == name)
            .or_else(|| tables.iter().find(|t| t.name == name))
            .copied()
    }
}

impl From<Table> for Relation {
    fn from(table: Table) -> Self {
        Relation::Table(table)
    }
}

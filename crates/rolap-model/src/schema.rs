use crate::expr::Expression;
use crate::relation::{Relation, Table};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fact of cube {cube} must be a table, not a join")]
    FactIsJoin { cube: String },

    #[error("cube {cube} uses unknown shared dimension {dimension}")]
    UnknownSharedDimension { cube: String, dimension: String },
}

/// A catalog's dimensional schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    /// Dimensions declared once and attached to cubes by name.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub cubes: Vec<Cube>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: Vec::new(),
            cubes: Vec::new(),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn shared_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn cube(&self, name: &str) -> Option<&Cube> {
        self.cubes.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cube {
    pub name: String,
    pub fact: Relation,
    #[serde(default)]
    pub dimensions: Vec<CubeDimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Cube {
    pub fn new(name: impl Into<String>, fact: impl Into<Relation>) -> Self {
        Self {
            name: name.into(),
            fact: fact.into(),
            dimensions: Vec::new(),
            measures: Vec::new(),
        }
    }

    pub fn with_dimension(mut self, dimension: impl Into<CubeDimension>) -> Self {
        self.dimensions.push(dimension.into());
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn fact_table(&self) -> Result<&Table, ModelError> {
        self.fact.as_table().ok_or_else(|| ModelError::FactIsJoin {
            cube: self.name.clone(),
        })
    }

    /// Resolve an attachment to the dimension it declares or references.
    pub fn resolve_dimension<'a>(
        &'a self,
        schema: &'a Schema,
        attachment: &'a CubeDimension,
    ) -> Result<&'a Dimension, ModelError> {
        match attachment {
            CubeDimension::Private(dimension) => Ok(dimension),
            CubeDimension::Usage(usage) => schema.shared_dimension(&usage.source).ok_or_else(|| {
                ModelError::UnknownSharedDimension {
                    cube: self.name.clone(),
                    dimension: usage.source.clone(),
                }
            }),
        }
    }
}

/// How a dimension is attached to a cube.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CubeDimension {
    /// A reference to a shared dimension.
    Usage(DimensionUsage),
    /// A dimension declared inside the cube.
    Private(Dimension),
}

impl CubeDimension {
    pub fn name(&self) -> &str {
        match self {
            CubeDimension::Usage(usage) => &usage.name,
            CubeDimension::Private(dimension) => &dimension.name,
        }
    }

    pub fn foreign_key(&self) -> Option<&str> {
        match self {
            CubeDimension::Usage(usage) => usage.foreign_key.as_deref(),
            CubeDimension::Private(dimension) => dimension.foreign_key.as_deref(),
        }
    }

    /// The level the fact table joins at, when not the leaf level.
    pub fn join_level(&self) -> Option<&str> {
        match self {
            CubeDimension::Usage(usage) => usage.level.as_deref(),
            CubeDimension::Private(_) => None,
        }
    }
}

impl From<DimensionUsage> for CubeDimension {
    fn from(usage: DimensionUsage) -> Self {
        CubeDimension::Usage(usage)
    }
}

impl From<Dimension> for CubeDimension {
    fn from(dimension: Dimension) -> Self {
        CubeDimension::Private(dimension)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionUsage {
    /// Name of the dimension within the cube, e.g. `Ship Date`.
    pub name: String,
    /// Name of the shared dimension, e.g. `Time`.
    pub source: String,
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub usage_prefix: Option<String>,
}

impl DimensionUsage {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            foreign_key: None,
            level: None,
            usage_prefix: None,
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_usage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.usage_prefix = Some(prefix.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    /// Only meaningful for private dimensions; shared dimensions take the
    /// foreign key from each usage.
    #[serde(default)]
    pub foreign_key: Option<String>,
    pub hierarchies: Vec<Hierarchy>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, hierarchies: Vec<Hierarchy>) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            hierarchies,
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    /// Defaults to the dimension name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Table holding `primary_key` when `relation` is a join.
    #[serde(default)]
    pub primary_key_table: Option<String>,
    /// `None` reads the hierarchy from the fact table.
    #[serde(default)]
    pub relation: Option<Relation>,
    /// Ordered from the top (least specific) level to the leaf level.
    pub levels: Vec<Level>,
    #[serde(default)]
    pub member_reader: Option<String>,
}

impl Hierarchy {
    pub fn new(levels: Vec<Level>) -> Self {
        Self {
            name: None,
            primary_key: None,
            primary_key_table: None,
            relation: None,
            levels,
            member_reader: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_relation(mut self, relation: impl Into<Relation>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    pub fn with_primary_key_table(mut self, table: impl Into<String>) -> Self {
        self.primary_key_table = Some(table.into());
        self
    }

    pub fn with_member_reader(mut self, reader: impl Into<String>) -> Self {
        self.member_reader = Some(reader.into());
        self
    }

    pub fn name_or<'a>(&'a self, dimension: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(dimension)
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    pub fn has_level(&self, name: &str) -> bool {
        self.level(name).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    /// Alias of the table the level's columns live in.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub key: Option<Expression>,
    #[serde(default)]
    pub name_expression: Option<Expression>,
    #[serde(default)]
    pub ordinal: Option<Expression>,
    #[serde(default)]
    pub caption: Option<Expression>,
    /// Parent key of a parent-child level.
    #[serde(default)]
    pub parent: Option<Expression>,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// The synthetic `(All)` level.
    #[serde(default)]
    pub is_all: bool,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            key: None,
            name_expression: None,
            ordinal: None,
            caption: None,
            parent: None,
            properties: Vec::new(),
            is_all: false,
        }
    }

    pub fn all() -> Self {
        Self {
            is_all: true,
            ..Self::new("(All)")
        }
    }

    /// A level keyed by `table.column`.
    pub fn keyed(name: impl Into<String>, table: impl Into<String>, column: &str) -> Self {
        let table = table.into();
        Self {
            key: Some(Expression::column(table.clone(), column)),
            table: Some(table),
            ..Self::new(name)
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_key(mut self, key: Expression) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_name_expression(mut self, expr: Expression) -> Self {
        self.name_expression = Some(expr);
        self
    }

    pub fn with_ordinal(mut self, expr: Expression) -> Self {
        self.ordinal = Some(expr);
        self
    }

    pub fn with_caption(mut self, expr: Expression) -> Self {
        self.caption = Some(expr);
        self
    }

    pub fn with_parent(mut self, expr: Expression) -> Self {
        self.parent = Some(expr);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, expr: Expression) -> Self {
        self.properties.push(Property {
            name: name.into(),
            expression: expr,
        });
        self
    }

    /// The explicit table, else the table the key column is qualified with.
    pub fn table_name(&self) -> Option<&str> {
        self.table
            .as_deref()
            .or_else(|| self.key.as_ref().and_then(Expression::table_alias))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub expression: Expression,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregator {
    #[default]
    Sum,
    Count,
    DistinctCount,
    Min,
    Max,
    Avg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub expression: Expression,
    #[serde(default)]
    pub aggregator: Aggregator,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: Expression, aggregator: Aggregator) -> Self {
        Self {
            name: name.into(),
            expression,
            aggregator,
        }
    }
}

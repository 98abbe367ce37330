use crate::error::StarError;
use crate::star::StarKey;
use crate::warning::{warn, Warning, WarningKind};
use rolap_model::{Cube, CubeDimension, Dimension, Expression, Hierarchy, Relation, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UsageKind {
    /// A shared dimension referenced by the cube.
    Shared,
    /// A dimension declared inside the cube.
    Private,
}

/// One attachment of a hierarchy to a cube's fact table.
#[derive(Clone, Debug)]
pub struct HierarchyUsage {
    pub kind: UsageKind,
    /// Star the cube's fact table maps to.
    pub fact: StarKey,
    pub cube: String,
    /// Dimension name within the cube, e.g. `Ship Date`.
    pub name: String,
    pub hierarchy_name: String,
    /// Position of the hierarchy within its dimension.
    pub hierarchy_index: usize,
    /// Shared dimension name, e.g. `Time`.
    pub source: Option<String>,
    /// Column of the fact table referencing the hierarchy.
    pub foreign_key: Option<String>,
    /// Level the join is anchored at; `None` means the leaf level.
    pub level_name: Option<String>,
    pub usage_prefix: Option<String>,
    /// Alias of the hierarchy table the fact table joins to. `None` when the
    /// hierarchy lives in the fact table.
    pub join_table: Option<String>,
    /// Key on `join_table` matched against `foreign_key`.
    pub join_expression: Option<Expression>,
}

/// Two usages are the same attachment when they join the same hierarchy to
/// the same fact table through the same key at the same level.
impl PartialEq for HierarchyUsage {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.fact == other.fact
            && self.hierarchy_name == other.hierarchy_name
            && self.name == other.name
            && self.source == other.source
            && self.foreign_key == other.foreign_key
            && self.level_name == other.level_name
    }
}

impl Eq for HierarchyUsage {}

impl HierarchyUsage {
    /// Whether the hierarchy is read straight from the fact table.
    pub fn in_fact_table(&self) -> bool {
        self.join_table.is_none()
    }
}

/// `Ship Date` becomes `ship_date_`.
fn derive_prefix(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    prefix.push('_');
    prefix
}

/// The table `name` of a hierarchy relation. Without a name, the relation's
/// leftmost table, which holds the leaf level of a canonical snowflake.
fn find_join_table<'a>(
    relation: &'a Relation,
    name: Option<&str>,
    hierarchy: &str,
) -> Result<&'a Table, StarError> {
    match name {
        Some(name) => relation
            .find(name)
            .ok_or_else(|| StarError::UnknownPrimaryKeyTable {
                hierarchy: hierarchy.to_string(),
                table: name.to_string(),
            }),
        None => Ok(relation.leftmost()),
    }
}

/// Which hierarchies of `dimension` an attachment uses.
fn selected_hierarchies(
    cube: &Cube,
    attachment: &CubeDimension,
    dimension: &Dimension,
    warnings: &mut Vec<Warning>,
) -> Vec<usize> {
    let count = dimension.hierarchies.len();
    if count <= 1 {
        return (0..count).collect();
    }
    let Some(level) = attachment.join_level() else {
        return (0..count).collect();
    };
    let matching: Vec<usize> = dimension
        .hierarchies
        .iter()
        .enumerate()
        .filter(|(_, h)| h.has_level(level))
        .map(|(idx, _)| idx)
        .collect();
    if matching.is_empty() {
        warn(
            warnings,
            WarningKind::UnknownJoinLevel,
            format!(
                "no hierarchy of dimension {} in cube {} has level {level}; using its first hierarchy",
                attachment.name(),
                cube.name
            ),
        );
        return vec![0];
    }
    matching
}

/// Build the usages of one cube dimension.
///
/// `same_source_uses` is how many attachments of the cube reference the same
/// shared dimension; more than one gives each a usage prefix derived from its
/// name unless the schema sets one.
pub fn resolve_usages(
    cube: &Cube,
    fact: &StarKey,
    attachment: &CubeDimension,
    dimension: &Dimension,
    same_source_uses: usize,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<HierarchyUsage>, StarError> {
    let (kind, source, usage_prefix) = match attachment {
        CubeDimension::Usage(usage) => {
            let prefix = usage.usage_prefix.clone().or_else(|| {
                (same_source_uses > 1).then(|| derive_prefix(&usage.name))
            });
            (UsageKind::Shared, Some(usage.source.clone()), prefix)
        }
        CubeDimension::Private(_) => (UsageKind::Private, None, None),
    };

    let mut usages = Vec::new();
    for idx in selected_hierarchies(cube, attachment, dimension, warnings) {
        let hierarchy = &dimension.hierarchies[idx];
        let hierarchy_name = hierarchy.name_or(&dimension.name).to_string();
        let (join_table, join_expression) =
            join_target(cube, attachment, hierarchy, &hierarchy_name)?;

        let foreign_key = attachment.foreign_key().map(str::to_string);
        if join_table.is_some() && foreign_key.is_none() {
            return Err(StarError::MissingForeignKey {
                hierarchy: hierarchy_name,
                cube: cube.name.clone(),
            });
        }

        usages.push(HierarchyUsage {
            kind,
            fact: fact.clone(),
            cube: cube.name.clone(),
            name: attachment.name().to_string(),
            hierarchy_name,
            hierarchy_index: idx,
            source: source.clone(),
            foreign_key,
            level_name: attachment.join_level().map(str::to_string),
            usage_prefix: usage_prefix.clone(),
            join_table,
            join_expression,
        });
    }
    Ok(usages)
}

/// The hierarchy table and key the fact table joins to, or `(None, None)` for
/// a hierarchy living in the fact table.
fn join_target(
    cube: &Cube,
    attachment: &CubeDimension,
    hierarchy: &Hierarchy,
    hierarchy_name: &str,
) -> Result<(Option<String>, Option<Expression>), StarError> {
    let relation = match &hierarchy.relation {
        Some(relation) if *relation != cube.fact => relation,
        _ => return Ok((None, None)),
    };

    let join_level = attachment.join_level().and_then(|name| hierarchy.level(name));
    if let Some(level) = join_level {
        if let Some(key) = &level.key {
            let table = find_join_table(relation, level.table_name(), hierarchy_name)?;
            let alias = table.alias().to_string();
            let expression = match key.table_alias() {
                Some(_) => key.clone(),
                None => key.with_table_alias(&alias),
            };
            return Ok((Some(alias), Some(expression)));
        }
    }

    let Some(primary_key) = &hierarchy.primary_key else {
        return Err(StarError::MissingPrimaryKey {
            hierarchy: hierarchy_name.to_string(),
            cube: cube.name.clone(),
        });
    };
    let table = find_join_table(
        relation,
        hierarchy.primary_key_table.as_deref(),
        hierarchy_name,
    )?;
    Ok((
        Some(table.alias().to_string()),
        Some(Expression::column(table.alias(), primary_key.clone())),
    ))
}

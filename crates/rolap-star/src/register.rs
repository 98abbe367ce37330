use crate::canonical::{self, Reshaped};
use crate::error::StarError;
use crate::star::{ColumnId, JoinCondition, Star, TableId};
use crate::usage::HierarchyUsage;
use crate::warning::{warn, Warning, WarningKind};
use rolap_model::{CatalogConfig, Expression, Hierarchy, Relation};
use std::borrow::Cow;

/// Join a usage's hierarchy into `star` and register its level columns.
///
/// Returns the key column of every registered level, top level first.
pub(crate) fn register_usage(
    star: &mut Star,
    hierarchy: &Hierarchy,
    usage: &HierarchyUsage,
    config: &CatalogConfig,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<(String, ColumnId)>, StarError> {
    let table = match (&hierarchy.relation, &usage.join_expression) {
        (Some(relation), Some(join_expression)) if !usage.in_fact_table() => {
            let relation = prepare_relation(relation, hierarchy, usage, config, warnings);
            // The fact table joins to the leftmost table of the relation.
            let leftmost = relation.leftmost().alias();
            if let Some(table) = usage.join_table.as_deref().filter(|&t| t != leftmost) {
                return Err(StarError::JoinTableNotLeftmost {
                    hierarchy: usage.hierarchy_name.clone(),
                    cube: usage.cube.clone(),
                    table: table.to_string(),
                    leftmost: leftmost.to_string(),
                });
            }
            let foreign_key = usage
                .foreign_key
                .as_deref()
                .ok_or_else(|| StarError::MissingForeignKey {
                    hierarchy: usage.hierarchy_name.clone(),
                    cube: usage.cube.clone(),
                })?;
            let condition = JoinCondition::new(
                Expression::column(star.fact_table().alias(), foreign_key),
                join_expression.clone(),
            );
            star.add_join(star.fact_table_id(), &relation, condition)?
        }
        _ => star.fact_table_id(),
    };
    register_levels(star, table, hierarchy, usage, warnings)
}

/// The relation as it should be joined: canonicalized when it is a snowflake
/// (only at an explicit level if `canonicalize_all_snowflakes` is off), then
/// clipped at that level.
fn prepare_relation<'a>(
    relation: &'a Relation,
    hierarchy: &Hierarchy,
    usage: &HierarchyUsage,
    config: &CatalogConfig,
    warnings: &mut Vec<Warning>,
) -> Cow<'a, Relation> {
    if !relation.is_join() {
        return Cow::Borrowed(relation);
    }
    let mut out = Cow::Borrowed(relation);

    if usage.level_name.is_some() || config.canonicalize_all_snowflakes {
        match canonical::reorder(relation, &hierarchy.levels) {
            Reshaped::Tree(tree) => out = Cow::Owned(tree),
            Reshaped::Unchanged { reason, .. } => warn(
                warnings,
                WarningKind::CanonicalizationSkipped,
                format!(
                    "hierarchy {} of {} in cube {} joined as declared: {reason}",
                    usage.hierarchy_name, usage.name, usage.cube
                ),
            ),
            Reshaped::Collapsed => {}
        }
    }

    if let Some(level) = &usage.level_name {
        match canonical::snip_below(&out, &hierarchy.levels, level) {
            Reshaped::Tree(tree) => out = Cow::Owned(tree),
            Reshaped::Unchanged { reason, .. } => warn(
                warnings,
                WarningKind::SnipSkipped,
                format!(
                    "hierarchy {} of {} in cube {} not clipped at level {level}: {reason}",
                    usage.hierarchy_name, usage.name, usage.cube
                ),
            ),
            Reshaped::Collapsed => warn(
                warnings,
                WarningKind::SnipSkipped,
                format!(
                    "clipping hierarchy {} of {} in cube {} at level {level} leaves no table; joining it whole",
                    usage.hierarchy_name, usage.name, usage.cube
                ),
            ),
        }
    }
    out
}

fn register_levels(
    star: &mut Star,
    table: TableId,
    hierarchy: &Hierarchy,
    usage: &HierarchyUsage,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<(String, ColumnId)>, StarError> {
    let mut registered = Vec::new();
    let mut parent = None;
    for level in hierarchy.levels.iter().filter(|l| !l.is_all) {
        let key = star.make_columns(
            table,
            level,
            parent,
            usage.usage_prefix.as_deref(),
            warnings,
        )?;
        if let Some(key) = key {
            registered.push((level.name.clone(), key));
            parent = Some(key);
        }
        if usage.level_name.as_deref() == Some(level.name.as_str()) {
            break;
        }
    }
    Ok(registered)
}

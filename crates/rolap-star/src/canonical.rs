//! Canonical form for snowflaked hierarchy relations.
//!
//! The star builder joins a relation by walking it left to right: the
//! leftmost table is joined to the fact table and each following table is
//! joined below the previous one. That only produces the right chain when the
//! relation is in canonical form:
//!
//! - tables of deeper (more specific) levels are to the left of tables of
//!   shallower levels, and
//! - no join has a join as its left child, so joins nest to the right.
//!
//! ```text
//!        J                   J
//!       / \                 / \
//!      J   Year   ==>     Day  J
//!     / \                     / \
//!   Day  Month            Month  Year
//! ```
//!
//! Trees where both children of some join are joins are not supported and
//! are returned unchanged.

use rolap_model::{Join, Level, Relation};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Why a relation was left as declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two levels besides the `(All)` level.
    TooFewLevels,
    /// A level does not say which table it lives in.
    LevelWithoutTable { level: String },
    /// A table of the relation belongs to no level.
    UnmatchedTable { table: String },
    /// Some join has joins on both sides.
    BalancedJoin,
    /// The table to snip is not part of the relation.
    TableNotFound { table: String },
    /// The level to snip below is not part of the hierarchy.
    UnknownLevel { level: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewLevels => f.write_str("fewer than two levels"),
            SkipReason::LevelWithoutTable { level } => {
                write!(f, "level {level} has no table")
            }
            SkipReason::UnmatchedTable { table } => {
                write!(f, "table {table} belongs to no level")
            }
            SkipReason::BalancedJoin => f.write_str("a join has joins on both sides"),
            SkipReason::TableNotFound { table } => {
                write!(f, "table {table} is not part of the relation")
            }
            SkipReason::UnknownLevel { level } => write!(f, "level {level} is not in the hierarchy"),
        }
    }
}

/// Outcome of reshaping a relation.
#[derive(Clone, Debug, PartialEq)]
pub enum Reshaped {
    /// The reshaped relation.
    Tree(Relation),
    /// The input, untouched.
    Unchanged { relation: Relation, reason: SkipReason },
    /// Nothing is left of the relation.
    Collapsed,
}

impl Reshaped {
    /// The resulting relation, reshaped or not. `None` when collapsed.
    pub fn into_relation(self) -> Option<Relation> {
        match self {
            Reshaped::Tree(relation) | Reshaped::Unchanged { relation, .. } => Some(relation),
            Reshaped::Collapsed => None,
        }
    }

    fn unchanged(relation: &Relation, reason: SkipReason) -> Self {
        log::debug!("leaving relation unchanged: {reason}");
        Reshaped::Unchanged {
            relation: relation.clone(),
            reason,
        }
    }
}

type Depths<'a> = HashMap<&'a str, usize>;

/// Level ordinal of each level's table. A table holding several levels gets
/// the deepest of them.
fn depths(levels: &[Level]) -> Result<Depths<'_>, SkipReason> {
    let mut out = HashMap::new();
    for (idx, level) in levels.iter().enumerate() {
        if level.is_all {
            continue;
        }
        let table = level
            .table_name()
            .ok_or_else(|| SkipReason::LevelWithoutTable {
                level: level.name.clone(),
            })?;
        out.insert(table, idx);
    }
    if out.is_empty() || levels.iter().filter(|l| !l.is_all).count() < 2 {
        return Err(SkipReason::TooFewLevels);
    }
    Ok(out)
}

fn depth_of(table: &rolap_model::Table, depths: &Depths<'_>) -> Option<usize> {
    depths
        .get(table.alias())
        .or_else(|| depths.get(table.name.as_str()))
        .copied()
}

fn validate(relation: &Relation, depths: &Depths<'_>) -> Result<(), SkipReason> {
    match relation {
        Relation::Table(table) => match depth_of(table, depths) {
            Some(_) => Ok(()),
            None => Err(SkipReason::UnmatchedTable {
                table: table.alias().to_string(),
            }),
        },
        Relation::Join(join) => {
            if join.left.is_join() && join.right.is_join() {
                return Err(SkipReason::BalancedJoin);
            }
            validate(&join.left, depths)?;
            validate(&join.right, depths)
        }
    }
}

/// Make every join's key aliases explicit, so they keep naming the same
/// tables once sides are swapped and joins rotated.
fn pin_aliases(relation: &mut Relation) {
    if let Relation::Join(join) = relation {
        if join.left_alias.is_none() {
            join.left_alias = Some(join.left.leftmost().alias().to_string());
        }
        if join.right_alias.is_none() {
            join.right_alias = Some(join.right.leftmost().alias().to_string());
        }
        pin_aliases(&mut join.left);
        pin_aliases(&mut join.right);
    }
}

/// Put the canonical form of `relation` for a hierarchy with `levels`
/// (ordered top level first).
///
/// Leaves the relation unchanged when there are fewer than two levels, a
/// level has no table, a table matches no level, or the tree is balanced.
pub fn reorder(relation: &Relation, levels: &[Level]) -> Reshaped {
    let depths = match depths(levels) {
        Ok(depths) => depths,
        Err(reason) => return Reshaped::unchanged(relation, reason),
    };
    if let Err(reason) = validate(relation, &depths) {
        return Reshaped::unchanged(relation, reason);
    }

    let mut tree = relation.clone();
    pin_aliases(&mut tree);
    assign_left_to_right(&mut tree, &depths);
    Reshaped::Tree(top_to_bottom(tree))
}

/// Swap join sides so that the deeper side of every join is on the left.
/// Returns the shallowest depth in the tree.
pub fn left_to_right(relation: &mut Relation, levels: &[Level]) -> Result<usize, SkipReason> {
    let depths = depths(levels)?;
    validate(relation, &depths)?;
    pin_aliases(relation);
    Ok(assign_left_to_right(relation, &depths))
}

fn assign_left_to_right(relation: &mut Relation, depths: &Depths<'_>) -> usize {
    match relation {
        Relation::Table(table) => depth_of(table, depths).unwrap_or(usize::MAX),
        Relation::Join(join) => {
            let left = assign_left_to_right(&mut join.left, depths);
            let right = assign_left_to_right(&mut join.right, depths);
            if right > left {
                join.swap_sides();
            }
            left.min(right)
        }
    }
}

/// Rotate joins so none has a join as its left child:
/// `J(J(a, b), c)` becomes `J(a, J(b, c))`, each join keeping its condition.
pub fn top_to_bottom(relation: Relation) -> Relation {
    let mut join = match relation {
        Relation::Table(_) => return relation,
        Relation::Join(join) => *join,
    };
    loop {
        match join.left {
            Relation::Join(inner) => {
                let inner = *inner;
                join = Join {
                    left_alias: inner.left_alias,
                    left_key: inner.left_key,
                    left: inner.left,
                    right_alias: inner.right_alias,
                    right_key: inner.right_key,
                    right: Relation::Join(Box::new(Join {
                        left_alias: join.left_alias,
                        left_key: join.left_key,
                        left: inner.right,
                        right_alias: join.right_alias,
                        right_key: join.right_key,
                        right: join.right,
                    })),
                };
            }
            left => {
                join.left = left;
                break;
            }
        }
    }
    join.right = top_to_bottom(join.right);
    Relation::Join(Box::new(join))
}

/// Whether every join of `relation` has a table as its left child.
pub fn is_right_nested(relation: &Relation) -> bool {
    match relation {
        Relation::Table(_) => true,
        Relation::Join(join) => !join.left.is_join() && is_right_nested(&join.right),
    }
}

/// Remove the table answering to `table` (by alias, then name).
///
/// A join losing its left side is replaced by its right side and vice versa.
pub fn snip(relation: &Relation, table: &str) -> Reshaped {
    if relation.find(table).is_none() {
        return Reshaped::unchanged(
            relation,
            SkipReason::TableNotFound {
                table: table.to_string(),
            },
        );
    }
    match snip_tree(relation.clone(), table) {
        Some(tree) => Reshaped::Tree(tree),
        None => Reshaped::Collapsed,
    }
}

fn snip_tree(relation: Relation, table: &str) -> Option<Relation> {
    match relation {
        Relation::Table(t) => (!t.answers_to(table)).then_some(Relation::Table(t)),
        Relation::Join(join) => {
            let join = *join;
            let Some(left) = snip_tree(join.left, table) else {
                return Some(join.right);
            };
            let Some(right) = snip_tree(join.right, table) else {
                return Some(left);
            };
            Some(Relation::Join(Box::new(Join {
                left,
                right,
                ..join
            })))
        }
    }
}

/// Clip a canonical relation so it ends at `level_name`: every table holding
/// only levels below it is snipped.
pub fn snip_below(relation: &Relation, levels: &[Level], level_name: &str) -> Reshaped {
    let Some(idx) = levels.iter().position(|l| l.name == level_name) else {
        return Reshaped::unchanged(
            relation,
            SkipReason::UnknownLevel {
                level: level_name.to_string(),
            },
        );
    };

    let kept: HashSet<&str> = levels[..=idx]
        .iter()
        .filter_map(Level::table_name)
        .collect();
    let mut below: Vec<&str> = Vec::new();
    for table in levels[idx + 1..].iter().filter_map(Level::table_name) {
        if !kept.contains(table) && !below.contains(&table) {
            below.push(table);
        }
    }

    let mut tree = relation.clone();
    for table in below {
        match snip(&tree, table) {
            Reshaped::Tree(snipped) => {
                log::debug!("snipped table {table} below level {level_name}");
                tree = snipped;
            }
            Reshaped::Collapsed => return Reshaped::Collapsed,
            Reshaped::Unchanged { .. } => {}
        }
    }
    Reshaped::Tree(tree)
}

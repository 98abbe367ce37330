//! Star-schema construction.
//!
//! A [`Star`] is the physical join tree rooted at a cube's fact table. Every
//! dimension attached to the cube adds its (possibly snowflaked) tables to the
//! tree and registers its level columns; each column gets a unique bit
//! position so that column sets can be described by a [`BitKey`].
//!
//! [`Catalog::load`] drives the whole process for a schema: one star per
//! distinct fact table (see [`StarRegistry`]), one [`HierarchyUsage`] per
//! attachment of a hierarchy to a cube, and snowflakes reshaped by
//! [`canonical::reorder`] before they are joined.

#![forbid(unsafe_code)]

mod aggregate;
pub mod canonical;
mod catalog;
mod error;
mod reader;
mod register;
mod registry;
mod star;
mod usage;
mod warning;

pub use crate::aggregate::AggregateCandidate;
pub use crate::catalog::Catalog;
pub use crate::error::{CatalogError, StarError};
pub use crate::reader::MemberReaderRegistry;
pub use crate::registry::{lock_star, SharedStar, StarRegistry};
pub use crate::star::{
    Column, ColumnId, ColumnKind, Join, JoinCondition, Star, StarKey, TableId, TableRef,
};
pub use crate::usage::{resolve_usages, HierarchyUsage, UsageKind};
pub use crate::warning::{Warning, WarningKind};

pub use rolap_bitkey::BitKey;

//! Dimensional metadata for the ROLAP star builder.
//!
//! These types describe *what* a schema author declared: cubes over a fact
//! table, shared and private dimensions, hierarchies with their levels, and
//! the relational tables (possibly a snowflake of joins) each hierarchy reads
//! from. They are plain serde-friendly values; the runtime star graph is
//! built from them by `rolap-star`.

#![forbid(unsafe_code)]

mod config;
mod expr;
mod relation;
mod schema;

pub use crate::config::{CatalogConfig, MemberReaderKind};
pub use crate::expr::{Expression, SqlFragment, GENERIC_DIALECT};
pub use crate::relation::{Join, Relation, Table};
pub use crate::schema::{
    Aggregator, Cube, CubeDimension, Dimension, DimensionUsage, Hierarchy, Level, Measure,
    ModelError, Property, Schema,
};

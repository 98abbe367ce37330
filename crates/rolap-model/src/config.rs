use crate::schema::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy used to read a hierarchy's members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberReaderKind {
    /// Query the dimension tables on demand.
    #[default]
    Sql,
    /// Query on demand and keep members for the catalog's lifetime.
    Cached,
    /// Query on demand and never cache.
    NoCache,
}

/// Catalog load options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Fail the load when a level names a table the star does not contain,
    /// instead of registering the column against the joined table.
    pub strict_level_tables: bool,
    /// Canonicalize every snowflake before joining it. When off, only
    /// snowflakes attached at an explicit level are canonicalized and the
    /// rest must already be declared deepest table first.
    pub canonicalize_all_snowflakes: bool,
    /// Initial capacity of each star's column key.
    pub initial_column_capacity: usize,
    /// Named member reader strategies, in addition to the built-in ones.
    pub member_readers: BTreeMap<String, MemberReaderKind>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            strict_level_tables: false,
            canonicalize_all_snowflakes: true,
            initial_column_capacity: 0,
            member_readers: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    pub fn from_json(input: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(input)?)
    }
}

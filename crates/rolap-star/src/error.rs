use rolap_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StarError {
    #[error("hierarchy {hierarchy} in cube {cube} must have a foreign key to the fact table")]
    MissingForeignKey { hierarchy: String, cube: String },

    #[error("hierarchy {hierarchy} in cube {cube} must have a primary key")]
    MissingPrimaryKey { hierarchy: String, cube: String },

    #[error("primary key table {table} of hierarchy {hierarchy} is not part of its relation")]
    UnknownPrimaryKeyTable { hierarchy: String, table: String },

    #[error("join in star {star} references table {alias}, which is not in scope")]
    UnresolvedAlias { star: String, alias: String },

    #[error(
        "hierarchy {hierarchy} in cube {cube} joins the fact table through {table}, \
         but its relation starts with {leftmost}"
    )]
    JoinTableNotLeftmost {
        hierarchy: String,
        cube: String,
        table: String,
        leftmost: String,
    },

    #[error("level {level} references table {table}, which is not in scope")]
    LevelTableNotFound { level: String, table: String },
}

/// A fatal catalog load error, tagged with where it happened.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("schema {schema}: {source}")]
    Model {
        schema: String,
        #[source]
        source: ModelError,
    },

    #[error("schema {schema}, cube {cube}: {source}")]
    Star {
        schema: String,
        cube: String,
        #[source]
        source: StarError,
    },
}

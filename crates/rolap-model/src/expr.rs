use serde::{Deserialize, Serialize};
use std::fmt;

/// Dialect name used for SQL text that applies to every database.
pub const GENERIC_DIALECT: &str = "generic";

/// A piece of SQL text written for one dialect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlFragment {
    pub dialect: String,
    pub sql: String,
}

impl SqlFragment {
    pub fn new(dialect: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            sql: sql.into(),
        }
    }

    pub fn generic(sql: impl Into<String>) -> Self {
        Self::new(GENERIC_DIALECT, sql)
    }
}

/// A level key, name, property or measure source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    /// A physical column, optionally qualified by a table alias.
    Column {
        #[serde(default)]
        table: Option<String>,
        name: String,
    },
    /// Free-form SQL, one variant per dialect.
    Sql { fragments: Vec<SqlFragment> },
}

impl Expression {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        Expression::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn sql(sql: impl Into<String>) -> Self {
        Expression::Sql {
            fragments: vec![SqlFragment::generic(sql)],
        }
    }

    /// The table alias a column expression is qualified with.
    pub fn table_alias(&self) -> Option<&str> {
        match self {
            Expression::Column { table, .. } => table.as_deref(),
            Expression::Sql { .. } => None,
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match self {
            Expression::Column { name, .. } => Some(name),
            Expression::Sql { .. } => None,
        }
    }

    /// Requalify a column expression with `alias`. SQL expressions are
    /// returned as-is.
    pub fn with_table_alias(&self, alias: &str) -> Self {
        match self {
            Expression::Column { name, .. } => Expression::column(alias, name.clone()),
            Expression::Sql { .. } => self.clone(),
        }
    }

    /// SQL text for `dialect`, falling back to the generic fragment.
    pub fn sql_for(&self, dialect: &str) -> Option<&str> {
        let Expression::Sql { fragments } = self else {
            return None;
        };
        fragments
            .iter()
            .find(|f| f.dialect.eq_ignore_ascii_case(dialect))
            .or_else(|| {
                fragments
                    .iter()
                    .find(|f| f.dialect.eq_ignore_ascii_case(GENERIC_DIALECT))
            })
            .map(|f| f.sql.as_str())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column {
                table: Some(table),
                name,
            } => write!(f, "\"{table}\".\"{name}\""),
            Expression::Column { table: None, name } => write!(f, "\"{name}\""),
            Expression::Sql { fragments } => match self.sql_for(GENERIC_DIALECT) {
                Some(sql) => f.write_str(sql),
                None => match fragments.first() {
                    Some(first) => f.write_str(&first.sql),
                    None => f.write_str("<empty sql>"),
                },
            },
        }
    }
}

//! Catalog collaborator trait and raw catalog rows
//!
//! A `Catalog` is a live session that can answer the three primitive catalog
//! questions (tables, columns, constraints). Rows come back exactly as the
//! vendor reports them; interpretation happens in the resolver.

use crate::{ConnectionConfig, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Database catalog interface
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Dialect identifier used to pick a type map (e.g., "mysql")
    fn dialect_id(&self) -> &str;

    /// The configuration this session was opened with
    fn config(&self) -> &ConnectionConfig;

    /// List base tables in the session's default schema, sorted by name
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// List the columns of a table in declared order.
    ///
    /// Returns `NotFound` when the table does not exist.
    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>>;

    /// List key constraints (primary, unique, foreign) of a table
    async fn list_constraints(&self, table: &str) -> Result<Vec<CatalogConstraint>>;

    /// Check whether a base table exists in the default schema
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let tables = self.list_tables().await?;
        Ok(tables.iter().any(|t| t == table))
    }
}

/// A column row as reported by the vendor catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub ordinal: usize,
    /// Bare native type name (e.g., "longtext", "int")
    pub data_type: String,
    /// Full vendor type string (e.g., "int(11) unsigned", "varchar(255)")
    pub column_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// The default is an expression such as `CURRENT_TIMESTAMP` or `uuid()`, not a literal
    pub default_is_expression: bool,
    /// `ON UPDATE` expression, e.g. `CURRENT_TIMESTAMP(6)`
    pub on_update: Option<String>,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub is_auto_increment: bool,
}

/// Constraint type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey {
        referenced_table: String,
        referenced_columns: Vec<String>,
    },
}

/// A key constraint as reported by the vendor catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConstraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Participating columns in key order
    pub columns: Vec<String>,
}

impl CatalogConstraint {
    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey)
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for std::sync::Arc<T> {
    fn dialect_id(&self) -> &str {
        (**self).dialect_id()
    }

    fn config(&self) -> &ConnectionConfig {
        (**self).config()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        (**self).list_tables().await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        (**self).list_columns(table).await
    }

    async fn list_constraints(&self, table: &str) -> Result<Vec<CatalogConstraint>> {
        (**self).list_constraints(table).await
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table).await
    }
}

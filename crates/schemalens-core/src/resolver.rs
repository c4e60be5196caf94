//! Schema metadata resolver
//!
//! Answers structural questions about tables by querying the catalog on every
//! call. Nothing is cached: each descriptor is a fresh projection of the live
//! catalog state.

use crate::{
    Catalog, CatalogColumn, CatalogConstraint, ColumnDescriptor, ConnectionConfig, ConstraintKind,
    KeyDescriptor, Result, SchemaLensError, TableDescriptor, TypeMap, dump,
};
use std::sync::Arc;

/// Resolves table metadata over a single catalog session
pub struct SchemaMetadataResolver<C: Catalog> {
    catalog: C,
    type_map: Arc<TypeMap>,
    identifier_quote: char,
}

impl<C: Catalog> SchemaMetadataResolver<C> {
    /// Create a resolver over an open catalog session
    pub fn new(catalog: C, type_map: Arc<TypeMap>) -> Self {
        tracing::debug!(
            dialect = %catalog.dialect_id(),
            type_map = %type_map.dialect(),
            "schema metadata resolver created"
        );
        Self {
            catalog,
            type_map,
            identifier_quote: '`',
        }
    }

    /// Use a different identifier quote in structure dumps
    pub fn with_identifier_quote(mut self, quote: char) -> Self {
        self.identifier_quote = quote;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    /// The configuration the session was opened with
    pub fn config(&self) -> &ConnectionConfig {
        self.catalog.config()
    }

    /// The connection URL the session was opened with, options included
    pub fn url(&self) -> String {
        self.catalog.config().url()
    }

    /// Base tables in the default schema, sorted by name
    #[tracing::instrument(skip(self))]
    pub async fn tables(&self) -> Result<Vec<String>> {
        self.catalog.list_tables().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        self.catalog.table_exists(table).await
    }

    async fn ensure_table(&self, table: &str) -> Result<()> {
        if self.catalog.table_exists(table).await? {
            Ok(())
        } else {
            Err(SchemaLensError::table_not_found(table))
        }
    }

    /// Every primary key column of the table, in key order
    #[tracing::instrument(skip(self))]
    pub async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        self.ensure_table(table).await?;
        let constraints = self.catalog.list_constraints(table).await?;
        Ok(primary_key_columns(&constraints))
    }

    /// The single primary key column.
    ///
    /// Returns `None` when the table has no primary key or a composite one.
    #[tracing::instrument(skip(self))]
    pub async fn primary_key(&self, table: &str) -> Result<Option<String>> {
        let columns = self.primary_key_columns(table).await?;
        Ok(single_column(columns))
    }

    /// Columns of the table in declared order
    #[tracing::instrument(skip(self))]
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let raw = self.catalog.list_columns(table).await?;
        if raw.is_empty() {
            return Err(SchemaLensError::table_not_found(table));
        }
        let columns = raw
            .iter()
            .map(|c| self.describe_column(c))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(table = %table, columns = columns.len(), "columns resolved");
        Ok(columns)
    }

    fn describe_column(&self, column: &CatalogColumn) -> Result<ColumnDescriptor> {
        let resolved = self.type_map.resolve(column)?;
        Ok(ColumnDescriptor {
            name: column.name.clone(),
            semantic_type: resolved.semantic_type,
            sql_type: column.column_type.clone(),
            limit: resolved.limit,
            precision: resolved.precision,
            scale: resolved.scale,
            default: column.default_value.clone(),
            default_is_expression: column.default_is_expression,
            on_update: column.on_update.clone(),
            nullable: column.nullable,
            auto_increment: column.is_auto_increment,
        })
    }

    /// Full descriptor of one table
    #[tracing::instrument(skip(self))]
    pub async fn table(&self, table: &str) -> Result<TableDescriptor> {
        let columns = self.columns(table).await?;
        let constraints = self.catalog.list_constraints(table).await?;
        let primary_key_columns = primary_key_columns(&constraints);

        let keys = constraints
            .into_iter()
            .filter_map(|c| match c.kind {
                ConstraintKind::PrimaryKey => None,
                ConstraintKind::Unique => Some(KeyDescriptor::Unique {
                    name: c.name,
                    columns: c.columns,
                }),
                ConstraintKind::ForeignKey {
                    referenced_table,
                    referenced_columns,
                } => Some(KeyDescriptor::Foreign {
                    name: c.name,
                    columns: c.columns,
                    referenced_table,
                    referenced_columns,
                }),
            })
            .collect();

        Ok(TableDescriptor {
            name: table.to_string(),
            primary_key: single_column(primary_key_columns.clone()),
            primary_key_columns,
            columns,
            keys,
        })
    }

    async fn describe_tables(&self, tables: Option<&[&str]>) -> Result<Vec<TableDescriptor>> {
        let names: Vec<String> = match tables {
            Some(names) => names.iter().map(|n| n.to_string()).collect(),
            None => self.catalog.list_tables().await?,
        };

        let mut descriptors = Vec::with_capacity(names.len());
        for name in &names {
            descriptors.push(self.table(name).await?);
        }
        Ok(descriptors)
    }

    /// `CREATE TABLE` statements for the given tables, or every table when `None`
    #[tracing::instrument(skip(self))]
    pub async fn structure_dump(&self, tables: Option<&[&str]>) -> Result<String> {
        let descriptors = self.describe_tables(tables).await?;
        tracing::info!(tables = descriptors.len(), "structure dump rendered");
        Ok(dump::structure_dump(&descriptors, self.identifier_quote))
    }

    /// Migration-style `create_table` listing for the given tables, or every table when `None`
    #[tracing::instrument(skip(self))]
    pub async fn schema_dump(&self, tables: Option<&[&str]>) -> Result<String> {
        let descriptors = self.describe_tables(tables).await?;
        tracing::info!(tables = descriptors.len(), "schema dump rendered");
        Ok(dump::schema_dump(&descriptors))
    }
}

fn primary_key_columns(constraints: &[CatalogConstraint]) -> Vec<String> {
    constraints
        .iter()
        .find(|c| c.is_primary_key())
        .map(|c| c.columns.clone())
        .unwrap_or_default()
}

fn single_column(mut columns: Vec<String>) -> Option<String> {
    if columns.len() == 1 { columns.pop() } else { None }
}

//! Synchronous wrapper around the async resolver

use schemalens_core::{
    Catalog, ColumnDescriptor, ConnectionConfig, Result, SchemaMetadataResolver, TableDescriptor,
};
use std::sync::Arc;

use crate::{DriverRegistry, block_on_tokio};

/// Resolver whose operations block the calling thread.
///
/// Every call runs on the shared runtime, so it must not be used from inside
/// an async context.
pub struct BlockingResolver {
    inner: SchemaMetadataResolver<Arc<dyn Catalog>>,
}

impl BlockingResolver {
    pub fn new(inner: SchemaMetadataResolver<Arc<dyn Catalog>>) -> Self {
        Self { inner }
    }

    /// Connect through the registry and wrap the resulting resolver
    pub fn connect(registry: &DriverRegistry, config: &ConnectionConfig) -> Result<Self> {
        block_on_tokio(registry.resolver(config)).map(Self::new)
    }

    pub fn into_inner(self) -> SchemaMetadataResolver<Arc<dyn Catalog>> {
        self.inner
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.inner.config()
    }

    pub fn url(&self) -> String {
        self.inner.url()
    }

    pub fn tables(&self) -> Result<Vec<String>> {
        block_on_tokio(self.inner.tables())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        block_on_tokio(self.inner.table_exists(table))
    }

    pub fn primary_key(&self, table: &str) -> Result<Option<String>> {
        block_on_tokio(self.inner.primary_key(table))
    }

    pub fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        block_on_tokio(self.inner.primary_key_columns(table))
    }

    pub fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        block_on_tokio(self.inner.columns(table))
    }

    pub fn table(&self, table: &str) -> Result<TableDescriptor> {
        block_on_tokio(self.inner.table(table))
    }

    pub fn structure_dump(&self, tables: Option<&[&str]>) -> Result<String> {
        block_on_tokio(self.inner.structure_dump(tables))
    }

    pub fn schema_dump(&self, tables: Option<&[&str]>) -> Result<String> {
        block_on_tokio(self.inner.schema_dump(tables))
    }
}

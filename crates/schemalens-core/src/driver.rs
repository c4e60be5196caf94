//! Database driver trait definition

use crate::{Catalog, ConnectionConfig, Result, SchemaMetadataResolver, TypeMap};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "mysql")
    fn name(&self) -> &'static str;

    /// Display name for diagnostics
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Default connection port
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Options added to every configuration that does not set them explicitly
    fn default_params(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    /// Native type table for this driver's dialect
    fn type_map(&self) -> TypeMap;

    /// Open a catalog session.
    ///
    /// Connectivity is verified here, so an unreachable server or a malformed
    /// configuration fails immediately rather than on first use.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Catalog>>;

    /// Open a session and check that the catalog answers
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let catalog = self.connect(config).await?;
        catalog.list_tables().await?;
        Ok(())
    }

    /// Open a session and wrap it in a resolver using this driver's type map
    async fn resolver(
        &self,
        config: &ConnectionConfig,
    ) -> Result<SchemaMetadataResolver<Arc<dyn Catalog>>> {
        let catalog = self.connect(config).await?;
        Ok(SchemaMetadataResolver::new(catalog, Arc::new(self.type_map())))
    }

    /// Parse a connection string into a configuration
    fn parse_connection_string(&self, conn_str: &str) -> Result<ConnectionConfig> {
        ConnectionConfig::from_url(conn_str)
    }

    /// Build a connection string from configuration
    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        config.url()
    }
}

//! Driver registry for managing available database drivers

use schemalens_core::{
    Catalog, ConnectionConfig, DatabaseDriver, Result, SchemaLensError, SchemaMetadataResolver,
    TypeMapRegistry,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
    aliases: HashMap<String, String>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "mysql")]
        {
            registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
            registry.register_alias("mariadb", "mysql");
        }

        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::info!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Make `alias` resolve to an already registered driver
    pub fn register_alias(&mut self, alias: &str, driver: &str) {
        tracing::debug!(alias = %alias, driver = %driver, "registering driver alias");
        self.aliases.insert(alias.to_string(), driver.to_string());
    }

    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Get a driver by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(self.canonical(name)).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Like `get`, but a missing driver is a configuration error
    pub fn require(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(name).ok_or_else(|| {
            SchemaLensError::Configuration(format!("No driver registered for '{}'", name))
        })
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver or alias is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(self.canonical(name))
    }

    /// Type maps of every registered driver, keyed by driver name and alias
    pub fn type_maps(&self) -> TypeMapRegistry {
        let mut registry = TypeMapRegistry::new();
        let mut by_driver = HashMap::new();
        for (name, driver) in &self.drivers {
            let map = registry.register(driver.type_map());
            if map.dialect() != name.as_str() {
                registry.register_alias(name, map.clone());
            }
            by_driver.insert(name.as_str(), map);
        }
        for (alias, target) in &self.aliases {
            if let Some(map) = by_driver.get(target.as_str()) {
                registry.register_alias(alias, map.clone());
            }
        }
        registry
    }

    /// Open a catalog session with the driver named by `config.driver`
    #[tracing::instrument(skip(self, config), fields(driver = %config.driver))]
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Catalog>> {
        self.require(&config.driver)?.connect(config).await
    }

    /// Open a session and wrap it in a resolver with the driver's type map
    #[tracing::instrument(skip(self, config), fields(driver = %config.driver))]
    pub async fn resolver(
        &self,
        config: &ConnectionConfig,
    ) -> Result<SchemaMetadataResolver<Arc<dyn Catalog>>> {
        self.require(&config.driver)?.resolver(config).await
    }

    /// Parse a connection URL and open a resolver for it
    pub async fn resolver_for_url(
        &self,
        url: &str,
    ) -> Result<SchemaMetadataResolver<Arc<dyn Catalog>>> {
        let config = ConnectionConfig::from_url(url)?;
        self.resolver(&config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

//! MySQL driver implementation

use async_trait::async_trait;
use indexmap::IndexMap;
use schemalens_core::{
    Catalog, ConnectionConfig, DatabaseDriver, Result, SchemaLensError, SchemaMetadataResolver,
    TypeMap,
};
use std::sync::Arc;

use crate::{MYSQL_IDENTIFIER_QUOTE, MySqlConnection};

/// Options every MySQL session is opened with unless set explicitly
pub const MYSQL_DEFAULT_PARAMS: [(&str, &str); 3] = [
    ("characterEncoding", "utf8"),
    ("useUnicode", "true"),
    ("zeroDateTimeBehavior", "convertToNull"),
];

/// MySQL database driver
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }

    /// Fill in the port and default options, keeping explicit values
    pub fn prepare_config(&self, config: &ConnectionConfig) -> ConnectionConfig {
        let mut config = config.clone().with_default_params(MYSQL_DEFAULT_PARAMS);
        if config.port == 0 {
            config.port = 3306;
        }
        config
    }

    /// Open a concrete MySQL session
    #[tracing::instrument(skip(self, config), fields(host = %config.host, database = ?config.database))]
    pub async fn open(&self, config: &ConnectionConfig) -> Result<MySqlConnection> {
        if config.driver != "mysql" && config.driver != "mariadb" {
            return Err(SchemaLensError::Configuration(format!(
                "MySQL driver cannot open a '{}' connection",
                config.driver
            )));
        }

        let config = self.prepare_config(config);
        MySqlConnection::connect(&config)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to MySQL database"))
    }

    /// Open a session and wrap it in a resolver without type erasure
    pub async fn open_resolver(
        &self,
        config: &ConnectionConfig,
    ) -> Result<SchemaMetadataResolver<MySqlConnection>> {
        let connection = self.open(config).await?;
        Ok(
            SchemaMetadataResolver::new(connection, Arc::new(self.type_map()))
                .with_identifier_quote(MYSQL_IDENTIFIER_QUOTE),
        )
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn display_name(&self) -> &'static str {
        "MySQL"
    }

    fn default_port(&self) -> Option<u16> {
        Some(3306)
    }

    fn default_params(&self) -> IndexMap<String, String> {
        MYSQL_DEFAULT_PARAMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn type_map(&self) -> TypeMap {
        crate::mysql_type_map()
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Catalog>> {
        let connection = self.open(config).await?;
        tracing::info!(host = %config.host, "MySQL catalog session created");
        Ok(Arc::new(connection))
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        self.prepare_config(config).url()
    }
}

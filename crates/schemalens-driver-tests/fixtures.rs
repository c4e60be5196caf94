//! Scoped fixture schema for resolver integration tests.
//!
//! Every [`FixtureSchema`] lives in a freshly created scratch database and
//! owns the tables it creates. Teardown drops those tables in reverse creation
//! order and then the scratch database itself. It runs from `Drop` as well, so
//! a failing assertion still leaves the server clean.
//!
//! # Usage
//!
//! ```rust,ignore
//! use schemalens_driver_tests::fixtures::FixtureSchema;
//!
//! #[tokio::test]
//! async fn test_books_primary_key() -> anyhow::Result<()> {
//!     let schema = FixtureSchema::setup().await?;
//!     assert_eq!(schema.resolver().primary_key("books").await?.as_deref(), Some("id"));
//!     schema.teardown().await
//! }
//! ```

use anyhow::{Context, Result};
use schemalens_core::{ConnectionConfig, SchemaMetadataResolver};
use schemalens_driver_mysql::{MySqlConnection, MySqlDriver};
use schemalens_drivers::block_on_tokio;
use std::time::Duration;

use crate::test_containers::mysql_server;

/// A fixture table: its name and the DDL that creates it
#[derive(Debug, Clone, Copy)]
pub struct FixtureTable {
    /// Table name
    pub name: &'static str,
    /// `CREATE TABLE` statement
    pub ddl: &'static str,
}

/// Table with an `id` primary key, a string and two timestamps
pub const BOOKS: FixtureTable = FixtureTable {
    name: "books",
    ddl: "CREATE TABLE `books` (
        `id` int(11) NOT NULL AUTO_INCREMENT,
        `title` varchar(255) DEFAULT NULL,
        `created_at` datetime DEFAULT NULL,
        `updated_at` datetime DEFAULT NULL,
        PRIMARY KEY (`id`)
    )",
};

/// Table with a custom primary key column
pub const CARS: FixtureTable = FixtureTable {
    name: "cars",
    ddl: "CREATE TABLE `cars` (
        `legacy_id` int(11) NOT NULL AUTO_INCREMENT,
        `name` varchar(255) DEFAULT NULL,
        `production_started_on` date DEFAULT NULL,
        PRIMARY KEY (`legacy_id`)
    )",
};

/// Table without a primary key
pub const CATS: FixtureTable = FixtureTable {
    name: "cats",
    ddl: "CREATE TABLE `cats` (
        `name` varchar(255) DEFAULT NULL
    )",
};

/// Table whose text column needs the largest text tier (16 MiB does not fit mediumtext)
pub const MEMOS: FixtureTable = FixtureTable {
    name: "memos",
    ddl: "CREATE TABLE `memos` (
        `id` int(11) NOT NULL AUTO_INCREMENT,
        `text` longtext,
        PRIMARY KEY (`id`)
    )",
};

/// One column of every commonly used native type
pub const DB_TYPES: FixtureTable = FixtureTable {
    name: "db_types",
    ddl: "CREATE TABLE `db_types` (
        `id` int(11) NOT NULL AUTO_INCREMENT,
        `sample_timestamp` timestamp NULL DEFAULT NULL,
        `sample_datetime` datetime DEFAULT NULL,
        `sample_date` date DEFAULT NULL,
        `sample_time` time DEFAULT NULL,
        `sample_decimal` decimal(15,0) DEFAULT NULL,
        `sample_small_decimal` decimal(3,2) DEFAULT NULL,
        `sample_default_decimal` decimal(10,0) DEFAULT NULL,
        `sample_float` float DEFAULT NULL,
        `sample_binary` blob,
        `sample_boolean` tinyint(1) DEFAULT NULL,
        `sample_string` varchar(255) DEFAULT '',
        `sample_integer` bigint(20) DEFAULT NULL,
        `sample_integer_with_limit_2` smallint(6) DEFAULT NULL,
        `sample_integer_with_limit_8` bigint(20) DEFAULT NULL,
        `sample_integer_no_limit` int(11) DEFAULT NULL,
        `sample_integer_neg_default` int(11) DEFAULT '-1',
        `sample_text` text,
        PRIMARY KEY (`id`)
    )",
};

/// The standard fixture tables in creation order
pub const STANDARD_TABLES: [FixtureTable; 4] = [BOOKS, CARS, CATS, MEMOS];

/// A scratch database holding fixture tables, cleaned up on teardown
pub struct FixtureSchema {
    admin: MySqlConnection,
    resolver: SchemaMetadataResolver<MySqlConnection>,
    database: String,
    created: Vec<String>,
    torn_down: bool,
}

impl FixtureSchema {
    /// Create a scratch database with books, cars, cats and memos
    pub async fn setup() -> Result<Self> {
        Self::with_tables(&STANDARD_TABLES).await
    }

    /// Create a scratch database with no tables
    pub async fn empty() -> Result<Self> {
        Self::with_tables(&[]).await
    }

    /// Create a scratch database with the given tables, in order
    pub async fn with_tables(tables: &[FixtureTable]) -> Result<Self> {
        initialize_logging();

        let server = mysql_server()
            .await
            .context("failed to reach a MySQL server - is Docker running?")?;
        let admin_config = server.config();
        let driver = MySqlDriver::new();

        let admin = connect_with_retry(&driver, &admin_config, 5, 2).await?;

        let database = format!("schemalens_{}", uuid::Uuid::new_v4().simple());
        admin
            .execute(&format!("CREATE DATABASE `{}`", database))
            .await
            .with_context(|| format!("failed to create scratch database {}", database))?;
        tracing::debug!(database = %database, "scratch database created");

        let mut config = admin_config.clone();
        config.database = Some(database.clone());

        let resolver = match driver.open_resolver(&config).await {
            Ok(resolver) => resolver,
            Err(e) => {
                admin
                    .execute(&format!("DROP DATABASE IF EXISTS `{}`", database))
                    .await
                    .ok();
                return Err(e).context("failed to open resolver on scratch database");
            }
        };

        let mut schema = Self {
            admin,
            resolver,
            database,
            created: Vec::new(),
            torn_down: false,
        };

        for table in tables {
            schema.create_table(table.name, table.ddl).await?;
        }

        Ok(schema)
    }

    /// Create a table and register it for teardown
    pub async fn create_table(&mut self, name: &str, ddl: &str) -> Result<()> {
        self.execute(ddl)
            .await
            .with_context(|| format!("failed to create fixture table {}", name))?;
        self.created.push(name.to_string());
        Ok(())
    }

    /// Run a statement on the resolver's own session
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        Ok(self.resolver.catalog().execute(sql).await?)
    }

    /// The resolver bound to the scratch database
    pub fn resolver(&self) -> &SchemaMetadataResolver<MySqlConnection> {
        &self.resolver
    }

    /// Name of the scratch database
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Configuration the resolver was opened with, default options included
    pub fn config(&self) -> &ConnectionConfig {
        self.resolver.config()
    }

    async fn drop_all(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        let mut first_error = None;
        while let Some(table) = self.created.pop() {
            if let Err(e) = self
                .resolver
                .catalog()
                .execute(&format!("DROP TABLE IF EXISTS `{}`", table))
                .await
            {
                tracing::warn!(table = %table, error = %e, "failed to drop fixture table");
                first_error.get_or_insert_with(|| {
                    anyhow::anyhow!("failed to drop fixture table {}: {}", table, e)
                });
            }
        }
        self.resolver.catalog().close().await.ok();

        if let Err(e) = self
            .admin
            .execute(&format!("DROP DATABASE IF EXISTS `{}`", self.database))
            .await
        {
            first_error.get_or_insert_with(|| {
                anyhow::anyhow!("failed to drop scratch database {}: {}", self.database, e)
            });
        }
        self.admin.close().await.ok();

        tracing::debug!(database = %self.database, "scratch database dropped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop every fixture table in reverse creation order, then the database
    pub async fn teardown(mut self) -> Result<()> {
        self.drop_all().await
    }
}

impl Drop for FixtureSchema {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        // Drop may run inside a Tokio runtime, where blocking is not allowed.
        std::thread::scope(|scope| {
            scope.spawn(|| {
                if let Err(e) = block_on_tokio(self.drop_all()) {
                    tracing::error!(error = %e, database = %self.database, "fixture teardown failed");
                }
            });
        });
    }
}

/// Open a MySQL session, retrying while the server is still starting
pub async fn connect_with_retry(
    driver: &MySqlDriver,
    config: &ConnectionConfig,
    max_attempts: u32,
    base_delay_secs: u64,
) -> Result<MySqlConnection> {
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match driver.open(config).await {
            Ok(conn) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "database ready after retry");
                }
                return Ok(conn);
            }
            Err(e) => {
                if attempt < max_attempts {
                    let delay = Duration::from_secs(base_delay_secs * attempt as u64);
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "database not ready, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to connect to MySQL after {} attempts: {}",
        max_attempts,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Install a test-friendly tracing subscriber once per process
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("schemalens=debug,info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

//! MySQL connection implementation

use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, prelude::*};
use schemalens_core::{ConnectionConfig, Result, SchemaLensError};
use std::sync::OnceLock;

/// Dedicated Tokio runtime for MySQL operations.
///
/// mysql_async calls `tokio::spawn` for pooling and networking, so every
/// pool interaction is dispatched here regardless of the caller's executor.
///
/// # Panics
///
/// Panics if the runtime cannot be created.
fn get_mysql_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("schemalens-mysql-runtime")
            .build()
            .expect("Failed to create Tokio runtime for MySQL driver")
    })
}

/// What to do with `0000-00-00` date defaults reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDateBehavior {
    /// Report the default as absent
    #[default]
    ConvertToNull,
    /// Fail the metadata call
    Exception,
    /// Replace with the smallest valid value, `0001-01-01`
    Round,
}

impl ZeroDateBehavior {
    /// Parse the `zeroDateTimeBehavior` connection option
    pub fn from_param(value: &str) -> Result<Self> {
        match value {
            "convertToNull" | "CONVERT_TO_NULL" => Ok(Self::ConvertToNull),
            "exception" | "EXCEPTION" => Ok(Self::Exception),
            "round" | "ROUND" => Ok(Self::Round),
            other => Err(SchemaLensError::Configuration(format!(
                "Unknown zeroDateTimeBehavior '{}'",
                other
            ))),
        }
    }

    /// Apply the behavior to a raw column default
    pub fn apply(&self, default: Option<String>) -> Result<Option<String>> {
        match default {
            Some(value) if value.starts_with("0000-00-00") => match self {
                Self::ConvertToNull => Ok(None),
                Self::Exception => Err(SchemaLensError::Query(format!(
                    "Zero date default '{}' cannot be represented",
                    value
                ))),
                Self::Round => Ok(Some(value.replacen("0000-00-00", "0001-01-01", 1))),
            },
            other => Ok(other),
        }
    }
}

/// Server family, as far as catalog output differs between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerFlavor {
    MySql,
    /// MariaDB 10.2.7 and later quote string literals in `COLUMN_DEFAULT`
    MariaDb { quoted_defaults: bool },
}

impl ServerFlavor {
    /// Classify a `VERSION()` string such as `8.0.36` or `10.11.6-MariaDB-1:10.11.6+maria~ubu2204`
    pub fn from_version(version: &str) -> Self {
        if !version.to_lowercase().contains("mariadb") {
            return Self::MySql;
        }
        let release = version.split('-').next().unwrap_or_default();
        let parts: Vec<u32> = release
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect();
        let release = (
            parts.first().copied().unwrap_or(0),
            parts.get(1).copied().unwrap_or(0),
            parts.get(2).copied().unwrap_or(0),
        );
        Self::MariaDb {
            quoted_defaults: release >= (10, 2, 7),
        }
    }
}

/// Map a `characterEncoding` option to a MySQL character set name
pub fn mysql_charset(encoding: &str) -> Result<String> {
    let normalized = encoding.to_lowercase().replace('-', "");
    let charset = match normalized.as_str() {
        "utf8" | "utf8mb4" => "utf8mb4".to_string(),
        "latin1" | "iso88591" => "latin1".to_string(),
        "ascii" | "usascii" => "ascii".to_string(),
        other => other.to_string(),
    };

    if charset.is_empty()
        || !charset
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SchemaLensError::Configuration(format!(
            "Invalid characterEncoding '{}'",
            encoding
        )));
    }
    Ok(charset)
}

/// A single MySQL catalog session
pub struct MySqlConnection {
    pool: Pool,
    config: ConnectionConfig,
    /// Resolved at connect time so catalog queries never depend on `DATABASE()`
    database_name: Option<String>,
    zero_dates: ZeroDateBehavior,
    flavor: ServerFlavor,
}

impl MySqlConnection {
    /// Connect using a configuration whose options are already complete
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let host = config
            .get_string("host")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        let port = if config.port > 0 { config.port } else { 3306 };
        let database = config.database.clone();

        tracing::info!(host = %host, port = %port, database = ?database, "connecting to MySQL database");

        let zero_dates = match config.param("zeroDateTimeBehavior") {
            Some(value) => ZeroDateBehavior::from_param(value)?,
            None => ZeroDateBehavior::default(),
        };

        let mut init = Vec::new();
        if let Some(encoding) = config.param("characterEncoding") {
            init.push(format!("SET NAMES {}", mysql_charset(encoding)?));
        }
        if let Some(value) = config.param("useUnicode") {
            tracing::debug!(use_unicode = %value, "useUnicode has no effect on catalog sessions");
        }

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(host.clone())
            .tcp_port(port)
            .db_name(database.clone())
            .user(config.get_string("username"))
            .pass(config.password.clone())
            .init(init);

        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            SchemaLensError::Connection(
                "Failed to configure MySQL pool constraints (min=1, max=1)".into(),
            )
        })?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        opts_builder = opts_builder.pool_opts(pool_opts);

        let opts: Opts = opts_builder.into();

        // Pool creation and the connectivity check must run on the MySQL runtime.
        let pool = get_mysql_runtime()
            .spawn(async move {
                let pool = Pool::new(opts);
                let _conn = pool.get_conn().await.map_err(|e| {
                    SchemaLensError::Connection(format!("Failed to connect to MySQL: {}", e))
                })?;
                Ok::<Pool, SchemaLensError>(pool)
            })
            .await
            .map_err(|e| {
                SchemaLensError::Connection(format!("MySQL connection task failed: {}", e))
            })??;

        let mut connection = Self {
            pool,
            config: config.clone(),
            database_name: database,
            zero_dates,
            flavor: ServerFlavor::MySql,
        };

        let rows = connection
            .query_rows("SELECT VERSION(), DATABASE()")
            .await?;
        let session = |index: usize| {
            rows.first()
                .and_then(|row| row.get_opt::<Option<String>, usize>(index))
                .and_then(|value| value.ok())
                .flatten()
        };
        let version = session(0).unwrap_or_default();
        connection.flavor = ServerFlavor::from_version(&version);
        if connection.database_name.is_none() {
            connection.database_name = session(1);
        }

        tracing::info!(
            host = %host,
            port = %port,
            database = ?connection.database_name,
            version = %version,
            "MySQL connection established"
        );
        Ok(connection)
    }

    /// Get a connection from the pool, dispatched on the MySQL runtime
    async fn get_conn(&self) -> Result<Conn> {
        let pool = self.pool.clone();
        get_mysql_runtime()
            .spawn(async move { pool.get_conn().await })
            .await
            .map_err(|e| SchemaLensError::Connection(format!("MySQL get_conn task failed: {}", e)))?
            .map_err(|e| {
                SchemaLensError::Connection(format!("Failed to get MySQL connection: {}", e))
            })
    }

    /// Run a query over the text protocol and return its raw rows
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub(crate) async fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let mut conn = self.get_conn().await?;
        let sql = sql.to_string();

        let rows = get_mysql_runtime()
            .spawn(async move {
                let rows: Vec<Row> = conn.query(sql).await.map_err(|e| {
                    SchemaLensError::Query(format!("Failed to execute query: {}", e))
                })?;
                Ok::<Vec<Row>, SchemaLensError>(rows)
            })
            .await
            .map_err(|e| SchemaLensError::Query(format!("MySQL query task failed: {}", e)))??;

        tracing::debug!(rows = rows.len(), "query completed");
        Ok(rows)
    }

    /// Execute a statement that returns no rows, such as DDL.
    ///
    /// Returns the number of affected rows.
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let mut conn = self.get_conn().await?;
        let sql = sql.to_string();

        let affected_rows = get_mysql_runtime()
            .spawn(async move {
                conn.query_drop(sql).await.map_err(|e| {
                    SchemaLensError::Query(format!("Failed to execute statement: {}", e))
                })?;
                Ok::<u64, SchemaLensError>(conn.affected_rows())
            })
            .await
            .map_err(|e| SchemaLensError::Query(format!("MySQL execute task failed: {}", e)))??;

        tracing::debug!(affected_rows = affected_rows, "statement executed");
        Ok(affected_rows)
    }

    /// Close the session's pool, waiting for the connection to be released
    pub async fn close(&self) -> Result<()> {
        let pool = self.pool.clone();
        get_mysql_runtime()
            .spawn(async move { pool.disconnect().await })
            .await
            .map_err(|e| SchemaLensError::Connection(format!("MySQL disconnect task failed: {}", e)))?
            .map_err(|e| SchemaLensError::Connection(format!("Failed to disconnect: {}", e)))?;
        tracing::debug!("MySQL connection closed");
        Ok(())
    }

    /// The database catalog queries are scoped to.
    ///
    /// In MySQL, "schema" and "database" are synonymous.
    pub fn default_database(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    pub fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) fn zero_dates(&self) -> ZeroDateBehavior {
        self.zero_dates
    }

    /// Server family detected at connect time
    pub fn flavor(&self) -> ServerFlavor {
        self.flavor
    }
}

//! Docker container management for integration tests.
//!
//! The MySQL container is started lazily by the first test that needs it and
//! reused by every later test in the process. Setting
//! `SCHEMALENS_TEST_MYSQL_URL` skips Docker entirely and points the suite at
//! an existing server.

use once_cell::sync::Lazy;
use schemalens_core::ConnectionConfig;
use std::env;
use std::sync::Mutex;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mysql::Mysql;

/// Environment variable naming an existing MySQL server
pub const MYSQL_URL_ENV: &str = "SCHEMALENS_TEST_MYSQL_URL";

/// Information about a running test server
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Host address (typically 127.0.0.1)
    pub host: String,
    /// Port number (randomly assigned by testcontainers)
    pub port: u16,
    /// Database the administrative session connects to
    pub database: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: Option<String>,
}

impl ContainerInfo {
    /// Connection configuration for the administrative session
    pub fn config(&self) -> ConnectionConfig {
        let config =
            ConnectionConfig::new_mysql(&self.host, self.port, &self.database, &self.username);
        match &self.password {
            Some(password) => config.with_password(password),
            None => config,
        }
    }
}

struct MysqlContainer {
    #[allow(dead_code)]
    inner: ContainerAsync<Mysql>,
    info: ContainerInfo,
}

static MYSQL_CONTAINER: Lazy<Mutex<Option<MysqlContainer>>> = Lazy::new(|| Mutex::new(None));

/// Server named by `SCHEMALENS_TEST_MYSQL_URL`, if set
pub fn env_mysql_server() -> anyhow::Result<Option<ContainerInfo>> {
    let Ok(url) = env::var(MYSQL_URL_ENV) else {
        return Ok(None);
    };

    let config = ConnectionConfig::from_url(&url)
        .map_err(|e| anyhow::anyhow!("invalid {}: {}", MYSQL_URL_ENV, e))?;
    Ok(Some(ContainerInfo {
        host: config.host,
        port: if config.port > 0 { config.port } else { 3306 },
        database: config.database.unwrap_or_else(|| "mysql".to_string()),
        username: config.username.unwrap_or_else(|| "root".to_string()),
        password: config.password,
    }))
}

/// Get or create the MySQL test container
///
/// The container runs the testcontainers-modules MySQL image, which accepts
/// `root` with an empty password and ships an empty `test` database.
pub async fn mysql_container() -> anyhow::Result<ContainerInfo> {
    {
        let guard = MYSQL_CONTAINER
            .lock()
            .map_err(|e| anyhow::anyhow!("failed to lock mysql container: {}", e))?;

        if let Some(ref container) = *guard {
            return Ok(container.info.clone());
        }
    }

    tracing::info!("starting MySQL test container");

    let container = Mysql::default()
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start mysql container: {}", e))?;

    let host_port = container
        .get_host_port_ipv4(3306)
        .await
        .map_err(|e| anyhow::anyhow!("failed to get mysql port: {}", e))?;

    let info = ContainerInfo {
        host: "127.0.0.1".to_string(),
        port: host_port,
        database: "test".to_string(),
        username: "root".to_string(),
        password: None,
    };

    tracing::info!(port = host_port, "MySQL test container started");

    let mut guard = MYSQL_CONTAINER
        .lock()
        .map_err(|e| anyhow::anyhow!("failed to lock mysql container: {}", e))?;

    // Another test may have won the race while this container was starting.
    if let Some(ref existing) = *guard {
        return Ok(existing.info.clone());
    }
    *guard = Some(MysqlContainer {
        inner: container,
        info: info.clone(),
    });

    Ok(info)
}

/// The server the suite runs against: the env override, else the container
pub async fn mysql_server() -> anyhow::Result<ContainerInfo> {
    match env_mysql_server()? {
        Some(info) => {
            tracing::debug!(host = %info.host, port = info.port, "using MySQL server from environment");
            Ok(info)
        }
        None => mysql_container().await,
    }
}

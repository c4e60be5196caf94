//! Connection configuration
//!
//! The configuration is supplied by the caller and passed through unchanged
//! so that diagnostics can assert on the exact URL and options a session was
//! opened with.

use crate::{Result, SchemaLensError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "mysql", "mariadb")
    pub driver: String,
    /// Host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number (0 for the driver default)
    #[serde(default)]
    pub port: u16,
    /// Database name
    #[serde(default)]
    pub database: Option<String>,
    /// Username
    #[serde(default)]
    pub username: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
    /// Connection options, rendered in insertion order as URL query parameters
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: default_host(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: IndexMap::new(),
        }
    }

    /// Create a MySQL configuration
    pub fn new_mysql(host: &str, port: u16, database: &str, username: &str) -> Self {
        let mut config = Self::new("mysql");
        config.host = host.to_string();
        config.port = port;
        config.database = Some(database.to_string());
        config.username = Some(username.to_string());
        config
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Add parameters that are not already set, keeping explicit values
    pub fn with_default_params<'a>(
        mut self,
        defaults: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        for (key, value) in defaults {
            if !self.params.contains_key(key) {
                self.params.insert(key.to_string(), value.to_string());
            }
        }
        self
    }

    /// Get a parameter value
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a string parameter, falling back to the known fields
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" => Some(self.host.clone()),
            "database" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Render the connection URL.
    ///
    /// The password is never included; everything else, options included,
    /// appears exactly as configured.
    pub fn url(&self) -> String {
        let mut url = format!("{}://", self.driver);

        if let Some(user) = &self.username {
            url.push_str(user);
            url.push('@');
        }

        if self.host.is_empty() {
            url.push_str("localhost");
        } else {
            url.push_str(&self.host);
        }

        if self.port > 0 {
            url.push_str(&format!(":{}", self.port));
        }

        if let Some(db) = &self.database {
            url.push('/');
            url.push_str(db);
        }

        if !self.params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        url
    }

    /// Parse a `driver://[user[:password]@]host[:port][/database][?k=v&...]` URL.
    ///
    /// A URL that cannot describe a connection is a `Connection` error.
    pub fn from_url(input: &str) -> Result<Self> {
        let parsed = url::Url::parse(input).map_err(|e| {
            SchemaLensError::Connection(format!("Invalid connection URL '{}': {}", input, e))
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                SchemaLensError::Connection(format!("Connection URL '{}' has no host", input))
            })?;

        let mut config = Self::new(parsed.scheme());
        config.host = host.to_string();
        config.port = parsed.port().unwrap_or(0);

        let database = parsed.path().trim_start_matches('/');
        if !database.is_empty() {
            config.database = Some(database.to_string());
        }
        if !parsed.username().is_empty() {
            config.username = Some(parsed.username().to_string());
        }
        config.password = parsed.password().map(str::to_string);

        for (key, value) in parsed.query_pairs() {
            config.params.insert(key.into_owned(), value.into_owned());
        }

        Ok(config)
    }

    /// Load a configuration from a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| {
            SchemaLensError::Configuration(format!("Invalid connection configuration: {}", e))
        })
    }
}

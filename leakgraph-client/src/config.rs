//! Client configuration
//!
//! Settings are layered, lowest priority first:
//! 1. built-in defaults
//! 2. a TOML file
//! 3. `NEO4J_*` environment variables
//! 4. command line flags (applied by the binary)
//!
//! # File format
//!
//! ```toml
//! [connection]
//! uri = "neo4j://localhost:7687"
//! username = "neo4j"
//! password = "secret"
//! database = "neo4j"
//! fetch_size = 200
//! max_connections = 16
//!
//! [lookup]
//! name = "Stuart Onslow-Smith"
//! max_hops = 5
//! limit = 20
//! ```

use crate::address::BoltAddress;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const ENV_URI: &str = "NEO4J_URI";
pub const ENV_USERNAME: &str = "NEO4J_USERNAME";
pub const ENV_PASSWORD: &str = "NEO4J_PASSWORD";
pub const ENV_DATABASE: &str = "NEO4J_DATABASE";

pub const DEFAULT_URI: &str = "neo4j://localhost:7687";
pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_OFFICER: &str = "Stuart Onslow-Smith";

/// Root of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakgraphConfig {
    pub connection: ConnectionConfig,
    pub lookup: LookupConfig,
}

/// Where and how to connect
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Bolt URI, e.g. `neo4j://localhost:7687`
    pub uri: String,
    pub username: String,
    pub password: String,
    /// Database the session is bound to
    pub database: String,
    /// Rows pulled per round trip
    pub fetch_size: usize,
    /// Upper bound of the driver's connection pool
    pub max_connections: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            username: "neo4j".to_string(),
            password: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            fetch_size: 200,
            max_connections: 16,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("fetch_size", &self.fetch_size)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn address(&self) -> ClientResult<BoltAddress> {
        BoltAddress::parse(&self.uri)
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.address()?;
        if self.username.trim().is_empty() {
            return Err(ClientError::config("username must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(ClientError::config("database must not be empty"));
        }
        if self.fetch_size == 0 {
            return Err(ClientError::config("fetch_size must be greater than 0"));
        }
        if self.max_connections == 0 {
            return Err(ClientError::config("max_connections must be greater than 0"));
        }
        Ok(())
    }
}

/// Parameters of the officer traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Officer whose neighbourhood is listed
    pub name: String,
    /// Maximum relationship hops from the officer
    pub max_hops: u32,
    /// Maximum number of distinct names returned
    pub limit: i64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_OFFICER.to_string(),
            max_hops: 5,
            limit: 20,
        }
    }
}

impl LeakgraphConfig {
    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::config(format!("invalid TOML: {}", e)))
    }

    pub fn load_from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string_pretty(self).map_err(|e| ClientError::config(e.to_string()))
    }

    /// Overlay `NEO4J_*` variables from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay variables resolved through `lookup`; empty values are ignored
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(uri) = get(ENV_URI) {
            self.connection.uri = uri;
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.connection.username = username;
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.connection.password = password;
        }
        if let Some(database) = get(ENV_DATABASE) {
            self.connection.database = database;
        }
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.connection.validate()
    }
}

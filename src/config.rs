//! Server configuration
//!
//! Layered: built-in defaults, then an optional YAML file, then command-line
//! flags and environment variables.

use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which graph store the service writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Neo4j over Bolt
    Neo4j,
    /// In-process graph, lost on exit
    Memory,
}

/// Neo4j connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database (None = server default)
    pub database: Option<String>,
    pub max_connections: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: None,
            max_connections: 16,
        }
    }
}

impl fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
    /// Directory uploaded CSV files are written to
    pub staging_dir: PathBuf,
    /// Upper bound on a whole HTTP request, upload included
    pub request_timeout_secs: u64,
    /// Upper bound on one ingestion transaction; must stay below `request_timeout_secs`
    pub graph_timeout_secs: u64,
    /// Rows per UNWIND batch in the row-driven steps
    pub batch_size: usize,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
    pub backend: BackendKind,
    pub neo4j: Neo4jConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8888,
            staging_dir: PathBuf::from("./import"),
            request_timeout_secs: 300,
            graph_timeout_secs: 240,
            batch_size: 100,
            max_upload_bytes: 64 * 1024 * 1024,
            backend: BackendKind::Neo4j,
            neo4j: Neo4jConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn graph_timeout(&self) -> Duration {
        Duration::from_secs(self.graph_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 || self.graph_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if self.graph_timeout_secs >= self.request_timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "graph_timeout_secs ({}) must be shorter than request_timeout_secs ({})",
                self.graph_timeout_secs, self.request_timeout_secs
            )));
        }
        if self.staging_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("staging_dir must not be empty".into()));
        }
        if self.backend == BackendKind::Neo4j && self.neo4j.uri.trim().is_empty() {
            return Err(ConfigError::Invalid("neo4j.uri must not be empty".into()));
        }
        Ok(())
    }
}

/// Command-line arguments; each flag can also come from the environment
#[derive(Parser, Debug, Default)]
#[command(name = "trailer-graph", version, about = "Trailer shipment CSV ingestion service")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "TRAILER_GRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "TRAILER_GRAPH_ADDRESS")]
    pub address: Option<String>,

    #[arg(long, env = "TRAILER_GRAPH_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "TRAILER_GRAPH_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    #[arg(long, value_enum, env = "TRAILER_GRAPH_BACKEND")]
    pub backend: Option<BackendKind>,

    #[arg(long, env = "TRAILER_GRAPH_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    #[arg(long, env = "NEO4J_URI")]
    pub neo4j_uri: Option<String>,

    #[arg(long, env = "NEO4J_USER")]
    pub neo4j_user: Option<String>,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub neo4j_password: Option<String>,

    #[arg(long, env = "NEO4J_DATABASE")]
    pub neo4j_database: Option<String>,
}

impl Cli {
    /// Resolve the effective configuration
    pub fn load(&self) -> Result<ServerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.staging_dir {
            config.staging_dir = dir.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(uri) = &self.neo4j_uri {
            config.neo4j.uri = uri.clone();
        }
        if let Some(user) = &self.neo4j_user {
            config.neo4j.user = user.clone();
        }
        if let Some(password) = &self.neo4j_password {
            config.neo4j.password = password.clone();
        }
        if let Some(database) = &self.neo4j_database {
            config.neo4j.database = Some(database.clone());
        }
        config
    }
}

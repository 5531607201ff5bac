//! Configuration and defaults for snpdb.
//!
//! Server, database and import settings, plus the limits applied to HTTP
//! query parameters.

use std::path::{Path, PathBuf};

/// Default database file.
pub const DEFAULT_DATABASE: &str = "snpdb.sqlite";

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_TOP_N: i64 = 10;
pub const MAX_TOP_N: i64 = 20;
pub const DEFAULT_WINDOW_SIZE: i64 = 50_000;
pub const MIN_WINDOW_SIZE: i64 = 1_000;
pub const MAX_WINDOW_SIZE: i64 = 1_000_000;
pub const DEFAULT_TARGET_LIMIT: i64 = 100;
pub const MAX_TARGET_LIMIT: i64 = 500;

/// Suffix stripped from effect column names to form target names.
pub const TARGET_SUFFIX: &str = ".norRPKM";
/// Category assigned to targets created by the TSV import.
pub const TARGET_CATEGORY: &str = "tissue_cell";

/// Server and database configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub database: PathBuf,
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Whether to add a permissive CORS layer.
    pub cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DEFAULT_DATABASE),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: true,
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database location from a path or a `sqlite://` URL.
    pub fn set_database(&mut self, location: &str) {
        self.database = database_path(location);
    }

    /// The socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Strip an optional `sqlite://` scheme from a database location.
pub fn database_path(location: &str) -> PathBuf {
    let trimmed = location
        .strip_prefix("sqlite://")
        .or_else(|| location.strip_prefix("sqlite:"))
        .unwrap_or(location);
    Path::new(trimmed).to_path_buf()
}

/// Configuration for the batch importers.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Number of rows committed per transaction.
    pub batch_size: usize,
    /// Worker threads for row parsing (0 = auto-detect).
    pub threads: usize,
    /// Reuse existing targets instead of creating them from the header.
    pub skip_targets: bool,
    /// Suffix stripped from effect column names.
    pub target_suffix: String,
    /// Category of newly created targets.
    pub target_category: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            batch_size: 1000,
            threads: 0,
            skip_targets: false,
            target_suffix: TARGET_SUFFIX.to_string(),
            target_category: TARGET_CATEGORY.to_string(),
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size. Returns false (and keeps the old value) for zero.
    pub fn set_batch_size(&mut self, batch_size: usize) -> bool {
        if batch_size == 0 {
            return false;
        }
        self.batch_size = batch_size;
        true
    }

    /// Number of parser threads to actually use.
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Normalize an effect column name into a target name.
    pub fn target_name(&self, column: &str) -> String {
        column.replace(&self.target_suffix, "")
    }
}

//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default SQLite database path.
pub const DEFAULT_DATABASE_PATH: &str = "data/escheat.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default busy timeout for SQLite writers in milliseconds.
pub const DEFAULT_DATABASE_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Default base URL of the State Controller's download site.
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://dpupd.sco.ca.gov";

/// Default fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Default number of records committed per chunk. A tuning knob, not a
/// correctness parameter: any chunk size yields the same final store.
pub const DEFAULT_INGEST_CHUNK_SIZE: usize = 1_000;

/// Ceiling on chunk size. Thirteen bind variables per record must fit
/// within SQLite's 32766 host-parameter limit.
pub const MAX_INGEST_CHUNK_SIZE: usize = 2_500;

/// The full record dump published by the state.
pub const ALL_RECORDS_ARCHIVE: &str = "00_All_Records.zip";

/// Amount-tiered sub-dumps. Together they cover the same ids as the full
/// dump, so ingesting both relies on first-write-wins deduplication.
pub const TIERED_ARCHIVES: [&str; 4] = [
    "01_From_0_To_Below_10.zip",
    "02_From_10_To_Below_100.zip",
    "03_From_100_To_Below_500.zip",
    "04_From_500_To_Beyond.zip",
];

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub ingest: IngestConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

/// Source archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    /// Archive locations ingested by a default run, in order.
    pub archives: Vec<String>,
    pub fetch_timeout_secs: u64,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    /// Build the database before serving when the store is empty,
    /// mirroring the original toolkit's serve behavior.
    pub sync_on_start: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("ESCHEAT_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("ESCHEAT_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("ESCHEAT_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                path: std::env::var("DATABASE_PATH")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                busy_timeout_ms: std::env::var("DATABASE_BUSY_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_BUSY_TIMEOUT_MS),
            },
            source: SourceConfig {
                base_url: std::env::var("SCO_BASE")
                    .unwrap_or_else(|_| DEFAULT_SOURCE_BASE_URL.to_string()),
                archives: std::env::var("SOURCE_ARCHIVES")
                    .map(|v| {
                        v.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_else(|_| vec![ALL_RECORDS_ARCHIVE.to_string()]),
                fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            },
            ingest: IngestConfig {
                chunk_size: std::env::var("INGEST_CHUNK_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_INGEST_CHUNK_SIZE),
                sync_on_start: std::env::var("SYNC_ON_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.source.base_url.is_empty() {
            anyhow::bail!("Source base URL cannot be empty");
        }

        if self.source.archives.is_empty() {
            anyhow::bail!("At least one source archive must be configured");
        }

        if self.ingest.chunk_size == 0 {
            anyhow::bail!("Ingest chunk_size must be greater than 0");
        }

        if self.ingest.chunk_size > MAX_INGEST_CHUNK_SIZE {
            anyhow::bail!(
                "Ingest chunk_size ({}) cannot exceed {}",
                self.ingest.chunk_size,
                MAX_INGEST_CHUNK_SIZE
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                path: DEFAULT_DATABASE_PATH.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                busy_timeout_ms: DEFAULT_DATABASE_BUSY_TIMEOUT_MS,
            },
            source: SourceConfig {
                base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
                archives: vec![ALL_RECORDS_ARCHIVE.to_string()],
                fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            ingest: IngestConfig {
                chunk_size: DEFAULT_INGEST_CHUNK_SIZE,
                sync_on_start: false,
            },
        }
    }
}

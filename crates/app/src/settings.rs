//! Settings for the application.
//!
//! Read from an optional `settings` file (any format the `config` crate
//! understands), then `POCKETLEDGER__*` environment variables, then command
//! line flags. Example `settings.toml`:
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! port = 3000
//! database = { sqlite = "pocketledger.db" }
//!
//! [budget]
//! warning_ratio = 0.8
//! timeout_ms = 2000
//! ```
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: 3000,
            database: Database::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Share of the limit at which a budget turns to warning.
    pub warning_ratio: f64,
    /// Bound on each expense ledger and budget store call.
    pub timeout_ms: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            warning_ratio: engine::DEFAULT_WARNING_RATIO,
            timeout_ms: engine::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub budget: Budget,
}

#[derive(Debug, Parser)]
#[command(name = "pocketledger", version)]
struct Args {
    /// Optional settings file path, without extension.
    #[arg(long)]
    config: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    level: Option<String>,
    /// Override the listening port.
    #[arg(long)]
    port: Option<u16>,
    /// Use this sqlite file instead of the configured database.
    #[arg(long)]
    sqlite: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();

        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("POCKETLEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(level) = args.level {
            settings.app.level = level;
        }
        if let Some(port) = args.port {
            settings.server.port = port;
        }
        if let Some(path) = args.sqlite {
            settings.server.database = Database::Sqlite(path);
        }

        Ok(settings)
    }
}

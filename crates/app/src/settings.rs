//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `MERCHCOIN__<SECTION>__<KEY>` environment variables
//! (e.g. `MERCHCOIN__SERVER__PORT=9000`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// A private in-memory SQLite database, lost on exit.
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
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

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Default, Deserialize)]
pub struct Engine {
    pub initial_balance: Option<i64>,
    pub operation_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub engine: Engine,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("MERCHCOIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

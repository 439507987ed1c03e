use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use sg_shared::Masked;
use std::env;
use std::path::Path;

/// Prefix of environment overrides, e.g. `SEVEN_GREEN__STORE__SERVICE_SECRET`
pub const ENV_PREFIX: &str = "SEVEN_GREEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// Credentials of the managed store's service role.
///
/// The service role bypasses row-level security, so the secret only ever
/// lives behind `Masked`.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub service_secret: Masked<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeConfig {
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PricingConfig {
    /// Price shown until the active product has been read once
    #[serde(default)]
    pub fallback_price: Decimal,
}

fn default_port() -> u16 { 8080 }
fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_channel() -> String { "product_changes".to_string() }
fn default_capacity() -> usize { 100 }

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::load_from(
            Path::new("config"),
            &run_mode,
            Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
    }

    /// Layers `default`, then `{run_mode}` and `local` (both optional) from
    /// `dir`, then the environment.
    pub fn load_from(dir: &Path, run_mode: &str, environment: Environment) -> Result<Self, ConfigError> {
        let layer = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .add_source(File::with_name(&layer("default")))
            .add_source(File::with_name(&layer(run_mode)).required(false))
            // Not checked in
            .add_source(File::with_name(&layer("local")).required(false))
            .add_source(environment)
            .build()?;

        s.try_deserialize()
    }
}

//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Stress driver configuration.
    #[serde(default)]
    pub stress: StressConfig,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// How long a caller waits for an account lock before failing with a
    /// retryable contention error, in milliseconds.
    #[serde(default = "default_lock_acquire_timeout_ms")]
    pub lock_acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_acquire_timeout_ms: default_lock_acquire_timeout_ms(),
        }
    }
}

fn default_lock_acquire_timeout_ms() -> u64 {
    1000
}

/// Configuration for the concurrency stress driver.
#[derive(Debug, Clone, Deserialize)]
pub struct StressConfig {
    /// Number of accounts to spread traffic across.
    #[serde(default = "default_stress_accounts")]
    pub accounts: usize,
    /// Concurrent workers per account.
    #[serde(default = "default_stress_workers")]
    pub workers: usize,
    /// Use operations issued by each worker.
    #[serde(default = "default_stress_ops_per_worker")]
    pub ops_per_worker: usize,
    /// Initial balance per account, in minor units.
    #[serde(default = "default_stress_initial_balance")]
    pub initial_balance: i64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            accounts: default_stress_accounts(),
            workers: default_stress_workers(),
            ops_per_worker: default_stress_ops_per_worker(),
            initial_balance: default_stress_initial_balance(),
        }
    }
}

fn default_stress_accounts() -> usize {
    4
}

fn default_stress_workers() -> usize {
    8
}

fn default_stress_ops_per_worker() -> usize {
    250
}

fn default_stress_initial_balance() -> i64 {
    1_000_000
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

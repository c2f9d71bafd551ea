use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use common::discount::{DEFAULT_MAX_DISCOUNT_FRACTION, DiscountPolicy, DiscountRule, Pricing};

use super::discounts::default_discounts;
use super::error::Error;
use super::types::{QueryGroup, QueryConfig};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "ROUTER_CONFIG_PATH";

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub flights_csv: PathBuf,
    #[serde(default = "default_true")]
    pub dedupe_city_pairs: bool,
    /// Source city for the all-routes table; skipped when unset.
    #[serde(default)]
    pub all_routes_from: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default)]
    pub policy: DiscountPolicy,
    #[serde(default = "default_max_discount_fraction")]
    pub max_discount_fraction: f64,
    #[serde(default)]
    pub duration_penalty_per_minute: f64,
    #[serde(default = "default_discounts")]
    pub discounts: Vec<DiscountRule>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            policy: DiscountPolicy::default(),
            max_discount_fraction: DEFAULT_MAX_DISCOUNT_FRACTION,
            duration_penalty_per_minute: 0.0,
            discounts: default_discounts(),
        }
    }
}

impl PricingConfig {
    pub fn pricing(&self) -> Pricing {
        Pricing {
            policy: self.policy,
            max_discount_fraction: self.max_discount_fraction,
            duration_penalty_per_minute: self.duration_penalty_per_minute,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// City counts of the generated networks, one run per entry.
    pub sizes: Vec<usize>,
    pub flights_per_city: usize,
    pub fare_range: (f64, f64),
    pub duration_range: (u32, u32),
    pub queries_per_size: usize,
    /// Probability that a generated flight carries a cashback larger than its fare.
    #[serde(default)]
    pub negative_fare_share: f64,
    #[serde(default)]
    pub max_stops: Option<usize>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            seed: 7,
            sizes: vec![5, 10, 15, 50, 100],
            flights_per_city: 4,
            fare_range: (1500.0, 12000.0),
            duration_range: (50, 300),
            queries_per_size: 20,
            negative_fare_share: 0.0,
            max_stops: Some(3),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub queries: Vec<QueryConfig>,
    #[serde(default)]
    pub groups: Vec<QueryGroup>,
}

fn default_true() -> bool {
    true
}

fn default_max_discount_fraction() -> f64 {
    DEFAULT_MAX_DISCOUNT_FRACTION
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolves the configuration file: an explicit path wins, then
/// `ROUTER_CONFIG_PATH`, then `crates/executor/Config.toml` under the
/// current directory.
fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    Ok(base_path
        .join("crates")
        .join("executor")
        .join("Config.toml"))
}

/// Loads configuration from a file and environment variables.
///
/// Environment overrides use the `ROUTER` prefix with `__` between keys,
/// e.g. `ROUTER__PRICING__POLICY=best_capped`.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, Error> {
    let config_file_path = config_file_path(explicit)?;

    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at calculated path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix("ROUTER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    Ok(app_config)
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::models::{CorrelationWeights, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub lifecycle: LifecycleSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    #[serde(default = "default_code_ttl_days")]
    pub code_ttl_days: i64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_local_cache_capacity")]
    pub local_cache_capacity: u64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            code_ttl_days: default_code_ttl_days(),
            store_timeout_ms: default_store_timeout_ms(),
            local_cache_capacity: default_local_cache_capacity(),
        }
    }
}

impl BrokerSettings {
    pub fn code_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.code_ttl_days)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Local entries never outlive the code they hold
    pub fn local_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_days.max(1) as u64 * 86_400)
    }
}

fn default_code_ttl_days() -> i64 { 30 }
fn default_store_timeout_ms() -> u64 { 2_000 }
fn default_local_cache_capacity() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleSettings {
    #[serde(default = "default_invitation_ttl_days")]
    pub invitation_ttl_days: i64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            invitation_ttl_days: default_invitation_ttl_days(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl LifecycleSettings {
    pub fn invitation_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.invitation_ttl_days)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn default_invitation_ttl_days() -> i64 { 7 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_affinity_weight")]
    pub affinity: f64,
    #[serde(default = "default_communication_weight")]
    pub communication: f64,
    #[serde(default = "default_life_direction_weight")]
    pub life_direction: f64,
    #[serde(default = "default_vitality_weight")]
    pub vitality: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            affinity: default_affinity_weight(),
            communication: default_communication_weight(),
            life_direction: default_life_direction_weight(),
            vitality: default_vitality_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            affinity: config.affinity,
            communication: config.communication,
            life_direction: config.life_direction,
            vitality: config.vitality,
        }
    }
}

fn default_affinity_weight() -> f64 { 0.30 }
fn default_communication_weight() -> f64 { 0.25 }
fn default_life_direction_weight() -> f64 { 0.25 }
fn default_vitality_weight() -> f64 { 0.20 }

#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default = "default_astrology_weight")]
    pub astrology: f64,
    #[serde(default = "default_palm_weight")]
    pub palm: f64,
    #[serde(default = "default_bonus_weight")]
    pub bonus: f64,
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: u8,
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: u8,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            astrology: default_astrology_weight(),
            palm: default_palm_weight(),
            bonus: default_bonus_weight(),
            strong_threshold: default_strong_threshold(),
            weak_threshold: default_weak_threshold(),
        }
    }
}

impl From<&CorrelationConfig> for CorrelationWeights {
    fn from(config: &CorrelationConfig) -> Self {
        Self {
            astrology: config.astrology,
            palm: config.palm,
            bonus: config.bonus,
            strong_threshold: config.strong_threshold,
            weak_threshold: config.weak_threshold,
        }
    }
}

fn default_astrology_weight() -> f64 { 0.40 }
fn default_palm_weight() -> f64 { 0.40 }
fn default_bonus_weight() -> f64 { 0.20 }
fn default_strong_threshold() -> u8 { 75 }
fn default_weak_threshold() -> u8 { 60 }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisProvider {
    #[default]
    Template,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub provider: AnalysisProvider,
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            provider: AnalysisProvider::default(),
            endpoint: None,
            api_key: String::new(),
            timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

fn default_analysis_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with COMPAT_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., COMPAT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("COMPAT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }
}

/// `DATABASE_URL` wins over the file value, as sqlx tooling expects
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

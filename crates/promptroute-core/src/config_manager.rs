use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::metadata::Sensitivity;
use crate::profile::DEFAULT_COMPLEX_SUFFIX;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for PromptRoute
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptRouteConfig {
    /// Prompt classification settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Candidate selection and complexity-tier switching
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Profile directory loading and registry persistence
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hot-reload file watching
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Score breakpoints mapping an accumulated sensitivity score to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityBands {
    /// Minimum score for "medium"
    #[serde(default = "default_band_medium")]
    pub medium: u32,
    /// Minimum score for "high"
    #[serde(default = "default_band_high")]
    pub high: u32,
    /// Minimum score for "critical"
    #[serde(default = "default_band_critical")]
    pub critical: u32,
}

impl SensitivityBands {
    pub fn level(&self, score: u32) -> Sensitivity {
        if score >= self.critical {
            Sensitivity::Critical
        } else if score >= self.high {
            Sensitivity::High
        } else if score >= self.medium {
            Sensitivity::Medium
        } else {
            Sensitivity::Low
        }
    }
}

impl Default for SensitivityBands {
    fn default() -> Self {
        Self {
            medium: default_band_medium(),
            high: default_band_high(),
            critical: default_band_critical(),
        }
    }
}

/// Metadata parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Word count at which a prompt is classified as high complexity
    #[serde(default = "default_complex_word_threshold")]
    pub complex_word_threshold: usize,

    /// Word count at which a prompt is classified as medium complexity
    #[serde(default = "default_medium_word_threshold")]
    pub medium_word_threshold: usize,

    /// Reasoning phrase hits that boost complexity by two levels instead of one
    #[serde(default = "default_reasoning_double_boost")]
    pub reasoning_double_boost_hits: usize,

    #[serde(default)]
    pub sensitivity_bands: SensitivityBands,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            complex_word_threshold: default_complex_word_threshold(),
            medium_word_threshold: default_medium_word_threshold(),
            reasoning_double_boost_hits: default_reasoning_double_boost(),
            sensitivity_bands: SensitivityBands::default(),
        }
    }
}

/// Routing engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Enable base/complex variant switching after selection
    #[serde(default = "default_true")]
    pub complexity_switching: bool,

    /// Minimum prompt word count before a complex variant is preferred
    #[serde(default = "default_complex_preference_threshold")]
    pub complex_preference_threshold: usize,

    /// Prompts under this word count count as simple for reverting to a base variant
    #[serde(default = "default_simple_preference_threshold")]
    pub simple_preference_threshold: usize,

    /// Variant must score at least this fraction of the selected profile's score
    #[serde(default = "default_min_score_ratio")]
    pub min_score_ratio: f64,

    /// Softmax temperature for confidence normalization
    #[serde(default = "default_confidence_temperature")]
    pub confidence_temperature: f64,

    /// Naming suffix that pairs a complex variant with its base profile
    #[serde(default = "default_complex_suffix")]
    pub complex_suffix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            complexity_switching: true,
            complex_preference_threshold: default_complex_preference_threshold(),
            simple_preference_threshold: default_simple_preference_threshold(),
            min_score_ratio: default_min_score_ratio(),
            confidence_temperature: default_confidence_temperature(),
            complex_suffix: default_complex_suffix(),
        }
    }
}

/// Profile loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory holding profile documents
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    /// Registry snapshot output path (None disables persistence)
    #[serde(default = "default_registry_path")]
    pub registry_path: Option<PathBuf>,

    /// File extension of profile documents
    #[serde(default = "default_profile_extension")]
    pub extension: String,

    /// Per-file read timeout (ms)
    #[serde(default = "default_file_read_timeout_ms")]
    pub file_read_timeout_ms: u64,

    /// Maximum files read concurrently during a reload
    #[serde(default = "default_max_concurrent_reads")]
    pub max_concurrent_reads: usize,

    /// Parse documents on the rayon pool
    #[serde(default = "default_true")]
    pub parallel_parse: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            profiles_dir: default_profiles_dir(),
            registry_path: default_registry_path(),
            extension: default_profile_extension(),
            file_read_timeout_ms: default_file_read_timeout_ms(),
            max_concurrent_reads: default_max_concurrent_reads(),
            parallel_parse: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Hot-reload watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Start the watcher together with the service
    #[serde(default)]
    pub enabled: bool,

    /// Debounce duration for file changes (ms)
    #[serde(default = "default_watch_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: default_watch_debounce_ms(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_band_medium() -> u32 {
    1
}
fn default_band_high() -> u32 {
    3
}
fn default_band_critical() -> u32 {
    6
}
fn default_complex_word_threshold() -> usize {
    60
}
fn default_medium_word_threshold() -> usize {
    25
}
fn default_reasoning_double_boost() -> usize {
    3
}
fn default_complex_preference_threshold() -> usize {
    60
}
fn default_simple_preference_threshold() -> usize {
    25
}
fn default_min_score_ratio() -> f64 {
    0.8
}
fn default_confidence_temperature() -> f64 {
    1.0
}
fn default_complex_suffix() -> String {
    DEFAULT_COMPLEX_SUFFIX.to_string()
}
fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}
fn default_registry_path() -> Option<PathBuf> {
    Some(PathBuf::from(".promptroute").join("registry.json"))
}
fn default_profile_extension() -> String {
    "md".to_string()
}
fn default_file_read_timeout_ms() -> u64 {
    2_000
}
fn default_max_concurrent_reads() -> usize {
    8
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_watch_debounce_ms() -> u64 {
    250
}

/// Configuration manager with smart defaults
pub struct ConfigManager {
    config: PromptRouteConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.promptroute.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading PromptRoute configuration...");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        Self::log_loaded(&config, config_path.as_deref());

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load from an explicit config file, still honouring environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        Self::log_loaded(&config, Some(path));

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an already-built configuration (validated)
    pub fn from_config(config: PromptRouteConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    pub fn config(&self) -> &PromptRouteConfig {
        &self.config
    }

    pub fn into_config(self) -> PromptRouteConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn log_loaded(config: &PromptRouteConfig, path: Option<&Path>) {
        info!("Configuration loaded successfully");
        match path {
            Some(path) => info!("   Config file: {}", path.display()),
            None => info!("   Config file: NONE (using defaults)"),
        }
        info!("   Profiles dir: {}", config.loader.profiles_dir.display());
        info!(
            "   Complexity switching: {} (threshold={} words, ratio={})",
            config.routing.complexity_switching,
            config.routing.complex_preference_threshold,
            config.routing.min_score_ratio
        );
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".promptroute.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .promptroute.env: {}", e);
                } else {
                    info!("Loaded .promptroute.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.promptroute.toml (current directory)
    /// 2. ~/.promptroute/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(PromptRouteConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".promptroute.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".promptroute").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((PromptRouteConfig::default(), None))
    }

    /// Read TOML config file
    fn read_toml_file(path: &Path) -> Result<PromptRouteConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config: PromptRouteConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: PromptRouteConfig) -> PromptRouteConfig {
        if let Ok(dir) = std::env::var("PROMPTROUTE_PROFILES_DIR") {
            config.loader.profiles_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("PROMPTROUTE_REGISTRY_PATH") {
            config.loader.registry_path = if path.is_empty() || path == "none" {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Ok(level) = std::env::var("PROMPTROUTE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(flag) = std::env::var("PROMPTROUTE_COMPLEXITY_SWITCHING") {
            config.routing.complexity_switching = flag == "1" || flag.to_lowercase() == "true";
        }
        if let Ok(ratio) = std::env::var("PROMPTROUTE_MIN_SCORE_RATIO") {
            match ratio.parse::<f64>() {
                Ok(ratio) => config.routing.min_score_ratio = ratio,
                Err(_) => warn!("Ignoring invalid PROMPTROUTE_MIN_SCORE_RATIO={}", ratio),
            }
        }
        if let Ok(threshold) = std::env::var("PROMPTROUTE_COMPLEX_THRESHOLD") {
            match threshold.parse::<usize>() {
                Ok(threshold) => config.routing.complex_preference_threshold = threshold,
                Err(_) => warn!(
                    "Ignoring invalid PROMPTROUTE_COMPLEX_THRESHOLD={}",
                    threshold
                ),
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &PromptRouteConfig) -> Result<(), ConfigError> {
        let routing = &config.routing;
        if !(routing.min_score_ratio > 0.0 && routing.min_score_ratio <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "routing.min_score_ratio must be in (0, 1], got {}",
                routing.min_score_ratio
            )));
        }
        if !(routing.confidence_temperature > 0.0) || !routing.confidence_temperature.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "routing.confidence_temperature must be positive, got {}",
                routing.confidence_temperature
            )));
        }
        if routing.simple_preference_threshold > routing.complex_preference_threshold {
            return Err(ConfigError::ValidationError(format!(
                "routing.simple_preference_threshold ({}) exceeds complex_preference_threshold ({})",
                routing.simple_preference_threshold, routing.complex_preference_threshold
            )));
        }

        let parser = &config.parser;
        if parser.medium_word_threshold > parser.complex_word_threshold {
            return Err(ConfigError::ValidationError(format!(
                "parser.medium_word_threshold ({}) exceeds complex_word_threshold ({})",
                parser.medium_word_threshold, parser.complex_word_threshold
            )));
        }
        let bands = &parser.sensitivity_bands;
        if !(bands.medium <= bands.high && bands.high <= bands.critical) {
            return Err(ConfigError::ValidationError(
                "parser.sensitivity_bands must satisfy medium <= high <= critical".to_string(),
            ));
        }

        if config.loader.file_read_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "loader.file_read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if config.loader.max_concurrent_reads == 0 {
            return Err(ConfigError::ValidationError(
                "loader.max_concurrent_reads must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

//! Configuration management
//!
//! Provides persistent settings storage with schema versioning and
//! migrations. Configuration is stored in `~/.formcoach/config.json`; the
//! in-memory copy is cached after first access.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::feedback::FeedbackPolicy;
use crate::scorer::{DEFAULT_SMOOTHING_ALPHA, DEFAULT_TOLERANCE_FACTOR};
use crate::services::VoiceSettings;
use crate::speech::MAX_RECORDING_SECS;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Pose similarity scoring settings
    pub scoring: ScoringConfig,
    /// Feedback arbitration thresholds
    pub feedback: FeedbackPolicy,
    /// Voice interaction settings
    pub speech: SpeechConfig,
    /// External service endpoints and credentials
    pub services: ServicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            scoring: ScoringConfig::default(),
            feedback: FeedbackPolicy::default(),
            speech: SpeechConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

/// Pose similarity scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Distance-to-score scaling; larger punishes deviation harder
    pub tolerance_factor: f64,
    /// Weight of the newest raw value in the exponential smoother
    pub smoothing_alpha: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

/// Voice interaction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Hard cap on voice recording length in seconds
    pub max_recording_secs: u64,
    /// Synthesis voice identifier
    pub voice_id: String,
    /// Voice rendering parameters
    pub voice: VoiceSettings,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: MAX_RECORDING_SECS,
            voice_id: "IKne3meq5aSn9XLyUdCD".to_string(),
            voice: VoiceSettings::default(),
        }
    }
}

/// External service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Language-generation service base URL
    pub generation_url: String,
    /// Speech-to-text service base URL
    pub speech_to_text_url: String,
    /// Speech-synthesis service base URL
    pub speech_synthesis_url: String,
    /// Pose-detection live feed base URL
    pub pose_feed_url: String,
    /// Reference motion store base URL
    pub reference_url: String,
    /// API key shared by the hosted services (None disables those requests)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            generation_url: "http://localhost:3000/api".to_string(),
            speech_to_text_url: "http://localhost:3000/api".to_string(),
            speech_synthesis_url: "http://localhost:3000/api".to_string(),
            pose_feed_url: "http://localhost:5001".to_string(),
            reference_url: "http://localhost:3000".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Get the path to the config file (~/.formcoach/config.json)
pub fn get_config_path() -> PathBuf {
    home_dir_or_fallback().join(".formcoach").join("config.json")
}

/// Get the path to the config directory (~/.formcoach)
fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".formcoach")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Ensure the config directory exists
fn ensure_config_dir() -> Result<(), String> {
    let dir = get_config_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    Ok(())
}

/// Load configuration from disk
fn load_from_disk() -> Result<Config, String> {
    let path = get_config_path();

    if !path.exists() {
        tracing::info!("Config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: Config =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))?;

    let migrated = migrate_config(config)?;

    Ok(migrated)
}

/// Save configuration to disk
fn save_to_disk(config: &Config) -> Result<(), String> {
    ensure_config_dir()?;

    let path = get_config_path();
    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialise config: {}", e))?;

    fs::write(&path, contents).map_err(|e| format!("Failed to write config file: {}", e))?;

    tracing::info!("Config saved to disk");
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, String> {
    let original_version = config.version;

    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
        save_to_disk(&config)?;
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, String> {
    match config.version {
        // Version 0 -> 1: Initial migration (add any new fields)
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(format!("Unknown config version: {}", v)),
    }
}

/// Get the global config instance
fn get_config_instance() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| {
        let config = load_from_disk().unwrap_or_else(|e| {
            tracing::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        tracing::info!("Config loaded from disk");
        RwLock::new(config)
    })
}

/// Get the current configuration
///
/// The config is cached in memory and loaded from disk on first access.
pub fn get_config() -> Config {
    get_config_instance().read().clone()
}

/// Update the configuration
///
/// Replaces the current configuration with the provided config and persists
/// it to disk. The version field is automatically updated to the current
/// schema.
pub fn set_config(mut config: Config) -> Result<(), String> {
    config.version = CURRENT_VERSION;

    save_to_disk(&config)?;

    let mut cached = get_config_instance().write();
    *cached = config;

    tracing::info!("Configuration updated");
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<Config, String> {
    let default_config = Config::default();

    save_to_disk(&default_config)?;

    let mut cached = get_config_instance().write();
    *cached = default_config.clone();

    tracing::info!("Configuration reset to defaults");
    Ok(default_config)
}

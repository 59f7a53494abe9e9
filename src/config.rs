use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::load::ZoneWeights;
use crate::logging::LogConfig;
use crate::trend::{TrendComparator, DEFAULT_NOTABLE_THRESHOLD};
use crate::zones::{ZoneTimeAnalyzer, DEFAULT_WINDOW_WEEKS};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Load and trend computation settings
    pub load: LoadSettings,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Directory holding the table CSV files
    pub data_dir: PathBuf,

    /// Year applied to week labels written without one (current year when unset)
    pub default_year: Option<i32>,
}

/// Load model and reporting windows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSettings {
    /// Load coefficient of zones 1 to 7
    pub zone_weights: ZoneWeights,

    /// Week-over-week change, in percent, flagged as notable
    pub notable_threshold_pct: Decimal,

    /// Trailing weeks in the zone-time breakdown
    pub zone_window_weeks: u32,

    /// Weeks of assignments shown in recent listings
    pub recent_assignment_weeks: u32,

    /// Days of feedback shown in recent listings
    pub recent_feedback_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            load: LoadSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: PathBuf::from("./data"),
            default_year: None,
        }
    }
}

impl Default for LoadSettings {
    fn default() -> Self {
        LoadSettings {
            zone_weights: ZoneWeights::default(),
            notable_threshold_pct: DEFAULT_NOTABLE_THRESHOLD,
            zone_window_weeks: DEFAULT_WINDOW_WEEKS,
            recent_assignment_weeks: 4,
            recent_feedback_days: 28,
        }
    }
}

impl AppSettings {
    pub fn effective_year(&self) -> i32 {
        self.default_year.unwrap_or_else(|| Utc::now().year())
    }
}

impl LoadSettings {
    pub fn comparator(&self) -> TrendComparator {
        TrendComparator::with_threshold(self.notable_threshold_pct)
    }

    pub fn zone_analyzer(&self) -> ZoneTimeAnalyzer {
        ZoneTimeAnalyzer::with_window(self.zone_window_weeks)
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coachload")
            .join("config.toml")
    }

    /// Load an explicit file, or the default file when present, or defaults
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    Self::load_from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

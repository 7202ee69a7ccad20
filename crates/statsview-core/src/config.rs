//! Configuration for statsview-core
//!
//! Display, calculation and expansion settings plus the persisted user
//! preferences. Loaded from JSON or TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{validation, ConfigError};
use crate::format::Notation;

/// Largest supported number of decimal places
pub const MAX_DECIMALS: u8 = 10;

/// Datasets above this many points switch the viewer to manual mode
pub const DEFAULT_LARGE_DATASET_THRESHOLD: usize = 1_000_000;

/// Deepest expansion level of the subset view (root, group, pair, row)
pub const SUBSET_VIEW_MAX_LEVEL: u8 = 3;

/// Deepest expansion level of the component view (dataset, component, row)
pub const COMPONENT_VIEW_MAX_LEVEL: u8 = 2;

/// When statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcMode {
    /// Every check computes immediately
    #[default]
    Automatic,
    /// Multi-row checks need a one-time confirmation
    Manual,
}

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Number formatting
    pub display: DisplayConfig,
    /// Calculation policy
    pub calculation: CalculationConfig,
    /// Default expansion depth per view
    pub expansion: ExpansionConfig,
    /// Persisted user preferences
    pub preferences: UserPreferences,
}

/// Number formatting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimal places (0-10)
    pub decimals: u8,
    /// Scientific or fixed notation
    pub notation: Notation,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimals: 3,
            notation: Notation::Scientific,
        }
    }
}

/// Calculation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Automatic or manual calculation
    pub mode: CalcMode,
    /// Point count above which a dataset counts as large
    pub large_dataset_threshold: usize,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            mode: CalcMode::Automatic,
            large_dataset_threshold: DEFAULT_LARGE_DATASET_THRESHOLD,
        }
    }
}

/// Expansion levels: nodes shallower than the level start expanded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub subset_view_level: u8,
    pub component_view_level: u8,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            subset_view_level: 2,
            component_view_level: 2,
        }
    }
}

/// Preferences the host persists between sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Show the instructions panel on start
    pub show_instructions: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            show_instructions: true,
        }
    }
}

impl ViewerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Default location: `<config dir>/statsview/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statsview").join("config.toml"))
    }

    /// Load and validate a file; `.json` is read as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = if is_json(path) {
            Self::from_json(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            Self::from_toml(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = if is_json(path) {
            self.to_json().map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            self.to_toml().map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_decimals(self.display.decimals)?;

        if self.calculation.large_dataset_threshold == 0 {
            return Err(ConfigError::OutOfRange(
                "large_dataset_threshold must be positive".to_string(),
            ));
        }

        if self.expansion.subset_view_level > SUBSET_VIEW_MAX_LEVEL {
            return Err(ConfigError::OutOfRange(format!(
                "subset_view_level must be at most {}",
                SUBSET_VIEW_MAX_LEVEL
            )));
        }

        if self.expansion.component_view_level > COMPONENT_VIEW_MAX_LEVEL {
            return Err(ConfigError::OutOfRange(format!(
                "component_view_level must be at most {}",
                COMPONENT_VIEW_MAX_LEVEL
            )));
        }

        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

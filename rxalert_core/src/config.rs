//! Configuration file support for RxAlert.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/rxalert/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inventory file name inside the data directory
pub const INVENTORY_FILE: &str = "prescriptions.json";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn inventory_path(&self) -> PathBuf {
        self.data_dir.join(INVENTORY_FILE)
    }
}

/// Drug search service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_rxnav_base")]
    pub rxnav_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_approx_max_entries")]
    pub approx_max_entries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            rxnav_base: default_rxnav_base(),
            timeout_secs: default_timeout_secs(),
            approx_max_entries: default_approx_max_entries(),
        }
    }
}

/// Inventory defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Bottle size used when none is given
    #[serde(default = "default_quantity")]
    pub default_quantity: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_quantity: default_quantity(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("rxalert")
}

fn default_endpoint() -> String {
    "https://clinicaltables.nlm.nih.gov/api/rxterms/v3/search".into()
}

fn default_rxnav_base() -> String {
    "https://rxnav.nlm.nih.gov/REST".into()
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_approx_max_entries() -> u32 {
    5
}

fn default_quantity() -> u32 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("rxalert").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.timeout_secs == 0 {
            return Err(Error::Config("search.timeout_secs must be > 0".into()));
        }
        if self.search.endpoint.trim().is_empty() {
            return Err(Error::Config("search.endpoint must not be empty".into()));
        }
        if self.search.rxnav_base.trim().is_empty() {
            return Err(Error::Config("search.rxnav_base must not be empty".into()));
        }
        if self.inventory.default_quantity == 0 {
            return Err(Error::Config(
                "inventory.default_quantity must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

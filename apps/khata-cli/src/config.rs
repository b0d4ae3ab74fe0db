//! # Configuration
//!
//! Business profile, numbering and database settings for the CLI.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (this file)                                               │
//! │  2. khata.toml                                                         │
//! │     --config PATH, or the platform config dir:                         │
//! │     ~/.config/khata/khata.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.khata.khata/khata.toml (macOS)   │
//! │  3. Environment (KHATA_DB_PATH, KHATA_BUSINESS_NAME, KHATA_GSTIN,      │
//! │     KHATA_TAX_RATE, KHATA_CURRENCY_SYMBOL)                             │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! [business]
//! name = "Kumar Hardware"
//! address_lines = ["12 MG Road", "Pune, Maharashtra 411001"]
//! gstin = "27AAPFU0939F1ZV"
//! currency_symbol = "₹"
//!
//! [documents]
//! quotation_prefix = "QT-"
//! invoice_prefix = "INV-"
//! number_width = 4
//! default_tax_rate = 18.0
//! default_due_days = 30
//! default_terms = "Goods once sold will not be taken back."
//!
//! [database]
//! path = "/srv/khata/khata.db"
//! max_connections = 5
//! ```

use directories::ProjectDirs;
use khata_core::{BusinessProfile, NumberingScheme, Rate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

const CONFIG_FILE: &str = "khata.toml";
const DATABASE_FILE: &str = "khata.db";

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KhataConfig {
    /// Issuing business, printed on every document.
    #[serde(default)]
    pub business: BusinessProfile,

    #[serde(default)]
    pub documents: DocumentSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Numbering and defaults for new documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub quotation_prefix: String,
    pub invoice_prefix: String,
    pub number_width: usize,
    /// Percent, e.g. `18.0`.
    pub default_tax_rate: f64,
    pub default_terms: Option<String>,
    pub default_due_days: Option<u32>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            quotation_prefix: "QT-".to_string(),
            invoice_prefix: "INV-".to_string(),
            number_width: 4,
            default_tax_rate: 18.0,
            default_terms: None,
            default_due_days: None,
        }
    }
}

impl DocumentSettings {
    pub fn numbering(&self) -> NumberingScheme {
        NumberingScheme {
            quotation_prefix: self.quotation_prefix.clone(),
            invoice_prefix: self.invoice_prefix.clone(),
            width: self.number_width,
        }
    }

    pub fn tax_rate(&self) -> Rate {
        Rate::from_percentage(self.default_tax_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data dir.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
        }
    }
}

impl KhataConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::read_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn read_file(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| CliError::config(format!("Invalid {}: {}", path.display(), e)))
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CliResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CliError::config("No config path available"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Cannot serialize config: {}", e)))?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(path)
    }

    /// Checks the values the rest of the app relies on.
    pub fn validate(&self) -> CliResult<()> {
        if self.business.name.trim().is_empty() {
            return Err(CliError::config("business.name must not be empty"));
        }

        let docs = &self.documents;
        if docs.quotation_prefix.is_empty() || docs.invoice_prefix.is_empty() {
            return Err(CliError::config("document prefixes must not be empty"));
        }
        if docs.quotation_prefix == docs.invoice_prefix {
            return Err(CliError::config(
                "quotation_prefix and invoice_prefix must differ",
            ));
        }
        if !(1..=12).contains(&docs.number_width) {
            return Err(CliError::config("number_width must be between 1 and 12"));
        }
        if !(0.0..=100.0).contains(&docs.default_tax_rate) {
            return Err(CliError::config(format!(
                "default_tax_rate must be between 0 and 100, got: {}",
                docs.default_tax_rate
            )));
        }

        if self.database.max_connections == 0 {
            return Err(CliError::config(
                "database.max_connections must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Applies `KHATA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("KHATA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(name) = var("KHATA_BUSINESS_NAME") {
            self.business.name = name;
        }

        if let Some(gstin) = var("KHATA_GSTIN") {
            self.business.gstin = Some(gstin).filter(|g| !g.trim().is_empty());
        }

        if let Some(rate) = var("KHATA_TAX_RATE") {
            match rate.trim().trim_end_matches('%').parse::<f64>() {
                Ok(r) => self.documents.default_tax_rate = r,
                Err(_) => warn!(value = %rate, "Ignoring unparseable KHATA_TAX_RATE"),
            }
        }

        if let Some(symbol) = var("KHATA_CURRENCY_SYMBOL") {
            self.business.currency_symbol = symbol;
        }
    }

    /// `khata.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Database file to open: `--db`, then config/env, then the data dir.
    pub fn database_path(&self, cli_override: Option<PathBuf>) -> CliResult<PathBuf> {
        if let Some(path) = cli_override.or_else(|| self.database.path.clone()) {
            return Ok(path);
        }

        let dirs = project_dirs()
            .ok_or_else(|| CliError::config("Could not determine app data directory"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "khata", "khata")
}

// config.rs
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "tableroll.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub workbook_path: PathBuf,
    pub sheet_name: String,
    pub log_dir: PathBuf,
    pub category_pattern: String,
    pub description_column: String,
    pub skip_sentinel: String,
    pub path_separator: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from("random_fantasy_table.xlsx"),
            sheet_name: "source".to_string(),
            log_dir: PathBuf::from("logs"),
            category_pattern: r"(?i)^category \d+$".to_string(),
            description_column: "description".to_string(),
            skip_sentinel: "NONE".to_string(),
            path_separator: " > ".to_string(),
        }
    }
}

impl TableConfig {
    /// Reads the config at `config_path`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let defaults = Self::default();
            if let Some(parent) = config_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = File::create(config_path)?;
            file.write_all(serde_json::to_string_pretty(&defaults)?.as_bytes())?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            return Ok(defaults);
        }

        let mut config_text = String::new();
        File::open(config_path)?.read_to_string(&mut config_text)?;
        let config: Self = serde_json::from_str(&config_text)?;
        Ok(config)
    }

    pub fn category_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.category_pattern)?)
    }
}

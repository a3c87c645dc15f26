use serde::{Deserialize, Serialize};

use super::task::{DEFAULT_CATEGORY, Priority};

/// Narrowest title column a listing will use
pub const MIN_TITLE_WIDTH: usize = 8;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where saved tasks live. Falls back to the XDG data dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            priority: Priority::Medium,
            category: default_category(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Category suggestions offered by `tm categories`
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Titles wider than this (in terminal cells) are truncated in listings
    #[serde(default = "default_max_title_width")]
    pub max_title_width: usize,
    /// Color priorities when writing to a terminal
    #[serde(default = "default_true")]
    pub color: bool,
}

impl UiConfig {
    /// `max_title_width`, raised to [`MIN_TITLE_WIDTH`] if set lower by hand
    pub fn title_width(&self) -> usize {
        self.max_title_width.max(MIN_TITLE_WIDTH)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            categories: default_categories(),
            max_title_width: default_max_title_width(),
            color: true,
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_categories() -> Vec<String> {
    ["Personal", "Work", "Shopping", "Health", "Other"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_title_width() -> usize {
    60
}

fn default_true() -> bool {
    true
}

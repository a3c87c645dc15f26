use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{Config, MIN_TITLE_WIDTH};
use crate::model::task::Priority;

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not parse {path}: {source}")]
    Document {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("unknown config key '{0}'")]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Get the config file path: `$TASKMAN_CONFIG`, else the XDG config dir
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("TASKMAN_CONFIG") {
        return PathBuf::from(p);
    }
    xdg_dir("XDG_CONFIG_HOME", ".config")
        .join("taskman")
        .join("config.toml")
}

/// Directory saved tasks go in when neither a flag nor the config names one
pub fn default_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share").join("taskman")
}

fn xdg_dir(var: &str, home_fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(home_fallback))
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Resolve the data directory: explicit override, then config, then default
pub fn resolve_data_dir(override_dir: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    match config.storage.data_dir.as_deref() {
        Some(dir) => PathBuf::from(dir),
        None => default_data_dir(),
    }
}

/// Read config from `path`. A missing file yields the defaults.
pub fn read_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the config from the default location
pub fn read_config() -> Result<Config, ConfigError> {
    read_config_from(&config_path())
}

/// Read the raw document for format-preserving edits.
/// A missing file yields an empty document.
pub fn read_document(path: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    text.parse().map_err(|source| ConfigError::Document {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the document back, creating parent dirs as needed.
pub fn write_document(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, doc.to_string()).map_err(write_err)
}

/// Set a dotted key like `defaults.category` in the document.
///
/// Values are checked against the config schema before the document changes.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    };
    let value = match key {
        "storage.data_dir" | "defaults.category" => {
            if raw.trim().is_empty() {
                return Err(invalid("must not be empty".into()));
            }
            toml_edit::value(raw)
        }
        "defaults.priority" => {
            let p: Priority = raw.parse().map_err(|e| invalid(format!("{}", e)))?;
            // Stored the way serde writes it
            toml_edit::value(format!("{:?}", p))
        }
        "ui.max_title_width" => {
            let n: i64 = raw
                .parse()
                .map_err(|_| invalid(format!("'{}' is not a number", raw)))?;
            if n < MIN_TITLE_WIDTH as i64 {
                return Err(invalid(format!("must be at least {}", MIN_TITLE_WIDTH)));
            }
            toml_edit::value(n)
        }
        "ui.color" => {
            let b: bool = raw
                .parse()
                .map_err(|_| invalid(format!("'{}' is not true or false", raw)))?;
            toml_edit::value(b)
        }
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    };

    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    if !doc.get(section).is_some_and(|item| item.is_table_like()) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = value;
    Ok(())
}

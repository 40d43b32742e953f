use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

pub const DEFAULT_EXPORT_NAME: &str = "filtered_expenses.csv";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default)]
    pub export_dir: Option<String>,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_preview_rows() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            preview_rows: default_preview_rows(),
            export_dir: None,
        }
    }
}

impl Settings {
    /// Update one key from a `key=value` pair.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| SpendError::Settings(format!("expected key=value, got '{assignment}'")))?;
        let value = value.trim();
        match key.trim() {
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "preview_rows" => {
                self.preview_rows = value
                    .parse()
                    .map_err(|_| SpendError::Settings(format!("preview_rows must be a number, got '{value}'")))?;
            }
            "export_dir" => {
                self.export_dir = if value.is_empty() {
                    None
                } else {
                    Some(shellexpand_path(value))
                };
            }
            other => return Err(SpendError::Settings(format!("unknown setting '{other}'"))),
        }
        Ok(())
    }

    /// Where `export` writes when no `--output` is given.
    pub fn default_export_path(&self) -> PathBuf {
        self.export_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_EXPORT_NAME)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendview")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &std::path::Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &std::path::Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SpendError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            currency_symbol: "$".to_string(),
            preview_rows: 10,
            export_dir: Some("/tmp/exports".to_string()),
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s.currency_symbol, "₹");
        assert_eq!(s.preview_rows, 5);
        assert!(s.export_dir.is_none());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"currency_symbol": "€"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.currency_symbol, "€");
        assert_eq!(s.preview_rows, 5);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_settings_to(&Settings::default(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_set_keys() {
        let mut s = Settings::default();
        s.set("currency_symbol=$").unwrap();
        s.set("preview_rows = 20").unwrap();
        s.set("export_dir=/tmp/out").unwrap();
        assert_eq!(s.currency_symbol, "$");
        assert_eq!(s.preview_rows, 20);
        assert_eq!(s.default_export_path(), PathBuf::from("/tmp/out/filtered_expenses.csv"));
        s.set("export_dir=").unwrap();
        assert_eq!(s.default_export_path(), PathBuf::from("./filtered_expenses.csv"));

        assert!(s.set("preview_rows=lots").is_err());
        assert!(s.set("colour=blue").is_err());
        assert!(s.set("no-equals-sign").is_err());
    }
}

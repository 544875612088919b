use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

/// Environment variable holding the external-service credential.
pub const EXTERNAL_API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Description used when a source row has none.
    #[serde(default = "default_placeholder")]
    pub placeholder_description: String,
    /// Default path for the regenerated OFX.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default)]
    pub export: ExportSettings,
    /// Reserved credential for an external service. Injected from the
    /// environment by `main`; nothing in the reconciliation pipeline reads it.
    #[serde(skip)]
    pub external_api_key: Option<String>,
}

/// Fixed values written into the header of every exported OFX document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub server_date: String,
    pub language: String,
    pub currency: String,
    pub bank_id: String,
    pub account_id: String,
    pub account_type: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            server_date: "20250325".to_string(),
            language: "POR".to_string(),
            currency: "BRL".to_string(),
            bank_id: "000".to_string(),
            account_id: "000".to_string(),
            account_type: "CHECKING".to_string(),
        }
    }
}

fn default_placeholder() -> String {
    "Sem descrição".to_string()
}

fn default_output_file() -> String {
    "atualizado.ofx".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            placeholder_description: default_placeholder(),
            output_file: default_output_file(),
            export: ExportSettings::default(),
            external_api_key: None,
        }
    }
}

impl Settings {
    pub fn with_external_api_key(mut self, key: Option<String>) -> Self {
        self.external_api_key = key.filter(|k| !k.trim().is_empty());
        self
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ofx-reconcile")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing file means defaults. An unreadable or invalid file is logged and
/// also falls back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    parsed.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let path = settings_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReconError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

//! Application settings storage
//!
//! Stores the memory API address and the generated user id in a JSON
//! file in the config directory. The user id is created once and reused
//! on every save, so conversations from one machine land under one
//! identity server-side.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Path to config file (set during init)
static CONFIG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the memory API the `save` command posts to.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Stable per-installation user id, generated on first use.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_id: None,
        }
    }
}

/// Load settings from a JSON file, falling back to defaults when the
/// file is missing or unreadable.
pub fn load_from(path: &Path) -> Settings {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// Persist settings to a JSON file, creating parent directories.
pub fn save_to(path: &Path, settings: &Settings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))
}

/// Initialize global settings from the given config directory.
pub fn init(config_dir: PathBuf) {
    let path = config_dir.join("settings.json");
    let settings = load_from(&path);
    *SETTINGS.write().unwrap() = Some(settings);
    *CONFIG_PATH.write().unwrap() = Some(path);
}

/// Current settings snapshot. Defaults when `init` was never called.
pub fn get() -> Settings {
    SETTINGS.read().unwrap().clone().unwrap_or_default()
}

/// Mutate settings and persist the result.
pub fn update(apply: impl FnOnce(&mut Settings)) -> Result<(), String> {
    let mut guard = SETTINGS.write().unwrap();
    let mut settings = guard.clone().unwrap_or_default();
    apply(&mut settings);

    if let Some(path) = CONFIG_PATH.read().unwrap().as_ref() {
        save_to(path, &settings)?;
    }
    *guard = Some(settings);
    Ok(())
}

/// Return the stored user id, generating and persisting one on first use.
pub fn ensure_user_id() -> Result<String, String> {
    if let Some(id) = get().user_id {
        return Ok(id);
    }
    let id = generate_user_id();
    update(|s| s.user_id = Some(id.clone()))?;
    Ok(id)
}

/// New opaque user id. Random rather than fingerprint-derived: there is
/// no browser environment to fingerprint here.
pub fn generate_user_id() -> String {
    format!("user_{}", uuid::Uuid::new_v4().simple())
}

/// Application configuration
///
/// Read from `<config dir>/media-sphere/config.json`. A missing file means
/// defaults; a malformed one is logged and also means defaults. A few
/// fields can be overridden from the environment:
/// - `MEDIA_SPHERE_CATALOG` - catalog database path
/// - `MEDIA_SPHERE_OWNER` - owner id used for saved galleries
/// - `MEDIA_SPHERE_CONSTRAINED` - `1`/`true` for low-power mode
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;
use crate::media::loader;
use crate::scene::visibility::DEFAULT_TOLERANCE;
use crate::state::library::Library;

pub const DEFAULT_SHARE_BASE: &str = "https://media-sphere.app/view";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog database; `None` = default location in the data directory
    pub catalog_path: Option<PathBuf>,

    /// When false no catalog is opened and saving/loading is unavailable
    pub persistence_enabled: bool,

    /// Owner recorded on saved galleries; generated on first run
    pub owner_id: String,

    /// Prefix for share links
    pub share_base_url: String,

    /// Disables idle rotation and autoplay
    pub constrained_device: bool,

    /// Front-facing tolerance as a fraction of radius²
    pub visibility_tolerance: f32,

    /// Where fetched assets are cached; `None` = the user cache directory
    pub asset_cache_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            persistence_enabled: true,
            owner_id: String::new(),
            share_base_url: DEFAULT_SHARE_BASE.to_string(),
            constrained_device: false,
            visibility_tolerance: DEFAULT_TOLERANCE,
            asset_cache_dir: None,
        }
    }
}

impl AppConfig {
    /// Get the path of the config file
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push("media-sphere");
        path.push("config.json");
        path
    }

    /// Load the config file, apply environment overrides and make sure
    /// there is an owner id (persisting a freshly generated one).
    pub fn load() -> Self {
        let path = Self::default_path();
        let mut config = Self::read(&path);
        config.apply_env(|key| std::env::var(key).ok());

        if config.owner_id.trim().is_empty() {
            config.owner_id = Uuid::new_v4().to_string();
            log::info!("🆔 Generated owner id {}", config.owner_id);
            if let Err(e) = config.write(&path) {
                log::warn!("⚠️  Could not save config to {}: {}", path.display(), e);
            }
        }
        config
    }

    /// Read a config file; defaults when missing or malformed
    pub fn read(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Self>(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("⚠️  Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("MEDIA_SPHERE_CATALOG").filter(|v| !v.is_empty()) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(owner) = lookup("MEDIA_SPHERE_OWNER").filter(|v| !v.is_empty()) {
            self.owner_id = owner;
        }
        if let Some(flag) = lookup("MEDIA_SPHERE_CONSTRAINED") {
            self.constrained_device = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path.clone().unwrap_or_else(Library::default_path)
    }

    pub fn asset_cache_dir(&self) -> PathBuf {
        self.asset_cache_dir
            .clone()
            .unwrap_or_else(loader::default_cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"constrained_device": true, "owner_id": "me"}"#).unwrap();
        assert!(config.constrained_device);
        assert_eq!(config.owner_id, "me");
        assert!(config.persistence_enabled);
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE);
        assert_eq!(config.visibility_tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MEDIA_SPHERE_CATALOG", "/tmp/x.db"),
            ("MEDIA_SPHERE_OWNER", "owner-7"),
            ("MEDIA_SPHERE_CONSTRAINED", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.catalog_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.owner_id, "owner-7");
        assert!(config.constrained_device);
    }

    #[test]
    fn test_read_write() {
        let dir = std::env::temp_dir().join(format!("media-sphere-config-{}", Uuid::new_v4()));
        let path = dir.join("config.json");

        assert_eq!(AppConfig::read(&path), AppConfig::default());

        let config = AppConfig {
            owner_id: "abc".into(),
            visibility_tolerance: 0.35,
            ..AppConfig::default()
        };
        config.write(&path).unwrap();
        assert_eq!(AppConfig::read(&path), config);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::read(&path), AppConfig::default());

        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Application configuration management utilities.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use wtf_core::{Flavor, OverwriteOptions, WowInstall};

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub wow_root_dir: Option<Utf8PathBuf>,
    pub selected_source_flavor: Option<String>,
    pub selected_target_flavor: Option<String>,
    pub overwrite: OverwriteOptions,
}

impl AppConfig {
    pub fn install(&self) -> WowInstall {
        WowInstall::from_option(self.wow_root_dir.clone())
    }

    pub fn source_flavor(&self) -> Flavor {
        self.selected_source_flavor
            .as_deref()
            .map(Flavor::from)
            .unwrap_or(Flavor::Retail)
    }

    pub fn target_flavor(&self) -> Flavor {
        self.selected_target_flavor
            .as_deref()
            .map(Flavor::from)
            .unwrap_or(Flavor::Retail)
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (config.toml next to the executable).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("config.toml"))
}

/// Explicit `--config` path if given, otherwise the default location.
pub fn resolve_config_path(explicit: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    explicit.map(Utf8Path::to_owned).or_else(default_config_path)
}

/// Loads the configuration from `path`.
/// Returns default configuration if the file doesn't exist or cannot be parsed.
pub fn load_config(path: &Utf8Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}, using defaults", path, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}, using defaults", path, e);
            AppConfig::default()
        }
    }
}

/// Saves the configuration to `path`, creating parent directories as needed.
pub fn save_config(path: &Utf8Path, cfg: &AppConfig) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, content)?;
    tracing::debug!("Saved config to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn temp_config_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("nested").join("config.toml")).unwrap()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_config(&temp_config_path(&dir));

        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.overwrite, OverwriteOptions::default());
        assert_eq!(cfg.source_flavor(), Flavor::Retail);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = temp_config_path(&dir);

        let cfg = AppConfig {
            wow_root_dir: Some(Utf8PathBuf::from("/games/World of Warcraft")),
            selected_source_flavor: Some("_classic_".to_string()),
            selected_target_flavor: None,
            overwrite: OverwriteOptions {
                chat: false,
                ..OverwriteOptions::default()
            },
        };
        save_config(&path, &cfg).unwrap();

        let loaded = load_config(&path);
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.source_flavor(), Flavor::Classic);
        assert_eq!(loaded.target_flavor(), Flavor::Retail);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = temp_config_path(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[overwrite]\nplayerAddon = false\n").unwrap();

        let cfg = load_config(&path);
        assert!(cfg.wow_root_dir.is_none());
        assert!(!cfg.overwrite.player_addon);
        assert!(cfg.overwrite.account_addon);
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = temp_config_path(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "wow_root_dir = [not toml").unwrap();

        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Utf8PathBuf::from("/tmp/custom.toml");
        assert_eq!(resolve_config_path(Some(explicit.as_path())), Some(explicit.clone()));
    }
}

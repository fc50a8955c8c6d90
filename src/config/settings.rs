use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::EngineConfig;

const APP_NAME: &str = "Wildscan";
const CONFIG_FILE: &str = "config.json";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "wildscan", APP_NAME)
}

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    project_dirs().map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the directory the default hits file lives in.
pub fn get_data_directory() -> Option<PathBuf> {
    project_dirs().map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_config_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the engine configuration, creating a default one on first use.
///
/// A corrupted file is reported and replaced by defaults in memory; the file
/// on disk is left alone so it can be repaired by hand.
pub fn load_config(override_dir: Option<&Path>) -> Result<EngineConfig> {
    let config_path = resolve_config_dir(override_dir)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = EngineConfig::default();
        save_config_in(&default_config, override_dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<EngineConfig>(&config_content) {
        Ok(config) => {
            tracing::debug!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(EngineConfig::default())
        }
    }
}

/// Saves the provided configuration to the platform config file.
pub fn save_config(config: &EngineConfig) -> Result<()> {
    save_config_in(config, None)
}

/// Saves the configuration into `override_dir`, or the platform directory.
pub fn save_config_in(config: &EngineConfig, override_dir: Option<&Path>) -> Result<()> {
    let config_dir = resolve_config_dir(override_dir)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::debug!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the configuration to a user-specified JSON file.
pub fn export_config(config: &EngineConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-specified JSON file.
pub fn import_config(import_path: &Path) -> Result<EngineConfig> {
    let config_content = fs::read_to_string(import_path)?;
    let config = serde_json::from_str::<EngineConfig>(&config_content)
        .map_err(|e| anyhow::anyhow!("Invalid config file {:?}: {}", import_path, e))?;
    tracing::info!("Imported config from {:?}", import_path);
    Ok(config)
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.wildscan.Wildscan/
// Linux:   ~/.config/wildscan/
// Windows: %APPDATA%/wildscan/Wildscan/config/

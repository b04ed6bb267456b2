use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootsConfig {
    pub general: GeneralConfig,
    pub paths: PathsConfig,
    pub backend: BackendConfig,
}

impl BootsConfig {
    /// Load from `~/.config/boots/config.toml`
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_dir().join(CONFIG_FILE))
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BootsConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

/// Base directory for boots state: `~/.config/boots`
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("boots")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Simulate every operation without touching the system
    pub dryrun: bool,
    /// Start with the log pane below the main pane instead of beside it
    pub vertical_layout: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "boots".to_string(),
            dryrun: false,
            vertical_layout: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<category>/<name>/app.toml` entries
    pub catalog_dir: PathBuf,
    /// Where shell integration files and shell-only markers are written
    pub config_dir: PathBuf,
    /// The zshrc that gets the `source` line appended
    pub zshrc: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_dir = default_config_dir();
        Self {
            catalog_dir: config_dir.join("repo").join("apps"),
            zshrc: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".zshrc"),
            config_dir,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub brew: String,
    pub npm: String,
    pub mas: String,
    /// Shell used for post-install commands
    pub shell: String,
    /// Seconds to wait after SIGTERM before killing a cancelled command
    pub kill_grace_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            brew: "/opt/homebrew/bin/brew".to_string(),
            npm: "npm".to_string(),
            mas: "mas".to_string(),
            shell: "zsh".to_string(),
            kill_grace_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BootsConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert!(!config.general.dryrun);
        assert_eq!(config.backend.brew, "/opt/homebrew/bin/brew");
        assert_eq!(config.backend.kill_grace_secs, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\ndryrun = true\n\n[backend]\nbrew = \"/usr/local/bin/brew\"\n",
        )
        .unwrap();

        let config = BootsConfig::load_from(&path).unwrap();
        assert!(config.general.dryrun);
        assert_eq!(config.general.title, "boots");
        assert_eq!(config.backend.brew, "/usr/local/bin/brew");
        assert_eq!(config.backend.npm, "npm");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\n").unwrap();
        assert!(BootsConfig::load_from(&path).is_err());
    }
}

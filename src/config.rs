use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use squats::{FlushPolicy, ResetPolicy};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) flush: FlushPolicy,
    #[serde(default)]
    pub(crate) reset_policy: ResetPolicy,
    #[serde(default)]
    pub(crate) activity_log: bool,
    #[serde(default)]
    pub(crate) log_level: Option<String>,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) debug: bool,
    /// Daily time-of-day labels, e.g. `["8:00 AM", "13:30"]`
    #[serde(default)]
    pub(crate) slots: Option<Vec<String>>,
}

impl Config {
    /// First readable config file, or defaults. Returns the path it came from.
    pub(crate) fn load() -> (Self, Option<PathBuf>) {
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match Self::parse(&content) {
                    Ok(config) => return (config, Some(path)),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }

        (Self::default(), None)
    }

    pub(crate) fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/squats/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("squats").join("config.toml"));
        }

        // 2. Platform config dir (~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("squats").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.squats.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".squats.toml"));
        }

        paths
    }
}

/// Data directory when neither `--data-dir`, `SQUATS_HOME` nor the config sets one
pub(crate) fn default_data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("squats");
    }
    dirs::home_dir()
        .map(|home| home.join(".squats"))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}

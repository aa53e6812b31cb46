use std::path::Path;
use std::path::PathBuf;

use dirs::home_dir;
use serde::Deserialize;

use crate::directory::StaticDirectory;
use crate::error::Result;
use crate::error::RichInputErr;

pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const DEFAULT_PLACEHOLDER: &str = "write something...";

/// Names offered when neither `directory` nor `directory_file` is configured.
pub const DEFAULT_DIRECTORY: &[&str] = &[
    "french", "sarah", "mike", "alex", "emma", "chris", "taylor", "pat", "sam", "jamie", "casey",
    "jordan", "avery", "quinn", "skyler", "blake", "morgan", "riley", "charlie", "france", "frog",
    "apple", "mac",
];

/// Overrides the configuration directory (defaults to `~/.richinput`).
pub const RICHINPUT_HOME_ENV_VAR: &str = "RICHINPUT_HOME";

/// Widget configuration loaded from disk and merged with overrides.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of characters the input accepts.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Shown while the input is empty.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Candidate names for `@mention` suggestions, in display order.
    #[serde(default = "default_directory")]
    pub directory: Vec<String>,

    /// File with one name per line. When set, replaces `directory`.
    #[serde(default)]
    pub directory_file: Option<PathBuf>,
}

/// Optional overrides for user configuration (e.g., from CLI flags).
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub max_length: Option<usize>,
    pub placeholder: Option<String>,
    pub directory_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            placeholder: default_placeholder(),
            directory: default_directory(),
            directory_file: None,
        }
    }
}

impl Config {
    /// Load `config.toml` from [`richinput_home`] and apply `overrides`
    /// (highest precedence).
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Result<Self> {
        Self::load_from_dir(&richinput_home()?, overrides)
    }

    /// Same as [`Config::load_with_overrides`] but reading from `home`.
    pub fn load_from_dir(home: &Path, overrides: ConfigOverrides) -> Result<Self> {
        let mut cfg = Self::load_from_toml(&home.join("config.toml"))?;

        // Destructure ConfigOverrides fully to ensure all overrides are applied.
        let ConfigOverrides {
            max_length,
            placeholder,
            directory_file,
        } = overrides;

        if let Some(max_length) = max_length {
            cfg.max_length = max_length;
        }
        if let Some(placeholder) = placeholder {
            cfg.placeholder = placeholder;
        }
        if let Some(directory_file) = directory_file {
            cfg.directory_file = Some(directory_file);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn load_from_toml(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let cfg = toml::from_str::<Self>(&contents).inspect_err(|e| {
                    tracing::error!("Failed to parse {}: {e}", path.display());
                })?;
                tracing::debug!("Config parsed from {}: {cfg:?}", path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {e}", path.display());
                Err(e.into())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(RichInputErr::InvalidConfig(
                "max_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the mention directory this configuration describes.
    pub fn build_directory(&self) -> Result<StaticDirectory> {
        match &self.directory_file {
            Some(path) => StaticDirectory::from_file(path),
            None => Ok(StaticDirectory::new(self.directory.iter().cloned())),
        }
    }
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_directory() -> Vec<String> {
    DEFAULT_DIRECTORY.iter().map(|s| s.to_string()).collect()
}

/// Returns the configuration directory: `$RICHINPUT_HOME` if set, otherwise
/// `~/.richinput`. Does not verify that the directory exists.
pub fn richinput_home() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(RICHINPUT_HOME_ENV_VAR)
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }

    let mut p = home_dir().ok_or(RichInputErr::HomeDirNotFound)?;
    p.push(".richinput");
    Ok(p)
}

/// Returns the path to the folder where logs are stored. Does not verify that
/// the directory exists.
pub fn log_dir() -> Result<PathBuf> {
    let mut p = richinput_home()?;
    p.push("log");
    Ok(p)
}

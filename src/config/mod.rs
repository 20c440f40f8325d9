use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "QUIVER_CONFIG_PATH";

/// Hidden directory under the home (or override) holding the database.
const DATA_DIR: &str = ".quiver";
const DB_FILE: &str = "store.db";

/// Application configuration, loaded from a TOML file. Every field is
/// optional; an absent file means defaults, which leave the professor
/// feature disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Overrides the parent of the data directory (defaults to `$HOME`).
    pub path_override: Option<String>,
    pub debug: bool,
    pub professor: ProfessorConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfessorConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenAiConfig {
    pub key: String,
    pub url: Option<String>,
    pub model: Option<String>,
    pub custom_prompt: Option<String>,
}

impl Config {
    /// Loads the configuration from `$QUIVER_CONFIG_PATH`, falling back to
    /// `<config home>/quiver/config.toml`. An absent file yields defaults.
    pub fn load() -> Result<Self> {
        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => match dirs::config_dir() {
                Some(dir) => dir.join("quiver").join("config.toml"),
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("error reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("error parsing config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.professor.enabled && self.professor.openai.key.is_empty() {
            return Err(anyhow!("professor enabled but openai key is missing"));
        }
        Ok(())
    }

    /// Resolves the data directory, creating it with owner rwx / group rx
    /// when missing. An already-existing directory is fine.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let base = match &self.path_override {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir().ok_or_else(|| anyhow!("home directory not found"))?,
        };

        let dir = base.join(DATA_DIR);
        if !dir.exists() {
            create_data_dir(&dir)
                .with_context(|| format!("error creating data directory {}", dir.display()))?;
        }

        Ok(dir)
    }

    /// Path of the database file inside the data directory.
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE))
    }
}

#[cfg(unix)]
fn create_data_dir(dir: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o750).create(dir)
}

#[cfg(not(unix))]
fn create_data_dir(dir: &std::path::Path) -> std::io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(dir)
}

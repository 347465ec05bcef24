use std::fs;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::rules::SortMode;

#[derive(Debug, Deserialize)]
pub struct Rabbit {
    /// Relative paths resolve against the user's data directory.
    pub database: PathBuf,
    pub task_sort: SortMode,
    pub todo_sort: SortMode,
    pub default_urgency: u8,
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Configuration {
    pub rabbit: Rabbit,
}

const DEFAULT_CONFIG: &str = r#"
[rabbit]
# SQLite file holding both lists.
database="rabbit.db"
# One of priority, alpha, added.
task_sort="priority"
todo_sort="added"
# Urgency (1-5) for tasks added without one.
default_urgency=1
log_level="warn"

"#;

impl Configuration {
    /// Loads `~/.config/rabbit/rabbit.toml`, writing the defaults on first run.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or(Error::NoConfigDir)?;
        Self::from_path(&config_dir.join("rabbit/rabbit.toml"))
    }

    pub fn from_path(config_path: &Path) -> Result<Self> {
        Self::load(config_path, environment())
    }

    fn load(config_path: &Path, env: Environment) -> Result<Self> {
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(config_path, DEFAULT_CONFIG.trim())?;
        }

        let settings = Config::builder()
            .add_source(File::from(config_path).required(true))
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize::<Configuration>()?)
    }

    /// Resolves the database file, creating its parent directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        let db = &self.rabbit.database;
        let path = if db.is_absolute() {
            db.clone()
        } else {
            dirs::data_local_dir()
                .ok_or(Error::NoDataDir)?
                .join("rabbit")
                .join(db)
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

/// `RABBIT_RABBIT__DEFAULT_URGENCY=3` overrides `rabbit.default_urgency`.
fn environment() -> Environment {
    Environment::with_prefix("RABBIT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

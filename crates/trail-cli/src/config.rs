//! Configuration loading for the Trailblazer CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use trail_core::{AgentConfig, MazeConfig, TrainingConfig};
use trail_rl::SnapshotStore;

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "trail.toml";

/// Configuration for the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub maze: MazeConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
    /// File the configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub game_file: String,
    /// Save snapshots when a command finishes or is interrupted
    pub autosave: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("save"),
            model_file: trail_rl::persistence::DEFAULT_MODEL_FILE.to_string(),
            game_file: trail_rl::persistence::DEFAULT_GAME_FILE.to_string(),
            autosave: true,
        }
    }
}

impl PersistenceConfig {
    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.dir).with_file_names(&self.model_file, &self.game_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Optional log file; empty means stdout only
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicit path takes precedence over the search locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let env = Environment::with_prefix("TRAIL")
            .separator("__")
            .try_parsing(true);

        Self::from_sources(path.as_deref(), env)
    }

    fn from_sources(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            tracing::info!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        } else {
            tracing::info!("No config file found, using defaults");
        }

        builder = builder.add_source(env);

        let mut config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.source = path.map(Path::to_path_buf);

        config.maze.validate()?;
        config.agent.validate()?;
        config.training.validate()?;

        Ok(config)
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: TRAIL_CONFIG env, ./trail.toml, ~/.config/trail/trail.toml
        if let Ok(path) = std::env::var("TRAIL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("trail").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

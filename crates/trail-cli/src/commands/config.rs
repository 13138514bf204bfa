//! Configuration management commands

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{Config, CONFIG_FILE_NAME};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file to the working directory
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config),
        ConfigCommands::Init { force } => init(Path::new(CONFIG_FILE_NAME), force).map(|_| ()),
    }
}

fn show(config: &Config) -> Result<()> {
    match &config.source {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# No configuration file found, defaults and environment only"),
    }
    println!("{}", config.to_toml()?);
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(false);
    }

    let content = Config::default().to_toml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        assert!(init(&path, false).unwrap());
        std::fs::write(&path, "# edited\n").unwrap();

        assert!(!init(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");

        assert!(init(&path, true).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[maze]"));
        assert!(content.contains("[persistence]"));
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use beamdrop_core::BeamdropConfig;
use clap::{Parser, Subcommand};

const TEMPLATE: &str = include_str!("../../config.template.toml");

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Write a commented config file with the defaults
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs, path: &Path, config: &BeamdropConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init(args) => run_init(args, path),
    }
}

fn run_init(args: InitArgs, path: &Path) -> Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!(
            "Config already exists at {}\n\nUse --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, TEMPLATE)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_matches_defaults() {
        let parsed: BeamdropConfig = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(parsed, BeamdropConfig::default());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        run_init(InitArgs { force: false }, &path).unwrap();
        assert!(BeamdropConfig::load_from(&path).is_ok());

        let err = run_init(InitArgs { force: false }, &path).unwrap_err();
        assert!(err.to_string().contains("--force"));
        run_init(InitArgs { force: true }, &path).unwrap();
    }
}

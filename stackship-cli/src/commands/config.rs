//! `stackship config show|init`

use anyhow::{Context, Result};
use clap::Subcommand;

use stackship_core::{config, DeployConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (defaults when no file exists).
    Show,
    /// Write the default configuration if none exists yet.
    Init,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    match command {
        ConfigCommand::Show => {
            let cfg = config::load_at(&home).context("failed to load ~/.stackship/config.yaml")?;
            print!("{}", serde_yaml::to_string(&cfg)?);
        }
        ConfigCommand::Init => {
            let path = config::config_path_at(&home);
            if path.exists() {
                println!("config already exists at {}", path.display());
                return Ok(());
            }
            config::save_at(&home, &DeployConfig::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

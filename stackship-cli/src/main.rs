//! Stackship: offline helpers around the workload deployment pipeline.
//!
//! # Usage
//!
//! ```text
//! stackship key <file> --category env-file|addons|custom-resource --name <name> [--ext <ext>]
//! stackship validate <plan.yaml> [--json]
//! stackship resources [--kind <kind>]
//! stackship config show|init
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, key::KeyArgs, resources::ResourcesArgs, validate::ValidateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stackship",
    version,
    about = "Stage, validate and deploy containerized workloads",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the content-addressed storage key for a local file.
    Key(KeyArgs),

    /// Check a deployment plan's aliases against its environment.
    Validate(ValidateArgs),

    /// List the custom resources each workload kind stages.
    Resources(ResourcesArgs),

    /// Inspect or create ~/.stackship/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Key(args) => args.run(),
        Commands::Validate(args) => args.run(),
        Commands::Resources(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

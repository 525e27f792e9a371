//! `stackship key <file> --category <c> --name <n> [--ext <e>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;

use stackship_artifacts::{ArtifactCategory, ContentKey};
use stackship_core::config;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    EnvFile,
    Addons,
    CustomResource,
}

impl From<CategoryArg> for ArtifactCategory {
    fn from(c: CategoryArg) -> Self {
        match c {
            CategoryArg::EnvFile => ArtifactCategory::EnvFile,
            CategoryArg::Addons => ArtifactCategory::Addons,
            CategoryArg::CustomResource => ArtifactCategory::CustomResource,
        }
    }
}

/// Print the key a file would be staged under.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// File whose bytes are hashed.
    pub file: PathBuf,

    #[arg(long, value_enum)]
    pub category: CategoryArg,

    /// Logical name, e.g. the env file path or the workload name.
    #[arg(long)]
    pub name: String,

    /// Override the category's file extension.
    #[arg(long)]
    pub ext: Option<String>,

    /// Override the namespace from config.yaml.
    #[arg(long)]
    pub namespace: Option<String>,
}

impl KeyArgs {
    pub fn run(self) -> Result<()> {
        let content = std::fs::read(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let namespace = match self.namespace {
            Some(ns) => ns,
            None => {
                config::load()
                    .context("failed to load ~/.stackship/config.yaml")?
                    .artifact_namespace
            }
        };

        let category = ArtifactCategory::from(self.category);
        let key = match self.ext.as_deref() {
            Some(ext) => ContentKey::new(&namespace, category.segment(), &self.name, &content, ext),
            None => ContentKey::for_artifact(&namespace, category, &self.name, &content),
        };
        debug!(file = %self.file.display(), digest = key.digest(), "computed content key");
        println!("{key}");
        Ok(())
    }
}

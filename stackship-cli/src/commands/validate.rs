//! `stackship validate <plan.yaml> [--json]`
//!
//! Runs alias and certificate validation offline. The plan carries
//! everything a live deployment would fetch: the application, the target
//! environment's capability snapshot, and a table of which names each
//! imported certificate covers.
//!
//! ```yaml
//! app:
//!   name: press
//!   domain: example.com
//! environment:
//!   name: test
//!   region: us-west-2
//! capabilities:
//!   env_template_version: v1.4.0
//!   app_template_version: v1.0.0
//!   public_alb_certificates: ["arn:aws:acm:us-west-2:123:certificate/abc"]
//! certificates:
//!   "arn:aws:acm:us-west-2:123:certificate/abc": ["*.example.com"]
//! workload:
//!   name: api
//!   kind: load-balanced-web-service
//!   http:
//!     aliases:
//!       - name: api.example.com
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use stackship_core::{Application, EnvCapabilities, Environment, WorkloadManifest};
use stackship_deploy::{AliasError, AliasValidator, StaticCertValidator};

/// Validate a workload's aliases against its target environment.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML deployment plan.
    pub plan: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Deserialize)]
struct DeploymentPlan {
    app: Application,
    environment: Environment,
    capabilities: EnvCapabilities,
    /// Certificate ARN → names it covers.
    #[serde(default)]
    certificates: BTreeMap<String, Vec<String>>,
    workload: WorkloadManifest,
}

#[derive(Serialize)]
struct ValidationReport {
    workload: String,
    environment: String,
    aliases: Vec<String>,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let raw = std::fs::read_to_string(&self.plan)
            .with_context(|| format!("cannot read plan '{}'", self.plan.display()))?;
        let plan: DeploymentPlan = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid plan '{}'", self.plan.display()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let outcome = runtime.block_on(check(&plan));

        let report = ValidationReport {
            workload: plan.workload.name.to_string(),
            environment: plan.environment.name.to_string(),
            aliases: plan
                .workload
                .alias_set()
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            valid: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        outcome.context("alias validation failed")
    }
}

async fn check(plan: &DeploymentPlan) -> Result<(), AliasError> {
    let certs = StaticCertValidator::new(plan.certificates.clone());
    AliasValidator {
        app: &plan.app,
        env: &plan.environment.name,
        capabilities: &plan.capabilities,
        certs: &certs,
    }
    .validate(&plan.workload)
    .await?;
    info!(
        workload = %plan.workload.name,
        env = %plan.environment.name,
        "plan validated"
    );
    Ok(())
}

fn print_report(report: &ValidationReport) {
    let target = format!("{} → {}", report.workload, report.environment);
    if report.valid {
        println!("{} {}", "✓".green().bold(), target);
        for alias in &report.aliases {
            println!("  ·  {alias}");
        }
    } else {
        println!("{} {}", "✗".red().bold(), target);
    }
}

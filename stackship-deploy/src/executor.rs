//! Deployment Executor.
//!
//! ```text
//! Submitting ─┬─ ok ───────────────► Deployed
//!             ├─ other error ──────► Failed
//!             └─ empty change set ─► NoOpDetected ─┬─ no force ───► NoChanges
//!                                                  └─ force ──────► guard ─┬─ ForceSkipped
//!                                                                           ├─ ForceUpdated
//!                                                                           └─ Failed
//! ```

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use stackship_core::{StackConfiguration, WorkloadIdentity, WorkloadKind};

use crate::collaborators::{StackDeployError, StackDeployer};
use crate::error::DeployError;
use crate::force_update::{ForceOutcome, ForceUpdateGuard};

/// Terminal state of a successful execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The stack had changes and they were applied.
    Deployed,
    /// The stack was already current and no refresh was requested.
    NoChanges,
    /// A refresh was requested but the service was updated after this run began.
    ForceSkipped { last_updated: DateTime<Utc> },
    /// A refresh was issued and the rollout settled.
    ForceUpdated,
}

/// Submission plus forced-refresh policy for one workload.
pub struct DeploymentExecutor<'a> {
    pub stacks: &'a dyn StackDeployer,
    pub guard: ForceUpdateGuard<'a>,
}

/// Per-call inputs to [`DeploymentExecutor::execute`].
pub struct Execution<'a> {
    pub identity: &'a WorkloadIdentity,
    pub kind: WorkloadKind,
    pub stack: &'a StackConfiguration,
    pub bucket: &'a str,
    pub force_update: bool,
    pub comparison_instant: DateTime<Utc>,
}

impl DeploymentExecutor<'_> {
    pub async fn execute(
        &self,
        run: Execution<'_>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, DeployError> {
        let workload = run.identity.workload.to_string();
        info!(
            workload = %workload,
            env = %run.identity.env,
            stack = %run.stack.stack_name,
            bucket = run.bucket,
            "submitting stack"
        );

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DeployError::Cancelled),
            res = self.stacks.deploy_stack(run.stack, run.bucket) => res,
        };

        match submitted {
            Ok(()) => {
                info!(workload = %workload, "stack deployed");
                Ok(ExecutionOutcome::Deployed)
            }
            Err(StackDeployError::EmptyChangeSet { stack, change_set }) => {
                if !(run.force_update && run.kind.is_service()) {
                    info!(workload = %workload, stack = %stack, change_set = %change_set, "no changes to deploy");
                    return Ok(ExecutionOutcome::NoChanges);
                }
                match self
                    .guard
                    .run(run.identity, run.comparison_instant, cancel)
                    .await?
                {
                    ForceOutcome::Skipped { last_updated } => {
                        Ok(ExecutionOutcome::ForceSkipped { last_updated })
                    }
                    ForceOutcome::Forced => Ok(ExecutionOutcome::ForceUpdated),
                }
            }
            Err(StackDeployError::Other(source)) => {
                warn!(workload = %workload, error = %source, "stack deployment failed");
                Err(DeployError::Deployment { workload, source })
            }
        }
    }
}

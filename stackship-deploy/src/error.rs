use std::time::Duration;

use thiserror::Error;

use stackship_artifacts::{ArtifactError, BoxError};

use crate::alias::AliasError;

/// Error surface for a workload deployment.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Validation(#[from] AliasError),

    #[error("get version of environment \"{env}\": {source}")]
    EnvVersion {
        env: String,
        #[source]
        source: BoxError,
    },

    #[error("get version for app {app}: {source}")]
    AppVersion {
        app: String,
        #[source]
        source: BoxError,
    },

    #[error("describe environment {env}: {source}")]
    DescribeEnvironment {
        env: String,
        #[source]
        source: BoxError,
    },

    #[error("build and push image: {0}")]
    BuildPush(#[source] BoxError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("generate stack configuration: {0}")]
    StackConfiguration(#[source] BoxError),

    #[error("deploy workload {workload}: {source}")]
    Deployment {
        workload: String,
        #[source]
        source: BoxError,
    },

    /// First step of a forced update, alongside [`DeployError::ForceUpdate`]
    /// and [`DeployError::ForceUpdateTimeout`]: reading when the service was
    /// last deployed, before any refresh is requested.
    #[error("get the last updated deployment time for {workload}: {source}")]
    LastUpdatedAt {
        workload: String,
        #[source]
        source: BoxError,
    },

    #[error("force an update for service {workload}: {source}")]
    ForceUpdate {
        workload: String,
        #[source]
        source: BoxError,
    },

    /// The refresh may still complete after we stopped waiting.
    #[error(
        "force an update for service {workload}: not stable after {}s; the rollout may still \
         complete, check the service status in environment {env} before retrying",
        .waited.as_secs()
    )]
    ForceUpdateTimeout {
        workload: String,
        env: String,
        waited: Duration,
    },

    #[error("forced rollout of service {workload} failed: {reason}")]
    RolloutFailed { workload: String, reason: String },

    #[error("deployment cancelled")]
    Cancelled,
}

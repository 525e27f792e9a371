//! # stackship-deploy
//!
//! Workload deployment orchestration: image tags, alias validation, stack
//! submission and the forced-update policy.
//!
//! Entry point is [`WorkloadDeployer::deploy`]; every external system it
//! touches is a trait in [`collaborators`].

pub mod alias;
pub mod collaborators;
pub mod context;
mod error;
pub mod executor;
pub mod force_update;
pub mod image;
pub mod orchestrator;
pub mod workload;

pub use alias::{AliasError, AliasValidator};
pub use collaborators::{
    BuildArgs, CertAliasValidator, CertValidationError, Clock, EnvironmentDescriber,
    EnvironmentDescription, ImageBuilderPusher, RefreshError, RolloutState, ServiceRefresher,
    StackConfigGenerator, StackDeployError, StackDeployer, StackInput, StaticCertValidator,
    SystemClock, TagGenerator, TemplateVersions, UuidTagGenerator, WorkloadArtifacts,
};
pub use context::{resolve_context, ResolvedContext};
pub use error::DeployError;
pub use executor::ExecutionOutcome;
pub use force_update::{decide, ForceDecision, ForceOutcome, ForceUpdateGuard};
pub use image::ImageTags;
pub use orchestrator::{Collaborators, DeployOutcome, DeployRequest, WorkloadDeployer};
pub use workload::{strategy_for, ArtifactBundle, WorkloadStrategy};

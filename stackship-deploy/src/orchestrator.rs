//! The workload deployment pipeline.
//!
//! One call to [`WorkloadDeployer::deploy`] runs, in order:
//!
//! 1. capture the comparison instant
//! 2. resolve application / environment context
//! 3. validate aliases and certificates (before anything is mutated)
//! 4. build and push images
//! 5. stage artifacts
//! 6. generate the stack configuration
//! 7. submit, then apply the forced-update policy

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use stackship_artifacts::{
    AddonPackager, FileReader, ObjectStore, TemplateReader, UploadCoordinator,
};
use stackship_core::{
    Application, DeployConfig, Environment, ImageIdentifier, WorkloadIdentity, WorkloadManifest,
};

use crate::alias::AliasValidator;
use crate::collaborators::{
    CertAliasValidator, Clock, EnvironmentDescriber, ImageBuilderPusher, ServiceRefresher,
    StackConfigGenerator, StackDeployer, TagGenerator, TemplateVersions,
};
use crate::context::resolve_context;
use crate::error::DeployError;
use crate::executor::{DeploymentExecutor, Execution, ExecutionOutcome};
use crate::force_update::ForceUpdateGuard;
use crate::image::{build_and_push_images, resolve_identifier, ImageTags};
use crate::workload::{strategy_for, ArtifactBundle, UploadInputs};

/// Every external system a deployment talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ObjectStore>,
    pub files: Arc<dyn FileReader>,
    pub templates: Arc<dyn TemplateReader>,
    pub images: Arc<dyn ImageBuilderPusher>,
    pub stacks: Arc<dyn StackDeployer>,
    pub refresher: Arc<dyn ServiceRefresher>,
    pub certs: Arc<dyn CertAliasValidator>,
    pub versions: Arc<dyn TemplateVersions>,
    pub environments: Arc<dyn EnvironmentDescriber>,
    pub generator: Arc<dyn StackConfigGenerator>,
    pub clock: Arc<dyn Clock>,
    pub tags: Arc<dyn TagGenerator>,
}

/// One deployment invocation.
pub struct DeployRequest {
    pub app: Application,
    pub environment: Environment,
    pub manifest: WorkloadManifest,
    pub image_tags: ImageTags,
    pub force_update: bool,
    /// `None` when the workload has no addon resources.
    pub addons: Option<Arc<dyn AddonPackager>>,
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub stack_name: String,
    pub artifacts: ArtifactBundle,
    /// Tag candidates for this invocation; the fallback doubles as its id.
    pub image: ImageIdentifier,
    pub execution: ExecutionOutcome,
}

/// Deploys workloads into one artifact bucket.
pub struct WorkloadDeployer {
    collaborators: Collaborators,
    config: DeployConfig,
    bucket: String,
    workspace: PathBuf,
}

impl WorkloadDeployer {
    pub fn new(
        collaborators: Collaborators,
        config: DeployConfig,
        bucket: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collaborators,
            config,
            bucket: bucket.into(),
            workspace: workspace.into(),
        }
    }

    pub async fn deploy(
        &self,
        request: DeployRequest,
        cancel: &CancellationToken,
    ) -> Result<DeployOutcome, DeployError> {
        let c = &self.collaborators;
        let comparison_instant = c.clock.now();

        let DeployRequest {
            app,
            environment,
            manifest,
            image_tags,
            force_update,
            addons,
        } = request;
        let identity = WorkloadIdentity {
            app: app.name.clone(),
            env: environment.name.clone(),
            workload: manifest.name.clone(),
        };
        let image = resolve_identifier(&image_tags, c.tags.as_ref());
        info!(
            workload = %identity,
            kind = %manifest.kind,
            invocation = %image.fallback_tag,
            "deploying workload"
        );

        let ctx = cancellable(
            cancel,
            resolve_context(app, environment, c.versions.as_ref(), c.environments.as_ref()),
        )
        .await?;

        let aliases = AliasValidator {
            app: &ctx.app,
            env: &ctx.environment.name,
            capabilities: &ctx.capabilities,
            certs: c.certs.as_ref(),
        };
        cancellable(cancel, async {
            aliases.validate(&manifest).await.map_err(DeployError::from)
        })
        .await?;

        let images = if manifest.kind.runs_containers() && manifest.build_required() {
            cancellable(cancel, build_and_push_images(c.images.as_ref(), &manifest, &image)).await?
        } else {
            Default::default()
        };

        let coordinator = UploadCoordinator::new(
            c.store.clone(),
            c.files.clone(),
            self.bucket.clone(),
            ctx.environment.region.clone(),
            self.workspace.clone(),
        )
        .with_namespace(self.config.artifact_namespace.clone());
        let strategy = strategy_for(manifest.kind);
        let mut artifacts = cancellable(
            cancel,
            strategy.upload_artifacts(UploadInputs {
                coordinator: &coordinator,
                templates: c.templates.as_ref(),
                addons: addons.as_deref(),
                manifest: &manifest,
            }),
        )
        .await?;
        artifacts.images = images;

        let stack = strategy.stack_configuration(
            c.generator.as_ref(),
            &identity,
            &manifest,
            &self.bucket,
            &artifacts,
        )?;

        let executor = DeploymentExecutor {
            stacks: c.stacks.as_ref(),
            guard: ForceUpdateGuard::new(
                c.refresher.as_ref(),
                self.config.force_update_timeout(),
                self.config.rollout_poll_interval(),
            ),
        };
        let execution = executor
            .execute(
                Execution {
                    identity: &identity,
                    kind: manifest.kind,
                    stack: &stack,
                    bucket: &self.bucket,
                    force_update,
                    comparison_instant,
                },
                cancel,
            )
            .await?;

        info!(workload = %identity, outcome = ?execution, "deployment finished");
        Ok(DeployOutcome {
            stack_name: stack.stack_name,
            artifacts,
            image,
            execution,
        })
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, DeployError>>,
) -> Result<T, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled),
        res = fut => res,
    }
}

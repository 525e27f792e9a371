//! Per-kind deployment behaviour.
//!
//! The orchestrator is workload-agnostic; what differs between kinds
//! (which artifacts are staged, which custom resources the stack needs,
//! what the stack generator receives) lives behind [`WorkloadStrategy`].

use std::collections::BTreeMap;

use async_trait::async_trait;

use stackship_artifacts::{
    custom_resource, AddonPackager, CustomResource, CustomResourceLocator, TemplateReader,
    UploadCoordinator, UploadedAsset,
};
use stackship_core::{
    ImageIdentifier, StackConfiguration, WorkloadIdentity, WorkloadKind, WorkloadManifest,
};

use crate::collaborators::{StackConfigGenerator, StackInput, WorkloadArtifacts};
use crate::error::DeployError;

/// Locators produced for one deployment, consumed by stack generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub addons_url: Option<String>,
    pub env_file_arn: Option<String>,
    pub custom_resources: BTreeMap<String, CustomResourceLocator>,
    /// Built images keyed by container name.
    pub images: BTreeMap<String, ImageIdentifier>,
    pub static_assets: Vec<UploadedAsset>,
}

/// Inputs shared by every strategy's upload step.
pub struct UploadInputs<'a> {
    pub coordinator: &'a UploadCoordinator,
    pub templates: &'a dyn TemplateReader,
    pub addons: Option<&'a dyn AddonPackager>,
    pub manifest: &'a WorkloadManifest,
}

#[async_trait]
pub trait WorkloadStrategy: Send + Sync {
    fn custom_resources(&self) -> &'static [CustomResource];

    /// Stage every artifact this kind needs. `images` is empty here; the
    /// orchestrator fills it from the build step.
    async fn upload_artifacts(&self, inputs: UploadInputs<'_>) -> Result<ArtifactBundle, DeployError>;

    fn stack_configuration(
        &self,
        generator: &dyn StackConfigGenerator,
        identity: &WorkloadIdentity,
        manifest: &WorkloadManifest,
        bucket: &str,
        bundle: &ArtifactBundle,
    ) -> Result<StackConfiguration, DeployError>;
}

/// Pick the strategy for a workload kind.
pub fn strategy_for(kind: WorkloadKind) -> Box<dyn WorkloadStrategy> {
    match kind {
        WorkloadKind::StaticSite => Box::new(StaticSiteStrategy),
        other => Box::new(ContainerStrategy { kind: other }),
    }
}

// ---------------------------------------------------------------------------
// Services and jobs
// ---------------------------------------------------------------------------

/// Container-based services and jobs: env file, addons and custom resources,
/// staged concurrently.
pub struct ContainerStrategy {
    kind: WorkloadKind,
}

#[async_trait]
impl WorkloadStrategy for ContainerStrategy {
    fn custom_resources(&self) -> &'static [CustomResource] {
        custom_resource::for_kind(self.kind)
    }

    async fn upload_artifacts(&self, inputs: UploadInputs<'_>) -> Result<ArtifactBundle, DeployError> {
        let up = inputs.coordinator;
        let (env_file_arn, addons_url, custom_resources) = tokio::try_join!(
            up.upload_env_file(inputs.manifest.env_file.as_deref()),
            up.upload_addons_template(&inputs.manifest.name, inputs.addons),
            up.upload_custom_resources(self.custom_resources(), inputs.templates),
        )?;
        Ok(ArtifactBundle {
            addons_url,
            env_file_arn,
            custom_resources,
            ..Default::default()
        })
    }

    fn stack_configuration(
        &self,
        generator: &dyn StackConfigGenerator,
        identity: &WorkloadIdentity,
        manifest: &WorkloadManifest,
        bucket: &str,
        bundle: &ArtifactBundle,
    ) -> Result<StackConfiguration, DeployError> {
        let input = StackInput {
            identity,
            manifest,
            bucket,
            addons_url: bundle.addons_url.as_deref(),
            custom_resources: &bundle.custom_resources,
            workload: WorkloadArtifacts::Containers {
                images: &bundle.images,
                env_file_arn: bundle.env_file_arn.as_deref(),
            },
        };
        generator
            .generate(&input)
            .map_err(DeployError::StackConfiguration)
    }
}

// ---------------------------------------------------------------------------
// Static sites
// ---------------------------------------------------------------------------

/// Static sites: assets under manifest-chosen keys, then addons and custom
/// resources. No env file, no images.
pub struct StaticSiteStrategy;

#[async_trait]
impl WorkloadStrategy for StaticSiteStrategy {
    fn custom_resources(&self) -> &'static [CustomResource] {
        custom_resource::for_kind(WorkloadKind::StaticSite)
    }

    async fn upload_artifacts(&self, inputs: UploadInputs<'_>) -> Result<ArtifactBundle, DeployError> {
        let up = inputs.coordinator;
        let static_assets = up.upload_static_assets(&inputs.manifest.file_uploads).await?;
        let (addons_url, custom_resources) = tokio::try_join!(
            up.upload_addons_template(&inputs.manifest.name, inputs.addons),
            up.upload_custom_resources(self.custom_resources(), inputs.templates),
        )?;
        Ok(ArtifactBundle {
            addons_url,
            custom_resources,
            static_assets,
            ..Default::default()
        })
    }

    fn stack_configuration(
        &self,
        generator: &dyn StackConfigGenerator,
        identity: &WorkloadIdentity,
        manifest: &WorkloadManifest,
        bucket: &str,
        bundle: &ArtifactBundle,
    ) -> Result<StackConfiguration, DeployError> {
        let input = StackInput {
            identity,
            manifest,
            bucket,
            addons_url: bundle.addons_url.as_deref(),
            custom_resources: &bundle.custom_resources,
            workload: WorkloadArtifacts::StaticSite {
                assets: &bundle.static_assets,
            },
        };
        generator
            .generate(&input)
            .map_err(DeployError::StackConfiguration)
    }
}

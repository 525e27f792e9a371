//! Image Tag Resolver.
//!
//! Builds and pushes every container the manifest declares a build for,
//! tagging each with `latest` and the selected tag. All containers share
//! the same tag candidates; each gets its own digest.

use std::collections::BTreeMap;

use tracing::info;

use stackship_core::{ImageIdentifier, WorkloadManifest};

use crate::collaborators::{BuildArgs, ImageBuilderPusher, TagGenerator};
use crate::error::DeployError;

/// User- and VCS-supplied tag candidates for an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTags {
    pub custom_tag: Option<String>,
    pub git_short_commit_tag: Option<String>,
}

/// Combine the supplied tags with a freshly generated fallback.
///
/// The fallback is generated even when a higher-precedence tag wins.
pub fn resolve_identifier(tags: &ImageTags, generator: &dyn TagGenerator) -> ImageIdentifier {
    ImageIdentifier::new(
        tags.custom_tag.clone(),
        tags.git_short_commit_tag.clone(),
        generator.generate(),
    )
}

/// Build/push arguments for one container.
pub fn build_args(manifest: &WorkloadManifest, container: &str, selected_tag: &str) -> Option<BuildArgs> {
    let build = manifest.build.get(container)?;
    Some(BuildArgs {
        dockerfile: build.dockerfile.clone(),
        context: build.context.clone(),
        platform: manifest.platform.clone(),
        tags: vec!["latest".to_string(), selected_tag.to_string()],
    })
}

/// Build and push every declared container, keyed by container name.
///
/// The first failure aborts the rest.
pub async fn build_and_push_images(
    builder: &dyn ImageBuilderPusher,
    manifest: &WorkloadManifest,
    identifier: &ImageIdentifier,
) -> Result<BTreeMap<String, ImageIdentifier>, DeployError> {
    let mut images = BTreeMap::new();
    for container in manifest.build.keys() {
        let Some(args) = build_args(manifest, container, identifier.selected_tag()) else {
            continue;
        };
        let digest = builder
            .build_and_push(&args)
            .await
            .map_err(DeployError::BuildPush)?;
        info!(
            container = %container,
            tag = identifier.selected_tag(),
            digest = %digest,
            "pushed image"
        );
        images.insert(container.clone(), identifier.clone().with_digest(digest));
    }
    Ok(images)
}

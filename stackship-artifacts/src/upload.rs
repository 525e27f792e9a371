//! Artifact Upload Coordinator.
//!
//! Stages the env file, the addons template and the custom-resource scripts
//! of one workload into the artifact bucket. Every step is independent and
//! safe to retry on its own: keys are content-addressed, so a repeated upload
//! overwrites an object with identical bytes.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use stackship_core::{FileUpload, WorkloadName};

use crate::content::{ArtifactCategory, ContentKey};
use crate::custom_resource::CustomResource;
use crate::error::{read_err, ArtifactError, BoxError};
use crate::locator::{parse_locator, ObjectLocation, Partition};
use crate::static_site::{self, UploadedAsset};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Object storage. Overwrites on key collision.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `content` under `bucket`/`key` and return the object's URL.
    async fn upload(&self, bucket: &str, key: &str, content: Vec<u8>) -> Result<String, BoxError>;
}

/// What a static-site source path points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTree {
    File,
    /// Files under the directory, as sorted `/`-separated relative paths.
    Directory(Vec<String>),
}

/// Reads files out of the local workspace.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List the files under `path`, descending into subdirectories only when
    /// `recursive` is set.
    async fn source_tree(&self, path: &Path, recursive: bool) -> io::Result<SourceTree>;
}

/// Reads the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileReader;

#[async_trait]
impl FileReader for OsFileReader {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn source_tree(&self, path: &Path, recursive: bool) -> io::Result<SourceTree> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || walk_source(&path, recursive))
            .await
            .map_err(io::Error::other)?
    }
}

fn walk_source(path: &Path, recursive: bool) -> io::Result<SourceTree> {
    if std::fs::metadata(path)?.is_file() {
        return Ok(SourceTree::File);
    }
    let mut files = Vec::new();
    collect_files(path, path, recursive, &mut files)?;
    files.sort();
    Ok(SourceTree::Directory(files))
}

fn collect_files(root: &Path, dir: &Path, recursive: bool, out: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if recursive {
                collect_files(root, &path, recursive, out)?;
            }
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push(rel);
    }
    Ok(())
}

/// Packages a workload's addon resources and renders their template.
#[async_trait]
pub trait AddonPackager: Send + Sync {
    /// Upload local addon assets into `bucket`, rewriting references in the
    /// template to point at the uploaded copies.
    async fn package(&self, bucket: &str) -> Result<(), BoxError>;
    async fn template(&self) -> Result<String, BoxError>;
}

/// Supplies bundled template bodies, e.g. `custom-resources/env-controller-function.js`.
#[async_trait]
pub trait TemplateReader: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>, BoxError>;
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Where an uploaded custom-resource script lives, in every form the stack
/// template generator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResourceLocator {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub uri: String,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Stages content-addressed artifacts for one workload deployment.
#[derive(Clone)]
pub struct UploadCoordinator {
    store: Arc<dyn ObjectStore>,
    files: Arc<dyn FileReader>,
    bucket: String,
    namespace: String,
    region: String,
    workspace: PathBuf,
}

impl UploadCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        files: Arc<dyn FileReader>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            files,
            bucket: bucket.into(),
            namespace: stackship_core::config::DEFAULT_ARTIFACT_NAMESPACE.to_string(),
            region: region.into(),
            workspace: workspace.into(),
        }
    }

    /// Override the leading key segment (default `manual`).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Upload the files selected by static-site `rules`, resolving each
    /// source against the workspace.
    pub async fn upload_static_assets(
        &self,
        rules: &[FileUpload],
    ) -> Result<Vec<UploadedAsset>, ArtifactError> {
        static_site::upload_static_assets(
            self.store.as_ref(),
            self.files.as_ref(),
            &self.workspace,
            &self.bucket,
            rules,
        )
        .await
    }

    /// Upload the workload's env file and return its object ARN.
    ///
    /// Returns `Ok(None)` without touching storage when no env file is
    /// declared.
    pub async fn upload_env_file(
        &self,
        env_file: Option<&Path>,
    ) -> Result<Option<String>, ArtifactError> {
        let Some(env_file) = env_file else {
            debug!("no env file declared, skipping");
            return Ok(None);
        };
        let content = self
            .files
            .read_file(&self.workspace.join(env_file))
            .await
            .map_err(|e| read_err("env file", env_file, e))?;

        let name = env_file.to_string_lossy();
        let key = ContentKey::for_artifact(&self.namespace, ArtifactCategory::EnvFile, &name, &content)
            .to_string();
        let url = self
            .put(format!("env file {name}"), &key, content)
            .await?;

        let location = self.locate_upload(&url, &key)?;
        let partition = Partition::resolve(&self.region)?;
        let arn = location.arn(partition);
        info!(bucket = %self.bucket, key = %key, arn = %arn, "uploaded env file");
        Ok(Some(arn))
    }

    /// Package addons and upload the rendered template. Returns the
    /// template's URL, or `Ok(None)` when the workload has no addons.
    pub async fn upload_addons_template(
        &self,
        workload: &WorkloadName,
        addons: Option<&dyn AddonPackager>,
    ) -> Result<Option<String>, ArtifactError> {
        let Some(addons) = addons else {
            debug!(workload = %workload, "no addons, skipping");
            return Ok(None);
        };
        addons
            .package(&self.bucket)
            .await
            .map_err(ArtifactError::AddonPackaging)?;
        let template = addons.template().await.map_err(ArtifactError::AddonTemplate)?;

        let content = template.into_bytes();
        let key = ContentKey::for_artifact(
            &self.namespace,
            ArtifactCategory::Addons,
            &workload.0,
            &content,
        )
        .to_string();
        let url = self.put("addons".to_string(), &key, content).await?;
        info!(bucket = %self.bucket, key = %key, workload = %workload, "uploaded addons template");
        Ok(Some(url))
    }

    /// Upload custom-resource scripts, keyed by function name. The first
    /// failure aborts the batch.
    pub async fn upload_custom_resources(
        &self,
        resources: &[CustomResource],
        templates: &dyn TemplateReader,
    ) -> Result<BTreeMap<String, CustomResourceLocator>, ArtifactError> {
        let mut locators = BTreeMap::new();
        for cr in resources {
            let locator = self.upload_custom_resource(cr, templates).await?;
            locators.insert(cr.name().to_string(), locator);
        }
        info!(bucket = %self.bucket, count = locators.len(), "uploaded custom resources");
        Ok(locators)
    }

    async fn upload_custom_resource(
        &self,
        cr: &CustomResource,
        templates: &dyn TemplateReader,
    ) -> Result<CustomResourceLocator, ArtifactError> {
        let body = templates
            .read(&cr.template_path())
            .await
            .map_err(|source| ArtifactError::CustomResourceRead {
                name: cr.name().to_string(),
                source,
            })?;
        let key = ContentKey::for_artifact(
            &self.namespace,
            ArtifactCategory::CustomResource,
            &cr.key_name(),
            &body,
        )
        .to_string();
        let url = self
            .put(format!("custom resource {}", cr.name()), &key, body)
            .await?;
        let location = self.locate_upload(&url, &key)?;
        debug!(bucket = %self.bucket, key = %key, name = cr.name(), "uploaded custom resource");
        Ok(CustomResourceLocator {
            uri: location.uri(),
            bucket: location.bucket,
            key: location.key,
            url,
        })
    }

    async fn put(&self, what: String, key: &str, content: Vec<u8>) -> Result<String, ArtifactError> {
        self.store
            .upload(&self.bucket, key, content)
            .await
            .map_err(|source| ArtifactError::Upload {
                what,
                bucket: self.bucket.clone(),
                source,
            })
    }

    /// Parse a URL returned by the store, naming the upload target on failure.
    fn locate_upload(&self, url: &str, key: &str) -> Result<ObjectLocation, ArtifactError> {
        parse_locator(url).map_err(|err| match err {
            ArtifactError::LocatorParse { locator, reason, .. } => ArtifactError::LocatorParse {
                locator,
                reason,
                uploaded: Some(ObjectLocation::new(&self.bucket, key)),
            },
            other => other,
        })
    }
}

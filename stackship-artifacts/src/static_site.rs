//! Static-site asset uploads.
//!
//! Unlike the other artifacts, asset keys are chosen by the manifest's
//! `destination` so the site serves stable paths. A path is skipped when it
//! matches any `exclude` pattern and no `reinclude` pattern; patterns are
//! matched against the path relative to the rule's source.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info, warn};

use stackship_core::FileUpload;

use crate::error::{read_err, ArtifactError, StaticAssetFailure};
use crate::upload::{FileReader, ObjectStore, SourceTree};

/// One uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub key: String,
    pub url: String,
}

/// Upload every file matched by `rules` into `bucket`. Relative sources are
/// resolved against `workspace` and read through `files`.
///
/// A failing rule does not stop the others; all failures are reported
/// together, one entry per offending source path.
pub async fn upload_static_assets(
    store: &dyn ObjectStore,
    files: &dyn FileReader,
    workspace: &Path,
    bucket: &str,
    rules: &[FileUpload],
) -> Result<Vec<UploadedAsset>, ArtifactError> {
    let mut uploaded = Vec::new();
    let mut failures = Vec::new();
    for rule in rules {
        let source_path = rule.source_path();
        let source = workspace.join(&source_path);
        match upload_rule(store, files, bucket, rule, &source).await {
            Ok(mut assets) => uploaded.append(&mut assets),
            Err(error) => {
                warn!(source = %source_path.display(), error = %error, "static asset rule failed");
                failures.push(StaticAssetFailure { source_path, error });
            }
        }
    }
    if !failures.is_empty() {
        return Err(ArtifactError::StaticAssets { failures });
    }
    info!(bucket, count = uploaded.len(), "uploaded static assets");
    Ok(uploaded)
}

async fn upload_rule(
    store: &dyn ObjectStore,
    files: &dyn FileReader,
    bucket: &str,
    rule: &FileUpload,
    source: &Path,
) -> Result<Vec<UploadedAsset>, ArtifactError> {
    let filter = PathFilter::new(&rule.exclude, &rule.reinclude)?;
    let tree = files
        .source_tree(source, rule.recursive)
        .await
        .map_err(|e| read_err("static asset source", source, e))?;
    let mut assets = Vec::new();
    for (path, key) in plan_rule(rule, source, tree, &filter) {
        let content = files
            .read_file(&path)
            .await
            .map_err(|e| read_err("static asset", &path, e))?;
        let url = store
            .upload(bucket, &key, content)
            .await
            .map_err(|source| ArtifactError::Upload {
                what: format!("static asset {}", path.display()),
                bucket: bucket.to_string(),
                source,
            })?;
        debug!(bucket, key = %key, "uploaded static asset");
        assets.push(UploadedAsset { key, url });
    }
    Ok(assets)
}

/// Files a rule selects, each with its destination key.
fn plan_rule(
    rule: &FileUpload,
    source: &Path,
    tree: SourceTree,
    filter: &PathFilter,
) -> Vec<(PathBuf, String)> {
    let destination = rule.destination.trim_matches('/');

    match tree {
        SourceTree::File => {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !filter.allows(&file_name) {
                return Vec::new();
            }
            let key = if destination.is_empty() {
                file_name
            } else {
                destination.to_string()
            };
            vec![(source.to_path_buf(), key)]
        }
        SourceTree::Directory(files) => files
            .into_iter()
            .filter(|rel| filter.allows(rel))
            .map(|rel| {
                let path = source.join(&rel);
                let key = if destination.is_empty() {
                    rel
                } else {
                    format!("{destination}/{rel}")
                };
                (path, key)
            })
            .collect(),
    }
}

struct PathFilter {
    exclude: Vec<Pattern>,
    reinclude: Vec<Pattern>,
}

impl PathFilter {
    fn new(exclude: &[String], reinclude: &[String]) -> Result<Self, ArtifactError> {
        Ok(Self {
            exclude: compile(exclude)?,
            reinclude: compile(reinclude)?,
        })
    }

    fn allows(&self, rel: &str) -> bool {
        let excluded = self.exclude.iter().any(|p| p.matches(rel));
        !excluded || self.reinclude.iter().any(|p| p.matches(rel))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, ArtifactError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| ArtifactError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

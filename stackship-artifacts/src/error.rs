//! Error types for stackship-artifacts.

use std::path::PathBuf;

use thiserror::Error;

use crate::locator::ObjectLocation;

/// Boxed failure reported by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that can arise while staging artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The workspace file could not be read.
    #[error("read {what} {path}: {source}")]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The object store rejected the upload.
    #[error("put {what} artifact to bucket {bucket}: {source}")]
    Upload {
        what: String,
        bucket: String,
        #[source]
        source: BoxError,
    },

    /// A returned URL, URI or ARN could not be split into bucket and key.
    #[error("parse s3 url{}: {reason}", uploaded_suffix(.uploaded))]
    LocatorParse {
        locator: String,
        reason: String,
        /// Where the object was uploaded, when the locator came back from an upload.
        uploaded: Option<ObjectLocation>,
    },

    /// The region does not belong to any known partition.
    #[error("find the partition for region {region}")]
    PartitionResolution { region: String },

    #[error("package addons: {0}")]
    AddonPackaging(#[source] BoxError),

    #[error("retrieve addons template: {0}")]
    AddonTemplate(#[source] BoxError),

    /// The template reader could not supply a custom resource body.
    #[error("read custom resource {name}: {source}")]
    CustomResourceRead {
        name: String,
        #[source]
        source: BoxError,
    },

    /// An include / exclude pattern on a file upload rule is not a valid glob.
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// One or more static-site upload rules failed.
    #[error("upload static assets: {}", summarize(.failures))]
    StaticAssets { failures: Vec<StaticAssetFailure> },
}

/// A static-site rule that failed, keyed by its source path.
#[derive(Debug)]
pub struct StaticAssetFailure {
    pub source_path: PathBuf,
    pub error: ArtifactError,
}

fn uploaded_suffix(uploaded: &Option<ObjectLocation>) -> String {
    match uploaded {
        Some(loc) => format!(" for {loc}"),
        None => String::new(),
    }
}

fn summarize(failures: &[StaticAssetFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.source_path.display(), f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience constructor for [`ArtifactError::Read`].
pub(crate) fn read_err(
    what: &'static str,
    path: impl Into<PathBuf>,
    source: std::io::Error,
) -> ArtifactError {
    ArtifactError::Read {
        what,
        path: path.into(),
        source,
    }
}

//! Content addressing for staged artifacts.
//!
//! Keys have the shape `<namespace>/<category>/<name>/<sha256>.<ext>`, so the
//! same bytes under the same logical name always land on the same object and
//! re-uploading is harmless.

use std::fmt;

use sha2::{Digest, Sha256};

/// The kind of artifact being staged. Fixes the category path segment and the
/// file extension of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactCategory {
    EnvFile,
    Addons,
    CustomResource,
}

impl ArtifactCategory {
    pub fn segment(self) -> &'static str {
        match self {
            ArtifactCategory::EnvFile => "env-files",
            ArtifactCategory::Addons => "addons",
            ArtifactCategory::CustomResource => "scripts/custom-resources",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactCategory::EnvFile => "env",
            ArtifactCategory::Addons => "yml",
            ArtifactCategory::CustomResource => "js",
        }
    }
}

/// A content-addressed object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    namespace: String,
    category: String,
    name: String,
    digest: String,
    extension: String,
}

impl ContentKey {
    /// Key for `content` staged as `name` under a well-known category.
    pub fn for_artifact(
        namespace: &str,
        category: ArtifactCategory,
        name: &str,
        content: &[u8],
    ) -> Self {
        Self::new(
            namespace,
            category.segment(),
            name,
            content,
            category.extension(),
        )
    }

    pub fn new(namespace: &str, category: &str, name: &str, content: &[u8], extension: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            digest: content_digest(content),
            extension: extension.to_string(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}.{}",
            self.namespace, self.category, self.name, self.digest, self.extension
        )
    }
}

/// Lowercase hex SHA-256 of the exact bytes.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

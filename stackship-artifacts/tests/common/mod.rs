//! In-memory collaborators shared by the artifact integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use stackship_artifacts::{
    AddonPackager, BoxError, FileReader, ObjectStore, SourceTree, TemplateReader,
};

pub const BUCKET: &str = "mockBucket";
pub const WORKSPACE: &str = "/ws";

/// Records every upload and answers with a virtual-hosted URL, a fixed
/// URL, or an error.
#[derive(Default)]
pub struct MemoryStore {
    pub uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    pub fixed_url: Option<String>,
    pub fail_with: Option<String>,
    /// Fail only keys containing this fragment.
    pub fail_key_containing: Option<String>,
}

impl MemoryStore {
    pub fn returning(url: &str) -> Self {
        Self {
            fixed_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(_, k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, bucket: &str, key: &str, content: Vec<u8>) -> Result<String, BoxError> {
        if let Some(msg) = &self.fail_with {
            let hit = self
                .fail_key_containing
                .as_ref()
                .map_or(true, |frag| key.contains(frag.as_str()));
            if hit {
                return Err(msg.clone().into());
            }
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), content));
        Ok(self
            .fixed_url
            .clone()
            .unwrap_or_else(|| format!("https://{bucket}.s3.us-west-2.amazonaws.com/{key}")))
    }
}

/// Files keyed by absolute path; anything else is `NotFound`.
#[derive(Default)]
pub struct MemoryFiles {
    pub files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFiles {
    pub fn with(path: &str, content: &[u8]) -> Self {
        Self::default().and(path, content)
    }

    /// Add another file, relative to [`WORKSPACE`].
    pub fn and(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(Path::new(WORKSPACE).join(path), content.to_vec());
        self
    }
}

#[async_trait]
impl FileReader for MemoryFiles {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "some error"))
    }

    async fn source_tree(&self, path: &Path, recursive: bool) -> io::Result<SourceTree> {
        if self.files.contains_key(path) {
            return Ok(SourceTree::File);
        }
        let mut rels: Vec<String> = self
            .files
            .keys()
            .filter_map(|k| k.strip_prefix(path).ok())
            .map(|rel| rel.to_string_lossy().into_owned())
            .filter(|rel| recursive || !rel.contains('/'))
            .collect();
        if rels.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "some error"));
        }
        rels.sort();
        Ok(SourceTree::Directory(rels))
    }
}

pub struct FakeAddons {
    pub package_err: Option<String>,
    pub template: Result<String, String>,
    pub packaged_into: Mutex<Option<String>>,
}

impl FakeAddons {
    pub fn rendering(body: &str) -> Self {
        Self {
            package_err: None,
            template: Ok(body.to_string()),
            packaged_into: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AddonPackager for FakeAddons {
    async fn package(&self, bucket: &str) -> Result<(), BoxError> {
        *self.packaged_into.lock().unwrap() = Some(bucket.to_string());
        match &self.package_err {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(()),
        }
    }

    async fn template(&self) -> Result<String, BoxError> {
        self.template.clone().map_err(Into::into)
    }
}

/// Serves `body of <path>` for every template.
pub struct EchoTemplates;

#[async_trait]
impl TemplateReader for EchoTemplates {
    async fn read(&self, path: &str) -> Result<Vec<u8>, BoxError> {
        Ok(format!("body of {path}").into_bytes())
    }
}

//! Workload manifest model.
//!
//! Parsing and schema validation of the user's manifest files happen
//! elsewhere; this module holds the already-validated shape the deployer
//! consumes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{WorkloadKind, WorkloadName};

/// A custom DNS hostname, optionally pinned to a hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone: Option<String>,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosted_zone: None,
        }
    }

    pub fn in_zone(name: impl Into<String>, hosted_zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosted_zone: Some(hosted_zone.into()),
        }
    }
}

/// Public (application load balancer) routing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub aliases: Vec<Alias>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to_https: Option<bool>,
}

/// Network load balancer routing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NlbConfig {
    pub port: String,
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

/// How to build one container image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub dockerfile: PathBuf,
    pub context: PathBuf,
}

/// One static-site upload rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileUpload {
    /// Directory the source is resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    pub source: PathBuf,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub reinclude: Vec<String>,
}

impl FileUpload {
    /// `context` joined with `source`.
    pub fn source_path(&self) -> PathBuf {
        match &self.context {
            Some(ctx) => ctx.join(&self.source),
            None => self.source.clone(),
        }
    }
}

/// Aliases partitioned by routing surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasSet {
    pub public: Vec<Alias>,
    pub nlb: Vec<Alias>,
}

impl AliasSet {
    pub fn public_names(&self) -> Vec<String> {
        self.public.iter().map(|a| a.name.clone()).collect()
    }

    /// Every alias across both surfaces, public first.
    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.public.iter().chain(self.nlb.iter())
    }

    pub fn hosted_zones(&self) -> Vec<String> {
        self.iter().filter_map(|a| a.hosted_zone.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.nlb.is_empty()
    }
}

/// A validated workload manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadManifest {
    pub name: WorkloadName,
    pub kind: WorkloadKind,
    /// Environment variable file, relative to the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
    /// Buildable containers keyed by container name.
    #[serde(default)]
    pub build: BTreeMap<String, BuildConfig>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlb: Option<NlbConfig>,
    #[serde(default)]
    pub file_uploads: Vec<FileUpload>,
}

fn default_platform() -> String {
    "linux/amd64".to_string()
}

impl WorkloadManifest {
    pub fn new(name: impl Into<WorkloadName>, kind: WorkloadKind) -> Self {
        Self {
            name: name.into(),
            kind,
            env_file: None,
            build: BTreeMap::new(),
            platform: default_platform(),
            http: None,
            nlb: None,
            file_uploads: Vec::new(),
        }
    }

    pub fn build_required(&self) -> bool {
        !self.build.is_empty()
    }

    pub fn alias_set(&self) -> AliasSet {
        AliasSet {
            public: self
                .http
                .as_ref()
                .map(|h| h.aliases.clone())
                .unwrap_or_default(),
            nlb: self
                .nlb
                .as_ref()
                .map(|n| n.aliases.clone())
                .unwrap_or_default(),
        }
    }

    pub fn redirect_to_https(&self) -> bool {
        self.http
            .as_ref()
            .and_then(|h| h.redirect_to_https)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_yaml_defaults() {
        let yaml = r#"
name: web
kind: load-balanced-web-service
http:
  aliases:
    - name: example.com
      hosted_zone: Z123
nlb:
  port: "443/tcp"
  aliases:
    - name: api.example.com
"#;
        let mft: WorkloadManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(mft.platform, "linux/amd64");
        assert!(!mft.build_required());
        let aliases = mft.alias_set();
        assert_eq!(aliases.public_names(), vec!["example.com".to_string()]);
        assert_eq!(aliases.hosted_zones(), vec!["Z123".to_string()]);
        assert_eq!(aliases.iter().count(), 2);
        assert!(!mft.redirect_to_https());
    }

    #[test]
    fn file_upload_joins_context() {
        let rule = FileUpload {
            context: Some(PathBuf::from("frontend")),
            source: PathBuf::from("dist"),
            ..Default::default()
        };
        assert_eq!(rule.source_path(), PathBuf::from("frontend/dist"));
    }
}

//! Interfaces to the systems a deployment drives but does not own.
//!
//! Each trait is the narrowest surface the orchestrator needs. Production
//! wiring supplies cloud-backed implementations; tests supply in-memory
//! fakes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stackship_artifacts::{BoxError, CustomResourceLocator, UploadedAsset};
use stackship_core::{
    AppName, EnvName, ImageIdentifier, StackConfiguration, WorkloadIdentity, WorkloadManifest,
};

// ---------------------------------------------------------------------------
// Image build / push
// ---------------------------------------------------------------------------

/// Arguments for one image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub platform: String,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ImageBuilderPusher: Send + Sync {
    /// Build and push the image, returning its digest.
    async fn build_and_push(&self, args: &BuildArgs) -> Result<String, BoxError>;
}

// ---------------------------------------------------------------------------
// Infrastructure engine
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StackDeployError {
    /// The computed change set has nothing to apply.
    #[error("change set with name {change_set} for stack {stack} has no changes")]
    EmptyChangeSet { stack: String, change_set: String },

    #[error(transparent)]
    Other(BoxError),
}

#[async_trait]
pub trait StackDeployer: Send + Sync {
    /// Create or update the stack and wait for the engine to finish.
    async fn deploy_stack(
        &self,
        config: &StackConfiguration,
        bucket: &str,
    ) -> Result<(), StackDeployError>;
}

// ---------------------------------------------------------------------------
// Service refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh was issued but the collaborator gave up waiting for it.
    #[error("wait for the service to become stable timed out")]
    WaitTimeout,

    #[error(transparent)]
    Other(BoxError),
}

/// Progress of a service rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutState {
    InProgress,
    Stable,
    Failed(String),
}

#[async_trait]
pub trait ServiceRefresher: Send + Sync {
    async fn last_updated_at(&self, id: &WorkloadIdentity) -> Result<DateTime<Utc>, BoxError>;

    /// Start a fresh rollout of the running service.
    async fn force_update_service(&self, id: &WorkloadIdentity) -> Result<(), RefreshError>;

    /// Current rollout state. Collaborators that block inside
    /// `force_update_service` until stable can keep the default.
    async fn rollout_state(&self, _id: &WorkloadIdentity) -> Result<RolloutState, BoxError> {
        Ok(RolloutState::Stable)
    }
}

// ---------------------------------------------------------------------------
// Certificates, versions, environment description
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CertValidationError {
    #[error("{} not covered by the imported certificates", describe_aliases(.aliases))]
    Mismatch { aliases: Vec<String> },

    #[error(transparent)]
    Lookup(BoxError),
}

fn describe_aliases(aliases: &[String]) -> String {
    match aliases {
        [one] => format!("alias {one} is"),
        many => format!("aliases {} are", many.join(", ")),
    }
}

#[async_trait]
pub trait CertAliasValidator: Send + Sync {
    /// Check every alias is covered by at least one of `certs`.
    async fn validate_cert_aliases(
        &self,
        aliases: &[String],
        certs: &[String],
    ) -> Result<(), CertValidationError>;
}

/// Reads deployed template versions.
#[async_trait]
pub trait TemplateVersions: Send + Sync {
    async fn app_version(&self, app: &AppName) -> Result<String, BoxError>;
    async fn env_version(&self, app: &AppName, env: &EnvName) -> Result<String, BoxError>;
}

/// Certificate and CDN settings of a deployed environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentDescription {
    pub public_alb_certificates: Vec<String>,
    pub cdn_certificate: Option<String>,
    pub cdn_enabled: bool,
}

#[async_trait]
pub trait EnvironmentDescriber: Send + Sync {
    async fn describe(&self, app: &AppName, env: &EnvName)
        -> Result<EnvironmentDescription, BoxError>;
}

/// Certificate validator over a fixed table of ARN → covered names.
///
/// A covered name of the form `*.example.com` matches exactly one extra
/// label in front of `example.com`.
#[derive(Debug, Clone, Default)]
pub struct StaticCertValidator {
    covered: BTreeMap<String, BTreeSet<String>>,
}

impl StaticCertValidator {
    pub fn new(covered: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            covered: covered
                .into_iter()
                .map(|(arn, names)| (arn, names.into_iter().collect()))
                .collect(),
        }
    }

    fn covers(&self, cert: &str, alias: &str) -> bool {
        let Some(names) = self.covered.get(cert) else {
            return false;
        };
        names.iter().any(|name| match name.strip_prefix("*.") {
            Some(parent) => alias
                .split_once('.')
                .is_some_and(|(label, rest)| !label.is_empty() && rest == parent),
            None => name == alias,
        })
    }
}

#[async_trait]
impl CertAliasValidator for StaticCertValidator {
    async fn validate_cert_aliases(
        &self,
        aliases: &[String],
        certs: &[String],
    ) -> Result<(), CertValidationError> {
        let missing: Vec<String> = aliases
            .iter()
            .filter(|alias| !certs.iter().any(|cert| self.covers(cert, alias)))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CertValidationError::Mismatch { aliases: missing })
        }
    }
}

// ---------------------------------------------------------------------------
// Stack configuration generation
// ---------------------------------------------------------------------------

/// Kind-specific artifacts handed to the stack generator.
#[derive(Debug, Clone, Copy)]
pub enum WorkloadArtifacts<'a> {
    Containers {
        images: &'a BTreeMap<String, ImageIdentifier>,
        env_file_arn: Option<&'a str>,
    },
    StaticSite {
        assets: &'a [UploadedAsset],
    },
}

/// Everything the stack generator consumes.
#[derive(Debug, Clone, Copy)]
pub struct StackInput<'a> {
    pub identity: &'a WorkloadIdentity,
    pub manifest: &'a WorkloadManifest,
    pub bucket: &'a str,
    pub addons_url: Option<&'a str>,
    pub custom_resources: &'a BTreeMap<String, CustomResourceLocator>,
    pub workload: WorkloadArtifacts<'a>,
}

/// Renders the infrastructure stack for a workload.
pub trait StackConfigGenerator: Send + Sync {
    fn generate(&self, input: &StackInput<'_>) -> Result<StackConfiguration, BoxError>;
}

// ---------------------------------------------------------------------------
// Clock and tag generation
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of the per-invocation fallback image tag.
pub trait TagGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTagGenerator;

impl TagGenerator for UuidTagGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> StaticCertValidator {
        let mut table = BTreeMap::new();
        table.insert(
            "arn:cert:1".to_string(),
            vec!["example.com".to_string(), "*.example.com".to_string()],
        );
        StaticCertValidator::new(table)
    }

    #[tokio::test]
    async fn static_validator_matches_wildcards_one_level_deep() {
        let v = validator();
        let certs = vec!["arn:cert:1".to_string()];
        v.validate_cert_aliases(&["example.com".into(), "api.example.com".into()], &certs)
            .await
            .expect("covered");

        let err = v
            .validate_cert_aliases(&["a.b.example.com".into()], &certs)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "alias a.b.example.com is not covered by the imported certificates"
        );
    }

    #[tokio::test]
    async fn unknown_certificate_covers_nothing() {
        let v = validator();
        let err = v
            .validate_cert_aliases(&["example.com".into()], &["arn:cert:2".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, CertValidationError::Mismatch { aliases } if aliases == vec!["example.com".to_string()]));
    }

    #[test]
    fn uuid_tags_are_unique() {
        let tags = UuidTagGenerator;
        assert_ne!(tags.generate(), tags.generate());
    }
}

//! Domain types shared by every stackship crate.
//!
//! Identity values are newtypes so an environment name can never be passed
//! where a workload name is expected. All types are serde-serializable so
//! they can be read from YAML deployment plans.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of an application (the top-level grouping of environments).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(pub String);

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of an environment inside an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvName(pub String);

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EnvName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EnvName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a deployable workload (service, job or static site).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadName(pub String);

impl fmt::Display for WorkloadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkloadName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkloadName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Composite key for every downstream lookup of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadIdentity {
    pub app: AppName,
    pub env: EnvName,
    pub workload: WorkloadName,
}

impl WorkloadIdentity {
    pub fn new(
        app: impl Into<AppName>,
        env: impl Into<EnvName>,
        workload: impl Into<WorkloadName>,
    ) -> Self {
        Self {
            app: app.into(),
            env: env.into(),
            workload: workload.into(),
        }
    }

    /// Infrastructure stack name, `<app>-<env>-<workload>`.
    pub fn stack_name(&self) -> String {
        format!("{}-{}-{}", self.app, self.env, self.workload)
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app, self.env, self.workload)
    }
}

// ---------------------------------------------------------------------------
// Workload kinds
// ---------------------------------------------------------------------------

/// The category of a workload. Drives which artifacts are uploaded and which
/// custom resources the stack needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    LoadBalancedWebService,
    BackendService,
    WorkerService,
    RequestDrivenWebService,
    ScheduledJob,
    StaticSite,
}

impl WorkloadKind {
    pub fn all() -> &'static [WorkloadKind] {
        &[
            WorkloadKind::LoadBalancedWebService,
            WorkloadKind::BackendService,
            WorkloadKind::WorkerService,
            WorkloadKind::RequestDrivenWebService,
            WorkloadKind::ScheduledJob,
            WorkloadKind::StaticSite,
        ]
    }

    /// Whether the workload runs a long-lived container service that can be
    /// force-refreshed.
    pub fn is_service(self) -> bool {
        !matches!(self, WorkloadKind::ScheduledJob | WorkloadKind::StaticSite)
    }

    /// Whether the workload runs container images built from the workspace.
    pub fn runs_containers(self) -> bool {
        !matches!(self, WorkloadKind::StaticSite)
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkloadKind::LoadBalancedWebService => "Load Balanced Web Service",
            WorkloadKind::BackendService => "Backend Service",
            WorkloadKind::WorkerService => "Worker Service",
            WorkloadKind::RequestDrivenWebService => "Request-Driven Web Service",
            WorkloadKind::ScheduledJob => "Scheduled Job",
            WorkloadKind::StaticSite => "Static Site",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Application / environment
// ---------------------------------------------------------------------------

/// An application as recorded by the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: AppName,
    /// Route 53 domain managed on behalf of the application, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A deployment environment as recorded by the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: EnvName,
    pub region: String,
}

// ---------------------------------------------------------------------------
// Image identifier
// ---------------------------------------------------------------------------

/// Every tag candidate for a container image plus the digest returned by
/// build/push.
///
/// The fallback tag is always present so logs and forced refreshes can refer
/// to this invocation even when a custom or commit tag wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_short_commit_tag: Option<String>,
    pub fallback_tag: String,
}

impl ImageIdentifier {
    /// Empty strings are treated as absent tags.
    pub fn new(
        custom_tag: Option<String>,
        git_short_commit_tag: Option<String>,
        fallback_tag: String,
    ) -> Self {
        Self {
            digest: None,
            custom_tag: custom_tag.filter(|t| !t.is_empty()),
            git_short_commit_tag: git_short_commit_tag.filter(|t| !t.is_empty()),
            fallback_tag,
        }
    }

    /// Tag chosen by precedence: custom, then commit, then fallback.
    pub fn selected_tag(&self) -> &str {
        self.custom_tag
            .as_deref()
            .or(self.git_short_commit_tag.as_deref())
            .unwrap_or(&self.fallback_tag)
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Stack configuration
// ---------------------------------------------------------------------------

/// A rendered infrastructure stack ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackConfiguration {
    pub stack_name: String,
    pub template: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

//! In-memory collaborators for the deploy integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use stackship_artifacts::{
    AddonPackager, BoxError, FileReader, ObjectStore, SourceTree, TemplateReader,
};
use stackship_core::{
    AppName, Application, DeployConfig, EnvName, Environment, StackConfiguration,
    WorkloadIdentity, WorkloadKind, WorkloadManifest,
};
use stackship_deploy::{
    BuildArgs, CertAliasValidator, CertValidationError, Clock, Collaborators, DeployRequest,
    EnvironmentDescriber, EnvironmentDescription, ImageBuilderPusher, ImageTags, RefreshError,
    RolloutState, ServiceRefresher, StackConfigGenerator, StackDeployError, StackDeployer,
    StackInput, TagGenerator, TemplateVersions, WorkloadArtifacts, WorkloadDeployer,
};

pub const APP: &str = "mockApp";
pub const ENV: &str = "mockEnv";
pub const WORKLOAD: &str = "mockWkld";
pub const BUCKET: &str = "mockBucket";
pub const UUID: &str = "mockUUID";

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

pub fn now() -> DateTime<Utc> {
    at(1_494_505_750)
}

pub fn before() -> DateTime<Utc> {
    at(1_494_505_743)
}

pub fn after() -> DateTime<Utc> {
    at(1_494_505_756)
}

// ---------------------------------------------------------------------------
// Storage and files
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemStore {
    pub keys: Mutex<Vec<String>>,
    /// Fail uploads whose key contains the first string, with the second as cause.
    pub fail: Option<(String, String)>,
}

impl MemStore {
    pub fn failing_keys(fragment: &str, cause: &str) -> Self {
        Self {
            fail: Some((fragment.to_string(), cause.to_string())),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemStore {
    async fn upload(&self, bucket: &str, key: &str, _content: Vec<u8>) -> Result<String, BoxError> {
        if let Some((fragment, cause)) = &self.fail {
            if key.contains(fragment.as_str()) {
                return Err(cause.clone().into());
            }
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://{bucket}.s3.us-west-2.amazonaws.com/{key}"))
    }
}

#[derive(Default)]
pub struct MemFiles;

#[async_trait]
impl FileReader for MemFiles {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        if path.ends_with("foo.env") {
            Ok(Vec::new())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "some error"))
        }
    }

    async fn source_tree(&self, path: &Path, _recursive: bool) -> io::Result<SourceTree> {
        if path.ends_with("foo.env") {
            Ok(SourceTree::File)
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "some error"))
        }
    }
}

/// Addons that package cleanly and render "some data".
pub struct SomeDataAddons;

#[async_trait]
impl AddonPackager for SomeDataAddons {
    async fn package(&self, _bucket: &str) -> Result<(), BoxError> {
        Ok(())
    }

    async fn template(&self) -> Result<String, BoxError> {
        Ok("some data".to_string())
    }
}

pub struct EchoTemplates;

#[async_trait]
impl TemplateReader for EchoTemplates {
    async fn read(&self, path: &str) -> Result<Vec<u8>, BoxError> {
        Ok(path.as_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeBuilder {
    pub calls: Mutex<Vec<BuildArgs>>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl ImageBuilderPusher for FakeBuilder {
    async fn build_and_push(&self, args: &BuildArgs) -> Result<String, BoxError> {
        self.calls.lock().unwrap().push(args.clone());
        match &self.fail_with {
            Some(msg) => Err(msg.clone().into()),
            None => Ok("mockDigest".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Stack engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub enum StackResult {
    #[default]
    Ok,
    EmptyChangeSet,
    Fail(String),
}

#[derive(Default)]
pub struct FakeStacks {
    pub result: StackResult,
    pub calls: AtomicUsize,
    pub buckets: Mutex<Vec<String>>,
}

#[async_trait]
impl StackDeployer for FakeStacks {
    async fn deploy_stack(
        &self,
        _config: &StackConfiguration,
        bucket: &str,
    ) -> Result<(), StackDeployError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.buckets.lock().unwrap().push(bucket.to_string());
        match &self.result {
            StackResult::Ok => Ok(()),
            StackResult::EmptyChangeSet => Err(StackDeployError::EmptyChangeSet {
                stack: "mockStack".into(),
                change_set: "mockChangeSet".into(),
            }),
            StackResult::Fail(msg) => Err(StackDeployError::Other(msg.clone().into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Service refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub enum ForceResult {
    #[default]
    Ok,
    WaitTimeout,
    Fail(String),
    /// Never returns.
    Hang,
}

pub struct FakeRefresher {
    pub last_updated: Result<DateTime<Utc>, String>,
    pub force: ForceResult,
    pub rollout: Mutex<VecDeque<RolloutState>>,
    pub force_calls: AtomicUsize,
    pub rollout_polls: AtomicUsize,
}

impl Default for FakeRefresher {
    fn default() -> Self {
        Self {
            last_updated: Ok(before()),
            force: ForceResult::Ok,
            rollout: Mutex::new(VecDeque::new()),
            force_calls: AtomicUsize::new(0),
            rollout_polls: AtomicUsize::new(0),
        }
    }
}

impl FakeRefresher {
    pub fn with_rollout(states: Vec<RolloutState>) -> Self {
        Self {
            rollout: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    pub fn forced(&self) -> usize {
        self.force_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceRefresher for FakeRefresher {
    async fn last_updated_at(&self, _id: &WorkloadIdentity) -> Result<DateTime<Utc>, BoxError> {
        self.last_updated.clone().map_err(Into::into)
    }

    async fn force_update_service(&self, _id: &WorkloadIdentity) -> Result<(), RefreshError> {
        self.force_calls.fetch_add(1, Ordering::SeqCst);
        match &self.force {
            ForceResult::Ok => Ok(()),
            ForceResult::WaitTimeout => Err(RefreshError::WaitTimeout),
            ForceResult::Fail(msg) => Err(RefreshError::Other(msg.clone().into())),
            ForceResult::Hang => std::future::pending().await,
        }
    }

    /// Pops scripted states; the last one repeats. No script means `Stable`.
    async fn rollout_state(&self, _id: &WorkloadIdentity) -> Result<RolloutState, BoxError> {
        self.rollout_polls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.rollout.lock().unwrap();
        Ok(match states.len() {
            0 => RolloutState::Stable,
            1 => states[0].clone(),
            _ => states.pop_front().unwrap_or(RolloutState::Stable),
        })
    }
}

// ---------------------------------------------------------------------------
// Certificates, versions, environment
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCerts {
    /// Certificate sets that fail validation.
    pub reject: Vec<Vec<String>>,
    pub calls: Mutex<Vec<(Vec<String>, Vec<String>)>>,
    /// Never answer.
    pub hang: bool,
}

#[async_trait]
impl CertAliasValidator for FakeCerts {
    async fn validate_cert_aliases(
        &self,
        aliases: &[String],
        certs: &[String],
    ) -> Result<(), CertValidationError> {
        self.calls
            .lock()
            .unwrap()
            .push((aliases.to_vec(), certs.to_vec()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.reject.iter().any(|r| r.as_slice() == certs) {
            return Err(CertValidationError::Lookup("some error".into()));
        }
        Ok(())
    }
}

pub struct FakeVersions {
    pub env: Result<String, String>,
    pub app: Result<String, String>,
    pub app_calls: AtomicUsize,
}

impl Default for FakeVersions {
    fn default() -> Self {
        Self {
            env: Ok("v1.42.0".into()),
            app: Ok("v1.0.0".into()),
            app_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TemplateVersions for FakeVersions {
    async fn app_version(&self, _app: &AppName) -> Result<String, BoxError> {
        self.app_calls.fetch_add(1, Ordering::SeqCst);
        self.app.clone().map_err(Into::into)
    }

    async fn env_version(&self, _app: &AppName, _env: &EnvName) -> Result<String, BoxError> {
        self.env.clone().map_err(Into::into)
    }
}

#[derive(Default)]
pub struct FakeEnvs {
    pub description: EnvironmentDescription,
}

#[async_trait]
impl EnvironmentDescriber for FakeEnvs {
    async fn describe(&self, _app: &AppName, _env: &EnvName) -> Result<EnvironmentDescription, BoxError> {
        Ok(self.description.clone())
    }
}

// ---------------------------------------------------------------------------
// Generation, clock, tags
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeGenerator {
    pub saw_static_site: Mutex<Option<bool>>,
}

impl StackConfigGenerator for FakeGenerator {
    fn generate(&self, input: &StackInput<'_>) -> Result<StackConfiguration, BoxError> {
        let is_site = matches!(input.workload, WorkloadArtifacts::StaticSite { .. });
        *self.saw_static_site.lock().unwrap() = Some(is_site);
        Ok(StackConfiguration {
            stack_name: input.identity.stack_name(),
            ..Default::default()
        })
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct FixedTag;

impl TagGenerator for FixedTag {
    fn generate(&self) -> String {
        UUID.to_string()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Fakes wired into a deployer. Tweak the fields before calling
/// [`Harness::deployer`].
pub struct Harness {
    pub store: Arc<MemStore>,
    pub builder: Arc<FakeBuilder>,
    pub stacks: Arc<FakeStacks>,
    pub refresher: Arc<FakeRefresher>,
    pub certs: Arc<FakeCerts>,
    pub versions: Arc<FakeVersions>,
    pub envs: Arc<FakeEnvs>,
    pub generator: Arc<FakeGenerator>,
    pub files: Arc<dyn FileReader>,
    pub workspace: PathBuf,
    pub config: DeployConfig,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            store: Arc::default(),
            builder: Arc::default(),
            stacks: Arc::default(),
            refresher: Arc::default(),
            certs: Arc::default(),
            versions: Arc::default(),
            envs: Arc::default(),
            generator: Arc::default(),
            files: Arc::new(MemFiles),
            workspace: PathBuf::from("/ws"),
            config: DeployConfig {
                force_update_timeout_secs: 60,
                rollout_poll_interval_secs: 5,
                ..Default::default()
            },
        }
    }
}

impl Harness {
    pub fn deployer(&self) -> WorkloadDeployer {
        let collaborators = Collaborators {
            store: self.store.clone(),
            files: self.files.clone(),
            templates: Arc::new(EchoTemplates),
            images: self.builder.clone(),
            stacks: self.stacks.clone(),
            refresher: self.refresher.clone(),
            certs: self.certs.clone(),
            versions: self.versions.clone(),
            environments: self.envs.clone(),
            generator: self.generator.clone(),
            clock: Arc::new(FixedClock(now())),
            tags: Arc::new(FixedTag),
        };
        WorkloadDeployer::new(collaborators, self.config.clone(), BUCKET, self.workspace.clone())
    }
}

pub fn app(domain: Option<&str>) -> Application {
    Application {
        name: APP.into(),
        domain: domain.map(str::to_string),
    }
}

pub fn request(manifest: WorkloadManifest) -> DeployRequest {
    request_in(app(None), manifest)
}

pub fn request_in(app: Application, manifest: WorkloadManifest) -> DeployRequest {
    DeployRequest {
        app,
        environment: Environment {
            name: ENV.into(),
            region: "us-west-2".into(),
        },
        manifest,
        image_tags: ImageTags::default(),
        force_update: false,
        addons: None,
    }
}

pub fn service() -> WorkloadManifest {
    WorkloadManifest::new(WORKLOAD, WorkloadKind::LoadBalancedWebService)
}

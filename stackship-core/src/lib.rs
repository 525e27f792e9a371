//! Stackship core library: domain types, manifest model, deploy config.
//!
//! - [`types`]: identity newtypes, workload kinds, image identifiers
//! - [`manifest`]: the validated workload manifest and alias sets
//! - [`capabilities`]: environment capability snapshot
//! - [`config`]: `~/.stackship/config.yaml` load / save
//! - [`error`]: [`ConfigError`]

pub mod capabilities;
pub mod config;
pub mod error;
pub mod manifest;
pub mod types;

pub use capabilities::EnvCapabilities;
pub use config::DeployConfig;
pub use error::ConfigError;
pub use manifest::{Alias, AliasSet, BuildConfig, FileUpload, HttpConfig, NlbConfig, WorkloadManifest};
pub use types::{
    AppName, Application, EnvName, Environment, ImageIdentifier, StackConfiguration,
    WorkloadIdentity, WorkloadKind, WorkloadName,
};

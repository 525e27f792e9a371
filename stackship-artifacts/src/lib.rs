//! # stackship-artifacts
//!
//! Content-addressed artifact staging.
//!
//! [`UploadCoordinator`] pushes a workload's env file, addons template and
//! custom-resource scripts into the artifact bucket under keys derived by
//! [`ContentKey`]; [`upload_static_assets`] handles static-site files, whose
//! keys come from the manifest instead.

pub mod content;
pub mod custom_resource;
pub mod error;
pub mod locator;
pub mod static_site;
pub mod upload;

pub use content::{content_digest, ArtifactCategory, ContentKey};
pub use custom_resource::CustomResource;
pub use error::{ArtifactError, BoxError, StaticAssetFailure};
pub use locator::{parse_arn, parse_locator, ObjectLocation, Partition};
pub use static_site::{upload_static_assets, UploadedAsset};
pub use upload::{
    AddonPackager, CustomResourceLocator, FileReader, ObjectStore, OsFileReader, SourceTree,
    TemplateReader, UploadCoordinator,
};

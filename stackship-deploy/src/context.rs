//! Application / environment context, fetched once per deployment.

use tracing::debug;

use stackship_core::{Application, EnvCapabilities, Environment};

use crate::collaborators::{EnvironmentDescriber, TemplateVersions};
use crate::error::DeployError;

/// Everything validation needs to know about the target, resolved up front
/// and passed down by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub app: Application,
    pub environment: Environment,
    pub capabilities: EnvCapabilities,
}

/// Fetch template versions and certificate settings. The application
/// version is only read when the application manages a domain.
pub async fn resolve_context(
    app: Application,
    environment: Environment,
    versions: &dyn TemplateVersions,
    environments: &dyn EnvironmentDescriber,
) -> Result<ResolvedContext, DeployError> {
    let env_template_version = versions
        .env_version(&app.name, &environment.name)
        .await
        .map_err(|source| DeployError::EnvVersion {
            env: environment.name.to_string(),
            source,
        })?;

    let description = environments
        .describe(&app.name, &environment.name)
        .await
        .map_err(|source| DeployError::DescribeEnvironment {
            env: environment.name.to_string(),
            source,
        })?;

    let app_template_version = match app.domain {
        Some(_) => Some(versions.app_version(&app.name).await.map_err(|source| {
            DeployError::AppVersion {
                app: app.name.to_string(),
                source,
            }
        })?),
        None => None,
    };

    debug!(
        app = %app.name,
        env = %environment.name,
        env_version = %env_template_version,
        alb_certs = description.public_alb_certificates.len(),
        cdn = description.cdn_enabled,
        "resolved deployment context"
    );

    Ok(ResolvedContext {
        capabilities: EnvCapabilities {
            public_alb_certificates: description.public_alb_certificates,
            cdn_certificate: description.cdn_certificate,
            cdn_enabled: description.cdn_enabled,
            env_template_version,
            app_template_version,
        },
        app,
        environment,
    })
}

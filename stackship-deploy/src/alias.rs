//! Alias & Certificate Validator.
//!
//! Checks a workload's aliases against what the application and environment
//! can serve. Rules run in a fixed order and stop at the first violation;
//! later rules assume the earlier ones held.

use semver::Version;
use thiserror::Error;
use tracing::debug;

use stackship_core::{Application, EnvCapabilities, EnvName, WorkloadKind, WorkloadManifest};

use crate::collaborators::{CertAliasValidator, CertValidationError};

/// Oldest application template that supports aliases.
pub const ALIAS_LEAST_APP_TEMPLATE_VERSION: &str = "v1.0.0";
/// Oldest environment template that supports aliases.
pub const ALIAS_LEAST_ENV_TEMPLATE_VERSION: &str = "v1.4.0";

#[derive(Debug, Error)]
pub enum AliasError {
    #[error(
        "cannot specify http.alias when application is not associated with a domain and env \
         {env} doesn't import one or more certificates"
    )]
    AliasWithoutDomain { env: String },

    #[error("cannot specify nlb.alias when application is not associated with a domain")]
    NlbAliasWithoutDomain,

    #[error("cannot specify nlb.alias when env {env} imports one or more certificates")]
    NlbAliasWithImportedCert { env: String },

    #[error("validate aliases against the imported public ALB certificate for env {env}: {source}")]
    CertificateAliasMismatch {
        env: String,
        #[source]
        source: CertValidationError,
    },

    #[error("validate aliases against the imported CDN certificate for env {env}: {source}")]
    CdnCertificateAliasMismatch {
        env: String,
        #[source]
        source: CertValidationError,
    },

    #[error(
        "cannot specify alias hosted zones [{}] when no certificates are imported in environment \"{env}\"",
        .zones.join(" ")
    )]
    HostedZoneWithoutCert { env: String, zones: Vec<String> },

    #[error("cannot specify alias hosted zones when cdn is enabled in environment \"{env}\"")]
    HostedZoneWithCdn { env: String },

    #[error(
        "cannot configure http to https redirect without having a domain associated with the \
         app \"{app}\" or importing any certificates in env \"{env}\""
    )]
    RedirectWithoutDomain { app: String, env: String },

    #[error("alias is not compatible with application versions below {floor}")]
    UnsupportedAppVersion { version: String, floor: &'static str },

    #[error("alias is not compatible with environment versions below {floor}")]
    UnsupportedEnvVersion { version: String, floor: &'static str },

    #[error("alias \"{alias}\" is not supported in hosted zones managed by stackship")]
    UnsupportedAliasShape { alias: String },

    #[error(
        "cannot deploy service {workload} without http.alias to environment {env} with \
         certificate imported"
    )]
    AliasRequiredWithImportedCert { workload: String, env: String },
}

/// Validates one workload's network identity against a capability snapshot.
pub struct AliasValidator<'a> {
    pub app: &'a Application,
    pub env: &'a EnvName,
    pub capabilities: &'a EnvCapabilities,
    pub certs: &'a dyn CertAliasValidator,
}

impl AliasValidator<'_> {
    pub async fn validate(&self, manifest: &WorkloadManifest) -> Result<(), AliasError> {
        let aliases = manifest.alias_set();
        let public = aliases.public_names();
        let has_domain = self.app.domain.is_some();
        let caps = self.capabilities;
        let env = self.env.to_string();

        // 1-3: which surfaces may carry aliases at all.
        if !public.is_empty() && !has_domain && !caps.imports_any_certificate() {
            return Err(AliasError::AliasWithoutDomain { env });
        }
        if !aliases.nlb.is_empty() {
            if !has_domain {
                return Err(AliasError::NlbAliasWithoutDomain);
            }
            if caps.has_imported_alb_certs() {
                return Err(AliasError::NlbAliasWithImportedCert { env });
            }
        }

        // 4: imported certificates must cover the public aliases.
        if !public.is_empty() {
            if caps.has_imported_alb_certs() {
                self.certs
                    .validate_cert_aliases(&public, &caps.public_alb_certificates)
                    .await
                    .map_err(|source| AliasError::CertificateAliasMismatch {
                        env: env.clone(),
                        source,
                    })?;
            }
            if let Some(cdn_cert) = &caps.cdn_certificate {
                self.certs
                    .validate_cert_aliases(&public, std::slice::from_ref(cdn_cert))
                    .await
                    .map_err(|source| AliasError::CdnCertificateAliasMismatch {
                        env: env.clone(),
                        source,
                    })?;
            }
        }

        // 5: hosted-zone overrides.
        let zones = aliases.hosted_zones();
        if !zones.is_empty() {
            if !caps.imports_any_certificate() {
                return Err(AliasError::HostedZoneWithoutCert { env, zones });
            }
            if caps.cdn_enabled {
                return Err(AliasError::HostedZoneWithCdn { env });
            }
        }

        // 6: redirect needs something to terminate TLS with.
        if manifest.redirect_to_https() && !has_domain && !caps.imports_any_certificate() {
            return Err(AliasError::RedirectWithoutDomain {
                app: self.app.name.to_string(),
                env,
            });
        }

        if aliases.is_empty() {
            return self.require_alias_with_imported_cert(manifest);
        }

        // 7: template version floors.
        if has_domain {
            let version = caps.app_template_version.as_deref().unwrap_or_default();
            if !meets_floor(version, ALIAS_LEAST_APP_TEMPLATE_VERSION) {
                return Err(AliasError::UnsupportedAppVersion {
                    version: version.to_string(),
                    floor: ALIAS_LEAST_APP_TEMPLATE_VERSION,
                });
            }
        }
        if !meets_floor(&caps.env_template_version, ALIAS_LEAST_ENV_TEMPLATE_VERSION) {
            return Err(AliasError::UnsupportedEnvVersion {
                version: caps.env_template_version.clone(),
                floor: ALIAS_LEAST_ENV_TEMPLATE_VERSION,
            });
        }

        // 8: aliases in the app's managed zone.
        if let Some(domain) = &self.app.domain {
            if !caps.has_imported_alb_certs() {
                if let Some(bad) = aliases.iter().find(|a| !is_managed_shape(&a.name, domain)) {
                    return Err(AliasError::UnsupportedAliasShape {
                        alias: bad.name.clone(),
                    });
                }
            }
        }

        debug!(env = %self.env, aliases = aliases.iter().count(), "aliases validated");
        Ok(())
    }

    /// A public load-balanced service in an environment with imported ALB
    /// certificates must name the alias the certificate serves.
    fn require_alias_with_imported_cert(&self, manifest: &WorkloadManifest) -> Result<(), AliasError> {
        if manifest.kind == WorkloadKind::LoadBalancedWebService
            && manifest.http.is_some()
            && self.capabilities.has_imported_alb_certs()
        {
            return Err(AliasError::AliasRequiredWithImportedCert {
                workload: manifest.name.to_string(),
                env: self.env.to_string(),
            });
        }
        Ok(())
    }
}

/// `version >= floor` on major.minor.patch. Unparsable versions never meet
/// the floor.
pub fn meets_floor(version: &str, floor: &str) -> bool {
    match (parse_version(version), parse_version(floor)) {
        (Some(v), Some(f)) => (v.major, v.minor, v.patch) >= (f.major, f.minor, f.patch),
        _ => false,
    }
}

fn parse_version(raw: &str) -> Option<Version> {
    Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()
}

/// `domain` itself or exactly one label in front of it.
fn is_managed_shape(alias: &str, domain: &str) -> bool {
    if alias == domain {
        return true;
    }
    alias
        .strip_suffix(domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
}

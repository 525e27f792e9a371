//! Environment capability snapshot.
//!
//! Fetched once per deployment and passed by reference to validation; never
//! refreshed mid-call.

use serde::{Deserialize, Serialize};

/// What the target environment and application can support, as seen at the
/// start of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvCapabilities {
    /// Certificates imported for the public application load balancer.
    #[serde(default)]
    pub public_alb_certificates: Vec<String>,
    /// Certificate imported for the CDN distribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_certificate: Option<String>,
    #[serde(default)]
    pub cdn_enabled: bool,
    pub env_template_version: String,
    /// Only fetched when the application manages a domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_template_version: Option<String>,
}

impl EnvCapabilities {
    pub fn has_imported_alb_certs(&self) -> bool {
        !self.public_alb_certificates.is_empty()
    }

    pub fn imports_any_certificate(&self) -> bool {
        self.has_imported_alb_certs() || self.cdn_certificate.is_some()
    }
}

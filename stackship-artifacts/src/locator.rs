//! Object locators: URL / URI parsing, ARN formatting, partition lookup.
//!
//! Accepted locator forms:
//!
//! ```text
//! s3://<bucket>/<key>
//! https://<bucket>.s3.<region>.amazonaws.com/<key>
//! https://<bucket>.s3-<region>.amazonaws.com/<key>
//! ```

use std::fmt;

use crate::error::ArtifactError;

const S3_URI_PREFIX: &str = "s3://";
const HTTPS_PREFIX: &str = "https://";

/// Bucket and key of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// `s3://<bucket>/<key>`
    pub fn uri(&self) -> String {
        format!("{S3_URI_PREFIX}{}/{}", self.bucket, self.key)
    }

    /// `arn:<partition>:s3:::<bucket>/<key>`
    pub fn arn(&self, partition: Partition) -> String {
        format!("arn:{}:s3:::{}/{}", partition.id(), self.bucket, self.key)
    }

    /// Virtual-hosted-style URL for an object in `region`.
    pub fn url(&self, region: &str) -> String {
        let tld = match Partition::for_region(region) {
            Some(Partition::AwsCn) => "cn",
            _ => "com",
        };
        format!(
            "https://{}.s3.{region}.amazonaws.{tld}/{}",
            self.bucket, self.key
        )
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Split an object URL or `s3://` URI into bucket and key.
pub fn parse_locator(locator: &str) -> Result<ObjectLocation, ArtifactError> {
    if let Some(rest) = locator.strip_prefix(S3_URI_PREFIX) {
        return parse_s3_uri(locator, rest);
    }
    parse_object_url(locator)
}

fn parse_s3_uri(locator: &str, rest: &str) -> Result<ObjectLocation, ArtifactError> {
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() => Ok(ObjectLocation::new(bucket, key)),
        _ => Err(ArtifactError::LocatorParse {
            locator: locator.to_string(),
            reason: format!("cannot parse S3 URI {locator} into bucket name and key"),
            uploaded: None,
        }),
    }
}

fn parse_object_url(locator: &str) -> Result<ObjectLocation, ArtifactError> {
    let malformed = || ArtifactError::LocatorParse {
        locator: locator.to_string(),
        reason: format!("cannot parse S3 URL {locator} into bucket name and key"),
        uploaded: None,
    };
    let trimmed = locator.strip_prefix(HTTPS_PREFIX).unwrap_or(locator);
    let (host, key) = trimmed.split_once('/').ok_or_else(malformed)?;

    // Walk the host backwards to the first label starting with "s3"; everything
    // to its left is the bucket. Covers both `.s3.<region>.` and `.s3-<region>.`.
    let labels: Vec<&str> = host.split('.').collect();
    let Some(s3_idx) = labels
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|(_, label)| label.starts_with("s3"))
        .map(|(idx, _)| idx)
    else {
        return Err(malformed());
    };
    Ok(ObjectLocation::new(labels[..s3_idx].join("."), key))
}

/// Parse an object or bucket ARN back into a location. A bucket ARN yields an
/// empty key.
pub fn parse_arn(arn: &str) -> Result<ObjectLocation, ArtifactError> {
    let invalid = |reason: &str| ArtifactError::LocatorParse {
        locator: arn.to_string(),
        reason: format!("invalid S3 ARN: {reason}"),
        uploaded: None,
    };
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() != 6 || parts[0] != "arn" {
        return Err(invalid("expected arn:<partition>:s3:::<resource>"));
    }
    if parts[2] != "s3" {
        return Err(invalid("service is not s3"));
    }
    if Partition::from_id(parts[1]).is_none() {
        return Err(invalid("unknown partition"));
    }
    match parts[5].split_once('/') {
        Some((bucket, key)) => Ok(ObjectLocation::new(bucket, key)),
        None => Ok(ObjectLocation::new(parts[5], "")),
    }
}

// ---------------------------------------------------------------------------
// Partitions
// ---------------------------------------------------------------------------

/// An isolated group of cloud regions sharing one ARN namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Aws,
    AwsCn,
    AwsUsGov,
    AwsIso,
    AwsIsoB,
}

const AWS_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-southeast-5",
    "ap-southeast-7",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "mx-central-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];
const AWS_CN_REGIONS: &[&str] = &["cn-north-1", "cn-northwest-1"];
const AWS_US_GOV_REGIONS: &[&str] = &["us-gov-east-1", "us-gov-west-1"];
const AWS_ISO_REGIONS: &[&str] = &["us-iso-east-1", "us-iso-west-1"];
const AWS_ISO_B_REGIONS: &[&str] = &["us-isob-east-1"];

impl Partition {
    pub fn all() -> &'static [Partition] {
        &[
            Partition::Aws,
            Partition::AwsCn,
            Partition::AwsUsGov,
            Partition::AwsIso,
            Partition::AwsIsoB,
        ]
    }

    pub fn id(self) -> &'static str {
        match self {
            Partition::Aws => "aws",
            Partition::AwsCn => "aws-cn",
            Partition::AwsUsGov => "aws-us-gov",
            Partition::AwsIso => "aws-iso",
            Partition::AwsIsoB => "aws-iso-b",
        }
    }

    pub fn from_id(id: &str) -> Option<Partition> {
        Partition::all().iter().copied().find(|p| p.id() == id)
    }

    fn regions(self) -> &'static [&'static str] {
        match self {
            Partition::Aws => AWS_REGIONS,
            Partition::AwsCn => AWS_CN_REGIONS,
            Partition::AwsUsGov => AWS_US_GOV_REGIONS,
            Partition::AwsIso => AWS_ISO_REGIONS,
            Partition::AwsIsoB => AWS_ISO_B_REGIONS,
        }
    }

    /// The partition a region belongs to, or `None` for unknown regions.
    pub fn for_region(region: &str) -> Option<Partition> {
        Partition::all()
            .iter()
            .copied()
            .find(|p| p.regions().contains(&region))
    }

    /// Like [`Partition::for_region`] but as an artifact error.
    pub fn resolve(region: &str) -> Result<Partition, ArtifactError> {
        Partition::for_region(region).ok_or_else(|| ArtifactError::PartitionResolution {
            region: region.to_string(),
        })
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

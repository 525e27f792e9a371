pub mod config;
pub mod key;
pub mod resources;
pub mod validate;

use std::fmt;
use std::str::FromStr;

use stackship_core::WorkloadKind;

// ---------------------------------------------------------------------------
// Shared WorkloadKind argument
// ---------------------------------------------------------------------------

/// Lets clap parse a [`WorkloadKind`] from its kebab-case name.
#[derive(Debug, Clone, Copy)]
pub struct KindArg(pub WorkloadKind);

impl FromStr for KindArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str::<WorkloadKind>(&s.to_ascii_lowercase())
            .map(Self)
            .map_err(|_| {
                format!(
                    "unknown workload kind '{s}'; expected one of: {}",
                    kind_names().join(", ")
                )
            })
    }
}

impl fmt::Display for KindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kebab-case names of every workload kind, as written in manifests.
pub fn kind_names() -> Vec<String> {
    WorkloadKind::all()
        .iter()
        .filter_map(|k| serde_yaml::to_string(k).ok())
        .map(|s| s.trim().to_string())
        .collect()
}

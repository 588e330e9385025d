use std::fmt::{self, Display};

use serde::Serialize;

/// Compile-time details about the running binary, filled in by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        target: env!("BUILD_TARGET"),
    }
}

impl Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ferry {} ({} build, features: {})\nbuilt {} with {} for {}",
            self.version,
            self.build_profile,
            self.build_features,
            self.build_timestamp,
            self.rust_version,
            self.target
        )
    }
}

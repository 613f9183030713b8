//! Version and build information.
//!
//! Provides version, git commit, and build metadata.

use std::fmt;

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waat {}", self.version)?;

        if let Some(commit) = self.commit {
            write!(f, " ({})", commit)?;
        }

        if let Some(date) = self.build_date {
            write!(f, " built {}", date)?;
        }

        Ok(())
    }
}

/// Get build information
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("WAAT_GIT_HASH"),
        build_date: option_env!("WAAT_BUILD_DATE"),
    }
}

//! Engine installation discovery and version gating.

use std::env;
use std::path::PathBuf;

use semver::{Version, VersionReq};

use crate::error::{Error, Result};
use crate::{DEFAULT_HOME, HOME_ENV_VAR};

/// Resolved engine installation root.
///
/// Resolution never mutates the process environment. The root only gets
/// applied to engine child processes, by whoever spawns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    pub home: PathBuf,
}

impl Installation {
    /// Uses the given root, bypassing environment lookup.
    pub fn at<P: Into<PathBuf>>(home: P) -> Self {
        Self { home: home.into() }
    }

    /// Resolves the root from the environment variable, falling back to
    /// the platform default.
    pub fn detect() -> Self {
        match env::var(HOME_ENV_VAR) {
            Ok(home) if !home.trim().is_empty() => {
                debug!("engine home from {}: {}", HOME_ENV_VAR, home);
                Self::at(home)
            }
            _ => {
                debug!("engine home defaulted to: {}", DEFAULT_HOME);
                Self::at(DEFAULT_HOME)
            }
        }
    }

    /// Path of the engine binary inside this installation.
    pub fn binary_path(&self) -> PathBuf {
        #[cfg(windows)]
        let binary = "omc.exe";
        #[cfg(not(windows))]
        let binary = "omc";
        self.home.join("bin").join(binary)
    }

    /// Checks that the engine binary is actually there.
    pub fn verify(&self) -> Result<()> {
        let binary = self.binary_path();
        if !binary.is_file() {
            return Err(Error::InstallationNotFound(
                self.home.to_string_lossy().to_string(),
            ));
        }
        Ok(())
    }
}

/// Pulls a semver-looking token out of an engine version reply.
///
/// Version replies vary between engine builds, `OpenModelica 1.14.1`,
/// `v1.16.0 (64-bit)` and similar forms are all in circulation.
pub fn extract_version(reply: &str) -> Option<Version> {
    for token in reply.split_whitespace() {
        let token = token.trim_start_matches('v');
        let cleaned: String = token
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(version) = Version::parse(&cleaned) {
            return Some(version);
        }
        if cleaned.matches('.').count() == 1 {
            if let Ok(version) = Version::parse(&format!("{}.0", cleaned)) {
                return Some(version);
            }
        }
    }
    None
}

/// Enforces a semver requirement against an engine version reply.
///
/// An unparseable reply is let through with a warning, a parsed version
/// outside the requirement is a hard error.
pub fn check_engine_version(reply: &str, requirement: &str) -> Result<()> {
    let req = VersionReq::parse(requirement)?;
    let version = match extract_version(reply) {
        Some(v) => v,
        None => {
            warn!(
                "could not extract an engine version from: \"{}\"",
                reply.trim()
            );
            return Ok(());
        }
    };
    if !req.matches(&version) {
        error!(
            "engine version does not meet the requirement, \
             reported: \"{}\", requirement: \"{}\"",
            version, requirement
        );
        return Err(Error::EngineVersionMismatch(
            version.to_string(),
            requirement.to_string(),
        ));
    }
    Ok(())
}

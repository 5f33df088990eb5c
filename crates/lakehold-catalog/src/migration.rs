//! Lake format versions and the migration chain between them.
//!
//! Migrations are an ordered list of `(from, to)` steps. Loading a lake plans
//! the steps from its stored version up to [`LATEST_FORMAT_VERSION`]; a stored
//! version with no path to the latest one cannot be loaded.

use std::fmt;

use crate::error::{BootstrapError, Result};

/// Format version written by new lakes.
pub const LATEST_FORMAT_VERSION: &str = "0.2";

/// One in-place upgrade of the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MigrationStep {
    /// Version the store must be at.
    pub from: &'static str,
    /// Version the store is at afterwards.
    pub to: &'static str,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Known migrations, oldest first.
pub const MIGRATIONS: &[MigrationStep] = &[MigrationStep {
    from: "0.1",
    to: "0.2",
}];

/// Returns every version this build can load.
#[must_use]
pub fn supported_versions() -> Vec<&'static str> {
    let mut versions: Vec<&'static str> = MIGRATIONS.iter().map(|step| step.from).collect();
    versions.push(LATEST_FORMAT_VERSION);
    versions
}

/// Plans the steps that bring `current` up to [`LATEST_FORMAT_VERSION`].
///
/// Returns an empty plan if `current` is already the latest version.
///
/// # Errors
///
/// Returns [`BootstrapError::UnsupportedFormatVersion`] if no chain of steps
/// leads from `current` to the latest version.
pub fn plan_migrations(current: &str) -> Result<Vec<MigrationStep>> {
    let mut steps = Vec::new();
    let mut version = current;
    while version != LATEST_FORMAT_VERSION {
        // Each step can be taken at most once, which also rules out cycles.
        let next = MIGRATIONS
            .iter()
            .find(|step| step.from == version)
            .filter(|_| steps.len() < MIGRATIONS.len())
            .ok_or_else(|| BootstrapError::UnsupportedFormatVersion {
                version: current.to_string(),
                supported: supported_versions().join(", "),
            })?;
        steps.push(*next);
        version = next.to;
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_needs_no_migration() {
        assert!(plan_migrations("0.2").unwrap().is_empty());
    }

    #[test]
    fn test_v01_migrates_once() {
        let steps = plan_migrations("0.1").unwrap();
        assert_eq!(steps, vec![MigrationStep { from: "0.1", to: "0.2" }]);
    }

    #[test]
    fn test_unknown_versions_are_rejected() {
        for version in ["0.3", "1.0", "", "0.1.0"] {
            let err = plan_migrations(version).unwrap_err();
            match err {
                BootstrapError::UnsupportedFormatVersion {
                    version: found,
                    supported,
                } => {
                    assert_eq!(found, version);
                    assert_eq!(supported, "0.1, 0.2");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}

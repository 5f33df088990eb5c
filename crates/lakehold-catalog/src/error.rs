//! Error types for lake bootstrap operations.

use lakehold_core::StorageCapability;
use thiserror::Error;

use crate::bootstrap::BootstrapPhase;

/// Result type alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors that abort a lake bootstrap.
///
/// Every variant is fatal: the bootstrap never retries internally and the
/// session does not become usable.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The metadata store could not be attached.
    #[error("failed to attach lake metadata \"{database}\" at path \"{path}\": {source}")]
    AttachFailure {
        /// Logical name of the metadata database.
        database: String,
        /// Path of the metadata database.
        path: String,
        /// The underlying connection or secret-loading error.
        #[source]
        source: lakehold_core::Error,
    },

    /// The requested configuration is not supported by this metadata store.
    #[error("not implemented: {message}")]
    UnsupportedConfiguration {
        /// Description of the unsupported setting.
        message: String,
    },

    /// A required input was not provided and no default could be derived.
    #[error("invalid input: {message}")]
    MissingRequiredInput {
        /// Description of the missing input.
        message: String,
    },

    /// The persisted format version is not supported.
    #[error(
        "not implemented: lake format version \"{version}\" is not supported (supported: {supported})"
    )]
    UnsupportedFormatVersion {
        /// Version found in the metadata store.
        version: String,
        /// Comma-separated list of versions this build can load.
        supported: String,
    },

    /// A well-known tag carries a value outside its domain.
    #[error("malformed value \"{value}\" for tag \"{key}\": expected {expected}")]
    MalformedTagValue {
        /// Tag key.
        key: String,
        /// Offending value.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },

    /// An explicitly requested snapshot does not exist.
    #[error("snapshot not found: {snapshot}")]
    SnapshotNotFound {
        /// Human-readable description of the requested snapshot.
        snapshot: String,
    },

    /// A storage location requires a capability that is not available.
    #[error(
        "data path \"{location}\" requires the \"{capability}\" storage capability, which is not available"
    )]
    MissingCapability {
        /// Capability required by the location.
        capability: StorageCapability,
        /// The data path that triggered the check.
        location: String,
    },

    /// The bootstrap was driven from a phase that does not allow it.
    #[error("bootstrap cannot run from phase {phase:?}")]
    InvalidPhase {
        /// Phase the bootstrapper was in.
        phase: BootstrapPhase,
    },

    /// A metadata-store operation failed.
    #[error(transparent)]
    Metadata(#[from] lakehold_core::Error),
}

impl BootstrapError {
    /// Creates an unsupported configuration error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            message: message.into(),
        }
    }

    /// Creates a missing required input error.
    #[must_use]
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingRequiredInput {
            message: message.into(),
        }
    }

    /// Creates a malformed tag value error.
    #[must_use]
    pub fn malformed_tag(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::MalformedTagValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// Returns a stable label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AttachFailure { .. } => "attach_failure",
            Self::UnsupportedConfiguration { .. } => "unsupported_configuration",
            Self::MissingRequiredInput { .. } => "missing_required_input",
            Self::UnsupportedFormatVersion { .. } => "unsupported_format_version",
            Self::MalformedTagValue { .. } => "malformed_tag_value",
            Self::SnapshotNotFound { .. } => "snapshot_not_found",
            Self::MissingCapability { .. } => "missing_capability",
            Self::InvalidPhase { .. } => "invalid_phase",
            Self::Metadata(_) => "metadata",
        }
    }
}

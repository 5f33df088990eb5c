//! Errors raised by storage backends and metadata stores.
//!
//! Bootstrap failures live in `lakehold-catalog` as `BootstrapError`, which
//! wraps this type when a collaborator call fails.

use std::fmt;

/// Result alias over [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Storage and metadata-store failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An id did not parse.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Parse failure detail.
        message: String,
    },

    /// The backend could not complete a call.
    #[error("storage error: {message}")]
    Storage {
        /// What was attempted.
        message: String,
        /// Underlying I/O or client error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored object could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization {
        /// Codec detail.
        message: String,
    },

    /// A named metadata resource is missing.
    #[error("not found: {resource_type} with id {id}")]
    ResourceNotFound {
        /// Kind of resource, e.g. `"lake metadata"`.
        resource_type: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// A storage object is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A caller-supplied value was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A write was attempted through a read-only handle.
    #[error("read-only: {message}")]
    ReadOnly {
        /// The rejected write.
        message: String,
    },

    /// A conditional commit lost a race with another writer.
    #[error("precondition failed: {message}")]
    PreconditionFailed {
        /// Object and version detail.
        message: String,
    },

    /// A broken invariant, such as a poisoned lock.
    #[error("internal error: {message}")]
    Internal {
        /// Detail.
        message: String,
    },
}

impl Error {
    /// Storage error without a source.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Storage error caused by `source`.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Missing metadata resource.
    #[must_use]
    pub fn resource_not_found(resource_type: &'static str, id: impl fmt::Display) -> Self {
        Self::ResourceNotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Write through a read-only attachment.
    #[must_use]
    pub fn read_only(message: impl Into<String>) -> Self {
        Self::ReadOnly {
            message: message.into(),
        }
    }

    /// Returns true for both not-found variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ResourceNotFound { .. })
    }
}

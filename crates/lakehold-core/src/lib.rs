//! # lakehold-core
//!
//! Core abstractions for the Lakehold lakehouse bootstrap.
//!
//! This crate provides the foundational types shared by the catalog and the
//! command-line tool:
//!
//! - **Identifiers**: Strongly-typed schema, table and snapshot ids
//! - **Storage Locations**: Scheme detection, capabilities and separators for data roots
//! - **Storage Backends**: Conditional-write object storage for metadata objects
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and standard spans
//!
//! ## Example
//!
//! ```rust
//! use lakehold_core::prelude::*;
//!
//! let location = StorageLocation::parse("s3://bucket/lake");
//! assert_eq!(location.required_capability(), Some(StorageCapability::S3));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod location;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::{SchemaId, SnapshotId, TableId};
    pub use crate::location::{StorageCapability, StorageLocation};
    pub use crate::storage::{
        LocalFsBackend, MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition,
        WriteResult,
    };
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use id::{SchemaId, SnapshotId, TableId};
pub use location::{StorageCapability, StorageLocation};
pub use observability::{LogFormat, bootstrap_span, init_logging};
pub use storage::{
    LocalFsBackend, MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
};

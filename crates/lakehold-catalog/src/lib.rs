//! # lakehold-catalog
//!
//! Attach-or-create bootstrap for Lakehold lakes.
//!
//! Opening a lake attaches its metadata database, probes for existing lake
//! tables, and then either initializes a new lake or loads an existing one:
//!
//! - **Options**: Session configuration and the attach-time parameter mapping
//! - **Path Normalization**: Trailing separators and remote storage capabilities
//! - **Attach Statement**: Option clause rendering, quoting, existence probe
//! - **Bootstrap**: The create/load state machine and its transaction wrapper
//! - **Migrations**: Format version chain applied while loading
//! - **Reference Store**: JSON metadata objects on a storage backend
//!
//! ## Storage Layout
//!
//! ```text
//! {metadata_path}/
//! └── {schema}/
//!     ├── lakehold_metadata.json         # global tags (version, data_path, encrypted, ...)
//!     ├── lakehold_schema_settings.json  # per-schema tags
//!     ├── lakehold_table_settings.json   # per-table tags
//!     └── lakehold_snapshot.json         # committed snapshots
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lakehold_catalog::prelude::*;
//! use lakehold_core::MemoryBackend;
//!
//! let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
//! let mut txn = store.begin();
//! let lake = open_lake(LakeOptions::new("sales", "lakes/sales.lake"), &BootstrapEnv::new(), &mut txn).await?;
//! assert_eq!(lake.outcome, BootstrapOutcome::Created);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod backend_store;
pub mod bootstrap;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod migration;
pub mod options;
pub mod path;
pub mod sql;
pub mod state;
pub mod tag;

// Re-export main types at crate root
pub use backend_store::{BackendMetadataStore, BackendTransaction};
pub use bootstrap::{
    AttachedLake, BootstrapEnv, BootstrapOutcome, BootstrapPhase, Bootstrapper, attach_lake,
    open_lake,
};
pub use error::{BootstrapError, Result};
pub use metadata::{CatalogKind, LazySecrets, MetadataTransaction, SecretProvider};
pub use options::{AccessMode, LakeOptions, ParamValue, SnapshotSelector};
pub use path::{CapabilityRegistry, PathNormalizer, StaticCapabilities};
pub use state::{CatalogState, Encryption};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backend_store::BackendMetadataStore;
    pub use crate::bootstrap::{
        AttachedLake, BootstrapEnv, BootstrapOutcome, Bootstrapper, attach_lake, open_lake,
    };
    pub use crate::error::{BootstrapError, Result};
    pub use crate::metadata::{CatalogKind, MetadataTransaction};
    pub use crate::options::{AccessMode, LakeOptions, ParamValue, SnapshotSelector};
    pub use crate::state::{CatalogState, Encryption};
}

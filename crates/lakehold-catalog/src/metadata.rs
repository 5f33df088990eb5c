//! Contract between the bootstrap and the metadata store.
//!
//! The metadata store is an external collaborator: it owns the physical layout
//! of the lake's metadata, its transactions and its durability. The bootstrap
//! drives it through [`MetadataTransaction`], one transaction per attach.
//! Every call is a sequential round-trip; the bootstrap never issues two calls
//! concurrently and never retries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use lakehold_core::{Result, SnapshotId};

use crate::migration::MigrationStep;
use crate::options::SnapshotSelector;
use crate::sql::{AttachStatement, ExistenceProbe};
use crate::tag::LoadedMetadata;

/// Implementation family of the attached metadata catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// Native transactional catalog: supports inlined rows and can host a
    /// default data path next to its own file.
    Native,
    /// Catalog reached through a foreign engine (Postgres, SQLite, ...).
    External,
}

impl CatalogKind {
    /// Returns true for native catalogs.
    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(self, Self::Native)
    }
}

/// Facts about the attached metadata catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCatalog {
    /// Implementation family.
    pub kind: CatalogKind,
    /// Path of the catalog's backing file, if it has one.
    pub backing_path: Option<String>,
}

/// Database and schema the lake's internal tables live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataScope {
    /// Logical name of the attached metadata database.
    pub database: String,
    /// Schema inside the metadata database.
    pub schema: String,
}

/// Initial metadata written when a lake is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakeInit {
    /// Format version marker.
    pub format_version: String,
    /// Normalized data path.
    pub data_path: String,
    /// Whether the caller chose the metadata schema explicitly.
    pub has_explicit_schema: bool,
    /// Whether data files will be encrypted.
    pub encrypted: bool,
}

/// A committed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Snapshot id.
    pub id: SnapshotId,
    /// Commit time.
    pub committed_at: DateTime<Utc>,
}

/// One transaction against the metadata store.
#[async_trait]
pub trait MetadataTransaction: Send {
    /// Attaches the metadata database.
    async fn attach(&mut self, statement: &AttachStatement) -> Result<()>;

    /// Returns the default schema of the attached database.
    async fn default_schema_name(&mut self, database: &str) -> Result<String>;

    /// Describes the attached catalog.
    async fn metadata_catalog(&mut self, database: &str) -> Result<MetadataCatalog>;

    /// Counts internal lake tables matching the probe.
    async fn count_internal_tables(&mut self, probe: &ExistenceProbe) -> Result<u64>;

    /// Creates the internal tables and writes the initial metadata.
    async fn initialize_lake(&mut self, scope: &MetadataScope, init: &LakeInit) -> Result<()>;

    /// Reads the tags of an existing lake.
    async fn load_lake(&mut self, scope: &MetadataScope) -> Result<LoadedMetadata>;

    /// Applies one migration step in place.
    async fn migrate(&mut self, scope: &MetadataScope, step: &MigrationStep) -> Result<()>;

    /// Turns a stored data path into a usable one (relative paths are
    /// resolved against the metadata database's location).
    async fn load_path(&mut self, stored: &str) -> Result<String>;

    /// Looks up a snapshot; `None` if it does not exist.
    async fn resolve_snapshot(
        &mut self,
        scope: &MetadataScope,
        selector: &SnapshotSelector,
    ) -> Result<Option<SnapshotInfo>>;

    /// Publishes every write made in this transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Discards every write made in this transaction.
    async fn rollback(&mut self) -> Result<()>;
}

/// Materializes externally managed secrets (credentials for the metadata
/// store or object storage).
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Loads all secrets and returns how many are available.
    async fn load_secrets(&self) -> Result<usize>;
}

/// Loads secrets at most once, on first use.
///
/// An absent provider makes loading a no-op. Concurrent callers wait for the
/// same load; a failed load is retried by the next caller.
#[derive(Default)]
pub struct LazySecrets {
    provider: Option<Arc<dyn SecretProvider>>,
    loaded: OnceCell<usize>,
}

impl std::fmt::Debug for LazySecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySecrets")
            .field("has_provider", &self.provider.is_some())
            .field("loaded", &self.loaded.get())
            .finish()
    }
}

impl LazySecrets {
    /// No secret provider.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            provider: Some(provider),
            loaded: OnceCell::new(),
        }
    }

    /// Loads secrets if not done yet; returns the number of secrets.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if loading fails.
    pub async fn ensure_loaded(&self) -> Result<usize> {
        let Some(provider) = &self.provider else {
            return Ok(0);
        };
        self.loaded
            .get_or_try_init(|| provider.load_secrets())
            .await
            .copied()
    }

    /// Returns true once secrets have been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl SecretProvider for CountingProvider {
        async fn load_secrets(&self) -> Result<usize> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(lakehold_core::Error::storage("secret store unreachable"));
            }
            Ok(2)
        }
    }

    #[tokio::test]
    async fn test_absent_provider_is_noop() {
        let secrets = LazySecrets::none();
        assert_eq!(secrets.ensure_loaded().await.unwrap(), 0);
        assert!(!secrets.is_loaded());
    }

    #[tokio::test]
    async fn test_secrets_load_once() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail_first: false,
        });
        let secrets = LazySecrets::new(provider.clone());

        assert_eq!(secrets.ensure_loaded().await.unwrap(), 2);
        assert_eq!(secrets.ensure_loaded().await.unwrap(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(secrets.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail_first: true,
        });
        let secrets = LazySecrets::new(provider.clone());

        assert!(secrets.ensure_loaded().await.is_err());
        assert_eq!(secrets.ensure_loaded().await.unwrap(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}

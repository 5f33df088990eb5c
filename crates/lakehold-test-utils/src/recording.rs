//! Metadata transaction wrapper that records every call.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lakehold_catalog::metadata::{
    LakeInit, MetadataCatalog, MetadataScope, MetadataTransaction, SnapshotInfo,
};
use lakehold_catalog::migration::MigrationStep;
use lakehold_catalog::options::SnapshotSelector;
use lakehold_catalog::sql::{AttachStatement, ExistenceProbe};
use lakehold_catalog::tag::LoadedMetadata;
use lakehold_core::{Error, Result};

/// Record of a metadata-store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOp {
    /// Attach with the rendered statement.
    Attach {
        /// Rendered `ATTACH` statement.
        sql: String,
    },
    /// Default schema lookup.
    DefaultSchemaName,
    /// Catalog description lookup.
    MetadataCatalog,
    /// Existence probe.
    CountInternalTables {
        /// Probed schema.
        schema: String,
    },
    /// Lake creation.
    InitializeLake {
        /// Persisted data path.
        data_path: String,
        /// Persisted encryption flag.
        encrypted: bool,
    },
    /// Tag load.
    LoadLake,
    /// Migration step.
    Migrate {
        /// Source version.
        from: &'static str,
        /// Target version.
        to: &'static str,
    },
    /// Stored path resolution.
    LoadPath {
        /// Stored value.
        stored: String,
    },
    /// Snapshot resolution.
    ResolveSnapshot,
    /// Commit.
    Commit,
    /// Rollback.
    Rollback,
}

impl MetadataOp {
    /// Short operation name, as accepted by [`RecordingTransaction::fail_on`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Attach { .. } => "attach",
            Self::DefaultSchemaName => "default_schema_name",
            Self::MetadataCatalog => "metadata_catalog",
            Self::CountInternalTables { .. } => "count_internal_tables",
            Self::InitializeLake { .. } => "initialize_lake",
            Self::LoadLake => "load_lake",
            Self::Migrate { .. } => "migrate",
            Self::LoadPath { .. } => "load_path",
            Self::ResolveSnapshot => "resolve_snapshot",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

/// Shared log of recorded calls.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<MetadataOp>>>);

impl OpLog {
    /// Returns all recorded calls.
    #[must_use]
    pub fn operations(&self) -> Vec<MetadataOp> {
        self.0.lock().expect("lock").clone()
    }

    /// Returns the recorded migration steps.
    #[must_use]
    pub fn migrations(&self) -> Vec<(&'static str, &'static str)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MetadataOp::Migrate { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Returns how many calls with this name were recorded.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| op.name() == name)
            .count()
    }

    fn push(&self, op: MetadataOp) {
        self.0.lock().expect("lock").push(op);
    }
}

/// Wraps a [`MetadataTransaction`], recording each call and optionally
/// failing one of them.
#[derive(Debug)]
pub struct RecordingTransaction<T> {
    inner: T,
    log: OpLog,
    fail_on: Option<&'static str>,
}

impl<T: MetadataTransaction> RecordingTransaction<T> {
    /// Wraps `inner` with a fresh log.
    pub fn new(inner: T) -> Self {
        Self::with_log(inner, OpLog::default())
    }

    /// Wraps `inner`, appending to an existing log.
    pub fn with_log(inner: T, log: OpLog) -> Self {
        Self {
            inner,
            log,
            fail_on: None,
        }
    }

    /// Makes the named call fail with a storage error instead of reaching
    /// the inner transaction.
    #[must_use]
    pub fn fail_on(mut self, name: &'static str) -> Self {
        self.fail_on = Some(name);
        self
    }

    /// Returns the shared log.
    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    /// Returns the wrapped transaction.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn record(&self, op: MetadataOp) -> Result<()> {
        let name = op.name();
        self.log.push(op);
        if self.fail_on == Some(name) {
            return Err(Error::storage(format!("injected failure in {name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: MetadataTransaction> MetadataTransaction for RecordingTransaction<T> {
    async fn attach(&mut self, statement: &AttachStatement) -> Result<()> {
        self.record(MetadataOp::Attach {
            sql: statement.to_sql(),
        })?;
        self.inner.attach(statement).await
    }

    async fn default_schema_name(&mut self, database: &str) -> Result<String> {
        self.record(MetadataOp::DefaultSchemaName)?;
        self.inner.default_schema_name(database).await
    }

    async fn metadata_catalog(&mut self, database: &str) -> Result<MetadataCatalog> {
        self.record(MetadataOp::MetadataCatalog)?;
        self.inner.metadata_catalog(database).await
    }

    async fn count_internal_tables(&mut self, probe: &ExistenceProbe) -> Result<u64> {
        self.record(MetadataOp::CountInternalTables {
            schema: probe.schema.clone(),
        })?;
        self.inner.count_internal_tables(probe).await
    }

    async fn initialize_lake(&mut self, scope: &MetadataScope, init: &LakeInit) -> Result<()> {
        self.record(MetadataOp::InitializeLake {
            data_path: init.data_path.clone(),
            encrypted: init.encrypted,
        })?;
        self.inner.initialize_lake(scope, init).await
    }

    async fn load_lake(&mut self, scope: &MetadataScope) -> Result<LoadedMetadata> {
        self.record(MetadataOp::LoadLake)?;
        self.inner.load_lake(scope).await
    }

    async fn migrate(&mut self, scope: &MetadataScope, step: &MigrationStep) -> Result<()> {
        self.record(MetadataOp::Migrate {
            from: step.from,
            to: step.to,
        })?;
        self.inner.migrate(scope, step).await
    }

    async fn load_path(&mut self, stored: &str) -> Result<String> {
        self.record(MetadataOp::LoadPath {
            stored: stored.to_string(),
        })?;
        self.inner.load_path(stored).await
    }

    async fn resolve_snapshot(
        &mut self,
        scope: &MetadataScope,
        selector: &SnapshotSelector,
    ) -> Result<Option<SnapshotInfo>> {
        self.record(MetadataOp::ResolveSnapshot)?;
        self.inner.resolve_snapshot(scope, selector).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(MetadataOp::Commit)?;
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(MetadataOp::Rollback)?;
        self.inner.rollback().await
    }
}

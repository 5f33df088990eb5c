//! Pre-built lakes for common test scenarios.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use lakehold_catalog::backend_store::{
    BackendMetadataStore, BackendTransaction, DEFAULT_SCHEMA, METADATA_OBJECT,
    SCHEMA_SETTINGS_OBJECT, TABLE_SETTINGS_OBJECT, object_key,
};
use lakehold_catalog::bootstrap::{AttachedLake, BootstrapEnv, open_lake};
use lakehold_catalog::error::Result;
use lakehold_catalog::metadata::CatalogKind;
use lakehold_catalog::options::LakeOptions;
use lakehold_catalog::tag::{SchemaSetting, TableSetting, Tag};
use lakehold_core::{SchemaId, StorageBackend, TableId, WritePrecondition};

use crate::recording::{OpLog, RecordingTransaction};
use crate::storage::TracingMemoryBackend;

/// Lake name used by fixtures.
pub const LAKE_NAME: &str = "sales";
/// Metadata path used by fixtures.
pub const METADATA_PATH: &str = "lakes/sales.lake";

/// A metadata store over traced in-memory storage, plus a shared call log.
#[derive(Debug, Clone)]
pub struct LakeFixture {
    /// Traced storage under the store.
    pub storage: Arc<TracingMemoryBackend>,
    /// The metadata store.
    pub store: BackendMetadataStore,
    /// Log shared by every transaction begun through [`LakeFixture::begin`].
    pub log: OpLog,
}

impl LakeFixture {
    /// Creates an empty fixture backed by a native catalog.
    #[must_use]
    pub fn native() -> Self {
        Self::with_kind(CatalogKind::Native)
    }

    /// Creates an empty fixture backed by an external catalog.
    #[must_use]
    pub fn external() -> Self {
        Self::with_kind(CatalogKind::External)
    }

    /// Creates an empty fixture of the given kind.
    #[must_use]
    pub fn with_kind(kind: CatalogKind) -> Self {
        let storage = Arc::new(TracingMemoryBackend::new());
        let store = BackendMetadataStore::new(storage.clone(), kind);
        Self {
            storage,
            store,
            log: OpLog::default(),
        }
    }

    /// Default options for the fixture lake.
    #[must_use]
    pub fn options(&self) -> LakeOptions {
        LakeOptions::new(LAKE_NAME, METADATA_PATH)
    }

    /// Begins a recorded transaction.
    #[must_use]
    pub fn begin(&self) -> RecordingTransaction<BackendTransaction> {
        RecordingTransaction::with_log(self.store.begin(), self.log.clone())
    }

    /// Opens the lake with `options` in a fresh transaction.
    ///
    /// # Errors
    ///
    /// Returns the bootstrap error.
    pub async fn open(&self, options: LakeOptions) -> Result<AttachedLake> {
        let mut txn = self.begin();
        open_lake(options, &BootstrapEnv::default(), &mut txn).await
    }

    /// Writes global tags for the default schema directly to storage.
    pub async fn seed_tags(&self, tags: &[Tag]) {
        self.seed(METADATA_OBJECT, tags).await;
    }

    /// Writes a format 0.1 lake: version, data path and no schema settings.
    pub async fn seed_legacy_lake(&self, data_path: &str) {
        self.seed_tags(&[
            Tag::new("version", "0.1"),
            Tag::new("data_path", data_path),
        ])
        .await;
    }

    /// Writes per-schema tags directly to storage.
    pub async fn seed_schema_settings(&self, settings: &[(u64, &str, &str)]) {
        let settings: Vec<SchemaSetting> = settings
            .iter()
            .map(|(id, key, value)| SchemaSetting {
                schema_id: SchemaId::new(*id),
                tag: Tag::new(*key, *value),
            })
            .collect();
        self.seed(SCHEMA_SETTINGS_OBJECT, &settings).await;
    }

    /// Writes per-table tags directly to storage.
    pub async fn seed_table_settings(&self, settings: &[(u64, &str, &str)]) {
        let settings: Vec<TableSetting> = settings
            .iter()
            .map(|(id, key, value)| TableSetting {
                table_id: TableId::new(*id),
                tag: Tag::new(*key, *value),
            })
            .collect();
        self.seed(TABLE_SETTINGS_OBJECT, &settings).await;
    }

    /// Reads back the persisted global tags of the default schema.
    pub async fn stored_tags(&self) -> Option<Vec<Tag>> {
        self.storage
            .object(&object_key(METADATA_PATH, DEFAULT_SCHEMA, METADATA_OBJECT))
            .await
            .map(|data| serde_json::from_slice(&data).expect("valid tags"))
    }

    async fn seed<T: Serialize + ?Sized>(&self, object: &str, value: &T) {
        let data = serde_json::to_vec(value).expect("serializable");
        self.storage
            .put(
                &object_key(METADATA_PATH, DEFAULT_SCHEMA, object),
                Bytes::from(data),
                WritePrecondition::None,
            )
            .await
            .expect("seed");
        self.storage.clear_operations();
    }
}

impl Default for LakeFixture {
    fn default() -> Self {
        Self::native()
    }
}

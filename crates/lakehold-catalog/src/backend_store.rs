//! Reference metadata store on top of a [`StorageBackend`].
//!
//! A lake's metadata lives as JSON objects under
//! `<metadata path>/<schema>/`:
//!
//! | object | contents |
//! |---|---|
//! | `lakehold_metadata.json` | global tags |
//! | `lakehold_schema_settings.json` | per-schema tags (format 0.2+) |
//! | `lakehold_table_settings.json` | per-table tags |
//! | `lakehold_schema.json` | the metadata schema record |
//! | `lakehold_snapshot.json` | committed snapshots |
//!
//! Writes are buffered in the transaction and published on commit with
//! conditional puts: objects the transaction read are written back only if
//! their version is unchanged, new objects only if they still do not exist.
//! Two concurrent creators of the same lake therefore cannot both commit.
//!
//! `lakehold_metadata.json` is published last and is the existence marker.
//! Objects left behind by a commit that failed before it are ignored by the
//! existence check and overwritten by the next create.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::Instrument as _;

use lakehold_core::location::{StorageLocation, is_absolute, join, parent_dir};
use lakehold_core::observability::metadata_span;
use lakehold_core::{
    Error, Result, SchemaId, SnapshotId, StorageBackend, WritePrecondition, WriteResult,
};

use crate::metadata::{
    CatalogKind, LakeInit, MetadataCatalog, MetadataScope, MetadataTransaction, SnapshotInfo,
};
use crate::migration::MigrationStep;
use crate::options::{AccessMode, SnapshotSelector};
use crate::sql::{AttachStatement, ExistenceProbe};
use crate::tag::{
    LoadedMetadata, SchemaSetting, TAG_DATA_PATH, TAG_ENCRYPTED, TAG_VERSION, TableSetting, Tag,
};

/// Global tags object.
pub const METADATA_OBJECT: &str = "lakehold_metadata.json";
/// Per-schema tags object.
pub const SCHEMA_SETTINGS_OBJECT: &str = "lakehold_schema_settings.json";
/// Per-table tags object.
pub const TABLE_SETTINGS_OBJECT: &str = "lakehold_table_settings.json";
/// Metadata schema record object.
pub const SCHEMA_OBJECT: &str = "lakehold_schema.json";
/// Snapshot list object.
pub const SNAPSHOT_OBJECT: &str = "lakehold_snapshot.json";
/// Schema used when the caller does not choose one.
pub const DEFAULT_SCHEMA: &str = "main";

/// Returns the storage key of `object` for a lake at `metadata_path`/`schema`.
#[must_use]
pub fn object_key(metadata_path: &str, schema: &str, object: &str) -> String {
    format!(
        "{}/{schema}/{object}",
        metadata_path.trim_end_matches(['/', '\\'])
    )
}

/// A committed snapshot as persisted in [`SNAPSHOT_OBJECT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Snapshot id.
    pub snapshot_id: SnapshotId,
    /// Commit time.
    pub committed_at: DateTime<Utc>,
}

impl From<SnapshotRecord> for SnapshotInfo {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            id: record.snapshot_id,
            committed_at: record.committed_at,
        }
    }
}

/// The metadata schema as persisted in [`SCHEMA_OBJECT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// Schema id.
    pub schema_id: SchemaId,
    /// Schema name.
    pub name: String,
    /// Whether the caller named the schema rather than taking the default.
    pub explicit: bool,
}

/// Metadata store that keeps lakes as JSON objects in a storage backend.
#[derive(Clone)]
pub struct BackendMetadataStore {
    backend: Arc<dyn StorageBackend>,
    kind: CatalogKind,
}

impl std::fmt::Debug for BackendMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendMetadataStore")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl BackendMetadataStore {
    /// Creates a store over `backend` that reports itself as `kind`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, kind: CatalogKind) -> Self {
        Self { backend, kind }
    }

    /// Returns the catalog kind this store reports.
    #[must_use]
    pub const fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Starts a transaction.
    #[must_use]
    pub fn begin(&self) -> BackendTransaction {
        BackendTransaction {
            backend: Arc::clone(&self.backend),
            kind: self.kind,
            attachment: None,
            observed: HashMap::new(),
            pending: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Attachment {
    database: String,
    path: String,
    read_only: bool,
}

/// One transaction of a [`BackendMetadataStore`].
pub struct BackendTransaction {
    backend: Arc<dyn StorageBackend>,
    kind: CatalogKind,
    attachment: Option<Attachment>,
    /// Version tokens of objects read in this transaction (`None` = absent).
    observed: HashMap<String, Option<String>>,
    pending: BTreeMap<String, Bytes>,
}

impl std::fmt::Debug for BackendTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendTransaction")
            .field("attachment", &self.attachment)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl BackendTransaction {
    /// Returns the number of buffered, unpublished writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn attachment(&self, database: &str) -> Result<&Attachment> {
        self.attachment
            .as_ref()
            .filter(|attachment| attachment.database == database)
            .ok_or_else(|| Error::NotFound(format!("database \"{database}\" is not attached")))
    }

    fn writable(&self, database: &str) -> Result<&Attachment> {
        let attachment = self.attachment(database)?;
        if attachment.read_only {
            return Err(Error::read_only(format!(
                "metadata database \"{database}\" is attached read-only"
            )));
        }
        Ok(attachment)
    }

    fn key(&self, scope: &MetadataScope, object: &str) -> Result<String> {
        let attachment = self.attachment(&scope.database)?;
        Ok(object_key(&attachment.path, &scope.schema, object))
    }

    async fn read_json<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        if let Some(data) = self.pending.get(key) {
            return decode(key, data).map(Some);
        }
        let Some(meta) = self.backend.head(key).await? else {
            self.observed.entry(key.to_string()).or_insert(None);
            return Ok(None);
        };
        let data = self.backend.get(key).await?;
        self.observed
            .entry(key.to_string())
            .or_insert(Some(meta.version));
        decode(key, &data).map(Some)
    }

    /// Records the current version of a leftover object so the next commit
    /// may overwrite it.
    async fn adopt(&mut self, key: &str) -> Result<()> {
        if self.observed.contains_key(key) || self.pending.contains_key(key) {
            return Ok(());
        }
        let version = self.backend.head(key).await?.map(|meta| meta.version);
        if let Some(version) = &version {
            tracing::debug!(key, version = %version, "overwriting leftover object");
        }
        self.observed.insert(key.to_string(), version);
        Ok(())
    }

    fn stage_json<T: Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| Error::serialization(format!("failed to encode {key}: {e}")))?;
        self.pending.insert(key, Bytes::from(data));
        Ok(())
    }

    fn precondition(&self, key: &str) -> WritePrecondition {
        match self.observed.get(key) {
            Some(Some(version)) => WritePrecondition::MatchesVersion(version.clone()),
            _ => WritePrecondition::DoesNotExist,
        }
    }

    /// Stores `data_path` relative to the metadata path's directory when it
    /// lies beneath it.
    fn store_path(attachment: &Attachment, data_path: &str) -> String {
        let base = parent_dir(&attachment.path);
        match data_path.strip_prefix(base) {
            Some(relative) if !base.is_empty() && !relative.is_empty() => relative.to_string(),
            _ => data_path.to_string(),
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: &[u8]) -> Result<T> {
    serde_json::from_slice(data)
        .map_err(|e| Error::serialization(format!("failed to decode {key}: {e}")))
}

#[async_trait]
impl MetadataTransaction for BackendTransaction {
    async fn attach(&mut self, statement: &AttachStatement) -> Result<()> {
        if statement.path.is_empty() {
            return Err(Error::InvalidInput(
                "metadata path must not be empty".to_string(),
            ));
        }
        if let Some(existing) = &self.attachment {
            if existing.database != statement.alias {
                return Err(Error::InvalidInput(format!(
                    "transaction is already attached to \"{}\"",
                    existing.database
                )));
            }
        }
        tracing::debug!(sql = %statement.to_sql(), "attach");
        self.attachment = Some(Attachment {
            database: statement.alias.clone(),
            path: statement.path.clone(),
            read_only: statement.options.access_mode == AccessMode::ReadOnly,
        });
        Ok(())
    }

    async fn default_schema_name(&mut self, database: &str) -> Result<String> {
        self.attachment(database)?;
        Ok(DEFAULT_SCHEMA.to_string())
    }

    async fn metadata_catalog(&mut self, database: &str) -> Result<MetadataCatalog> {
        let attachment = self.attachment(database)?;
        Ok(MetadataCatalog {
            kind: self.kind,
            backing_path: self
                .kind
                .is_native()
                .then(|| attachment.path.clone()),
        })
    }

    async fn count_internal_tables(&mut self, probe: &ExistenceProbe) -> Result<u64> {
        let attachment = self.attachment(&probe.database)?;
        let prefix = object_key(&attachment.path, &probe.schema, "");
        let span = metadata_span("count_internal_tables", &probe.database);
        let listed = self.backend.list(&prefix).instrument(span).await?;

        let names: BTreeSet<&str> = listed
            .iter()
            .map(|meta| meta.path.as_str())
            .chain(self.pending.keys().map(String::as_str))
            .filter_map(|path| path.strip_prefix(prefix.as_str()))
            .filter(|name| probe.matches(name))
            .collect();
        if !names.contains(METADATA_OBJECT) {
            if !names.is_empty() {
                tracing::debug!(
                    leftovers = names.len(),
                    "ignoring lake objects without a metadata object"
                );
            }
            return Ok(0);
        }
        Ok(names.len() as u64)
    }

    async fn initialize_lake(&mut self, scope: &MetadataScope, init: &LakeInit) -> Result<()> {
        let attachment = self.writable(&scope.database)?.clone();
        let tags = vec![
            Tag::new(TAG_VERSION, &init.format_version),
            Tag::new(TAG_DATA_PATH, Self::store_path(&attachment, &init.data_path)),
            Tag::new(TAG_ENCRYPTED, init.encrypted.to_string()),
        ];
        let schema = SchemaRecord {
            schema_id: SchemaId::new(0),
            name: scope.schema.clone(),
            explicit: init.has_explicit_schema,
        };
        let snapshots = vec![SnapshotRecord {
            snapshot_id: SnapshotId::new(0),
            committed_at: Utc::now(),
        }];

        // The metadata object keeps its DoesNotExist precondition.
        let schema_key = self.key(scope, SCHEMA_OBJECT)?;
        let schema_settings_key = self.key(scope, SCHEMA_SETTINGS_OBJECT)?;
        let table_settings_key = self.key(scope, TABLE_SETTINGS_OBJECT)?;
        let snapshot_key = self.key(scope, SNAPSHOT_OBJECT)?;
        for key in [
            &schema_key,
            &schema_settings_key,
            &table_settings_key,
            &snapshot_key,
        ] {
            self.adopt(key).await?;
        }

        self.stage_json(self.key(scope, METADATA_OBJECT)?, &tags)?;
        self.stage_json(schema_key, &schema)?;
        self.stage_json(schema_settings_key, &Vec::<SchemaSetting>::new())?;
        self.stage_json(table_settings_key, &Vec::<TableSetting>::new())?;
        self.stage_json(snapshot_key, &snapshots)?;

        tracing::debug!(
            schema = %scope.schema,
            explicit_schema = init.has_explicit_schema,
            "staged new lake metadata"
        );
        Ok(())
    }

    async fn load_lake(&mut self, scope: &MetadataScope) -> Result<LoadedMetadata> {
        let metadata_key = self.key(scope, METADATA_OBJECT)?;
        let tags: Vec<Tag> = self
            .read_json(&metadata_key)
            .await?
            .ok_or_else(|| Error::resource_not_found("lake metadata", &metadata_key))?;
        let schema_settings = self
            .read_json(&self.key(scope, SCHEMA_SETTINGS_OBJECT)?)
            .await?
            .unwrap_or_default();
        let table_settings = self
            .read_json(&self.key(scope, TABLE_SETTINGS_OBJECT)?)
            .await?
            .unwrap_or_default();

        Ok(LoadedMetadata {
            tags,
            schema_settings,
            table_settings,
        })
    }

    async fn migrate(&mut self, scope: &MetadataScope, step: &MigrationStep) -> Result<()> {
        self.writable(&scope.database)?;
        match (step.from, step.to) {
            ("0.1", "0.2") => {
                let settings_key = self.key(scope, SCHEMA_SETTINGS_OBJECT)?;
                if self
                    .read_json::<Vec<SchemaSetting>>(&settings_key)
                    .await?
                    .is_none()
                {
                    self.stage_json(settings_key, &Vec::<SchemaSetting>::new())?;
                }
            }
            _ => {
                return Err(Error::Internal {
                    message: format!("no migration registered for {step}"),
                });
            }
        }

        let metadata_key = self.key(scope, METADATA_OBJECT)?;
        let mut tags: Vec<Tag> = self
            .read_json(&metadata_key)
            .await?
            .ok_or_else(|| Error::resource_not_found("lake metadata", &metadata_key))?;
        for tag in tags.iter_mut().filter(|tag| tag.key == TAG_VERSION) {
            tag.value = step.to.to_string();
        }
        self.stage_json(metadata_key, &tags)
    }

    async fn load_path(&mut self, stored: &str) -> Result<String> {
        let attachment = self
            .attachment
            .as_ref()
            .ok_or_else(|| Error::NotFound("no metadata database is attached".to_string()))?;
        if stored.is_empty() || is_absolute(stored) {
            return Ok(stored.to_string());
        }
        let separator = StorageLocation::parse(&attachment.path).separator();
        Ok(join(parent_dir(&attachment.path), stored, separator))
    }

    async fn resolve_snapshot(
        &mut self,
        scope: &MetadataScope,
        selector: &SnapshotSelector,
    ) -> Result<Option<SnapshotInfo>> {
        let snapshots: Vec<SnapshotRecord> = self
            .read_json(&self.key(scope, SNAPSHOT_OBJECT)?)
            .await?
            .unwrap_or_default();

        let found = match selector {
            SnapshotSelector::Version(id) => snapshots.into_iter().find(|s| s.snapshot_id == *id),
            SnapshotSelector::Timestamp(at) => snapshots
                .into_iter()
                .filter(|s| s.committed_at <= *at)
                .max_by_key(|s| (s.committed_at, s.snapshot_id)),
        };
        Ok(found.map(SnapshotInfo::from))
    }

    async fn commit(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(());
        }
        let database = self
            .attachment
            .as_ref()
            .map_or_else(String::new, |attachment| attachment.database.clone());
        let span = metadata_span("commit", &database);

        async {
            // The metadata object goes last; it marks the lake as existing.
            let (last, rest): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|(key, _)| key.ends_with(METADATA_OBJECT));
            for (key, data) in rest.into_iter().chain(last) {
                let precondition = self.precondition(&key);
                match self.backend.put(&key, data, precondition).await? {
                    WriteResult::Success { version } => {
                        tracing::debug!(key = %key, version = %version, "published");
                    }
                    WriteResult::PreconditionFailed { current_version } => {
                        return Err(Error::PreconditionFailed {
                            message: format!(
                                "{key} was modified concurrently (current version {current_version})"
                            ),
                        });
                    }
                }
            }
            self.observed.clear();
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn rollback(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            tracing::debug!(discarded = self.pending.len(), "rolled back metadata writes");
        }
        self.pending.clear();
        self.observed.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::AttachOptions;
    use lakehold_core::MemoryBackend;

    const PATH: &str = "lakes/sales.lake";

    fn statement(mode: AccessMode) -> AttachStatement {
        AttachStatement {
            path: PATH.to_string(),
            alias: "meta".to_string(),
            options: AttachOptions {
                access_mode: mode,
                ..AttachOptions::default()
            },
        }
    }

    fn scope() -> MetadataScope {
        MetadataScope {
            database: "meta".to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }

    fn init(data_path: &str) -> LakeInit {
        LakeInit {
            format_version: "0.2".to_string(),
            data_path: data_path.to_string(),
            has_explicit_schema: false,
            encrypted: false,
        }
    }

    async fn created_store() -> BackendMetadataStore {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        txn.initialize_lake(&scope(), &init("lakes/sales.lake.files/"))
            .await
            .unwrap();
        txn.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_initialize_is_invisible_until_commit() {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
        let probe = ExistenceProbe::new("meta", DEFAULT_SCHEMA);

        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        txn.initialize_lake(&scope(), &init("s3://bucket/lake/"))
            .await
            .unwrap();
        assert_eq!(txn.count_internal_tables(&probe).await.unwrap(), 5);
        assert_eq!(txn.pending_writes(), 5);
        txn.rollback().await.unwrap();
        assert_eq!(txn.pending_writes(), 0);

        let mut other = store.begin();
        other.attach(&statement(AccessMode::Automatic)).await.unwrap();
        assert_eq!(other.count_internal_tables(&probe).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_explicit_schema_flag_is_persisted() {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        let init = LakeInit {
            has_explicit_schema: true,
            ..init("s3://bucket/lake/")
        };
        txn.initialize_lake(&scope(), &init).await.unwrap();
        txn.commit().await.unwrap();

        let raw = store
            .backend()
            .get(&object_key(PATH, DEFAULT_SCHEMA, SCHEMA_OBJECT))
            .await
            .unwrap();
        let record: SchemaRecord = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            record,
            SchemaRecord {
                schema_id: SchemaId::new(0),
                name: DEFAULT_SCHEMA.to_string(),
                explicit: true,
            }
        );
    }

    #[tokio::test]
    async fn test_leftovers_without_metadata_do_not_count() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .put(
                &object_key(PATH, DEFAULT_SCHEMA, SNAPSHOT_OBJECT),
                Bytes::from("[]"),
                WritePrecondition::None,
            )
            .await
            .unwrap();
        let store = BackendMetadataStore::new(backend, CatalogKind::Native);
        let probe = ExistenceProbe::new("meta", DEFAULT_SCHEMA);

        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        assert_eq!(txn.count_internal_tables(&probe).await.unwrap(), 0);
        txn.initialize_lake(&scope(), &init("s3://bucket/lake/"))
            .await
            .unwrap();
        txn.commit().await.unwrap();

        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        assert_eq!(txn.count_internal_tables(&probe).await.unwrap(), 5);
        let found = txn
            .resolve_snapshot(&scope(), &SnapshotSelector::Version(SnapshotId::new(0)))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_data_path_is_stored_relative() {
        let store = created_store().await;
        let raw = store
            .backend()
            .get(&object_key(PATH, DEFAULT_SCHEMA, METADATA_OBJECT))
            .await
            .unwrap();
        let tags: Vec<Tag> = serde_json::from_slice(&raw).unwrap();
        assert!(tags.contains(&Tag::new(TAG_DATA_PATH, "sales.lake.files/")));

        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        assert_eq!(
            txn.load_path("sales.lake.files/").await.unwrap(),
            "lakes/sales.lake.files/"
        );
        assert_eq!(
            txn.load_path("s3://bucket/lake/").await.unwrap(),
            "s3://bucket/lake/"
        );
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::ReadOnly)).await.unwrap();
        let err = txn
            .initialize_lake(&scope(), &init("s3://bucket/lake/"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadOnly { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_create_conflicts() {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::Native);
        let mut first = store.begin();
        let mut second = store.begin();
        for txn in [&mut first, &mut second] {
            txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
            txn.initialize_lake(&scope(), &init("s3://bucket/lake/"))
                .await
                .unwrap();
        }

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_migration_rewrites_version_tag() {
        let backend = Arc::new(MemoryBackend::new());
        let legacy = vec![
            Tag::new(TAG_VERSION, "0.1"),
            Tag::new(TAG_DATA_PATH, "s3://bucket/lake/"),
        ];
        backend
            .put(
                &object_key(PATH, DEFAULT_SCHEMA, METADATA_OBJECT),
                Bytes::from(serde_json::to_vec(&legacy).unwrap()),
                WritePrecondition::None,
            )
            .await
            .unwrap();

        let store = BackendMetadataStore::new(backend, CatalogKind::Native);
        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        let step = MigrationStep { from: "0.1", to: "0.2" };
        txn.migrate(&scope(), &step).await.unwrap();
        txn.commit().await.unwrap();

        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        let loaded = txn.load_lake(&scope()).await.unwrap();
        assert_eq!(loaded.tags[0], Tag::new(TAG_VERSION, "0.2"));
        assert!(loaded.schema_settings.is_empty());
        let probe = ExistenceProbe::new("meta", DEFAULT_SCHEMA);
        assert_eq!(txn.count_internal_tables(&probe).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resolve_snapshot() {
        let store = created_store().await;
        let mut txn = store.begin();
        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();

        let found = txn
            .resolve_snapshot(&scope(), &SnapshotSelector::Version(SnapshotId::new(0)))
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some(SnapshotId::new(0)));

        let missing = txn
            .resolve_snapshot(&scope(), &SnapshotSelector::Version(SnapshotId::new(42)))
            .await
            .unwrap();
        assert!(missing.is_none());

        let before_creation = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let missing = txn
            .resolve_snapshot(&scope(), &SnapshotSelector::Timestamp(before_creation))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_unattached_database_is_rejected() {
        let store = BackendMetadataStore::new(Arc::new(MemoryBackend::new()), CatalogKind::External);
        let mut txn = store.begin();
        assert!(txn.default_schema_name("meta").await.unwrap_err().is_not_found());

        txn.attach(&statement(AccessMode::Automatic)).await.unwrap();
        let catalog = txn.metadata_catalog("meta").await.unwrap();
        assert_eq!(catalog.kind, CatalogKind::External);
        assert_eq!(catalog.backing_path, None);
    }
}

//! Attach-or-create bootstrap of a lake.
//!
//! Opening a lake attaches its metadata database and decides whether the lake
//! already exists there:
//!
//! ```text
//! PreAttach ──► Attached ──► Creating ──┐
//!                   │                   ├──► Ready
//!                   └──────► Loading ───┘
//!
//! (any phase) ──► Failed
//! ```
//!
//! The decision is made by counting internal lake tables in the resolved
//! metadata schema. An empty schema gets a fresh lake; otherwise the lake's
//! tags are loaded, its format is migrated if needed, and its configuration is
//! merged into the session's [`LakeOptions`].
//!
//! [`attach_lake`] runs the whole bootstrap inside one metadata transaction and
//! only publishes options and state to the caller once it has committed.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument as _;

use lakehold_core::observability::bootstrap_span;

use crate::error::{BootstrapError, Result};
use crate::metadata::{LakeInit, LazySecrets, MetadataScope, MetadataTransaction};
use crate::migration::{LATEST_FORMAT_VERSION, MigrationStep, plan_migrations};
use crate::metrics;
use crate::options::{LakeOptions, default_metadata_database};
use crate::path::{CapabilityRegistry, PathNormalizer, StaticCapabilities};
use crate::sql::{AttachOptions, AttachStatement, ExistenceProbe};
use crate::state::{CatalogState, Encryption};
use crate::tag::{KnownTag, Tag};

/// Suffix appended to the metadata database path to derive a default data path.
pub const DEFAULT_DATA_PATH_SUFFIX: &str = ".files";

/// Phase of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapPhase {
    /// Nothing has touched the metadata store yet.
    PreAttach,
    /// The metadata database is attached.
    Attached,
    /// Writing a new lake.
    Creating,
    /// Reading an existing lake.
    Loading,
    /// Bootstrap completed.
    Ready,
    /// Bootstrap aborted.
    Failed,
}

/// Which path a successful bootstrap took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapOutcome {
    /// A new lake was initialized.
    Created,
    /// An existing lake was loaded.
    Loaded,
}

impl BootstrapOutcome {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Loaded => "loaded",
        }
    }
}

impl std::fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-level collaborators the bootstrap needs besides the metadata store.
pub struct BootstrapEnv {
    capabilities: Arc<dyn CapabilityRegistry>,
    secrets: LazySecrets,
}

impl std::fmt::Debug for BootstrapEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapEnv")
            .field("secrets", &self.secrets)
            .finish_non_exhaustive()
    }
}

impl Default for BootstrapEnv {
    fn default() -> Self {
        Self {
            capabilities: Arc::new(StaticCapabilities::all()),
            secrets: LazySecrets::none(),
        }
    }
}

impl BootstrapEnv {
    /// Creates an environment with every storage capability and no secrets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capability registry.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Arc<dyn CapabilityRegistry>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the secret loader.
    #[must_use]
    pub fn with_secrets(mut self, secrets: LazySecrets) -> Self {
        self.secrets = secrets;
        self
    }

    /// Returns the secret loader.
    #[must_use]
    pub fn secrets(&self) -> &LazySecrets {
        &self.secrets
    }

    fn normalizer(&self) -> PathNormalizer<'_> {
        PathNormalizer::new(self.capabilities.as_ref())
    }
}

/// Drives one bootstrap over borrowed session configuration.
///
/// Mutations land directly in the borrowed options and state; use
/// [`attach_lake`] for all-or-nothing semantics.
pub struct Bootstrapper<'a> {
    options: &'a mut LakeOptions,
    state: &'a mut CatalogState,
    env: &'a BootstrapEnv,
    phase: BootstrapPhase,
}

impl std::fmt::Debug for Bootstrapper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper")
            .field("lake", &self.options.lake_name)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<'a> Bootstrapper<'a> {
    /// Creates a bootstrapper in [`BootstrapPhase::PreAttach`].
    #[must_use]
    pub fn new(
        options: &'a mut LakeOptions,
        state: &'a mut CatalogState,
        env: &'a BootstrapEnv,
    ) -> Self {
        Self {
            options,
            state,
            env,
            phase: BootstrapPhase::PreAttach,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Runs the bootstrap against `txn`.
    ///
    /// Does not commit or roll back `txn`.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; the bootstrapper is then in
    /// [`BootstrapPhase::Failed`]. Calling this a second time returns
    /// [`BootstrapError::InvalidPhase`].
    pub async fn initialize<T>(&mut self, txn: &mut T) -> Result<BootstrapOutcome>
    where
        T: MetadataTransaction + ?Sized,
    {
        if self.phase != BootstrapPhase::PreAttach {
            return Err(BootstrapError::InvalidPhase { phase: self.phase });
        }
        let result = self.run(txn).await;
        self.phase = if result.is_ok() {
            BootstrapPhase::Ready
        } else {
            BootstrapPhase::Failed
        };
        result
    }

    async fn run<T>(&mut self, txn: &mut T) -> Result<BootstrapOutcome>
    where
        T: MetadataTransaction + ?Sized,
    {
        let env = self.env;
        env.normalizer()
            .normalize(&mut self.options.data_path, self.state)?;

        if self.options.metadata_database.is_empty() {
            self.options.metadata_database = default_metadata_database(&self.options.lake_name);
        }
        let database = self.options.metadata_database.clone();

        env.secrets
            .ensure_loaded()
            .await
            .map_err(|source| self.attach_failure(source))?;

        let statement = AttachStatement {
            path: self.options.metadata_path.clone(),
            alias: database.clone(),
            options: AttachOptions::new(
                self.options.access_mode,
                &self.options.metadata_parameters,
            )?,
        };
        tracing::debug!(sql = %statement, "attaching metadata database");
        txn.attach(&statement)
            .await
            .map_err(|source| self.attach_failure(source))?;
        self.phase = BootstrapPhase::Attached;

        let has_explicit_schema = !self.options.metadata_schema.is_empty();
        if !has_explicit_schema {
            self.options.metadata_schema = txn.default_schema_name(&database).await?;
        }

        if self.options.data_inlining_row_limit > 0 {
            let catalog = txn.metadata_catalog(&database).await?;
            if !catalog.kind.is_native() {
                return Err(BootstrapError::unsupported(
                    "data inlining is only supported on native metadata catalogs",
                ));
            }
        }

        let probe = ExistenceProbe::new(&database, &self.options.metadata_schema);
        let count = txn.count_internal_tables(&probe).await?;
        tracing::debug!(
            count,
            schema = %self.options.metadata_schema,
            "probed for existing lake tables"
        );

        let scope = MetadataScope {
            database,
            schema: self.options.metadata_schema.clone(),
        };
        let outcome = if count == 0 {
            self.phase = BootstrapPhase::Creating;
            self.create(txn, &scope, has_explicit_schema).await?;
            BootstrapOutcome::Created
        } else {
            self.phase = BootstrapPhase::Loading;
            self.load(txn, &scope).await?;
            BootstrapOutcome::Loaded
        };

        if let Some(selector) = self.options.at_clause {
            // A missing snapshot fails the attach.
            let snapshot = txn
                .resolve_snapshot(&scope, &selector)
                .await?
                .ok_or_else(|| BootstrapError::SnapshotNotFound {
                    snapshot: selector.to_string(),
                })?;
            tracing::debug!(snapshot = %snapshot.id, "resolved requested snapshot");
        }

        Ok(outcome)
    }

    async fn create<T>(
        &mut self,
        txn: &mut T,
        scope: &MetadataScope,
        has_explicit_schema: bool,
    ) -> Result<()>
    where
        T: MetadataTransaction + ?Sized,
    {
        if !self.options.has_data_path() {
            let catalog = txn.metadata_catalog(&scope.database).await?;
            let backing_path = catalog
                .backing_path
                .filter(|_| catalog.kind.is_native())
                .ok_or_else(|| {
                    BootstrapError::missing_input(
                        "attempting to create a new lake but DATA_PATH is not set - set the \
                         DATA_PATH option to the desired location of the data files",
                    )
                })?;
            self.options.data_path = format!("{backing_path}{DEFAULT_DATA_PATH_SUFFIX}");
            self.env
                .normalizer()
                .normalize(&mut self.options.data_path, self.state)?;
        }

        if self.state.encryption() == Encryption::Automatic {
            self.state.set_encryption(Encryption::Unencrypted);
        }

        let init = LakeInit {
            format_version: LATEST_FORMAT_VERSION.to_string(),
            data_path: self.options.data_path.clone(),
            has_explicit_schema,
            encrypted: self.state.encryption() == Encryption::Encrypted,
        };
        txn.initialize_lake(scope, &init).await?;

        tracing::info!(
            data_path = %init.data_path,
            encrypted = init.encrypted,
            version = %init.format_version,
            "initialized new lake"
        );
        Ok(())
    }

    async fn load<T>(&mut self, txn: &mut T, scope: &MetadataScope) -> Result<()>
    where
        T: MetadataTransaction + ?Sized,
    {
        let metadata = txn.load_lake(scope).await?;

        // Validate every global tag before touching options, state, or the store.
        let planned = metadata
            .tags
            .iter()
            .map(PlannedTag::plan)
            .collect::<Result<Vec<_>>>()?;

        for planned in planned {
            match planned.kind {
                KnownTag::Version(_) => {
                    for step in &planned.migrations {
                        self.migrate(txn, scope, step).await?;
                    }
                }
                KnownTag::DataPath(stored) => {
                    if !self.options.has_data_path() {
                        self.options.data_path = txn.load_path(stored).await?;
                        self.env
                            .normalizer()
                            .normalize(&mut self.options.data_path, self.state)?;
                    } else {
                        tracing::warn!(
                            stored,
                            data_path = %self.options.data_path,
                            "ignoring stored data path in favour of explicit data path"
                        );
                    }
                }
                KnownTag::Encrypted(true) => self.state.set_encryption(Encryption::Encrypted),
                KnownTag::Encrypted(false) => self.state.set_encryption(Encryption::Unencrypted),
                KnownTag::Opaque => {}
            }
            self.options
                .config_options
                .insert(planned.tag.key.clone(), planned.tag.value.clone());
        }

        for setting in metadata.schema_settings {
            self.options
                .schema_options
                .entry(setting.schema_id)
                .or_default()
                .insert(setting.tag.key, setting.tag.value);
        }
        for setting in metadata.table_settings {
            self.options
                .table_options
                .entry(setting.table_id)
                .or_default()
                .insert(setting.tag.key, setting.tag.value);
        }

        // Lakes written before the encrypted tag existed are unencrypted.
        if self.state.encryption() == Encryption::Automatic {
            self.state.set_encryption(Encryption::Unencrypted);
        }

        tracing::info!(
            data_path = %self.options.data_path,
            encryption = %self.state.encryption(),
            tags = self.options.config_options.len(),
            "loaded existing lake"
        );
        Ok(())
    }

    async fn migrate<T>(
        &mut self,
        txn: &mut T,
        scope: &MetadataScope,
        step: &MigrationStep,
    ) -> Result<()>
    where
        T: MetadataTransaction + ?Sized,
    {
        tracing::info!(from = step.from, to = step.to, "migrating lake metadata");
        txn.migrate(scope, step).await?;
        metrics::record_migration(step.from, step.to);
        Ok(())
    }

    fn attach_failure(&self, source: lakehold_core::Error) -> BootstrapError {
        BootstrapError::AttachFailure {
            database: self.options.metadata_database.clone(),
            path: self.options.metadata_path.clone(),
            source,
        }
    }
}

/// A validated global tag and the migrations it calls for.
struct PlannedTag<'t> {
    tag: &'t Tag,
    kind: KnownTag<'t>,
    migrations: Vec<MigrationStep>,
}

impl<'t> PlannedTag<'t> {
    fn plan(tag: &'t Tag) -> Result<Self> {
        let kind = tag.classify()?;
        let migrations = match kind {
            KnownTag::Version(version) => plan_migrations(version)?,
            _ => Vec::new(),
        };
        Ok(Self {
            tag,
            kind,
            migrations,
        })
    }
}

/// Runs a bootstrap inside `txn` with all-or-nothing semantics.
///
/// On success the transaction is committed and the resolved options and state
/// are written back to the caller. On failure the transaction is rolled back
/// and `options` and `state` are left exactly as they were.
///
/// # Errors
///
/// Returns the bootstrap error, or [`BootstrapError::Metadata`] if the commit
/// itself fails.
pub async fn attach_lake<T>(
    options: &mut LakeOptions,
    state: &mut CatalogState,
    env: &BootstrapEnv,
    txn: &mut T,
) -> Result<BootstrapOutcome>
where
    T: MetadataTransaction + ?Sized,
{
    let span = bootstrap_span(&options.lake_name, &options.metadata_path);
    async move {
        let started = Instant::now();
        let mut staged_options = options.clone();
        let mut staged_state = state.clone();

        let mut result = Bootstrapper::new(&mut staged_options, &mut staged_state, env)
            .initialize(txn)
            .await;
        if result.is_ok() {
            if let Err(e) = txn.commit().await {
                result = Err(e.into());
            }
        }
        if result.is_err() {
            if let Err(e) = txn.rollback().await {
                tracing::warn!(error = %e, "failed to roll back metadata transaction");
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(outcome) => {
                *options = staged_options;
                *state = staged_state;
                metrics::record_bootstrap(outcome.as_str(), elapsed);
                tracing::info!(%outcome, "lake attached");
                Ok(outcome)
            }
            Err(e) => {
                metrics::record_bootstrap(e.kind(), elapsed);
                tracing::warn!(error = %e, "lake bootstrap failed");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// A lake attached to a session.
#[derive(Debug, Clone)]
pub struct AttachedLake {
    /// Resolved configuration, including the loaded overlays.
    pub options: LakeOptions,
    /// Resolved catalog state.
    pub state: CatalogState,
    /// Whether the lake was created or loaded.
    pub outcome: BootstrapOutcome,
}

/// Opens a lake: derives the initial catalog state from `options` and runs
/// [`attach_lake`].
///
/// # Errors
///
/// Returns any error from [`attach_lake`].
pub async fn open_lake<T>(
    mut options: LakeOptions,
    env: &BootstrapEnv,
    txn: &mut T,
) -> Result<AttachedLake>
where
    T: MetadataTransaction + ?Sized,
{
    let mut state = CatalogState::new(options.encryption);
    let outcome = attach_lake(&mut options, &mut state, env, txn).await?;
    Ok(AttachedLake {
        options,
        state,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{CatalogKind, MetadataCatalog, SnapshotInfo};
    use crate::options::SnapshotSelector;
    use crate::tag::LoadedMetadata;
    use async_trait::async_trait;
    use chrono::Utc;
    use lakehold_core::{SnapshotId, StorageCapability};

    /// Scripted metadata store that records call names.
    #[derive(Default)]
    struct FakeTxn {
        native: bool,
        existing_tables: u64,
        loaded: LoadedMetadata,
        fail_attach: bool,
        snapshots: Vec<SnapshotId>,
        calls: Vec<&'static str>,
        initialized: Option<LakeInit>,
    }

    impl FakeTxn {
        fn native() -> Self {
            Self {
                native: true,
                ..Self::default()
            }
        }

        fn existing(tags: &[(&str, &str)]) -> Self {
            Self {
                native: true,
                existing_tables: 4,
                loaded: LoadedMetadata {
                    tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
                    ..LoadedMetadata::default()
                },
                ..Self::default()
            }
        }

        fn called(&self, name: &str) -> usize {
            self.calls.iter().filter(|c| **c == name).count()
        }
    }

    #[async_trait]
    impl MetadataTransaction for FakeTxn {
        async fn attach(&mut self, _statement: &AttachStatement) -> lakehold_core::Result<()> {
            self.calls.push("attach");
            if self.fail_attach {
                return Err(lakehold_core::Error::storage("connection refused"));
            }
            Ok(())
        }

        async fn default_schema_name(&mut self, _database: &str) -> lakehold_core::Result<String> {
            self.calls.push("default_schema_name");
            Ok("main".to_string())
        }

        async fn metadata_catalog(
            &mut self,
            _database: &str,
        ) -> lakehold_core::Result<MetadataCatalog> {
            self.calls.push("metadata_catalog");
            Ok(if self.native {
                MetadataCatalog {
                    kind: CatalogKind::Native,
                    backing_path: Some("/meta/sales.lake".to_string()),
                }
            } else {
                MetadataCatalog {
                    kind: CatalogKind::External,
                    backing_path: None,
                }
            })
        }

        async fn count_internal_tables(
            &mut self,
            _probe: &ExistenceProbe,
        ) -> lakehold_core::Result<u64> {
            self.calls.push("count_internal_tables");
            Ok(self.existing_tables)
        }

        async fn initialize_lake(
            &mut self,
            _scope: &MetadataScope,
            init: &LakeInit,
        ) -> lakehold_core::Result<()> {
            self.calls.push("initialize_lake");
            self.initialized = Some(init.clone());
            Ok(())
        }

        async fn load_lake(&mut self, _scope: &MetadataScope) -> lakehold_core::Result<LoadedMetadata> {
            self.calls.push("load_lake");
            Ok(self.loaded.clone())
        }

        async fn migrate(
            &mut self,
            _scope: &MetadataScope,
            _step: &MigrationStep,
        ) -> lakehold_core::Result<()> {
            self.calls.push("migrate");
            Ok(())
        }

        async fn load_path(&mut self, stored: &str) -> lakehold_core::Result<String> {
            self.calls.push("load_path");
            Ok(format!("/meta/{stored}"))
        }

        async fn resolve_snapshot(
            &mut self,
            _scope: &MetadataScope,
            selector: &SnapshotSelector,
        ) -> lakehold_core::Result<Option<SnapshotInfo>> {
            self.calls.push("resolve_snapshot");
            Ok(match selector {
                SnapshotSelector::Version(id) if self.snapshots.contains(id) => Some(SnapshotInfo {
                    id: *id,
                    committed_at: Utc::now(),
                }),
                _ => None,
            })
        }

        async fn commit(&mut self) -> lakehold_core::Result<()> {
            self.calls.push("commit");
            Ok(())
        }

        async fn rollback(&mut self) -> lakehold_core::Result<()> {
            self.calls.push("rollback");
            Ok(())
        }
    }

    fn options() -> LakeOptions {
        LakeOptions::new("sales", "/meta/sales.lake")
    }

    #[tokio::test]
    async fn test_create_derives_default_data_path() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::native();
        let mut options = options();
        let mut state = CatalogState::default();

        let mut bootstrapper = Bootstrapper::new(&mut options, &mut state, &env);
        let outcome = bootstrapper.initialize(&mut txn).await.unwrap();
        assert_eq!(outcome, BootstrapOutcome::Created);
        assert_eq!(bootstrapper.phase(), BootstrapPhase::Ready);

        assert_eq!(options.metadata_schema, "main");
        assert_eq!(options.data_path, "/meta/sales.lake.files/");
        assert_eq!(state.encryption(), Encryption::Unencrypted);
        let init = txn.initialized.unwrap();
        assert_eq!(init.format_version, LATEST_FORMAT_VERSION);
        assert!(!init.has_explicit_schema);
        assert!(!init.encrypted);
    }

    #[tokio::test]
    async fn test_create_without_data_path_on_external_catalog_fails() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::default();
        let mut options = options();
        let mut state = CatalogState::default();

        let mut bootstrapper = Bootstrapper::new(&mut options, &mut state, &env);
        let err = bootstrapper.initialize(&mut txn).await.unwrap_err();
        assert!(matches!(err, BootstrapError::MissingRequiredInput { .. }));
        assert!(err.to_string().contains("DATA_PATH"));
        assert_eq!(bootstrapper.phase(), BootstrapPhase::Failed);
        assert_eq!(txn.called("initialize_lake"), 0);
    }

    #[tokio::test]
    async fn test_explicit_encryption_is_persisted() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::native();
        let mut options = options();
        options.metadata_schema = "lake".to_string();
        let mut state = CatalogState::new(Encryption::Encrypted);

        Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();
        let init = txn.initialized.as_ref().unwrap();
        assert!(init.encrypted);
        assert!(init.has_explicit_schema);
        assert_eq!(txn.called("default_schema_name"), 0);
    }

    #[tokio::test]
    async fn test_load_applies_tags() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[
            ("data_path", "rel/x"),
            ("encrypted", "true"),
            ("foo", "bar"),
        ]);
        let mut options = options();
        let mut state = CatalogState::default();

        let outcome = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::Loaded);
        assert_eq!(options.data_path, "/meta/rel/x/");
        assert_eq!(state.encryption(), Encryption::Encrypted);
        assert_eq!(options.config_options.len(), 3);
        assert_eq!(options.config_options["foo"], "bar");
        assert_eq!(options.config_options["data_path"], "rel/x");
        assert_eq!(options.config_options["encrypted"], "true");
        assert_eq!(txn.called("initialize_lake"), 0);
    }

    #[tokio::test]
    async fn test_explicit_data_path_wins_over_stored() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[("data_path", "rel/x")]);
        let mut options = options();
        options.data_path = "s3://bucket/override".to_string();
        let mut state = CatalogState::default();

        Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();
        assert_eq!(options.data_path, "s3://bucket/override/");
        assert_eq!(txn.called("load_path"), 0);
        assert_eq!(state.encryption(), Encryption::Unencrypted);
    }

    #[tokio::test]
    async fn test_duplicate_tags_last_write_wins() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[("owner", "alice"), ("owner", "bob")]);
        let mut options = options();
        let mut state = CatalogState::default();

        Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();
        assert_eq!(options.config_options["owner"], "bob");
    }

    #[tokio::test]
    async fn test_legacy_version_migrates_once() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[("version", "0.1")]);
        let mut options = options();
        let mut state = CatalogState::default();

        Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();
        assert_eq!(txn.called("migrate"), 1);
        assert_eq!(options.config_options["version"], "0.1");
    }

    #[tokio::test]
    async fn test_unknown_version_is_rejected() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[("version", "0.9")]);
        let mut options = options();
        let mut state = CatalogState::default();

        let err = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnsupportedFormatVersion { .. }));
    }

    #[tokio::test]
    async fn test_malformed_tag_has_no_side_effects() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[
            ("version", "0.1"),
            ("data_path", "rel/x"),
            ("encrypted", "maybe"),
        ]);
        let mut options = options();
        let mut state = CatalogState::default();

        let err = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::MalformedTagValue { .. }));
        assert_eq!(txn.called("migrate"), 0);
        assert_eq!(txn.called("load_path"), 0);
        assert!(options.config_options.is_empty());
        assert!(options.data_path.is_empty());
        assert_eq!(state.encryption(), Encryption::Automatic);
    }

    #[tokio::test]
    async fn test_inlining_requires_native_catalog() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::default();
        let mut options = options();
        options.data_inlining_row_limit = 10;
        options.data_path = "s3://bucket/lake".to_string();
        let mut state = CatalogState::default();

        let err = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnsupportedConfiguration { .. }));
        assert!(err.to_string().starts_with("not implemented"));
        assert_eq!(txn.called("count_internal_tables"), 0);
    }

    #[tokio::test]
    async fn test_missing_capability_fails_before_attach() {
        let env = BootstrapEnv::new()
            .with_capabilities(Arc::new(StaticCapabilities::local_only()));
        let mut txn = FakeTxn::native();
        let mut options = options();
        options.data_path = "az://container/lake".to_string();
        let mut state = CatalogState::default();

        let err = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap_err();
        match err {
            BootstrapError::MissingCapability { capability, .. } => {
                assert_eq!(capability, StorageCapability::Azure);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(txn.calls.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_resolved_eagerly() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::existing(&[("version", "0.2")]);
        txn.snapshots = vec![SnapshotId::new(3)];

        let mut options = options();
        options.at_clause = Some(SnapshotSelector::Version(SnapshotId::new(3)));
        let mut state = CatalogState::default();
        Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap();

        let mut options = self::options();
        options.at_clause = Some(SnapshotSelector::Version(SnapshotId::new(4)));
        let mut state = CatalogState::default();
        let err = Bootstrapper::new(&mut options, &mut state, &env)
            .initialize(&mut txn)
            .await
            .unwrap_err();
        match err {
            BootstrapError::SnapshotNotFound { snapshot } => assert_eq!(snapshot, "version 4"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_second_initialize_is_rejected() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn::native();
        let mut options = options();
        let mut state = CatalogState::default();

        let mut bootstrapper = Bootstrapper::new(&mut options, &mut state, &env);
        bootstrapper.initialize(&mut txn).await.unwrap();
        let err = bootstrapper.initialize(&mut txn).await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidPhase {
                phase: BootstrapPhase::Ready
            }
        ));
    }

    #[tokio::test]
    async fn test_attach_lake_rolls_back_and_preserves_inputs() {
        let env = BootstrapEnv::default();
        let mut txn = FakeTxn {
            fail_attach: true,
            ..FakeTxn::native()
        };
        let mut options = options();
        options.data_path = "/data/lake".to_string();
        let mut state = CatalogState::default();

        let err = attach_lake(&mut options, &mut state, &env, &mut txn)
            .await
            .unwrap_err();
        match &err {
            BootstrapError::AttachFailure { database, path, .. } => {
                assert_eq!(database, "__lakehold_metadata_sales");
                assert_eq!(path, "/meta/sales.lake");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(options.data_path, "/data/lake");
        assert_eq!(state.resolved_separator(), None);
        assert_eq!(txn.called("rollback"), 1);
        assert_eq!(txn.called("commit"), 0);
    }

    #[tokio::test]
    async fn test_open_lake_commits() {
        let mut txn = FakeTxn::native();
        let lake = open_lake(options(), &BootstrapEnv::default(), &mut txn)
            .await
            .unwrap();
        assert_eq!(lake.outcome, BootstrapOutcome::Created);
        assert_eq!(lake.state.encryption(), Encryption::Unencrypted);
        assert_eq!(txn.calls.last(), Some(&"commit"));
    }
}

//! Storage backend abstraction for metadata objects (memory, local disk).
//!
//! The contract is the subset of object-storage semantics the metadata store
//! needs:
//! - Conditional writes with preconditions
//! - Prefix listing
//! - Object metadata including a version token
//!
//! The version token is an opaque `String` so that backends can use whatever
//! native concurrency token they have.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Condition a [`StorageBackend::put`] must satisfy before it replaces an
/// object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePrecondition {
    /// The object must be absent.
    DoesNotExist,
    /// The object must exist with exactly this version token.
    MatchesVersion(String),
    /// No condition.
    None,
}

impl WritePrecondition {
    /// Checks the condition against the current version of an object.
    ///
    /// Returns the failed [`WriteResult`] when the write must not proceed.
    #[must_use]
    pub fn check(&self, current: Option<&str>) -> Option<WriteResult> {
        let rejected = match (self, current) {
            (Self::DoesNotExist, Some(_)) => true,
            (Self::MatchesVersion(expected), Some(version)) => expected != version,
            (Self::MatchesVersion(_), None) => true,
            _ => false,
        };
        rejected.then(|| WriteResult::PreconditionFailed {
            current_version: current.unwrap_or("0").to_string(),
        })
    }
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The object was written.
    Success {
        /// Version token of the written object.
        version: String,
    },
    /// The precondition did not hold; nothing was written.
    PreconditionFailed {
        /// Version token found instead (`"0"` when the object is absent).
        current_version: String,
    },
}

/// Description of a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Key of the object.
    pub path: String,
    /// Length in bytes.
    pub size: u64,
    /// Opaque version token, compared by [`WritePrecondition::MatchesVersion`].
    pub version: String,
    /// Modification time, when the backend knows it.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object storage used by the metadata store.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads a whole object.
    ///
    /// A missing object is `Error::NotFound`.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes an object if `precondition` holds.
    ///
    /// A failed precondition is reported as
    /// [`WriteResult::PreconditionFailed`], not as an error.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>;

    /// Removes an object. Removing a missing object is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists objects whose key starts with `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Describes an object without reading it, or `None` when it is missing.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;
}

/// Process-local storage, used by tests and dry runs.
///
/// Versions count writes per key, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    version: u64,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn meta(&self, path: &str) -> ObjectMeta {
        ObjectMeta {
            path: path.to_string(),
            size: self.data.len() as u64,
            version: self.version.to_string(),
            last_modified: Some(self.last_modified),
        }
    }
}

fn poisoned() -> Error {
    Error::Internal {
        message: "memory backend lock poisoned".into(),
    }
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many objects are stored.
    ///
    /// # Errors
    ///
    /// Fails if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.objects.read().map_err(|_| poisoned())?.len())
    }

    /// Returns true when nothing is stored.
    ///
    /// # Errors
    ///
    /// Fails if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        match objects.get(path) {
            Some(object) => Ok(object.data.clone()),
            None => Err(Error::NotFound(format!("object not found: {path}"))),
        }
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;

        let previous = objects.get(path).map(|object| object.version);
        let previous_token = previous.map(|version| version.to_string());
        if let Some(failed) = precondition.check(previous_token.as_deref()) {
            return Ok(failed);
        }

        let version = previous.unwrap_or_default() + 1;
        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                version,
                last_modified: Utc::now(),
            },
        );
        Ok(WriteResult::Success {
            version: version.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.write().map_err(|_| poisoned())?.remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, object)| object.meta(path))
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects.get(path).map(|object| object.meta(path)))
    }
}

/// Local filesystem storage backend.
///
/// Object paths are interpreted relative to `root`. Versions are derived from
/// the file's modification time in nanoseconds, which is sufficient for the
/// single-process use of the command-line tool. Preconditions are checked and
/// applied without cross-process locking.
#[derive(Debug, Clone)]
pub struct LocalFsBackend {
    root: PathBuf,
}

impl LocalFsBackend {
    /// Creates a backend rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(Error::InvalidInput(format!(
                "path traversal not allowed: {path}"
            )));
        }
        Ok(self.root.join(path.trim_start_matches(['/', '\\'])))
    }

    async fn meta_for(&self, path: &str, file: &Path) -> Result<Option<ObjectMeta>> {
        match tokio::fs::metadata(file).await {
            Ok(md) if md.is_file() => {
                let modified = md.modified().ok().map(DateTime::<Utc>::from);
                let version = modified
                    .and_then(|ts| ts.timestamp_nanos_opt())
                    .unwrap_or_default();
                Ok(Some(ObjectMeta {
                    path: path.to_string(),
                    size: md.len(),
                    version: version.to_string(),
                    last_modified: modified,
                }))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage_with_source(
                format!("failed to stat {}", file.display()),
                e,
            )),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalFsBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let file = self.resolve(path)?;
        match tokio::fs::read(&file).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("object not found: {path}")))
            }
            Err(e) => Err(Error::storage_with_source(
                format!("failed to read {}", file.display()),
                e,
            )),
        }
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let file = self.resolve(path)?;
        let current = self.meta_for(path, &file).await?;

        let current_token = current.as_ref().map(|meta| meta.version.as_str());
        if let Some(failed) = precondition.check(current_token) {
            return Ok(failed);
        }

        if let Some(dir) = file.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                Error::storage_with_source(format!("failed to create {}", dir.display()), e)
            })?;
        }
        tokio::fs::write(&file, &data).await.map_err(|e| {
            Error::storage_with_source(format!("failed to write {}", file.display()), e)
        })?;

        let version = self
            .meta_for(path, &file)
            .await?
            .map(|meta| meta.version)
            .unwrap_or_default();
        Ok(WriteResult::Success { version })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let file = self.resolve(path)?;
        match tokio::fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage_with_source(
                format!("failed to delete {}", file.display()),
                e,
            )),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let base = self.resolve(crate::location::parent_dir(prefix))?;
        let mut entries = match tokio::fs::read_dir(&base).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage_with_source(
                    format!("failed to list {}", base.display()),
                    e,
                ));
            }
        };

        let dir_prefix = crate::location::parent_dir(prefix);
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage_with_source("failed to read directory entry", e))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let path = format!("{dir_prefix}{name}");
            if !path.starts_with(prefix) {
                continue;
            }
            if let Some(meta) = self.meta_for(&path, &entry.path()).await? {
                out.push(meta);
            }
        }
        Ok(out)
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let file = self.resolve(path)?;
        self.meta_for(path, &file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_check() {
        let matches = |v: &str| WritePrecondition::MatchesVersion(v.to_string());

        assert!(WritePrecondition::None.check(Some("3")).is_none());
        assert!(WritePrecondition::DoesNotExist.check(None).is_none());
        assert!(matches("3").check(Some("3")).is_none());

        assert_eq!(
            WritePrecondition::DoesNotExist.check(Some("3")),
            Some(WriteResult::PreconditionFailed {
                current_version: "3".into()
            })
        );
        assert_eq!(
            matches("2").check(Some("3")),
            Some(WriteResult::PreconditionFailed {
                current_version: "3".into()
            })
        );
        assert_eq!(
            matches("1").check(None),
            Some(WriteResult::PreconditionFailed {
                current_version: "0".into()
            })
        );
    }

    #[tokio::test]
    async fn memory_versions_count_writes() {
        let backend = MemoryBackend::new();

        for expected in ["1", "2", "3"] {
            let result = backend
                .put("lake/main/tags.json", Bytes::from("[]"), WritePrecondition::None)
                .await
                .unwrap();
            assert_eq!(
                result,
                WriteResult::Success {
                    version: expected.into()
                }
            );
        }

        let meta = backend.head("lake/main/tags.json").await.unwrap().unwrap();
        assert_eq!(meta.version, "3");
        assert_eq!(meta.size, 2);
        assert!(!backend.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_local_fs_roundtrip_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());

        backend
            .put(
                "meta/main/lakehold_metadata.json",
                Bytes::from("{}"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .unwrap();
        backend
            .put(
                "meta/main/other.json",
                Bytes::from("{}"),
                WritePrecondition::None,
            )
            .await
            .unwrap();

        let listed = backend.list("meta/main/lakehold_").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, "meta/main/lakehold_metadata.json");

        let again = backend
            .put(
                "meta/main/lakehold_metadata.json",
                Bytes::from("{}"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .unwrap();
        assert!(matches!(again, WriteResult::PreconditionFailed { .. }));

        assert_eq!(
            backend.get("meta/main/other.json").await.unwrap(),
            Bytes::from("{}")
        );
    }

    #[tokio::test]
    async fn test_local_fs_missing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());

        assert!(backend.get("nope.json").await.unwrap_err().is_not_found());
        assert!(backend.list("nope/x").await.unwrap().is_empty());
        assert!(backend.head("nope.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_fs_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());
        let err = backend.get("../escape").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

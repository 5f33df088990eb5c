//! Traced storage for tests.
//!
//! Wraps [`MemoryBackend`] so every call is recorded and any path prefix can
//! be made to fail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use lakehold_core::error::{Error, Result};
use lakehold_core::storage::{
    MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
};

/// A storage call seen by [`TracingMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// Object read.
    Get {
        /// Object path.
        path: String,
    },
    /// Metadata lookup.
    Head {
        /// Object path.
        path: String,
    },
    /// Object write.
    Put {
        /// Object path.
        path: String,
        /// Requested precondition.
        precondition: WritePrecondition,
    },
    /// Object removal.
    Delete {
        /// Object path.
        path: String,
    },
    /// Prefix listing.
    List {
        /// Listed prefix.
        prefix: String,
    },
}

impl StorageOp {
    /// Returns true for calls that mutate storage.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Put { .. } | Self::Delete { .. })
    }

    fn path(&self) -> &str {
        match self {
            Self::Get { path }
            | Self::Head { path }
            | Self::Put { path, .. }
            | Self::Delete { path } => path,
            Self::List { prefix } => prefix,
        }
    }
}

/// [`MemoryBackend`] that records calls and fails on injected prefixes.
///
/// Failed calls are recorded too, so tests can assert how far a bootstrap
/// got before storage gave out.
#[derive(Debug, Clone, Default)]
pub struct TracingMemoryBackend {
    inner: MemoryBackend,
    operations: Arc<Mutex<Vec<StorageOp>>>,
    failing_prefixes: Arc<Mutex<Vec<String>>>,
}

impl TracingMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded call, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<StorageOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns only the recorded writes.
    #[must_use]
    pub fn writes(&self) -> Vec<StorageOp> {
        self.operations()
            .into_iter()
            .filter(StorageOp::is_write)
            .collect()
    }

    /// Forgets recorded calls.
    pub fn clear_operations(&self) {
        self.operations.lock().expect("lock").clear();
    }

    /// Makes every call touching `prefix` fail with a storage error.
    pub fn inject_failure(&self, prefix: impl Into<String>) {
        self.failing_prefixes
            .lock()
            .expect("lock")
            .push(prefix.into());
    }

    /// Removes injected failures.
    pub fn clear_failures(&self) {
        self.failing_prefixes.lock().expect("lock").clear();
    }

    /// Returns every stored path, sorted, without recording the call.
    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .inner
            .list("")
            .await
            .expect("list")
            .into_iter()
            .map(|meta| meta.path)
            .collect();
        paths.sort();
        paths
    }

    /// Returns the bytes stored at `path`, without recording the call.
    pub async fn object(&self, path: &str) -> Option<Bytes> {
        self.inner.get(path).await.ok()
    }

    fn trace(&self, op: StorageOp) -> Result<()> {
        let failing = self
            .failing_prefixes
            .lock()
            .expect("lock")
            .iter()
            .any(|prefix| op.path().starts_with(prefix.as_str()));
        let path = op.path().to_string();
        self.operations.lock().expect("lock").push(op);
        if failing {
            return Err(Error::storage(format!("injected failure at {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for TracingMemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        self.trace(StorageOp::Get {
            path: path.to_string(),
        })?;
        self.inner.get(path).await
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        self.trace(StorageOp::Put {
            path: path.to_string(),
            precondition: precondition.clone(),
        })?;
        self.inner.put(path, data, precondition).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.trace(StorageOp::Delete {
            path: path.to_string(),
        })?;
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        self.trace(StorageOp::List {
            prefix: prefix.to_string(),
        })?;
        self.inner.list(prefix).await
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        self.trace(StorageOp::Head {
            path: path.to_string(),
        })?;
        self.inner.head(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let storage = TracingMemoryBackend::new();

        storage
            .put("lake/main/a.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put");
        storage.get("lake/main/a.json").await.expect("get");
        storage.list("lake/").await.expect("list");

        let ops = storage.operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], StorageOp::Put { .. }));
        assert!(matches!(ops[1], StorageOp::Get { .. }));
        assert!(matches!(ops[2], StorageOp::List { .. }));
        assert_eq!(storage.writes().len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_and_clearable() {
        let storage = TracingMemoryBackend::new();
        storage.inject_failure("broken/");

        assert!(storage.get("broken/a.json").await.is_err());
        assert!(storage.list("broken/").await.is_err());
        assert_eq!(storage.operations().len(), 2);

        storage.clear_failures();
        assert!(storage.list("broken/").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn inspection_helpers_bypass_tracing() {
        let storage = TracingMemoryBackend::new();
        storage
            .put("b.json", Bytes::from("2"), WritePrecondition::DoesNotExist)
            .await
            .expect("put");
        storage
            .put("a.json", Bytes::from("1"), WritePrecondition::DoesNotExist)
            .await
            .expect("put");
        storage.clear_operations();

        assert_eq!(storage.paths().await, vec!["a.json", "b.json"]);
        assert_eq!(storage.object("a.json").await, Some(Bytes::from("1")));
        assert_eq!(storage.object("missing.json").await, None);
        assert!(storage.operations().is_empty());
    }
}

//! Contract tests every `StorageBackend` implementation must pass.
//!
//! The metadata store relies on these semantics for its conditional commit,
//! so memory and local-disk backends are held to the same contract.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::Bytes;

use lakehold_core::{
    LocalFsBackend, MemoryBackend, StorageBackend, WritePrecondition, WriteResult,
};

async fn contract_create_is_exclusive(backend: &dyn StorageBackend) {
    let first = backend
        .put("lake/main/a.json", Bytes::from("1"), WritePrecondition::DoesNotExist)
        .await
        .expect("put");
    assert!(matches!(first, WriteResult::Success { .. }));

    let second = backend
        .put("lake/main/a.json", Bytes::from("2"), WritePrecondition::DoesNotExist)
        .await
        .expect("put");
    assert!(matches!(second, WriteResult::PreconditionFailed { .. }));
    assert_eq!(backend.get("lake/main/a.json").await.unwrap(), Bytes::from("1"));
}

async fn contract_version_guards_updates(backend: &dyn StorageBackend) {
    backend
        .put("lake/main/b.json", Bytes::from("1"), WritePrecondition::None)
        .await
        .expect("put");
    let version = backend
        .head("lake/main/b.json")
        .await
        .unwrap()
        .expect("exists")
        .version;

    let stale = backend
        .put(
            "lake/main/b.json",
            Bytes::from("2"),
            WritePrecondition::MatchesVersion("stale".to_string()),
        )
        .await
        .expect("put");
    assert!(matches!(stale, WriteResult::PreconditionFailed { .. }));

    let fresh = backend
        .put(
            "lake/main/b.json",
            Bytes::from("2"),
            WritePrecondition::MatchesVersion(version),
        )
        .await
        .expect("put");
    assert!(matches!(fresh, WriteResult::Success { .. }));
}

async fn contract_list_is_prefix_scoped(backend: &dyn StorageBackend) {
    for path in ["lake/main/x.json", "lake/main/y.json", "lake/other/z.json"] {
        backend
            .put(path, Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put");
    }
    let mut listed: Vec<String> = backend
        .list("lake/main/")
        .await
        .unwrap()
        .into_iter()
        .map(|meta| meta.path)
        .collect();
    listed.sort();
    assert_eq!(listed, vec!["lake/main/x.json", "lake/main/y.json"]);
    assert!(backend.list("nothing/here/").await.unwrap().is_empty());
}

async fn run_contracts(backend: &dyn StorageBackend) {
    contract_create_is_exclusive(backend).await;
    contract_version_guards_updates(backend).await;
    contract_list_is_prefix_scoped(backend).await;
}

#[tokio::test]
async fn memory_backend_meets_contract() {
    run_contracts(&MemoryBackend::new()).await;
}

#[tokio::test]
async fn local_fs_backend_meets_contract() {
    let dir = tempfile::tempdir().unwrap();
    run_contracts(&LocalFsBackend::new(dir.path())).await;
}

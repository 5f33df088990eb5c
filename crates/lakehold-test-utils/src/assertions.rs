//! Assertion helpers for bootstrap tests.

use lakehold_catalog::error::BootstrapError;
use lakehold_catalog::options::LakeOptions;
use lakehold_catalog::state::CatalogState;

use crate::storage::StorageOp;

/// Asserts that no operation wrote to storage.
///
/// # Panics
///
/// Panics if any put or delete was recorded.
pub fn assert_no_writes(ops: &[StorageOp]) {
    let writes: Vec<&StorageOp> = ops.iter().filter(|op| op.is_write()).collect();
    assert!(writes.is_empty(), "expected no writes, found {writes:?}");
}

/// Asserts that the data path is normalized and its separator recorded.
///
/// # Panics
///
/// Panics if the data path is empty, lacks a trailing separator, or the
/// separator was never recorded on the catalog state.
pub fn assert_data_path_normalized(options: &LakeOptions, state: &CatalogState) {
    let separator = state
        .resolved_separator()
        .expect("separator should be resolved");
    assert!(
        options.data_path.ends_with(separator),
        "data path {:?} does not end with {separator:?}",
        options.data_path
    );
}

/// Asserts that the encryption mode was resolved.
///
/// # Panics
///
/// Panics if encryption is still automatic.
pub fn assert_encryption_resolved(state: &CatalogState) {
    assert!(
        state.encryption().is_resolved(),
        "encryption should be resolved, found {}",
        state.encryption()
    );
}

/// Asserts that an error has the given metrics kind.
///
/// # Panics
///
/// Panics if the kinds differ.
pub fn assert_error_kind(err: &BootstrapError, kind: &str) {
    assert_eq!(err.kind(), kind, "unexpected error: {err}");
}

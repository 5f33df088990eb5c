//! Fixtures shared by the Lakehold test suites.
//!
//! - [`TracingMemoryBackend`] records storage calls and fails on request.
//! - [`RecordingTransaction`] logs every metadata-store call and can fail one.
//! - [`LakeFixture`] seeds lakes in any format version and opens them.
//! - [`assertions`] holds the checks most bootstrap tests repeat.
//!
//! ```rust,ignore
//! let fixture = LakeFixture::native();
//! fixture.seed_legacy_lake("s3://bucket/lake/").await;
//! fixture.open(fixture.options()).await.unwrap();
//! assert_eq!(fixture.log.migrations(), vec![("0.1", "0.2")]);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;
pub mod recording;
pub mod storage;

pub use assertions::*;
pub use fixtures::*;
pub use recording::*;
pub use storage::*;

/// Routes `lakehold` debug logs to the test writer. Safe to call repeatedly.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("lakehold=debug".parse().expect("directive"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

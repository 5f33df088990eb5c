//! Strongly-typed identifiers for lakehouse catalog entities.
//!
//! Schema, table and snapshot ids are allocated by the metadata store as
//! monotonically increasing integers. They are wrapped in distinct newtypes so
//! that a schema-level setting can never be filed under a table id.
//!
//! # Example
//!
//! ```rust
//! use lakehold_core::id::{SchemaId, TableId};
//!
//! let schema = SchemaId::new(0);
//! let table: TableId = "12".parse().unwrap();
//! assert_eq!(table.as_u64(), 12);
//!
//! // Different types - this won't compile:
//! // let wrong: SchemaId = table;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw id allocated by the metadata store.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw id value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim().parse::<u64>().map(Self).map_err(|e| Error::InvalidId {
                    message: format!("invalid {} '{s}': {e}", $label),
                })
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

catalog_id!(
    /// Identifier of a schema registered in the lakehouse catalog.
    SchemaId,
    "schema id"
);

catalog_id!(
    /// Identifier of a table registered in the lakehouse catalog.
    TableId,
    "table id"
);

catalog_id!(
    /// Identifier of a committed catalog snapshot.
    SnapshotId,
    "snapshot id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let id: TableId = " 42 ".parse().expect("valid id");
        assert_eq!(id, TableId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let err = "abc".parse::<SchemaId>().unwrap_err();
        assert!(err.to_string().contains("invalid schema id 'abc'"));
    }

    #[test]
    fn test_ids_order_by_allocation() {
        let mut ids = vec![SnapshotId::new(3), SnapshotId::new(1), SnapshotId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![SnapshotId::new(1), SnapshotId::new(2), SnapshotId::new(3)]);
    }
}

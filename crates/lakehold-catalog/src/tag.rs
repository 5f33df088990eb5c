//! Persisted lake tags.
//!
//! A tag is a key/value string pair stored in the metadata store. Three keys
//! carry meaning for the bootstrap (`version`, `data_path`, `encrypted`); every
//! other key is opaque configuration passed through to the session.

use serde::{Deserialize, Serialize};

use lakehold_core::{SchemaId, TableId};

use crate::error::{BootstrapError, Result};

/// Tag holding the lake format version.
pub const TAG_VERSION: &str = "version";
/// Tag holding the (possibly relative) data path.
pub const TAG_DATA_PATH: &str = "data_path";
/// Tag holding the encryption flag.
pub const TAG_ENCRYPTED: &str = "encrypted";

/// A persisted key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Interprets the tag against the well-known keys.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::MalformedTagValue`] if a well-known key
    /// carries a value outside its domain.
    pub fn classify(&self) -> Result<KnownTag<'_>> {
        match self.key.as_str() {
            TAG_VERSION => Ok(KnownTag::Version(&self.value)),
            TAG_DATA_PATH => Ok(KnownTag::DataPath(&self.value)),
            TAG_ENCRYPTED => match self.value.as_str() {
                "true" => Ok(KnownTag::Encrypted(true)),
                "false" => Ok(KnownTag::Encrypted(false)),
                _ => Err(BootstrapError::malformed_tag(
                    TAG_ENCRYPTED,
                    &self.value,
                    "\"true\" or \"false\"",
                )),
            },
            _ => Ok(KnownTag::Opaque),
        }
    }
}

/// Meaning of a tag for the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownTag<'a> {
    /// Format version of the metadata store.
    Version(&'a str),
    /// Data path as stored.
    DataPath(&'a str),
    /// Whether data files are encrypted.
    Encrypted(bool),
    /// Pass-through configuration.
    Opaque,
}

/// A tag scoped to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSetting {
    /// Schema the tag applies to.
    pub schema_id: SchemaId,
    /// The tag.
    #[serde(flatten)]
    pub tag: Tag,
}

/// A tag scoped to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSetting {
    /// Table the tag applies to.
    pub table_id: TableId,
    /// The tag.
    #[serde(flatten)]
    pub tag: Tag,
}

/// Everything the metadata store returns when an existing lake is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedMetadata {
    /// Global tags, in stored order.
    pub tags: Vec<Tag>,
    /// Schema-level tags.
    pub schema_settings: Vec<SchemaSetting>,
    /// Table-level tags.
    pub table_settings: Vec<TableSetting>,
}

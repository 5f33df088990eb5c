//! Lake configuration supplied at attach time.
//!
//! [`LakeOptions`] is owned by the attaching session. The bootstrap fills in
//! whatever the caller left unset (metadata schema, data path) and merges the
//! lake's persisted tags into the config overlays.
//!
//! Options arrive either as a deserialized config document or as the ordered
//! parameter list of an attach command, see [`LakeOptions::from_parameters`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use lakehold_core::{SchemaId, SnapshotId, TableId};

use crate::error::{BootstrapError, Result};
use crate::sql::{quote_literal, validate_option_key};
use crate::state::Encryption;

/// Prefix of the default logical name given to the attached metadata database.
pub const METADATA_DATABASE_PREFIX: &str = "__lakehold_metadata_";

/// Prefix that routes an attach parameter to the metadata store.
pub const METADATA_PARAMETER_PREFIX: &str = "META_";

/// How the metadata store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Let the metadata store pick.
    #[default]
    Automatic,
    /// Open read-only.
    ReadOnly,
    /// Open read-write.
    ReadWrite,
}

impl AccessMode {
    /// Parses an access mode using case-insensitive matching.
    ///
    /// Accepted values: `automatic`, `read_only`, `read_write` (a `-` may be
    /// used instead of `_`).
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnsupportedConfiguration`] for unknown values.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "automatic" | "auto" => Ok(Self::Automatic),
            "read_only" | "readonly" => Ok(Self::ReadOnly),
            "read_write" | "readwrite" => Ok(Self::ReadWrite),
            other => Err(BootstrapError::unsupported(format!(
                "unsupported access mode '{other}'; expected one of: automatic, read_only, read_write"
            ))),
        }
    }

    /// Returns the attach keyword for this mode, or `None` for automatic.
    #[must_use]
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Automatic => None,
            Self::ReadOnly => Some("READ_ONLY"),
            Self::ReadWrite => Some("READ_WRITE"),
        }
    }

    /// Parses an attach keyword back into a mode.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("READ_ONLY") {
            Some(Self::ReadOnly)
        } else if keyword.eq_ignore_ascii_case("READ_WRITE") {
            Some(Self::ReadWrite)
        } else {
            None
        }
    }
}

/// A typed literal passed through to the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// SQL `NULL`.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// String literal.
    Text(String),
}

impl ParamValue {
    /// Renders the value as a SQL literal.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Boolean(true) => "TRUE".to_string(),
            Self::Boolean(false) => "FALSE".to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Text(s) => quote_literal(s),
        }
    }

    /// Returns the value as text if it is a string literal.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn expect_text(&self, key: &str) -> Result<&str> {
        self.as_text().ok_or_else(|| {
            BootstrapError::unsupported(format!("option {key} expects a string, got {self}"))
        })
    }

    fn expect_bool(&self, key: &str) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            Self::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Self::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(BootstrapError::unsupported(format!(
                "option {key} expects a boolean, got {self}"
            ))),
        }
    }

    fn expect_u64(&self, key: &str) -> Result<u64> {
        let parsed = match self {
            Self::Integer(v) => u64::try_from(*v).ok(),
            Self::Text(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            BootstrapError::unsupported(format!(
                "option {key} expects a non-negative integer, got {self}"
            ))
        })
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Snapshot requested with the attach (`AT (VERSION => ..)` / `AT (TIMESTAMP => ..)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSelector {
    /// A specific snapshot id.
    Version(SnapshotId),
    /// The latest snapshot committed at or before the timestamp.
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for SnapshotSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(id) => write!(f, "version {id}"),
            Self::Timestamp(ts) => write!(f, "timestamp {}", ts.to_rfc3339()),
        }
    }
}

/// Key/value overlay of configuration options.
pub type ConfigOverlay = HashMap<String, String>;

/// Configuration of one attached lake.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LakeOptions {
    /// Name the lake is attached under.
    pub lake_name: String,
    /// Path (or connection string) of the metadata database.
    pub metadata_path: String,
    /// Logical name the metadata database is attached as.
    pub metadata_database: String,
    /// Schema inside the metadata database; empty until resolved.
    pub metadata_schema: String,
    /// Access mode for the metadata database.
    pub access_mode: AccessMode,
    /// Parameters forwarded to the metadata store, in attach order.
    pub metadata_parameters: IndexMap<String, ParamValue>,
    /// Root location of the data files; empty until resolved.
    pub data_path: String,
    /// Maximum rows inlined into the metadata store; 0 disables inlining.
    pub data_inlining_row_limit: u64,
    /// Requested encryption mode.
    pub encryption: Encryption,
    /// Snapshot to open, if not the latest.
    pub at_clause: Option<SnapshotSelector>,
    /// Global config overlay (all persisted lake tags).
    #[serde(skip)]
    pub config_options: ConfigOverlay,
    /// Per-schema config overlay.
    #[serde(skip)]
    pub schema_options: HashMap<SchemaId, ConfigOverlay>,
    /// Per-table config overlay.
    #[serde(skip)]
    pub table_options: HashMap<TableId, ConfigOverlay>,
}

impl LakeOptions {
    /// Creates options for `lake_name` backed by the metadata database at
    /// `metadata_path`.
    #[must_use]
    pub fn new(lake_name: impl Into<String>, metadata_path: impl Into<String>) -> Self {
        let lake_name = lake_name.into();
        Self {
            metadata_database: default_metadata_database(&lake_name),
            lake_name,
            metadata_path: metadata_path.into(),
            ..Self::default()
        }
    }

    /// Builds options from an ordered list of attach parameters.
    ///
    /// Recognized keys (case-insensitive):
    /// - `ACCESS_MODE`, `READ_ONLY`
    /// - `METADATA_SCHEMA`, `METADATA_CATALOG`
    /// - `DATA_PATH`, `DATA_INLINING_ROW_LIMIT`, `ENCRYPTED`
    /// - `SNAPSHOT_VERSION`, `SNAPSHOT_TIME` (RFC 3339)
    /// - `META_<KEY>`: forwarded to the metadata store as `<KEY>`
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnsupportedConfiguration`] for unknown keys,
    /// mistyped values, or conflicting snapshot selectors.
    pub fn from_parameters<I, K>(
        lake_name: impl Into<String>,
        metadata_path: impl Into<String>,
        parameters: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        let mut options = Self::new(lake_name, metadata_path);
        for (key, value) in parameters {
            options.apply_parameter(key.as_ref(), value)?;
        }
        Ok(options)
    }

    fn apply_parameter(&mut self, raw_key: &str, value: ParamValue) -> Result<()> {
        let key = raw_key.trim().to_ascii_uppercase();
        match key.as_str() {
            "ACCESS_MODE" => self.access_mode = AccessMode::parse(value.expect_text(&key)?)?,
            "READ_ONLY" => {
                if value.expect_bool(&key)? {
                    self.access_mode = AccessMode::ReadOnly;
                }
            }
            "METADATA_SCHEMA" => self.metadata_schema = value.expect_text(&key)?.to_string(),
            "METADATA_CATALOG" => self.metadata_database = value.expect_text(&key)?.to_string(),
            "DATA_PATH" => self.data_path = value.expect_text(&key)?.to_string(),
            "DATA_INLINING_ROW_LIMIT" => self.data_inlining_row_limit = value.expect_u64(&key)?,
            "ENCRYPTED" => {
                self.encryption = if value.expect_bool(&key)? {
                    Encryption::Encrypted
                } else {
                    Encryption::Unencrypted
                };
            }
            "SNAPSHOT_VERSION" => {
                let id = SnapshotId::new(value.expect_u64(&key)?);
                self.set_snapshot(SnapshotSelector::Version(id))?;
            }
            "SNAPSHOT_TIME" => {
                let raw = value.expect_text(&key)?;
                let ts = DateTime::parse_from_rfc3339(raw).map_err(|e| {
                    BootstrapError::unsupported(format!(
                        "option {key} expects an RFC 3339 timestamp, got '{raw}': {e}"
                    ))
                })?;
                self.set_snapshot(SnapshotSelector::Timestamp(ts.with_timezone(&Utc)))?;
            }
            _ if key.starts_with(METADATA_PARAMETER_PREFIX) => {
                // Uppercasing is ASCII-only, so the prefix length is a valid boundary.
                let stripped = &raw_key.trim()[METADATA_PARAMETER_PREFIX.len()..];
                validate_option_key(stripped)?;
                self.metadata_parameters.insert(stripped.to_string(), value);
            }
            _ => return Err(unknown_option(raw_key)),
        }
        Ok(())
    }

    fn set_snapshot(&mut self, selector: SnapshotSelector) -> Result<()> {
        if self.at_clause.is_some() {
            return Err(BootstrapError::unsupported(
                "only one of SNAPSHOT_VERSION and SNAPSHOT_TIME may be specified",
            ));
        }
        self.at_clause = Some(selector);
        Ok(())
    }

    /// Returns true if the caller supplied a data path.
    #[must_use]
    pub fn has_data_path(&self) -> bool {
        !self.data_path.is_empty()
    }
}

/// Returns the default logical name of a lake's metadata database.
#[must_use]
pub fn default_metadata_database(lake_name: &str) -> String {
    format!("{METADATA_DATABASE_PREFIX}{lake_name}")
}

fn unknown_option(key: &str) -> BootstrapError {
    BootstrapError::unsupported(format!(
        "unrecognized attach option '{key}' (metadata store options must be prefixed with {METADATA_PARAMETER_PREFIX})"
    ))
}

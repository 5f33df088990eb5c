//! Storage location parsing for lake data roots.
//!
//! A lake's data root is a free-form string supplied by the user: a local
//! directory (`/data/lake`), a `file://` URI, or an object-store URI
//! (`s3://bucket/lake`). This module classifies such strings so the catalog can
//! decide which storage capability must be available and which path separator
//! the root uses.
//!
//! Remote locations always use `/`. Local locations use the platform separator.

use std::fmt;

/// Storage capability required to reach a remote location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageCapability {
    /// S3-compatible object storage (`s3://`, `s3a://`, `s3n://`, `r2://`).
    S3,
    /// Google Cloud Storage (`gs://`, `gcs://`).
    Gcs,
    /// Azure Blob / ADLS (`az://`, `azure://`, `abfs://`, `abfss://`).
    Azure,
    /// Plain HTTP(S) reads (`http://`, `https://`).
    Http,
    /// Hugging Face datasets (`hf://`).
    HuggingFace,
}

impl StorageCapability {
    /// Returns the canonical capability name used in configuration and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::Azure => "azure",
            Self::Http => "http",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Maps a URI scheme (without `://`) to the capability that serves it.
    ///
    /// Returns `None` for local schemes and unknown schemes.
    #[must_use]
    pub fn for_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "s3" | "s3a" | "s3n" | "r2" => Some(Self::S3),
            "gs" | "gcs" => Some(Self::Gcs),
            "az" | "azure" | "abfs" | "abfss" => Some(Self::Azure),
            "http" | "https" => Some(Self::Http),
            "hf" => Some(Self::HuggingFace),
            _ => None,
        }
    }
}

impl fmt::Display for StorageCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLocation<'a> {
    /// A path on the local filesystem (including `file://` URIs).
    Local(&'a str),
    /// An object-store or HTTP location served by a capability.
    Remote {
        /// URI scheme without the `://` suffix.
        scheme: &'a str,
        /// Capability required to access the location.
        capability: StorageCapability,
    },
}

impl<'a> StorageLocation<'a> {
    /// Classifies a raw location string.
    ///
    /// Strings with an unrecognized scheme are treated as local paths; the
    /// storage layer reports them when they are first accessed.
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        if let Some(scheme) = uri_scheme(raw) {
            if let Some(capability) = StorageCapability::for_scheme(scheme) {
                return Self::Remote { scheme, capability };
            }
        }
        Self::Local(raw)
    }

    /// Returns the capability that must be present to use this location.
    #[must_use]
    pub const fn required_capability(&self) -> Option<StorageCapability> {
        match self {
            Self::Local(_) => None,
            Self::Remote { capability, .. } => Some(*capability),
        }
    }

    /// Returns the path separator used by this location.
    #[must_use]
    pub const fn separator(&self) -> char {
        match self {
            Self::Local(_) => std::path::MAIN_SEPARATOR,
            Self::Remote { .. } => '/',
        }
    }

    /// Returns true if the location is a remote URI.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// Returns the scheme of `raw` if it looks like `scheme://...`.
fn uri_scheme(raw: &str) -> Option<&str> {
    let (scheme, _) = raw.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
    valid.then_some(scheme)
}

/// Returns true if `path` is absolute (a URI, a rooted path, or a drive path).
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    if uri_scheme(path).is_some() || path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Returns the directory portion of `path`, including the trailing separator.
///
/// Returns an empty string when `path` has no directory component.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rfind(['/', '\\']).map_or("", |idx| &path[..=idx])
}

/// Joins a relative path onto a directory, inserting `separator` if needed.
#[must_use]
pub fn join(dir: &str, relative: &str, separator: char) -> String {
    if dir.is_empty() {
        return relative.to_string();
    }
    if dir.ends_with(['/', '\\']) {
        format!("{dir}{relative}")
    } else {
        format!("{dir}{separator}{relative}")
    }
}

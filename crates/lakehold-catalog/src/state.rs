//! In-memory catalog state resolved during bootstrap.

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

/// Encryption mode of the lake's data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Not decided yet; resolved during bootstrap.
    #[default]
    Automatic,
    /// Data files are encrypted.
    Encrypted,
    /// Data files are written in plain text.
    Unencrypted,
}

impl Encryption {
    /// Parses an encryption mode (`automatic`, `encrypted`, `unencrypted`,
    /// or a boolean literal).
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnsupportedConfiguration`] for any other value.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "automatic" | "auto" => Ok(Self::Automatic),
            "encrypted" | "true" => Ok(Self::Encrypted),
            "unencrypted" | "false" => Ok(Self::Unencrypted),
            other => Err(BootstrapError::unsupported(format!(
                "unknown encryption mode '{other}'; expected one of: automatic, encrypted, unencrypted"
            ))),
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Encrypted => "encrypted",
            Self::Unencrypted => "unencrypted",
        }
    }

    /// Returns true once the mode is no longer automatic.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Automatic)
    }
}

impl std::fmt::Display for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog-wide state owned by the attached session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    encryption: Encryption,
    separator: Option<char>,
}

impl CatalogState {
    /// Creates state with the requested encryption mode.
    #[must_use]
    pub const fn new(encryption: Encryption) -> Self {
        Self {
            encryption,
            separator: None,
        }
    }

    /// Returns the current encryption mode.
    #[must_use]
    pub const fn encryption(&self) -> Encryption {
        self.encryption
    }

    /// Sets the encryption mode.
    pub fn set_encryption(&mut self, encryption: Encryption) {
        self.encryption = encryption;
    }

    /// Returns the resolved path separator, defaulting to `/` until a data
    /// path has been normalized.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator.unwrap_or('/')
    }

    /// Returns the separator only if a data path has been normalized.
    #[must_use]
    pub const fn resolved_separator(&self) -> Option<char> {
        self.separator
    }

    /// Records the separator of the normalized data path.
    pub fn set_separator(&mut self, separator: char) {
        self.separator = Some(separator);
    }
}

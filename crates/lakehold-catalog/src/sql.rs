//! Typed statements sent to the metadata store.
//!
//! The bootstrap only ever issues two statements of its own: the attach of the
//! metadata database and the existence probe. Both are modelled as small
//! structs that render themselves to SQL, with every identifier passed through
//! [`quote_identifier`] and every value through [`quote_literal`]. Option keys
//! are restricted to bare identifiers so they can be emitted unquoted.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{BootstrapError, Result};
use crate::options::{AccessMode, ParamValue};

/// Table-name prefix shared by every internal lake table in the metadata store.
pub const INTERNAL_TABLE_PREFIX: &str = "lakehold_";

/// Quotes an identifier for SQL (`"name"`, embedded quotes doubled).
#[must_use]
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quotes a string literal for SQL (`'value'`, embedded quotes doubled).
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escapes `\`, `%` and `_` for use inside a `LIKE ... ESCAPE '\'` pattern.
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns true if `key` is a bare identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_bare_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates an attach option key.
///
/// # Errors
///
/// Returns [`BootstrapError::UnsupportedConfiguration`] if the key is not a
/// bare identifier.
pub fn validate_option_key(key: &str) -> Result<()> {
    if is_bare_identifier(key) {
        Ok(())
    } else {
        Err(BootstrapError::unsupported(format!(
            "invalid metadata store option name '{key}' (allowed: letters, digits, '_')"
        )))
    }
}

/// Options clause of the attach statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Access mode keyword, emitted first unless automatic.
    pub access_mode: AccessMode,
    /// Metadata store parameters, emitted in insertion order.
    pub parameters: IndexMap<String, ParamValue>,
}

impl AttachOptions {
    /// Builds the options for an access mode and parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnsupportedConfiguration`] if a parameter
    /// key is not a bare identifier.
    pub fn new(access_mode: AccessMode, parameters: &IndexMap<String, ParamValue>) -> Result<Self> {
        for key in parameters.keys() {
            validate_option_key(key)?;
        }
        Ok(Self {
            access_mode,
            parameters: parameters.clone(),
        })
    }

    /// Returns true if rendering would produce no clause.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_mode.keyword().is_none() && self.parameters.is_empty()
    }

    /// Renders the parenthesized option clause, or an empty string when there
    /// are no options.
    #[must_use]
    pub fn clause(&self) -> String {
        let mut items: Vec<String> = Vec::with_capacity(self.parameters.len() + 1);
        if let Some(keyword) = self.access_mode.keyword() {
            items.push(keyword.to_string());
        }
        for (key, value) in &self.parameters {
            items.push(format!("{key} {}", value.to_sql_literal()));
        }
        if items.is_empty() {
            return String::new();
        }
        format!("({})", items.join(", "))
    }

    /// Parses a clause produced by [`Self::clause`].
    ///
    /// An empty string yields the default (automatic, no parameters).
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnsupportedConfiguration`] if the clause is
    /// not well formed.
    pub fn parse(clause: &str) -> Result<Self> {
        let clause = clause.trim();
        if clause.is_empty() {
            return Ok(Self::default());
        }
        let inner = clause
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| malformed_clause(clause, "missing parentheses"))?;

        let mut options = Self::default();
        for (index, item) in split_items(inner)
            .map_err(|reason| malformed_clause(clause, reason))?
            .into_iter()
            .enumerate()
        {
            let item = item.trim();
            if index == 0 {
                if let Some(mode) = AccessMode::from_keyword(item) {
                    options.access_mode = mode;
                    continue;
                }
            }
            let (key, raw_value) = item
                .split_once(char::is_whitespace)
                .ok_or_else(|| malformed_clause(clause, "option without a value"))?;
            validate_option_key(key)?;
            let value = parse_literal(raw_value.trim())
                .ok_or_else(|| malformed_clause(clause, "invalid literal"))?;
            options.parameters.insert(key.to_string(), value);
        }
        Ok(options)
    }
}

impl fmt::Display for AttachOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clause())
    }
}

/// Splits on commas that are not inside a string literal.
fn split_items(inner: &str) -> std::result::Result<Vec<&str>, &'static str> {
    let mut items = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (idx, c) in inner.char_indices() {
        match c {
            // A doubled quote toggles twice and stays inside the literal.
            '\'' => in_string = !in_string,
            ',' if !in_string => {
                items.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if in_string {
        return Err("unterminated string literal");
    }
    items.push(&inner[start..]);
    Ok(items)
}

fn parse_literal(raw: &str) -> Option<ParamValue> {
    if let Some(body) = raw.strip_prefix('\'') {
        let body = body.strip_suffix('\'')?;
        // Single quotes inside the body must come in pairs.
        if body.replace("''", "").contains('\'') {
            return None;
        }
        return Some(ParamValue::Text(body.replace("''", "'")));
    }
    if raw.eq_ignore_ascii_case("NULL") {
        return Some(ParamValue::Null);
    }
    if raw.eq_ignore_ascii_case("TRUE") {
        return Some(ParamValue::Boolean(true));
    }
    if raw.eq_ignore_ascii_case("FALSE") {
        return Some(ParamValue::Boolean(false));
    }
    raw.parse::<i64>().ok().map(ParamValue::Integer)
}

fn malformed_clause(clause: &str, reason: &str) -> BootstrapError {
    BootstrapError::unsupported(format!("malformed attach options {clause}: {reason}"))
}

/// `ATTACH '<path>' AS "<alias>" (<options>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachStatement {
    /// Path or connection string of the metadata database.
    pub path: String,
    /// Logical name the database is attached as.
    pub alias: String,
    /// Option clause.
    pub options: AttachOptions,
}

impl AttachStatement {
    /// Renders the statement as SQL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "ATTACH {} AS {}",
            quote_literal(&self.path),
            quote_identifier(&self.alias)
        );
        if !self.options.is_empty() {
            sql.push(' ');
            sql.push_str(&self.options.clause());
        }
        sql
    }
}

impl fmt::Display for AttachStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Counts internal lake tables in one schema of the metadata database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistenceProbe {
    /// Logical name of the attached metadata database.
    pub database: String,
    /// Schema to look in.
    pub schema: String,
    /// Table-name prefix identifying internal tables.
    pub table_prefix: String,
}

impl ExistenceProbe {
    /// Creates a probe for the standard internal-table prefix.
    #[must_use]
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table_prefix: INTERNAL_TABLE_PREFIX.to_string(),
        }
    }

    /// Returns true if `table_name` follows the internal naming convention.
    #[must_use]
    pub fn matches(&self, table_name: &str) -> bool {
        table_name.starts_with(&self.table_prefix)
    }

    /// Renders the probe as SQL against `information_schema.tables`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_catalog = {} AND table_schema = {} AND table_name LIKE {} ESCAPE '\\'",
            quote_literal(&self.database),
            quote_literal(&self.schema),
            quote_literal(&format!("{}%", escape_like(&self.table_prefix))),
        )
    }
}

//! Position table name validation
//!
//! The table is configuration, not request input, but it is the one
//! piece of SQL text not sent as a bound parameter, so it is held to a
//! strict dotted-identifier format and always emitted quoted.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for a (possibly qualified) table name: three 63-byte
/// PostgreSQL identifiers plus two dots.
pub(crate) const MAX_TABLE_NAME_LEN: usize = 191;

/// One to three identifiers separated by dots: `table`, `schema.table`,
/// `database.schema.table`.
static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(\.[A-Za-z_][A-Za-z0-9_]{0,62}){0,2}$")
        .expect("invalid table name regex")
});

/// Validated, possibly schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(Vec<String>);

impl TableName {
    /// Parse a dotted table name.
    ///
    /// # Example
    /// ```
    /// use vesseltrack_server::models::TableName;
    ///
    /// let table = TableName::new("spire.vessel").unwrap();
    /// assert_eq!(table.quoted(), r#""spire"."vessel""#);
    /// assert!(TableName::new("vessel; DROP TABLE vessel").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "table name" });
        }

        if s.len() > MAX_TABLE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "table name",
                max: MAX_TABLE_NAME_LEN,
            });
        }

        if !TABLE_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "table name",
                reason: "must be one to three dot-separated identifiers of letters, digits and underscores",
            });
        }

        Ok(Self(s.split('.').map(str::to_owned).collect()))
    }

    /// Render as a quoted SQL identifier, e.g. `"spire"."vessel"`.
    ///
    /// Quoting preserves case, so `Spire.Vessel` addresses `"Spire"."Vessel"`.
    pub fn quoted(&self) -> String {
        self.0
            .iter()
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(vec!["spire".to_owned(), "vessel".to_owned()])
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl std::str::FromStr for TableName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

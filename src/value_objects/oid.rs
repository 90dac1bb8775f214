//! Oid value object for schema element identifiers.
//!
//! Object identifiers name attribute types and object classes. They are
//! compared textually, so the canonical form is enforced at construction.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated dotted-decimal object identifier.
///
/// ## Validation Rules
///
/// - At least two arcs separated by `.`
/// - Every arc is a non-empty run of ASCII digits without leading zeros
/// - The first arc is 0, 1 or 2
///
/// ## Examples
///
/// ```rust
/// use ldap_schema_harness::value_objects::Oid;
///
/// let oid = Oid::new("1.2.840.113556.1.5.9940").unwrap();
/// assert_eq!(oid.arcs().count(), 7);
/// assert!(Oid::new("1.2.840.").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(String);

impl Oid {
    /// Create a new Oid with validation.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        Self::validate_format(&value)?;
        Ok(Self(value))
    }

    /// Get the string representation of the Oid.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the numeric arcs of the identifier.
    pub fn arcs(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Whether this identifier lies under `prefix` (or equals it).
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0 == prefix.0 || self.0.starts_with(&format!("{}.", prefix.0))
    }

    fn validate_format(value: &str) -> ValidationResult<()> {
        let invalid = || ValidationError::InvalidOid {
            value: value.to_string(),
        };

        let arcs: Vec<&str> = value.split('.').collect();
        if arcs.len() < 2 {
            return Err(invalid());
        }

        for arc in &arcs {
            if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            if arc.len() > 1 && arc.starts_with('0') {
                return Err(invalid());
            }
        }

        if !matches!(arcs[0], "0" | "1" | "2") {
            return Err(invalid());
        }

        Ok(())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Oid {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Oid {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for Oid {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl Serialize for Oid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

//! Distinguished name value object.
//!
//! Directory entries are addressed by DNs such as
//! `CN=test-Attr,CN=Schema,CN=Configuration,DC=example,DC=com`. Attribute types
//! and values compare case-insensitively, so equality and hashing use a
//! normalized form while `Display` preserves what the caller wrote.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Characters that must be escaped inside an RDN value.
const SPECIAL: &[char] = &[',', '+', '"', '\\', '<', '>', ';', '='];

/// A single relative distinguished name component (`attr=value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    attribute: String,
    value: String,
}

impl Rdn {
    /// Attribute type as written (e.g. `CN`).
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unescaped attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }

    fn normalized(&self) -> String {
        format!(
            "{}={}",
            self.attribute.to_ascii_lowercase(),
            self.value.to_lowercase()
        )
    }
}

/// A validated distinguished name.
///
/// The empty DN addresses the root DSE.
///
/// ```rust
/// use ldap_schema_harness::value_objects::Dn;
///
/// let schema = Dn::new("CN=Schema,CN=Configuration,DC=example,DC=com").unwrap();
/// let attr = schema.child("CN", "test-Attr");
/// assert_eq!(attr.parent(), Some(schema.clone()));
/// assert!(attr.is_descendant_of(&schema));
/// assert_eq!(attr, Dn::new("cn=TEST-ATTR,cn=schema,cn=configuration,dc=EXAMPLE,dc=com").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Dn {
    raw: String,
    rdns: Vec<Rdn>,
}

impl Dn {
    /// Parse and validate a DN.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let raw = value.into();
        let rdns = Self::parse(&raw)?;
        Ok(Self { raw, rdns })
    }

    /// The root DSE (empty DN).
    pub fn root() -> Self {
        Self {
            raw: String::new(),
            rdns: Vec::new(),
        }
    }

    /// Whether this is the root DSE.
    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The DN as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Leftmost RDN, `None` for the root DSE.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// Number of RDN components.
    pub fn depth(&self) -> usize {
        self.rdns.len()
    }

    /// Parent DN, `None` for the root DSE. The parent of a single-component DN
    /// is the root DSE.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            return None;
        }
        let rdns = self.rdns[1..].to_vec();
        Some(Self {
            raw: Self::render(&rdns),
            rdns,
        })
    }

    /// Build the DN of a child entry, escaping the value as needed.
    pub fn child(&self, attribute: &str, value: &str) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(Rdn {
            attribute: attribute.to_string(),
            value: value.to_string(),
        });
        rdns.extend(self.rdns.iter().cloned());

        let head = format!("{}={}", attribute, escape_value(value));
        let raw = if self.raw.is_empty() {
            head
        } else {
            format!("{},{}", head, self.raw)
        };
        Self { raw, rdns }
    }

    /// Whether `self` is the immediate child of `parent`.
    pub fn is_child_of(&self, parent: &Dn) -> bool {
        self.rdns.len() == parent.rdns.len() + 1 && self.is_descendant_of(parent)
    }

    /// Whether `self` lies strictly below `ancestor`. Every non-root DN
    /// descends from the root DSE.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        if self.rdns.len() <= ancestor.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - ancestor.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(&ancestor.rdns)
            .all(|(a, b)| a.normalized() == b.normalized())
    }

    /// Case-folded form used for comparisons and map keys.
    pub fn normalized(&self) -> String {
        self.rdns
            .iter()
            .map(Rdn::normalized)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn render(rdns: &[Rdn]) -> String {
        rdns.iter()
            .map(|rdn| format!("{}={}", rdn.attribute, escape_value(&rdn.value)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn parse(raw: &str) -> ValidationResult<Vec<Rdn>> {
        let invalid = |details: &str| ValidationError::InvalidDn {
            value: raw.to_string(),
            details: details.to_string(),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut rdns = Vec::new();
        for component in split_unescaped(raw, ',') {
            let Some((attribute, value)) = component.split_once('=') else {
                return Err(invalid("component without '='"));
            };
            let attribute = attribute.trim();
            if attribute.is_empty()
                || !attribute
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            {
                return Err(invalid("malformed attribute type"));
            }
            let value = unescape_value(value).ok_or_else(|| invalid("bad escape"))?;
            if value.is_empty() {
                return Err(invalid("empty attribute value"));
            }
            rdns.push(Rdn {
                attribute: attribute.to_string(),
                value,
            });
        }
        Ok(rdns)
    }
}

fn split_unescaped(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&input[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (idx, c) in value.chars().enumerate() {
        let edge_space = c == ' ' && (idx == 0 || idx == last);
        if SPECIAL.contains(&c) || edge_space || (c == '#' && idx == 0) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Decode an RDN value. Hex pairs (`\2C`) become raw bytes and the result
/// must be valid UTF-8. Unescaped surrounding whitespace is dropped, escaped
/// spaces are kept.
fn unescape_value(value: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(value.len());
    // Length that trailing whitespace trimming must not cut into.
    let mut kept = 0;
    let mut chars = value.trim_start().chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let next = chars.next()?;
            if next.is_ascii_hexdigit() {
                let low = chars.next().filter(char::is_ascii_hexdigit)?;
                let high = next.to_digit(16)?;
                let low = low.to_digit(16)?;
                bytes.push((high * 16 + low) as u8);
            } else {
                bytes.extend_from_slice(next.encode_utf8(&mut [0; 4]).as_bytes());
            }
            kept = bytes.len();
        } else {
            bytes.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
        }
    }
    while bytes.len() > kept && bytes.last().is_some_and(u8::is_ascii_whitespace) {
        bytes.pop();
    }
    String::from_utf8(bytes).ok()
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns.len() == other.rdns.len()
            && self
                .rdns
                .iter()
                .zip(&other.rdns)
                .all(|(a, b)| a.normalized() == b.normalized())
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Dn {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Dn {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl Serialize for Dn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

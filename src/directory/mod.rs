//! Directory collaborator abstraction.
//!
//! The harness never talks a wire protocol itself. It drives any directory that
//! implements [`DirectoryClient`]: the four LDAP update/read operations, each
//! returning structured entries or a classified [`DirectoryError`].
//!
//! # Architecture
//!
//! The directory is responsible for:
//! - Storing entries and enforcing its own schema rules
//! - Assigning server-owned attributes (`schemaIDGUID`, `msDS-IntId`, ...)
//! - Publishing schema changes when asked to (`schemaUpdateNow`)
//!
//! The directory is NOT responsible for:
//! - Deciding whether a scenario passed
//! - Pre-validating definitions before they are written
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_schema_harness::directory::{DirectoryClient, InMemoryDirectory, SearchRequest};
//! use ldap_schema_harness::config::DirectoryConfig;
//! use ldap_schema_harness::value_objects::Dn;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new(DirectoryConfig::default())?;
//! let root = directory
//!     .search(SearchRequest::base(Dn::root()).with_attributes(["schemaNamingContext"]))
//!     .await?;
//! assert_eq!(root.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod in_memory;


pub use filter::{Filter, FilterError};
pub use in_memory::InMemoryDirectory;

use crate::error::DirectoryResult;
use crate::value_objects::Dn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Attribute names the harness reads or writes.
pub mod attrs {
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const CN: &str = "cn";
    pub const NAME: &str = "name";
    pub const DISTINGUISHED_NAME: &str = "distinguishedName";
    pub const INSTANCE_TYPE: &str = "instanceType";
    pub const OBJECT_CATEGORY: &str = "objectCategory";
    pub const WHEN_CREATED: &str = "whenCreated";

    pub const LDAP_DISPLAY_NAME: &str = "lDAPDisplayName";
    pub const ATTRIBUTE_ID: &str = "attributeID";
    pub const GOVERNS_ID: &str = "governsID";
    pub const ATTRIBUTE_SYNTAX: &str = "attributeSyntax";
    pub const OM_SYNTAX: &str = "oMSyntax";
    pub const IS_SINGLE_VALUED: &str = "isSingleValued";
    pub const SYSTEM_ONLY: &str = "systemOnly";
    pub const SYSTEM_FLAGS: &str = "systemFlags";
    pub const MS_DS_INT_ID: &str = "msDS-IntId";
    pub const SCHEMA_ID_GUID: &str = "schemaIDGUID";
    pub const SUB_CLASS_OF: &str = "subClassOf";
    pub const DEFAULT_OBJECT_CATEGORY: &str = "defaultObjectCategory";
    pub const OBJECT_CLASS_CATEGORY: &str = "objectClassCategory";
    pub const RDN_ATT_ID: &str = "rDNAttID";
    pub const SYSTEM_MUST_CONTAIN: &str = "systemMustContain";
    pub const SYSTEM_MAY_CONTAIN: &str = "systemMayContain";
    pub const SYSTEM_AUXILIARY_CLASS: &str = "systemAuxiliaryClass";

    pub const SCHEMA_NAMING_CONTEXT: &str = "schemaNamingContext";
    pub const DEFAULT_NAMING_CONTEXT: &str = "defaultNamingContext";
    pub const CONFIGURATION_NAMING_CONTEXT: &str = "configurationNamingContext";
    pub const FOREST_FUNCTIONALITY: &str = "forestFunctionality";
    pub const DOMAIN_FUNCTIONALITY: &str = "domainFunctionality";
    pub const SCHEMA_UPDATE_NOW: &str = "schemaUpdateNow";

    pub const OBJECT_CLASSES: &str = "objectClasses";
    pub const ATTRIBUTE_TYPES: &str = "attributeTypes";
    pub const DIT_CONTENT_RULES: &str = "dITContentRules";
    pub const EXTENDED_ATTRIBUTE_INFO: &str = "extendedAttributeInfo";
    pub const EXTENDED_CLASS_INFO: &str = "extendedClassInfo";
}

/// A named, ordered, multi-valued attribute of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

/// A directory entry: a DN plus attributes in insertion order.
///
/// Attribute names are matched case-insensitively; value order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    dn: Dn,
    attributes: Vec<Attribute>,
}

impl Entry {
    /// Create an entry with no attributes.
    pub fn new(dn: Dn) -> Self {
        Self {
            dn,
            attributes: Vec::new(),
        }
    }

    /// Builder-style helper appending values to an attribute.
    pub fn with<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_values(name, values);
        self
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Values of an attribute, empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.get(name).map(|attr| attr.values.as_slice()).unwrap_or(&[])
    }

    /// First value of an attribute.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether the attribute holds `value`, compared case-insensitively.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.values(name)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Replace all values of an attribute. An empty value list removes it.
    pub fn set<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.remove(name);
            return;
        }
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.values = values,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                values,
            }),
        }
    }

    /// Append values to an attribute, creating it if needed.
    pub fn add_values<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into);
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.values.extend(values),
            None => {
                let values: Vec<String> = values.collect();
                if !values.is_empty() {
                    self.attributes.push(Attribute {
                        name: name.to_string(),
                        values,
                    });
                }
            }
        }
    }

    /// Remove an attribute, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let idx = self
            .attributes
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(idx))
    }

    /// Copy of this entry restricted to attributes accepted by `keep`.
    pub fn project(&self, keep: impl Fn(&str) -> bool) -> Entry {
        Entry {
            dn: self.dn.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|attr| keep(&attr.name))
                .cloned()
                .collect(),
        }
    }
}

/// Kind of change applied to one attribute by a modify request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModificationOp {
    Add,
    Replace,
    Delete,
}

impl fmt::Display for ModificationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModificationOp::Add => "add",
            ModificationOp::Replace => "replace",
            ModificationOp::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// One attribute change in a modify request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub op: ModificationOp,
    pub attribute: String,
    pub values: Vec<String>,
}

impl Modification {
    pub fn new<I, S>(op: ModificationOp, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op,
            attribute: attribute.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add<I, S>(attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ModificationOp::Add, attribute, values)
    }

    pub fn replace<I, S>(attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ModificationOp::Replace, attribute, values)
    }

    /// Delete specific values, or the whole attribute when `values` is empty.
    pub fn delete<I, S>(attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ModificationOp::Delete, attribute, values)
    }

    /// Whether this change touches `name`, ignoring case.
    pub fn targets(&self, name: &str) -> bool {
        self.attribute.eq_ignore_ascii_case(name)
    }
}

/// Search scope relative to the base DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchScope {
    Base,
    OneLevel,
    Subtree,
}

/// A search request: base, scope, filter and requested attributes.
///
/// An empty attribute list or `*` requests all user attributes. Operational
/// and generated attributes are returned only when named explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub base: Dn,
    pub scope: SearchScope,
    pub filter: Filter,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: Dn, scope: SearchScope) -> Self {
        Self {
            base,
            scope,
            filter: Filter::MatchAll,
            attributes: Vec::new(),
        }
    }

    /// Base-scope search of a single entry.
    pub fn base(dn: Dn) -> Self {
        Self::new(dn, SearchScope::Base)
    }

    pub fn one_level(dn: Dn) -> Self {
        Self::new(dn, SearchScope::OneLevel)
    }

    pub fn subtree(dn: Dn) -> Self {
        Self::new(dn, SearchScope::Subtree)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the request asks for every user attribute.
    pub fn wants_all_user_attributes(&self) -> bool {
        self.attributes.is_empty() || self.attributes.iter().any(|a| a == "*")
    }

    /// Whether `name` was requested by name (wildcards do not count).
    pub fn names_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Core trait for directory collaborators.
///
/// Each call suspends the calling task until the directory answers. Failures
/// are always classified into a [`crate::error::ViolationKind`].
pub trait DirectoryClient: Send + Sync {
    /// Search for entries.
    ///
    /// Fails with `NoSuchObject` when the base entry does not exist.
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = DirectoryResult<Vec<Entry>>> + Send;

    /// Add a new entry.
    fn add(&self, entry: Entry) -> impl Future<Output = DirectoryResult<()>> + Send;

    /// Apply a list of changes to an entry atomically.
    fn modify(
        &self,
        dn: Dn,
        changes: Vec<Modification>,
    ) -> impl Future<Output = DirectoryResult<()>> + Send;

    /// Delete a leaf entry.
    fn delete(&self, dn: Dn) -> impl Future<Output = DirectoryResult<()>> + Send;
}

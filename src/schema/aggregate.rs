//! Aggregate schema view and consistency checks.
//!
//! The directory publishes a generated `CN=Aggregate` entry under the schema
//! naming context. Its `objectClasses`, `attributeTypes` and
//! `dITContentRules` values are operational: they come back only when asked
//! for by name.

use super::description::{
    AttributeTypeDescription, ContentRuleDescription, DescriptionError, ObjectClassDescription,
};
use super::set::SchemaSet;
use super::types::ForestState;
use crate::directory::{DirectoryClient, Entry, SearchRequest, attrs};
use crate::error::{DirectoryError, HarnessResult, ViolationKind};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Attributes generated on the aggregate entry.
pub const GENERATED_ATTRIBUTES: [&str; 5] = [
    attrs::OBJECT_CLASSES,
    attrs::ATTRIBUTE_TYPES,
    attrs::DIT_CONTENT_RULES,
    attrs::EXTENDED_ATTRIBUTE_INFO,
    attrs::EXTENDED_CLASS_INFO,
];

/// Attributes a snapshot reads.
const SNAPSHOT_ATTRIBUTES: [&str; 3] = [
    attrs::OBJECT_CLASSES,
    attrs::ATTRIBUTE_TYPES,
    attrs::DIT_CONTENT_RULES,
];

/// Parsed contents of the aggregate entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateSnapshot {
    pub object_classes: Vec<ObjectClassDescription>,
    pub attribute_types: Vec<AttributeTypeDescription>,
    pub content_rules: Vec<ContentRuleDescription>,
}

impl AggregateSnapshot {
    /// Parse the generated values of an aggregate entry.
    pub fn from_entry(entry: &Entry) -> Result<Self, DescriptionError> {
        Ok(Self {
            object_classes: entry
                .values(attrs::OBJECT_CLASSES)
                .iter()
                .map(|v| ObjectClassDescription::parse(v))
                .collect::<Result<_, _>>()?,
            attribute_types: entry
                .values(attrs::ATTRIBUTE_TYPES)
                .iter()
                .map(|v| AttributeTypeDescription::parse(v))
                .collect::<Result<_, _>>()?,
            content_rules: entry
                .values(attrs::DIT_CONTENT_RULES)
                .iter()
                .map(|v| ContentRuleDescription::parse(v))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Snapshot of the published part of a schema set, as the directory
    /// would generate it.
    pub fn from_schema(schema: &SchemaSet) -> Self {
        Self {
            object_classes: schema
                .classes()
                .map(|e| ObjectClassDescription::from_element(e, schema))
                .collect(),
            attribute_types: schema
                .attributes()
                .map(AttributeTypeDescription::from_element)
                .collect(),
            content_rules: schema
                .classes()
                .filter_map(|e| ContentRuleDescription::from_element(e, schema))
                .collect(),
        }
    }

    pub fn find_class(&self, name_or_oid: &str) -> Option<&ObjectClassDescription> {
        self.object_classes.iter().find(|class| {
            class.oid == name_or_oid || class.names.iter().any(|n| n.eq_ignore_ascii_case(name_or_oid))
        })
    }

    pub fn find_attribute(&self, name_or_oid: &str) -> Option<&AttributeTypeDescription> {
        self.attribute_types.iter().find(|attr| {
            attr.oid == name_or_oid || attr.names.iter().any(|n| n.eq_ignore_ascii_case(name_or_oid))
        })
    }
}

/// One inconsistency found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    DuplicateAttributeOid { oid: String, names: Vec<String> },
    DuplicateClassOid { oid: String, names: Vec<String> },
    UnresolvedSuperclass { class: String, superclass: String },
    UnresolvedAttribute { class: String, attribute: String },
    UnresolvedAuxiliaryClass { rule: String, auxiliary: String },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::DuplicateAttributeOid { oid, names } => {
                write!(f, "attribute OID {} is shared by {}", oid, names.join(", "))
            }
            ConsistencyIssue::DuplicateClassOid { oid, names } => {
                write!(f, "class OID {} is shared by {}", oid, names.join(", "))
            }
            ConsistencyIssue::UnresolvedSuperclass { class, superclass } => {
                write!(f, "class {} has unknown superclass {}", class, superclass)
            }
            ConsistencyIssue::UnresolvedAttribute { class, attribute } => {
                write!(f, "class {} references unknown attribute {}", class, attribute)
            }
            ConsistencyIssue::UnresolvedAuxiliaryClass { rule, auxiliary } => {
                write!(f, "content rule {} names unknown auxiliary class {}", rule, auxiliary)
            }
        }
    }
}

/// Every inconsistency found by [`assert_consistent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub issues: Vec<ConsistencyIssue>,
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aggregate schema is inconsistent")?;
        for issue in &self.issues {
            write!(f, "; {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConsistencyReport {}

/// The root of the class hierarchy, accepted as a superclass even when the
/// snapshot omits it.
const ROOT_CLASS: &str = "top";

/// Check a snapshot for internal consistency.
///
/// OIDs are unique among attribute types and among object classes; every
/// superclass, `MUST`/`MAY` attribute and content-rule auxiliary class
/// resolves within the snapshot.
pub fn assert_consistent(snapshot: &AggregateSnapshot) -> Result<(), ConsistencyReport> {
    let mut issues = Vec::new();

    for (oid, names) in duplicates(snapshot.attribute_types.iter().map(|a| (&a.oid, a.name()))) {
        issues.push(ConsistencyIssue::DuplicateAttributeOid { oid, names });
    }
    for (oid, names) in duplicates(snapshot.object_classes.iter().map(|c| (&c.oid, c.name()))) {
        issues.push(ConsistencyIssue::DuplicateClassOid { oid, names });
    }

    let class_names = known_names(snapshot.object_classes.iter().map(|c| (&c.oid, &c.names)));
    let attribute_names = known_names(snapshot.attribute_types.iter().map(|a| (&a.oid, &a.names)));

    for class in &snapshot.object_classes {
        for superclass in &class.superclasses {
            let known = superclass.eq_ignore_ascii_case(ROOT_CLASS)
                || class_names.contains(&superclass.to_lowercase());
            if !known {
                issues.push(ConsistencyIssue::UnresolvedSuperclass {
                    class: class.name().to_string(),
                    superclass: superclass.clone(),
                });
            }
        }
        for attribute in class.must.iter().chain(&class.may) {
            if !attribute_names.contains(&attribute.to_lowercase()) {
                issues.push(ConsistencyIssue::UnresolvedAttribute {
                    class: class.name().to_string(),
                    attribute: attribute.clone(),
                });
            }
        }
    }

    for rule in &snapshot.content_rules {
        for auxiliary in &rule.auxiliary {
            if !class_names.contains(&auxiliary.to_lowercase()) {
                issues.push(ConsistencyIssue::UnresolvedAuxiliaryClass {
                    rule: rule.name().to_string(),
                    auxiliary: auxiliary.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConsistencyReport { issues })
    }
}

fn duplicates<'a>(
    items: impl Iterator<Item = (&'a String, &'a str)>,
) -> Vec<(String, Vec<String>)> {
    let mut by_oid: HashMap<&str, Vec<String>> = HashMap::new();
    let mut order = Vec::new();
    for (oid, name) in items {
        let names = by_oid.entry(oid.as_str()).or_insert_with(|| {
            order.push(oid.as_str());
            Vec::new()
        });
        names.push(name.to_string());
    }
    order
        .into_iter()
        .filter_map(|oid| {
            let names = by_oid.remove(oid)?;
            (names.len() > 1).then(|| (oid.to_string(), names))
        })
        .collect()
}

fn known_names<'a>(items: impl Iterator<Item = (&'a String, &'a Vec<String>)>) -> HashSet<String> {
    let mut known = HashSet::new();
    for (oid, names) in items {
        known.insert(oid.to_lowercase());
        known.extend(names.iter().map(|n| n.to_lowercase()));
    }
    known
}

/// Read-only access to the aggregate schema of a directory.
pub struct AggregateSchemaView<'a, C> {
    client: &'a C,
    forest: &'a ForestState,
}

impl<'a, C: DirectoryClient> AggregateSchemaView<'a, C> {
    pub fn new(client: &'a C, forest: &'a ForestState) -> Self {
        Self { client, forest }
    }

    /// Read and parse the generated schema attributes of the aggregate entry.
    ///
    /// Fails with `NoSuchAttribute` when the directory does not return one of
    /// them even though it was requested.
    pub async fn snapshot(&self) -> HarnessResult<AggregateSnapshot> {
        let entry = self.read(&SNAPSHOT_ATTRIBUTES).await?;
        for name in SNAPSHOT_ATTRIBUTES {
            if !entry.contains(name) {
                return Err(DirectoryError::new(
                    ViolationKind::NoSuchAttribute,
                    format!("{} did not return {}", entry.dn(), name),
                )
                .into());
            }
        }
        let snapshot = AggregateSnapshot::from_entry(&entry)?;
        debug!(
            "Aggregate snapshot: {} classes, {} attributes, {} content rules",
            snapshot.object_classes.len(),
            snapshot.attribute_types.len(),
            snapshot.content_rules.len()
        );
        Ok(snapshot)
    }

    /// Whether a wildcard read of the aggregate entry omits every generated
    /// attribute.
    pub async fn is_operational(&self) -> HarnessResult<bool> {
        let entry = self.read(&["*"]).await?;
        Ok(GENERATED_ATTRIBUTES.iter().all(|name| !entry.contains(name)))
    }

    async fn read(&self, attributes: &[&str]) -> HarnessResult<Entry> {
        let dn = self.forest.aggregate_dn();
        let mut entries = self
            .client
            .search(SearchRequest::base(dn.clone()).with_attributes(attributes.iter().copied()))
            .await?;
        if entries.len() != 1 {
            return Err(DirectoryError::no_such_object(dn).into());
        }
        Ok(entries.remove(0))
    }
}

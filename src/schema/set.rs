//! The accepted schema element set.
//!
//! Elements are only ever appended. A publication watermark separates
//! elements that are live (usable as superclasses, must/may attributes and
//! object categories) from elements written but not yet made live by a
//! `schemaUpdateNow` barrier. Uniqueness checks always see every element.

use super::embedded;
use super::types::{ElementKind, ForestState, SchemaElementDefinition};
use crate::directory::{DirectoryClient, Filter, SearchRequest, attrs};
use crate::error::HarnessResult;
use crate::value_objects::Dn;
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// A definition the directory accepted, with its server-assigned GUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedElement {
    definition: SchemaElementDefinition,
    ldap_display_name: String,
    schema_id_guid: Uuid,
}

impl AcceptedElement {
    pub fn new(definition: SchemaElementDefinition, schema_id_guid: Uuid) -> Self {
        let ldap_display_name = definition.ldap_display_name();
        Self {
            definition,
            ldap_display_name,
            schema_id_guid,
        }
    }

    pub fn definition(&self) -> &SchemaElementDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn ldap_display_name(&self) -> &str {
        &self.ldap_display_name
    }

    pub fn kind(&self) -> ElementKind {
        self.definition.kind()
    }

    pub fn schema_id_guid(&self) -> Uuid {
        self.schema_id_guid
    }

    pub fn internal_id(&self) -> Option<i32> {
        self.definition.internal_id()
    }
}

/// Append-only set of accepted schema elements.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    elements: Vec<AcceptedElement>,
    published: usize,
    by_name: HashMap<String, usize>,
    by_oid: HashMap<String, usize>,
    internal_ids: HashMap<i32, usize>,
}

impl SchemaSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding the published bootstrap schema.
    pub fn bootstrap() -> Result<Self, serde_json::Error> {
        let mut set = Self::new();
        for definition in embedded::base_schema_definitions()? {
            set.accept(definition, Uuid::new_v4());
        }
        set.publish();
        Ok(set)
    }

    /// Load every attribute and class entry under the schema naming context.
    /// Loaded elements are treated as published.
    pub async fn load<C: DirectoryClient>(client: &C, forest: &ForestState) -> HarnessResult<Self> {
        let filter = Filter::Or(vec![
            Filter::equality(attrs::OBJECT_CLASS, "attributeSchema"),
            Filter::equality(attrs::OBJECT_CLASS, "classSchema"),
        ]);
        let entries = client
            .search(
                SearchRequest::one_level(forest.schema_naming_context.clone())
                    .with_filter(filter)
                    .with_attributes(["*"]),
            )
            .await?;

        let mut set = Self::new();
        for entry in &entries {
            match SchemaElementDefinition::from_entry(entry) {
                Ok(definition) => {
                    let guid = entry
                        .first(attrs::SCHEMA_ID_GUID)
                        .and_then(|g| Uuid::parse_str(g).ok())
                        .unwrap_or_else(Uuid::new_v4);
                    set.accept(definition, guid);
                }
                Err(e) => warn!("Skipping unreadable schema entry {}: {}", entry.dn(), e),
            }
        }
        set.publish();
        debug!("Loaded {} schema elements from {}", set.len(), forest.schema_naming_context);
        Ok(set)
    }

    /// Append an element as pending. Index entries already taken by an
    /// earlier element are left pointing at that element.
    pub fn accept(&mut self, definition: SchemaElementDefinition, schema_id_guid: Uuid) -> &AcceptedElement {
        let idx = self.elements.len();
        let element = AcceptedElement::new(definition, schema_id_guid);

        self.by_name
            .entry(element.name().to_lowercase())
            .or_insert(idx);
        self.by_name
            .entry(element.ldap_display_name().to_lowercase())
            .or_insert(idx);
        self.by_oid
            .entry(element.definition().object_identifier().as_str().to_string())
            .or_insert(idx);
        if let Some(id) = element.internal_id() {
            self.internal_ids.entry(id).or_insert(idx);
        }

        self.elements.push(element);
        &self.elements[idx]
    }

    /// Make every pending element live. Returns how many were published.
    pub fn publish(&mut self) -> usize {
        let newly = self.elements.len() - self.published;
        self.published = self.elements.len();
        newly
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.elements.len() - self.published
    }

    /// All elements, published first, in acceptance order.
    pub fn elements(&self) -> &[AcceptedElement] {
        &self.elements
    }

    pub fn published(&self) -> &[AcceptedElement] {
        &self.elements[..self.published]
    }

    fn is_published(&self, idx: usize) -> bool {
        idx < self.published
    }

    /// Find an element by common name or LDAP display name, published or not.
    pub fn find(&self, name: &str) -> Option<&AcceptedElement> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.elements[idx])
    }

    pub fn find_by_oid(&self, oid: &str) -> Option<&AcceptedElement> {
        self.by_oid.get(oid).map(|&idx| &self.elements[idx])
    }

    /// Find an element by its entry DN.
    pub fn find_by_dn(&self, forest: &ForestState, dn: &Dn) -> Option<&AcceptedElement> {
        let name = forest.element_name(dn)?;
        self.find(name)
            .filter(|element| element.name().eq_ignore_ascii_case(name))
    }

    fn resolve(&self, name_or_oid: &str, kind: ElementKind) -> Option<&AcceptedElement> {
        let idx = self
            .by_name
            .get(&name_or_oid.to_lowercase())
            .or_else(|| self.by_oid.get(name_or_oid))?;
        let element = &self.elements[*idx];
        (self.is_published(*idx) && element.kind() == kind).then_some(element)
    }

    /// Resolve a published class by name, display name or OID.
    pub fn resolve_class(&self, name_or_oid: &str) -> Option<&AcceptedElement> {
        self.resolve(name_or_oid, ElementKind::Class)
    }

    /// Resolve a published attribute by name, display name or OID.
    pub fn resolve_attribute(&self, name_or_oid: &str) -> Option<&AcceptedElement> {
        self.resolve(name_or_oid, ElementKind::Attribute)
    }

    /// Resolve the published class whose entry DN is `dn`.
    pub fn resolve_class_dn(&self, forest: &ForestState, dn: &Dn) -> Option<&AcceptedElement> {
        let name = forest.element_name(dn)?;
        self.resolve_class(name)
            .filter(|element| element.name().eq_ignore_ascii_case(name))
    }

    pub fn contains_oid(&self, oid: &str) -> bool {
        self.by_oid.contains_key(oid)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    pub fn is_internal_id_taken(&self, id: i32) -> bool {
        self.internal_ids.contains_key(&id)
    }

    pub fn internal_id_count(&self) -> usize {
        self.internal_ids.len()
    }

    /// The class and its superclasses, most derived first. Stops at a class
    /// that names itself or an unresolvable parent.
    pub fn superclass_chain(&self, class: &str) -> Vec<&AcceptedElement> {
        let mut chain: Vec<&AcceptedElement> = Vec::new();
        let mut current = self.resolve_class(class);
        while let Some(element) = current {
            if chain.iter().any(|seen| std::ptr::eq(*seen, element)) {
                break;
            }
            chain.push(element);
            current = element
                .definition()
                .parent_class()
                .and_then(|parent| self.resolve_class(parent));
        }
        chain
    }

    /// Published classes, in acceptance order.
    pub fn classes(&self) -> impl Iterator<Item = &AcceptedElement> {
        self.published()
            .iter()
            .filter(|e| e.kind() == ElementKind::Class)
    }

    /// Published attributes, in acceptance order.
    pub fn attributes(&self) -> impl Iterator<Item = &AcceptedElement> {
        self.published()
            .iter()
            .filter(|e| e.kind() == ElementKind::Attribute)
    }
}

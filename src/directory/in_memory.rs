//! In-memory reference directory.
//!
//! This module provides a thread-safe implementation of [`DirectoryClient`]
//! that behaves like a single domain controller holding the schema master
//! role. It has no wire protocol and no persistence; it exists so the harness
//! can be driven end to end without an external server.
//!
//! # Features
//!
//! * Root DSE with naming contexts and functional levels
//! * Schema container seeded with the bootstrap schema
//! * Generated aggregate entry (`objectClasses`, `attributeTypes`, ...)
//! * Schema writes checked by the constraint engine, with `msDS-IntId`,
//!   `schemaIDGUID` and `lDAPDisplayName` assigned on add
//! * Pending schema elements made live by a `schemaUpdateNow` root DSE modify
//! * Object class and attribute checks for ordinary entries
//!
//! All operations take the state lock for their whole duration, so each
//! operation is atomic with respect to the others.

use super::{
    DirectoryClient, Entry, Modification, ModificationOp, SearchRequest, SearchScope, attrs,
};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult, HarnessResult, ViolationKind};
use crate::schema::aggregate::GENERATED_ATTRIBUTES;
use crate::schema::description::{
    AttributeTypeDescription, ContentRuleDescription, ObjectClassDescription,
    extended_attribute_info, extended_class_info,
};
use crate::schema::{
    AcceptedElement, ClassCategory, ConstraintEngine, ElementKind, ForestState, IntIdAssigner,
    SchemaElementDefinition, SchemaSet,
};
use crate::value_objects::Dn;
use chrono::Utc;
use log::{debug, info, trace};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct DirectoryState {
    config: DirectoryConfig,
    forest: ForestState,
    root_dse: Entry,
    // Keyed by normalized DN.
    entries: BTreeMap<String, Entry>,
    schema: SchemaSet,
}

/// Thread-safe in-memory directory.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
    engine: ConstraintEngine,
    assigner: IntIdAssigner,
}

/// Statistics about the directory contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryStats {
    pub entries: usize,
    pub schema_elements: usize,
    pub pending_schema_elements: usize,
    pub internal_ids: usize,
}

fn generalized_time() -> String {
    Utc::now().format("%Y%m%d%H%M%S.0Z").to_string()
}

impl InMemoryDirectory {
    /// Provision a directory: root DSE, domain, configuration and schema
    /// naming contexts, `CN=Users`, the aggregate entry and the bootstrap
    /// schema.
    pub fn new(config: DirectoryConfig) -> HarnessResult<Self> {
        config.validate()?;

        let domain = config.domain_dn.clone();
        let configuration = domain.child("CN", "Configuration");
        let schema_nc = configuration.child("CN", "Schema");
        let forest = ForestState::new(config.functional_level, schema_nc.clone(), domain.clone());
        let schema = SchemaSet::bootstrap()?;
        let level = config.functional_level.to_string();

        let root_dse = Entry::new(Dn::root())
            .with(attrs::SCHEMA_NAMING_CONTEXT, [schema_nc.as_str()])
            .with(attrs::DEFAULT_NAMING_CONTEXT, [domain.as_str()])
            .with(attrs::CONFIGURATION_NAMING_CONTEXT, [configuration.as_str()])
            .with("rootDomainNamingContext", [domain.as_str()])
            .with(
                "namingContexts",
                [domain.as_str(), configuration.as_str(), schema_nc.as_str()],
            )
            .with(attrs::FOREST_FUNCTIONALITY, [level.as_str()])
            .with(attrs::DOMAIN_FUNCTIONALITY, [level.as_str()])
            .with("domainControllerFunctionality", [level.as_str()])
            .with("supportedLDAPVersion", ["3"])
            .with("isSynchronized", ["TRUE"]);

        let mut state = DirectoryState {
            config,
            forest,
            root_dse,
            entries: BTreeMap::new(),
            schema,
        };

        let dc = domain
            .rdn()
            .map(|rdn| rdn.value().to_string())
            .unwrap_or_default();
        state.provision(
            Entry::new(domain.clone())
                .with(attrs::OBJECT_CLASS, ["top", "domain", "domainDNS"])
                .with("dc", [dc]),
            "Domain-DNS",
        );
        state.provision(
            Entry::new(domain.child("CN", "Users")).with(attrs::OBJECT_CLASS, ["top", "container"]),
            "Container",
        );
        state.provision(
            Entry::new(configuration.clone()).with(attrs::OBJECT_CLASS, ["top", "configuration"]),
            "Configuration",
        );
        state.provision(
            Entry::new(schema_nc.clone()).with(attrs::OBJECT_CLASS, ["top", "dMD"]),
            "DMD",
        );
        let aggregate = state.forest.aggregate_dn();
        state.provision(
            Entry::new(aggregate).with(attrs::OBJECT_CLASS, ["top", "subSchema"]),
            "SubSchema",
        );

        let bootstrap: Vec<AcceptedElement> = state.schema.elements().to_vec();
        for element in &bootstrap {
            let mut entry = element.definition().to_entry(&state.forest);
            state.decorate_schema_entry(&mut entry, element);
            state.insert(entry);
        }

        info!(
            "Provisioned in-memory directory {} with {} schema elements",
            domain,
            state.schema.len()
        );
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            engine: ConstraintEngine::new(),
            assigner: IntIdAssigner::new(),
        })
    }

    /// Forest facts the directory publishes in its root DSE.
    pub async fn forest(&self) -> ForestState {
        self.state.read().await.forest.clone()
    }

    /// Copy of the directory's schema element set.
    pub async fn schema(&self) -> SchemaSet {
        self.state.read().await.schema.clone()
    }

    pub async fn stats(&self) -> DirectoryStats {
        let state = self.state.read().await;
        DirectoryStats {
            entries: state.entries.len(),
            schema_elements: state.schema.len(),
            pending_schema_elements: state.schema.pending_count(),
            internal_ids: state.schema.internal_id_count(),
        }
    }

    fn add_schema_element(&self, state: &mut DirectoryState, mut entry: Entry) -> DirectoryResult<()> {
        state.check_schema_write()?;
        if state.contains(entry.dn()) {
            return Err(DirectoryError::already_exists(entry.dn()));
        }

        let mut definition = SchemaElementDefinition::from_entry(&entry)?;
        let rdn_value = entry.dn().rdn().map(|rdn| rdn.value()).unwrap_or_default();
        if !definition.name().eq_ignore_ascii_case(rdn_value) {
            return Err(DirectoryError::new(
                ViolationKind::NamingViolation,
                format!("cn '{}' does not match the RDN of {}", definition.name(), entry.dn()),
            ));
        }

        self.engine
            .evaluate(&definition, &state.forest, &state.schema)
            .into_result()?;

        if let Some(id) = self.assigner.assign(&definition, &state.forest, &state.schema) {
            definition
                .assign_internal_id(id)
                .map_err(|e| DirectoryError::new(ViolationKind::Other, e.to_string()))?;
        }

        let element = state.schema.accept(definition, Uuid::new_v4()).clone();
        state.decorate_schema_entry(&mut entry, &element);
        info!(
            "Added {} '{}' ({}){}",
            element.kind(),
            element.name(),
            element.definition().object_identifier(),
            element
                .internal_id()
                .map(|id| format!(" with msDS-IntId {}", id))
                .unwrap_or_default()
        );
        state.insert(entry);
        Ok(())
    }

    fn publish(&self, state: &mut DirectoryState, changes: &[Modification]) -> DirectoryResult<()> {
        if let Some(change) = changes.iter().find(|c| !c.targets(attrs::SCHEMA_UPDATE_NOW)) {
            return Err(DirectoryError::unwilling(format!(
                "{} can not be modified on the root DSE",
                change.attribute
            )));
        }
        let published = state.schema.publish();
        info!("schemaUpdateNow published {} schema element(s)", published);
        Ok(())
    }
}

impl DirectoryState {
    fn contains(&self, dn: &Dn) -> bool {
        self.entries.contains_key(&dn.normalized())
    }

    fn get(&self, dn: &Dn) -> Option<&Entry> {
        self.entries.get(&dn.normalized())
    }

    fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.dn().normalized(), entry);
    }

    fn has_children(&self, dn: &Dn) -> bool {
        self.entries.values().any(|entry| entry.dn().is_child_of(dn))
    }

    /// Write a structural entry without any checks, filling the attributes
    /// the directory maintains itself.
    fn provision(&mut self, mut entry: Entry, category: &str) {
        let category = self.forest.element_dn(category);
        self.fill_operational(&mut entry, &category);
        self.insert(entry);
    }

    fn fill_operational(&self, entry: &mut Entry, category: &Dn) {
        let dn = entry.dn().clone();
        if let Some(rdn) = dn.rdn() {
            if !entry.contains(rdn.attribute()) {
                entry.set(&rdn.attribute().to_ascii_lowercase(), [rdn.value()]);
            }
            entry.set(attrs::NAME, [rdn.value()]);
        }
        entry.set(attrs::DISTINGUISHED_NAME, [dn.as_str()]);
        if !entry.contains(attrs::INSTANCE_TYPE) {
            entry.set(attrs::INSTANCE_TYPE, ["4"]);
        }
        if !entry.contains(attrs::OBJECT_CATEGORY) {
            entry.set(attrs::OBJECT_CATEGORY, [category.as_str()]);
        }
        entry.set(attrs::WHEN_CREATED, [generalized_time()]);
    }

    /// Add the attributes a directory assigns to a stored schema element.
    fn decorate_schema_entry(&self, entry: &mut Entry, element: &AcceptedElement) {
        let own_dn = entry.dn().clone();
        let category = match element.kind() {
            ElementKind::Attribute => self.forest.element_dn("Attribute-Schema"),
            ElementKind::Class => self.forest.element_dn("Class-Schema"),
        };
        if !entry.contains(attrs::LDAP_DISPLAY_NAME) {
            entry.set(attrs::LDAP_DISPLAY_NAME, [element.ldap_display_name()]);
        }
        entry.set(
            attrs::SCHEMA_ID_GUID,
            [element.schema_id_guid().hyphenated().to_string()],
        );
        if element.kind() == ElementKind::Class && !entry.contains(attrs::DEFAULT_OBJECT_CATEGORY) {
            entry.set(attrs::DEFAULT_OBJECT_CATEGORY, [own_dn.as_str()]);
        }
        if let Some(id) = element.internal_id() {
            entry.set(attrs::MS_DS_INT_ID, [id.to_string()]);
        }
        self.fill_operational(entry, &category);
    }

    fn check_schema_write(&self) -> DirectoryResult<()> {
        if !self.config.schema_master {
            return Err(DirectoryError::unwilling(
                "this directory does not hold the schema master role",
            ));
        }
        if !self.config.allow_schema_updates {
            return Err(DirectoryError::new(
                ViolationKind::InsufficientAccessRights,
                "schema updates are not permitted",
            ));
        }
        Ok(())
    }

    fn is_schema_dn(&self, dn: &Dn) -> bool {
        *dn == self.forest.schema_naming_context
            || dn.is_descendant_of(&self.forest.schema_naming_context)
    }

    fn is_naming_context(&self, dn: &Dn) -> bool {
        self.root_dse
            .values("namingContexts")
            .iter()
            .filter_map(|v| Dn::new(v.as_str()).ok())
            .any(|nc| nc == *dn)
    }

    /// Check an ordinary entry against the published schema and fill the
    /// attributes the directory maintains.
    fn check_ordinary_entry(&self, entry: &mut Entry) -> DirectoryResult<()> {
        let classes = entry.values(attrs::OBJECT_CLASS).to_vec();
        if classes.is_empty() {
            return Err(DirectoryError::object_class(format!(
                "{} has no objectClass",
                entry.dn()
            )));
        }

        let mut resolved: Vec<&AcceptedElement> = Vec::new();
        for class in &classes {
            let element = self.schema.resolve_class(class).ok_or_else(|| {
                DirectoryError::object_class(format!("objectClass '{}' is not defined", class))
            })?;
            resolved.push(element);
        }

        let structural = resolved
            .iter()
            .filter(|e| {
                matches!(
                    e.definition().class_category(),
                    Some(ClassCategory::Structural) | Some(ClassCategory::Class88)
                )
            })
            .max_by_key(|e| self.schema.superclass_chain(e.name()).len())
            .copied()
            .ok_or_else(|| {
                DirectoryError::object_class(format!("{} has no structural objectClass", entry.dn()))
            })?;

        for attribute in entry.attributes() {
            if self.schema.resolve_attribute(&attribute.name).is_none() {
                return Err(DirectoryError::new(
                    ViolationKind::UndefinedAttributeType,
                    format!("attribute '{}' is not defined", attribute.name),
                ));
            }
        }

        if let Some(rdn) = entry.dn().rdn() {
            if let Some(existing) = entry.first(rdn.attribute()) {
                if !existing.eq_ignore_ascii_case(rdn.value()) {
                    return Err(DirectoryError::new(
                        ViolationKind::NamingViolation,
                        format!("{} does not match the RDN of {}", rdn.attribute(), entry.dn()),
                    ));
                }
            }
        }

        if let Some(category) = entry.first(attrs::OBJECT_CATEGORY) {
            let resolves = Dn::new(category)
                .ok()
                .and_then(|dn| self.schema.resolve_class_dn(&self.forest, &dn))
                .is_some();
            if !resolves {
                return Err(DirectoryError::constraint(format!(
                    "objectCategory '{}' does not name a class",
                    category
                )));
            }
        }

        let default_category = structural
            .definition()
            .default_object_category()
            .cloned()
            .unwrap_or_else(|| self.forest.element_dn(structural.name()));
        self.fill_operational(entry, &default_category);

        let mut required: Vec<&str> = Vec::new();
        for class in &resolved {
            for link in self.schema.superclass_chain(class.name()) {
                let definition = link.definition();
                required.extend(definition.required_attributes().iter().map(String::as_str));
                for auxiliary in definition.auxiliary_classes() {
                    if let Some(aux) = self.schema.resolve_class(auxiliary) {
                        required.extend(
                            aux.definition().required_attributes().iter().map(String::as_str),
                        );
                    }
                }
            }
        }
        for attribute in required {
            let present = entry.contains(attribute)
                || self
                    .schema
                    .resolve_attribute(attribute)
                    .is_some_and(|a| {
                        entry.contains(a.ldap_display_name()) || entry.contains(a.name())
                    });
            if !present {
                return Err(DirectoryError::object_class(format!(
                    "{} is missing required attribute '{}'",
                    entry.dn(),
                    attribute
                )));
            }
        }
        Ok(())
    }

    /// Apply changes to a copy of `entry`; the original is untouched on error.
    fn apply_changes(&self, entry: &Entry, changes: &[Modification]) -> DirectoryResult<Entry> {
        let mut updated = entry.clone();
        let rdn_attribute = entry.dn().rdn().map(|rdn| rdn.attribute().to_string());

        for change in changes {
            let Some(attribute) = self.schema.resolve_attribute(&change.attribute) else {
                return Err(DirectoryError::new(
                    ViolationKind::UndefinedAttributeType,
                    format!("attribute '{}' is not defined", change.attribute),
                ));
            };
            let is_rdn = change.targets(attrs::NAME)
                || rdn_attribute
                    .as_deref()
                    .is_some_and(|rdn| change.targets(rdn));
            if is_rdn {
                return Err(DirectoryError::new(
                    ViolationKind::NotAllowedOnRdn,
                    format!("{} names the entry {}", change.attribute, entry.dn()),
                ));
            }

            match change.op {
                ModificationOp::Add => {
                    if change.values.is_empty() {
                        return Err(DirectoryError::constraint(format!(
                            "add of {} carries no values",
                            change.attribute
                        )));
                    }
                    for value in &change.values {
                        if updated.has_value(&change.attribute, value) {
                            return Err(DirectoryError::new(
                                ViolationKind::AttributeOrValueExists,
                                format!("{} already holds '{}'", change.attribute, value),
                            ));
                        }
                    }
                    updated.add_values(&change.attribute, change.values.iter().cloned());
                }
                ModificationOp::Replace => {
                    updated.set(&change.attribute, change.values.iter().cloned());
                }
                ModificationOp::Delete => {
                    if !updated.contains(&change.attribute) {
                        return Err(DirectoryError::new(
                            ViolationKind::NoSuchAttribute,
                            format!("{} has no {}", entry.dn(), change.attribute),
                        ));
                    }
                    if change.values.is_empty() {
                        updated.remove(&change.attribute);
                    } else {
                        let mut remaining = updated.values(&change.attribute).to_vec();
                        for value in &change.values {
                            let Some(idx) =
                                remaining.iter().position(|v| v.eq_ignore_ascii_case(value))
                            else {
                                return Err(DirectoryError::new(
                                    ViolationKind::NoSuchAttribute,
                                    format!("{} does not hold '{}'", change.attribute, value),
                                ));
                            };
                            remaining.remove(idx);
                        }
                        updated.set(&change.attribute, remaining);
                    }
                }
            }

            if attribute.definition().is_single_valued()
                && updated.values(&change.attribute).len() > 1
            {
                return Err(DirectoryError::constraint(format!(
                    "{} is single-valued",
                    change.attribute
                )));
            }
        }
        Ok(updated)
    }

    /// The aggregate entry with its generated attributes rendered from the
    /// published schema.
    fn generated_aggregate(&self, stored: &Entry) -> Entry {
        let schema = &self.schema;
        let mut entry = stored.clone();
        entry.set(
            attrs::OBJECT_CLASSES,
            schema
                .classes()
                .map(|e| ObjectClassDescription::from_element(e, schema).to_string()),
        );
        entry.set(
            attrs::ATTRIBUTE_TYPES,
            schema
                .attributes()
                .map(|e| AttributeTypeDescription::from_element(e).to_string()),
        );
        entry.set(
            attrs::DIT_CONTENT_RULES,
            schema
                .classes()
                .filter_map(|e| ContentRuleDescription::from_element(e, schema))
                .map(|rule| rule.to_string()),
        );
        entry.set(
            attrs::EXTENDED_ATTRIBUTE_INFO,
            schema.attributes().map(extended_attribute_info),
        );
        entry.set(
            attrs::EXTENDED_CLASS_INFO,
            schema.classes().map(extended_class_info),
        );
        entry
    }

    fn in_scope(base: &Dn, scope: SearchScope, dn: &Dn) -> bool {
        match scope {
            SearchScope::Base => dn == base,
            SearchScope::OneLevel => dn.is_child_of(base),
            SearchScope::Subtree => dn == base || dn.is_descendant_of(base),
        }
    }

    fn project(&self, entry: &Entry, request: &SearchRequest) -> Entry {
        let is_aggregate = *entry.dn() == self.forest.aggregate_dn();
        let wants_generated = is_aggregate
            && GENERATED_ATTRIBUTES
                .iter()
                .any(|name| request.names_attribute(name));
        let source = if wants_generated {
            self.generated_aggregate(entry)
        } else {
            entry.clone()
        };

        let all = request.wants_all_user_attributes();
        source.project(|name| {
            let generated = GENERATED_ATTRIBUTES
                .iter()
                .any(|g| g.eq_ignore_ascii_case(name));
            if generated {
                request.names_attribute(name)
            } else {
                all || request.names_attribute(name)
            }
        })
    }
}

impl DirectoryClient for InMemoryDirectory {
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<Entry>> {
        let state = self.state.read().await;
        trace!("search base='{}' scope={:?} filter={}", request.base, request.scope, request.filter);

        if request.base.is_root() && request.scope == SearchScope::Base {
            let root = &state.root_dse;
            let all = request.wants_all_user_attributes();
            return Ok(vec![root.project(|name| all || request.names_attribute(name))]);
        }
        if !request.base.is_root() && !state.contains(&request.base) {
            return Err(DirectoryError::no_such_object(&request.base));
        }

        let results: Vec<Entry> = state
            .entries
            .values()
            .filter(|entry| DirectoryState::in_scope(&request.base, request.scope, entry.dn()))
            .filter(|entry| request.filter.matches(entry))
            .map(|entry| state.project(entry, &request))
            .collect();
        debug!("search under '{}' returned {} entries", request.base, results.len());
        Ok(results)
    }

    async fn add(&self, entry: Entry) -> DirectoryResult<()> {
        let mut state = self.state.write().await;
        let dn = entry.dn().clone();
        debug!("add {}", dn);

        if dn.is_root() {
            return Err(DirectoryError::unwilling("the root DSE can not be added"));
        }
        if state.contains(&dn) {
            return Err(DirectoryError::already_exists(&dn));
        }
        let parent_exists = dn.parent().is_some_and(|parent| state.contains(&parent));
        if !parent_exists {
            return Err(DirectoryError::no_such_object(
                dn.parent().unwrap_or_else(Dn::root),
            ));
        }

        if dn.is_child_of(&state.forest.schema_naming_context) {
            return self.add_schema_element(&mut state, entry);
        }
        if state.is_schema_dn(&dn) {
            return Err(DirectoryError::unwilling(format!(
                "{} is not a valid location for schema objects",
                dn
            )));
        }

        let mut entry = entry;
        state.check_ordinary_entry(&mut entry)?;
        state.insert(entry);
        Ok(())
    }

    async fn modify(&self, dn: Dn, changes: Vec<Modification>) -> DirectoryResult<()> {
        let mut state = self.state.write().await;
        debug!("modify {} ({} change(s))", dn, changes.len());

        if dn.is_root() {
            return self.publish(&mut state, &changes);
        }
        let Some(current) = state.get(&dn) else {
            return Err(DirectoryError::no_such_object(&dn));
        };
        if dn == state.forest.aggregate_dn() {
            return Err(DirectoryError::unwilling("the aggregate schema is generated"));
        }

        if state.is_schema_dn(&dn) {
            state.check_schema_write()?;
            if let Some(element) = state.schema.find_by_dn(&state.forest, &dn) {
                self.engine
                    .evaluate_modification(element.definition(), &changes)
                    .into_result()?;
            }
        }

        let updated = state.apply_changes(current, &changes)?;
        state.insert(updated);
        Ok(())
    }

    async fn delete(&self, dn: Dn) -> DirectoryResult<()> {
        let mut state = self.state.write().await;
        debug!("delete {}", dn);

        if dn.is_root() {
            return Err(DirectoryError::unwilling("the root DSE can not be deleted"));
        }
        if !state.contains(&dn) {
            return Err(DirectoryError::no_such_object(&dn));
        }
        if state.is_schema_dn(&dn) {
            return Err(DirectoryError::unwilling(format!(
                "schema object {} can not be deleted",
                dn
            )));
        }
        if state.is_naming_context(&dn) {
            return Err(DirectoryError::unwilling(format!(
                "naming context {} can not be deleted",
                dn
            )));
        }
        if state.has_children(&dn) {
            return Err(DirectoryError::new(
                ViolationKind::NotAllowedOnNonLeaf,
                format!("{} has children", dn),
            ));
        }
        state.entries.remove(&dn.normalized());
        Ok(())
    }
}

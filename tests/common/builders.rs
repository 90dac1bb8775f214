//! Fluent builders for schema element definitions.
//!
//! Every builder starts from a definition the constraint engine accepts and
//! draws a fresh OID, so tests only spell out what they break.

use ldap_schema_harness::schema::{ClassCategory, SchemaElementDefinition, SystemFlags};
use ldap_schema_harness::value_objects::{Dn, Oid};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OID: AtomicU64 = AtomicU64::new(1);

/// A fresh OID under the test arc, `1.2.840.4711.1.5.<kind>.<n>`.
pub fn unique_oid(kind: u32) -> Oid {
    let n = NEXT_OID.fetch_add(1, Ordering::Relaxed);
    Oid::new(format!("1.2.840.4711.1.5.{}.{}", kind, n)).unwrap()
}

/// Builder for attribute definitions (Unicode string syntax, single-valued).
#[derive(Debug, Clone)]
pub struct AttributeBuilder {
    name: String,
    oid: Option<Oid>,
    flags: SystemFlags,
    client_id: Option<i32>,
    syntax: Option<(String, i32)>,
}

impl AttributeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            oid: None,
            flags: SystemFlags::default(),
            client_id: None,
            syntax: Some(("2.5.5.12".to_string(), 64)),
        }
    }

    pub fn oid(mut self, oid: &str) -> Self {
        self.oid = Some(Oid::new(oid).unwrap());
        self
    }

    /// Set the schema base-object flag (16).
    pub fn base_object(mut self) -> Self {
        self.flags = self.flags.with(SystemFlags::SCHEMA_BASE_OBJECT);
        self
    }

    pub fn client_id(mut self, id: i32) -> Self {
        self.client_id = Some(id);
        self
    }

    pub fn syntax(mut self, attribute_syntax: &str, om_syntax: i32) -> Self {
        self.syntax = Some((attribute_syntax.to_string(), om_syntax));
        self
    }

    pub fn without_syntax(mut self) -> Self {
        self.syntax = None;
        self
    }

    pub fn build(self) -> SchemaElementDefinition {
        let oid = self.oid.unwrap_or_else(|| unique_oid(9940));
        let mut definition = SchemaElementDefinition::attribute(self.name, oid)
            .with_system_flags(self.flags)
            .single_valued(true);
        if let Some((syntax, om)) = self.syntax {
            definition = definition.with_syntax(syntax, om);
        }
        if let Some(id) = self.client_id {
            definition = definition.with_client_internal_id(id);
        }
        definition
    }
}

/// Builder for structural classes derived from `organizationalPerson`.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    oid: Option<Oid>,
    parent: Option<String>,
    must: Vec<String>,
    may: Vec<String>,
    auxiliary: Vec<String>,
    category: Option<ClassCategory>,
    default_object_category: Option<Dn>,
    flags: SystemFlags,
    client_id: Option<i32>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            oid: None,
            parent: Some("organizationalPerson".to_string()),
            must: vec!["cn".to_string()],
            may: Vec::new(),
            auxiliary: Vec::new(),
            category: None,
            default_object_category: None,
            flags: SystemFlags::default(),
            client_id: None,
        }
    }

    pub fn oid(mut self, oid: &str) -> Self {
        self.oid = Some(Oid::new(oid).unwrap());
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn no_parent(mut self) -> Self {
        self.parent = None;
        self
    }

    pub fn must(mut self, attribute: &str) -> Self {
        self.must.push(attribute.to_string());
        self
    }

    pub fn may(mut self, attribute: &str) -> Self {
        self.may.push(attribute.to_string());
        self
    }

    pub fn auxiliary(mut self, class: &str) -> Self {
        self.auxiliary.push(class.to_string());
        self
    }

    pub fn category(mut self, category: ClassCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn default_object_category(mut self, dn: &str) -> Self {
        self.default_object_category = Some(Dn::new(dn).unwrap());
        self
    }

    pub fn base_object(mut self) -> Self {
        self.flags = self.flags.with(SystemFlags::SCHEMA_BASE_OBJECT);
        self
    }

    pub fn client_id(mut self, id: i32) -> Self {
        self.client_id = Some(id);
        self
    }

    pub fn build(self) -> SchemaElementDefinition {
        let oid = self.oid.unwrap_or_else(|| unique_oid(9939));
        let mut definition = SchemaElementDefinition::class(self.name, oid)
            .with_rdn_attribute("cn")
            .with_system_flags(self.flags);
        if let Some(parent) = self.parent {
            definition = definition.with_parent_class(parent);
        }
        for attribute in self.must {
            definition = definition.with_required_attribute(attribute);
        }
        for attribute in self.may {
            definition = definition.with_optional_attribute(attribute);
        }
        for class in self.auxiliary {
            definition = definition.with_auxiliary_class(class);
        }
        if let Some(category) = self.category {
            definition = definition.with_class_category(category);
        }
        if let Some(dn) = self.default_object_category {
            definition = definition.with_default_object_category(dn);
        }
        if let Some(id) = self.client_id {
            definition = definition.with_client_internal_id(id);
        }
        definition
    }
}

//! Core schema type definitions.
//!
//! This module contains the data structures describing candidate schema
//! elements, the forest facts that gate schema behavior, and the conversion
//! between definitions and directory entries.

use crate::directory::{DirectoryClient, Entry, SearchRequest, attrs};
use crate::error::{
    DirectoryError, DirectoryResult, HarnessError, HarnessResult, ValidationError,
    ValidationResult, ViolationKind,
};
use crate::value_objects::{Dn, Oid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Forest functional level, an integer capability watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionalLevel(u32);

impl FunctionalLevel {
    pub const DS_DC_FUNCTION_2000: Self = Self(0);
    pub const DS_DC_FUNCTION_2003_MIXED: Self = Self(1);
    pub const DS_DC_FUNCTION_2003: Self = Self(2);
    pub const DS_DC_FUNCTION_2008: Self = Self(3);
    pub const DS_DC_FUNCTION_2008_R2: Self = Self(4);
    pub const DS_DC_FUNCTION_2012: Self = Self(5);
    pub const DS_DC_FUNCTION_2012_R2: Self = Self(6);
    pub const DS_DC_FUNCTION_2016: Self = Self(7);

    /// Validate a raw level as read from `forestFunctionality`.
    pub fn new(level: u32) -> ValidationResult<Self> {
        if level > Self::DS_DC_FUNCTION_2016.0 {
            return Err(ValidationError::UnknownFunctionalLevel { level });
        }
        Ok(Self(level))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FunctionalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `systemFlags` bitmask of a schema element.
///
/// Directories store the value as a signed 32-bit integer, so the high bit
/// renders as a negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemFlags(u32);

impl SystemFlags {
    pub const ATTR_NOT_REPLICATED: u32 = 0x0000_0001;
    pub const ATTR_REQ_PARTIAL_SET_MEMBER: u32 = 0x0000_0002;
    pub const ATTR_IS_CONSTRUCTED: u32 = 0x0000_0004;
    pub const ATTR_IS_OPERATIONAL: u32 = 0x0000_0008;
    /// Bit 4: element belongs to the immutable base schema.
    pub const SCHEMA_BASE_OBJECT: u32 = 0x0000_0010;
    pub const ATTR_IS_RDN: u32 = 0x0000_0020;
    pub const DISALLOW_DELETE: u32 = 0x8000_0000;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub const fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }

    pub const fn is_base_object(self) -> bool {
        self.contains(Self::SCHEMA_BASE_OBJECT)
    }

    /// Parse the decimal form a directory returns (signed or unsigned).
    pub fn parse(value: &str) -> Option<Self> {
        let parsed: i64 = value.trim().parse().ok()?;
        if parsed < i32::MIN as i64 || parsed > u32::MAX as i64 {
            return None;
        }
        Some(Self(parsed as u32))
    }
}

impl fmt::Display for SystemFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as i32)
    }
}

/// Whether a definition describes an attribute type or an object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Attribute,
    Class,
}

impl ElementKind {
    /// Structural object class of the schema entry.
    pub fn object_class(self) -> &'static str {
        match self {
            ElementKind::Attribute => "attributeSchema",
            ElementKind::Class => "classSchema",
        }
    }

    /// Attribute carrying the element's OID.
    pub fn oid_attribute(self) -> &'static str {
        match self {
            ElementKind::Attribute => attrs::ATTRIBUTE_ID,
            ElementKind::Class => attrs::GOVERNS_ID,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_class())
    }
}

/// `objectClassCategory` of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassCategory {
    Class88,
    Structural,
    Abstract,
    Auxiliary,
}

impl ClassCategory {
    pub fn value(self) -> i32 {
        match self {
            ClassCategory::Class88 => 0,
            ClassCategory::Structural => 1,
            ClassCategory::Abstract => 2,
            ClassCategory::Auxiliary => 3,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(ClassCategory::Class88),
            1 => Some(ClassCategory::Structural),
            2 => Some(ClassCategory::Abstract),
            3 => Some(ClassCategory::Auxiliary),
            _ => None,
        }
    }
}

/// Read-only facts about the directory deployment, read once at connection
/// time from the root DSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestState {
    pub functional_level: FunctionalLevel,
    pub schema_naming_context: Dn,
    pub default_naming_context: Dn,
}

impl ForestState {
    pub fn new(
        functional_level: FunctionalLevel,
        schema_naming_context: Dn,
        default_naming_context: Dn,
    ) -> Self {
        Self {
            functional_level,
            schema_naming_context,
            default_naming_context,
        }
    }

    /// Read the forest facts from the directory's root DSE.
    pub async fn discover<C: DirectoryClient>(client: &C) -> HarnessResult<Self> {
        let entries = client
            .search(SearchRequest::base(Dn::root()).with_attributes(["*"]))
            .await?;
        let root = entries
            .first()
            .ok_or_else(|| DirectoryError::no_such_object("root DSE"))?;

        let required = |name: &str| {
            root.first(name).ok_or_else(|| HarnessError::RootDse {
                attribute: name.to_string(),
            })
        };

        let schema_naming_context = Dn::new(required(attrs::SCHEMA_NAMING_CONTEXT)?)?;
        let default_naming_context = Dn::new(required(attrs::DEFAULT_NAMING_CONTEXT)?)?;
        let level: u32 = required(attrs::FOREST_FUNCTIONALITY)?
            .trim()
            .parse()
            .map_err(|_| HarnessError::RootDse {
                attribute: attrs::FOREST_FUNCTIONALITY.to_string(),
            })?;

        Ok(Self::new(
            FunctionalLevel::new(level)?,
            schema_naming_context,
            default_naming_context,
        ))
    }

    /// DN of a schema element with the given common name.
    pub fn element_dn(&self, name: &str) -> Dn {
        self.schema_naming_context.child("CN", name)
    }

    /// DN of the generated aggregate schema entry.
    pub fn aggregate_dn(&self) -> Dn {
        self.schema_naming_context.child("CN", "Aggregate")
    }

    /// Common name of the schema element addressed by `dn`, if `dn` lies
    /// directly under the schema naming context.
    pub fn element_name<'a>(&self, dn: &'a Dn) -> Option<&'a str> {
        if dn.is_child_of(&self.schema_naming_context) {
            dn.rdn().map(|rdn| rdn.value())
        } else {
            None
        }
    }
}

/// Derive an LDAP display name from a common name: hyphens are dropped, the
/// character following a hyphen is upper-cased and the first character is
/// lower-cased (`test-Attr-1` becomes `testAttr1`).
pub fn derive_ldap_display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
            continue;
        }
        if out.is_empty() {
            out.extend(c.to_lowercase());
        } else if upper_next {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper_next = false;
    }
    out
}

/// A candidate attribute or class definition.
///
/// `internal_id` is absent until the directory assigns one. A submitter that
/// fills it in is rejected by the constraint engine; once assigned it can not
/// be replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaElementDefinition {
    name: String,
    #[serde(default)]
    ldap_display_name: Option<String>,
    object_identifier: Oid,
    kind: ElementKind,
    #[serde(default)]
    system_flags: SystemFlags,
    #[serde(default)]
    required_attributes: Vec<String>,
    #[serde(default)]
    optional_attributes: Vec<String>,
    #[serde(default)]
    auxiliary_classes: Vec<String>,
    #[serde(default)]
    parent_class: Option<String>,
    #[serde(default)]
    default_object_category: Option<Dn>,
    #[serde(default)]
    attribute_syntax: Option<String>,
    #[serde(default)]
    om_syntax: Option<i32>,
    #[serde(default)]
    is_single_valued: bool,
    #[serde(default)]
    system_only: bool,
    #[serde(default)]
    class_category: Option<ClassCategory>,
    #[serde(default)]
    rdn_attribute: Option<String>,
    #[serde(default)]
    internal_id: Option<i32>,
    #[serde(default)]
    extra_attributes: BTreeMap<String, Vec<String>>,
}

/// Attributes written by the directory itself; never carried as extras.
const SERVER_OWNED: &[&str] = &[
    attrs::DISTINGUISHED_NAME,
    attrs::NAME,
    attrs::SCHEMA_ID_GUID,
    attrs::WHEN_CREATED,
    "objectGUID",
    "whenChanged",
    "uSNCreated",
    "uSNChanged",
];

/// Attributes mapped onto typed fields by `from_entry`.
const TYPED: &[&str] = &[
    attrs::OBJECT_CLASS,
    attrs::CN,
    attrs::LDAP_DISPLAY_NAME,
    attrs::ATTRIBUTE_ID,
    attrs::GOVERNS_ID,
    attrs::ATTRIBUTE_SYNTAX,
    attrs::OM_SYNTAX,
    attrs::IS_SINGLE_VALUED,
    attrs::SYSTEM_ONLY,
    attrs::SYSTEM_FLAGS,
    attrs::MS_DS_INT_ID,
    attrs::SUB_CLASS_OF,
    attrs::DEFAULT_OBJECT_CATEGORY,
    attrs::OBJECT_CLASS_CATEGORY,
    attrs::RDN_ATT_ID,
    attrs::SYSTEM_MUST_CONTAIN,
    attrs::SYSTEM_MAY_CONTAIN,
    attrs::SYSTEM_AUXILIARY_CLASS,
];

impl SchemaElementDefinition {
    fn new(kind: ElementKind, name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            ldap_display_name: None,
            object_identifier: oid,
            kind,
            system_flags: SystemFlags::default(),
            required_attributes: Vec::new(),
            optional_attributes: Vec::new(),
            auxiliary_classes: Vec::new(),
            parent_class: None,
            default_object_category: None,
            attribute_syntax: None,
            om_syntax: None,
            is_single_valued: false,
            system_only: false,
            class_category: None,
            rdn_attribute: None,
            internal_id: None,
            extra_attributes: BTreeMap::new(),
        }
    }

    /// Start an attribute definition. The admin description/display name and
    /// instance type are pre-filled the way schema administrators usually
    /// write them.
    pub fn attribute(name: impl Into<String>, oid: Oid) -> Self {
        let mut def = Self::new(ElementKind::Attribute, name, oid);
        def.prefill_admin_attributes();
        def
    }

    /// Start a class definition (structural unless changed).
    pub fn class(name: impl Into<String>, oid: Oid) -> Self {
        let mut def = Self::new(ElementKind::Class, name, oid);
        def.class_category = Some(ClassCategory::Structural);
        def.prefill_admin_attributes();
        def
    }

    fn prefill_admin_attributes(&mut self) {
        let name = self.name.clone();
        self.extra_attributes
            .insert("adminDescription".to_string(), vec![name.clone()]);
        self.extra_attributes
            .insert("adminDisplayName".to_string(), vec![name]);
        self.extra_attributes
            .insert(attrs::INSTANCE_TYPE.to_string(), vec!["4".to_string()]);
    }

    pub fn with_ldap_display_name(mut self, name: impl Into<String>) -> Self {
        self.ldap_display_name = Some(name.into());
        self
    }

    pub fn with_system_flags(mut self, flags: SystemFlags) -> Self {
        self.system_flags = flags;
        self
    }

    pub fn with_syntax(mut self, attribute_syntax: impl Into<String>, om_syntax: i32) -> Self {
        self.attribute_syntax = Some(attribute_syntax.into());
        self.om_syntax = Some(om_syntax);
        self
    }

    pub fn with_attribute_syntax(mut self, attribute_syntax: Option<String>) -> Self {
        self.attribute_syntax = attribute_syntax;
        self
    }

    pub fn with_om_syntax(mut self, om_syntax: Option<i32>) -> Self {
        self.om_syntax = om_syntax;
        self
    }

    pub fn single_valued(mut self, single: bool) -> Self {
        self.is_single_valued = single;
        self
    }

    pub fn system_only(mut self, system_only: bool) -> Self {
        self.system_only = system_only;
        self
    }

    pub fn with_parent_class(mut self, parent: impl Into<String>) -> Self {
        self.parent_class = Some(parent.into());
        self
    }

    pub fn with_default_object_category(mut self, dn: Dn) -> Self {
        self.default_object_category = Some(dn);
        self
    }

    pub fn with_class_category(mut self, category: ClassCategory) -> Self {
        self.class_category = Some(category);
        self
    }

    pub fn with_rdn_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.rdn_attribute = Some(attribute.into());
        self
    }

    /// Add a `systemMustContain` attribute; duplicates (ignoring case) are dropped.
    pub fn with_required_attribute(mut self, attribute: impl Into<String>) -> Self {
        push_unique(&mut self.required_attributes, attribute.into());
        self
    }

    pub fn with_optional_attribute(mut self, attribute: impl Into<String>) -> Self {
        push_unique(&mut self.optional_attributes, attribute.into());
        self
    }

    pub fn with_auxiliary_class(mut self, class: impl Into<String>) -> Self {
        push_unique(&mut self.auxiliary_classes, class.into());
        self
    }

    /// Supply `msDS-IntId` as a client would. The directory must refuse this.
    pub fn with_client_internal_id(mut self, id: i32) -> Self {
        self.internal_id = Some(id);
        self
    }

    /// Set an extra attribute, replacing previous values (order preserved).
    pub fn with_extra<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_attributes.insert(
            name.to_string(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Rename the element before it is submitted.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Record the identifier chosen by the directory. Fails if one is
    /// already present.
    pub fn assign_internal_id(&mut self, id: i32) -> ValidationResult<()> {
        if let Some(existing) = self.internal_id {
            return Err(ValidationError::InternalIdAlreadyAssigned {
                name: self.name.clone(),
                existing,
            });
        }
        self.internal_id = Some(id);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit LDAP display name, or the one derived from the common name.
    pub fn ldap_display_name(&self) -> String {
        self.ldap_display_name
            .clone()
            .unwrap_or_else(|| derive_ldap_display_name(&self.name))
    }

    pub fn object_identifier(&self) -> &Oid {
        &self.object_identifier
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn system_flags(&self) -> SystemFlags {
        self.system_flags
    }

    pub fn required_attributes(&self) -> &[String] {
        &self.required_attributes
    }

    pub fn optional_attributes(&self) -> &[String] {
        &self.optional_attributes
    }

    pub fn auxiliary_classes(&self) -> &[String] {
        &self.auxiliary_classes
    }

    pub fn parent_class(&self) -> Option<&str> {
        self.parent_class.as_deref()
    }

    pub fn default_object_category(&self) -> Option<&Dn> {
        self.default_object_category.as_ref()
    }

    pub fn attribute_syntax(&self) -> Option<&str> {
        self.attribute_syntax.as_deref()
    }

    pub fn om_syntax(&self) -> Option<i32> {
        self.om_syntax
    }

    pub fn is_single_valued(&self) -> bool {
        self.is_single_valued
    }

    pub fn is_system_only(&self) -> bool {
        self.system_only
    }

    pub fn class_category(&self) -> Option<ClassCategory> {
        self.class_category
    }

    pub fn rdn_attribute(&self) -> Option<&str> {
        self.rdn_attribute.as_deref()
    }

    pub fn internal_id(&self) -> Option<i32> {
        self.internal_id
    }

    pub fn extra_attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.extra_attributes
    }

    /// Render the definition as the entry a client would add.
    pub fn to_entry(&self, forest: &ForestState) -> Entry {
        let mut entry = Entry::new(forest.element_dn(&self.name))
            .with(attrs::OBJECT_CLASS, ["top", self.kind.object_class()])
            .with(attrs::CN, [self.name.as_str()]);

        if let Some(display) = &self.ldap_display_name {
            entry.add_values(attrs::LDAP_DISPLAY_NAME, [display.as_str()]);
        }
        entry.add_values(self.kind.oid_attribute(), [self.object_identifier.as_str()]);

        match self.kind {
            ElementKind::Attribute => {
                if let Some(syntax) = &self.attribute_syntax {
                    entry.add_values(attrs::ATTRIBUTE_SYNTAX, [syntax.as_str()]);
                }
                if let Some(om) = self.om_syntax {
                    entry.add_values(attrs::OM_SYNTAX, [om.to_string()]);
                }
                entry.add_values(attrs::IS_SINGLE_VALUED, [ldap_bool(self.is_single_valued)]);
            }
            ElementKind::Class => {
                if let Some(category) = self.class_category {
                    entry.add_values(attrs::OBJECT_CLASS_CATEGORY, [category.value().to_string()]);
                }
                if let Some(parent) = &self.parent_class {
                    entry.add_values(attrs::SUB_CLASS_OF, [parent.as_str()]);
                }
                if let Some(category) = &self.default_object_category {
                    entry.add_values(attrs::DEFAULT_OBJECT_CATEGORY, [category.as_str()]);
                }
                if let Some(rdn) = &self.rdn_attribute {
                    entry.add_values(attrs::RDN_ATT_ID, [rdn.as_str()]);
                }
                entry.add_values(attrs::SYSTEM_MUST_CONTAIN, self.required_attributes.iter().cloned());
                entry.add_values(attrs::SYSTEM_MAY_CONTAIN, self.optional_attributes.iter().cloned());
                entry.add_values(
                    attrs::SYSTEM_AUXILIARY_CLASS,
                    self.auxiliary_classes.iter().cloned(),
                );
            }
        }

        entry.add_values(attrs::SYSTEM_ONLY, [ldap_bool(self.system_only)]);
        if self.system_flags.bits() != 0 {
            entry.add_values(attrs::SYSTEM_FLAGS, [self.system_flags.to_string()]);
        }
        if let Some(id) = self.internal_id {
            entry.add_values(attrs::MS_DS_INT_ID, [id.to_string()]);
        }
        for (name, values) in &self.extra_attributes {
            entry.add_values(name, values.iter().cloned());
        }
        entry
    }

    /// Interpret a schema entry as a definition.
    ///
    /// Failures are classified the way a directory would answer an add of
    /// the same entry.
    pub fn from_entry(entry: &Entry) -> DirectoryResult<Self> {
        let kind = if entry.has_value(attrs::OBJECT_CLASS, "attributeSchema") {
            ElementKind::Attribute
        } else if entry.has_value(attrs::OBJECT_CLASS, "classSchema") {
            ElementKind::Class
        } else {
            return Err(DirectoryError::object_class(format!(
                "{} is neither attributeSchema nor classSchema",
                entry.dn()
            )));
        };

        let name = entry
            .first(attrs::CN)
            .or_else(|| entry.dn().rdn().map(|rdn| rdn.value()))
            .ok_or_else(|| DirectoryError::object_class("schema entry has no cn"))?
            .to_string();

        let oid_attr = kind.oid_attribute();
        let oid_value = entry.first(oid_attr).ok_or_else(|| {
            DirectoryError::object_class(format!("{} is missing {}", entry.dn(), oid_attr))
        })?;
        let oid = Oid::new(oid_value)
            .map_err(|e| DirectoryError::constraint(format!("{}: {}", oid_attr, e)))?;

        let mut def = Self::new(kind, name, oid);
        def.ldap_display_name = entry.first(attrs::LDAP_DISPLAY_NAME).map(str::to_string);
        def.attribute_syntax = entry.first(attrs::ATTRIBUTE_SYNTAX).map(str::to_string);
        def.om_syntax = parse_int(entry, attrs::OM_SYNTAX)?;
        def.is_single_valued = parse_bool(entry, attrs::IS_SINGLE_VALUED)?;
        def.system_only = parse_bool(entry, attrs::SYSTEM_ONLY)?;
        if let Some(raw) = entry.first(attrs::SYSTEM_FLAGS) {
            def.system_flags = SystemFlags::parse(raw).ok_or_else(|| {
                DirectoryError::constraint(format!("systemFlags '{}' is not an integer", raw))
            })?;
        }
        def.internal_id = parse_int(entry, attrs::MS_DS_INT_ID)?;
        def.parent_class = entry.first(attrs::SUB_CLASS_OF).map(str::to_string);
        if let Some(raw) = entry.first(attrs::DEFAULT_OBJECT_CATEGORY) {
            let dn = Dn::new(raw).map_err(|e| {
                DirectoryError::new(ViolationKind::InvalidDnSyntax, e.to_string())
            })?;
            def.default_object_category = Some(dn);
        }
        if let Some(category) = parse_int(entry, attrs::OBJECT_CLASS_CATEGORY)? {
            def.class_category = Some(ClassCategory::from_value(category).ok_or_else(|| {
                DirectoryError::constraint(format!("objectClassCategory {} is invalid", category))
            })?);
        }
        def.rdn_attribute = entry.first(attrs::RDN_ATT_ID).map(str::to_string);
        for value in entry.values(attrs::SYSTEM_MUST_CONTAIN) {
            push_unique(&mut def.required_attributes, value.clone());
        }
        for value in entry.values(attrs::SYSTEM_MAY_CONTAIN) {
            push_unique(&mut def.optional_attributes, value.clone());
        }
        for value in entry.values(attrs::SYSTEM_AUXILIARY_CLASS) {
            push_unique(&mut def.auxiliary_classes, value.clone());
        }

        for attr in entry.attributes() {
            let known = TYPED
                .iter()
                .chain(SERVER_OWNED)
                .any(|name| attr.name.eq_ignore_ascii_case(name));
            if !known {
                def.extra_attributes
                    .insert(attr.name.clone(), attr.values.clone());
            }
        }
        Ok(def)
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        list.push(value);
    }
}

fn ldap_bool(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

fn parse_bool(entry: &Entry, name: &str) -> DirectoryResult<bool> {
    match entry.first(name) {
        None => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("TRUE") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("FALSE") => Ok(false),
        Some(v) => Err(DirectoryError::constraint(format!(
            "{} must be TRUE or FALSE, got '{}'",
            name, v
        ))),
    }
}

fn parse_int(entry: &Entry, name: &str) -> DirectoryResult<Option<i32>> {
    entry
        .first(name)
        .map(|v| {
            v.trim().parse::<i32>().map_err(|_| {
                DirectoryError::constraint(format!("{} '{}' is not a 32-bit integer", name, v))
            })
        })
        .transpose()
}

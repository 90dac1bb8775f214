//! Built-in schema extension scenarios.
//!
//! Every scenario creates its own uniquely named schema elements, so the
//! scenarios can run in any order, repeatedly, and concurrently against the
//! same directory. Element entries are written as LDIF, the way an
//! administrator would hand them to a directory tool.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_schema_harness::config::DirectoryConfig;
//! use ldap_schema_harness::directory::InMemoryDirectory;
//! use ldap_schema_harness::scenarios::{self, NameAllocator};
//! use ldap_schema_harness::sequencer::SchemaOperationSequencer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new(DirectoryConfig::default())?;
//! let mut sequencer = SchemaOperationSequencer::connect(directory).await?;
//! let names = NameAllocator::new(4711);
//!
//! for scenario in scenarios::all(&names, sequencer.forest())? {
//!     assert!(sequencer.run(&scenario).await.passed());
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::HarnessConfig;
use crate::directory::{Filter, Modification, SearchRequest, attrs};
use crate::error::{HarnessResult, ViolationKind};
use crate::ldif;
use crate::schema::types::derive_ldap_display_name;
use crate::schema::{ForestState, SchemaElementDefinition};
use crate::sequencer::{EntryCheck, Operation, Scenario, Step};
use crate::value_objects::{Dn, Oid};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const ATTRIBUTE_OID_ARC: u32 = 9940;
const CLASS_OID_ARC: u32 = 9939;

/// Identifier a client tries to force on an element.
const FORCED_INT_ID: &str = "-1993108831";

const SCHEMA_UPDATE_NOW: &str = "dn:\nchangetype: modify\nadd: schemaUpdateNow\nschemaUpdateNow: 1\n";

const GENERATED: [&str; 3] = [
    attrs::OBJECT_CLASSES,
    attrs::ATTRIBUTE_TYPES,
    attrs::DIT_CONTENT_RULES,
];

/// Hands out unique element names and OIDs.
///
/// Names are `<prefix><unix time>-<n>`; OIDs live under
/// `1.2.840.<arc>.1.5.9940` (attributes) and `1.2.840.<arc>.1.5.9939`
/// (classes). The counter is shared, so one allocator may serve concurrently
/// running scenarios.
#[derive(Debug)]
pub struct NameAllocator {
    stamp: u64,
    arc: u32,
    counter: AtomicU64,
}

/// The names of one schema element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNames {
    pub name: String,
    pub ldap_display_name: String,
    pub dn: Dn,
}

impl NameAllocator {
    pub fn new(oid_arc: u32) -> Self {
        Self {
            stamp: Utc::now().timestamp().unsigned_abs(),
            arc: oid_arc,
            counter: AtomicU64::new(0),
        }
    }

    /// Use the configured OID arc, or a random one in `1..=100000`.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.oid_arc.unwrap_or_else(random_arc))
    }

    pub fn oid_arc(&self) -> u32 {
        self.arc
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn name(&self, prefix: &str) -> String {
        format!("{}{}-{}", prefix, self.stamp, self.next())
    }

    /// A fresh schema element name with its display name and DN.
    pub fn element(&self, prefix: &str, forest: &ForestState) -> ElementNames {
        let name = self.name(prefix);
        ElementNames {
            ldap_display_name: derive_ldap_display_name(&name),
            dn: forest.element_dn(&name),
            name,
        }
    }

    pub fn attribute_oid(&self) -> HarnessResult<Oid> {
        self.oid(ATTRIBUTE_OID_ARC)
    }

    pub fn class_oid(&self) -> HarnessResult<Oid> {
        self.oid(CLASS_OID_ARC)
    }

    fn oid(&self, kind: u32) -> HarnessResult<Oid> {
        let oid = format!(
            "1.2.840.{}.1.5.{}.{}.{}",
            self.arc,
            kind,
            self.stamp,
            self.next()
        );
        Ok(Oid::new(oid)?)
    }
}

fn random_arc() -> u32 {
    (Uuid::new_v4().as_u128() % 100_000) as u32 + 1
}

fn attribute_ldif(names: &ElementNames, oid: &Oid) -> String {
    format!(
        "dn: {dn}
objectClass: top
objectClass: attributeSchema
adminDescription: {name}
adminDisplayName: {name}
cn: {name}
attributeId: {oid}
attributeSyntax: 2.5.5.12
omSyntax: 64
instanceType: 4
isSingleValued: TRUE
systemOnly: FALSE
",
        dn = names.dn,
        name = names.name,
        oid = oid
    )
}

fn class_ldif(names: &ElementNames, oid: &Oid) -> String {
    format!(
        "dn: {dn}
objectClass: top
objectClass: classSchema
adminDescription: {name}
adminDisplayName: {name}
cn: {name}
governsId: {oid}
instanceType: 4
objectClassCategory: 1
subClassOf: organizationalPerson
rDNAttID: cn
systemMustContain: cn
systemOnly: FALSE
",
        dn = names.dn,
        name = names.name,
        oid = oid
    )
}

fn with_line(ldif: &str, attribute: &str, value: &str) -> String {
    format!("{}{}: {}\n", ldif, attribute, value)
}

/// Pre-validated schema add of an LDIF entry.
fn add_element(ldif: &str) -> HarnessResult<Operation> {
    let entry = ldif::parse_entry(ldif)?;
    Ok(Operation::AddElement(SchemaElementDefinition::from_entry(&entry)?))
}

/// Plain add of an LDIF entry.
fn add(ldif: &str) -> HarnessResult<Operation> {
    Ok(Operation::Add(ldif::parse_entry(ldif)?))
}

fn schema_update_now_steps() -> HarnessResult<Vec<Step>> {
    Ok(ldif::parse(SCHEMA_UPDATE_NOW)?
        .into_iter()
        .map(|record| Step::new("schemaUpdateNow", Operation::from(record)))
        .collect())
}

fn read_back(dn: &Dn) -> Operation {
    Operation::Search(SearchRequest::base(dn.clone()).with_attributes(["*"]))
}

fn force_int_id(dn: &Dn) -> Operation {
    Operation::Modify {
        dn: dn.clone(),
        changes: vec![Modification::replace(attrs::MS_DS_INT_ID, [FORCED_INT_ID])],
    }
}

/// The aggregate entry returns its generated attributes when they are named.
pub fn generated_schema(forest: &ForestState) -> Scenario {
    let request = SearchRequest::base(forest.aggregate_dn()).with_attributes(GENERATED);
    let step = GENERATED.iter().fold(
        Step::new("read generated schema", Operation::Search(request)).check(EntryCheck::Count(1)),
        |step, attribute| step.check(EntryCheck::present(*attribute)),
    );
    Scenario::new("generated schema").step(step)
}

/// A wildcard read of the aggregate entry returns none of the generated
/// attributes.
pub fn generated_schema_is_operational(forest: &ForestState) -> Scenario {
    let request = SearchRequest::base(forest.aggregate_dn()).with_attributes(["*"]);
    let step = GENERATED.iter().fold(
        Step::new("wildcard read", Operation::Search(request)).check(EntryCheck::Count(1)),
        |step, attribute| step.check(EntryCheck::absent(*attribute)),
    );
    Scenario::new("generated schema is operational").step(step)
}

/// Add an attribute, a class requiring it and an object of that class, with
/// `schemaUpdateNow` in between.
pub fn schema_update_now(names: &NameAllocator, forest: &ForestState) -> HarnessResult<Scenario> {
    let attribute = names.element("test-Attr", forest);
    let class = names.element("test-Class", forest);
    let object = names.name("obj");
    let object_dn = forest
        .default_naming_context
        .child("CN", "Users")
        .child("CN", &object);

    let class_body = with_line(
        &with_line(&class_ldif(&class, &names.class_oid()?), attrs::SYSTEM_FLAGS, "16"),
        attrs::SYSTEM_MUST_CONTAIN,
        &attribute.ldap_display_name,
    );
    let bad_category = with_line(&class_body, attrs::DEFAULT_OBJECT_CATEGORY, "CN=_");
    let object_ldif = format!(
        "dn: {dn}
objectClass: organizationalPerson
objectClass: person
objectClass: {class}
objectClass: top
cn: {object}
instanceType: 4
objectCategory: {category}
distinguishedName: {dn}
name: {object}
{attribute}: test
",
        dn = object_dn,
        class = class.ldap_display_name,
        object = object,
        category = class.dn,
        attribute = attribute.ldap_display_name
    );

    Ok(Scenario::new("schemaUpdateNow")
        .step(Step::new(
            "add attribute",
            add(&attribute_ldif(&attribute, &names.attribute_oid()?))?,
        ))
        .step(
            Step::new("read attribute", read_back(&attribute.dn))
                .check(EntryCheck::Count(1))
                .check(EntryCheck::equals(attrs::LDAP_DISPLAY_NAME, &attribute.ldap_display_name))
                .check(EntryCheck::present(attrs::SCHEMA_ID_GUID)),
        )
        .steps(schema_update_now_steps()?)
        .step(
            Step::new("add class with bad defaultObjectCategory", add_element(&bad_category)?)
                .expect_failure(ViolationKind::ConstraintViolation),
        )
        .step(Step::new("add class", add(&class_body)?))
        .step(
            Step::new("read class", read_back(&class.dn))
                .check(EntryCheck::Count(1))
                .check(EntryCheck::equals(attrs::LDAP_DISPLAY_NAME, &class.ldap_display_name))
                .check(EntryCheck::equals_attribute(
                    attrs::DEFAULT_OBJECT_CATEGORY,
                    attrs::DISTINGUISHED_NAME,
                ))
                .check(EntryCheck::present(attrs::SCHEMA_ID_GUID)),
        )
        .steps(schema_update_now_steps()?)
        .step(Step::new("add object", add(&object_ldif)?))
        .step(Step::new("read object", read_back(&object_dn)).check(EntryCheck::Count(1)))
        .step(Step::new("delete object", Operation::DeleteForce(object_dn))))
}

/// Steps shared by the attribute and class identifier scenarios: a forced
/// identifier is refused, a plain add gets one per policy, and the
/// identifier can not be changed afterwards.
fn int_id_steps(label: &str, ldif: &str, dn: &Dn) -> HarnessResult<Vec<Step>> {
    let policy = EntryCheck::IntIdConsistentWithPolicy { strict: true };
    Ok(vec![
        Step::new(
            format!("add {} with msDS-IntId", label),
            add_element(&with_line(ldif, attrs::MS_DS_INT_ID, FORCED_INT_ID))?,
        )
        .expect_failure(ViolationKind::UnwillingToPerform),
        Step::new(format!("add {}", label), add(ldif)?),
        Step::new("schemaUpdateNow", Operation::Barrier),
        Step::new(format!("read {}", label), read_back(dn))
            .check(EntryCheck::Count(1))
            .check(policy.clone()),
        Step::new(format!("modify msDS-IntId of {}", label), force_int_id(dn))
            .expect_failure(ViolationKind::ConstraintViolation),
        Step::new(format!("read {} again", label), read_back(dn))
            .check(EntryCheck::Count(1))
            .check(policy),
    ])
}

/// `msDS-IntId` handling on attributes with and without the base-object flag.
pub fn intid_on_attribute(names: &NameAllocator, forest: &ForestState) -> HarnessResult<Scenario> {
    let plain = names.element("msDS-IntId-Attr-1-", forest);
    let plain_ldif = attribute_ldif(&plain, &names.attribute_oid()?);
    let base = names.element("msDS-IntId-Attr-2-", forest);
    let base_ldif = with_line(
        &attribute_ldif(&base, &names.attribute_oid()?),
        attrs::SYSTEM_FLAGS,
        "16",
    );

    Ok(Scenario::new("msDS-IntId on attributes")
        .steps(int_id_steps("attribute", &plain_ldif, &plain.dn)?)
        .step(
            Step::new("read attribute display name", read_back(&plain.dn))
                .check(EntryCheck::equals(attrs::LDAP_DISPLAY_NAME, &plain.ldap_display_name)),
        )
        .steps(int_id_steps("base attribute", &base_ldif, &base.dn)?)
        .step(
            Step::new("base attribute has no msDS-IntId", read_back(&base.dn))
                .check(EntryCheck::absent(attrs::MS_DS_INT_ID)),
        ))
}

/// `msDS-IntId` handling on classes with and without the base-object flag.
pub fn intid_on_class(names: &NameAllocator, forest: &ForestState) -> HarnessResult<Scenario> {
    let mut scenario = Scenario::new("msDS-IntId on classes");
    for (prefix, flags) in [
        ("msDS-IntId-Class-1-", None),
        ("msDS-IntId-Class-2-", Some("16")),
    ] {
        let class = names.element(prefix, forest);
        let mut ldif = class_ldif(&class, &names.class_oid()?);
        if let Some(flags) = flags {
            ldif = with_line(&ldif, attrs::SYSTEM_FLAGS, flags);
        }
        scenario = scenario.steps(int_id_steps("class", &ldif, &class.dn)?);
    }
    Ok(scenario)
}

/// Every attribute schema entry carries `msDS-IntId` exactly where the
/// assignment policy says it should. Missing identifiers are only logged.
pub fn verify_intid(forest: &ForestState) -> HarnessResult<Scenario> {
    let request = SearchRequest::one_level(forest.schema_naming_context.clone())
        .with_filter(Filter::parse("objectClass=attributeSchema")?)
        .with_attributes([
            attrs::SYSTEM_FLAGS,
            attrs::MS_DS_INT_ID,
            attrs::ATTRIBUTE_ID,
            attrs::CN,
        ]);
    Ok(Scenario::new("verify msDS-IntId").step(
        Step::new("list attributes", Operation::Search(request))
            .check(EntryCheck::AtLeast(2))
            .check(EntryCheck::IntIdConsistentWithPolicy { strict: false }),
    ))
}

/// A second add of the same attribute, or of another attribute with the
/// same OID, is refused.
pub fn duplicate_attribute(names: &NameAllocator, forest: &ForestState) -> HarnessResult<Scenario> {
    let attribute = names.element("test-Dup-Attr", forest);
    let oid = names.attribute_oid()?;
    let ldif = attribute_ldif(&attribute, &oid);
    let same_oid = attribute_ldif(&names.element("test-Dup-Oid", forest), &oid);

    Ok(Scenario::new("duplicate attribute")
        .step(Step::new("add attribute", add_element(&ldif)?))
        .step(
            Step::new("add attribute again", add_element(&ldif)?)
                .expect_failure(ViolationKind::EntryAlreadyExists),
        )
        .step(
            Step::new("write attribute again", add(&ldif)?)
                .expect_failure(ViolationKind::EntryAlreadyExists),
        )
        .step(
            Step::new("add attribute with the same OID", add_element(&same_oid)?)
                .expect_failure(ViolationKind::EntryAlreadyExists),
        ))
}

/// All built-in scenarios, in the order they are usually run.
pub fn all(names: &NameAllocator, forest: &ForestState) -> HarnessResult<Vec<Scenario>> {
    Ok(vec![
        generated_schema(forest),
        generated_schema_is_operational(forest),
        schema_update_now(names, forest)?,
        intid_on_attribute(names, forest)?,
        intid_on_class(names, forest)?,
        verify_intid(forest)?,
        duplicate_attribute(names, forest)?,
    ])
}

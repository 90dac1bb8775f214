//! `msDS-IntId` handling across functional levels and system flags.

use crate::common::{self, builders::{AttributeBuilder, ClassBuilder}};
use ldap_schema_harness::directory::{DirectoryClient, Entry, Modification, SearchRequest, attrs};
use ldap_schema_harness::error::ViolationKind;
use ldap_schema_harness::schema::{
    FunctionalLevel, IntIdAssigner, SchemaElementDefinition, SchemaSet,
};
use std::collections::HashSet;
use uuid::Uuid;

async fn read_element(
    directory: &impl DirectoryClient,
    definition: &SchemaElementDefinition,
    forest: &ldap_schema_harness::ForestState,
) -> Entry {
    let dn = forest.element_dn(definition.name());
    let mut entries = directory
        .search(SearchRequest::base(dn).with_attributes(["*"]))
        .await
        .expect("element entry is readable");
    assert_eq!(entries.len(), 1);
    entries.remove(0)
}

#[tokio::test]
async fn test_attribute_identifier_follows_functional_level() {
    for level in common::all_levels() {
        let directory = common::directory_at(level);
        let forest = directory.forest().await;
        let attribute = AttributeBuilder::new(&format!("level-{}-Attr", level.value())).build();

        directory
            .add(attribute.to_entry(&forest))
            .await
            .expect("attribute is accepted");

        let entry = read_element(&directory, &attribute, &forest).await;
        let expected = level >= FunctionalLevel::DS_DC_FUNCTION_2003;
        assert_eq!(
            entry.contains(attrs::MS_DS_INT_ID),
            expected,
            "level {} assigned {:?}",
            level.value(),
            entry.first(attrs::MS_DS_INT_ID)
        );
    }
}

#[tokio::test]
async fn test_extension_attribute_gets_identifier() {
    let directory = common::directory_at(FunctionalLevel::DS_DC_FUNCTION_2003);
    let forest = directory.forest().await;
    let attribute = AttributeBuilder::new("extension-Attr")
        .oid("1.2.840.113556.1.5.9940")
        .build();

    directory.add(attribute.to_entry(&forest)).await.unwrap();

    let entry = read_element(&directory, &attribute, &forest).await;
    let id: i32 = entry.first(attrs::MS_DS_INT_ID).unwrap().parse().unwrap();
    assert!(IntIdAssigner::in_range(id));
    let schema = directory.schema().await;
    assert!(schema.is_internal_id_taken(id));
}

#[tokio::test]
async fn test_base_object_elements_get_no_identifier() {
    let directory = common::directory();
    let forest = directory.forest().await;
    let attribute = AttributeBuilder::new("base-Attr").base_object().build();
    let class = ClassBuilder::new("base-Class").base_object().build();

    directory.add(attribute.to_entry(&forest)).await.unwrap();
    directory.add(class.to_entry(&forest)).await.unwrap();

    for definition in [&attribute, &class] {
        let entry = read_element(&directory, definition, &forest).await;
        assert!(!entry.contains(attrs::MS_DS_INT_ID), "{} has an id", entry.dn());
        assert_eq!(entry.first(attrs::SYSTEM_FLAGS), Some("16"));
    }
}

#[tokio::test]
async fn test_classes_get_identifiers_too() {
    let directory = common::directory_at(FunctionalLevel::DS_DC_FUNCTION_2003);
    let forest = directory.forest().await;
    let class = ClassBuilder::new("plain-Class").build();

    directory.add(class.to_entry(&forest)).await.unwrap();

    let entry = read_element(&directory, &class, &forest).await;
    let id: i32 = entry
        .first(attrs::MS_DS_INT_ID)
        .expect("class has an identifier")
        .parse()
        .unwrap();
    assert!(IntIdAssigner::in_range(id));
    assert!(id < 0, "identifiers read as negative signed values");
}

#[tokio::test]
async fn test_client_supplied_identifier_is_refused() {
    let directory = common::directory();
    let forest = directory.forest().await;

    for definition in [
        AttributeBuilder::new("forced-Attr").client_id(-1993108831).build(),
        ClassBuilder::new("forced-Class").client_id(-1993108831).build(),
    ] {
        let result = directory.add(definition.to_entry(&forest)).await;
        assert_violation!(result, ViolationKind::UnwillingToPerform);
    }
    assert_eq!(directory.stats().await.pending_schema_elements, 0);
}

#[tokio::test]
async fn test_identifier_can_not_be_modified() {
    let directory = common::directory();
    let forest = directory.forest().await;
    let attribute = AttributeBuilder::new("fixed-Attr").build();
    directory.add(attribute.to_entry(&forest)).await.unwrap();
    let before = read_element(&directory, &attribute, &forest).await;

    for change in [
        Modification::replace(attrs::MS_DS_INT_ID, ["-1993108831"]),
        Modification::delete(attrs::MS_DS_INT_ID, Vec::<String>::new()),
    ] {
        let result = directory
            .modify(forest.element_dn(attribute.name()), vec![change])
            .await;
        assert_violation!(result, ViolationKind::ConstraintViolation);
    }

    let after = read_element(&directory, &attribute, &forest).await;
    assert_eq!(
        before.first(attrs::MS_DS_INT_ID),
        after.first(attrs::MS_DS_INT_ID)
    );
}

#[tokio::test]
async fn test_assigned_identifiers_are_unique() {
    let directory = common::directory();
    let forest = directory.forest().await;

    let mut seen = HashSet::new();
    for n in 0..25 {
        let attribute = AttributeBuilder::new(&format!("unique-{}-Attr", n)).build();
        directory.add(attribute.to_entry(&forest)).await.unwrap();
        let entry = read_element(&directory, &attribute, &forest).await;
        let id = entry.first(attrs::MS_DS_INT_ID).unwrap().to_string();
        assert!(seen.insert(id.clone()), "msDS-IntId {} handed out twice", id);
    }
    assert_eq!(directory.stats().await.internal_ids, 25);
}

#[test]
fn test_assigner_probes_past_taken_identifiers() {
    let forest = common::forest(FunctionalLevel::DS_DC_FUNCTION_2008);
    let mut schema = SchemaSet::bootstrap().unwrap();
    let assigner = IntIdAssigner::new();

    let wanted = AttributeBuilder::new("wanted-Attr").build();
    let first_choice = assigner.assign(&wanted, &forest, &schema).unwrap();

    let mut squatter = AttributeBuilder::new("squatter-Attr").build();
    squatter.assign_internal_id(first_choice).unwrap();
    schema.accept(squatter, Uuid::new_v4());
    assert!(schema.is_internal_id_taken(first_choice));

    let second_choice = assigner.assign(&wanted, &forest, &schema).unwrap();
    assert_ne!(first_choice, second_choice);
    assert!(IntIdAssigner::in_range(second_choice));
}

#[test]
fn test_assigner_respects_policy() {
    let schema = SchemaSet::bootstrap().unwrap();
    let assigner = IntIdAssigner::new();
    let plain = AttributeBuilder::new("policy-Attr").build();
    let base = AttributeBuilder::new("policy-Base-Attr").base_object().build();

    let old_forest = common::forest(FunctionalLevel::DS_DC_FUNCTION_2000);
    let new_forest = common::forest(FunctionalLevel::DS_DC_FUNCTION_2003);

    assert_eq!(assigner.assign(&plain, &old_forest, &schema), None);
    assert_eq!(assigner.assign(&base, &new_forest, &schema), None);
    assert!(assigner.assign(&plain, &new_forest, &schema).is_some());

    let mut carrying = AttributeBuilder::new("carrying-Attr").build();
    carrying.assign_internal_id(-1_000_000_000).unwrap();
    assert_eq!(assigner.assign(&carrying, &new_forest, &schema), None);
}

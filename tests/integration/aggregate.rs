//! The generated aggregate schema as seen through [`AggregateSchemaView`].

use crate::common::{self, builders::{AttributeBuilder, ClassBuilder}, recording::RecordingDirectory};
use ldap_schema_harness::directory::{DirectoryClient, Modification, attrs};
use ldap_schema_harness::schema::{
    AggregateSchemaView, AggregateSnapshot, ConsistencyIssue, assert_consistent,
};
use ldap_schema_harness::value_objects::Dn;

async fn schema_update_now(directory: &impl DirectoryClient) {
    directory
        .modify(Dn::root(), vec![Modification::add(attrs::SCHEMA_UPDATE_NOW, ["1"])])
        .await
        .expect("schemaUpdateNow is accepted");
}

#[tokio::test]
async fn test_fresh_directory_snapshot_is_consistent() {
    let directory = common::directory();
    let forest = directory.forest().await;
    let snapshot = AggregateSchemaView::new(&directory, &forest)
        .snapshot()
        .await
        .unwrap();

    assert!(snapshot.find_class("user").is_some());
    assert!(snapshot.find_attribute("cn").is_some());
    assert!(!snapshot.content_rules.is_empty());
    assert_consistent(&snapshot).unwrap();

    let schema = directory.schema().await;
    assert_eq!(snapshot.attribute_types.len(), schema.attributes().count());
    assert_eq!(snapshot.object_classes.len(), schema.classes().count());
}

#[tokio::test]
async fn test_new_elements_appear_after_schema_update_now() {
    let directory = common::directory();
    let forest = directory.forest().await;
    let view = AggregateSchemaView::new(&directory, &forest);
    let attribute = AttributeBuilder::new("agg-Attr").build();

    directory.add(attribute.to_entry(&forest)).await.unwrap();
    let before = view.snapshot().await.unwrap();
    assert!(before.find_attribute("aggAttr").is_none());

    schema_update_now(&directory).await;
    let class = ClassBuilder::new("agg-Class").may("aggAttr").build();
    directory.add(class.to_entry(&forest)).await.unwrap();
    schema_update_now(&directory).await;

    let after = view.snapshot().await.unwrap();
    assert!(after.find_attribute("aggAttr").is_some());
    let described = after.find_class("aggClass").expect("class is described");
    assert!(described.may.iter().any(|a| a.eq_ignore_ascii_case("aggAttr")));
    assert_consistent(&after).unwrap();
}

#[tokio::test]
async fn test_generated_attributes_are_operational() {
    let directory = common::directory();
    let forest = directory.forest().await;
    let view = AggregateSchemaView::new(&directory, &forest);

    assert!(view.is_operational().await.unwrap());
}

#[tokio::test]
async fn test_snapshot_only_reads() {
    let recording = RecordingDirectory::new(common::directory());
    let forest = recording.inner().forest().await;
    let view = AggregateSchemaView::new(&recording, &forest);

    let first = view.snapshot().await.unwrap();
    let second = view.snapshot().await.unwrap();

    assert_eq!(first.object_classes.len(), second.object_classes.len());
    assert!(recording.writes().await.is_empty());
    assert_eq!(recording.calls().await.len(), 2);
}

#[tokio::test]
async fn test_inconsistencies_are_all_reported() {
    let directory = common::directory();
    let schema = directory.schema().await;
    let mut snapshot = AggregateSnapshot::from_schema(&schema);

    let mut ghost = snapshot.find_class("person").unwrap().clone();
    ghost.names = vec!["ghostPerson".to_string()];
    ghost.superclasses = vec!["ghostTop".to_string()];
    ghost.must.push("ghostAttr".to_string());
    snapshot.object_classes.push(ghost);

    let report = assert_consistent(&snapshot).unwrap_err();
    assert!(report.issues.iter().any(|issue| matches!(
        issue,
        ConsistencyIssue::DuplicateClassOid { oid, .. } if oid == "2.5.6.6"
    )));
    assert!(report.issues.contains(&ConsistencyIssue::UnresolvedSuperclass {
        class: "ghostPerson".to_string(),
        superclass: "ghostTop".to_string(),
    }));
    assert!(report.issues.contains(&ConsistencyIssue::UnresolvedAttribute {
        class: "ghostPerson".to_string(),
        attribute: "ghostAttr".to_string(),
    }));
    assert!(report.to_string().starts_with("aggregate schema is inconsistent"));
}

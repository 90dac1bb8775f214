//! Ordered execution: pre-validation, divergence reporting and the
//! `schemaUpdateNow` barrier, observed through a recording directory.

use crate::common::{
    self,
    builders::{AttributeBuilder, ClassBuilder},
    recording::{Call, RecordingDirectory},
};
use ldap_schema_harness::config::DirectoryConfig;
use ldap_schema_harness::directory::{Modification, SearchRequest, attrs};
use ldap_schema_harness::error::ViolationKind;
use ldap_schema_harness::sequencer::{
    Divergence, Operation, Scenario, SchemaOperationSequencer, Step, StepVerdict,
};
use ldap_schema_harness::value_objects::Dn;

async fn connect(recording: &RecordingDirectory) -> SchemaOperationSequencer<RecordingDirectory> {
    let sequencer = SchemaOperationSequencer::connect(recording.clone())
        .await
        .expect("sequencer connects");
    recording.clear().await;
    sequencer
}

#[tokio::test]
async fn test_rejected_element_is_never_written() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;

    let orphan = ClassBuilder::new("orphan-Class").parent("noSuchClass").build();
    let scenario = Scenario::new("orphan").step(
        Step::new("add orphan", Operation::AddElement(orphan))
            .expect_failure(ViolationKind::NamingViolation),
    );

    let result = sequencer.run(&scenario).await;
    assert_passed!(result);
    assert!(recording.writes().await.is_empty());
    assert!(recording.calls().await.is_empty());
}

#[tokio::test]
async fn test_accepted_element_is_written_then_read_back() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;
    let attribute = AttributeBuilder::new("written-Attr").build();
    let dn = sequencer.forest().element_dn(attribute.name());

    let scenario = Scenario::new("write")
        .step(Step::new("add attribute", Operation::AddElement(attribute)));
    let result = sequencer.run(&scenario).await;

    assert_passed!(result);
    assert_eq!(
        recording.calls().await,
        vec![
            Call::Add(dn.clone()),
            Call::Search(SearchRequest::base(dn).with_attributes(["*"])),
        ]
    );
}

#[tokio::test]
async fn test_first_divergence_stops_the_scenario() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;
    let attribute = AttributeBuilder::new("twice-Attr").build();
    let later = AttributeBuilder::new("never-Attr").build();

    let scenario = Scenario::new("twice")
        .step(Step::new("add", Operation::AddElement(attribute.clone())))
        .step(Step::new("add again", Operation::AddElement(attribute)))
        .step(Step::new("add another", Operation::AddElement(later)));
    let result = sequencer.run(&scenario).await;

    assert!(!result.passed());
    assert_eq!(result.steps.len(), 2);
    match result.divergence.as_ref().unwrap() {
        Divergence::VerdictMismatch {
            index,
            label,
            expected,
            actual,
            ..
        } => {
            assert_eq!(*index, 1);
            assert_eq!(label, "add again");
            assert_eq!(*expected, StepVerdict::Success);
            assert_eq!(*actual, StepVerdict::Failure(ViolationKind::EntryAlreadyExists));
        }
        other => panic!("unexpected divergence {:?}", other),
    }
    assert_eq!(recording.writes().await.len(), 1);
}

#[tokio::test]
async fn test_barrier_makes_new_attribute_usable() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;
    let attribute = AttributeBuilder::new("fresh-Attr").build();
    let early = ClassBuilder::new("early-Class").must("freshAttr").build();
    let late = ClassBuilder::new("late-Class").must("freshAttr").build();

    let scenario = Scenario::new("barrier")
        .step(Step::new("add attribute", Operation::AddElement(attribute)))
        .step(
            Step::new("add class too early", Operation::AddElement(early))
                .expect_failure(ViolationKind::UndefinedAttributeType),
        )
        .step(Step::new("schemaUpdateNow", Operation::Barrier))
        .step(Step::new("add class", Operation::AddElement(late)));
    let result = sequencer.run(&scenario).await;

    assert_passed!(result);
    assert_eq!(sequencer.schema().pending_count(), 1);
    let barrier = Call::Modify(
        Dn::root(),
        vec![Modification::add(attrs::SCHEMA_UPDATE_NOW, ["1"])],
    );
    assert!(recording.calls().await.contains(&barrier));
}

#[tokio::test]
async fn test_raw_schema_add_is_mirrored() {
    let directory = common::directory();
    let recording = RecordingDirectory::new(directory.clone());
    let mut sequencer = connect(&recording).await;
    let attribute = AttributeBuilder::new("raw-Attr").build();
    let entry = attribute.to_entry(sequencer.forest());

    let scenario = Scenario::new("raw").step(Step::new("add entry", Operation::Add(entry)));
    assert_passed!(sequencer.run(&scenario).await);

    let mirrored = sequencer.schema().find("rawAttr").expect("mirror knows the attribute");
    let schema = directory.schema().await;
    let stored = schema.find("rawAttr").unwrap();
    assert_eq!(mirrored.internal_id(), stored.internal_id());
    assert!(mirrored.internal_id().is_some());
    assert_eq!(mirrored.schema_id_guid(), stored.schema_id_guid());
}

#[tokio::test]
async fn test_identifier_modify_rejected_before_writing() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;
    let attribute = AttributeBuilder::new("locked-Attr").build();
    let dn = sequencer.forest().element_dn(attribute.name());

    let scenario = Scenario::new("locked")
        .step(Step::new("add", Operation::AddElement(attribute)))
        .step(
            Step::new(
                "force id",
                Operation::Modify {
                    dn: dn.clone(),
                    changes: vec![Modification::replace(attrs::MS_DS_INT_ID, ["-1993108831"])],
                },
            )
            .expect_failure(ViolationKind::ConstraintViolation),
        );
    assert_passed!(sequencer.run(&scenario).await);

    let writes = recording.writes().await;
    assert_eq!(writes, vec![Call::Add(dn)]);
}

#[tokio::test]
async fn test_delete_variants() {
    let recording = RecordingDirectory::new(common::directory());
    let mut sequencer = connect(&recording).await;
    let forest = sequencer.forest().clone();
    let missing = forest
        .default_naming_context
        .child("CN", "Users")
        .child("CN", "nobody");
    let schema_entry = forest.element_dn("Person");

    let scenario = Scenario::new("deletes")
        .step(
            Step::new("delete missing", Operation::Delete(missing.clone()))
                .expect_failure(ViolationKind::NoSuchObject),
        )
        .step(Step::new("force delete missing", Operation::DeleteForce(missing)))
        .step(
            Step::new("delete schema element", Operation::Delete(schema_entry))
                .expect_failure(ViolationKind::UnwillingToPerform),
        );
    let result = sequencer.run(&scenario).await;

    assert_passed!(result);
    assert_eq!(result.steps[1].actual, StepVerdict::Success);
}

#[tokio::test]
async fn test_directory_without_schema_master_refuses_writes() {
    let directory = common::directory_with(DirectoryConfig {
        schema_master: false,
        ..DirectoryConfig::default()
    });
    let mut sequencer = SchemaOperationSequencer::connect(directory).await.unwrap();
    let attribute = AttributeBuilder::new("refused-Attr").build();

    let scenario =
        Scenario::new("refused").step(Step::new("add", Operation::AddElement(attribute)));
    let result = sequencer.run(&scenario).await;

    match result.divergence {
        Some(Divergence::VerdictMismatch { actual, .. }) => {
            assert_eq!(actual, StepVerdict::Failure(ViolationKind::UnwillingToPerform));
        }
        other => panic!("expected a verdict mismatch, got {:?}", other),
    }
    assert!(sequencer.schema().find("refusedAttr").is_none());
}

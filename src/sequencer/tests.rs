use super::*;
use crate::config::DirectoryConfig;
use crate::directory::{
    DirectoryClient, Entry, Filter, InMemoryDirectory, Modification, SearchRequest, attrs,
};
use crate::error::{DirectoryResult, ViolationKind};
use crate::schema::SchemaElementDefinition;
use crate::value_objects::{Dn, Oid};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts writes and can hide `msDS-IntId` from reads.
#[derive(Clone)]
struct Recording {
    inner: InMemoryDirectory,
    adds: Arc<AtomicUsize>,
    modifies: Arc<AtomicUsize>,
    hide_int_id: bool,
}

impl Recording {
    fn new() -> Self {
        Self {
            inner: InMemoryDirectory::new(DirectoryConfig::default()).unwrap(),
            adds: Arc::new(AtomicUsize::new(0)),
            modifies: Arc::new(AtomicUsize::new(0)),
            hide_int_id: false,
        }
    }

    fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    fn modifies(&self) -> usize {
        self.modifies.load(Ordering::SeqCst)
    }
}

impl DirectoryClient for Recording {
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<Entry>> {
        let mut entries = self.inner.search(request).await?;
        if self.hide_int_id {
            for entry in &mut entries {
                entry.remove(attrs::MS_DS_INT_ID);
            }
        }
        Ok(entries)
    }

    async fn add(&self, entry: Entry) -> DirectoryResult<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add(entry).await
    }

    async fn modify(&self, dn: Dn, changes: Vec<Modification>) -> DirectoryResult<()> {
        self.modifies.fetch_add(1, Ordering::SeqCst);
        self.inner.modify(dn, changes).await
    }

    async fn delete(&self, dn: Dn) -> DirectoryResult<()> {
        self.inner.delete(dn).await
    }
}

async fn sequencer(client: Recording) -> SchemaOperationSequencer<Recording> {
    SchemaOperationSequencer::connect(client).await.unwrap()
}

fn oid(value: &str) -> Oid {
    Oid::new(value).unwrap()
}

fn attribute(name: &str, oid_value: &str) -> SchemaElementDefinition {
    SchemaElementDefinition::attribute(name, oid(oid_value))
        .with_syntax("2.5.5.12", 64)
        .single_valued(true)
}

fn class(name: &str, oid_value: &str) -> SchemaElementDefinition {
    SchemaElementDefinition::class(name, oid(oid_value))
        .with_parent_class("organizationalPerson")
        .with_rdn_attribute("cn")
        .with_required_attribute("cn")
}

#[tokio::test]
async fn test_rejected_pre_validation_writes_nothing() {
    let client = Recording::new();
    let mut seq = sequencer(client.clone()).await;

    let scenario = Scenario::new("client intId").step(
        Step::new(
            "add with msDS-IntId",
            Operation::AddElement(
                attribute("test-Seq-Attr", "1.2.840.77.1.5.9940").with_client_internal_id(-1993108831),
            ),
        )
        .expect_failure(ViolationKind::UnwillingToPerform),
    );

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    assert_eq!(
        result.steps[0].actual,
        StepVerdict::Failure(ViolationKind::UnwillingToPerform)
    );
    assert!(result.steps[0].message.is_some());
    assert_eq!(client.adds(), 0);
    assert!(seq.schema().find("test-Seq-Attr").is_none());
}

#[tokio::test]
async fn test_verdict_mismatch_stops_the_run() {
    let client = Recording::new();
    let mut seq = sequencer(client.clone()).await;

    let scenario = Scenario::new("mismatch")
        .step(
            Step::new(
                "add expected to fail",
                Operation::AddElement(attribute("test-Seq-Attr", "1.2.840.77.1.5.9941")),
            )
            .expect_failure(ViolationKind::EntryAlreadyExists),
        )
        .step(Step::new(
            "never runs",
            Operation::AddElement(attribute("test-Seq-Attr-2", "1.2.840.77.1.5.9942")),
        ));

    let result = seq.run(&scenario).await;
    assert!(!result.passed());
    assert_eq!(result.steps.len(), 1);
    match result.divergence.as_ref().unwrap() {
        Divergence::VerdictMismatch {
            index,
            expected,
            actual,
            reason,
            ..
        } => {
            assert_eq!(*index, 0);
            assert_eq!(*expected, StepVerdict::Failure(ViolationKind::EntryAlreadyExists));
            assert_eq!(*actual, StepVerdict::Success);
            assert_eq!(reason, "operation succeeded");
        }
        other => panic!("unexpected divergence {:?}", other),
    }
    assert_eq!(client.adds(), 1);
    assert!(result.to_string().starts_with("FAIL mismatch: step 0"));
}

#[tokio::test]
async fn test_delete_force_absorbs_missing_entry() {
    let mut seq = sequencer(Recording::new()).await;
    let missing = seq
        .forest()
        .default_naming_context
        .child("CN", "Users")
        .child("CN", "nobody");

    let scenario = Scenario::new("cleanup")
        .step(Step::new("force delete", Operation::DeleteForce(missing.clone())))
        .step(
            Step::new("plain delete", Operation::Delete(missing))
                .expect_failure(ViolationKind::NoSuchObject),
        );

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    assert_eq!(result.steps.len(), 2);
}

#[tokio::test]
async fn test_barrier_makes_new_attribute_usable() {
    let client = Recording::new();
    let mut seq = sequencer(client.clone()).await;

    let needs_attr = class("test-Seq-Class", "1.2.840.77.1.5.9939")
        .with_required_attribute("testSeqAttr");
    let scenario = Scenario::new("barrier")
        .step(Step::new(
            "add attribute",
            Operation::AddElement(attribute("test-Seq-Attr", "1.2.840.77.1.5.9943")),
        ))
        .step(
            Step::new("class before barrier", Operation::AddElement(needs_attr.clone()))
                .expect_failure(ViolationKind::UndefinedAttributeType),
        )
        .step(Step::new("barrier", Operation::Barrier))
        .step(Step::new("class after barrier", Operation::AddElement(needs_attr)));

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    assert_eq!(client.adds(), 2);
    assert_eq!(seq.schema().pending_count(), 1);

    let attr = seq.schema().resolve_attribute("testSeqAttr").unwrap();
    assert!(attr.internal_id().is_some());
    assert!(seq.schema().find("test-Seq-Class").unwrap().internal_id().is_some());
}

#[tokio::test]
async fn test_raw_schema_add_is_mirrored() {
    let mut seq = sequencer(Recording::new()).await;
    let forest = seq.forest().clone();
    let entry = attribute("test-Raw-Attr", "1.2.840.77.1.5.9944").to_entry(&forest);

    let scenario = Scenario::new("raw add")
        .step(Step::new("add entry", Operation::Add(entry)))
        .step(Step::new(
            "publish",
            Operation::Modify {
                dn: Dn::root(),
                changes: vec![Modification::add(attrs::SCHEMA_UPDATE_NOW, ["1"])],
            },
        ));

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    let mirrored = seq.schema().resolve_attribute("testRawAttr").unwrap();
    assert_eq!(mirrored.name(), "test-Raw-Attr");
    assert!(mirrored.internal_id().is_some());
}

#[tokio::test]
async fn test_raw_add_with_malformed_category_is_invalid_dn_syntax() {
    let client = Recording::new();
    let mut seq = sequencer(client.clone()).await;
    let forest = seq.forest().clone();
    let entry = class("test-Bad-Category", "1.2.840.77.1.5.9948")
        .to_entry(&forest)
        .with(attrs::DEFAULT_OBJECT_CATEGORY, ["not a dn"]);

    let scenario = Scenario::new("malformed category").step(
        Step::new("add class", Operation::Add(entry))
            .expect_failure(ViolationKind::InvalidDnSyntax),
    );

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    assert_eq!(client.adds(), 1);
    assert!(seq.schema().find("test-Bad-Category").is_none());
}

#[tokio::test]
async fn test_internal_id_modification_rejected_before_writing() {
    let client = Recording::new();
    let mut seq = sequencer(client.clone()).await;
    let dn = seq.forest().element_dn("test-Seq-Attr");

    let scenario = Scenario::new("intId modify")
        .step(Step::new(
            "add attribute",
            Operation::AddElement(attribute("test-Seq-Attr", "1.2.840.77.1.5.9945")),
        ))
        .step(
            Step::new(
                "replace msDS-IntId",
                Operation::Modify {
                    dn,
                    changes: vec![Modification::replace(attrs::MS_DS_INT_ID, ["-1993108831"])],
                },
            )
            .expect_failure(ViolationKind::ConstraintViolation),
        );

    let result = seq.run(&scenario).await;
    assert!(result.passed(), "{}", result);
    assert_eq!(client.modifies(), 0);
}

#[tokio::test]
async fn test_search_checks() {
    let mut seq = sequencer(Recording::new()).await;
    let schema_nc = seq.forest().schema_naming_context.clone();
    let classes = SearchRequest::one_level(schema_nc)
        .with_filter(Filter::equality(attrs::OBJECT_CLASS, "classSchema"))
        .with_attributes([attrs::GOVERNS_ID, attrs::LDAP_DISPLAY_NAME]);

    let passing = Scenario::new("classes").step(
        Step::new("list classes", Operation::Search(classes.clone()))
            .check(EntryCheck::AtLeast(10))
            .check(EntryCheck::present(attrs::GOVERNS_ID))
            .check(EntryCheck::absent(attrs::ATTRIBUTE_ID)),
    );
    assert!(seq.run(&passing).await.passed());

    let failing = Scenario::new("no classes")
        .step(Step::new("list classes", Operation::Search(classes)).check(EntryCheck::Count(0)));
    let result = seq.run(&failing).await;
    match result.divergence.unwrap() {
        Divergence::CheckFailed { index, check, .. } => {
            assert_eq!(index, 0);
            assert_eq!(check, "count == 0");
        }
        other => panic!("unexpected divergence {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_internal_id_is_reported() {
    let client = Recording {
        hide_int_id: true,
        ..Recording::new()
    };
    let mut seq = sequencer(client).await;

    let scenario = Scenario::new("hidden intId").step(Step::new(
        "add attribute",
        Operation::AddElement(attribute("test-Seq-Attr", "1.2.840.77.1.5.9946")),
    ));

    let result = seq.run(&scenario).await;
    assert_eq!(result.steps[0].actual, StepVerdict::Success);
    match result.divergence.unwrap() {
        Divergence::CheckFailed { check, reason, .. } => {
            assert_eq!(check, "msDS-IntId assignment");
            assert!(reason.contains("has no msDS-IntId"));
        }
        other => panic!("unexpected divergence {:?}", other),
    }
}

#[test]
fn test_result_serializes_camel_case() {
    let mut result = ScenarioResult::new("demo");
    result.steps.push(StepRecord {
        index: 0,
        label: "add".to_string(),
        operation: OperationKind::AddElement,
        expected: StepVerdict::Failure(ViolationKind::UnwillingToPerform),
        actual: StepVerdict::Success,
        message: None,
    });
    result.divergence = Some(Divergence::VerdictMismatch {
        index: 0,
        label: "add".to_string(),
        expected: StepVerdict::Failure(ViolationKind::UnwillingToPerform),
        actual: StepVerdict::Success,
        reason: "operation succeeded".to_string(),
    });

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["steps"][0]["operation"], "addElement");
    assert_eq!(json["steps"][0]["actual"]["verdict"], "success");
    assert_eq!(json["divergence"]["type"], "verdictMismatch");
    assert!(json["steps"][0].get("message").is_none());

    let back: ScenarioResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_entry_checks() {
    let forest = crate::schema::ForestState::new(
        crate::schema::FunctionalLevel::DS_DC_FUNCTION_2008,
        Dn::new("CN=Schema,CN=Configuration,DC=example,DC=com").unwrap(),
        Dn::new("DC=example,DC=com").unwrap(),
    );
    let entry = Entry::new(forest.element_dn("x"))
        .with("cn", ["x"])
        .with("name", ["x"])
        .with("msDS-IntId", ["-1993108831"]);
    let entries = vec![entry.clone()];

    assert!(EntryCheck::equals("cn", "x").verify(&entries, &forest).is_ok());
    assert!(EntryCheck::equals("cn", "y").verify(&entries, &forest).is_err());
    assert!(EntryCheck::equals_attribute("cn", "name").verify(&entries, &forest).is_ok());
    assert!(EntryCheck::equals_attribute("cn", "missing").verify(&entries, &forest).is_err());

    let strict = EntryCheck::IntIdConsistentWithPolicy { strict: true };
    assert!(strict.verify(&entries, &forest).is_ok());

    let base = entry.clone().with("systemFlags", ["16"]);
    assert!(strict.verify(&[base], &forest).is_err());

    let twice = vec![entry.clone(), Entry::new(forest.element_dn("y")).with("msDS-IntId", ["-1993108831"])];
    assert!(strict.verify(&twice, &forest).unwrap_err().contains("shared"));

    let out_of_range = Entry::new(forest.element_dn("z")).with("msDS-IntId", ["5"]);
    assert!(strict.verify(&[out_of_range], &forest).is_err());

    let missing = vec![Entry::new(forest.element_dn("w")).with("cn", ["w"])];
    assert!(strict.verify(&missing, &forest).is_err());
    let lenient = EntryCheck::IntIdConsistentWithPolicy { strict: false };
    assert!(lenient.verify(&missing, &forest).is_ok());
}

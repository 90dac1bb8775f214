//! The built-in scenarios against a freshly provisioned directory.

use crate::common;
use futures::future::join_all;
use ldap_schema_harness::config::{DirectoryConfig, HarnessConfig};
use ldap_schema_harness::directory::InMemoryDirectory;
use ldap_schema_harness::error::ViolationKind;
use ldap_schema_harness::scenarios::{self, NameAllocator};
use ldap_schema_harness::schema::{AggregateSchemaView, FunctionalLevel, assert_consistent};
use ldap_schema_harness::sequencer::{Divergence, ScenarioResult, SchemaOperationSequencer, StepVerdict};

async fn run_all(directory: InMemoryDirectory, names: &NameAllocator) -> Vec<ScenarioResult> {
    let mut sequencer = SchemaOperationSequencer::connect(directory).await.unwrap();
    let scenarios = scenarios::all(names, sequencer.forest()).unwrap();
    let mut results = Vec::new();
    for scenario in &scenarios {
        results.push(sequencer.run(scenario).await);
    }
    results
}

async fn assert_aggregate_consistent(directory: &InMemoryDirectory) {
    let forest = directory.forest().await;
    let snapshot = AggregateSchemaView::new(directory, &forest)
        .snapshot()
        .await
        .unwrap();
    if let Err(report) = assert_consistent(&snapshot) {
        panic!("{}", report);
    }
}

#[tokio::test]
async fn test_all_scenarios_pass_at_2008() {
    let directory = common::directory();
    let names = NameAllocator::new(4711);

    let results = run_all(directory.clone(), &names).await;

    assert_eq!(results.len(), 7);
    for result in &results {
        assert_passed!(result);
    }
    assert_aggregate_consistent(&directory).await;
    assert!(directory.stats().await.internal_ids > 0);
}

#[tokio::test]
async fn test_all_scenarios_pass_at_2000() {
    let directory = common::directory_at(FunctionalLevel::DS_DC_FUNCTION_2000);
    let names = NameAllocator::new(4711);

    for result in run_all(directory.clone(), &names).await {
        assert_passed!(result);
    }
    assert_eq!(directory.stats().await.internal_ids, 0);
}

#[tokio::test]
async fn test_scenarios_can_run_repeatedly() {
    let directory = common::directory();
    let names = NameAllocator::new(4711);

    for _ in 0..3 {
        for result in run_all(directory.clone(), &names).await {
            assert_passed!(result);
        }
    }
    assert_aggregate_consistent(&directory).await;
}

#[tokio::test]
async fn test_scenarios_run_concurrently() {
    let directory = common::directory();
    let names = NameAllocator::new(4711);
    let forest = directory.forest().await;
    let scenarios = scenarios::all(&names, &forest).unwrap();

    let runs = scenarios.iter().map(|scenario| {
        let directory = directory.clone();
        async move {
            let mut sequencer = SchemaOperationSequencer::connect(directory).await.unwrap();
            sequencer.run(scenario).await
        }
    });
    let results = join_all(runs).await;

    for result in &results {
        assert_passed!(result);
    }
    assert_aggregate_consistent(&directory).await;
}

#[tokio::test]
async fn test_configured_run() {
    let config = HarnessConfig::from_json_str(
        r#"{"directory": {"functionalLevel": 2}, "oidArc": 31337}"#,
    )
    .unwrap();
    let directory = common::directory_with(config.directory.clone());
    let names = NameAllocator::from_config(&config);
    assert_eq!(names.oid_arc(), 31337);

    for result in run_all(directory, &names).await {
        assert_passed!(result);
    }
}

#[tokio::test]
async fn test_directory_without_schema_master_fails_schema_scenarios() {
    let directory = common::directory_with(DirectoryConfig {
        schema_master: false,
        ..DirectoryConfig::default()
    });
    let names = NameAllocator::new(4711);

    let results = run_all(directory, &names).await;

    assert!(results[0].passed(), "reading the aggregate needs no schema master");
    let update = results
        .iter()
        .find(|r| r.scenario == "schemaUpdateNow")
        .unwrap();
    match &update.divergence {
        Some(Divergence::VerdictMismatch { index, actual, .. }) => {
            assert_eq!(*index, 0);
            assert_eq!(*actual, StepVerdict::Failure(ViolationKind::UnwillingToPerform));
        }
        other => panic!("expected a verdict mismatch, got {:?}", other),
    }
    assert!(results.iter().any(|r| !r.passed()));
}

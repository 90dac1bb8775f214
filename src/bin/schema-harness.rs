//! # Schema Harness
//!
//! Runs the built-in schema extension scenarios against the in-memory
//! reference directory and reports every divergence.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-harness
//! cargo run --bin schema-harness -- harness.json
//! cargo run --bin schema-harness -- --json harness.json
//! RUST_LOG=debug cargo run --bin schema-harness
//! ```
//!
//! The optional configuration file is camelCase JSON, for example:
//!
//! ```json
//! {
//!   "directory": { "functionalLevel": 2, "schemaMaster": true },
//!   "oidArc": 4711,
//!   "parallelScenarios": true
//! }
//! ```
//!
//! ## Output
//!
//! ```text
//! PASS generated schema (1 steps)
//! PASS generated schema is operational (1 steps)
//! FAIL msDS-IntId on classes: step 3 'read class': check [...] failed: ...
//!
//! Scenarios: 6 passed, 1 failed
//! Aggregate schema: consistent
//! ```
//!
//! `--json` prints the scenario results as a JSON array instead.
//!
//! ## Exit Codes
//!
//! - `0`: Every scenario passed and the aggregate schema is consistent
//! - `1`: A scenario diverged, the aggregate schema is inconsistent, or the
//!   harness could not run

use ldap_schema_harness::config::HarnessConfig;
use ldap_schema_harness::directory::InMemoryDirectory;
use ldap_schema_harness::error::HarnessResult;
use ldap_schema_harness::scenarios::{self, NameAllocator};
use ldap_schema_harness::schema::{AggregateSchemaView, assert_consistent};
use ldap_schema_harness::sequencer::{ScenarioResult, SchemaOperationSequencer};
use log::{error, info};
use std::env;
use std::process;

struct Options {
    json: bool,
    config_path: Option<String>,
}

fn parse_args() -> Options {
    let mut options = Options {
        json: false,
        config_path: None,
    };
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => options.json = true,
            "-h" | "--help" => {
                println!("Usage: schema-harness [--json] [config.json]");
                process::exit(0);
            }
            _ => options.config_path = Some(arg),
        }
    }
    options
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let options = parse_args();

    match run(&options).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ Harness failed: {}", e);
            process::exit(1);
        }
    }
}

async fn run(options: &Options) -> HarnessResult<bool> {
    let config = match &options.config_path {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    let directory = InMemoryDirectory::new(config.directory.clone())?;
    let names = NameAllocator::from_config(&config);
    info!("Generated OIDs use arc 1.2.840.{}", names.oid_arc());

    let mut sequencer = SchemaOperationSequencer::connect(directory.clone()).await?;
    let scenarios = scenarios::all(&names, sequencer.forest())?;

    let results = if config.parallel_scenarios {
        let mut handles = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let directory = directory.clone();
            handles.push(tokio::spawn(async move {
                let mut sequencer = SchemaOperationSequencer::connect(directory).await?;
                HarnessResult::Ok(sequencer.run(&scenario).await)
            }));
        }
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result?),
                Err(e) => error!("Scenario task failed: {}", e),
            }
        }
        results
    } else {
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            results.push(sequencer.run(scenario).await);
        }
        results
    };

    let forest = sequencer.forest().clone();
    let consistency = AggregateSchemaView::new(&directory, &forest)
        .snapshot()
        .await
        .map(|snapshot| assert_consistent(&snapshot))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_summary(&results);
        match &consistency {
            Ok(()) => println!("Aggregate schema: consistent"),
            Err(report) => println!("Aggregate schema: {}", report),
        }
    }

    let stats = directory.stats().await;
    info!(
        "Directory holds {} entries, {} schema elements ({} pending), {} msDS-IntId values",
        stats.entries, stats.schema_elements, stats.pending_schema_elements, stats.internal_ids
    );

    let all_passed = results.iter().all(ScenarioResult::passed);
    Ok(all_passed && consistency.is_ok())
}

fn print_summary(results: &[ScenarioResult]) {
    for result in results {
        println!("{}", result);
        if let Some(divergence) = &result.divergence {
            for step in &result.steps {
                let marker = if step.index == divergence.index() { "✗" } else { "✓" };
                println!("    {} {:>2} {:<12} {}", marker, step.index, step.operation, step.label);
            }
        }
    }

    let failed = results.iter().filter(|r| !r.passed()).count();
    println!();
    println!("Scenarios: {} passed, {} failed", results.len() - failed, failed);
}

//! Ordered operation sequencing.
//!
//! A [`Scenario`] is a list of [`Step`]s. Each step issues one directory
//! [`Operation`] and states the verdict it expects: success, or a failure of a
//! given [`crate::error::ViolationKind`]. The [`SchemaOperationSequencer`]
//! runs the steps strictly in order, compares every actual verdict with the
//! expected one and stops at the first divergence.
//!
//! Schema additions issued as [`Operation::AddElement`] are pre-validated by
//! the constraint engine; a rejection is the step's verdict and nothing is
//! written. [`Operation::Barrier`] asks the directory to make pending schema
//! elements live before later steps depend on them.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_schema_harness::config::DirectoryConfig;
//! use ldap_schema_harness::directory::InMemoryDirectory;
//! use ldap_schema_harness::error::ViolationKind;
//! use ldap_schema_harness::schema::SchemaElementDefinition;
//! use ldap_schema_harness::sequencer::{Operation, Scenario, SchemaOperationSequencer, Step};
//! use ldap_schema_harness::value_objects::Oid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new(DirectoryConfig::default())?;
//! let mut sequencer = SchemaOperationSequencer::connect(directory).await?;
//!
//! let attribute = SchemaElementDefinition::attribute("test-Attr", Oid::new("1.2.840.4711.1.5.9940")?)
//!     .with_syntax("2.5.5.12", 64);
//! let scenario = Scenario::new("client intId")
//!     .step(
//!         Step::new("add with msDS-IntId", Operation::AddElement(attribute.with_client_internal_id(-1)))
//!             .expect_failure(ViolationKind::UnwillingToPerform),
//!     );
//!
//! let result = sequencer.run(&scenario).await;
//! assert!(result.passed());
//! # Ok(())
//! # }
//! ```

mod core;
mod result;
mod step;

#[cfg(test)]
mod tests;

pub use self::core::SchemaOperationSequencer;
pub use result::{Divergence, ScenarioResult, StepRecord};
pub use step::{EntryCheck, Operation, OperationKind, Scenario, Step, StepVerdict};

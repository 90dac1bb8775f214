//! Directory schema-extension test harness for Rust.
//!
//! Drives a directory through ordered schema-extension scenarios and checks
//! that it enforces the rules an Active Directory compatible server must
//! enforce: uniqueness of identifiers and names, legal parent classes and
//! categories, system-assigned `msDS-IntId` values, `schemaUpdateNow`
//! publication and the generated aggregate schema.
//!
//! # Core Components
//!
//! - [`ConstraintEngine`] - Decides whether a schema element may be added
//! - [`IntIdAssigner`] - `msDS-IntId` policy and synthesis
//! - [`SchemaOperationSequencer`] - Runs scenarios step by step against a directory
//! - [`AggregateSchemaView`] - Reads and checks the generated aggregate schema
//! - [`DirectoryClient`] - Trait for the directory under test
//! - [`InMemoryDirectory`] - Reference directory for running without a server
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ldap_schema_harness::{InMemoryDirectory, SchemaOperationSequencer};
//! use ldap_schema_harness::config::DirectoryConfig;
//! use ldap_schema_harness::scenarios::{self, NameAllocator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new(DirectoryConfig::default())?;
//! let mut sequencer = SchemaOperationSequencer::connect(directory).await?;
//! let names = NameAllocator::new(4711);
//!
//! for scenario in scenarios::all(&names, sequencer.forest())? {
//!     println!("{}", sequencer.run(&scenario).await);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod ldif;
pub mod scenarios;
pub mod schema;
pub mod sequencer;
pub mod value_objects;

// Re-export commonly used types for convenience
pub use config::{ConfigurationError, DirectoryConfig, HarnessConfig};
pub use directory::{DirectoryClient, Entry, InMemoryDirectory, Modification, SearchRequest};
pub use error::{DirectoryError, DirectoryResult, HarnessError, HarnessResult, ViolationKind};
pub use schema::{
    AggregateSchemaView, ConstraintEngine, ForestState, FunctionalLevel, IntIdAssigner,
    SchemaElementDefinition, SchemaSet, ValidationVerdict,
};
pub use sequencer::{Divergence, Operation, Scenario, ScenarioResult, SchemaOperationSequencer, Step, StepVerdict};
pub use value_objects::{Dn, Oid};

//! Schema definitions, constraint evaluation and the aggregate schema.
//!
//! This module models directory schema elements (attribute types and object
//! classes), the rules a directory applies when new elements are added, the
//! `msDS-IntId` assignment policy and the generated aggregate schema.
//!
//! # Key Types
//!
//! - [`SchemaElementDefinition`] - A candidate attribute or class
//! - [`SchemaSet`] - The accepted elements, split into published and pending
//! - [`ConstraintEngine`] - Decides whether a definition or change is allowed
//! - [`IntIdAssigner`] - Decides and synthesizes `msDS-IntId` values
//! - [`AggregateSchemaView`] - Reads and checks the generated aggregate entry
//!
//! # Examples
//!
//! ```rust
//! use ldap_schema_harness::schema::{
//!     ConstraintEngine, ForestState, FunctionalLevel, SchemaElementDefinition, SchemaSet,
//! };
//! use ldap_schema_harness::value_objects::{Dn, Oid};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let forest = ForestState::new(
//!     FunctionalLevel::DS_DC_FUNCTION_2008,
//!     Dn::new("CN=Schema,CN=Configuration,DC=example,DC=com")?,
//!     Dn::new("DC=example,DC=com")?,
//! );
//! let schema = SchemaSet::bootstrap()?;
//! let attribute = SchemaElementDefinition::attribute("test-Attr", Oid::new("1.2.840.4711.1.5.9940")?)
//!     .with_syntax("2.5.5.12", 64)
//!     .single_valued(true);
//!
//! assert!(ConstraintEngine::new().evaluate(&attribute, &forest, &schema).is_accepted());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod constraints;
pub mod description;
pub mod embedded;
pub mod intid;
pub mod set;
pub mod syntax;
pub mod types;


pub use aggregate::{AggregateSchemaView, AggregateSnapshot, ConsistencyIssue, ConsistencyReport, assert_consistent};
pub use constraints::{ConstraintEngine, ValidationVerdict};
pub use intid::IntIdAssigner;
pub use set::{AcceptedElement, SchemaSet};
pub use types::{
    ClassCategory, ElementKind, ForestState, FunctionalLevel, SchemaElementDefinition, SystemFlags,
};

//! Value objects for directory identifiers.
//!
//! Type-safe wrappers that validate at construction time, so that malformed
//! object identifiers and distinguished names cannot reach the constraint
//! engine or the directory collaborator.
//!
//! - [`Oid`] - dotted-decimal object identifier (`attributeID` / `governsID`)
//! - [`Dn`] - distinguished name with case-insensitive comparison

pub mod dn;
pub mod oid;

pub use dn::{Dn, Rdn};
pub use oid::Oid;

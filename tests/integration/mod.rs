//! Integration tests for the schema harness.
//!
//! Every test provisions its own in-memory directory, so tests are free to
//! run in parallel.
//!
//! ## Test Organization
//!
//! - `intid` - `msDS-IntId` policy, synthesis and immutability
//! - `sequencing` - Pre-validation, divergence reporting and the barrier
//! - `aggregate` - The generated aggregate schema and its consistency
//! - `end_to_end` - The built-in scenarios against a fresh directory
//! - `properties` - Property-based checks of the engine and assigner
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test lib integration
//! cargo test --test lib integration::sequencing -- --nocapture
//! ```

pub mod aggregate;
pub mod end_to_end;
pub mod intid;
pub mod properties;
pub mod sequencing;

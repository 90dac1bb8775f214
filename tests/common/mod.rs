//! Common test utilities for schema harness testing.
//!
//! This module provides assertion macros, directory constructors, builders
//! and a recording directory double shared by the integration suites.

use ldap_schema_harness::config::DirectoryConfig;
use ldap_schema_harness::directory::InMemoryDirectory;
use ldap_schema_harness::schema::{ForestState, FunctionalLevel};
use ldap_schema_harness::value_objects::Dn;

/// Assert that a directory result failed with the given violation kind.
macro_rules! assert_violation {
    ($result:expr, $kind:expr) => {
        match $result {
            Ok(_) => panic!("Expected {:?}, but the operation succeeded", $kind),
            Err(err) => assert_eq!(err.kind, $kind, "unexpected error: {}", err),
        }
    };
}

/// Assert that a scenario passed, printing the divergence otherwise.
macro_rules! assert_passed {
    ($result:expr) => {
        let result = &$result;
        assert!(result.passed(), "{}", result);
    };
}

pub mod builders;
pub mod recording;

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A directory with the default configuration (functional level 2008).
pub fn directory() -> InMemoryDirectory {
    directory_with(DirectoryConfig::default())
}

pub fn directory_at(level: FunctionalLevel) -> InMemoryDirectory {
    directory_with(DirectoryConfig {
        functional_level: level,
        ..DirectoryConfig::default()
    })
}

pub fn directory_with(config: DirectoryConfig) -> InMemoryDirectory {
    init_logging();
    InMemoryDirectory::new(config).expect("directory configuration is valid")
}

/// Forest facts matching the default directory, at the given level.
pub fn forest(level: FunctionalLevel) -> ForestState {
    ForestState::new(
        level,
        Dn::new("CN=Schema,CN=Configuration,DC=example,DC=com").unwrap(),
        Dn::new("DC=example,DC=com").unwrap(),
    )
}

/// Every functional level the harness knows.
pub fn all_levels() -> Vec<FunctionalLevel> {
    (0..=7).map(|level| FunctionalLevel::new(level).unwrap()).collect()
}

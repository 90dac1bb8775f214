//! Harness configuration.
//!
//! Configuration is read from camelCase JSON or assembled with a builder. All
//! fields have defaults, so an empty JSON object is a valid configuration.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_schema_harness::config::HarnessConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::builder()
//!     .domain_dn("DC=samba,DC=example,DC=com")
//!     .functional_level(2)
//!     .parallel_scenarios(true)
//!     .build()?;
//! assert_eq!(config.directory.functional_level.value(), 2);
//!
//! let from_json = HarnessConfig::from_json_str(r#"{"directory": {"schemaMaster": false}}"#)?;
//! assert!(!from_json.directory.schema_master);
//! # Ok(())
//! # }
//! ```

use crate::schema::FunctionalLevel;
use crate::value_objects::Dn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A field holds a value the harness can not use
    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },

    /// The configuration file could not be read
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigurationError {
    fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

fn default_domain_dn() -> Dn {
    Dn::new("DC=example,DC=com").unwrap_or_else(|_| Dn::root())
}

fn default_true() -> bool {
    true
}

fn default_functional_level() -> FunctionalLevel {
    FunctionalLevel::DS_DC_FUNCTION_2008
}

/// Settings of the in-memory reference directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Default naming context; configuration and schema live below it
    #[serde(default = "default_domain_dn")]
    pub domain_dn: Dn,
    /// Forest functional level published in the root DSE
    #[serde(default = "default_functional_level")]
    pub functional_level: FunctionalLevel,
    /// Whether this directory holds the schema master role
    #[serde(default = "default_true")]
    pub schema_master: bool,
    /// Whether the bound identity may write to the schema
    #[serde(default = "default_true")]
    pub allow_schema_updates: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            domain_dn: default_domain_dn(),
            functional_level: default_functional_level(),
            schema_master: true,
            allow_schema_updates: true,
        }
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.domain_dn.is_root() {
            return Err(ConfigurationError::validation("domainDn must not be empty"));
        }
        FunctionalLevel::new(self.functional_level.value())
            .map_err(|e| ConfigurationError::validation(e.to_string()))?;
        Ok(())
    }
}

/// Top-level harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Second OID arc of generated element identifiers (`1.2.840.<arc>...`).
    /// Chosen at random when absent.
    #[serde(default)]
    pub oid_arc: Option<u32>,
    /// Run independent scenarios concurrently
    #[serde(default)]
    pub parallel_scenarios: bool,
}

impl HarnessConfig {
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::new()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.directory.validate()?;
        if self.oid_arc == Some(0) {
            return Err(ConfigurationError::validation("oidArc must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`HarnessConfig`].
#[derive(Debug, Default)]
pub struct HarnessConfigBuilder {
    domain_dn: Option<String>,
    functional_level: Option<u32>,
    schema_master: Option<bool>,
    allow_schema_updates: Option<bool>,
    oid_arc: Option<u32>,
    parallel_scenarios: bool,
}

impl HarnessConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_dn(mut self, dn: impl Into<String>) -> Self {
        self.domain_dn = Some(dn.into());
        self
    }

    pub fn functional_level(mut self, level: u32) -> Self {
        self.functional_level = Some(level);
        self
    }

    pub fn schema_master(mut self, master: bool) -> Self {
        self.schema_master = Some(master);
        self
    }

    pub fn allow_schema_updates(mut self, allow: bool) -> Self {
        self.allow_schema_updates = Some(allow);
        self
    }

    pub fn oid_arc(mut self, arc: u32) -> Self {
        self.oid_arc = Some(arc);
        self
    }

    pub fn parallel_scenarios(mut self, parallel: bool) -> Self {
        self.parallel_scenarios = parallel;
        self
    }

    pub fn build(self) -> Result<HarnessConfig, ConfigurationError> {
        let mut directory = DirectoryConfig::default();
        if let Some(dn) = self.domain_dn {
            directory.domain_dn =
                Dn::new(dn).map_err(|e| ConfigurationError::validation(e.to_string()))?;
        }
        if let Some(level) = self.functional_level {
            directory.functional_level = FunctionalLevel::new(level)
                .map_err(|e| ConfigurationError::validation(e.to_string()))?;
        }
        if let Some(master) = self.schema_master {
            directory.schema_master = master;
        }
        if let Some(allow) = self.allow_schema_updates {
            directory.allow_schema_updates = allow;
        }

        let config = HarnessConfig {
            directory,
            oid_arc: self.oid_arc,
            parallel_scenarios: self.parallel_scenarios,
        };
        config.validate()?;
        Ok(config)
    }
}

//! Error types for schema harness operations.
//!
//! This module defines the closed set of directory violation kinds, the typed
//! failure returned by every directory collaborator call, and the top-level
//! error surfaced by the harness itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for harness operations.
///
/// Covers failures that are not step verdicts: broken configuration,
/// unparseable LDIF or filters, a root DSE missing mandatory attributes, and
/// directory failures outside of a scenario step.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A directory operation failed outside of a scenario step
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Value object or definition validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Harness configuration is invalid or unreadable
    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigurationError),

    /// LDIF input could not be parsed
    #[error("LDIF error: {0}")]
    Ldif(#[from] crate::ldif::LdifError),

    /// Search filter could not be parsed
    #[error("Filter error: {0}")]
    Filter(#[from] crate::directory::filter::FilterError),

    /// Schema description value could not be parsed
    #[error("Schema description error: {0}")]
    Description(#[from] crate::schema::description::DescriptionError),

    /// The root DSE lacks an attribute the harness needs
    #[error("Root DSE is missing attribute '{attribute}'")]
    RootDse { attribute: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// The closed set of directory result kinds the harness distinguishes.
///
/// Every failed directory operation is classified into exactly one of these;
/// result codes the harness does not know map to [`ViolationKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    NoSuchObject,
    AttributeOrValueExists,
    EntryAlreadyExists,
    UnwillingToPerform,
    NotAllowedOnNonLeaf,
    Other,
    InvalidDnSyntax,
    NoSuchAttribute,
    InsufficientAccessRights,
    ObjectClassViolation,
    NotAllowedOnRdn,
    NamingViolation,
    ConstraintViolation,
    UndefinedAttributeType,
}

impl ViolationKind {
    /// All violation kinds, in result-code order.
    pub const ALL: [ViolationKind; 14] = [
        ViolationKind::NoSuchAttribute,
        ViolationKind::UndefinedAttributeType,
        ViolationKind::ConstraintViolation,
        ViolationKind::AttributeOrValueExists,
        ViolationKind::NoSuchObject,
        ViolationKind::InvalidDnSyntax,
        ViolationKind::InsufficientAccessRights,
        ViolationKind::UnwillingToPerform,
        ViolationKind::NamingViolation,
        ViolationKind::ObjectClassViolation,
        ViolationKind::NotAllowedOnNonLeaf,
        ViolationKind::NotAllowedOnRdn,
        ViolationKind::EntryAlreadyExists,
        ViolationKind::Other,
    ];

    /// LDAP result code (RFC 4511) for this kind.
    pub fn result_code(self) -> u32 {
        match self {
            ViolationKind::NoSuchAttribute => 16,
            ViolationKind::UndefinedAttributeType => 17,
            ViolationKind::ConstraintViolation => 19,
            ViolationKind::AttributeOrValueExists => 20,
            ViolationKind::NoSuchObject => 32,
            ViolationKind::InvalidDnSyntax => 34,
            ViolationKind::InsufficientAccessRights => 50,
            ViolationKind::UnwillingToPerform => 53,
            ViolationKind::NamingViolation => 64,
            ViolationKind::ObjectClassViolation => 65,
            ViolationKind::NotAllowedOnNonLeaf => 66,
            ViolationKind::NotAllowedOnRdn => 67,
            ViolationKind::EntryAlreadyExists => 68,
            ViolationKind::Other => 80,
        }
    }

    /// Classify an LDAP result code. Codes outside the closed set are `Other`.
    pub fn from_result_code(code: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.result_code() == code)
            .unwrap_or(ViolationKind::Other)
    }

    /// RFC 4511 name of the result.
    pub fn ldap_name(self) -> &'static str {
        match self {
            ViolationKind::NoSuchObject => "noSuchObject",
            ViolationKind::AttributeOrValueExists => "attributeOrValueExists",
            ViolationKind::EntryAlreadyExists => "entryAlreadyExists",
            ViolationKind::UnwillingToPerform => "unwillingToPerform",
            ViolationKind::NotAllowedOnNonLeaf => "notAllowedOnNonLeaf",
            ViolationKind::Other => "other",
            ViolationKind::InvalidDnSyntax => "invalidDNSyntax",
            ViolationKind::NoSuchAttribute => "noSuchAttribute",
            ViolationKind::InsufficientAccessRights => "insufficientAccessRights",
            ViolationKind::ObjectClassViolation => "objectClassViolation",
            ViolationKind::NotAllowedOnRdn => "notAllowedOnRDN",
            ViolationKind::NamingViolation => "namingViolation",
            ViolationKind::ConstraintViolation => "constraintViolation",
            ViolationKind::UndefinedAttributeType => "undefinedAttributeType",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ldap_name(), self.result_code())
    }
}

/// A failed directory operation, classified by kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DirectoryError {
    /// Classified result of the failed operation
    pub kind: ViolationKind,
    /// Human-readable diagnostic from the directory
    pub message: String,
}

/// Result type for directory collaborator operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl DirectoryError {
    /// Create an error of the given kind.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a no-such-object error for a DN
    pub fn no_such_object(dn: impl fmt::Display) -> Self {
        Self::new(ViolationKind::NoSuchObject, format!("no such object: {}", dn))
    }

    /// Create an entry-already-exists error for a DN
    pub fn already_exists(dn: impl fmt::Display) -> Self {
        Self::new(
            ViolationKind::EntryAlreadyExists,
            format!("entry already exists: {}", dn),
        )
    }

    /// Create an unwilling-to-perform error
    pub fn unwilling(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::UnwillingToPerform, message)
    }

    /// Create a constraint-violation error
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::ConstraintViolation, message)
    }

    /// Create an object-class-violation error
    pub fn object_class(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::ObjectClassViolation, message)
    }
}

/// Validation errors for value objects and schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// OID is not a well-formed dotted-decimal identifier
    #[error("Invalid object identifier: '{value}'")]
    InvalidOid { value: String },

    /// DN could not be parsed
    #[error("Invalid distinguished name '{value}': {details}")]
    InvalidDn { value: String, details: String },

    /// An internal identifier was already assigned to the element
    #[error("Element '{name}' already carries internal id {existing}")]
    InternalIdAlreadyAssigned { name: String, existing: i32 },

    /// Functional level value outside the known range
    #[error("Unknown functional level: {level}")]
    UnknownFunctionalLevel { level: u32 },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

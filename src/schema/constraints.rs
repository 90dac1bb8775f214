//! Constraint evaluation for schema element definitions.
//!
//! The engine is pure: every call is a function of the definition, the
//! forest facts and the accepted element set passed in. It answers with a
//! [`ValidationVerdict`] and never writes anything.

use super::set::SchemaSet;
use super::syntax;
use super::types::{ClassCategory, ElementKind, ForestState, SchemaElementDefinition};
use crate::directory::{Modification, attrs};
use crate::error::{DirectoryError, DirectoryResult, ViolationKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating a definition or a modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "verdict")]
pub enum ValidationVerdict {
    Accepted,
    Rejected { kind: ViolationKind, reason: String },
}

impl ValidationVerdict {
    pub fn rejected(kind: ViolationKind, reason: impl Into<String>) -> Self {
        ValidationVerdict::Rejected {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted)
    }

    /// Violation kind of a rejection.
    pub fn kind(&self) -> Option<ViolationKind> {
        match self {
            ValidationVerdict::Accepted => None,
            ValidationVerdict::Rejected { kind, .. } => Some(*kind),
        }
    }

    /// Convert into the error a directory would return.
    pub fn into_result(self) -> DirectoryResult<()> {
        match self {
            ValidationVerdict::Accepted => Ok(()),
            ValidationVerdict::Rejected { kind, reason } => Err(DirectoryError::new(kind, reason)),
        }
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationVerdict::Accepted => f.write_str("accepted"),
            ValidationVerdict::Rejected { kind, reason } => {
                write!(f, "rejected with {}: {}", kind, reason)
            }
        }
    }
}

/// Attributes that define an element's identity; they can not change once
/// the element exists.
const DEFINING_ATTRIBUTES: &[&str] = &[
    attrs::ATTRIBUTE_ID,
    attrs::GOVERNS_ID,
    attrs::SCHEMA_ID_GUID,
    attrs::ATTRIBUTE_SYNTAX,
    attrs::OM_SYNTAX,
    attrs::SUB_CLASS_OF,
    attrs::OBJECT_CLASS_CATEGORY,
];

const RDN_ATTRIBUTES: &[&str] = &[attrs::CN, attrs::NAME];

/// Evaluates proposed schema elements and changes to existing ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintEngine;

impl ConstraintEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `definition` may be added to `schema`.
    ///
    /// Rules are checked in order and the first failure wins:
    ///
    /// 1. a submitter-supplied `msDS-IntId` is refused (`UnwillingToPerform`)
    /// 2. a class needs a published superclass (`NamingViolation`)
    /// 3. `defaultObjectCategory` must be the element itself or a published
    ///    class (`ConstraintViolation`)
    /// 4. OID, common name and display name must be unused (`EntryAlreadyExists`)
    /// 5. an attribute needs a valid `attributeSyntax`/`oMSyntax` pair
    ///    (`ObjectClassViolation`)
    /// 6. a class may only reference published attributes
    ///    (`UndefinedAttributeType`) and auxiliary classes (`ObjectClassViolation`)
    ///
    /// Rule 1 runs first so a supplied `msDS-IntId` is refused no matter how
    /// the other fields look.
    pub fn evaluate(
        &self,
        definition: &SchemaElementDefinition,
        forest: &ForestState,
        schema: &SchemaSet,
    ) -> ValidationVerdict {
        let verdict = self.check(definition, forest, schema);
        if let ValidationVerdict::Rejected { kind, reason } = &verdict {
            debug!("Rejected {} '{}': {} ({})", definition.kind(), definition.name(), kind, reason);
        }
        verdict
    }

    fn check(
        &self,
        definition: &SchemaElementDefinition,
        forest: &ForestState,
        schema: &SchemaSet,
    ) -> ValidationVerdict {
        if let Some(id) = definition.internal_id() {
            return ValidationVerdict::rejected(
                ViolationKind::UnwillingToPerform,
                format!("msDS-IntId {} is assigned by the system and can not be supplied", id),
            );
        }

        if definition.kind() == ElementKind::Class {
            match definition.parent_class() {
                None => {
                    return ValidationVerdict::rejected(
                        ViolationKind::NamingViolation,
                        "class has no subClassOf",
                    );
                }
                Some(parent) if schema.resolve_class(parent).is_none() => {
                    return ValidationVerdict::rejected(
                        ViolationKind::NamingViolation,
                        format!("subClassOf '{}' is not a known class", parent),
                    );
                }
                Some(_) => {}
            }
        }

        if let Some(category) = definition.default_object_category() {
            let own_dn = forest.element_dn(definition.name());
            if *category != own_dn && schema.resolve_class_dn(forest, category).is_none() {
                return ValidationVerdict::rejected(
                    ViolationKind::ConstraintViolation,
                    format!("defaultObjectCategory '{}' does not name a class", category),
                );
            }
        }

        let oid = definition.object_identifier();
        if let Some(existing) = schema.find_by_oid(oid.as_str()) {
            return ValidationVerdict::rejected(
                ViolationKind::EntryAlreadyExists,
                format!("OID {} is already used by '{}'", oid, existing.name()),
            );
        }
        let display_name = definition.ldap_display_name();
        for name in [definition.name(), display_name.as_str()] {
            if let Some(existing) = schema.find(name) {
                return ValidationVerdict::rejected(
                    ViolationKind::EntryAlreadyExists,
                    format!("name '{}' is already used by '{}'", name, existing.name()),
                );
            }
        }

        match definition.kind() {
            ElementKind::Attribute => {
                if let Err(reason) =
                    syntax::validate_pair(definition.attribute_syntax(), definition.om_syntax())
                {
                    return ValidationVerdict::rejected(ViolationKind::ObjectClassViolation, reason);
                }
            }
            ElementKind::Class => {
                let referenced = definition
                    .required_attributes()
                    .iter()
                    .chain(definition.optional_attributes())
                    .map(String::as_str)
                    .chain(definition.rdn_attribute());
                for attribute in referenced {
                    if schema.resolve_attribute(attribute).is_none() {
                        return ValidationVerdict::rejected(
                            ViolationKind::UndefinedAttributeType,
                            format!("attribute '{}' is not defined", attribute),
                        );
                    }
                }

                for auxiliary in definition.auxiliary_classes() {
                    let usable = schema
                        .resolve_class(auxiliary)
                        .and_then(|element| element.definition().class_category())
                        .is_some_and(|category| {
                            matches!(category, ClassCategory::Auxiliary | ClassCategory::Abstract)
                        });
                    if !usable {
                        return ValidationVerdict::rejected(
                            ViolationKind::ObjectClassViolation,
                            format!("'{}' is not a known auxiliary class", auxiliary),
                        );
                    }
                }
            }
        }

        ValidationVerdict::Accepted
    }

    /// Decide whether `changes` may be applied to the existing `element`.
    pub fn evaluate_modification(
        &self,
        element: &SchemaElementDefinition,
        changes: &[Modification],
    ) -> ValidationVerdict {
        for change in changes {
            if change.targets(attrs::MS_DS_INT_ID) {
                return ValidationVerdict::rejected(
                    ViolationKind::ConstraintViolation,
                    format!("msDS-IntId of '{}' can not be modified", element.name()),
                );
            }
        }

        for change in changes {
            if DEFINING_ATTRIBUTES.iter().any(|name| change.targets(name)) {
                return ValidationVerdict::rejected(
                    ViolationKind::ConstraintViolation,
                    format!("{} of '{}' can not be modified", change.attribute, element.name()),
                );
            }
            if RDN_ATTRIBUTES.iter().any(|name| change.targets(name)) {
                return ValidationVerdict::rejected(
                    ViolationKind::NotAllowedOnRdn,
                    format!("{} is the naming attribute of '{}'", change.attribute, element.name()),
                );
            }
        }

        ValidationVerdict::Accepted
    }
}

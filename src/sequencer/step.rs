//! Scenario building blocks: steps, operations, expected verdicts and entry
//! checks.

use crate::directory::{Entry, Modification, SearchRequest, attrs};
use crate::error::{DirectoryResult, ViolationKind};
use crate::ldif::LdifRecord;
use crate::schema::{ForestState, FunctionalLevel, IntIdAssigner, SchemaElementDefinition, SystemFlags};
use crate::value_objects::Dn;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Outcome of a step: success or a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "verdict", content = "kind")]
pub enum StepVerdict {
    Success,
    Failure(ViolationKind),
}

impl StepVerdict {
    pub fn of<T>(result: &DirectoryResult<T>) -> Self {
        match result {
            Ok(_) => StepVerdict::Success,
            Err(e) => StepVerdict::Failure(e.kind),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, StepVerdict::Success)
    }
}

impl fmt::Display for StepVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepVerdict::Success => f.write_str("success"),
            StepVerdict::Failure(kind) => write!(f, "failure({})", kind),
        }
    }
}

/// Kind of operation a step performs, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    AddElement,
    Add,
    Modify,
    Search,
    Delete,
    DeleteForce,
    Barrier,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::AddElement => "addElement",
            OperationKind::Add => "add",
            OperationKind::Modify => "modify",
            OperationKind::Search => "search",
            OperationKind::Delete => "delete",
            OperationKind::DeleteForce => "deleteForce",
            OperationKind::Barrier => "barrier",
        };
        f.pad(name)
    }
}

/// A directory operation issued by a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Add a schema element; pre-validated before anything is written
    AddElement(SchemaElementDefinition),
    Add(Entry),
    Modify { dn: Dn, changes: Vec<Modification> },
    Search(SearchRequest),
    Delete(Dn),
    /// Delete that treats a missing entry as success
    DeleteForce(Dn),
    /// Make pending schema changes live (`schemaUpdateNow`)
    Barrier,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AddElement(_) => OperationKind::AddElement,
            Operation::Add(_) => OperationKind::Add,
            Operation::Modify { .. } => OperationKind::Modify,
            Operation::Search(_) => OperationKind::Search,
            Operation::Delete(_) => OperationKind::Delete,
            Operation::DeleteForce(_) => OperationKind::DeleteForce,
            Operation::Barrier => OperationKind::Barrier,
        }
    }
}

impl From<LdifRecord> for Operation {
    fn from(record: LdifRecord) -> Self {
        match record {
            LdifRecord::Add(entry) => Operation::Add(entry),
            LdifRecord::Modify { dn, changes } => Operation::Modify { dn, changes },
            LdifRecord::Delete(dn) => Operation::Delete(dn),
        }
    }
}

/// A condition on the entries returned by a successful search step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCheck {
    /// Exactly this many entries
    Count(usize),
    /// At least this many entries
    AtLeast(usize),
    /// Every entry holds the attribute
    Present(String),
    /// No entry holds the attribute
    Absent(String),
    /// Every entry's first value of `attribute` equals `value`
    Equals { attribute: String, value: String },
    /// Every entry's first values of the two attributes are equal
    EqualsAttribute { attribute: String, other: String },
    /// `msDS-IntId` is present exactly where the assignment policy says it
    /// should be, unique and in range. In non-strict mode a missing
    /// identifier is only logged.
    IntIdConsistentWithPolicy { strict: bool },
}

impl EntryCheck {
    pub fn present(attribute: impl Into<String>) -> Self {
        EntryCheck::Present(attribute.into())
    }

    pub fn absent(attribute: impl Into<String>) -> Self {
        EntryCheck::Absent(attribute.into())
    }

    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        EntryCheck::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn equals_attribute(attribute: impl Into<String>, other: impl Into<String>) -> Self {
        EntryCheck::EqualsAttribute {
            attribute: attribute.into(),
            other: other.into(),
        }
    }

    /// Apply the check, returning a description of the first entry that
    /// violates it.
    pub fn verify(&self, entries: &[Entry], forest: &ForestState) -> Result<(), String> {
        match self {
            EntryCheck::Count(n) if entries.len() != *n => {
                Err(format!("expected {} entries, got {}", n, entries.len()))
            }
            EntryCheck::AtLeast(n) if entries.len() < *n => {
                Err(format!("expected at least {} entries, got {}", n, entries.len()))
            }
            EntryCheck::Count(_) | EntryCheck::AtLeast(_) => Ok(()),
            EntryCheck::Present(attribute) => entries
                .iter()
                .find(|e| !e.contains(attribute))
                .map_or(Ok(()), |e| Err(format!("{} has no {}", e.dn(), attribute))),
            EntryCheck::Absent(attribute) => entries
                .iter()
                .find(|e| e.contains(attribute))
                .map_or(Ok(()), |e| Err(format!("{} unexpectedly has {}", e.dn(), attribute))),
            EntryCheck::Equals { attribute, value } => {
                for entry in entries {
                    if entry.first(attribute) != Some(value.as_str()) {
                        return Err(format!(
                            "{}: {} is {:?}, expected '{}'",
                            entry.dn(),
                            attribute,
                            entry.first(attribute),
                            value
                        ));
                    }
                }
                Ok(())
            }
            EntryCheck::EqualsAttribute { attribute, other } => {
                for entry in entries {
                    let left = entry.first(attribute);
                    if left.is_none() || left != entry.first(other) {
                        return Err(format!(
                            "{}: {} is {:?} but {} is {:?}",
                            entry.dn(),
                            attribute,
                            left,
                            other,
                            entry.first(other)
                        ));
                    }
                }
                Ok(())
            }
            EntryCheck::IntIdConsistentWithPolicy { strict } => {
                verify_int_ids(entries, forest.functional_level, *strict)
            }
        }
    }
}

fn verify_int_ids(entries: &[Entry], level: FunctionalLevel, strict: bool) -> Result<(), String> {
    let mut seen: HashMap<i32, &Dn> = HashMap::new();
    let mut missing = 0usize;

    for entry in entries {
        let flags = match entry.first(attrs::SYSTEM_FLAGS) {
            Some(raw) => SystemFlags::parse(raw)
                .ok_or_else(|| format!("{}: systemFlags '{}' is not an integer", entry.dn(), raw))?,
            None => SystemFlags::default(),
        };
        let expected = level >= FunctionalLevel::DS_DC_FUNCTION_2003 && !flags.is_base_object();

        match entry.first(attrs::MS_DS_INT_ID) {
            Some(raw) => {
                if !expected {
                    return Err(format!("{} has msDS-IntId {} but should have none", entry.dn(), raw));
                }
                let id: i32 = raw
                    .parse()
                    .map_err(|_| format!("{}: msDS-IntId '{}' is not an integer", entry.dn(), raw))?;
                if !IntIdAssigner::in_range(id) {
                    return Err(format!("{}: msDS-IntId {} is outside the reserved range", entry.dn(), id));
                }
                if let Some(first) = seen.insert(id, entry.dn()) {
                    return Err(format!("msDS-IntId {} is shared by {} and {}", id, first, entry.dn()));
                }
            }
            None if expected => {
                if strict {
                    return Err(format!("{} has no msDS-IntId", entry.dn()));
                }
                missing += 1;
                warn!(
                    "{:3} warning: msDS-IntId expected on: {:<30} {}",
                    missing,
                    entry.first(attrs::ATTRIBUTE_ID).unwrap_or("?"),
                    entry.first(attrs::CN).unwrap_or("?")
                );
            }
            None => {}
        }
    }
    Ok(())
}

impl fmt::Display for EntryCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryCheck::Count(n) => write!(f, "count == {}", n),
            EntryCheck::AtLeast(n) => write!(f, "count >= {}", n),
            EntryCheck::Present(a) => write!(f, "{} present", a),
            EntryCheck::Absent(a) => write!(f, "{} absent", a),
            EntryCheck::Equals { attribute, value } => write!(f, "{} == '{}'", attribute, value),
            EntryCheck::EqualsAttribute { attribute, other } => write!(f, "{} == {}", attribute, other),
            EntryCheck::IntIdConsistentWithPolicy { strict } => {
                write!(f, "msDS-IntId consistent with policy (strict: {})", strict)
            }
        }
    }
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub label: String,
    pub operation: Operation,
    pub expected: StepVerdict,
    pub checks: Vec<EntryCheck>,
}

impl Step {
    /// A step expected to succeed.
    pub fn new(label: impl Into<String>, operation: Operation) -> Self {
        Self {
            label: label.into(),
            operation,
            expected: StepVerdict::Success,
            checks: Vec::new(),
        }
    }

    pub fn expect_failure(mut self, kind: ViolationKind) -> Self {
        self.expected = StepVerdict::Failure(kind);
        self
    }

    pub fn check(mut self, check: EntryCheck) -> Self {
        self.checks.push(check);
        self
    }
}

/// A named, ordered list of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Builder-style helper appending several steps.
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

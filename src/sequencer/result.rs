//! Scenario outcome reporting.

use super::step::{OperationKind, StepVerdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened in one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub index: usize,
    pub label: String,
    pub operation: OperationKind,
    pub expected: StepVerdict,
    pub actual: StepVerdict,
    /// Directory or pre-validation message for a failed operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The first point where a scenario departed from its expectations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Divergence {
    /// The operation's verdict was not the expected one
    VerdictMismatch {
        index: usize,
        label: String,
        expected: StepVerdict,
        actual: StepVerdict,
        reason: String,
    },
    /// The verdict matched but a check on the result failed
    CheckFailed {
        index: usize,
        label: String,
        check: String,
        reason: String,
    },
}

impl Divergence {
    pub fn index(&self) -> usize {
        match self {
            Divergence::VerdictMismatch { index, .. } | Divergence::CheckFailed { index, .. } => {
                *index
            }
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Divergence::VerdictMismatch { label, .. } | Divergence::CheckFailed { label, .. } => {
                label
            }
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::VerdictMismatch {
                index,
                label,
                expected,
                actual,
                reason,
            } => write!(
                f,
                "step {} '{}': expected {}, got {} ({})",
                index, label, expected, actual, reason
            ),
            Divergence::CheckFailed {
                index,
                label,
                check,
                reason,
            } => write!(f, "step {} '{}': check [{}] failed: {}", index, label, check, reason),
        }
    }
}

/// Result of running one scenario.
///
/// A scenario passed iff no divergence was recorded. Steps after the
/// divergence are not executed and have no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub scenario: String,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<Divergence>,
}

impl ScenarioResult {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            steps: Vec::new(),
            divergence: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.divergence.is_none()
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.divergence {
            None => write!(f, "PASS {} ({} steps)", self.scenario, self.steps.len()),
            Some(divergence) => write!(f, "FAIL {}: {}", self.scenario, divergence),
        }
    }
}

//! Core sequencer: runs scenario steps in order against a directory and
//! compares each outcome with the step's expectation.

use super::result::{Divergence, ScenarioResult, StepRecord};
use super::step::{Operation, Scenario, Step, StepVerdict};
use crate::directory::{DirectoryClient, Entry, Modification, SearchRequest, attrs};
use crate::error::{DirectoryError, DirectoryResult, HarnessResult, ViolationKind};
use crate::schema::{
    ConstraintEngine, ForestState, IntIdAssigner, SchemaElementDefinition, SchemaSet,
    ValidationVerdict,
};
use crate::value_objects::Dn;
use log::{debug, info, warn};
use uuid::Uuid;

/// Drives ordered operation sequences against a directory.
///
/// The sequencer keeps a mirror of the directory's schema so that schema
/// additions and modifications can be checked by the [`ConstraintEngine`]
/// before anything is written. A rejected pre-validation is the step's
/// actual verdict.
pub struct SchemaOperationSequencer<C> {
    client: C,
    forest: ForestState,
    schema: SchemaSet,
    engine: ConstraintEngine,
}

/// What executing one operation produced.
struct Outcome {
    verdict: StepVerdict,
    message: Option<String>,
    entries: Vec<Entry>,
    /// Check name and reason of a problem found after a successful write
    problem: Option<(String, String)>,
}

impl Outcome {
    fn success() -> Self {
        Self {
            verdict: StepVerdict::Success,
            message: None,
            entries: Vec::new(),
            problem: None,
        }
    }

    fn failure(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            verdict: StepVerdict::Failure(kind),
            message: Some(message.into()),
            ..Self::success()
        }
    }

    fn from_error(error: DirectoryError) -> Self {
        Self::failure(error.kind, error.message)
    }

    fn from_unit(result: DirectoryResult<()>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::from_error(e),
        }
    }

    fn from_entries(result: DirectoryResult<Vec<Entry>>) -> Self {
        match result {
            Ok(entries) => Self {
                entries,
                ..Self::success()
            },
            Err(e) => Self::from_error(e),
        }
    }
}

const INT_ID_CHECK: &str = "msDS-IntId assignment";

impl<C: DirectoryClient> SchemaOperationSequencer<C> {
    /// Read the forest facts from the root DSE and load the schema mirror.
    pub async fn connect(client: C) -> HarnessResult<Self> {
        let forest = ForestState::discover(&client).await?;
        let schema = SchemaSet::load(&client, &forest).await?;
        info!(
            "Connected: schema {} at functional level {}, {} schema elements",
            forest.schema_naming_context,
            forest.functional_level,
            schema.len()
        );
        Ok(Self::with_state(client, forest, schema))
    }

    /// Build a sequencer from already known forest facts and schema.
    pub fn with_state(client: C, forest: ForestState, schema: SchemaSet) -> Self {
        Self {
            client,
            forest,
            schema,
            engine: ConstraintEngine::new(),
        }
    }

    pub fn forest(&self) -> &ForestState {
        &self.forest
    }

    /// The schema mirror.
    pub fn schema(&self) -> &SchemaSet {
        &self.schema
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Ask the directory to make pending schema changes live, then publish
    /// the mirror's pending elements.
    pub async fn barrier(&mut self) -> DirectoryResult<()> {
        self.client
            .modify(
                Dn::root(),
                vec![Modification::add(attrs::SCHEMA_UPDATE_NOW, ["1"])],
            )
            .await?;
        let published = self.schema.publish();
        debug!("Barrier published {} mirrored element(s)", published);
        Ok(())
    }

    /// Run every step of `scenario` in order, stopping at the first
    /// divergence.
    pub async fn run(&mut self, scenario: &Scenario) -> ScenarioResult {
        info!("Running scenario '{}' ({} steps)", scenario.name, scenario.len());
        let mut result = ScenarioResult::new(scenario.name.as_str());

        for (index, step) in scenario.steps.iter().enumerate() {
            debug!(
                "[{}] step {} '{}': {}",
                scenario.name,
                index,
                step.label,
                step.operation.kind()
            );
            let outcome = self.execute(&step.operation).await;
            result.steps.push(StepRecord {
                index,
                label: step.label.clone(),
                operation: step.operation.kind(),
                expected: step.expected,
                actual: outcome.verdict,
                message: outcome.message.clone(),
            });

            if let Some(divergence) = judge(index, step, &outcome, &self.forest) {
                warn!("Scenario '{}' diverged: {}", scenario.name, divergence);
                result.divergence = Some(divergence);
                return result;
            }
        }

        info!("Scenario '{}' passed", scenario.name);
        result
    }

    async fn execute(&mut self, operation: &Operation) -> Outcome {
        match operation {
            Operation::AddElement(definition) => self.add_element(definition).await,
            Operation::Add(entry) => self.add_entry(entry).await,
            Operation::Modify { dn, changes } => self.modify(dn, changes).await,
            Operation::Search(request) => {
                Outcome::from_entries(self.client.search(request.clone()).await)
            }
            Operation::Delete(dn) => Outcome::from_unit(self.client.delete(dn.clone()).await),
            Operation::DeleteForce(dn) => match self.client.delete(dn.clone()).await {
                Err(e) if e.kind == ViolationKind::NoSuchObject => {
                    debug!("{} was already gone", dn);
                    Outcome::success()
                }
                other => Outcome::from_unit(other),
            },
            Operation::Barrier => Outcome::from_unit(self.barrier().await),
        }
    }

    async fn add_element(&mut self, definition: &SchemaElementDefinition) -> Outcome {
        let verdict = self.engine.evaluate(definition, &self.forest, &self.schema);
        if let ValidationVerdict::Rejected { kind, reason } = verdict {
            debug!("'{}' rejected before writing", definition.name());
            return Outcome::failure(kind, reason);
        }

        let entry = definition.to_entry(&self.forest);
        let dn = entry.dn().clone();
        if let Err(e) = self.client.add(entry).await {
            return Outcome::from_error(e);
        }
        self.after_schema_write(definition.clone(), &dn).await
    }

    async fn add_entry(&mut self, entry: &Entry) -> Outcome {
        let dn = entry.dn().clone();
        if let Err(e) = self.client.add(entry.clone()).await {
            return Outcome::from_error(e);
        }
        if !dn.is_child_of(&self.forest.schema_naming_context) {
            return Outcome::success();
        }
        match SchemaElementDefinition::from_entry(entry) {
            Ok(definition) => self.after_schema_write(definition, &dn).await,
            Err(e) => Outcome {
                problem: Some(("schema mirror".to_string(), e.to_string())),
                ..Outcome::success()
            },
        }
    }

    async fn modify(&mut self, dn: &Dn, changes: &[Modification]) -> Outcome {
        if let Some(element) = self.schema.find_by_dn(&self.forest, dn) {
            let verdict = self
                .engine
                .evaluate_modification(element.definition(), changes);
            if let ValidationVerdict::Rejected { kind, reason } = verdict {
                debug!("Modification of {} rejected before writing", dn);
                return Outcome::failure(kind, reason);
            }
        }

        let result = self.client.modify(dn.clone(), changes.to_vec()).await;
        let publishes = dn.is_root() && changes.iter().any(|c| c.targets(attrs::SCHEMA_UPDATE_NOW));
        if result.is_ok() && publishes {
            self.schema.publish();
        }
        Outcome::from_unit(result)
    }

    /// Read a freshly written schema element back, check the identifier the
    /// directory gave it and record it in the mirror.
    async fn after_schema_write(&mut self, definition: SchemaElementDefinition, dn: &Dn) -> Outcome {
        let problem = self
            .record_written(definition, dn)
            .await
            .err()
            .map(|reason| (INT_ID_CHECK.to_string(), reason));
        Outcome {
            problem,
            ..Outcome::success()
        }
    }

    async fn record_written(
        &mut self,
        mut definition: SchemaElementDefinition,
        dn: &Dn,
    ) -> Result<(), String> {
        let entries = self
            .client
            .search(SearchRequest::base(dn.clone()).with_attributes(["*"]))
            .await
            .map_err(|e| format!("reading back {} failed: {}", dn, e))?;
        let [stored] = entries.as_slice() else {
            return Err(format!("reading back {} returned {} entries", dn, entries.len()));
        };

        let guid = stored
            .first(attrs::SCHEMA_ID_GUID)
            .and_then(|g| Uuid::parse_str(g).ok())
            .unwrap_or_else(Uuid::new_v4);
        if let Some(display) = stored.first(attrs::LDAP_DISPLAY_NAME) {
            definition = definition.with_ldap_display_name(display);
        }
        let assigned = match stored.first(attrs::MS_DS_INT_ID) {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| format!("{}: msDS-IntId '{}' is not an integer", dn, raw))?,
            ),
            None => None,
        };

        let expected = IntIdAssigner::should_assign(&definition, &self.forest);
        let mut problem = None;
        match assigned {
            Some(id) if !expected => {
                problem = Some(format!("{} has msDS-IntId {} but should have none", dn, id));
            }
            Some(id) if self.schema.is_internal_id_taken(id) => {
                problem = Some(format!("{} reuses msDS-IntId {}", dn, id));
            }
            Some(id) => {
                if definition.internal_id() != Some(id) {
                    if let Err(e) = definition.assign_internal_id(id) {
                        problem = Some(e.to_string());
                    }
                }
            }
            None if expected => {
                problem = Some(format!("{} has no msDS-IntId", dn));
            }
            None => {}
        }

        let element = self.schema.accept(definition, guid);
        debug!("Mirrored {} '{}'", element.kind(), element.name());
        problem.map_or(Ok(()), Err)
    }
}

/// Compare an outcome with the step's expectation.
fn judge(index: usize, step: &Step, outcome: &Outcome, forest: &ForestState) -> Option<Divergence> {
    if outcome.verdict != step.expected {
        return Some(Divergence::VerdictMismatch {
            index,
            label: step.label.clone(),
            expected: step.expected,
            actual: outcome.verdict,
            reason: outcome
                .message
                .clone()
                .unwrap_or_else(|| "operation succeeded".to_string()),
        });
    }
    if !outcome.verdict.is_success() {
        return None;
    }

    if let Some((check, reason)) = &outcome.problem {
        return Some(Divergence::CheckFailed {
            index,
            label: step.label.clone(),
            check: check.clone(),
            reason: reason.clone(),
        });
    }
    step.checks.iter().find_map(|check| {
        check
            .verify(&outcome.entries, forest)
            .err()
            .map(|reason| Divergence::CheckFailed {
                index,
                label: step.label.clone(),
                check: check.to_string(),
                reason,
            })
    })
}

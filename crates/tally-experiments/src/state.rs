//! Cached assignment state for the current user and definitions.

use crate::assign::{compute_letters, compute_name_to_letter};
use crate::definition::{parse_definitions, ExperimentDefinition};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Letter returned for any experiment the user has no assignment for.
pub const DEFAULT_LETTER: &str = "A";

/// Letters and alias lookup derived from one definitions + user id pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub letters: String,
    pub name_to_letter: HashMap<String, String>,
}

impl Assignment {
    pub fn compute(definitions: &[ExperimentDefinition], user_id: &str) -> Self {
        let letters = compute_letters(definitions, user_id);
        let name_to_letter = compute_name_to_letter(definitions, &letters);
        Self {
            letters,
            name_to_letter,
        }
    }

    pub fn lookup(&self, experiment: &str) -> &str {
        self.name_to_letter
            .get(&experiment.to_lowercase())
            .map(String::as_str)
            .unwrap_or(DEFAULT_LETTER)
    }
}

#[derive(Debug, Default)]
struct Inner {
    definitions: Vec<ExperimentDefinition>,
    user_id: String,
    assignment: Option<Assignment>,
}

impl Inner {
    fn recompute(&mut self) {
        let assignment = Assignment::compute(&self.definitions, &self.user_id);
        debug!(
            experiments = self.definitions.len(),
            letters = %assignment.letters,
            "Recomputed experiment assignment"
        );
        self.assignment = Some(assignment);
    }
}

/// Thread-safe assignment engine.
///
/// Until [`Experiments::load`] runs there is no assignment: lookups answer
/// [`DEFAULT_LETTER`] and [`Experiments::letters`] is `None`. Any change to
/// the definitions or the user id recomputes everything from scratch.
#[derive(Debug, Default)]
pub struct Experiments {
    inner: RwLock<Inner>,
}

impl Experiments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the persisted definitions (if any) and the user id.
    pub fn load(&self, definitions_json: Option<&str>, user_id: &str) {
        let mut inner = self.inner.write();
        inner.definitions = definitions_json.map(parse_definitions).unwrap_or_default();
        inner.user_id = user_id.to_string();
        inner.recompute();
    }

    /// Replace the definitions wholesale with a new server payload.
    pub fn replace_definitions(&self, definitions_json: &str) {
        let mut inner = self.inner.write();
        inner.definitions = parse_definitions(definitions_json);
        inner.recompute();
    }

    pub fn set_user_id(&self, user_id: &str) {
        let mut inner = self.inner.write();
        if inner.user_id == user_id && inner.assignment.is_some() {
            return;
        }
        inner.user_id = user_id.to_string();
        inner.recompute();
    }

    /// Variant letter for `experiment` (case-insensitive), `"A"` if unknown.
    pub fn lookup(&self, experiment: &str) -> String {
        match &self.inner.read().assignment {
            Some(assignment) => assignment.lookup(experiment).to_string(),
            None => DEFAULT_LETTER.to_string(),
        }
    }

    /// Current letters string, `None` before the first load.
    pub fn letters(&self) -> Option<String> {
        self.inner
            .read()
            .assignment
            .as_ref()
            .map(|assignment| assignment.letters.clone())
    }

    pub fn definitions(&self) -> Vec<ExperimentDefinition> {
        self.inner.read().definitions.clone()
    }
}

//! Converted execution traces.
//!
//! A [`RewriteStep`] is one backend step after conversion into the pattern
//! algebra: the axiom ordinal it applied, the configuration it started from,
//! the metavariable bindings, and for simplification steps the location of
//! the rewritten sub-term. An [`ExecutionTrace`] is the ordered record of
//! these steps; order is authoritative and replay never reorders.
//!
//! # Citations
//! - Proof hints from the K LLVM backend: Lin et al., "Generating proof certificates for a language-agnostic deductive program verifier", OOPSLA (2023)

use crate::fingerprint::HashValue;
use crate::pattern::{Location, Pattern, Substitution};
use crate::semantics::StepEvent;

/// A single converted trace step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteStep {
    /// Ordinal of the applied axiom.
    pub ordinal: usize,
    /// Configuration before the step.
    pub configuration_before: Pattern,
    /// Metavariable bindings for the axiom.
    pub substitution: Substitution,
    /// Rewritten position, present for simplification steps.
    pub location: Option<Location>,
    /// Auxiliary function and hook events, in backend order.
    pub events: Vec<StepEvent>,
}

impl RewriteStep {
    /// A step without location or events.
    pub fn new(ordinal: usize, configuration_before: Pattern, substitution: Substitution) -> Self {
        Self {
            ordinal,
            configuration_before,
            substitution,
            location: None,
            events: Vec::new(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_events(mut self, events: Vec<StepEvent>) -> Self {
        self.events = events;
        self
    }
}

/// Ordered record of converted steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTrace {
    steps: Vec<RewriteStep>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn record_step(&mut self, step: RewriteStep) {
        self.steps.push(step);
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[RewriteStep] {
        &self.steps
    }

    pub fn get_step(&self, index: usize) -> Option<&RewriteStep> {
        self.steps.get(index)
    }

    /// Configuration the trace starts from.
    pub fn initial_configuration(&self) -> Option<&Pattern> {
        self.steps.first().map(|s| &s.configuration_before)
    }

    /// Fingerprint of the initial configuration.
    pub fn initial_fingerprint(&self) -> Option<HashValue> {
        self.initial_configuration().map(Pattern::fingerprint)
    }
}

impl FromIterator<RewriteStep> for ExecutionTrace {
    fn from_iter<I: IntoIterator<Item = RewriteStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a RewriteStep;
    type IntoIter = std::slice::Iter<'a, RewriteStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

//! Replay of a converted execution trace into proof obligations.
//!
//! [`ExecutionProofState`] follows the trace one step at a time. A rewrite
//! step must start from exactly the current configuration; it asserts the
//! rule and the step's side axioms as theory, claims the instantiated rule
//! and proves the claim by instantiating the assumed rule. A simplification
//! step rewrites a sub-term through the [`SimplificationVisitor`] stack.
//!
//! Every failure is fatal: a partially proved run must not be packaged. Each
//! operation validates before it mutates, so a failed event leaves the
//! state exactly as it was.

use super::visitor::SimplificationVisitor;
use crate::bundle::ProofBundle;
use crate::error::{InvariantError, Result, ScopeError};
use crate::pattern::notation::names;
use crate::pattern::{Location, Pattern, Substitution};
use crate::proof::Proof;
use crate::semantics::{AxiomType, ConvertedAxiom, LanguageSemantics, StepEvent};
use crate::trace::RewriteStep;
use tracing::{debug, info, warn};

/// Mutable state of one trace replay.
pub struct ExecutionProofState<'s, S: LanguageSemantics> {
    semantics: &'s mut S,
    initial: Pattern,
    visitor: SimplificationVisitor,
    bundle: ProofBundle,
    steps: usize,
    finalized: bool,
}

impl<'s, S: LanguageSemantics> ExecutionProofState<'s, S> {
    /// Starts a replay at `initial`.
    pub fn new(semantics: &'s mut S, initial: Pattern) -> Self {
        Self {
            semantics,
            visitor: SimplificationVisitor::new(initial.clone()),
            initial,
            bundle: ProofBundle::new(),
            steps: 0,
            finalized: false,
        }
    }

    pub fn current_configuration(&self) -> &Pattern {
        self.visitor.configuration()
    }

    pub fn initial_configuration(&self) -> &Pattern {
        &self.initial
    }

    pub fn bundle(&self) -> &ProofBundle {
        &self.bundle
    }

    /// Simplification frames still waiting for nested redexes.
    pub fn pending_simplifications(&self) -> usize {
        self.visitor.pending()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of steps applied so far.
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Applies one converted step, dispatching on the kind of its axiom.
    pub fn apply_step(&mut self, step: &RewriteStep) -> Result<()> {
        self.ensure_open()?;
        let rule = self.semantics.axiom(step.ordinal)?;
        match rule.kind {
            AxiomType::RewriteRule => {
                self.rewrite_step(&rule, &step.substitution, &step.events)?;
            }
            AxiomType::EquationalRule => {
                let location = step.location.as_ref().ok_or(InvariantError::MissingLocation {
                    ordinal: step.ordinal,
                })?;
                self.simplification_event(step.ordinal, &step.substitution, location)?;
            }
            kind => {
                return Err(InvariantError::UnexpectedAxiomKind {
                    ordinal: step.ordinal,
                    kind: kind.to_string(),
                }
                .into())
            }
        }
        Ok(())
    }

    /// Applies rewrite `rule` under `substitution` and returns the proof of
    /// the instantiated rule.
    pub fn rewrite_event(&mut self, rule: &ConvertedAxiom, substitution: &Substitution) -> Result<Proof> {
        self.rewrite_step(rule, substitution, &[])
    }

    fn rewrite_step(
        &mut self,
        rule: &ConvertedAxiom,
        substitution: &Substitution,
        events: &[StepEvent],
    ) -> Result<Proof> {
        self.ensure_open()?;
        if self.visitor.is_in_scope() {
            return Err(ScopeError::AlreadyInScope.into());
        }
        if self.visitor.pending() > 0 {
            return Err(ScopeError::PendingSimplifications {
                pending: self.visitor.pending(),
            }
            .into());
        }
        if rule.kind != AxiomType::RewriteRule {
            return Err(InvariantError::NotRewriteRule {
                kind: rule.kind.to_string(),
                pattern: rule.pattern.to_string(),
            }
            .into());
        }

        let claim = rule.pattern.instantiate(substitution);
        let (lhs, rhs) = match claim.as_notation() {
            Some((names::KORE_REWRITES, [_sort, lhs, rhs])) => (lhs, rhs),
            _ => {
                return Err(InvariantError::MalformedRule(format!(
                    "rewrite rule {} is not a kore-rewrites relation",
                    rule.pattern
                ))
                .into())
            }
        };
        if lhs != self.visitor.configuration() {
            return Err(InvariantError::ConfigurationMismatch {
                lhs: lhs.to_string(),
                configuration: self.visitor.configuration().to_string(),
            }
            .into());
        }
        let side_axioms = self.semantics.step_axioms(substitution, events)?;
        let next = rhs.clone();

        self.visitor.update_configuration(next)?;
        for group in side_axioms.into_values() {
            self.bundle.add_axioms(group.into_iter().map(|axiom| axiom.pattern));
        }
        self.bundle.add_axiom(rule.pattern.clone());
        let proof = Proof::axiom(rule.pattern.clone()).instantiate_many(substitution);
        self.bundle.add_claim(claim);
        self.bundle.add_proof(proof.clone());
        self.steps += 1;

        debug!(
            step = self.steps,
            configuration = %self.visitor.configuration().fingerprint(),
            "applied rewrite"
        );
        Ok(proof)
    }

    /// Simplifies the sub-term at `location` with equation `ordinal`.
    ///
    /// Opens a scope, pushes one frame and closes the scope; the base
    /// configuration changes once the frame and every frame it waits on
    /// have drained.
    pub fn simplification_event(
        &mut self,
        ordinal: usize,
        substitution: &Substitution,
        location: &Location,
    ) -> Result<()> {
        self.ensure_open()?;
        let mut scope = self.visitor.enter(&mut *self.semantics)?;
        scope.call(ordinal, substitution, location)?;
        scope.exit()?;
        self.steps += 1;
        Ok(())
    }

    /// Closes the trace.
    pub fn finalize(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.visitor.pending() > 0 {
            return Err(ScopeError::PendingSimplifications {
                pending: self.visitor.pending(),
            }
            .into());
        }
        // TODO: claim `initial ⇒* current` and prove it by chaining the per-step claims.
        self.finalized = true;
        info!(
            steps = self.steps,
            claims = self.bundle.claim_count(),
            initial = %self.initial.fingerprint(),
            last = %self.visitor.configuration().fingerprint(),
            "execution proof finalized"
        );
        Ok(())
    }

    pub fn into_bundle(self) -> ProofBundle {
        self.bundle
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            return Err(ScopeError::Finalized.into());
        }
        Ok(())
    }
}

/// Replays `steps` from the first step's configuration and returns the
/// accumulated obligations.
pub fn prove_trace<S: LanguageSemantics>(steps: &[RewriteStep], semantics: &mut S) -> Result<ProofBundle> {
    let Some(first) = steps.first() else {
        warn!("empty execution trace, producing an empty proof bundle");
        return Ok(ProofBundle::new());
    };
    let mut state = ExecutionProofState::new(semantics, first.configuration_before.clone());
    for step in steps {
        state.apply_step(step)?;
    }
    state.finalize()?;
    info!(steps = steps.len(), "trace replayed");
    Ok(state.into_bundle())
}

//! Proof terms of the matching-logic Hilbert calculus.
//!
//! A [`Proof`] is an immutable derivation whose only observable property is
//! its [`conclusion`](Proof::conclusion). Proofs are built bottom-up from the
//! propositional axiom schemas, assumed axioms, modus ponens and
//! metavariable instantiation; every constructor computes the conclusion
//! eagerly and rejects ill-shaped premises, so a `Proof` value always proves
//! what it claims relative to its assumed axioms.
//!
//! Sub-proofs are shared through reference counting. Equality and hashing are
//! structural over the whole derivation.
//!
//! # Citations
//! - Hilbert system for matching logic: Chen & Roşu, "Matching μ-logic", LICS (2019)
//! - Proof certificates for K: Lin et al., "Generating proof certificates for a language-agnostic deductive program verifier", OOPSLA (2023)

use crate::error::ProofError;
use crate::pattern::notation::neg;
use crate::pattern::{Pattern, Substitution};
use std::rc::Rc;

/// Inference rule at the root of a proof.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProofRule {
    /// `φ0 → (φ1 → φ0)`
    Prop1,
    /// `(φ0 → (φ1 → φ2)) → ((φ0 → φ1) → (φ0 → φ2))`
    Prop2,
    /// `¬¬φ0 → φ0`
    Prop3,
    /// Pattern assumed without proof; must belong to the theory.
    Axiom(Pattern),
    /// From `A` (left) and `A → B` (right) conclude `B`.
    ModusPonens(Proof, Proof),
    /// Metavariable instantiation of a sub-proof.
    Instantiate(Proof, Substitution),
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ProofNode {
    rule: ProofRule,
    conclusion: Pattern,
}

/// A derivation together with the pattern it proves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proof(Rc<ProofNode>);

impl Proof {
    fn from_parts(rule: ProofRule, conclusion: Pattern) -> Self {
        Self(Rc::new(ProofNode { rule, conclusion }))
    }

    pub fn prop1() -> Self {
        let (p0, p1) = (Pattern::metavar(0), Pattern::metavar(1));
        let conclusion = Pattern::implies(p0.clone(), Pattern::implies(p1, p0));
        Self::from_parts(ProofRule::Prop1, conclusion)
    }

    pub fn prop2() -> Self {
        let (p0, p1, p2) = (Pattern::metavar(0), Pattern::metavar(1), Pattern::metavar(2));
        let conclusion = Pattern::implies(
            Pattern::implies(p0.clone(), Pattern::implies(p1.clone(), p2.clone())),
            Pattern::implies(
                Pattern::implies(p0.clone(), p1),
                Pattern::implies(p0, p2),
            ),
        );
        Self::from_parts(ProofRule::Prop2, conclusion)
    }

    pub fn prop3() -> Self {
        let p0 = Pattern::metavar(0);
        let conclusion = Pattern::implies(neg(neg(p0.clone())), p0);
        Self::from_parts(ProofRule::Prop3, conclusion)
    }

    /// Assumes `pattern` as an axiom.
    pub fn axiom(pattern: Pattern) -> Self {
        Self::from_parts(ProofRule::Axiom(pattern.clone()), pattern)
    }

    /// Modus ponens: `left` proves `A`, `right` proves `A → B`; the result proves `B`.
    pub fn modus_ponens(left: Proof, right: Proof) -> Result<Self, ProofError> {
        let (antecedent, consequent) = right
            .conclusion()
            .as_implication()
            .ok_or_else(|| ProofError::NotAnImplication(right.conclusion().to_string()))?;
        if antecedent != left.conclusion() {
            return Err(ProofError::ModusPonensMismatch {
                expected: antecedent.to_string(),
                found: left.conclusion().to_string(),
            });
        }
        let conclusion = consequent.clone();
        Ok(Self::from_parts(ProofRule::ModusPonens(left, right), conclusion))
    }

    /// Replaces metavariable `id` by `plug` in the conclusion.
    pub fn instantiate(&self, id: u32, plug: Pattern) -> Self {
        self.instantiate_many(&Substitution::from([(id, plug)]))
    }

    /// Simultaneous instantiation.
    ///
    /// An empty substitution, or one that touches none of the conclusion's
    /// metavariables, returns `self` unchanged.
    pub fn instantiate_many(&self, substitution: &Substitution) -> Self {
        let metavars = self.conclusion().metavars();
        let relevant: Substitution = substitution
            .iter()
            .filter(|(id, _)| metavars.contains(*id))
            .map(|(id, plug)| (*id, plug.clone()))
            .collect();
        if relevant.is_empty() {
            return self.clone();
        }
        let conclusion = self.conclusion().instantiate(&relevant);
        Self::from_parts(ProofRule::Instantiate(self.clone(), relevant), conclusion)
    }

    pub fn conclusion(&self) -> &Pattern {
        &self.0.conclusion
    }

    pub fn rule(&self) -> &ProofRule {
        &self.0.rule
    }

    /// Immediate sub-proofs.
    pub fn premises(&self) -> Vec<&Proof> {
        match self.rule() {
            ProofRule::ModusPonens(left, right) => vec![left, right],
            ProofRule::Instantiate(inner, _) => vec![inner],
            ProofRule::Prop1 | ProofRule::Prop2 | ProofRule::Prop3 | ProofRule::Axiom(_) => {
                Vec::new()
            }
        }
    }

    /// Assumed axioms used anywhere in the derivation, in first-use order.
    pub fn assumptions(&self) -> Vec<&Pattern> {
        let mut out: Vec<&Pattern> = Vec::new();
        let mut stack = vec![self];
        while let Some(proof) = stack.pop() {
            if let ProofRule::Axiom(p) = proof.rule() {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
            // Reverse so the left premise is visited first
            stack.extend(proof.premises().into_iter().rev());
        }
        out
    }
}

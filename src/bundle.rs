//! Accumulated proof obligations of one run.
//!
//! A [`ProofBundle`] is append-only: the engine asserts theory axioms, claims
//! and proofs as it replays a trace, and the serializer consumes the bundle
//! once at the end. Axioms are deduplicated by structural equality; claims
//! and proofs keep their exact order, since claim `i` is discharged by
//! proof `i`.

use crate::error::Result;
use crate::pattern::notation::NotationRegistry;
use crate::pattern::Pattern;
use crate::proof::Proof;
use crate::serializer::{self, ProofArtifact};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ProofBundle {
    axioms: Vec<Pattern>,
    axiom_set: HashSet<Pattern>,
    claims: Vec<Pattern>,
    proofs: Vec<Proof>,
    lemmas: BTreeSet<Pattern>,
}

impl ProofBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asserts `axiom` as part of the theory. Returns `false` if it was
    /// already asserted.
    pub fn add_axiom(&mut self, axiom: Pattern) -> bool {
        if !self.axiom_set.insert(axiom.clone()) {
            return false;
        }
        self.axioms.push(axiom);
        true
    }

    pub fn add_axioms<I: IntoIterator<Item = Pattern>>(&mut self, axioms: I) {
        for axiom in axioms {
            self.add_axiom(axiom);
        }
    }

    pub fn add_claim(&mut self, claim: Pattern) {
        self.claims.push(claim);
    }

    pub fn add_proof(&mut self, proof: Proof) {
        self.proofs.push(proof);
    }

    /// Marks `conclusion` as a lemma: every sub-proof concluding it is
    /// written once and referenced afterwards.
    pub fn add_lemma(&mut self, conclusion: Pattern) {
        self.lemmas.insert(conclusion);
    }

    pub fn axioms(&self) -> &[Pattern] {
        &self.axioms
    }

    pub fn claims(&self) -> &[Pattern] {
        &self.claims
    }

    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    pub fn lemmas(&self) -> &BTreeSet<Pattern> {
        &self.lemmas
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// True when nothing was claimed or proved.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty() && self.proofs.is_empty()
    }

    /// Encodes the bundle into the binary artifact.
    pub fn serialize(&self, notations: &NotationRegistry) -> Result<ProofArtifact> {
        serializer::serialize(
            &self.axioms,
            &self.claims,
            &self.proofs,
            notations,
            &self.lemmas,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, PackagingError};

    #[test]
    fn axioms_are_deduplicated_in_order() {
        let mut bundle = ProofBundle::new();
        assert!(bundle.add_axiom(Pattern::symbol("a")));
        assert!(bundle.add_axiom(Pattern::symbol("b")));
        assert!(!bundle.add_axiom(Pattern::symbol("a")));
        assert_eq!(bundle.axioms(), &[Pattern::symbol("a"), Pattern::symbol("b")]);
    }

    #[test]
    fn empty_bundle_serializes() {
        let bundle = ProofBundle::new();
        assert!(bundle.is_empty());
        let artifact = bundle
            .serialize(&NotationRegistry::with_builtins())
            .expect("nothing to check");
        assert!(artifact.claims.is_empty());
        assert!(artifact.proofs.is_empty());
    }

    #[test]
    fn claims_pair_with_proofs_in_order() {
        let (a, b) = (Pattern::symbol("a"), Pattern::symbol("b"));
        let mut bundle = ProofBundle::new();
        bundle.add_axioms([a.clone(), b.clone()]);
        bundle.add_claim(a.clone());
        bundle.add_claim(b.clone());
        bundle.add_proof(Proof::axiom(a));
        assert_eq!(bundle.claim_count(), 2);
        assert_eq!(
            bundle.serialize(&NotationRegistry::with_builtins()).unwrap_err(),
            Error::Packaging(PackagingError::MissingProofs { claims: 2, proofs: 1 })
        );
        bundle.add_proof(Proof::axiom(b));
        assert!(bundle.serialize(&NotationRegistry::with_builtins()).is_ok());
    }
}

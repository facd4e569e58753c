//! Derived propositional lemmas.
//!
//! Small, reusable derivations built only from `Prop1`, `Prop2` and modus
//! ponens. Registering a lemma's conclusion in a
//! [`ProofBundle`](crate::bundle::ProofBundle) makes the serializer write its
//! derivation once and reference it afterwards.

use crate::error::ProofError;
use crate::pattern::{Pattern, Substitution};
use crate::proof::Proof;

/// Proves `φ0 → φ0`.
pub fn imp_reflexivity() -> Result<Proof, ProofError> {
    let p0 = Pattern::metavar(0);
    let p0_imp_p0 = Pattern::implies(p0.clone(), p0.clone());
    let distributed = Proof::prop2().instantiate_many(&Substitution::from([
        (1, p0_imp_p0.clone()),
        (2, p0.clone()),
    ]));
    let step = Proof::modus_ponens(Proof::prop1().instantiate(1, p0_imp_p0), distributed)?;
    Proof::modus_ponens(Proof::prop1().instantiate(1, p0), step)
}

/// From proofs of `a → b` and `b → c`, proves `a → c`.
pub fn imp_transitivity(ab: Proof, bc: Proof) -> Result<Proof, ProofError> {
    let (a, b) = split_implication(&ab)?;
    let (b2, c) = split_implication(&bc)?;
    if b != b2 {
        return Err(ProofError::ModusPonensMismatch {
            expected: b.to_string(),
            found: b2.to_string(),
        });
    }

    let weakened = Proof::prop1().instantiate_many(&Substitution::from([
        (0, Pattern::implies(b.clone(), c.clone())),
        (1, a.clone()),
    ]));
    let a_imp_bc = Proof::modus_ponens(bc, weakened)?;
    let distributed = Proof::prop2().instantiate_many(&Substitution::from([
        (0, a),
        (1, b),
        (2, c),
    ]));
    let ab_imp_ac = Proof::modus_ponens(a_imp_bc, distributed)?;
    Proof::modus_ponens(ab, ab_imp_ac)
}

fn split_implication(proof: &Proof) -> Result<(Pattern, Pattern), ProofError> {
    proof
        .conclusion()
        .as_implication()
        .map(|(l, r)| (l.clone(), r.clone()))
        .ok_or_else(|| ProofError::NotAnImplication(proof.conclusion().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexivity_proves_identity_implication() {
        let proof = imp_reflexivity().expect("derivation is well formed");
        assert_eq!(
            proof.conclusion(),
            &Pattern::implies(Pattern::metavar(0), Pattern::metavar(0))
        );
        assert!(proof.assumptions().is_empty());
    }

    #[test]
    fn reflexivity_instantiates_to_any_pattern() {
        let s = Pattern::symbol("s");
        let proof = imp_reflexivity().expect("well formed").instantiate(0, s.clone());
        assert_eq!(proof.conclusion(), &Pattern::implies(s.clone(), s));
    }

    #[test]
    fn transitivity_chains_assumptions() {
        let (a, b, c) = (Pattern::symbol("a"), Pattern::symbol("b"), Pattern::symbol("c"));
        let ab = Proof::axiom(Pattern::implies(a.clone(), b.clone()));
        let bc = Proof::axiom(Pattern::implies(b.clone(), c.clone()));
        let proof = imp_transitivity(ab, bc).expect("middle formulas agree");
        assert_eq!(proof.conclusion(), &Pattern::implies(a.clone(), c.clone()));
        assert_eq!(proof.assumptions().len(), 2);
    }

    #[test]
    fn transitivity_with_metavariables_stays_simultaneous() {
        // a = φ1 collides with a Prop1 placeholder
        let (a, b, c) = (Pattern::metavar(1), Pattern::metavar(2), Pattern::metavar(0));
        let ab = Proof::axiom(Pattern::implies(a.clone(), b.clone()));
        let bc = Proof::axiom(Pattern::implies(b, c.clone()));
        let proof = imp_transitivity(ab, bc).expect("well formed");
        assert_eq!(proof.conclusion(), &Pattern::implies(a, c));
    }

    #[test]
    fn transitivity_rejects_mismatched_middle() {
        let (a, b, c) = (Pattern::symbol("a"), Pattern::symbol("b"), Pattern::symbol("c"));
        let ab = Proof::axiom(Pattern::implies(a.clone(), b));
        let cb = Proof::axiom(Pattern::implies(c.clone(), a));
        assert!(matches!(
            imp_transitivity(ab, cb),
            Err(ProofError::ModusPonensMismatch { .. })
        ));
        let not_imp = Proof::axiom(c);
        assert!(matches!(
            imp_transitivity(not_imp.clone(), not_imp),
            Err(ProofError::NotAnImplication(_))
        ));
    }
}

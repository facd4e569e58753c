//! Property-based tests for the pattern algebra and the serializer.
//!
//! Patterns are generated as plain shape trees and built into `Pattern`
//! values on demand, so the same shape can be built twice independently.

use ml_proofgen::pattern::notation::{self, NotationRegistry};
use ml_proofgen::pattern::{chain, chain_with_head, Location, Pattern, Substitution};
use ml_proofgen::proof::Proof;
use ml_proofgen::serializer::serialize;
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

// ============================================================================
// Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Shape {
    Symbol(u8),
    EVar(u8),
    MetaVar(u8),
    App(Box<Shape>, Box<Shape>),
    Imp(Box<Shape>, Box<Shape>),
    Exists(u8, Box<Shape>),
    Neg(Box<Shape>),
}

fn build(shape: &Shape) -> Pattern {
    match shape {
        Shape::Symbol(n) => Pattern::symbol(format!("s{}", n)),
        Shape::EVar(n) => Pattern::evar(u32::from(*n)),
        Shape::MetaVar(n) => Pattern::metavar(u32::from(*n)),
        Shape::App(l, r) => Pattern::app(build(l), build(r)),
        Shape::Imp(l, r) => Pattern::implies(build(l), build(r)),
        Shape::Exists(v, body) => Pattern::exists(u32::from(*v), build(body)),
        Shape::Neg(p) => notation::neg(build(p)),
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0u8..4).prop_map(Shape::Symbol),
        (0u8..3).prop_map(Shape::EVar),
        (0u8..3).prop_map(Shape::MetaVar),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::App(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Shape::Imp(Box::new(l), Box::new(r))),
            (0u8..3, inner.clone()).prop_map(|(v, b)| Shape::Exists(v, Box::new(b))),
            inner.prop_map(|p| Shape::Neg(Box::new(p))),
        ]
    })
}

fn hash_of(pattern: &Pattern) -> u64 {
    let mut hasher = DefaultHasher::new();
    pattern.hash(&mut hasher);
    hasher.finish()
}

/// Follows `choices` down the tree, picking children modulo their count.
fn location_in(pattern: &Pattern, choices: &[usize]) -> Location {
    let mut steps = Vec::new();
    let mut current = pattern;
    for &choice in choices {
        let children = current.children();
        if children.is_empty() {
            break;
        }
        let index = choice % children.len();
        steps.push(index);
        current = children[index];
    }
    Location(steps)
}

// ============================================================================
// Structural equality
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_independent_builds_are_equal(s in shape()) {
        let (p, q) = (build(&s), build(&s));
        prop_assert_eq!(&p, &q);
        prop_assert_eq!(hash_of(&p), hash_of(&q));
        prop_assert_eq!(p.fingerprint(), q.fingerprint());
    }

    #[test]
    fn prop_chain_folds_left(shapes in prop::collection::vec(shape(), 1..6)) {
        let patterns: Vec<Pattern> = shapes.iter().map(build).collect();
        let chained = chain(patterns.clone()).expect("non-empty");
        if patterns.len() == 1 {
            prop_assert_eq!(&chained, &patterns[0]);
        } else {
            let (last, init) = patterns.split_last().expect("non-empty");
            let prefix = chain(init.to_vec()).expect("non-empty");
            prop_assert_eq!(&chained, &Pattern::app(prefix, last.clone()));
        }
    }

    #[test]
    fn prop_unchain_inverts_chain(head in 0u8..4, args in prop::collection::vec(shape(), 0..5)) {
        let head = Pattern::symbol(format!("h{}", head));
        let args: Vec<Pattern> = args.iter().map(build).collect();
        let chained = chain_with_head(head.clone(), args.clone());
        let (h, a) = chained.unchain();
        prop_assert_eq!(h, &head);
        prop_assert_eq!(a.into_iter().cloned().collect::<Vec<_>>(), args);
    }
}

// ============================================================================
// Instantiation and locations
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_empty_instantiation_is_identity(s in shape()) {
        let p = build(&s);
        prop_assert_eq!(p.instantiate(&Substitution::new()), p);
    }

    #[test]
    fn prop_closed_plugs_eliminate_metavariables(s in shape(), plug in 0u8..4) {
        let p = build(&s);
        let plug = Pattern::symbol(format!("c{}", plug));
        let substitution: Substitution = (0..3).map(|id| (id, plug.clone())).collect();
        prop_assert!(p.instantiate(&substitution).metavars().is_empty());
    }

    #[test]
    fn prop_swap_is_simultaneous(s in shape()) {
        let p = build(&s);
        let swap = Substitution::from([(0, Pattern::metavar(1)), (1, Pattern::metavar(0))]);
        let once = p.instantiate(&swap);
        prop_assert_eq!(once.instantiate(&swap), p);
    }

    #[test]
    fn prop_replace_with_own_subpattern_is_identity(
        s in shape(),
        choices in prop::collection::vec(0usize..4, 0..6),
    ) {
        let p = build(&s);
        let location = location_in(&p, &choices);
        let sub = p.subpattern(&location).expect("location built from the tree").clone();
        prop_assert_eq!(p.replace_at(&location, sub), Some(p.clone()));
    }
}

// ============================================================================
// Serializer
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_serialization_is_deterministic(shapes in prop::collection::vec(shape(), 1..5)) {
        let registry = NotationRegistry::with_builtins();
        let axioms: Vec<Pattern> = shapes.iter().map(build).collect();
        let proofs: Vec<Proof> = axioms.iter().cloned().map(Proof::axiom).collect();
        let first = serialize(&axioms, &axioms, &proofs, &registry, &BTreeSet::new())
            .expect("paired");

        let rebuilt: Vec<Pattern> = shapes.iter().map(build).collect();
        let proofs: Vec<Proof> = rebuilt.iter().cloned().map(Proof::axiom).collect();
        let second = serialize(&rebuilt, &rebuilt, &proofs, &registry, &BTreeSet::new())
            .expect("paired");

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn prop_missing_proof_is_always_fatal(shapes in prop::collection::vec(shape(), 2..5)) {
        let registry = NotationRegistry::with_builtins();
        let claims: Vec<Pattern> = shapes.iter().map(build).collect();
        let proofs: Vec<Proof> = claims[..claims.len() - 1].iter().cloned().map(Proof::axiom).collect();
        prop_assert!(serialize(&claims, &claims, &proofs, &registry, &BTreeSet::new()).is_err());
    }
}

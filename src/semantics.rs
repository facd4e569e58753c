//! Classified axioms and the seam between converter and engine.
//!
//! The execution engine never looks at definition syntax. It asks a
//! [`LanguageSemantics`] implementation for the axiom addressed by an
//! ordinal, for the side axioms a trace step needs, and for how many nested
//! simplification redexes a pattern contains. [`KoreConverter`](crate::kore::KoreConverter)
//! is the production implementation; tests supply hand-built ones.

use crate::error::Result;
use crate::pattern::notation::{self, names, NotationRegistry};
use crate::pattern::{Location, Pattern, Substitution};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a converted axiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxiomType {
    Unclassified,
    RewriteRule,
    EquationalRule,
    FunctionalSymbol,
    FunctionEvent,
    HookEvent,
}

impl fmt::Display for AxiomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AxiomType::Unclassified => "unclassified",
            AxiomType::RewriteRule => "rewrite rule",
            AxiomType::EquationalRule => "equational rule",
            AxiomType::FunctionalSymbol => "functional symbol",
            AxiomType::FunctionEvent => "function event",
            AxiomType::HookEvent => "hook event",
        };
        f.write_str(name)
    }
}

/// An axiom in pattern form together with its classification.
///
/// `requires` holds the substitutions extracted from an equational rule's
/// requires clause; it is empty for every other kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConvertedAxiom {
    pub kind: AxiomType,
    pub pattern: Pattern,
    pub requires: Substitution,
}

impl ConvertedAxiom {
    pub fn new(kind: AxiomType, pattern: Pattern) -> Self {
        Self {
            kind,
            pattern,
            requires: Substitution::new(),
        }
    }

    pub fn with_requires(mut self, requires: Substitution) -> Self {
        self.requires = requires;
        self
    }

    /// `(left, right)` of a `kore-rewrites` or `kore-equals` pattern.
    pub fn sides(&self) -> Option<(&Pattern, &Pattern)> {
        relation_sides(&self.pattern)
    }
}

/// `(left, right)` of a sorted binary relation notation.
pub fn relation_sides(pattern: &Pattern) -> Option<(&Pattern, &Pattern)> {
    match pattern.as_notation() {
        Some((name, [_sort, left, right]))
            if name == names::KORE_REWRITES || name == names::KORE_EQUALS =>
        {
            Some((left, right))
        }
        _ => None,
    }
}

/// Axioms grouped by kind; each group is ordered and duplicate free.
pub type Axioms = BTreeMap<AxiomType, Vec<ConvertedAxiom>>;

/// Groups axioms by kind, keeping first-seen order and dropping duplicates.
pub fn organize_axioms<I>(axioms: I) -> Axioms
where
    I: IntoIterator<Item = ConvertedAxiom>,
{
    let mut grouped = Axioms::new();
    for axiom in axioms {
        let group = grouped.entry(axiom.kind).or_default();
        if !group.contains(&axiom) {
            group.push(axiom);
        }
    }
    grouped
}

/// `∃x0. (x0 → p) ∧ (p → x0)`: `p` denotes exactly one element.
pub fn functional_axiom(pattern: &Pattern) -> Pattern {
    let v = Pattern::evar(0);
    Pattern::exists(
        0,
        notation::and(
            Pattern::implies(v.clone(), pattern.clone()),
            Pattern::implies(pattern.clone(), v),
        ),
    )
}

/// Content of function and hook event axioms.
///
/// The logical content of these events is not modelled yet; each event
/// contributes the trivially valid `x0 → x0` under its own classification.
pub fn event_placeholder_axiom() -> Pattern {
    Pattern::implies(Pattern::evar(0), Pattern::evar(0))
}

/// Auxiliary event attached to a trace step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// A function was evaluated at `relative_position` of the configuration.
    Function {
        name: String,
        relative_position: Location,
    },
    /// A hooked builtin computed `result` from `args`.
    Hook {
        name: String,
        args: Vec<Pattern>,
        result: Pattern,
    },
}

/// What the execution engine needs to know about a language definition.
pub trait LanguageSemantics {
    /// The converted axiom with declaration index `ordinal`.
    fn axiom(&mut self, ordinal: usize) -> Result<ConvertedAxiom>;

    /// Side axioms justifying one step: a functional-symbol axiom per
    /// substituted pattern, then one axiom per auxiliary event, grouped with
    /// [`organize_axioms`].
    fn step_axioms(&mut self, substitution: &Substitution, events: &[StepEvent])
        -> Result<Axioms>;

    /// Number of nested simplification redexes in `pattern`.
    fn count_simplifications(&self, pattern: &Pattern) -> usize;

    /// Notations used by converted patterns.
    fn notations(&self) -> &NotationRegistry;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axiom(kind: AxiomType, name: &str) -> ConvertedAxiom {
        ConvertedAxiom::new(kind, Pattern::symbol(name))
    }

    #[test]
    fn organize_drops_duplicates_and_keeps_order() {
        let a = axiom(AxiomType::FunctionalSymbol, "a");
        let b = axiom(AxiomType::FunctionalSymbol, "b");
        let grouped = organize_axioms(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&AxiomType::FunctionalSymbol], vec![a, b]);
    }

    #[test]
    fn organize_separates_kinds() {
        let f = axiom(AxiomType::FunctionEvent, "e");
        let h = axiom(AxiomType::HookEvent, "e");
        let grouped = organize_axioms(vec![h.clone(), f.clone(), h.clone()]);
        assert_eq!(grouped[&AxiomType::FunctionEvent], vec![f]);
        assert_eq!(grouped[&AxiomType::HookEvent], vec![h]);
    }

    #[test]
    fn functional_axiom_shape() {
        let p = Pattern::app(Pattern::symbol("f"), Pattern::symbol("a"));
        let expected = Pattern::exists(
            0,
            notation::and(
                Pattern::implies(Pattern::evar(0), p.clone()),
                Pattern::implies(p.clone(), Pattern::evar(0)),
            ),
        );
        assert_eq!(functional_axiom(&p), expected);
    }

    #[test]
    fn sides_of_rewrite_notation() {
        let (s, l, r) = (Pattern::symbol("s"), Pattern::symbol("l"), Pattern::symbol("r"));
        let rule = ConvertedAxiom::new(
            AxiomType::RewriteRule,
            Pattern::notation(names::KORE_REWRITES, vec![s.clone(), l.clone(), r.clone()]),
        );
        assert_eq!(rule.sides(), Some((&l, &r)));
        let other = ConvertedAxiom::new(
            AxiomType::Unclassified,
            Pattern::notation(names::KORE_AND, vec![s, l, r]),
        );
        assert_eq!(other.sides(), None);
    }
}

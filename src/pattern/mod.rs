//! Pattern algebra for matching logic.
//!
//! A [`Pattern`] is an immutable term built from symbols, element and set
//! variables, metavariables (placeholders for instantiation), binary
//! application, implication, the `∃` and `μ` binders, and named
//! [`Notation`](Pattern::Notation)s that stand for their expansion while
//! staying distinct for display and serialization.
//!
//! Children are reference counted, so cloning a pattern is cheap and
//! sub-patterns are shared between the configuration, claims and proofs.
//! Equality, hashing and ordering are structural: two patterns built
//! independently with the same shape compare equal and can be used
//! interchangeably as cache keys.
//!
//! # Citations
//! - Matching logic: Roşu, "Matching logic", LMCS 13(4) (2017)
//! - Fixpoints: Chen & Roşu, "Matching μ-logic", LICS (2019)

pub mod intern;
pub mod notation;

use crate::fingerprint::{Canonicalizable, HashValue};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

/// Domain for pattern fingerprints (version 0).
const DOMAIN_PATTERN_V0: &[u8] = b"PATTERN_V0";

/// Metavariable instantiation: metavariable id to plug.
pub type Substitution = BTreeMap<u32, Pattern>;

/// A matching-logic pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pattern {
    /// Constant symbol.
    Symbol(Rc<str>),
    /// Element variable.
    EVar(u32),
    /// Set variable.
    SVar(u32),
    /// Metavariable, replaced by instantiation.
    MetaVar(u32),
    /// Binary application, left associated by [`chain`].
    Application(Rc<Pattern>, Rc<Pattern>),
    /// Implication.
    Implication(Rc<Pattern>, Rc<Pattern>),
    /// Existential quantification over an element variable.
    Exists(u32, Rc<Pattern>),
    /// Least fixpoint over a set variable.
    Mu(u32, Rc<Pattern>),
    /// Named macro, semantically equal to its expansion.
    Notation { name: Rc<str>, args: Rc<[Pattern]> },
}

impl Pattern {
    pub fn symbol(name: impl Into<Rc<str>>) -> Self {
        Pattern::Symbol(name.into())
    }

    pub fn evar(id: u32) -> Self {
        Pattern::EVar(id)
    }

    pub fn svar(id: u32) -> Self {
        Pattern::SVar(id)
    }

    pub fn metavar(id: u32) -> Self {
        Pattern::MetaVar(id)
    }

    pub fn app(left: Pattern, right: Pattern) -> Self {
        Pattern::Application(Rc::new(left), Rc::new(right))
    }

    pub fn implies(antecedent: Pattern, consequent: Pattern) -> Self {
        Pattern::Implication(Rc::new(antecedent), Rc::new(consequent))
    }

    pub fn exists(var: u32, body: Pattern) -> Self {
        Pattern::Exists(var, Rc::new(body))
    }

    pub fn mu(var: u32, body: Pattern) -> Self {
        Pattern::Mu(var, Rc::new(body))
    }

    /// Builds a notation node without consulting any registry.
    ///
    /// Prefer [`NotationRegistry::resolve`](notation::NotationRegistry::resolve),
    /// which checks arity.
    pub fn notation(name: impl Into<Rc<str>>, args: Vec<Pattern>) -> Self {
        Pattern::Notation {
            name: name.into(),
            args: args.into(),
        }
    }

    /// Returns `(antecedent, consequent)` if this is an implication.
    pub fn as_implication(&self) -> Option<(&Pattern, &Pattern)> {
        match self {
            Pattern::Implication(a, b) => Some((&**a, &**b)),
            _ => None,
        }
    }

    /// Returns the notation name and arguments if this is a notation.
    pub fn as_notation(&self) -> Option<(&str, &[Pattern])> {
        match self {
            Pattern::Notation { name, args } => Some((&**name, &**args)),
            _ => None,
        }
    }

    /// Splits a left-associated application spine into head and arguments.
    ///
    /// Inverse of [`chain`]: `chain(head, args…)` unchains to `(head, args)`.
    /// A non-application is its own head with no arguments.
    pub fn unchain(&self) -> (&Pattern, Vec<&Pattern>) {
        let mut args = Vec::new();
        let mut head = self;
        while let Pattern::Application(l, r) = head {
            args.push(r.as_ref());
            head = l.as_ref();
        }
        args.reverse();
        (head, args)
    }

    /// Immediate sub-patterns, in [`Location`] index order.
    pub fn children(&self) -> Vec<&Pattern> {
        match self {
            Pattern::Application(l, r) | Pattern::Implication(l, r) => vec![l.as_ref(), r.as_ref()],
            Pattern::Exists(_, body) | Pattern::Mu(_, body) => vec![body.as_ref()],
            Pattern::Notation { args, .. } => args.iter().collect(),
            Pattern::Symbol(_) | Pattern::EVar(_) | Pattern::SVar(_) | Pattern::MetaVar(_) => {
                Vec::new()
            }
        }
    }

    /// Returns `true` for nodes with no children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Pattern::Symbol(_) | Pattern::EVar(_) | Pattern::SVar(_) | Pattern::MetaVar(_)
        )
    }

    /// Number of nodes in the tree, shared sub-trees counted per occurrence.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    /// Metavariable ids occurring in this pattern.
    pub fn metavars(&self) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(p) = stack.pop() {
            if let Pattern::MetaVar(id) = p {
                out.insert(*id);
            }
            stack.extend(p.children());
        }
        out
    }

    /// Simultaneously replaces metavariables by their plugs.
    ///
    /// Plugs are inserted as-is and never re-instantiated, so a substitution
    /// mapping `0 ↦ MetaVar(1)` and `1 ↦ s` turns `MetaVar(0)` into
    /// `MetaVar(1)`. Sub-trees without affected metavariables are shared.
    pub fn instantiate(&self, substitution: &Substitution) -> Pattern {
        if substitution.is_empty() {
            return self.clone();
        }
        self.instantiate_inner(substitution)
            .unwrap_or_else(|| self.clone())
    }

    /// Returns `None` when nothing below `self` changed.
    fn instantiate_inner(&self, substitution: &Substitution) -> Option<Pattern> {
        match self {
            Pattern::MetaVar(id) => substitution.get(id).cloned(),
            Pattern::Symbol(_) | Pattern::EVar(_) | Pattern::SVar(_) => None,
            Pattern::Application(l, r) => {
                Self::instantiate_pair(l, r, substitution).map(|(l, r)| Pattern::Application(l, r))
            }
            Pattern::Implication(l, r) => {
                Self::instantiate_pair(l, r, substitution).map(|(l, r)| Pattern::Implication(l, r))
            }
            Pattern::Exists(var, body) => body
                .instantiate_inner(substitution)
                .map(|b| Pattern::exists(*var, b)),
            Pattern::Mu(var, body) => body
                .instantiate_inner(substitution)
                .map(|b| Pattern::mu(*var, b)),
            Pattern::Notation { name, args } => {
                let replaced: Vec<Option<Pattern>> =
                    args.iter().map(|a| a.instantiate_inner(substitution)).collect();
                if replaced.iter().all(Option::is_none) {
                    return None;
                }
                let args: Vec<Pattern> = replaced
                    .into_iter()
                    .zip(args.iter())
                    .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                    .collect();
                Some(Pattern::Notation {
                    name: name.clone(),
                    args: args.into(),
                })
            }
        }
    }

    fn instantiate_pair(
        l: &Rc<Pattern>,
        r: &Rc<Pattern>,
        substitution: &Substitution,
    ) -> Option<(Rc<Pattern>, Rc<Pattern>)> {
        match (l.instantiate_inner(substitution), r.instantiate_inner(substitution)) {
            (None, None) => None,
            (nl, nr) => Some((
                nl.map(Rc::new).unwrap_or_else(|| l.clone()),
                nr.map(Rc::new).unwrap_or_else(|| r.clone()),
            )),
        }
    }

    /// Resolves the sub-pattern addressed by `location`.
    ///
    /// Returns `None` if any index leaves the tree.
    pub fn subpattern(&self, location: &Location) -> Option<&Pattern> {
        let mut current = self;
        for &index in location.steps() {
            current = current.children().get(index).copied()?;
        }
        Some(current)
    }

    /// Rebuilds `self` with the sub-pattern at `location` replaced by `plug`.
    ///
    /// Returns `None` if the location does not resolve. Only the spine from
    /// the root to `location` is reallocated.
    pub fn replace_at(&self, location: &Location, plug: Pattern) -> Option<Pattern> {
        self.replace_steps(location.steps(), plug)
    }

    fn replace_steps(&self, steps: &[usize], plug: Pattern) -> Option<Pattern> {
        let Some((&first, rest)) = steps.split_first() else {
            return Some(plug);
        };
        match (self, first) {
            (Pattern::Application(l, r), 0) => {
                Some(Pattern::Application(Rc::new(l.replace_steps(rest, plug)?), r.clone()))
            }
            (Pattern::Application(l, r), 1) => {
                Some(Pattern::Application(l.clone(), Rc::new(r.replace_steps(rest, plug)?)))
            }
            (Pattern::Implication(l, r), 0) => {
                Some(Pattern::Implication(Rc::new(l.replace_steps(rest, plug)?), r.clone()))
            }
            (Pattern::Implication(l, r), 1) => {
                Some(Pattern::Implication(l.clone(), Rc::new(r.replace_steps(rest, plug)?)))
            }
            (Pattern::Exists(var, body), 0) => {
                Some(Pattern::exists(*var, body.replace_steps(rest, plug)?))
            }
            (Pattern::Mu(var, body), 0) => Some(Pattern::mu(*var, body.replace_steps(rest, plug)?)),
            (Pattern::Notation { name, args }, i) if i < args.len() => {
                let mut new_args = args.to_vec();
                new_args[i] = args[i].replace_steps(rest, plug)?;
                Some(Pattern::Notation {
                    name: name.clone(),
                    args: new_args.into(),
                })
            }
            _ => None,
        }
    }

    /// Deterministic content hash.
    pub fn fingerprint(&self) -> HashValue {
        self.fingerprint_in(DOMAIN_PATTERN_V0)
    }

    fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            Pattern::Symbol(name) => {
                out.push(0);
                write_str(out, name);
            }
            Pattern::EVar(id) => {
                out.push(1);
                out.extend_from_slice(&id.to_le_bytes());
            }
            Pattern::SVar(id) => {
                out.push(2);
                out.extend_from_slice(&id.to_le_bytes());
            }
            Pattern::MetaVar(id) => {
                out.push(3);
                out.extend_from_slice(&id.to_le_bytes());
            }
            Pattern::Application(l, r) => {
                out.push(4);
                l.write_canonical(out);
                r.write_canonical(out);
            }
            Pattern::Implication(l, r) => {
                out.push(5);
                l.write_canonical(out);
                r.write_canonical(out);
            }
            Pattern::Exists(var, body) => {
                out.push(6);
                out.extend_from_slice(&var.to_le_bytes());
                body.write_canonical(out);
            }
            Pattern::Mu(var, body) => {
                out.push(7);
                out.extend_from_slice(&var.to_le_bytes());
                body.write_canonical(out);
            }
            Pattern::Notation { name, args } => {
                out.push(8);
                write_str(out, name);
                out.extend_from_slice(&(args.len() as u64).to_le_bytes());
                for arg in args.iter() {
                    arg.write_canonical(out);
                }
            }
        }
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

impl Canonicalizable for Pattern {
    /// Prefix encoding: variant tag, little-endian ids, length-prefixed names.
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        self.write_canonical(&mut out);
        out
    }
}

/// Left fold of binary application over a non-empty sequence.
///
/// `chain([a]) = a` and `chain([a, …, y, z]) = Application(chain([a, …, y]), z)`.
/// Returns `None` for an empty sequence.
pub fn chain<I>(patterns: I) -> Option<Pattern>
where
    I: IntoIterator<Item = Pattern>,
{
    let mut iter = patterns.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, Pattern::app))
}

/// [`chain`] with a known head, so the result always exists.
pub fn chain_with_head<I>(head: Pattern, args: I) -> Pattern
where
    I: IntoIterator<Item = Pattern>,
{
    args.into_iter().fold(head, Pattern::app)
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Symbol(name) => write!(f, "{}", name),
            Pattern::EVar(id) => write!(f, "x{}", id),
            Pattern::SVar(id) => write!(f, "X{}", id),
            Pattern::MetaVar(id) => write!(f, "φ{}", id),
            Pattern::Application(l, r) => write!(f, "({} · {})", l, r),
            Pattern::Implication(l, r) => write!(f, "({} → {})", l, r),
            Pattern::Exists(var, body) => write!(f, "(∃x{}. {})", var, body),
            Pattern::Mu(var, body) => write!(f, "(μX{}. {})", var, body),
            Pattern::Notation { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Root-relative path of child indices.
///
/// Indices follow [`Pattern::children`]: application and implication have
/// children `[left, right]`, binders have `[body]`, notations their arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(pub Vec<usize>);

impl Location {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new location one step deeper.
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }
}

impl From<Vec<usize>> for Location {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(p: &Pattern) -> u64 {
        let mut h = DefaultHasher::new();
        p.hash(&mut h);
        h.finish()
    }

    fn sample() -> Pattern {
        Pattern::implies(
            Pattern::app(Pattern::symbol("f"), Pattern::metavar(0)),
            Pattern::exists(1, Pattern::app(Pattern::metavar(1), Pattern::evar(1))),
        )
    }

    #[test]
    fn independently_built_patterns_are_equal() {
        let a = sample();
        let b = sample();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn chain_folds_left() {
        let (a, b, c) = (Pattern::symbol("a"), Pattern::symbol("b"), Pattern::symbol("c"));
        assert_eq!(chain([a.clone()]), Some(a.clone()));
        assert_eq!(
            chain([a.clone(), b.clone(), c.clone()]),
            Some(Pattern::app(Pattern::app(a.clone(), b.clone()), c.clone()))
        );
        assert_eq!(chain(Vec::new()), None);
    }

    #[test]
    fn unchain_inverts_chain() {
        let args = vec![Pattern::evar(0), Pattern::symbol("b"), Pattern::metavar(3)];
        let p = chain_with_head(Pattern::symbol("f"), args.clone());
        let (head, got) = p.unchain();
        assert_eq!(head, &Pattern::symbol("f"));
        assert_eq!(got.into_iter().cloned().collect::<Vec<_>>(), args);

        let leaf = Pattern::symbol("c");
        assert_eq!(leaf.unchain(), (&leaf, Vec::new()));
    }

    #[test]
    fn instantiation_is_simultaneous() {
        let p = Pattern::implies(Pattern::metavar(0), Pattern::metavar(1));
        let subst = Substitution::from([
            (0, Pattern::metavar(1)),
            (1, Pattern::symbol("s")),
        ]);
        assert_eq!(
            p.instantiate(&subst),
            Pattern::implies(Pattern::metavar(1), Pattern::symbol("s"))
        );
    }

    #[test]
    fn instantiation_reaches_notation_arguments() {
        let p = Pattern::notation("pair", vec![Pattern::metavar(0), Pattern::symbol("k")]);
        let subst = Substitution::from([(0, Pattern::evar(2))]);
        assert_eq!(
            p.instantiate(&subst),
            Pattern::notation("pair", vec![Pattern::evar(2), Pattern::symbol("k")])
        );
        assert_eq!(p.metavars(), BTreeSet::from([0]));
    }

    #[test]
    fn instantiation_without_match_is_identity() {
        let p = sample();
        let subst = Substitution::from([(7, Pattern::symbol("unused"))]);
        assert_eq!(p.instantiate(&subst), p);
        assert_eq!(p.instantiate(&Substitution::new()), p);
    }

    #[test]
    fn subpattern_follows_children() {
        let p = sample();
        assert_eq!(p.subpattern(&Location::root()), Some(&p));
        assert_eq!(p.subpattern(&Location(vec![0, 1])), Some(&Pattern::metavar(0)));
        assert_eq!(p.subpattern(&Location(vec![1, 0, 1])), Some(&Pattern::evar(1)));
        assert_eq!(p.subpattern(&Location(vec![1, 1])), None);
        assert_eq!(p.subpattern(&Location(vec![0, 1, 0])), None);
    }

    #[test]
    fn replace_at_rebuilds_spine() {
        let p = sample();
        let replaced = p
            .replace_at(&Location(vec![0, 1]), Pattern::symbol("z"))
            .expect("location exists");
        assert_eq!(
            replaced,
            Pattern::implies(
                Pattern::app(Pattern::symbol("f"), Pattern::symbol("z")),
                Pattern::exists(1, Pattern::app(Pattern::metavar(1), Pattern::evar(1))),
            )
        );
        assert_eq!(p.replace_at(&Location(vec![2]), Pattern::symbol("z")), None);
        assert_eq!(
            p.replace_at(&Location::root(), Pattern::symbol("z")),
            Some(Pattern::symbol("z"))
        );
    }

    #[test]
    fn canonical_bytes_distinguish_variable_kinds() {
        let kinds = [
            Pattern::evar(0),
            Pattern::svar(0),
            Pattern::metavar(0),
            Pattern::symbol("0"),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.to_canonical_bytes(), b.to_canonical_bytes());
            }
        }
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(sample().to_string(), "((f · φ0) → (∃x1. (φ1 · x1)))");
        assert_eq!(Location(vec![0, 2]).to_string(), "[0, 2]");
    }

    #[test]
    fn size_counts_nodes() {
        assert_eq!(Pattern::symbol("a").size(), 1);
        assert_eq!(sample().size(), 8);
    }
}

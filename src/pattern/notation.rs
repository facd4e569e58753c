//! Notations: named, parametrized pattern templates.
//!
//! A notation is `(name, arity, template)`. The template refers to its
//! arguments positionally through `MetaVar(0)` … `MetaVar(arity - 1)`, and
//! instantiation substitutes them simultaneously. Patterns keep notation
//! nodes unexpanded, which keeps claims readable and lets the serializer
//! share one encoding for every use of the same instance.
//!
//! Resolving an unregistered name does not fail: it yields a placeholder
//! notation whose expansion is the raw application `chain(Symbol(name), args…)`,
//! so nothing from the input is lost.
//!
//! # Citations
//! - Notations in Metamath-style kernels: Carneiro, "Metamath Zero", CICM (2020)
//! - Derived connectives of matching logic: Chen & Roşu, "Matching μ-logic", LICS (2019)

use super::{chain_with_head, Pattern, Substitution};
use crate::error::TranslationError;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Reserved names of the built-in notations.
pub mod names {
    pub const BOT: &str = "\\bot";
    pub const NEG: &str = "\\neg";
    pub const TOP: &str = "\\top";
    pub const AND: &str = "\\and";
    pub const OR: &str = "\\or";
    pub const KORE_REWRITES: &str = "kore-rewrites";
    pub const KORE_EQUALS: &str = "kore-equals";
    pub const KORE_AND: &str = "kore-and";
    pub const KORE_OR: &str = "kore-or";
    pub const KORE_TOP: &str = "kore-top";
    pub const KORE_DV: &str = "kore-dv";
    pub const KORE_APP: &str = "kore-app";
    pub const CELL: &str = "cell";
    pub const NESTED_CELLS: &str = "nested-cells";
}

/// A parametrized pattern template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationDef {
    name: Rc<str>,
    arity: usize,
    template: Pattern,
}

impl NotationDef {
    /// Creates a definition.
    ///
    /// Fails if the template mentions a metavariable outside `0..arity` or
    /// refers to the notation being defined.
    pub fn new(
        name: impl Into<Rc<str>>,
        arity: usize,
        template: Pattern,
    ) -> Result<Self, TranslationError> {
        let name = name.into();
        if let Some(&stray) = template.metavars().iter().find(|&&id| id as usize >= arity) {
            return Err(TranslationError::Unsupported {
                context: format!("notation `{}`", name),
                construct: format!("placeholder φ{} beyond arity {}", stray, arity),
            });
        }
        if mentions_notation(&template, &name) {
            return Err(TranslationError::Unsupported {
                context: format!("notation `{}`", name),
                construct: "self-referential template".to_string(),
            });
        }
        Ok(Self {
            name,
            arity,
            template,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn template(&self) -> &Pattern {
        &self.template
    }

    /// Substitutes `args` positionally into the template.
    pub fn instantiate(&self, args: &[Pattern]) -> Result<Pattern, TranslationError> {
        self.check_arity(args.len())?;
        let substitution: Substitution = args
            .iter()
            .enumerate()
            .map(|(i, arg)| (i as u32, arg.clone()))
            .collect();
        Ok(self.template.instantiate(&substitution))
    }

    fn check_arity(&self, found: usize) -> Result<(), TranslationError> {
        if found != self.arity {
            return Err(TranslationError::Arity {
                name: self.name.to_string(),
                expected: self.arity,
                found,
            });
        }
        Ok(())
    }
}

fn mentions_notation(pattern: &Pattern, name: &str) -> bool {
    match pattern {
        Pattern::Notation { name: n, .. } if &**n == name => true,
        _ => pattern.children().iter().any(|c| mentions_notation(c, name)),
    }
}

/// Name-keyed table of notation definitions.
#[derive(Debug, Clone, Default)]
pub struct NotationRegistry {
    defs: BTreeMap<Rc<str>, NotationDef>,
}

impl NotationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the logical connectives and the
    /// definition-language notations used by the converter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtin_definitions() {
            registry.register(def);
        }
        registry
    }

    /// Registers `def`, returning the definition it replaces.
    pub fn register(&mut self, def: NotationDef) -> Option<NotationDef> {
        self.defs.insert(def.name.clone(), def)
    }

    pub fn get(&self, name: &str) -> Option<&NotationDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Builds the notation node `name(args…)`.
    ///
    /// Registered names are arity checked. Unregistered names produce a
    /// placeholder that expands to the raw application.
    pub fn resolve(&self, name: &str, args: Vec<Pattern>) -> Result<Pattern, TranslationError> {
        if let Some(def) = self.defs.get(name) {
            def.check_arity(args.len())?;
            return Ok(Pattern::Notation {
                name: def.name.clone(),
                args: args.into(),
            });
        }
        Ok(Pattern::notation(name, args))
    }

    /// Unfolds one level of `name(args…)`.
    pub fn expand(&self, name: &str, args: &[Pattern]) -> Result<Pattern, TranslationError> {
        match self.defs.get(name) {
            Some(def) => def.instantiate(args),
            None => Ok(chain_with_head(
                Pattern::symbol(name),
                args.iter().cloned(),
            )),
        }
    }

    /// Removes every notation node, innermost arguments first.
    pub fn expand_fully(&self, pattern: &Pattern) -> Result<Pattern, TranslationError> {
        Ok(match pattern {
            Pattern::Symbol(_) | Pattern::EVar(_) | Pattern::SVar(_) | Pattern::MetaVar(_) => {
                pattern.clone()
            }
            Pattern::Application(l, r) => {
                Pattern::app(self.expand_fully(l)?, self.expand_fully(r)?)
            }
            Pattern::Implication(l, r) => {
                Pattern::implies(self.expand_fully(l)?, self.expand_fully(r)?)
            }
            Pattern::Exists(var, body) => Pattern::exists(*var, self.expand_fully(body)?),
            Pattern::Mu(var, body) => Pattern::mu(*var, self.expand_fully(body)?),
            Pattern::Notation { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.expand_fully(a))
                    .collect::<Result<Vec<_>, _>>()?;
                // Templates may use other notations
                self.expand_fully(&self.expand(name, &args)?)?
            }
        })
    }
}

fn builtin_definitions() -> Vec<NotationDef> {
    use names::*;

    let p0 = || Pattern::metavar(0);
    let p1 = || Pattern::metavar(1);
    let bot = || Pattern::notation(BOT, vec![]);
    let neg = |p: Pattern| Pattern::notation(NEG, vec![p]);
    let headed = |head: &str, arity: u32| {
        chain_with_head(
            Pattern::symbol(format!("\\{}", head)),
            (0..arity).map(Pattern::metavar),
        )
    };

    let connectives = [
        (BOT, 0, Pattern::mu(0, Pattern::svar(0))),
        (NEG, 1, Pattern::implies(p0(), bot())),
        (TOP, 0, neg(bot())),
        (AND, 2, neg(Pattern::implies(p0(), neg(p1())))),
        (OR, 2, Pattern::implies(neg(p0()), p1())),
    ];
    let kore = [
        (KORE_REWRITES, 3usize),
        (KORE_EQUALS, 3),
        (KORE_AND, 3),
        (KORE_OR, 3),
        (KORE_TOP, 1),
        (KORE_DV, 2),
        (KORE_APP, 2),
        (CELL, 1),
        (NESTED_CELLS, 1),
    ];

    connectives
        .into_iter()
        .chain(
            kore.into_iter()
                .map(|(name, arity)| (name, arity, headed(name, arity as u32))),
        )
        .map(|(name, arity, template)| NotationDef {
            name: name.into(),
            arity,
            template,
        })
        .collect()
}

/// `\neg φ`.
pub fn neg(p: Pattern) -> Pattern {
    Pattern::notation(names::NEG, vec![p])
}

/// `\bot`.
pub fn bot() -> Pattern {
    Pattern::notation(names::BOT, vec![])
}

/// `\top`.
pub fn top() -> Pattern {
    Pattern::notation(names::TOP, vec![])
}

/// `φ ∧ ψ`.
pub fn and(left: Pattern, right: Pattern) -> Pattern {
    Pattern::notation(names::AND, vec![left, right])
}

/// `φ ∨ ψ`.
pub fn or(left: Pattern, right: Pattern) -> Pattern {
    Pattern::notation(names::OR, vec![left, right])
}

//! Interning of named leaves.
//!
//! The converter meets the same symbol, sort and variable names over and over.
//! [`PatternInterner`] hands out one pattern per name: symbols and sorts keep
//! a disambiguating prefix, variables get dense ids in first-seen order. A
//! repeated request returns a clone of the cached value, so repeated
//! construction is structurally equal and shares its allocation.

use super::Pattern;
use crate::error::TranslationError;
use std::collections::HashMap;

/// Name-keyed caches for symbols, sorts and variables.
#[derive(Debug, Clone, Default)]
pub struct PatternInterner {
    symbol_prefix: String,
    sort_prefix: String,
    symbols: HashMap<String, Pattern>,
    sorts: HashMap<String, Pattern>,
    metavars: HashMap<String, u32>,
    evars: HashMap<String, u32>,
    svars: HashMap<String, u32>,
}

impl PatternInterner {
    /// Creates an interner with the given symbol and sort prefixes.
    pub fn new(symbol_prefix: impl Into<String>, sort_prefix: impl Into<String>) -> Self {
        Self {
            symbol_prefix: symbol_prefix.into(),
            sort_prefix: sort_prefix.into(),
            ..Self::default()
        }
    }

    /// Returns the prefixed symbol for `name`.
    pub fn symbol(&mut self, name: &str) -> Pattern {
        if let Some(p) = self.symbols.get(name) {
            return p.clone();
        }
        let p = Pattern::symbol(format!("{}{}", self.symbol_prefix, name));
        self.symbols.insert(name.to_string(), p.clone());
        p
    }

    /// Returns the prefixed sort symbol for `name`.
    pub fn sort(&mut self, name: &str) -> Pattern {
        if let Some(p) = self.sorts.get(name) {
            return p.clone();
        }
        let p = Pattern::symbol(format!("{}{}", self.sort_prefix, name));
        self.sorts.insert(name.to_string(), p.clone());
        p
    }

    /// Declares (or re-fetches) the metavariable for `name`.
    pub fn declare_metavar(&mut self, name: &str) -> Pattern {
        Pattern::MetaVar(self.declare_metavar_id(name))
    }

    /// Id of the metavariable for `name`, declaring it on first use.
    pub fn declare_metavar_id(&mut self, name: &str) -> u32 {
        next_id(&mut self.metavars, name)
    }

    /// Looks up a metavariable that must already be declared.
    pub fn metavar(&self, name: &str) -> Result<Pattern, TranslationError> {
        self.metavar_id(name).map(Pattern::MetaVar)
    }

    /// Id of a declared metavariable.
    pub fn metavar_id(&self, name: &str) -> Result<u32, TranslationError> {
        self.metavars
            .get(name)
            .copied()
            .ok_or_else(|| TranslationError::UnknownVariable {
                name: name.to_string(),
            })
    }

    pub fn evar(&mut self, name: &str) -> Pattern {
        Pattern::EVar(next_id(&mut self.evars, name))
    }

    pub fn svar(&mut self, name: &str) -> Pattern {
        Pattern::SVar(next_id(&mut self.svars, name))
    }

    /// Number of distinct metavariable names seen.
    pub fn metavar_count(&self) -> usize {
        self.metavars.len()
    }

    /// Number of distinct symbols interned.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

fn next_id(table: &mut HashMap<String, u32>, name: &str) -> u32 {
    if let Some(&id) = table.get(name) {
        return id;
    }
    let id = table.len() as u32;
    table.insert(name.to_string(), id);
    id
}

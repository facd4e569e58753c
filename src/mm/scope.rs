//! Name resolution for Metamath terms.
//!
//! Variables receive dense ids per kind in declaration order. A notation body
//! is converted in a scope reduced to the notation's formal arguments, where
//! argument `i` resolves to `MetaVar(i)`.

use crate::error::TranslationError;
use crate::pattern::Pattern;
use std::collections::BTreeSet;

/// Sizes of the variable tables at some point, used to close a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    metavariables: usize,
    element_vars: usize,
    set_vars: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    metavariables: Vec<String>,
    element_vars: Vec<String>,
    set_vars: Vec<String>,
    symbols: BTreeSet<String>,
    domain_values: BTreeSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a pattern (or symbol-ranging) metavariable; returns its id.
    pub fn add_metavariable(&mut self, name: &str) -> u32 {
        position_or_push(&mut self.metavariables, name)
    }

    pub fn add_element_var(&mut self, name: &str) -> u32 {
        position_or_push(&mut self.element_vars, name)
    }

    pub fn add_set_var(&mut self, name: &str) -> u32 {
        position_or_push(&mut self.set_vars, name)
    }

    pub fn add_symbol(&mut self, name: &str) {
        self.symbols.insert(name.to_string());
    }

    /// Declares a quoted constant such as `"1"` as a domain value.
    pub fn add_domain_value(&mut self, name: &str) {
        self.domain_values.insert(name.to_string());
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.symbols.contains(name) || self.domain_values.contains(name)
    }

    pub fn is_domain_value(&self, name: &str) -> bool {
        self.domain_values.contains(name)
    }

    pub fn metavariable_count(&self) -> usize {
        self.metavariables.len()
    }

    pub fn mark(&self) -> Mark {
        Mark {
            metavariables: self.metavariables.len(),
            element_vars: self.element_vars.len(),
            set_vars: self.set_vars.len(),
        }
    }

    /// Forgets variables declared after `mark`. Symbols and domain values
    /// are global and stay.
    pub fn truncate(&mut self, mark: Mark) {
        self.metavariables.truncate(mark.metavariables);
        self.element_vars.truncate(mark.element_vars);
        self.set_vars.truncate(mark.set_vars);
    }

    /// Resolves a variable or constant name.
    pub fn resolve(&self, name: &str) -> Result<Pattern, TranslationError> {
        if let Some(id) = position(&self.metavariables, name) {
            return Ok(Pattern::metavar(id));
        }
        if let Some(id) = position(&self.element_vars, name) {
            return Ok(Pattern::evar(id));
        }
        if let Some(id) = position(&self.set_vars, name) {
            return Ok(Pattern::svar(id));
        }
        if self.is_symbol(name) {
            return Ok(Pattern::symbol(name));
        }
        Err(TranslationError::UnknownVariable {
            name: name.to_string(),
        })
    }

    /// Scope for a notation body with formal arguments `args`.
    ///
    /// Every argument must be a declared variable. Symbols, domain values and
    /// element and set variables stay visible under their outer ids; other
    /// metavariables do not. Formals shadow variables of the same name.
    pub fn reduce_to_args(&self, args: &[String]) -> Result<Scope, TranslationError> {
        for arg in args {
            let declared = self.metavariables.contains(arg)
                || self.element_vars.contains(arg)
                || self.set_vars.contains(arg);
            if !declared {
                return Err(TranslationError::UnknownVariable { name: arg.clone() });
            }
        }
        Ok(Scope {
            metavariables: args.to_vec(),
            element_vars: self.element_vars.clone(),
            set_vars: self.set_vars.clone(),
            symbols: self.symbols.clone(),
            domain_values: self.domain_values.clone(),
        })
    }
}

fn position(names: &[String], name: &str) -> Option<u32> {
    names.iter().position(|n| n == name).map(|i| i as u32)
}

fn position_or_push(names: &mut Vec<String>, name: &str) -> u32 {
    if let Some(id) = position(names, name) {
        return id;
    }
    names.push(name.to_string());
    (names.len() - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.add_metavariable("ph0");
        scope.add_metavariable("ph1");
        scope.add_element_var("x");
        scope.add_set_var("X");
        scope.add_symbol("sigma");
        scope.add_domain_value("\"1\"");
        scope
    }

    #[test]
    fn resolves_each_kind() {
        let scope = scope();
        assert_eq!(scope.resolve("ph1"), Ok(Pattern::metavar(1)));
        assert_eq!(scope.resolve("x"), Ok(Pattern::evar(0)));
        assert_eq!(scope.resolve("X"), Ok(Pattern::svar(0)));
        assert_eq!(scope.resolve("sigma"), Ok(Pattern::symbol("sigma")));
        assert_eq!(scope.resolve("\"1\""), Ok(Pattern::symbol("\"1\"")));
        assert!(scope.is_domain_value("\"1\""));
        assert!(matches!(
            scope.resolve("nope"),
            Err(TranslationError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn redeclaration_keeps_id() {
        let mut scope = scope();
        assert_eq!(scope.add_metavariable("ph0"), 0);
        assert_eq!(scope.metavariable_count(), 2);
    }

    #[test]
    fn reduced_scope_numbers_arguments_positionally() {
        let scope = scope();
        let reduced = scope
            .reduce_to_args(&["ph1".to_string(), "ph0".to_string()])
            .expect("declared");
        assert_eq!(reduced.resolve("ph1"), Ok(Pattern::metavar(0)));
        assert_eq!(reduced.resolve("ph0"), Ok(Pattern::metavar(1)));
        assert_eq!(reduced.resolve("sigma"), Ok(Pattern::symbol("sigma")));
        assert!(scope.reduce_to_args(&["nope".to_string()]).is_err());
    }

    #[test]
    fn reduced_scope_keeps_free_variable_ids() {
        let mut scope = Scope::new();
        scope.add_element_var("x");
        scope.add_element_var("y");
        scope.add_set_var("X");
        scope.add_set_var("Y");
        let reduced = scope
            .reduce_to_args(&["x".to_string(), "X".to_string()])
            .expect("declared");
        assert_eq!(reduced.resolve("x"), Ok(Pattern::metavar(0)));
        assert_eq!(reduced.resolve("X"), Ok(Pattern::metavar(1)));
        assert_eq!(reduced.resolve("y"), scope.resolve("y"));
        assert_eq!(reduced.resolve("Y"), scope.resolve("Y"));
        assert_eq!(reduced.resolve("y"), Ok(Pattern::evar(1)));
    }

    #[test]
    fn truncate_forgets_block_variables() {
        let mut scope = scope();
        let mark = scope.mark();
        scope.add_metavariable("ph2");
        scope.add_symbol("tau");
        scope.truncate(mark);
        assert!(scope.resolve("ph2").is_err());
        assert_eq!(scope.resolve("tau"), Ok(Pattern::symbol("tau")));
    }
}

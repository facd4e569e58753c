//! Grammar-directed translation of Kore into the pattern algebra.
//!
//! [`KoreConverter`] owns every cache for one definition: interned symbols
//! and variables, the immutable ordinal table of axioms, converted axioms,
//! and the growing set of recognised cell symbols. Conversion is a single
//! exhaustive match over [`KorePattern`]; constructors without a handler are
//! reported as [`TranslationError::Unsupported`] instead of being
//! approximated.
//!
//! Axioms are classified while converting:
//!
//! - `\rewrites(\and(lhs, _), \and(rhs, _))` is a rewrite rule; side
//!   conditions are dropped.
//! - `\implies(requires, \equals(lhs, rhs))` (possibly with an `\and`
//!   around the equation or its right side) is an equational rule; variable
//!   bindings in `requires` become the rule's precomputed substitution.
//! - Everything else is unclassified.
//!
//! Cells are applications whose symbol follows the configured naming
//! convention. A cell converts to `cell(chain(head, children…))`, or to
//! `nested-cells(…)` when one of its children is a cell itself, so cell
//! boundaries stay visible in the converted configuration.
//!
//! # Citations
//! - Kore, the K framework's intermediate language: Chen, Lin, Trinh & Roşu, "Towards a trustworthy semantics-based language framework via proof generation", CAV (2021)

use super::ast::{Axiom, Definition, KoreEvent, KoreHint, KorePattern};
use crate::config::ConverterConfig;
use crate::error::{InvariantError, Result, TranslationError};
use crate::pattern::intern::PatternInterner;
use crate::pattern::notation::{self, names, NotationRegistry};
use crate::pattern::{chain, chain_with_head, Location, Pattern, Substitution};
use crate::semantics::{
    event_placeholder_axiom, functional_axiom, organize_axioms, Axioms, AxiomType,
    ConvertedAxiom, LanguageSemantics, StepEvent,
};
use crate::trace::{ExecutionTrace, RewriteStep};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Converter for one Kore definition.
#[derive(Debug)]
pub struct KoreConverter {
    config: ConverterConfig,
    cell_regex: Regex,
    /// Axioms by ordinal. Never mutated after construction.
    ordinal_table: Vec<Axiom>,
    axiom_cache: HashMap<Axiom, ConvertedAxiom>,
    raw_functional: HashSet<String>,
    raw_simplifiable: HashSet<String>,
    functional_symbols: HashSet<Pattern>,
    simplifiable_symbols: HashSet<Pattern>,
    /// Symbols recognised as cells at the top of a conversion.
    cell_symbols: HashSet<String>,
    /// Converted head per cell symbol, fixed at first occurrence.
    cell_heads: HashMap<String, Pattern>,
    interner: PatternInterner,
    notations: NotationRegistry,
}

impl KoreConverter {
    /// Creates a converter with the default configuration.
    pub fn new(definition: &Definition) -> Result<Self> {
        Self::with_config(definition, ConverterConfig::default())
    }

    /// Creates a converter and runs the one-time passes over `definition`.
    pub fn with_config(definition: &Definition, config: ConverterConfig) -> Result<Self> {
        let cell_regex = Regex::new(&config.cell_pattern)
            .map_err(|e| TranslationError::InvalidCellPattern(e.to_string()))?;

        let mut raw_functional = HashSet::new();
        let mut raw_simplifiable = HashSet::new();
        for decl in definition.symbols() {
            if decl.has_attribute(&config.functional_attribute) {
                raw_functional.insert(decl.name.clone());
            }
            if decl.has_attribute(&config.function_attribute)
                && !decl.has_attribute(&config.hook_attribute)
            {
                raw_simplifiable.insert(decl.name.clone());
            }
        }

        let ordinal_table: Vec<Axiom> = definition.axioms().cloned().collect();
        debug!(
            axioms = ordinal_table.len(),
            functional = raw_functional.len(),
            simplifiable = raw_simplifiable.len(),
            "indexed definition"
        );

        let interner = PatternInterner::new(config.symbol_prefix.clone(), config.sort_prefix.clone());
        let cell_symbols = HashSet::from([config.generated_top_symbol.clone()]);
        Ok(Self {
            config,
            cell_regex,
            ordinal_table,
            axiom_cache: HashMap::new(),
            raw_functional,
            raw_simplifiable,
            functional_symbols: HashSet::new(),
            simplifiable_symbols: HashSet::new(),
            cell_symbols,
            cell_heads: HashMap::new(),
            interner,
            notations: NotationRegistry::with_builtins(),
        })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Number of axioms addressable by ordinal.
    pub fn axiom_count(&self) -> usize {
        self.ordinal_table.len()
    }

    /// Number of axioms converted so far.
    pub fn cached_axiom_count(&self) -> usize {
        self.axiom_cache.len()
    }

    /// Whether `symbol` has been recognised as a cell.
    pub fn is_cell_symbol(&self, symbol: &str) -> bool {
        self.cell_symbols.contains(symbol)
    }

    /// Whether the converted `symbol` denotes exactly one value.
    pub fn is_functional(&self, symbol: &Pattern) -> bool {
        self.functional_symbols.contains(symbol)
    }

    /// Converts a Kore pattern.
    pub fn convert_pattern(&mut self, pattern: &KorePattern) -> Result<Pattern> {
        match pattern {
            KorePattern::Rewrites { sort, left, right } => {
                let sort = self.interner.sort(sort.name());
                let left = self.convert_pattern(left)?;
                let right = self.convert_pattern(right)?;
                Ok(self.notations.resolve(names::KORE_REWRITES, vec![sort, left, right])?)
            }
            KorePattern::And { sort, left, right } => {
                let sort = self.interner.sort(sort.name());
                let left = self.convert_pattern(left)?;
                let right = self.convert_pattern(right)?;
                Ok(self.notations.resolve(names::KORE_AND, vec![sort, left, right])?)
            }
            KorePattern::Or { sort, left, right } => {
                let sort = self.interner.sort(sort.name());
                let left = self.convert_pattern(left)?;
                let right = self.convert_pattern(right)?;
                Ok(self.notations.resolve(names::KORE_OR, vec![sort, left, right])?)
            }
            KorePattern::App { symbol, sorts, args } => {
                if self.cell_symbols.contains(symbol) {
                    return self.convert_cell(symbol, args);
                }
                let head = self.resolve_symbol(symbol);
                let args = args
                    .iter()
                    .map(|arg| self.convert_pattern(arg))
                    .collect::<Result<Vec<_>>>()?;
                let applied = chain_with_head(head, args);
                let sorts = chain(sorts.iter().map(|s| self.interner.sort(s.name())))
                    .unwrap_or_else(notation::top);
                Ok(self.notations.resolve(names::KORE_APP, vec![sorts, applied])?)
            }
            KorePattern::EVar { name, .. } => Ok(self.interner.declare_metavar(name)),
            KorePattern::Top(sort) => {
                let sort = self.interner.sort(sort.name());
                Ok(self.notations.resolve(names::KORE_TOP, vec![sort])?)
            }
            KorePattern::DV { sort, value } => {
                let sort = self.interner.sort(sort.name());
                let value = self.resolve_symbol(value);
                Ok(self.notations.resolve(names::KORE_DV, vec![sort, value])?)
            }
            KorePattern::SVar { .. }
            | KorePattern::Bottom(_)
            | KorePattern::Not { .. }
            | KorePattern::Implies { .. }
            | KorePattern::Equals { .. }
            | KorePattern::In { .. }
            | KorePattern::Exists { .. } => Err(TranslationError::Unsupported {
                context: "pattern".to_string(),
                construct: pattern.kind().to_string(),
            }
            .into()),
        }
    }

    /// Converts and classifies an axiom. Repeated calls return the cached value.
    pub fn convert_axiom(&mut self, axiom: &Axiom) -> Result<ConvertedAxiom> {
        if let Some(cached) = self.axiom_cache.get(axiom) {
            return Ok(cached.clone());
        }
        let converted = self.classify_and_convert(&axiom.pattern)?;
        debug!(
            kind = %converted.kind,
            fingerprint = %converted.pattern.fingerprint(),
            "converted axiom"
        );
        self.axiom_cache.insert(axiom.clone(), converted.clone());
        Ok(converted)
    }

    /// Converts the axiom with declaration index `ordinal`.
    pub fn retrieve_axiom_for_ordinal(&mut self, ordinal: usize) -> Result<ConvertedAxiom> {
        let axiom = self
            .ordinal_table
            .get(ordinal)
            .cloned()
            .ok_or(TranslationError::OrdinalOutOfRange {
                ordinal,
                count: self.ordinal_table.len(),
            })?;
        self.convert_axiom(&axiom)
    }

    /// Converts raw bindings to a substitution over declared metavariables.
    ///
    /// The variables must already be declared, i.e. the axiom they belong to
    /// must have been converted.
    pub fn convert_substitutions(&mut self, raw: &[(String, KorePattern)]) -> Result<Substitution> {
        let mut substitution = Substitution::new();
        for (name, value) in raw {
            let id = self.interner.metavar_id(name)?;
            substitution.insert(id, self.convert_pattern(value)?);
        }
        Ok(substitution)
    }

    /// Converts one raw trace hint.
    pub fn convert_hint(&mut self, hint: &KoreHint) -> Result<RewriteStep> {
        // Declares the rule's variables before the bindings are looked up
        self.retrieve_axiom_for_ordinal(hint.ordinal)?;
        let configuration_before = self.convert_pattern(&hint.configuration_before)?;
        let substitution = self.convert_substitutions(&hint.substitutions)?;
        let events = hint
            .events
            .iter()
            .map(|event| self.convert_event(event))
            .collect::<Result<Vec<_>>>()?;
        Ok(RewriteStep {
            ordinal: hint.ordinal,
            configuration_before,
            substitution,
            location: hint.location.clone().map(Location),
            events,
        })
    }

    /// Converts a whole raw trace, preserving order.
    pub fn convert_trace<'a, I>(&mut self, hints: I) -> Result<ExecutionTrace>
    where
        I: IntoIterator<Item = &'a KoreHint>,
    {
        let mut trace = ExecutionTrace::new();
        for hint in hints {
            trace.record_step(self.convert_hint(hint)?);
        }
        Ok(trace)
    }

    /// Side axioms for one converted step.
    pub fn collect_functional_axioms(&mut self, step: &RewriteStep) -> Result<Axioms> {
        self.step_axioms(&step.substitution, &step.events)
    }

    fn convert_event(&mut self, event: &KoreEvent) -> Result<StepEvent> {
        Ok(match event {
            KoreEvent::Function {
                name,
                relative_position,
            } => StepEvent::Function {
                name: name.clone(),
                relative_position: Location(relative_position.clone()),
            },
            KoreEvent::Hook { name, args, result } => StepEvent::Hook {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|arg| self.convert_pattern(arg))
                    .collect::<Result<Vec<_>>>()?,
                result: self.convert_pattern(result)?,
            },
        })
    }

    fn classify_and_convert(&mut self, pattern: &KorePattern) -> Result<ConvertedAxiom> {
        if let KorePattern::Rewrites { sort, left, right } = pattern {
            if let (KorePattern::And { left: lhs, .. }, KorePattern::And { left: rhs, .. }) =
                (left.as_ref(), right.as_ref())
            {
                let sort = self.interner.sort(sort.name());
                let lhs = self.convert_pattern(lhs)?;
                let rhs = self.convert_pattern(rhs)?;
                let rule = self.notations.resolve(names::KORE_REWRITES, vec![sort, lhs, rhs])?;
                return Ok(ConvertedAxiom::new(AxiomType::RewriteRule, rule));
            }
        }

        if let Some(equation) = EquationShape::of(pattern) {
            let sort = self.interner.sort(equation.sort);
            let lhs = self.convert_pattern(equation.lhs)?;
            let rhs = self.convert_pattern(equation.rhs)?;
            let rule = self.notations.resolve(names::KORE_EQUALS, vec![sort, lhs, rhs])?;
            let requires = self.requires_substitution(equation.requires)?;
            return Ok(ConvertedAxiom::new(AxiomType::EquationalRule, rule).with_requires(requires));
        }

        let converted = self.convert_pattern(pattern)?;
        Ok(ConvertedAxiom::new(AxiomType::Unclassified, converted))
    }

    /// Bindings `x ↦ p` from `\in(x, p)` and `\equals(x, p)` conjuncts.
    fn requires_substitution(&mut self, requires: &KorePattern) -> Result<Substitution> {
        let mut conjuncts = Vec::new();
        flatten_and(requires, &mut conjuncts);
        let mut substitution = Substitution::new();
        for conjunct in conjuncts {
            let (KorePattern::In { left, right, .. } | KorePattern::Equals { left, right, .. }) =
                conjunct
            else {
                continue;
            };
            let KorePattern::EVar { name, .. } = left.as_ref() else {
                continue;
            };
            let id = self.interner.declare_metavar_id(name);
            let value = self.convert_pattern(right)?;
            substitution.insert(id, value);
        }
        Ok(substitution)
    }

    fn resolve_symbol(&mut self, name: &str) -> Pattern {
        let symbol = self.interner.symbol(name);
        if self.raw_functional.contains(name) {
            self.functional_symbols.insert(symbol.clone());
        }
        if self.raw_simplifiable.contains(name) {
            self.simplifiable_symbols.insert(symbol.clone());
        }
        symbol
    }

    fn cell_head(&mut self, symbol: &str) -> Result<Pattern> {
        if let Some(head) = self.cell_heads.get(symbol) {
            return Ok(head.clone());
        }
        let name = self
            .cell_regex
            .captures(symbol)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| TranslationError::NotACell {
                symbol: symbol.to_string(),
            })?;
        let head = self.interner.symbol(&name);
        if self.raw_functional.contains(symbol) {
            self.functional_symbols.insert(head.clone());
        }
        self.cell_symbols.insert(symbol.to_string());
        self.cell_heads.insert(symbol.to_string(), head.clone());
        debug!(cell = %name, symbol = %symbol, "registered cell");
        Ok(head)
    }

    fn convert_cell(&mut self, symbol: &str, args: &[KorePattern]) -> Result<Pattern> {
        let head = self.cell_head(symbol)?;
        if args.is_empty() {
            debug!(cell = %head, "cell has no content");
            return Ok(head);
        }

        let mut nested = false;
        let mut children = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                KorePattern::App {
                    symbol: inner,
                    args: inner_args,
                    ..
                } if self.cell_regex.is_match(inner) => {
                    nested = true;
                    children.push(self.convert_cell(inner, inner_args)?);
                }
                other => children.push(self.convert_pattern(other)?),
            }
        }

        let cells = chain_with_head(head, children);
        let marker = if nested {
            names::NESTED_CELLS
        } else {
            names::CELL
        };
        Ok(self.notations.resolve(marker, vec![cells])?)
    }

    /// Accepts a substitution value whose head is a registered functional
    /// symbol or cell.
    ///
    /// Domain-value literals are accepted without a head lookup: a literal
    /// denotes exactly one element, so it needs no functional declaration.
    fn check_functional(&self, pattern: &Pattern) -> Result<()> {
        let head = match pattern.as_notation() {
            Some((names::KORE_DV, _)) => return Ok(()),
            Some((names::KORE_APP, [_, applied])) => applied.unchain().0,
            Some((names::CELL | names::NESTED_CELLS, [cells])) => cells.unchain().0,
            _ => pattern.unchain().0,
        };
        if self.functional_symbols.contains(head) {
            return Ok(());
        }
        Err(InvariantError::NonFunctionalSubstitution {
            head: head.to_string(),
            pattern: pattern.to_string(),
        }
        .into())
    }
}

impl LanguageSemantics for KoreConverter {
    fn axiom(&mut self, ordinal: usize) -> Result<ConvertedAxiom> {
        self.retrieve_axiom_for_ordinal(ordinal)
    }

    fn step_axioms(&mut self, substitution: &Substitution, events: &[StepEvent]) -> Result<Axioms> {
        let mut axioms = Vec::with_capacity(substitution.len() + events.len());
        for pattern in substitution.values() {
            self.check_functional(pattern)?;
            axioms.push(ConvertedAxiom::new(
                AxiomType::FunctionalSymbol,
                functional_axiom(pattern),
            ));
        }
        for event in events {
            let kind = match event {
                StepEvent::Function { .. } => AxiomType::FunctionEvent,
                StepEvent::Hook { .. } => AxiomType::HookEvent,
            };
            axioms.push(ConvertedAxiom::new(kind, event_placeholder_axiom()));
        }
        Ok(organize_axioms(axioms))
    }

    fn count_simplifications(&self, pattern: &Pattern) -> usize {
        let mut count = 0;
        let mut stack = vec![pattern];
        while let Some(node) = stack.pop() {
            if let Some((names::KORE_APP, [_, applied])) = node.as_notation() {
                if self.simplifiable_symbols.contains(applied.unchain().0) {
                    count += 1;
                }
            }
            stack.extend(node.children());
        }
        count
    }

    fn notations(&self) -> &NotationRegistry {
        &self.notations
    }
}

/// Parts of an equational axiom.
struct EquationShape<'a> {
    requires: &'a KorePattern,
    sort: &'a str,
    lhs: &'a KorePattern,
    rhs: &'a KorePattern,
}

impl<'a> EquationShape<'a> {
    fn of(pattern: &'a KorePattern) -> Option<Self> {
        let KorePattern::Implies {
            left: requires,
            right,
            ..
        } = pattern
        else {
            return None;
        };
        let equation = match right.as_ref() {
            KorePattern::And { left, .. } => left.as_ref(),
            other => other,
        };
        let KorePattern::Equals {
            operand_sort,
            left: lhs,
            right: rhs,
            ..
        } = equation
        else {
            return None;
        };
        // The right side may carry its ensures clause
        let rhs = match rhs.as_ref() {
            KorePattern::And { left, .. } => left.as_ref(),
            other => other,
        };
        Some(Self {
            requires,
            sort: operand_sort.name(),
            lhs,
            rhs,
        })
    }
}

fn flatten_and<'a>(pattern: &'a KorePattern, out: &mut Vec<&'a KorePattern>) {
    match pattern {
        KorePattern::And { left, right, .. } => {
            flatten_and(left, out);
            flatten_and(right, out);
        }
        other => out.push(other),
    }
}

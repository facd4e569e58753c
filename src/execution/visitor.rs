//! Stack machine for nested equational simplification.
//!
//! The right side of an equation may itself contain redexes that the backend
//! simplifies before the outer simplification is finished. Each simplification
//! pushes a [`SimplificationFrame`] recording where it applies and how many
//! nested redexes its result still contains. Closing a scope drains every
//! exhausted frame: its result is spliced into the frame below (or into the
//! base configuration) and the frame below has one redex fewer. Draining is
//! iterative, so nesting depth is bounded only by memory.
//!
//! Calls are only accepted inside a scope opened with
//! [`SimplificationVisitor::enter`]. The returned [`SimplificationScope`]
//! drains on [`exit`](SimplificationScope::exit) and, failing that, on drop,
//! so every exit path leaves the stack consistent.
//!
//! # Citations
//! - Worklist rewriting with explicit stacks: Baader & Nipkow, "Term Rewriting and All That", Ch. 4 (1998)

use crate::error::{InvariantError, Result, ScopeError};
use crate::pattern::{Location, Pattern, Substitution};
use crate::semantics::{AxiomType, LanguageSemantics};
use tracing::{debug, error};

/// One in-progress simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplificationFrame {
    /// Position of the rewritten sub-term, relative to the frame below.
    pub location: Location,
    /// Sub-term before simplification.
    pub initial_pattern: Pattern,
    /// Simplification result, updated as nested frames drain into it.
    pub result: Pattern,
    /// Nested redexes in `result` not yet simplified.
    pub remaining: usize,
}

/// Simplification stack over a base configuration.
#[derive(Debug, Clone)]
pub struct SimplificationVisitor {
    configuration: Pattern,
    frames: Vec<SimplificationFrame>,
    in_scope: bool,
}

impl SimplificationVisitor {
    pub fn new(configuration: Pattern) -> Self {
        Self {
            configuration,
            frames: Vec::new(),
            in_scope: false,
        }
    }

    /// Base configuration with every completed simplification applied.
    pub fn configuration(&self) -> &Pattern {
        &self.configuration
    }

    pub fn frames(&self) -> &[SimplificationFrame] {
        &self.frames
    }

    /// Number of frames still on the stack.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    pub fn is_in_scope(&self) -> bool {
        self.in_scope
    }

    /// Replaces the base configuration. Only valid with an idle, empty stack.
    pub fn update_configuration(&mut self, configuration: Pattern) -> Result<()> {
        if self.in_scope {
            return Err(ScopeError::AlreadyInScope.into());
        }
        if !self.frames.is_empty() {
            return Err(ScopeError::PendingSimplifications {
                pending: self.frames.len(),
            }
            .into());
        }
        self.configuration = configuration;
        Ok(())
    }

    /// Opens a batch. Fails if one is already open.
    pub fn enter<'v, S: LanguageSemantics>(
        &'v mut self,
        semantics: &'v mut S,
    ) -> Result<SimplificationScope<'v, S>> {
        if self.in_scope {
            return Err(ScopeError::AlreadyInScope.into());
        }
        self.in_scope = true;
        Ok(SimplificationScope {
            visitor: self,
            semantics,
            closed: false,
        })
    }

    /// Applies equation `ordinal` at `location` and pushes its frame.
    ///
    /// The location is resolved in the top frame's result, or in the base
    /// configuration when the stack is empty. The equation's right side is
    /// instantiated first with its requires-clause bindings, then with
    /// `substitution`.
    pub fn call<S: LanguageSemantics>(
        &mut self,
        semantics: &mut S,
        ordinal: usize,
        substitution: &Substitution,
        location: &Location,
    ) -> Result<&SimplificationFrame> {
        if !self.in_scope {
            return Err(ScopeError::NotInScope.into());
        }

        let root = self
            .frames
            .last()
            .map(|frame| &frame.result)
            .unwrap_or(&self.configuration);
        let initial_pattern = root
            .subpattern(location)
            .cloned()
            .ok_or_else(|| InvariantError::UnresolvedLocation {
                location: location.to_string(),
                pattern: root.to_string(),
            })?;

        let rule = semantics.axiom(ordinal)?;
        if rule.kind != AxiomType::EquationalRule {
            return Err(InvariantError::NotEquational {
                ordinal,
                kind: rule.kind.to_string(),
            }
            .into());
        }
        let (_, rhs) = rule.sides().ok_or_else(|| {
            InvariantError::MalformedRule(format!("equation {} has no sides", ordinal))
        })?;
        let result = rhs.instantiate(&rule.requires).instantiate(substitution);
        let remaining = semantics.count_simplifications(&result);

        debug!(
            ordinal,
            location = %location,
            remaining,
            depth = self.frames.len() + 1,
            "pushed simplification"
        );
        self.frames.push(SimplificationFrame {
            location: location.clone(),
            initial_pattern,
            result,
            remaining,
        });
        Ok(&self.frames[self.frames.len() - 1])
    }

    /// Closes the batch and drains exhausted frames.
    pub fn exit(&mut self) -> Result<()> {
        self.in_scope = false;
        self.drain()
    }

    fn drain(&mut self) -> Result<()> {
        while self.frames.last().is_some_and(|frame| frame.remaining == 0) {
            let Some(done) = self.frames.pop() else {
                break;
            };
            match self.frames.last_mut() {
                Some(parent) => {
                    parent.result = splice(&parent.result, &done.location, done.result)?;
                    parent.remaining = parent.remaining.checked_sub(1).ok_or_else(|| {
                        InvariantError::SimplificationUnderflow {
                            location: parent.location.to_string(),
                        }
                    })?;
                }
                None => {
                    self.configuration =
                        splice(&self.configuration, &done.location, done.result)?;
                }
            }
            debug!(location = %done.location, pending = self.frames.len(), "drained simplification");
        }
        Ok(())
    }
}

fn splice(target: &Pattern, location: &Location, plug: Pattern) -> Result<Pattern> {
    target.replace_at(location, plug).ok_or_else(|| {
        InvariantError::UnresolvedLocation {
            location: location.to_string(),
            pattern: target.to_string(),
        }
        .into()
    })
}

/// An open simplification batch.
///
/// Borrows the visitor and the semantics for the duration of the batch.
pub struct SimplificationScope<'v, S: LanguageSemantics> {
    visitor: &'v mut SimplificationVisitor,
    semantics: &'v mut S,
    closed: bool,
}

impl<'v, S: LanguageSemantics> SimplificationScope<'v, S> {
    /// See [`SimplificationVisitor::call`].
    pub fn call(
        &mut self,
        ordinal: usize,
        substitution: &Substitution,
        location: &Location,
    ) -> Result<SimplificationFrame> {
        self.visitor
            .call(&mut *self.semantics, ordinal, substitution, location)
            .cloned()
    }

    pub fn visitor(&self) -> &SimplificationVisitor {
        self.visitor
    }

    /// Closes the batch, reporting drain failures.
    pub fn exit(mut self) -> Result<()> {
        self.closed = true;
        self.visitor.exit()
    }
}

impl<'v, S: LanguageSemantics> Drop for SimplificationScope<'v, S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.visitor.exit() {
            error!(error = %err, "simplification scope dropped with inconsistent stack");
        }
    }
}

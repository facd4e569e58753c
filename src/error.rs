//! Error taxonomy for proof generation.
//!
//! Every failure is fatal: a partially constructed proof is unsound, so no
//! error is retried or downgraded. Errors are grouped by the layer that
//! detects them:
//!
//! - [`TranslationError`]: the language definition contains a construct that has no
//!   conversion, or refers to something that was never declared.
//! - [`InvariantError`]: the trace and the language definition disagree.
//! - [`ScopeError`]: the engine or visitor was driven out of order.
//! - [`PackagingError`]: claims and proofs do not pair up at serialization.
//! - [`ProofError`]: a proof combinator was applied to ill-shaped premises.
//!
//! Patterns carried inside errors are rendered to strings so the error types
//! stay `Send + Sync`.

use thiserror::Error;

/// Failures while converting definition syntax into patterns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("unsupported construct in {context}: {construct}")]
    Unsupported { context: String, construct: String },

    #[error("notation `{name}` expects {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("unknown symbol `{name}`")]
    UnknownSymbol { name: String },

    #[error("`{symbol}` is not a cell symbol")]
    NotACell { symbol: String },

    #[error("axiom ordinal {ordinal} out of range (definition has {count} axioms)")]
    OrdinalOutOfRange { ordinal: usize, count: usize },

    #[error("invalid cell naming pattern: {0}")]
    InvalidCellPattern(String),
}

/// The trace diverged from the language definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("substitution head `{head}` is not a functional symbol (pattern {pattern})")]
    NonFunctionalSubstitution { head: String, pattern: String },

    #[error("rule left side {lhs} does not match configuration {configuration}")]
    ConfigurationMismatch { lhs: String, configuration: String },

    #[error("axiom {ordinal} is {kind}, expected an equational rule")]
    NotEquational { ordinal: usize, kind: String },

    #[error("rule {pattern} is {kind}, expected a rewrite rule")]
    NotRewriteRule { kind: String, pattern: String },

    #[error("axiom {ordinal} has no handler for kind {kind}")]
    UnexpectedAxiomKind { ordinal: usize, kind: String },

    #[error("location {location} does not resolve in {pattern}")]
    UnresolvedLocation { location: String, pattern: String },

    #[error("malformed rule: {0}")]
    MalformedRule(String),

    #[error("simplification step for axiom {ordinal} carries no location")]
    MissingLocation { ordinal: usize },

    #[error("simplification frame at {location} drained below zero")]
    SimplificationUnderflow { location: String },
}

/// The engine or visitor was used outside its lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("simplification call outside an open scope")]
    NotInScope,

    #[error("a simplification scope is already open")]
    AlreadyInScope,

    #[error("{pending} simplification frames still pending")]
    PendingSimplifications { pending: usize },

    #[error("execution proof already finalized")]
    Finalized,
}

/// Claims and proofs do not pair up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackagingError {
    #[error("{claims} claims but only {proofs} proofs")]
    MissingProofs { claims: usize, proofs: usize },

    #[error("proof {index} has no claim left to discharge")]
    UnclaimedProof { index: usize },

    #[error("proof {index} concludes {found}, claim is {expected}")]
    ConclusionMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("proof uses axiom {axiom} which is not part of the theory")]
    UnknownAxiom { axiom: String },
}

/// Ill-formed proof construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("modus ponens major premise does not conclude an implication: {0}")]
    NotAnImplication(String),

    #[error("modus ponens minor premise proves {found}, expected {expected}")]
    ModusPonensMismatch { expected: String, found: String },
}

/// Any failure raised by this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantError),

    #[error("scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("packaging error: {0}")]
    Packaging(#[from] PackagingError),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: Error = ScopeError::NotInScope.into();
        assert_eq!(
            err.to_string(),
            "scope error: simplification call outside an open scope"
        );
        assert!(matches!(err, Error::Scope(ScopeError::NotInScope)));
    }

    #[test]
    fn packaging_error_reports_counts() {
        let err = PackagingError::MissingProofs {
            claims: 3,
            proofs: 2,
        };
        assert_eq!(err.to_string(), "3 claims but only 2 proofs");
    }
}

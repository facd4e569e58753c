//! ml-proofgen: matching-logic proof objects for K execution traces.
//!
//! Given a language definition in Kore and an execution trace produced by a
//! K backend, this crate builds a proof object showing that each observed
//! step follows from the definition's axioms, and packages it into the
//! binary format consumed by an independent proof checker:
//! - Pattern algebra with structural sharing, notations and positional
//!   instantiation.
//! - Proof terms of the matching-logic Hilbert calculus.
//! - Conversion of Kore definitions (and Metamath base theories) into
//!   classified axioms.
//! - Trace replay with a stack machine for nested simplifications.
//! - A deterministic serializer with back-references.
//!
//! # Pipeline
//!
//! ```text
//! Definition ──KoreConverter──▶ axioms ─┐
//! KoreHint* ──convert_trace──▶ RewriteStep* ──prove_trace──▶ ProofBundle ──serialize──▶ ProofArtifact
//! ```
//!
//! Every failure is fatal. An artifact is produced only when every claim is
//! discharged by a proof.
//!
//! # References
//!
//! - Chen, Roşu. "Matching μ-logic" (LICS 2019) – the proof system
//! - Lin et al. "Generating proof certificates for a language-agnostic deductive program verifier" (OOPSLA 2023)
//! - Roşu, Şerbănuţă. "An overview of the K semantic framework" (2010) – Kore and configurations
//! - Megill, Wheeler. "Metamath: A Computer Language for Mathematical Proofs" (2019)
//!
//! # Example
//!
//! ```
//! use ml_proofgen::prelude::*;
//!
//! let state = |c: &str| Pattern::app(Pattern::symbol("state"), Pattern::symbol(c));
//! let rule = Pattern::notation(
//!     names::KORE_REWRITES,
//!     vec![Pattern::symbol("sort"), state("c0"), state("c1")],
//! );
//! let mut bundle = ProofBundle::new();
//! bundle.add_axiom(rule.clone());
//! bundle.add_claim(rule.clone());
//! bundle.add_proof(Proof::axiom(rule));
//! let artifact = bundle.serialize(&NotationRegistry::with_builtins()).unwrap();
//! assert!(!artifact.proofs.is_empty());
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod execution;
pub mod fingerprint;
pub mod kore;
pub mod mm;
pub mod pattern;
pub mod proof;
pub mod propositional;
pub mod semantics;
pub mod serializer;
pub mod trace;

pub use bundle::ProofBundle;
pub use error::{Error, Result};
pub use execution::{prove_trace, ExecutionProofState};
pub use pattern::{Location, Pattern, Substitution};
pub use proof::Proof;
pub use serializer::ProofArtifact;

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::bundle::ProofBundle;
    pub use crate::config::ConverterConfig;
    pub use crate::error::{
        Error, InvariantError, PackagingError, ProofError, Result, ScopeError, TranslationError,
    };
    pub use crate::execution::{
        prove_trace, ExecutionProofState, SimplificationFrame, SimplificationScope,
        SimplificationVisitor,
    };
    pub use crate::fingerprint::{Canonicalizable, HashValue};
    pub use crate::kore::{Definition, KoreConverter, KoreHint, KorePattern};
    pub use crate::mm::{Database, MetamathConverter};
    pub use crate::pattern::notation::{names, NotationDef, NotationRegistry};
    pub use crate::pattern::{chain, chain_with_head, Location, Pattern, Substitution};
    pub use crate::proof::{Proof, ProofRule};
    pub use crate::semantics::{
        organize_axioms, AxiomType, Axioms, ConvertedAxiom, LanguageSemantics, StepEvent,
    };
    pub use crate::serializer::{serialize, ProofArtifact};
    pub use crate::trace::{ExecutionTrace, RewriteStep};
}

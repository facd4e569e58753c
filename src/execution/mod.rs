//! Execution proofs: trace replay and nested simplification.

pub mod engine;
pub mod visitor;

pub use engine::{prove_trace, ExecutionProofState};
pub use visitor::{SimplificationFrame, SimplificationScope, SimplificationVisitor};

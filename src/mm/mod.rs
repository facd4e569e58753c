//! Metamath input: a base theory and notations written in Metamath syntax.

pub mod ast;
pub mod converter;
pub mod scope;

pub use ast::{Database, Statement, Term};
pub use converter::{MetamathConverter, NamedAxiom};
pub use scope::Scope;

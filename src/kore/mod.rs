//! Kore input: syntax and conversion into the pattern algebra.

pub mod ast;
pub mod converter;

pub use ast::{Attribute, Axiom, Definition, KoreEvent, KoreHint, KorePattern, Module, Sort, SymbolDecl};
pub use converter::KoreConverter;

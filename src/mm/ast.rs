//! Metamath database syntax.
//!
//! Only the statement shapes the converter consumes are modelled. Labels are
//! kept for diagnostics and for naming theory axioms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A term: either a constant applied to subterms or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Application { symbol: String, subterms: Vec<Term> },
    Metavariable(String),
}

impl Term {
    /// A constant with no subterms.
    pub fn constant(symbol: impl Into<String>) -> Self {
        Term::Application {
            symbol: symbol.into(),
            subterms: Vec::new(),
        }
    }

    pub fn app(symbol: impl Into<String>, subterms: Vec<Term>) -> Self {
        Term::Application {
            symbol: symbol.into(),
            subterms,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Metavariable(name.into())
    }

    /// The head symbol of an application.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Term::Application { symbol, .. } => Some(symbol),
            Term::Metavariable(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Application { symbol, subterms } if subterms.is_empty() => f.write_str(symbol),
            Term::Application { symbol, subterms } => {
                write!(f, "( {}", symbol)?;
                for sub in subterms {
                    write!(f, " {}", sub)?;
                }
                f.write_str(" )")
            }
            Term::Metavariable(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// `$c c1 c2 … $.`
    Constant(Vec<String>),
    /// `$v v1 v2 … $.`
    Variable(Vec<String>),
    /// `label $f typecode var $.`
    Floating {
        label: String,
        typecode: String,
        variable: String,
    },
    /// `label $e terms $.`
    Essential { label: String, terms: Vec<Term> },
    /// `label $a terms $.`
    Axiomatic { label: String, terms: Vec<Term> },
    /// `label $p terms $= … $.`
    Provable { label: String, terms: Vec<Term> },
    /// `${ … $}`
    Block(Vec<Statement>),
}

/// A parsed database, statements in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub statements: Vec<Statement>,
}

impl Database {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

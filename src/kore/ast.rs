//! Abstract syntax of a parsed Kore definition.
//!
//! The parser lives outside this crate; it hands over a [`Definition`] built
//! from these types (directly, or CBOR encoded through serde). Only the
//! fragments the converter inspects are modelled: modules with sort and
//! symbol declarations, attributes, and axioms over [`KorePattern`].

use serde::{Deserialize, Serialize};

/// A sort reference such as `SortInt{}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sort(pub String);

impl Sort {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Attribute such as `functional{}()` or `hook{}("INT.add")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<String>,
}

impl Attribute {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|a| a.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDecl {
    pub name: String,
    pub attrs: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolDecl {
    pub name: String,
    pub param_sorts: Vec<Sort>,
    pub result_sort: Sort,
    pub attrs: Vec<Attribute>,
}

impl SymbolDecl {
    pub fn has_attribute(&self, name: &str) -> bool {
        has_attribute(&self.attrs, name)
    }
}

/// A top-level axiom. Two axioms with identical content are the same axiom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axiom {
    pub pattern: KorePattern,
    pub attrs: Vec<Attribute>,
}

impl Axiom {
    pub fn new(pattern: KorePattern) -> Self {
        Self {
            pattern,
            attrs: Vec::new(),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        has_attribute(&self.attrs, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub sorts: Vec<SortDecl>,
    pub symbols: Vec<SymbolDecl>,
    pub axioms: Vec<Axiom>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub modules: Vec<Module>,
}

impl Definition {
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolDecl> {
        self.modules.iter().flat_map(|m| m.symbols.iter())
    }

    /// Axioms in declaration order; the position is the axiom's ordinal.
    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.modules.iter().flat_map(|m| m.axioms.iter())
    }
}

/// Kore patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KorePattern {
    EVar {
        name: String,
        sort: Sort,
    },
    SVar {
        name: String,
        sort: Sort,
    },
    App {
        symbol: String,
        sorts: Vec<Sort>,
        args: Vec<KorePattern>,
    },
    Top(Sort),
    Bottom(Sort),
    Not {
        sort: Sort,
        pattern: Box<KorePattern>,
    },
    And {
        sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    Or {
        sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    Implies {
        sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    Equals {
        operand_sort: Sort,
        result_sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    In {
        operand_sort: Sort,
        result_sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    Rewrites {
        sort: Sort,
        left: Box<KorePattern>,
        right: Box<KorePattern>,
    },
    Exists {
        sort: Sort,
        var: String,
        var_sort: Sort,
        body: Box<KorePattern>,
    },
    DV {
        sort: Sort,
        value: String,
    },
}

impl KorePattern {
    pub fn evar(name: impl Into<String>, sort: &str) -> Self {
        KorePattern::EVar {
            name: name.into(),
            sort: Sort::new(sort),
        }
    }

    pub fn app(symbol: impl Into<String>, args: Vec<KorePattern>) -> Self {
        KorePattern::App {
            symbol: symbol.into(),
            sorts: Vec::new(),
            args,
        }
    }

    pub fn dv(sort: &str, value: impl Into<String>) -> Self {
        KorePattern::DV {
            sort: Sort::new(sort),
            value: value.into(),
        }
    }

    pub fn top(sort: &str) -> Self {
        KorePattern::Top(Sort::new(sort))
    }

    pub fn and(sort: &str, left: KorePattern, right: KorePattern) -> Self {
        KorePattern::And {
            sort: Sort::new(sort),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn rewrites(sort: &str, left: KorePattern, right: KorePattern) -> Self {
        KorePattern::Rewrites {
            sort: Sort::new(sort),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(operand_sort: &str, result_sort: &str, left: KorePattern, right: KorePattern) -> Self {
        KorePattern::Equals {
            operand_sort: Sort::new(operand_sort),
            result_sort: Sort::new(result_sort),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn implies(sort: &str, left: KorePattern, right: KorePattern) -> Self {
        KorePattern::Implies {
            sort: Sort::new(sort),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_in(operand_sort: &str, result_sort: &str, left: KorePattern, right: KorePattern) -> Self {
        KorePattern::In {
            operand_sort: Sort::new(operand_sort),
            result_sort: Sort::new(result_sort),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Constructor name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            KorePattern::EVar { .. } => "element variable",
            KorePattern::SVar { .. } => "set variable",
            KorePattern::App { .. } => "application",
            KorePattern::Top(_) => "\\top",
            KorePattern::Bottom(_) => "\\bottom",
            KorePattern::Not { .. } => "\\not",
            KorePattern::And { .. } => "\\and",
            KorePattern::Or { .. } => "\\or",
            KorePattern::Implies { .. } => "\\implies",
            KorePattern::Equals { .. } => "\\equals",
            KorePattern::In { .. } => "\\in",
            KorePattern::Rewrites { .. } => "\\rewrites",
            KorePattern::Exists { .. } => "\\exists",
            KorePattern::DV { .. } => "\\dv",
        }
    }
}

/// Raw auxiliary event recorded by the backend during one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KoreEvent {
    Function {
        name: String,
        relative_position: Vec<usize>,
    },
    Hook {
        name: String,
        args: Vec<KorePattern>,
        result: KorePattern,
    },
}

/// One raw trace step as read from the backend's hint stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KoreHint {
    /// Ordinal of the applied axiom.
    pub ordinal: usize,
    /// Configuration the step was applied to.
    pub configuration_before: KorePattern,
    /// Variable bindings, by rule variable name.
    pub substitutions: Vec<(String, KorePattern)>,
    /// Position of the rewritten sub-term for simplification steps.
    pub location: Option<Vec<usize>>,
    pub events: Vec<KoreEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axioms_are_listed_in_declaration_order() {
        let first = Axiom::new(KorePattern::top("SortK"));
        let second = Axiom::new(KorePattern::dv("SortInt", "1"));
        let third = Axiom::new(KorePattern::dv("SortInt", "2"));
        let definition = Definition {
            modules: vec![
                Module {
                    name: "A".to_string(),
                    axioms: vec![first.clone(), second.clone()],
                    ..Module::default()
                },
                Module {
                    name: "B".to_string(),
                    axioms: vec![third.clone()],
                    ..Module::default()
                },
            ],
        };
        let got: Vec<&Axiom> = definition.axioms().collect();
        assert_eq!(got, vec![&first, &second, &third]);
    }

    #[test]
    fn attributes_are_found_by_name() {
        let decl = SymbolDecl {
            name: "Lblf".to_string(),
            param_sorts: vec![Sort::new("SortInt")],
            result_sort: Sort::new("SortInt"),
            attrs: vec![Attribute::flag("functional"), Attribute::flag("total")],
        };
        assert!(decl.has_attribute("functional"));
        assert!(!decl.has_attribute("hook"));
    }

    #[test]
    fn hints_roundtrip_through_cbor() {
        let hint = KoreHint {
            ordinal: 3,
            configuration_before: KorePattern::app("Lblc", vec![]),
            substitutions: vec![("X".to_string(), KorePattern::dv("SortInt", "5"))],
            location: Some(vec![0, 1]),
            events: vec![KoreEvent::Function {
                name: "Lblf".to_string(),
                relative_position: vec![1],
            }],
        };
        let bytes = serde_cbor::to_vec(&hint).expect("encode");
        let decoded: KoreHint = serde_cbor::from_slice(&bytes).expect("decode");
        assert_eq!(decoded, hint);
    }
}

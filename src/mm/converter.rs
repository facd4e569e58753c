//! Conversion of a Metamath database into notations and theory axioms.
//!
//! Statements are processed top to bottom in one pass:
//!
//! - `$c` and `$v` record constants and variables.
//! - `$f` statements with a known type code declare a variable in scope.
//! - `#Pattern "c"` declares a domain value, `#Symbol c` a symbol, and
//!   `#Notation ( name args… ) body` a notation whose template is `body`
//!   with the formal arguments numbered positionally.
//! - `|- φ` becomes a named theory axiom.
//!
//! Anything else is skipped with a warning. Variables declared inside a
//! `${ … $}` block go out of scope at its end.

use super::ast::{Database, Statement, Term};
use super::scope::Scope;
use crate::bundle::ProofBundle;
use crate::error::{Result, TranslationError};
use crate::pattern::notation::{NotationDef, NotationRegistry};
use crate::pattern::Pattern;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const PATTERN: &str = "#Pattern";
const SYMBOL: &str = "#Symbol";
const VARIABLE: &str = "#Variable";
const ELEMENT_VARIABLE: &str = "#ElementVariable";
const SET_VARIABLE: &str = "#SetVariable";
const NOTATION: &str = "#Notation";
const PROVABLE: &str = "|-";

const IMP: &str = "\\imp";
const APP: &str = "\\app";
const EXISTS: &str = "\\exists";
const MU: &str = "\\mu";

/// A `|- φ` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAxiom {
    pub label: String,
    pub pattern: Pattern,
}

pub struct MetamathConverter {
    scope: Scope,
    constants: BTreeSet<String>,
    variables: BTreeSet<String>,
    notations: NotationRegistry,
    axioms: Vec<NamedAxiom>,
}

impl MetamathConverter {
    /// Converts `database`.
    pub fn new(database: &Database) -> Result<Self> {
        let mut converter = Self {
            scope: Scope::new(),
            constants: BTreeSet::new(),
            variables: BTreeSet::new(),
            notations: NotationRegistry::with_builtins(),
            axioms: Vec::new(),
        };
        converter.import(&database.statements)?;
        debug!(
            notations = converter.notations.len(),
            axioms = converter.axioms.len(),
            "converted metamath database"
        );
        Ok(converter)
    }

    pub fn notations(&self) -> &NotationRegistry {
        &self.notations
    }

    pub fn axioms(&self) -> &[NamedAxiom] {
        &self.axioms
    }

    /// The theory axiom labelled `label`.
    pub fn axiom(&self, label: &str) -> Option<&Pattern> {
        self.axioms
            .iter()
            .find(|axiom| axiom.label == label)
            .map(|axiom| &axiom.pattern)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    /// Asserts every converted axiom in `bundle`, in database order.
    pub fn assert_theory(&self, bundle: &mut ProofBundle) {
        bundle.add_axioms(self.axioms.iter().map(|axiom| axiom.pattern.clone()));
    }

    /// Converts `term` in the top-level scope.
    pub fn convert_term(&self, term: &Term) -> Result<Pattern> {
        Ok(self.convert_in(&self.scope, term)?)
    }

    fn import(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            match statement {
                Statement::Constant(names) => self.constants.extend(names.iter().cloned()),
                Statement::Variable(names) => self.variables.extend(names.iter().cloned()),
                Statement::Floating {
                    label,
                    typecode,
                    variable,
                } => self.import_floating(label, typecode, variable),
                Statement::Axiomatic { label, terms } => self.import_axiomatic(label, terms)?,
                Statement::Essential { label, .. } | Statement::Provable { label, .. } => {
                    debug!(label = label.as_str(), "ignoring hypothesis or theorem");
                }
                Statement::Block(inner) => {
                    let mark = self.scope.mark();
                    self.import(inner)?;
                    self.scope.truncate(mark);
                }
            }
        }
        Ok(())
    }

    fn import_floating(&mut self, label: &str, typecode: &str, variable: &str) {
        if !self.variables.contains(variable) {
            warn!(label, variable, "floating statement for undeclared variable");
            return;
        }
        match typecode {
            PATTERN | VARIABLE | SYMBOL => {
                self.scope.add_metavariable(variable);
            }
            ELEMENT_VARIABLE => {
                self.scope.add_element_var(variable);
            }
            SET_VARIABLE => {
                self.scope.add_set_var(variable);
            }
            _ => warn!(label, typecode, "skipping floating statement"),
        }
    }

    fn import_axiomatic(&mut self, label: &str, terms: &[Term]) -> Result<()> {
        let typecode = terms.first().and_then(Term::symbol).unwrap_or_default();
        match (typecode, &terms[1.min(terms.len())..]) {
            (PATTERN, [Term::Application { symbol, subterms }])
                if subterms.is_empty() && self.constants.contains(symbol) && is_quoted(symbol) =>
            {
                self.scope.add_domain_value(symbol);
            }
            (SYMBOL, [Term::Application { symbol, subterms }]) if subterms.is_empty() => {
                self.scope.add_symbol(symbol);
            }
            (NOTATION, [Term::Application { symbol, subterms }, body]) => {
                let args = subterms
                    .iter()
                    .map(|arg| match arg {
                        Term::Metavariable(name) => Ok(name.clone()),
                        other => Err(TranslationError::Unsupported {
                            context: format!("notation {}", symbol),
                            construct: other.to_string(),
                        }),
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let reduced = self.scope.reduce_to_args(&args)?;
                let template = self.convert_in(&reduced, body)?;
                let def = NotationDef::new(symbol.as_str(), args.len(), template)?;
                if self.notations.register(def).is_some() {
                    debug!(label, notation = symbol.as_str(), "notation redefined");
                }
            }
            (PROVABLE, [statement]) => {
                let pattern = self.convert_in(&self.scope, statement)?;
                self.axioms.push(NamedAxiom {
                    label: label.to_string(),
                    pattern,
                });
            }
            _ => warn!(label, "skipping axiomatic statement"),
        }
        Ok(())
    }

    fn convert_in(&self, scope: &Scope, term: &Term) -> std::result::Result<Pattern, TranslationError> {
        let (symbol, subterms) = match term {
            Term::Metavariable(name) => return scope.resolve(name),
            Term::Application { symbol, subterms } => (symbol.as_str(), subterms.as_slice()),
        };
        match symbol {
            IMP | APP => {
                let (l, r) = binary(symbol, subterms)?;
                let (l, r) = (self.convert_in(scope, l)?, self.convert_in(scope, r)?);
                Ok(if symbol == IMP {
                    Pattern::implies(l, r)
                } else {
                    Pattern::app(l, r)
                })
            }
            EXISTS | MU => {
                let (var, body) = binary(symbol, subterms)?;
                let var = self.convert_in(scope, var)?;
                let body = self.convert_in(scope, body)?;
                match (symbol, var) {
                    (EXISTS, Pattern::EVar(id)) => Ok(Pattern::exists(id, body)),
                    (MU, Pattern::SVar(id)) => Ok(Pattern::mu(id, body)),
                    (_, var) => Err(TranslationError::Unsupported {
                        context: symbol.to_string(),
                        construct: format!("binder {}", var),
                    }),
                }
            }
            name if self.notations.contains(name) => {
                let args = subterms
                    .iter()
                    .map(|sub| self.convert_in(scope, sub))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                self.notations.resolve(name, args)
            }
            name if scope.is_symbol(name) => {
                if !subterms.is_empty() {
                    return Err(TranslationError::Arity {
                        name: name.to_string(),
                        expected: 0,
                        found: subterms.len(),
                    });
                }
                Ok(Pattern::symbol(name))
            }
            name => Err(TranslationError::UnknownSymbol {
                name: name.to_string(),
            }),
        }
    }
}

fn binary<'t>(symbol: &str, subterms: &'t [Term]) -> std::result::Result<(&'t Term, &'t Term), TranslationError> {
    match subterms {
        [l, r] => Ok((l, r)),
        _ => Err(TranslationError::Arity {
            name: symbol.to_string(),
            expected: 2,
            found: subterms.len(),
        }),
    }
}

fn is_quoted(symbol: &str) -> bool {
    symbol.len() >= 3
        && symbol.starts_with('"')
        && symbol.ends_with('"')
        && !symbol.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pattern::notation::{self, names};

    fn floating(label: &str, typecode: &str, variable: &str) -> Statement {
        Statement::Floating {
            label: label.to_string(),
            typecode: typecode.to_string(),
            variable: variable.to_string(),
        }
    }

    fn axiomatic(label: &str, terms: Vec<Term>) -> Statement {
        Statement::Axiomatic {
            label: label.to_string(),
            terms,
        }
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn database(extra: Vec<Statement>) -> Database {
        let mut statements = vec![
            Statement::Constant(strings(&[
                PATTERN, SYMBOL, ELEMENT_VARIABLE, NOTATION, PROVABLE, IMP, APP, EXISTS,
                "\\bot", "\\inh", "\"1\"", "sigma",
            ])),
            Statement::Variable(strings(&["ph0", "ph1", "x"])),
            floating("ph0-is-pattern", PATTERN, "ph0"),
            floating("ph1-is-pattern", PATTERN, "ph1"),
            floating("x-is-element-var", ELEMENT_VARIABLE, "x"),
            axiomatic("one-is-pattern", vec![Term::constant(PATTERN), Term::constant("\"1\"")]),
            axiomatic("sigma-is-symbol", vec![Term::constant(SYMBOL), Term::constant("sigma")]),
            axiomatic(
                "inh-is-notation",
                vec![
                    Term::constant(NOTATION),
                    Term::app("\\inh", vec![Term::var("ph0")]),
                    Term::app(APP, vec![Term::constant("sigma"), Term::var("ph0")]),
                ],
            ),
        ];
        statements.extend(extra);
        Database::new(statements)
    }

    #[test]
    fn declarations_populate_scope_and_notations() {
        let converter = MetamathConverter::new(&database(vec![])).expect("converts");
        assert!(converter.scope().is_domain_value("\"1\""));
        assert_eq!(converter.scope().resolve("sigma"), Ok(Pattern::symbol("sigma")));
        assert_eq!(converter.scope().resolve("x"), Ok(Pattern::evar(0)));
        assert!(converter.is_constant("\\inh"));

        let def = converter.notations().get("\\inh").expect("registered");
        assert_eq!(def.arity(), 1);
        assert_eq!(
            def.template(),
            &Pattern::app(Pattern::symbol("sigma"), Pattern::metavar(0))
        );
    }

    #[test]
    fn notation_body_keeps_free_element_variables() {
        let db = database(vec![
            Statement::Constant(strings(&["\\foo"])),
            Statement::Variable(strings(&["y"])),
            floating("y-is-element-var", ELEMENT_VARIABLE, "y"),
            axiomatic(
                "foo-is-notation",
                vec![
                    Term::constant(NOTATION),
                    Term::app("\\foo", vec![Term::var("x")]),
                    Term::app(APP, vec![Term::var("y"), Term::var("x")]),
                ],
            ),
        ]);
        let converter = MetamathConverter::new(&db).expect("converts");
        let y = converter.scope().resolve("y").expect("declared");
        assert_eq!(y, Pattern::evar(1));

        let def = converter.notations().get("\\foo").expect("registered");
        assert_eq!(def.template(), &Pattern::app(y, Pattern::metavar(0)));
    }

    #[test]
    fn provable_statements_become_theory_axioms() {
        let db = database(vec![axiomatic(
            "ax-inh",
            vec![
                Term::constant(PROVABLE),
                Term::app(
                    IMP,
                    vec![
                        Term::var("ph1"),
                        Term::app("\\inh", vec![Term::constant("\"1\"")]),
                    ],
                ),
            ],
        )]);
        let converter = MetamathConverter::new(&db).expect("converts");
        let expected = Pattern::implies(
            Pattern::metavar(1),
            Pattern::notation("\\inh", vec![Pattern::symbol("\"1\"")]),
        );
        assert_eq!(converter.axiom("ax-inh"), Some(&expected));

        let expanded = converter
            .notations()
            .expand_fully(&expected)
            .expect("registered");
        assert_eq!(
            expanded,
            Pattern::implies(
                Pattern::metavar(1),
                Pattern::app(Pattern::symbol("sigma"), Pattern::symbol("\"1\""))
            )
        );

        let mut bundle = ProofBundle::new();
        converter.assert_theory(&mut bundle);
        assert_eq!(bundle.axioms(), &[expected]);
    }

    #[test]
    fn binders_and_builtin_bottom() {
        let converter = MetamathConverter::new(&database(vec![])).expect("converts");
        let term = Term::app(
            EXISTS,
            vec![
                Term::var("x"),
                Term::app(IMP, vec![Term::var("x"), Term::constant("\\bot")]),
            ],
        );
        assert_eq!(
            converter.convert_term(&term),
            Ok(Pattern::exists(
                0,
                Pattern::implies(Pattern::evar(0), notation::bot())
            ))
        );
        assert!(converter.notations().contains(names::BOT));

        let bad_binder = Term::app(EXISTS, vec![Term::var("ph0"), Term::var("ph0")]);
        assert!(matches!(
            converter.convert_term(&bad_binder),
            Err(Error::Translation(TranslationError::Unsupported { .. }))
        ));
    }

    #[test]
    fn malformed_terms_are_rejected() {
        let converter = MetamathConverter::new(&database(vec![])).expect("converts");
        assert_eq!(
            converter.convert_term(&Term::app(IMP, vec![Term::var("ph0")])),
            Err(Error::Translation(TranslationError::Arity {
                name: IMP.to_string(),
                expected: 2,
                found: 1
            }))
        );
        assert!(matches!(
            converter.convert_term(&Term::constant("unknown")),
            Err(Error::Translation(TranslationError::UnknownSymbol { .. }))
        ));
        assert!(matches!(
            converter.convert_term(&Term::var("undeclared")),
            Err(Error::Translation(TranslationError::UnknownVariable { .. }))
        ));
        assert!(matches!(
            converter.convert_term(&Term::app("\\inh", vec![])),
            Err(Error::Translation(TranslationError::Arity { .. }))
        ));
    }

    #[test]
    fn block_variables_are_local() {
        let db = database(vec![
            Statement::Variable(strings(&["ph2"])),
            Statement::Block(vec![
                floating("ph2-is-pattern", PATTERN, "ph2"),
                axiomatic(
                    "ax-local",
                    vec![Term::constant(PROVABLE), Term::var("ph2")],
                ),
            ]),
        ]);
        let converter = MetamathConverter::new(&db).expect("converts");
        assert_eq!(converter.axiom("ax-local"), Some(&Pattern::metavar(2)));
        assert!(converter.scope().resolve("ph2").is_err());
    }

    #[test]
    fn unrecognised_statements_are_skipped() {
        let db = database(vec![
            floating("bogus", "#Bogus", "ph0"),
            floating("undeclared", PATTERN, "zz"),
            axiomatic(
                "imp-is-pattern",
                vec![
                    Term::constant(PATTERN),
                    Term::app(IMP, vec![Term::var("ph0"), Term::var("ph1")]),
                ],
            ),
        ]);
        let converter = MetamathConverter::new(&db).expect("skips");
        assert!(converter.axioms().is_empty());
    }
}

//! Temporal / first-order constraint language over synthesized workflows.
//!
//! Formulas are evaluated at an operation step `s` of a workflow of length
//! `L`. Step-modal operators move along the operation track; quantifiers
//! range over the data instances visible at `s + 1` (everything produced up
//! to and including the operation at `s`).

use std::collections::BTreeSet;
use std::fmt;

use crate::taxonomy::PredicateId;

/// Ground or variable-bearing proposition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormulaAtom {
    True,
    False,
    /// The operation at the current step is subsumed by the predicate.
    Operation(PredicateId),
    /// The data instance bound to the variable carries the type.
    HasType(String, PredicateId),
    /// The operation at the current step takes the variable as an input.
    Consumes(String),
    /// The operation at the current step produced the variable.
    Produces(String),
    /// Both variables denote the same data instance.
    Identical(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Atom(FormulaAtom),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    Xor(Box<Formula>, Box<Formula>),
    Exists(String, Box<Formula>),
    Forall(String, Box<Formula>),
    Next(Box<Formula>),
    Globally(Box<Formula>),
    Finally(Box<Formula>),
    /// Representable so that front ends can parse it; not compilable.
    Until(Box<Formula>, Box<Formula>),
}

#[allow(clippy::should_implement_trait)]
impl Formula {
    pub fn truth() -> Self {
        Formula::Atom(FormulaAtom::True)
    }

    pub fn falsity() -> Self {
        Formula::Atom(FormulaAtom::False)
    }

    pub fn operation(pred: PredicateId) -> Self {
        Formula::Atom(FormulaAtom::Operation(pred))
    }

    pub fn has_type(var: impl Into<String>, pred: PredicateId) -> Self {
        Formula::Atom(FormulaAtom::HasType(var.into(), pred))
    }

    pub fn consumes(var: impl Into<String>) -> Self {
        Formula::Atom(FormulaAtom::Consumes(var.into()))
    }

    pub fn produces(var: impl Into<String>) -> Self {
        Formula::Atom(FormulaAtom::Produces(var.into()))
    }

    pub fn identical(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Formula::Atom(FormulaAtom::Identical(lhs.into(), rhs.into()))
    }

    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn and(terms: Vec<Formula>) -> Self {
        Formula::And(terms)
    }

    pub fn or(terms: Vec<Formula>) -> Self {
        Formula::Or(terms)
    }

    pub fn implies(self, other: Formula) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: Formula) -> Self {
        Formula::Iff(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: Formula) -> Self {
        Formula::Xor(Box::new(self), Box::new(other))
    }

    pub fn exists(var: impl Into<String>, body: Formula) -> Self {
        Formula::Exists(var.into(), Box::new(body))
    }

    pub fn forall(var: impl Into<String>, body: Formula) -> Self {
        Formula::Forall(var.into(), Box::new(body))
    }

    pub fn next(self) -> Self {
        Formula::Next(Box::new(self))
    }

    pub fn globally(self) -> Self {
        Formula::Globally(Box::new(self))
    }

    pub fn finally(self) -> Self {
        Formula::Finally(Box::new(self))
    }

    pub fn until(self, other: Formula) -> Self {
        Formula::Until(Box::new(self), Box::new(other))
    }

    /// Variables mentioned by atoms but not bound by an enclosing quantifier.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
        fn note(name: &String, bound: &[String], out: &mut BTreeSet<String>) {
            if !bound.contains(name) {
                out.insert(name.clone());
            }
        }
        match self {
            Formula::Atom(atom) => match atom {
                FormulaAtom::HasType(x, _) | FormulaAtom::Consumes(x) | FormulaAtom::Produces(x) => {
                    note(x, bound, out)
                }
                FormulaAtom::Identical(x, y) => {
                    note(x, bound, out);
                    note(y, bound, out);
                }
                FormulaAtom::True | FormulaAtom::False | FormulaAtom::Operation(_) => {}
            },
            Formula::Not(f) | Formula::Next(f) | Formula::Globally(f) | Formula::Finally(f) => {
                f.collect_free(bound, out)
            }
            Formula::And(fs) | Formula::Or(fs) => {
                for f in fs {
                    f.collect_free(bound, out);
                }
            }
            Formula::Implies(a, b)
            | Formula::Iff(a, b)
            | Formula::Xor(a, b)
            | Formula::Until(a, b) => {
                a.collect_free(bound, out);
                b.collect_free(bound, out);
            }
            Formula::Exists(x, body) | Formula::Forall(x, body) => {
                bound.push(x.clone());
                body.collect_free(bound, out);
                bound.pop();
            }
        }
    }

    /// Number of nodes, atoms included.
    pub fn size(&self) -> usize {
        match self {
            Formula::Atom(_) => 1,
            Formula::Not(f)
            | Formula::Exists(_, f)
            | Formula::Forall(_, f)
            | Formula::Next(f)
            | Formula::Globally(f)
            | Formula::Finally(f) => 1 + f.size(),
            Formula::And(fs) | Formula::Or(fs) => 1 + fs.iter().map(Formula::size).sum::<usize>(),
            Formula::Implies(a, b)
            | Formula::Iff(a, b)
            | Formula::Xor(a, b)
            | Formula::Until(a, b) => 1 + a.size() + b.size(),
        }
    }
}

impl fmt::Display for FormulaAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaAtom::True => write!(f, "true"),
            FormulaAtom::False => write!(f, "false"),
            FormulaAtom::Operation(p) => write!(f, "op#{p}"),
            FormulaAtom::HasType(x, p) => write!(f, "type#{p}({x})"),
            FormulaAtom::Consumes(x) => write!(f, "in({x})"),
            FormulaAtom::Produces(x) => write!(f, "out({x})"),
            FormulaAtom::Identical(x, y) => write!(f, "{x} = {y}"),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, op: &str, terms: &[Formula]| -> fmt::Result {
            write!(f, "(")?;
            for (i, t) in terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{t}")?;
            }
            write!(f, ")")
        };
        match self {
            Formula::Atom(a) => write!(f, "{a}"),
            Formula::Not(inner) => write!(f, "!{inner}"),
            Formula::And(terms) => join(f, "&", terms),
            Formula::Or(terms) => join(f, "|", terms),
            Formula::Implies(a, b) => write!(f, "({a} -> {b})"),
            Formula::Iff(a, b) => write!(f, "({a} <-> {b})"),
            Formula::Xor(a, b) => write!(f, "({a} ^ {b})"),
            Formula::Exists(x, body) => write!(f, "(E {x}. {body})"),
            Formula::Forall(x, body) => write!(f, "(A {x}. {body})"),
            Formula::Next(inner) => write!(f, "X {inner}"),
            Formula::Globally(inner) => write!(f, "G {inner}"),
            Formula::Finally(inner) => write!(f, "F {inner}"),
            Formula::Until(a, b) => write!(f, "({a} U {b})"),
        }
    }
}

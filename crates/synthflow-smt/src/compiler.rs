//! Compilation of temporal / first-order constraints into clause sets.
//!
//! Every node has a direct and a negated translation; negation is pushed to
//! the atoms by De Morgan instead of wrapping a compiled formula, which keeps
//! quantifiers and implications linear in the formula depth.
//!
//! Quantified variables are renamed to fresh arena variables at every
//! binding site. A variable's atoms (`type`, `consumes`, `produces`, `same`)
//! are tied to the ground atoms of the state it is instantiated to by
//! definitional side constraints, emitted once per atom.

use std::collections::{HashMap, HashSet};

use miette::Diagnostic;
use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::formula::{Formula, FormulaAtom};
use synthflow_ir::taxonomy::{PredicateId, Taxonomy};
use thiserror::Error;
use tracing::debug;

use crate::arena::EncodingArena;
use crate::atoms::{Atom, AtomKind, Entity, VarId};
use crate::cnf::{all_of, any_of, disjoin, disjoin_all, AtomId, Clause, Literal};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompileError {
    #[error("operator '{operator}' is not supported")]
    #[diagnostic(
        code(synthflow::compile::unsupported_operator),
        help("rewrite the constraint with X, G and F")
    )]
    UnsupportedOperator { operator: &'static str },
    #[error("variable '{name}' is not bound by any quantifier")]
    #[diagnostic(code(synthflow::compile::unbound_variable))]
    UnboundVariable { name: String },
    #[error("predicate #{predicate} is not {expected}")]
    #[diagnostic(code(synthflow::compile::wrong_predicate_kind))]
    WrongPredicateKind {
        predicate: PredicateId,
        expected: &'static str,
    },
    #[error("step {step} is outside a workflow of length {length}")]
    #[diagnostic(code(synthflow::compile::step_out_of_range))]
    StepOutOfRange { step: usize, length: usize },
}

/// Surface variable names mapped to arena variables.
///
/// Extending returns a new context; the parent stays untouched for sibling
/// branches.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: HashMap<String, VarId>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, name: &str, var: VarId) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.to_string(), var);
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<VarId> {
        self.bindings.get(name).copied()
    }

    fn resolve(&self, name: &str) -> Result<VarId, CompileError> {
        self.get(name).ok_or_else(|| CompileError::UnboundVariable {
            name: name.to_string(),
        })
    }
}

fn truth() -> Vec<Clause> {
    Vec::new()
}

fn falsity() -> Vec<Clause> {
    vec![Clause::empty()]
}

fn reject_unsupported(formula: &Formula) -> Result<(), CompileError> {
    match formula {
        Formula::Until(_, _) => Err(CompileError::UnsupportedOperator { operator: "until" }),
        Formula::Atom(_) => Ok(()),
        Formula::Not(f)
        | Formula::Next(f)
        | Formula::Globally(f)
        | Formula::Finally(f)
        | Formula::Exists(_, f)
        | Formula::Forall(_, f) => reject_unsupported(f),
        Formula::And(fs) | Formula::Or(fs) => fs.iter().try_for_each(reject_unsupported),
        Formula::Implies(a, b) | Formula::Iff(a, b) | Formula::Xor(a, b) => {
            reject_unsupported(a)?;
            reject_unsupported(b)
        }
    }
}

/// Compiles formulas for one automaton, interning into one arena.
pub struct FormulaCompiler<'a> {
    taxonomy: &'a Taxonomy,
    automaton: &'a Automaton,
    arena: &'a mut EncodingArena,
    side: Vec<Clause>,
    defined: HashSet<AtomId>,
}

impl<'a> FormulaCompiler<'a> {
    pub fn new(
        taxonomy: &'a Taxonomy,
        automaton: &'a Automaton,
        arena: &'a mut EncodingArena,
    ) -> Self {
        Self {
            taxonomy,
            automaton,
            arena,
            side: Vec::new(),
            defined: HashSet::new(),
        }
    }

    fn check_entry(&self, formula: &Formula, step: usize) -> Result<(), CompileError> {
        if step >= self.automaton.length() {
            return Err(CompileError::StepOutOfRange {
                step,
                length: self.automaton.length(),
            });
        }
        reject_unsupported(formula)?;
        if let Some(name) = formula.free_variables().into_iter().next() {
            return Err(CompileError::UnboundVariable { name });
        }
        Ok(())
    }

    /// Clause set equivalent to `formula` at `step`, given the side
    /// constraints.
    pub fn compile(&mut self, formula: &Formula, step: usize) -> Result<Vec<Clause>, CompileError> {
        self.check_entry(formula, step)?;
        self.positive(formula, step, &Substitution::new())
    }

    /// Clause set equivalent to the negation of `formula` at `step`.
    pub fn compile_negated(
        &mut self,
        formula: &Formula,
        step: usize,
    ) -> Result<Vec<Clause>, CompileError> {
        self.check_entry(formula, step)?;
        self.negated(formula, step, &Substitution::new())
    }

    /// Definitional constraints accumulated so far. They only constrain
    /// fresh variable atoms and must be asserted alongside every compiled
    /// clause set.
    pub fn side_constraints(&self) -> &[Clause] {
        &self.side
    }

    pub fn take_side_constraints(&mut self) -> Vec<Clause> {
        std::mem::take(&mut self.side)
    }

    /// Compile top-level constraints at step 0, side constraints included.
    pub fn compile_constraints(&mut self, formulas: &[Formula]) -> Result<Vec<Clause>, CompileError> {
        let mut out = Vec::new();
        for formula in formulas {
            out.extend(self.compile(formula, 0)?);
        }
        out.extend(self.take_side_constraints());
        debug!(
            constraints = formulas.len(),
            clauses = out.len(),
            variables = self.arena.variables().len(),
            "compiled constraints"
        );
        Ok(out)
    }

    fn positive(
        &mut self,
        formula: &Formula,
        step: usize,
        sub: &Substitution,
    ) -> Result<Vec<Clause>, CompileError> {
        let length = self.automaton.length();
        Ok(match formula {
            Formula::Atom(atom) => self.atom(atom, step, sub, true)?,
            Formula::Not(inner) => self.negated(inner, step, sub)?,
            Formula::And(terms) => {
                let mut out = Vec::new();
                for t in terms {
                    out.extend(self.positive(t, step, sub)?);
                }
                out
            }
            Formula::Or(terms) => {
                let mut sets = Vec::with_capacity(terms.len());
                for t in terms {
                    sets.push(self.positive(t, step, sub)?);
                }
                disjoin_all(sets)
            }
            Formula::Implies(a, b) => {
                let na = self.negated(a, step, sub)?;
                let pb = self.positive(b, step, sub)?;
                disjoin(&na, &pb)
            }
            Formula::Iff(a, b) => self.equivalence(a, b, step, sub)?,
            Formula::Xor(a, b) => self.difference(a, b, step, sub)?,
            Formula::Exists(x, body) => self.exists(x, body, step, sub, false)?,
            Formula::Forall(x, body) => self.forall(x, body, step, sub, false)?,
            Formula::Next(inner) => {
                if step + 1 < length {
                    self.positive(inner, step + 1, sub)?
                } else {
                    falsity()
                }
            }
            Formula::Globally(inner) => {
                let mut out = Vec::new();
                for t in step..length {
                    out.extend(self.positive(inner, t, sub)?);
                }
                out
            }
            Formula::Finally(inner) => {
                let mut sets = Vec::new();
                for t in step..length {
                    sets.push(self.positive(inner, t, sub)?);
                }
                disjoin_all(sets)
            }
            Formula::Until(_, _) => {
                return Err(CompileError::UnsupportedOperator { operator: "until" })
            }
        })
    }

    fn negated(
        &mut self,
        formula: &Formula,
        step: usize,
        sub: &Substitution,
    ) -> Result<Vec<Clause>, CompileError> {
        let length = self.automaton.length();
        Ok(match formula {
            Formula::Atom(atom) => self.atom(atom, step, sub, false)?,
            Formula::Not(inner) => self.positive(inner, step, sub)?,
            Formula::And(terms) => {
                let mut sets = Vec::with_capacity(terms.len());
                for t in terms {
                    sets.push(self.negated(t, step, sub)?);
                }
                disjoin_all(sets)
            }
            Formula::Or(terms) => {
                let mut out = Vec::new();
                for t in terms {
                    out.extend(self.negated(t, step, sub)?);
                }
                out
            }
            Formula::Implies(a, b) => {
                let mut out = self.positive(a, step, sub)?;
                out.extend(self.negated(b, step, sub)?);
                out
            }
            Formula::Iff(a, b) => self.difference(a, b, step, sub)?,
            Formula::Xor(a, b) => self.equivalence(a, b, step, sub)?,
            Formula::Exists(x, body) => self.forall(x, body, step, sub, true)?,
            Formula::Forall(x, body) => self.exists(x, body, step, sub, true)?,
            Formula::Next(inner) => {
                if step + 1 < length {
                    self.negated(inner, step + 1, sub)?
                } else {
                    truth()
                }
            }
            Formula::Globally(inner) => {
                let mut sets = Vec::new();
                for t in step..length {
                    sets.push(self.negated(inner, t, sub)?);
                }
                disjoin_all(sets)
            }
            Formula::Finally(inner) => {
                let mut out = Vec::new();
                for t in step..length {
                    out.extend(self.negated(inner, t, sub)?);
                }
                out
            }
            Formula::Until(_, _) => {
                return Err(CompileError::UnsupportedOperator { operator: "until" })
            }
        })
    }

    /// `(!a | b) & (a | !b)`
    fn equivalence(
        &mut self,
        a: &Formula,
        b: &Formula,
        step: usize,
        sub: &Substitution,
    ) -> Result<Vec<Clause>, CompileError> {
        let (pa, na) = (self.positive(a, step, sub)?, self.negated(a, step, sub)?);
        let (pb, nb) = (self.positive(b, step, sub)?, self.negated(b, step, sub)?);
        let mut out = disjoin(&na, &pb);
        out.extend(disjoin(&pa, &nb));
        Ok(out)
    }

    /// `(a | b) & (!a | !b)`
    fn difference(
        &mut self,
        a: &Formula,
        b: &Formula,
        step: usize,
        sub: &Substitution,
    ) -> Result<Vec<Clause>, CompileError> {
        let (pa, na) = (self.positive(a, step, sub)?, self.negated(a, step, sub)?);
        let (pb, nb) = (self.positive(b, step, sub)?, self.negated(b, step, sub)?);
        let mut out = disjoin(&pa, &pb);
        out.extend(disjoin(&na, &nb));
        Ok(out)
    }

    fn body(
        &mut self,
        body: &Formula,
        step: usize,
        sub: &Substitution,
        negate: bool,
    ) -> Result<Vec<Clause>, CompileError> {
        if negate {
            self.negated(body, step, sub)
        } else {
            self.positive(body, step, sub)
        }
    }

    /// One fresh variable choosing exactly one state of the domain.
    fn exists(
        &mut self,
        name: &str,
        body: &Formula,
        step: usize,
        sub: &Substitution,
        negate_body: bool,
    ) -> Result<Vec<Clause>, CompileError> {
        let domain = self.automaton.states_up_to(step + 1);
        let var = self.arena.fresh_variable(name, domain.clone());
        let choices: Vec<Literal> = domain
            .iter()
            .map(|&s| self.arena.atoms.var_value(var, s))
            .collect();
        for (i, &a) in choices.iter().enumerate() {
            for &b in &choices[i + 1..] {
                self.side.extend(any_of([!a, !b]));
            }
        }
        self.side.extend(any_of(choices));
        self.body(body, step, &sub.extend(name, var), negate_body)
    }

    /// One pinned variable per domain state; the body must hold for each.
    fn forall(
        &mut self,
        name: &str,
        body: &Formula,
        step: usize,
        sub: &Substitution,
        negate_body: bool,
    ) -> Result<Vec<Clause>, CompileError> {
        let mut out = Vec::new();
        for state in self.automaton.states_up_to(step + 1) {
            let var = self.arena.fresh_variable(name, vec![state]);
            let pin = self.arena.atoms.var_value(var, state);
            self.side.extend(all_of([pin]));
            out.extend(self.body(body, step, &sub.extend(name, var), negate_body)?);
        }
        Ok(out)
    }

    fn expect_kind(&self, predicate: PredicateId, operation: bool) -> Result<(), CompileError> {
        let ok = self
            .taxonomy
            .get(predicate)
            .is_some_and(|p| p.is_operation() == operation);
        if ok {
            Ok(())
        } else {
            Err(CompileError::WrongPredicateKind {
                predicate,
                expected: if operation { "an operation" } else { "a type" },
            })
        }
    }

    fn atom(
        &mut self,
        atom: &FormulaAtom,
        step: usize,
        sub: &Substitution,
        positive: bool,
    ) -> Result<Vec<Clause>, CompileError> {
        let op_state = self.automaton.operation_state(step);
        let interned = match atom {
            FormulaAtom::True => return Ok(if positive { truth() } else { falsity() }),
            FormulaAtom::False => return Ok(if positive { falsity() } else { truth() }),
            FormulaAtom::Operation(p) => {
                self.expect_kind(*p, true)?;
                Atom::uses(op_state, *p)
            }
            FormulaAtom::HasType(x, p) => {
                self.expect_kind(*p, false)?;
                Atom::type_of(Entity::Variable(sub.resolve(x)?), *p)
            }
            FormulaAtom::Consumes(x) => Atom::consumes(op_state, sub.resolve(x)?),
            FormulaAtom::Produces(x) => Atom::produces(op_state, sub.resolve(x)?),
            FormulaAtom::Identical(x, y) => {
                let (vx, vy) = (sub.resolve(x)?, sub.resolve(y)?);
                if vx == vy {
                    return Ok(if positive { truth() } else { falsity() });
                }
                Atom::same_as(vx, vy)
            }
        };
        let id = self.arena.atoms.intern(interned);
        if !interned.is_ground() && self.defined.insert(id) {
            self.define(interned, id, step);
        }
        Ok(vec![Clause::unit(Literal::new(id, positive))])
    }

    fn domain(&self, entity: Option<Entity>) -> (VarId, Vec<StateId>) {
        match entity {
            Some(Entity::Variable(v)) => (v, self.arena.variable(v).domain.clone()),
            _ => (0, Vec::new()),
        }
    }

    /// Tie a variable atom to the ground atoms of every instantiation.
    fn define(&mut self, atom: Atom, id: AtomId, step: usize) {
        let this = Literal::positive(id);
        match atom.kind {
            AtomKind::TypeOf => {
                let (var, domain) = self.domain(Some(atom.subject));
                let Some(p) = atom.predicate else { return };
                for state in domain {
                    let val = self.arena.atoms.var_value(var, state);
                    let ground = self.arena.atoms.type_of(state, p);
                    self.side.extend(any_of([!val, !this, ground]));
                    self.side.extend(any_of([!val, this, !ground]));
                }
            }
            AtomKind::Consumes => {
                let (var, domain) = self.domain(atom.object);
                let inputs = self.automaton.input_block(step).states.clone();
                for state in domain {
                    let val = self.arena.atoms.var_value(var, state);
                    if self.automaton.state(state).block > step {
                        self.side.extend(any_of([!val, !this]));
                        continue;
                    }
                    let refs: Vec<Literal> = inputs
                        .iter()
                        .map(|&input| self.arena.atoms.refers_to(input, state))
                        .collect();
                    for &r in &refs {
                        self.side.extend(any_of([!val, !r, this]));
                    }
                    self.side
                        .extend(any_of([!val, !this].into_iter().chain(refs)));
                }
            }
            AtomKind::Produces => {
                let (var, domain) = self.domain(atom.object);
                for state in domain {
                    let val = self.arena.atoms.var_value(var, state);
                    let produced_here = self.automaton.state(state).block == step + 1;
                    self.side
                        .extend(any_of([!val, Literal::new(id, produced_here)]));
                }
            }
            AtomKind::SameAs => {
                let (x, xs) = self.domain(Some(atom.subject));
                let (y, ys) = self.domain(atom.object);
                for &sx in &xs {
                    for &sy in &ys {
                        let vx = self.arena.atoms.var_value(x, sx);
                        let vy = self.arena.atoms.var_value(y, sy);
                        self.side
                            .extend(any_of([!vx, !vy, Literal::new(id, sx == sy)]));
                    }
                }
            }
            AtomKind::Uses | AtomKind::RefersTo | AtomKind::VarValue => {}
        }
    }
}

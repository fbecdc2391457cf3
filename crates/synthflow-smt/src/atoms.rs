//! Interning of ground and variable-bearing propositions.

use std::collections::HashMap;
use std::fmt;

use synthflow_ir::automaton::StateId;
use synthflow_ir::taxonomy::PredicateId;

use crate::cnf::{AtomId, Literal};

/// Identifier of a quantifier-bound variable inside one [`crate::arena::EncodingArena`].
pub type VarId = usize;

/// What an atom talks about: an automaton state or a bound variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    State(StateId),
    Variable(VarId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::State(s) => write!(f, "s{s}"),
            Entity::Variable(v) => write!(f, "v{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomKind {
    /// Operation state realizes an operation predicate.
    Uses,
    /// Data state or variable carries a type predicate.
    TypeOf,
    /// Input state references an output state or the null state.
    RefersTo,
    /// Variable is instantiated to a state.
    VarValue,
    /// Operation state consumes the variable.
    Consumes,
    /// Operation state produces the variable.
    Produces,
    /// Two variables denote the same state.
    SameAs,
}

impl AtomKind {
    fn name(self) -> &'static str {
        match self {
            AtomKind::Uses => "uses",
            AtomKind::TypeOf => "type",
            AtomKind::RefersTo => "ref",
            AtomKind::VarValue => "val",
            AtomKind::Consumes => "consumes",
            AtomKind::Produces => "produces",
            AtomKind::SameAs => "same",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    pub kind: AtomKind,
    pub subject: Entity,
    pub predicate: Option<PredicateId>,
    pub object: Option<Entity>,
}

impl Atom {
    pub fn uses(operation_state: StateId, operation: PredicateId) -> Self {
        Self {
            kind: AtomKind::Uses,
            subject: Entity::State(operation_state),
            predicate: Some(operation),
            object: None,
        }
    }

    pub fn type_of(subject: Entity, data_type: PredicateId) -> Self {
        Self {
            kind: AtomKind::TypeOf,
            subject,
            predicate: Some(data_type),
            object: None,
        }
    }

    pub fn refers_to(input_state: StateId, target: StateId) -> Self {
        Self {
            kind: AtomKind::RefersTo,
            subject: Entity::State(input_state),
            predicate: None,
            object: Some(Entity::State(target)),
        }
    }

    pub fn var_value(var: VarId, state: StateId) -> Self {
        Self {
            kind: AtomKind::VarValue,
            subject: Entity::Variable(var),
            predicate: None,
            object: Some(Entity::State(state)),
        }
    }

    pub fn consumes(operation_state: StateId, var: VarId) -> Self {
        Self {
            kind: AtomKind::Consumes,
            subject: Entity::State(operation_state),
            predicate: None,
            object: Some(Entity::Variable(var)),
        }
    }

    pub fn produces(operation_state: StateId, var: VarId) -> Self {
        Self {
            kind: AtomKind::Produces,
            subject: Entity::State(operation_state),
            predicate: None,
            object: Some(Entity::Variable(var)),
        }
    }

    /// Identity of two variables; symmetric, so the pair is ordered.
    pub fn same_as(lhs: VarId, rhs: VarId) -> Self {
        let (a, b) = if lhs <= rhs { (lhs, rhs) } else { (rhs, lhs) };
        Self {
            kind: AtomKind::SameAs,
            subject: Entity::Variable(a),
            predicate: None,
            object: Some(Entity::Variable(b)),
        }
    }

    /// Whether the atom mentions any bound variable.
    pub fn is_ground(&self) -> bool {
        !matches!(self.subject, Entity::Variable(_))
            && !matches!(self.object, Some(Entity::Variable(_)))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.kind.name(), self.subject)?;
        if let Some(p) = self.predicate {
            write!(f, ", p{p}")?;
        }
        if let Some(o) = self.object {
            write!(f, ", {o}")?;
        }
        write!(f, ")")
    }
}

/// Bidirectional mapping between atoms and dense positive ids.
///
/// Ids start at 1 so that they double as DIMACS variables.
#[derive(Debug, Clone, Default)]
pub struct AtomTable {
    ids: HashMap<Atom, AtomId>,
    atoms: Vec<Atom>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing id of `atom`, or a freshly allocated one.
    pub fn intern(&mut self, atom: Atom) -> AtomId {
        if let Some(&id) = self.ids.get(&atom) {
            return id;
        }
        self.atoms.push(atom);
        let id = self.atoms.len() as AtomId;
        self.ids.insert(atom, id);
        id
    }

    pub fn lookup(&self, atom: &Atom) -> Option<AtomId> {
        self.ids.get(atom).copied()
    }

    pub fn resolve(&self, id: AtomId) -> Option<&Atom> {
        let index = (id as usize).checked_sub(1)?;
        self.atoms.get(index)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Interned atoms with their ids, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, a)| ((i + 1) as AtomId, a))
    }

    pub fn literal(&mut self, atom: Atom, positive: bool) -> Literal {
        Literal::new(self.intern(atom), positive)
    }

    pub fn uses(&mut self, operation_state: StateId, operation: PredicateId) -> Literal {
        self.literal(Atom::uses(operation_state, operation), true)
    }

    pub fn type_of(&mut self, state: StateId, data_type: PredicateId) -> Literal {
        self.literal(Atom::type_of(Entity::State(state), data_type), true)
    }

    pub fn refers_to(&mut self, input_state: StateId, target: StateId) -> Literal {
        self.literal(Atom::refers_to(input_state, target), true)
    }

    pub fn var_value(&mut self, var: VarId, state: StateId) -> Literal {
        self.literal(Atom::var_value(var, state), true)
    }
}

//! Clause-level target of the encoding.
//!
//! Formulas are kept as sets of clauses throughout: conjunction is set union
//! and disjunction is the pairwise cross product of two clause sets. The empty
//! clause set is `true`, a set holding the empty clause is `false`.

use std::collections::HashSet;
use std::fmt;
use std::ops::Not;

/// Positive identifier of an interned atom.
pub type AtomId = u32;

/// Signed reference to an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    pub fn new(atom: AtomId, positive: bool) -> Self {
        debug_assert!(atom > 0 && atom <= i32::MAX as u32);
        let var = atom as i32;
        Literal(if positive { var } else { -var })
    }

    pub fn positive(atom: AtomId) -> Self {
        Self::new(atom, true)
    }

    pub fn negative(atom: AtomId) -> Self {
        Self::new(atom, false)
    }

    /// Parse a non-zero DIMACS literal.
    pub fn from_dimacs(value: i32) -> Option<Self> {
        (value != 0 && value != i32::MIN).then_some(Literal(value))
    }

    pub fn atom(self) -> AtomId {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    /// Truth value of the literal given the value of its atom.
    pub fn holds(self, atom_value: bool) -> bool {
        atom_value == self.is_positive()
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal(-self.0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized disjunction: literals sorted by atom, no duplicates, never a
/// tautology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// Normalize `literals`; `None` when the disjunction is a tautology.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Option<Self> {
        let mut literals: Vec<Literal> = literals.into_iter().collect();
        literals.sort_by_key(|l| (l.atom(), l.is_positive()));
        literals.dedup();
        if literals.windows(2).any(|w| w[0].atom() == w[1].atom()) {
            return None;
        }
        Some(Self { literals })
    }

    /// The empty clause (`false`).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unit(literal: Literal) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Disjunction of two clauses; `None` when it is a tautology.
    pub fn or(&self, other: &Clause) -> Option<Clause> {
        Clause::new(self.literals.iter().chain(other.literals.iter()).copied())
    }

    pub fn is_satisfied_by(&self, value: impl Fn(AtomId) -> bool) -> bool {
        self.literals.iter().any(|l| l.holds(value(l.atom())))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, l) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{l}")?;
        }
        write!(f, ")")
    }
}

/// Clause set for the conjunction of the given literals.
pub fn all_of(literals: impl IntoIterator<Item = Literal>) -> Vec<Clause> {
    literals.into_iter().map(Clause::unit).collect()
}

/// Clause set for the disjunction of the given literals.
pub fn any_of(literals: impl IntoIterator<Item = Literal>) -> Vec<Clause> {
    Clause::new(literals).into_iter().collect()
}

/// Clause set for `lhs | rhs`.
pub fn disjoin(lhs: &[Clause], rhs: &[Clause]) -> Vec<Clause> {
    let mut out = Vec::with_capacity(lhs.len().saturating_mul(rhs.len()));
    let mut seen = HashSet::new();
    for a in lhs {
        for b in rhs {
            if let Some(c) = a.or(b) {
                if seen.insert(c.clone()) {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Clause set for the disjunction of every set in `sets`.
pub fn disjoin_all(sets: impl IntoIterator<Item = Vec<Clause>>) -> Vec<Clause> {
    sets.into_iter()
        .fold(vec![Clause::empty()], |acc, set| disjoin(&acc, &set))
}

/// Deduplicated clause list handed to a solver.
#[derive(Debug, Clone, Default)]
pub struct CnfFormula {
    clauses: Vec<Clause>,
    keys: HashSet<Clause>,
    max_atom: AtomId,
    candidates: usize,
    dedup_hits: usize,
}

impl CnfFormula {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause unless an equal one is already present.
    pub fn add_clause(&mut self, clause: Clause) -> bool {
        self.candidates = self.candidates.saturating_add(1);
        if self.keys.contains(&clause) {
            self.dedup_hits = self.dedup_hits.saturating_add(1);
            return false;
        }
        if let Some(max) = clause.literals().iter().map(|l| l.atom()).max() {
            self.max_atom = self.max_atom.max(max);
        }
        self.keys.insert(clause.clone());
        self.clauses.push(clause);
        true
    }

    pub fn extend(&mut self, clauses: impl IntoIterator<Item = Clause>) {
        for clause in clauses {
            self.add_clause(clause);
        }
    }

    /// Make atoms up to `count` part of the problem even if no clause
    /// mentions them.
    pub fn reserve_atoms(&mut self, count: AtomId) {
        self.max_atom = self.max_atom.max(count);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Highest atom id the formula ranges over.
    pub fn num_atoms(&self) -> AtomId {
        self.max_atom
    }

    pub fn clause_candidates(&self) -> usize {
        self.candidates
    }

    pub fn dedup_hits(&self) -> usize {
        self.dedup_hits
    }

    pub fn is_satisfied_by(&self, value: impl Fn(AtomId) -> bool) -> bool {
        self.clauses.iter().all(|c| c.is_satisfied_by(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i32) -> Literal {
        Literal::from_dimacs(v).unwrap()
    }

    #[test]
    fn literals_flip_sign() {
        let l = Literal::positive(4);
        assert_eq!((!l).to_dimacs(), -4);
        assert_eq!((!l).atom(), 4);
        assert!(!(!l).is_positive());
        assert!(Literal::from_dimacs(0).is_none());
    }

    #[test]
    fn clauses_normalize_and_drop_tautologies() {
        let c = Clause::new([lit(3), lit(-1), lit(3)]).unwrap();
        assert_eq!(c.literals(), &[lit(-1), lit(3)]);
        assert!(Clause::new([lit(2), lit(-2)]).is_none());
        assert_eq!(c.to_string(), "(-1 3)");
    }

    #[test]
    fn disjunction_with_true_and_false() {
        let a = any_of([lit(1)]);
        let truth: Vec<Clause> = Vec::new();
        let falsity = vec![Clause::empty()];
        assert!(disjoin(&a, &truth).is_empty());
        assert_eq!(disjoin(&a, &falsity), a);
        assert_eq!(disjoin_all(Vec::<Vec<Clause>>::new()), falsity);
    }

    #[test]
    fn cross_product_distributes() {
        // (1 & 2) | 3 == (1 | 3) & (2 | 3)
        let lhs = all_of([lit(1), lit(2)]);
        let rhs = any_of([lit(3)]);
        let out = disjoin(&lhs, &rhs);
        assert_eq!(
            out,
            vec![
                Clause::new([lit(1), lit(3)]).unwrap(),
                Clause::new([lit(2), lit(3)]).unwrap()
            ]
        );
    }

    #[test]
    fn formula_deduplicates_clauses() {
        let mut f = CnfFormula::new();
        assert!(f.add_clause(Clause::new([lit(1), lit(-5)]).unwrap()));
        assert!(!f.add_clause(Clause::new([lit(-5), lit(1)]).unwrap()));
        assert_eq!(f.len(), 1);
        assert_eq!(f.num_atoms(), 5);
        assert_eq!(f.dedup_hits(), 1);
        assert!(f.is_satisfied_by(|a| a == 1));
        assert!(!f.is_satisfied_by(|a| a == 5));
    }
}

//! Taxonomy closure, mutual exclusion and mandatory usage.

use synthflow_ir::automaton::StateId;
use synthflow_ir::taxonomy::{PredicateId, TaxonomyPredicate};

use super::Emitter;
use crate::cnf::Literal;

/// `P <-> OR(children)` for every non-concrete predicate in `preds`.
///
/// A non-concrete predicate without children never holds.
fn closure<'t>(
    e: &mut Emitter<'_>,
    state: StateId,
    preds: impl Iterator<Item = &'t TaxonomyPredicate>,
    literal: fn(&mut Emitter<'_>, StateId, PredicateId) -> Literal,
) {
    for pred in preds {
        if e.taxonomy.is_concrete(pred.id) {
            continue;
        }
        let parent = literal(e, state, pred.id);
        let children: Vec<Literal> = pred
            .children
            .iter()
            .map(|&c| literal(e, state, c))
            .collect();
        for &child in &children {
            e.implies(child, parent);
        }
        e.clause(std::iter::once(!parent).chain(children));
    }
}

fn uses_literal(e: &mut Emitter<'_>, state: StateId, pred: PredicateId) -> Literal {
    e.uses(state, pred)
}

fn type_literal(e: &mut Emitter<'_>, state: StateId, pred: PredicateId) -> Literal {
    e.type_of(state, pred)
}

/// Rules of the operation track.
pub(super) fn operation_rules(e: &mut Emitter<'_>, mandatory_usage: bool) {
    let taxonomy = e.taxonomy;
    let automaton = e.automaton;
    for &op_state in automaton.operation_states() {
        let preds = taxonomy.predicates().iter().filter(|p| p.is_operation());
        closure(e, op_state, preds, uses_literal);

        let concrete: Vec<Literal> = taxonomy
            .concrete_operations()
            .iter()
            .map(|&op| e.uses(op_state, op))
            .collect();
        e.at_most_one(&concrete);
        if mandatory_usage {
            e.clause(concrete);
        }
    }
}

/// Rules of the data track: every input and output state has exactly one
/// leaf type per dimension, and is empty in all dimensions or in none.
pub(super) fn type_rules(e: &mut Emitter<'_>) {
    let taxonomy = e.taxonomy;
    let automaton = e.automaton;
    for state in automaton.data_states().map(|s| s.id) {
        for dim in taxonomy.dimensions() {
            let preds = taxonomy
                .predicates()
                .iter()
                .filter(|p| p.dimension() == Some(dim.id));
            closure(e, state, preds, type_literal);

            let leaves: Vec<Literal> = dim
                .concrete
                .iter()
                .map(|&t| e.type_of(state, t))
                .collect();
            e.at_most_one(&leaves);
            e.clause(leaves);
        }

        let empties: Vec<Literal> = taxonomy
            .dimensions()
            .iter()
            .map(|d| e.type_of(state, d.empty))
            .collect();
        for pair in empties.windows(2) {
            e.implies(pair[0], pair[1]);
            e.implies(pair[1], pair[0]);
        }
    }
}

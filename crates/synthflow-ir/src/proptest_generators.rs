//! Proptest strategies for closed constraint formulas.

use proptest::prelude::*;

use crate::formula::{Formula, FormulaAtom};
use crate::taxonomy::PredicateId;

const VARIABLES: [&str; 2] = ["x", "y"];

fn arb_atom(operations: Vec<PredicateId>, types: Vec<PredicateId>) -> BoxedStrategy<Formula> {
    let var = prop::sample::select(VARIABLES.to_vec()).prop_map(str::to_string);
    prop_oneof![
        Just(Formula::truth()),
        Just(Formula::falsity()),
        prop::sample::select(operations).prop_map(Formula::operation),
        (var.clone(), prop::sample::select(types)).prop_map(|(x, t)| Formula::has_type(x, t)),
        var.clone().prop_map(Formula::consumes),
        var.clone().prop_map(Formula::produces),
        (var.clone(), var).prop_map(|(x, y)| Formula::identical(x, y)),
    ]
    .boxed()
}

/// Strategy for formulas over the given predicates, at most `depth` levels
/// deep, with every variable bound.
///
/// Free variables left by the recursive generator are closed by wrapping the
/// formula in existential quantifiers. `Until` is never generated.
pub fn arb_closed_formula(
    operations: Vec<PredicateId>,
    types: Vec<PredicateId>,
    depth: u32,
) -> impl Strategy<Value = Formula> {
    let var = prop::sample::select(VARIABLES.to_vec()).prop_map(str::to_string);
    arb_atom(operations, types)
        .prop_recursive(depth, 16, 2, move |inner| {
            prop_oneof![
                inner.clone().prop_map(Formula::not),
                prop::collection::vec(inner.clone(), 2..=2).prop_map(Formula::and),
                prop::collection::vec(inner.clone(), 2..=2).prop_map(Formula::or),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.implies(b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.iff(b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.xor(b)),
                (var.clone(), inner.clone()).prop_map(|(x, f)| Formula::exists(x, f)),
                (var.clone(), inner.clone()).prop_map(|(x, f)| Formula::forall(x, f)),
                inner.clone().prop_map(Formula::next),
                inner.clone().prop_map(Formula::globally),
                inner.prop_map(Formula::finally),
            ]
        })
        .prop_map(close_formula)
}

/// Bind every free variable existentially at the top level.
pub fn close_formula(formula: Formula) -> Formula {
    formula
        .free_variables()
        .into_iter()
        .rev()
        .fold(formula, |body, x| Formula::exists(x, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_formulas_are_closed(f in arb_closed_formula(vec![0, 1], vec![2, 3], 3)) {
            prop_assert!(f.free_variables().is_empty());
            prop_assert!(!matches!(f, Formula::Until(_, _)));
        }
    }

    #[test]
    fn closing_wraps_free_variables() {
        let f = close_formula(Formula::Atom(FormulaAtom::Identical("x".into(), "y".into())));
        assert!(matches!(f, Formula::Exists(ref x, _) if x == "x"));
        assert!(f.free_variables().is_empty());
    }
}

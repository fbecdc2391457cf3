//! Structural constraints of a workflow of fixed length.
//!
//! Everything here is independent of user constraints: taxonomy closure,
//! mutual exclusion of concrete predicates, mandatory usage, operation and
//! workflow I/O contracts, the memory referencing discipline and the usage
//! completeness policies.

mod contracts;
mod memory;
mod taxonomy_rules;
mod usage;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::taxonomy::{DataSpec, PredicateId, Taxonomy};
use thiserror::Error;
use tracing::{debug, warn};

use crate::arena::EncodingArena;
use crate::atoms::AtomTable;
use crate::cnf::{Clause, CnfFormula, Literal};

/// How much of some data must end up being referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePolicy {
    /// No requirement.
    None,
    /// At least one instance must be referenced.
    #[default]
    One,
    /// Every instance must be referenced.
    All,
}

/// Toggles of the structural encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingPolicy {
    /// Applies to the workflow inputs.
    pub use_workflow_input: UsagePolicy,
    /// Applies per step to the outputs of the operation.
    pub use_generated_data: UsagePolicy,
    /// Forbid one operation from taking the same instance in two slots.
    pub distinct_operation_inputs: bool,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            use_workflow_input: UsagePolicy::All,
            use_generated_data: UsagePolicy::One,
            distinct_operation_inputs: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EncodeError {
    #[error("workflow {role} {slot} references undeclared type predicate #{predicate}")]
    #[diagnostic(code(synthflow::encode::undeclared_workflow_type))]
    UndeclaredWorkflowType {
        role: &'static str,
        slot: usize,
        predicate: PredicateId,
    },
    #[error("operation '{operation}' {role} {slot} references unknown predicate #{predicate}")]
    #[diagnostic(code(synthflow::encode::unknown_signature_type))]
    UnknownSignatureType {
        operation: String,
        role: &'static str,
        slot: usize,
        predicate: PredicateId,
    },
    #[error("{context} constrains one dimension twice")]
    #[diagnostic(code(synthflow::encode::conflicting_dimension))]
    ConflictingDimension { context: String },
    #[error("{context} declares {declared} slots but the automaton only has {width}")]
    #[diagnostic(
        code(synthflow::encode::width),
        help("build the automaton with `Automaton::for_domain`")
    )]
    SlotWidth {
        context: String,
        declared: usize,
        width: usize,
    },
}

/// Structural clauses of one attempted length.
#[derive(Debug, Clone)]
pub struct WorkflowEncoding {
    pub formula: CnfFormula,
    /// Mandatory operation usage was skipped because no concrete operation
    /// exists.
    pub empty_library: bool,
}

/// Clause sink shared by the rule families.
pub(crate) struct Emitter<'a> {
    pub(crate) taxonomy: &'a Taxonomy,
    pub(crate) automaton: &'a Automaton,
    pub(crate) atoms: &'a mut AtomTable,
    pub(crate) formula: &'a mut CnfFormula,
}

impl Emitter<'_> {
    pub(crate) fn clause(&mut self, literals: impl IntoIterator<Item = Literal>) {
        if let Some(clause) = Clause::new(literals) {
            self.formula.add_clause(clause);
        }
    }

    /// `a -> b`
    pub(crate) fn implies(&mut self, a: Literal, b: Literal) {
        self.clause([!a, b]);
    }

    /// Pairwise at-most-one.
    pub(crate) fn at_most_one(&mut self, literals: &[Literal]) {
        for (i, &a) in literals.iter().enumerate() {
            for &b in &literals[i + 1..] {
                self.clause([!a, !b]);
            }
        }
    }

    pub(crate) fn type_of(&mut self, state: StateId, data_type: PredicateId) -> Literal {
        self.atoms.type_of(state, data_type)
    }

    pub(crate) fn refers_to(&mut self, input: StateId, target: StateId) -> Literal {
        self.atoms.refers_to(input, target)
    }

    pub(crate) fn uses(&mut self, operation_state: StateId, operation: PredicateId) -> Literal {
        self.atoms.uses(operation_state, operation)
    }
}

/// Generate the structural constraints of `domain` laid out on `automaton`.
///
/// New atoms are interned into `arena`, which must be fresh for this length.
pub fn encode_workflow(
    domain: &SynthesisDomain,
    automaton: &Automaton,
    arena: &mut EncodingArena,
    policy: &EncodingPolicy,
) -> Result<WorkflowEncoding, EncodeError> {
    let taxonomy = &domain.taxonomy;
    contracts::validate(domain, automaton)?;

    let empty_library = taxonomy.is_empty_library();
    if empty_library {
        warn!(
            length = automaton.length(),
            "operation library is empty; skipping mandatory operation usage"
        );
    }

    let mut formula = CnfFormula::new();
    let mut e = Emitter {
        taxonomy,
        automaton,
        atoms: &mut arena.atoms,
        formula: &mut formula,
    };

    taxonomy_rules::operation_rules(&mut e, !empty_library);
    taxonomy_rules::type_rules(&mut e);
    contracts::operation_contracts(&mut e);
    contracts::workflow_io(&mut e, &domain.workflow_inputs, &domain.workflow_outputs);
    memory::reference_legality(&mut e);
    memory::reference_agreement(&mut e);
    if policy.distinct_operation_inputs {
        memory::distinct_operation_inputs(&mut e);
    }
    usage::workflow_input_usage(&mut e, domain.workflow_inputs.len(), policy.use_workflow_input);
    usage::generated_data_usage(&mut e, policy.use_generated_data);

    formula.reserve_atoms(arena.atoms.len() as u32);
    debug!(
        length = automaton.length(),
        clauses = formula.len(),
        atoms = arena.atoms.len(),
        dedup_hits = formula.dedup_hits(),
        "encoded workflow structure"
    );
    Ok(WorkflowEncoding {
        formula,
        empty_library,
    })
}

/// Type requirement of `spec` in every dimension, `None` when unconstrained.
pub(crate) fn spec_by_dimension(taxonomy: &Taxonomy, spec: &DataSpec) -> Vec<Option<PredicateId>> {
    taxonomy
        .dimensions()
        .iter()
        .map(|d| spec.type_in(taxonomy, d.id))
        .collect()
}

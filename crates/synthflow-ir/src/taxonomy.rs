use indexmap::IndexMap;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Dense identifier of a predicate inside a [`Taxonomy`] arena.
pub type PredicateId = usize;
/// Dense identifier of a type dimension.
pub type DimensionId = usize;

/// Suffix appended to a dimension root label to name its empty type.
pub const EMPTY_TYPE_SUFFIX: &str = ":empty";

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TaxonomyError {
    #[error("taxonomy has no operation root")]
    #[diagnostic(
        code(synthflow::taxonomy::missing_root),
        help("call `operation_root` before adding operations")
    )]
    MissingOperationRoot,
    #[error("taxonomy declares no type dimension")]
    #[diagnostic(code(synthflow::taxonomy::missing_dimension))]
    MissingTypeDimension,
    #[error("duplicate predicate label '{0}'")]
    #[diagnostic(code(synthflow::taxonomy::duplicate))]
    DuplicateLabel(String),
    #[error("unknown predicate '{label}' referenced by {context}")]
    #[diagnostic(code(synthflow::taxonomy::unknown_predicate))]
    UnknownPredicate { label: String, context: String },
    #[error("predicate '{label}' is not {expected} ({context})")]
    #[diagnostic(code(synthflow::taxonomy::wrong_kind))]
    WrongKind {
        label: String,
        expected: &'static str,
        context: String,
    },
    #[error("{context} constrains dimension '{dimension}' twice ('{first}' and '{second}')")]
    #[diagnostic(code(synthflow::taxonomy::conflicting_dimension))]
    ConflictingDimension {
        context: String,
        dimension: String,
        first: String,
        second: String,
    },
    #[error("linking '{child}' under '{parent}' would create a cycle")]
    #[diagnostic(code(synthflow::taxonomy::cycle))]
    Cycle { child: String, parent: String },
}

/// Which tree a predicate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Operation,
    Type(DimensionId),
}

/// Type requirements for one data slot: at most one predicate per dimension.
///
/// Dimensions without an entry are unconstrained (any non-empty type).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSpec {
    pub types: Vec<PredicateId>,
}

impl DataSpec {
    pub fn new(types: Vec<PredicateId>) -> Self {
        Self { types }
    }

    /// The predicate this spec requires in dimension `dim`, if any.
    pub fn type_in(&self, taxonomy: &Taxonomy, dim: DimensionId) -> Option<PredicateId> {
        self.types
            .iter()
            .copied()
            .find(|&p| taxonomy.predicate(p).dimension() == Some(dim))
    }
}

/// Ordered input and output requirements of a concrete operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationSignature {
    pub inputs: Vec<DataSpec>,
    pub outputs: Vec<DataSpec>,
}

/// A node of the operation taxonomy or of one type dimension.
#[derive(Debug, Clone)]
pub struct TaxonomyPredicate {
    pub id: PredicateId,
    pub label: String,
    pub kind: PredicateKind,
    pub parents: Vec<PredicateId>,
    pub children: Vec<PredicateId>,
    /// True only for the distinguished empty type of a dimension.
    pub empty_type: bool,
    /// Present for annotated operations.
    pub signature: Option<OperationSignature>,
}

impl TaxonomyPredicate {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_operation(&self) -> bool {
        self.kind == PredicateKind::Operation
    }

    pub fn dimension(&self) -> Option<DimensionId> {
        match self.kind {
            PredicateKind::Type(d) => Some(d),
            PredicateKind::Operation => None,
        }
    }
}

/// One independent type tree.
#[derive(Debug, Clone)]
pub struct Dimension {
    pub id: DimensionId,
    pub root: PredicateId,
    pub empty: PredicateId,
    /// Leaf types of this dimension, the empty type included.
    pub concrete: Vec<PredicateId>,
}

/// Read-only arena of operation and type predicates.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    predicates: Vec<TaxonomyPredicate>,
    labels: IndexMap<String, PredicateId>,
    operation_root: PredicateId,
    dimensions: Vec<Dimension>,
    concrete_operations: Vec<PredicateId>,
}

impl Taxonomy {
    pub fn predicate(&self, id: PredicateId) -> &TaxonomyPredicate {
        &self.predicates[id]
    }

    pub fn get(&self, id: PredicateId) -> Option<&TaxonomyPredicate> {
        self.predicates.get(id)
    }

    pub fn predicates(&self) -> &[TaxonomyPredicate] {
        &self.predicates
    }

    pub fn lookup(&self, label: &str) -> Option<PredicateId> {
        self.labels.get(label).copied()
    }

    pub fn label(&self, id: PredicateId) -> &str {
        &self.predicates[id].label
    }

    pub fn operation_root(&self) -> PredicateId {
        self.operation_root
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, id: DimensionId) -> &Dimension {
        &self.dimensions[id]
    }

    /// Leaf types of dimension `dim`, its empty type included.
    pub fn concrete_types(&self, dim: DimensionId) -> &[PredicateId] {
        &self.dimensions[dim].concrete
    }

    /// Annotated leaf operations, in declaration order.
    pub fn concrete_operations(&self) -> &[PredicateId] {
        &self.concrete_operations
    }

    pub fn is_empty_library(&self) -> bool {
        self.concrete_operations.is_empty()
    }

    /// Concrete operations are annotated leaves; concrete types are leaves.
    pub fn is_concrete(&self, id: PredicateId) -> bool {
        let pred = &self.predicates[id];
        match pred.kind {
            PredicateKind::Operation => pred.is_leaf() && pred.signature.is_some(),
            PredicateKind::Type(_) => pred.is_leaf(),
        }
    }

    /// Whether `id` equals `ancestor` or lies below it.
    pub fn subsumes(&self, ancestor: PredicateId, id: PredicateId) -> bool {
        is_ancestor(&self.predicates, ancestor, id)
    }

    /// Largest declared operation input and output arity.
    pub fn max_arity(&self) -> (usize, usize) {
        self.concrete_operations
            .iter()
            .filter_map(|&op| self.predicates[op].signature.as_ref())
            .fold((0, 0), |(i, o), sig| {
                (i.max(sig.inputs.len()), o.max(sig.outputs.len()))
            })
    }

    /// Resolve a list of type labels into a [`DataSpec`].
    pub fn resolve_data_spec(&self, labels: &[&str]) -> Result<DataSpec, TaxonomyError> {
        let owned: Vec<String> = labels.iter().map(|s| (*s).to_string()).collect();
        resolve_spec(
            &self.predicates,
            &self.labels,
            &self.dimensions,
            &owned,
            "data specification",
        )
    }

    /// Resolve a label that must name an operation predicate.
    pub fn resolve_operation(&self, label: &str) -> Result<PredicateId, TaxonomyError> {
        let id = self.lookup(label).ok_or_else(|| TaxonomyError::UnknownPredicate {
            label: label.to_string(),
            context: "constraint".into(),
        })?;
        if !self.predicates[id].is_operation() {
            return Err(TaxonomyError::WrongKind {
                label: label.to_string(),
                expected: "an operation",
                context: "constraint".into(),
            });
        }
        Ok(id)
    }

    /// Resolve a label that must name a type predicate.
    pub fn resolve_type(&self, label: &str) -> Result<PredicateId, TaxonomyError> {
        let id = self.lookup(label).ok_or_else(|| TaxonomyError::UnknownPredicate {
            label: label.to_string(),
            context: "constraint".into(),
        })?;
        if self.predicates[id].is_operation() {
            return Err(TaxonomyError::WrongKind {
                label: label.to_string(),
                expected: "a type",
                context: "constraint".into(),
            });
        }
        Ok(id)
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "taxonomy: {} predicates, {} operations, {} dimensions",
            self.predicates.len(),
            self.concrete_operations.len(),
            self.dimensions.len()
        )
    }
}

fn is_ancestor(predicates: &[TaxonomyPredicate], ancestor: PredicateId, id: PredicateId) -> bool {
    let mut stack = vec![id];
    let mut seen = vec![false; predicates.len()];
    while let Some(current) = stack.pop() {
        if current == ancestor {
            return true;
        }
        if std::mem::replace(&mut seen[current], true) {
            continue;
        }
        stack.extend(predicates[current].parents.iter().copied());
    }
    false
}

fn resolve_spec(
    predicates: &[TaxonomyPredicate],
    labels: &IndexMap<String, PredicateId>,
    dimensions: &[Dimension],
    spec: &[String],
    context: &str,
) -> Result<DataSpec, TaxonomyError> {
    let mut types: Vec<PredicateId> = Vec::with_capacity(spec.len());
    for label in spec {
        let id = *labels
            .get(label)
            .ok_or_else(|| TaxonomyError::UnknownPredicate {
                label: label.clone(),
                context: context.to_string(),
            })?;
        let Some(dim) = predicates[id].dimension() else {
            return Err(TaxonomyError::WrongKind {
                label: label.clone(),
                expected: "a type",
                context: context.to_string(),
            });
        };
        if let Some(&prev) = types
            .iter()
            .find(|&&p| predicates[p].dimension() == Some(dim))
        {
            return Err(TaxonomyError::ConflictingDimension {
                context: context.to_string(),
                dimension: predicates[dimensions[dim].root].label.clone(),
                first: predicates[prev].label.clone(),
                second: label.clone(),
            });
        }
        types.push(id);
    }
    Ok(DataSpec { types })
}

type PendingSignature = (PredicateId, Vec<Vec<String>>, Vec<Vec<String>>);

/// Incremental construction of a [`Taxonomy`].
///
/// Parents must be declared before their children; operation signatures are
/// resolved in [`TaxonomyBuilder::build`], so types may be declared after the
/// operations that use them.
#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    predicates: Vec<TaxonomyPredicate>,
    labels: IndexMap<String, PredicateId>,
    operation_root: Option<PredicateId>,
    dimensions: Vec<Dimension>,
    pending: Vec<PendingSignature>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        label: &str,
        kind: PredicateKind,
        parent: Option<PredicateId>,
    ) -> Result<PredicateId, TaxonomyError> {
        if self.labels.contains_key(label) {
            return Err(TaxonomyError::DuplicateLabel(label.to_string()));
        }
        let id = self.predicates.len();
        self.predicates.push(TaxonomyPredicate {
            id,
            label: label.to_string(),
            kind,
            parents: parent.into_iter().collect(),
            children: Vec::new(),
            empty_type: false,
            signature: None,
        });
        if let Some(parent) = parent {
            self.predicates[parent].children.push(id);
        }
        self.labels.insert(label.to_string(), id);
        Ok(id)
    }

    fn parent_of_kind(
        &self,
        parent: &str,
        child: &str,
        want: Option<PredicateKind>,
    ) -> Result<PredicateId, TaxonomyError> {
        let id = *self
            .labels
            .get(parent)
            .ok_or_else(|| TaxonomyError::UnknownPredicate {
                label: parent.to_string(),
                context: format!("parent link of '{child}'"),
            })?;
        let kind = self.predicates[id].kind;
        let ok = match want {
            Some(want) => kind == want,
            None => matches!(kind, PredicateKind::Type(_)),
        };
        if !ok {
            return Err(TaxonomyError::WrongKind {
                label: parent.to_string(),
                expected: if want == Some(PredicateKind::Operation) {
                    "an operation class"
                } else {
                    "a type"
                },
                context: format!("parent link of '{child}'"),
            });
        }
        Ok(id)
    }

    /// Declare the root of the operation taxonomy.
    pub fn operation_root(&mut self, label: &str) -> Result<PredicateId, TaxonomyError> {
        let id = self.push(label, PredicateKind::Operation, None)?;
        self.operation_root = Some(id);
        Ok(id)
    }

    /// Declare an abstract operation class below `parent`.
    pub fn add_operation_class(
        &mut self,
        label: &str,
        parent: &str,
    ) -> Result<PredicateId, TaxonomyError> {
        let parent = self.parent_of_kind(parent, label, Some(PredicateKind::Operation))?;
        self.push(label, PredicateKind::Operation, Some(parent))
    }

    /// Declare an annotated operation. Each input/output slot is a list of
    /// type labels, at most one per dimension.
    pub fn add_operation(
        &mut self,
        label: &str,
        parent: &str,
        inputs: &[&[&str]],
        outputs: &[&[&str]],
    ) -> Result<PredicateId, TaxonomyError> {
        let id = self.add_operation_class(label, parent)?;
        let own = |slots: &[&[&str]]| -> Vec<Vec<String>> {
            slots
                .iter()
                .map(|slot| slot.iter().map(|s| (*s).to_string()).collect())
                .collect()
        };
        self.pending.push((id, own(inputs), own(outputs)));
        Ok(id)
    }

    /// Declare a new type dimension together with its empty type.
    pub fn add_dimension(&mut self, root_label: &str) -> Result<DimensionId, TaxonomyError> {
        let dim = self.dimensions.len();
        let root = self.push(root_label, PredicateKind::Type(dim), None)?;
        let empty_label = format!("{root_label}{EMPTY_TYPE_SUFFIX}");
        let empty = self.push(&empty_label, PredicateKind::Type(dim), Some(root))?;
        self.predicates[empty].empty_type = true;
        self.dimensions.push(Dimension {
            id: dim,
            root,
            empty,
            concrete: Vec::new(),
        });
        Ok(dim)
    }

    /// Declare a type below `parent`, inheriting its dimension.
    pub fn add_type(&mut self, label: &str, parent: &str) -> Result<PredicateId, TaxonomyError> {
        let parent_id = self.parent_of_kind(parent, label, None)?;
        if self.predicates[parent_id].empty_type {
            return Err(TaxonomyError::WrongKind {
                label: parent.to_string(),
                expected: "a non-empty type",
                context: format!("parent link of '{label}'"),
            });
        }
        let kind = self.predicates[parent_id].kind;
        self.push(label, kind, Some(parent_id))
    }

    /// Add an extra parent link, turning the tree into a DAG.
    pub fn add_parent(&mut self, child: &str, parent: &str) -> Result<(), TaxonomyError> {
        let child_id = *self
            .labels
            .get(child)
            .ok_or_else(|| TaxonomyError::UnknownPredicate {
                label: child.to_string(),
                context: "extra parent link".into(),
            })?;
        let kind = self.predicates[child_id].kind;
        let parent_id = match kind {
            PredicateKind::Operation => {
                self.parent_of_kind(parent, child, Some(PredicateKind::Operation))?
            }
            PredicateKind::Type(_) => self.parent_of_kind(parent, child, Some(kind))?,
        };
        // the empty type stays a leaf directly below its dimension root
        if self.predicates[parent_id].empty_type {
            return Err(TaxonomyError::WrongKind {
                label: parent.to_string(),
                expected: "a non-empty type",
                context: format!("parent link of '{child}'"),
            });
        }
        if self.predicates[child_id].empty_type {
            return Err(TaxonomyError::WrongKind {
                label: child.to_string(),
                expected: "a non-empty type",
                context: format!("extra parent link to '{parent}'"),
            });
        }
        if is_ancestor(&self.predicates, child_id, parent_id) {
            return Err(TaxonomyError::Cycle {
                child: child.to_string(),
                parent: parent.to_string(),
            });
        }
        if !self.predicates[child_id].parents.contains(&parent_id) {
            self.predicates[child_id].parents.push(parent_id);
            self.predicates[parent_id].children.push(child_id);
        }
        Ok(())
    }

    pub fn build(mut self) -> Result<Taxonomy, TaxonomyError> {
        let operation_root = self
            .operation_root
            .ok_or(TaxonomyError::MissingOperationRoot)?;
        if self.dimensions.is_empty() {
            return Err(TaxonomyError::MissingTypeDimension);
        }

        for (op, inputs, outputs) in std::mem::take(&mut self.pending) {
            let name = self.predicates[op].label.clone();
            let mut signature = OperationSignature::default();
            for (slot, spec) in inputs.iter().enumerate() {
                signature.inputs.push(resolve_spec(
                    &self.predicates,
                    &self.labels,
                    &self.dimensions,
                    spec,
                    &format!("input {slot} of operation '{name}'"),
                )?);
            }
            for (slot, spec) in outputs.iter().enumerate() {
                signature.outputs.push(resolve_spec(
                    &self.predicates,
                    &self.labels,
                    &self.dimensions,
                    spec,
                    &format!("output {slot} of operation '{name}'"),
                )?);
            }
            self.predicates[op].signature = Some(signature);
        }

        for dim in &mut self.dimensions {
            dim.concrete = self
                .predicates
                .iter()
                .filter(|p| p.kind == PredicateKind::Type(dim.id) && p.is_leaf())
                .map(|p| p.id)
                .collect();
        }
        let concrete_operations = self
            .predicates
            .iter()
            .filter(|p| p.is_operation() && p.is_leaf() && p.signature.is_some())
            .map(|p| p.id)
            .collect();

        Ok(Taxonomy {
            predicates: self.predicates,
            labels: self.labels,
            operation_root,
            dimensions: self.dimensions,
            concrete_operations,
        })
    }
}

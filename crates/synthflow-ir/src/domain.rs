use crate::formula::Formula;
use crate::taxonomy::{DataSpec, Taxonomy, TaxonomyError};
use crate::templates::ConstraintTemplate;

/// Everything a synthesis run reads: taxonomy, workflow I/O and constraints.
#[derive(Debug, Clone)]
pub struct SynthesisDomain {
    pub taxonomy: Taxonomy,
    /// Data available before the first operation.
    pub workflow_inputs: Vec<DataSpec>,
    /// Data the finished workflow must deliver.
    pub workflow_outputs: Vec<DataSpec>,
    /// Constraints evaluated at the first step.
    pub constraints: Vec<Formula>,
}

impl SynthesisDomain {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy,
            workflow_inputs: Vec::new(),
            workflow_outputs: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: &[&[&str]]) -> Result<Self, TaxonomyError> {
        for spec in inputs {
            let spec = self.taxonomy.resolve_data_spec(spec)?;
            self.workflow_inputs.push(spec);
        }
        Ok(self)
    }

    pub fn with_outputs(mut self, outputs: &[&[&str]]) -> Result<Self, TaxonomyError> {
        for spec in outputs {
            let spec = self.taxonomy.resolve_data_spec(spec)?;
            self.workflow_outputs.push(spec);
        }
        Ok(self)
    }

    pub fn with_constraint(mut self, formula: Formula) -> Self {
        self.constraints.push(formula);
        self
    }

    pub fn with_template(mut self, template: &ConstraintTemplate) -> Result<Self, TaxonomyError> {
        let formula = template.to_formula(&self.taxonomy)?;
        self.constraints.push(formula);
        Ok(self)
    }
}

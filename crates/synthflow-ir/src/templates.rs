use serde::{Deserialize, Serialize};

use crate::formula::Formula;
use crate::taxonomy::{Taxonomy, TaxonomyError};

/// Frequently used constraint shapes, parameterized by taxonomy labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum ConstraintTemplate {
    /// The operation (or a member of the class) is used somewhere.
    UseOperation { operation: String },
    NeverUseOperation { operation: String },
    FirstOperation { operation: String },
    LastOperation { operation: String },
    /// Every use of `first` is eventually followed by a use of `then`.
    FollowedBy { first: String, then: String },
    /// No use of `first` is ever followed by a use of `then`.
    NotFollowedBy { first: String, then: String },
    /// The operation is used at most once.
    NotRepeated { operation: String },
    /// Some operation consumes data of the type.
    UseType { data_type: String },
    NeverUseType { data_type: String },
    /// Some operation produces data of the type.
    GenerateType { data_type: String },
    NeverGenerateType { data_type: String },
    /// Some output of `producer` is consumed by a later `consumer`.
    ConnectedOperations { producer: String, consumer: String },
}

impl ConstraintTemplate {
    /// Lower the template to a formula evaluated at the first step.
    pub fn to_formula(&self, taxonomy: &Taxonomy) -> Result<Formula, TaxonomyError> {
        let op = |label: &str| taxonomy.resolve_operation(label).map(Formula::operation);
        let ty = |label: &str| taxonomy.resolve_type(label);

        let formula = match self {
            ConstraintTemplate::UseOperation { operation } => op(operation)?.finally(),
            ConstraintTemplate::NeverUseOperation { operation } => {
                op(operation)?.not().globally()
            }
            ConstraintTemplate::FirstOperation { operation } => op(operation)?,
            ConstraintTemplate::LastOperation { operation } => {
                Formula::or(vec![Formula::truth().next(), op(operation)?]).globally()
            }
            ConstraintTemplate::FollowedBy { first, then } => op(first)?
                .implies(op(then)?.finally().next())
                .globally(),
            ConstraintTemplate::NotFollowedBy { first, then } => op(first)?
                .implies(op(then)?.finally().next().not())
                .globally(),
            ConstraintTemplate::NotRepeated { operation } => {
                let p = op(operation)?;
                p.clone().implies(p.not().globally().next()).globally()
            }
            ConstraintTemplate::UseType { data_type } => Formula::exists(
                "x",
                Formula::and(vec![Formula::consumes("x"), Formula::has_type("x", ty(data_type)?)]),
            )
            .finally(),
            ConstraintTemplate::NeverUseType { data_type } => Formula::forall(
                "x",
                Formula::consumes("x").implies(Formula::has_type("x", ty(data_type)?).not()),
            )
            .globally(),
            ConstraintTemplate::GenerateType { data_type } => Formula::exists(
                "x",
                Formula::and(vec![Formula::produces("x"), Formula::has_type("x", ty(data_type)?)]),
            )
            .finally(),
            ConstraintTemplate::NeverGenerateType { data_type } => Formula::exists(
                "x",
                Formula::and(vec![Formula::produces("x"), Formula::has_type("x", ty(data_type)?)]),
            )
            .not()
            .globally(),
            ConstraintTemplate::ConnectedOperations { producer, consumer } => Formula::and(vec![
                op(producer)?,
                Formula::exists(
                    "x",
                    Formula::and(vec![
                        Formula::produces("x"),
                        Formula::and(vec![op(consumer)?, Formula::consumes("x")])
                            .finally()
                            .next(),
                    ]),
                ),
            ])
            .finally(),
        };
        Ok(formula)
    }
}

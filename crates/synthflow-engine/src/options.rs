use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use synthflow_smt::encoder::{EncodingPolicy, UsagePolicy};
use thiserror::Error;

use crate::solution::BlockingPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum OptionsError {
    #[error("minimum workflow length must be at least 1")]
    #[diagnostic(code(synthflow::options::zero_length))]
    ZeroLength,
    #[error("length range {min}..={max} is empty")]
    #[diagnostic(code(synthflow::options::length_range))]
    InvalidLengthRange { min: usize, max: usize },
    #[error("at least one solution must be requested")]
    #[diagnostic(code(synthflow::options::solution_count))]
    ZeroSolutionCount,
}

/// Run configuration of one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    pub min_length: usize,
    pub max_length: usize,
    /// Solutions to collect over all lengths.
    pub solution_count: usize,
    /// Overall budget in seconds; 0 disables the deadline.
    pub timeout_secs: u64,
    pub use_workflow_input: UsagePolicy,
    pub use_all_generated_data: UsagePolicy,
    /// Allow two solutions with the same operation sequence that differ in
    /// their data wiring.
    pub operation_sequence_repeat: bool,
    pub distinct_operation_inputs: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 10,
            solution_count: 10,
            timeout_secs: 300,
            use_workflow_input: UsagePolicy::All,
            use_all_generated_data: UsagePolicy::One,
            operation_sequence_repeat: true,
            distinct_operation_inputs: false,
        }
    }
}

impl SynthesisOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.min_length == 0 {
            return Err(OptionsError::ZeroLength);
        }
        if self.min_length > self.max_length {
            return Err(OptionsError::InvalidLengthRange {
                min: self.min_length,
                max: self.max_length,
            });
        }
        if self.solution_count == 0 {
            return Err(OptionsError::ZeroSolutionCount);
        }
        Ok(())
    }

    pub fn encoding_policy(&self) -> EncodingPolicy {
        EncodingPolicy {
            use_workflow_input: self.use_workflow_input,
            use_generated_data: self.use_all_generated_data,
            distinct_operation_inputs: self.distinct_operation_inputs,
        }
    }

    pub fn blocking_policy(&self) -> BlockingPolicy {
        if self.operation_sequence_repeat {
            BlockingPolicy::Exact
        } else {
            BlockingPolicy::OperationSequence
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = SynthesisOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.encoding_policy(), EncodingPolicy::default());
        assert_eq!(options.blocking_policy(), BlockingPolicy::Exact);
    }

    #[test]
    fn invalid_ranges_and_counts_are_rejected() {
        let opts = |min, max, count| SynthesisOptions {
            min_length: min,
            max_length: max,
            solution_count: count,
            ..SynthesisOptions::default()
        };
        assert_eq!(opts(0, 3, 1).validate(), Err(OptionsError::ZeroLength));
        assert_eq!(
            opts(4, 3, 1).validate(),
            Err(OptionsError::InvalidLengthRange { min: 4, max: 3 })
        );
        assert_eq!(opts(1, 3, 0).validate(), Err(OptionsError::ZeroSolutionCount));
        assert!(opts(3, 3, 1).validate().is_ok());
    }

    #[test]
    fn unique_operation_sequences_block_coarsely() {
        let options = SynthesisOptions {
            operation_sequence_repeat: false,
            ..SynthesisOptions::default()
        };
        assert_eq!(options.blocking_policy(), BlockingPolicy::OperationSequence);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{"max_length": 4, "use_all_generated_data": "all"}"#;
        let options: SynthesisOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.max_length, 4);
        assert_eq!(options.use_all_generated_data, UsagePolicy::All);
        assert_eq!(options.min_length, 1);
        assert_eq!(options.timeout_secs, 300);

        let back: SynthesisOptions =
            serde_json::from_str(&serde_json::to_string(&options).unwrap()).unwrap();
        assert_eq!(back, options);
    }
}

#![doc = include_str!("../README.md")]

//! Workflow synthesis driver.
//!
//! Tries every workflow length of the configured range in order. Each
//! length gets a fresh automaton and encoding arena; satisfying models are
//! decoded into [`solution::Solution`]s and blocked until the length is
//! exhausted or the run stops.

pub mod options;
pub mod result;
pub mod solution;
pub mod synthesis;
mod timeout;

pub use options::SynthesisOptions;
pub use result::{SynthesisError, SynthesisReport, Termination};
pub use synthesis::{synthesize, synthesize_with_cancel};

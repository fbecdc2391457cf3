#![doc = include_str!("../README.md")]

//! Synthflow domain model.
//!
//! This crate defines the operation and type taxonomy, the bounded two-track
//! automaton a workflow of fixed length is laid out on, the temporal /
//! first-order constraint language, and the constraint templates lowered
//! into it.

pub mod automaton;
pub mod domain;
pub mod formula;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod taxonomy;
pub mod templates;

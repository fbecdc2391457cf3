#![doc = include_str!("../README.md")]

//! Boolean encoding and solver integration for bounded workflow synthesis.
//!
//! The structural encoder and the formula compiler both emit clauses over
//! atoms interned in a per-length [`arena::EncodingArena`]; the resulting
//! [`cnf::CnfFormula`] is handed to any [`solver::SatSolver`] backend.

pub mod arena;
pub mod atoms;
pub mod backends;
pub mod cnf;
pub mod compiler;
pub mod encoder;
pub mod solver;

//! Core types for the tabula instruction interpreter.
//!
//! An instruction starts life as an [`InstructionRow`](instruction::InstructionRow)
//! (eight opaque string fields) and becomes an
//! [`InstructionRecord`](instruction::InstructionRecord) that accumulates
//! comments, errors and an outcome while it runs.

pub mod counters;
pub mod enums;
pub mod instruction;
pub mod params;
pub mod policy;
pub mod rows;
pub mod validation;
pub mod verifier;

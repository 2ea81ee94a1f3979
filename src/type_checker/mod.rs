//! Semantic analysis module.
//!
//! This module checks a parsed program and turns it into a typed program.
//! It:
//!
//! - Resolves identifiers through a stack of lexical scopes
//! - Verifies that each identifier is used as what it was declared as
//! - Applies the implicit conversion rules between primitive types
//! - Checks call arity and argument types against function signatures
//! - Validates `input`, `output`, `return` and shift arguments
//! - Tracks string capacities and storage sizes
//!
//! Analysis stops at the first error, which carries the exit code the
//! driver reports.

pub mod coercion;
pub mod scope;
pub mod type_checker;
pub mod typed_ast;

#[cfg(test)]
mod tests;

//! Code generation module for the compiler.
//!
//! This module lowers a typed program to ILOC, the textual three-address
//! code of a simple register machine. It handles:
//!
//! - The program preamble and the activation-record layout
//! - Function bodies, calls and returns
//! - Control flow with labels and conditional branches
//! - Constant folding of expressions whose operands are known
//! - Placement of locals in frames and of globals in the static segment

pub mod compiler;
pub mod expr;
pub mod iloc;
pub mod stmt;

#[cfg(test)]
mod tests;

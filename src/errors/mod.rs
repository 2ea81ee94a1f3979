//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced by every phase:
//!
//! - Syntax errors from the lexer and parser (exit code 1)
//! - Semantic errors from the analyzer, one variant per numbered code
//! - Rendering with the offending source line and a caret underline

pub mod errors;

#![allow(clippy::module_inception)]

use std::{rc::Rc, time::Instant};

use tracing::debug;

use crate::{
    ast::graph::ast_graph,
    compiler::compiler::compile,
    config::{CompilerConfig, EmitTarget},
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A byte offset into a named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Builds a span covering everything from the start of `from` to the end of `to`.
    pub fn between(from: &Span, to: &Span) -> Span {
        Span {
            start: from.start.clone(),
            end: to.end.clone(),
        }
    }

    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }
}

/// Finds the 1-based line and column of a byte offset.
///
/// Columns count characters, not bytes. Offsets past the end of the source
/// are clamped to the last position.
pub fn line_and_column(source: &str, offset: u32) -> (usize, usize) {
    let offset = clamp_to_boundary(source, offset as usize);
    let before = &source[..offset];

    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|index| index + 1).unwrap_or(0);
    let column = source[line_start..offset].chars().count() + 1;

    (line, column)
}

/// Reproduces the source line holding `span` and underlines the span with carets.
///
/// ```text
/// int a a;
///       ^
/// ```
pub fn highlight(source: &str, span: &Span) -> String {
    let start = clamp_to_boundary(source, span.start.0 as usize);
    let line_start = source[..start].rfind('\n').map(|index| index + 1).unwrap_or(0);
    let line_end = source[start..]
        .find('\n')
        .map(|index| start + index)
        .unwrap_or(source.len());

    let end = clamp_to_boundary(source, (span.end.0 as usize).clamp(start, line_end));
    let line_text = source[line_start..line_end].trim_end_matches('\r');

    let padding = source[line_start..start].chars().count();
    let width = source[start..end].chars().count().max(1);

    format!("{}\n{}{}", line_text, " ".repeat(padding), "^".repeat(width))
}

fn clamp_to_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Runs the whole pipeline over `source` and returns the artifact selected
/// by `config.emit`.
///
/// # Arguments
///
/// * `source` - The program text
/// * `file` - The name used for positions (a path or `stdin`)
/// * `config` - Output selection and layout options
///
/// # Returns
///
/// The rendered graph, an empty string for check-only runs, or the ILOC listing.
pub fn compile_source(source: &str, file: &str, config: &CompilerConfig) -> Result<String, Error> {
    let start = Instant::now();

    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    debug!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");

    let parse_start = Instant::now();
    let (_, program) = parse(tokens, Rc::new(file.to_string()));
    let program = program?;
    debug!(items = program.items.len(), elapsed = ?parse_start.elapsed(), "parsed");

    if config.emit == EmitTarget::Ast {
        return Ok(ast_graph(&program, &config.graph).to_string());
    }

    let check_start = Instant::now();
    let typed_program = type_check(&program)?;
    debug!(elapsed = ?check_start.elapsed(), "type checked");

    if config.emit == EmitTarget::Check {
        return Ok(String::new());
    }

    let compile_start = Instant::now();
    let iloc = compile(&typed_program, &config.codegen)?;
    debug!(
        instructions = iloc.len(),
        elapsed = ?compile_start.elapsed(),
        "generated code"
    );

    Ok(iloc.to_string())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{highlight, line_and_column, Position, Span};

    fn span(start: u32, end: u32) -> Span {
        let file = Rc::new(String::from("test.lang"));
        Span {
            start: Position(start, Rc::clone(&file)),
            end: Position(end, file),
        }
    }

    #[test]
    fn test_line_and_column() {
        let source = "int main() {\n  int a a;\n}\n";
        assert_eq!(line_and_column(source, 0), (1, 1));
        assert_eq!(line_and_column(source, 4), (1, 5));
        assert_eq!(line_and_column(source, 21), (2, 9));
        assert_eq!(line_and_column(source, 24), (3, 1));
    }

    #[test]
    fn test_line_and_column_past_end() {
        assert_eq!(line_and_column("ab", 99), (1, 3));
    }

    #[test]
    fn test_highlight_single_character() {
        let source = "int main() {\n  int a a;\n}\n";
        assert_eq!(highlight(source, &span(21, 22)), "  int a a;\n        ^");
    }

    #[test]
    fn test_highlight_multi_character_span() {
        let source = "string aaa[1];\nint main() {}";
        assert_eq!(highlight(source, &span(0, 13)), "string aaa[1];\n^^^^^^^^^^^^^");
    }

    #[test]
    fn test_highlight_clips_to_line() {
        let source = "a = 1 +\n 2;";
        assert_eq!(highlight(source, &span(4, 10)), "a = 1 +\n    ^^^");
    }
}

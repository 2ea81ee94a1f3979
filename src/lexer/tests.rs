//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric, char and string literals
//! - Operators and punctuation
//! - Comments
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

#[test]
fn test_tokenize_keywords() {
    let source = "int float bool char string static const if else while do for return break continue input output true false".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Int,
            TokenKind::Float,
            TokenKind::Bool,
            TokenKind::Char,
            TokenKind::StringType,
            TokenKind::Static,
            TokenKind::Const,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::For,
            TokenKind::Return,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Input,
            TokenKind::Output,
            TokenKind::True,
            TokenKind::False,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar_1 _x integer".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "bar_1");
    assert_eq!(tokens[2].value, "_x");
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].value, "integer");
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0 1.5e3".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
    assert_eq!(tokens[3].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[3].value, "1.5e3");
}

#[test]
fn test_tokenize_char_and_string_literals() {
    let source = r#"'a' '\n' "hello" "tab\there""#.to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].value, "\n");
    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].value, "hello");
    assert_eq!(tokens[3].value, "tab\there");
}

#[test]
fn test_string_span_includes_quotes() {
    let source = r#"s = "123";"#.to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[2].span.start.0, 4);
    assert_eq!(tokens[2].span.end.0, 9);
}

#[test]
fn test_tokenize_operators() {
    let source = "+ - * / % == != < > <= >= = && || ! << >> ?".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::ShiftLeft,
            TokenKind::ShiftRight,
            TokenKind::Question,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    let source = "( ) { } [ ] , ; :".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::OpenParen);
    assert_eq!(tokens[1].kind, TokenKind::CloseParen);
    assert_eq!(tokens[2].kind, TokenKind::OpenCurly);
    assert_eq!(tokens[3].kind, TokenKind::CloseCurly);
    assert_eq!(tokens[4].kind, TokenKind::OpenBracket);
    assert_eq!(tokens[5].kind, TokenKind::CloseBracket);
    assert_eq!(tokens[6].kind, TokenKind::Comma);
    assert_eq!(tokens[7].kind, TokenKind::Semicolon);
    assert_eq!(tokens[8].kind, TokenKind::Colon);
}

#[test]
fn test_comments_are_skipped() {
    let source = "int // line comment\n/* block\ncomment */ a;".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "a");
}

#[test]
fn test_unrecognised_character() {
    let source = "int a @ b;".to_string();
    let error = tokenize(source, Some("test.lang".to_string())).unwrap_err();

    assert_eq!(error.code(), 1);
    assert_eq!(error.get_occurrence().start.0, 6);
}

#[test]
fn test_tokenize_bitwise_operators() {
    let source = "a | b || c & d && e ^ #f".to_string();
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).filter(|kind| *kind != TokenKind::Identifier).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Pipe,
            TokenKind::Or,
            TokenKind::Ampersand,
            TokenKind::And,
            TokenKind::Caret,
            TokenKind::Hash,
            TokenKind::EOF,
        ]
    );
}

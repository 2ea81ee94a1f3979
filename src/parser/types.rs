//! Type parsing implementation.
//!
//! Types are single keywords (`int`, `float`, `bool`, `char`, `string`).
//! Each keyword is registered in the parser's type table, mirroring how
//! expression handlers are registered.

use std::collections::HashMap;

use crate::{
    ast::types::DataType,
    errors::errors::Error,
    lexer::tokens::TokenKind,
    Span,
};

use super::parser::Parser;

/// Type alias for type handler functions.
pub type TypeHandler = fn(&mut Parser) -> Result<(DataType, Span), Error>;

/// Type alias for the type lookup table.
pub type TypeLookup = HashMap<TokenKind, TypeHandler>;

/// Initializes the type parsing lookup table.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Int, parse_primitive_type);
    parser.type_nud(TokenKind::Float, parse_primitive_type);
    parser.type_nud(TokenKind::Bool, parse_primitive_type);
    parser.type_nud(TokenKind::Char, parse_primitive_type);
    parser.type_nud(TokenKind::StringType, parse_primitive_type);
}

pub fn parse_primitive_type(parser: &mut Parser) -> Result<(DataType, Span), Error> {
    let data_type = match parser.current_token_kind() {
        TokenKind::Int => DataType::Int,
        TokenKind::Float => DataType::Float,
        TokenKind::Bool => DataType::Bool,
        TokenKind::Char => DataType::Char,
        TokenKind::StringType => DataType::String,
        _ => return Err(parser.unexpected_detailed("expected a type")),
    };

    Ok((data_type, parser.advance().span.clone()))
}

/// Parses a type keyword and returns it with its span.
pub fn parse_type(parser: &mut Parser) -> Result<(DataType, Span), Error> {
    let handler = parser.get_type_lookup().get(&parser.current_token_kind()).copied();
    match handler {
        Some(handler) => handler(parser),
        None => Err(parser.unexpected_detailed("expected a type")),
    }
}

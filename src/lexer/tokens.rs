use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("int", TokenKind::Int);
        map.insert("float", TokenKind::Float);
        map.insert("bool", TokenKind::Bool);
        map.insert("char", TokenKind::Char);
        map.insert("string", TokenKind::StringType);
        map.insert("static", TokenKind::Static);
        map.insert("const", TokenKind::Const);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("do", TokenKind::Do);
        map.insert("for", TokenKind::For);
        map.insert("return", TokenKind::Return);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("input", TokenKind::Input);
        map.insert("output", TokenKind::Output);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Integer,
    FloatLiteral,
    CharLiteral,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    ShiftLeft,
    ShiftRight,

    Or,
    And,
    Pipe,      // |
    Caret,     // ^
    Ampersand, // &
    Hash,      // #

    Semicolon,
    Colon,
    Question,
    Comma,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Int,
    Float,
    Bool,
    Char,
    StringType,
    Static,
    Const,
    If,
    Else,
    While,
    Do,
    For,
    Return,
    Break,
    Continue,
    Input,
    Output,
    True,
    False,
}

impl TokenKind {
    /// Whether this token names one of the five primitive types.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::Char
                | TokenKind::StringType
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexeme with its kind and source range.
///
/// For string and char literals `value` holds the unquoted, unescaped
/// content while `span` still covers the quotes.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::String
            | TokenKind::CharLiteral
            | TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::FloatLiteral => write!(f, "{} ({})", self.kind, self.value),
            _ => write!(f, "{}", self.kind),
        }
    }
}

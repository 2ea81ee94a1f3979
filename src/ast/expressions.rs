//! Expression nodes.
//!
//! Every node keeps the span of the token that best identifies it in a
//! diagnostic: identifiers their name, operators the operator itself.

use crate::Span;

use super::{ast::Identifier, types::DataType};

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
}

impl LiteralValue {
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Int(_) => DataType::Int,
            LiteralValue::Float(_) => DataType::Float,
            LiteralValue::Bool(_) => DataType::Bool,
            LiteralValue::Char(_) => DataType::Char,
            LiteralValue::String(_) => DataType::String,
        }
    }
}

/// A literal with its source text (quotes removed).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    /// `?x`, the truth value of `x`
    Test,
    Hash,
    /// `&x`
    Address,
    /// `*x`
    Dereference,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::Test => "?",
            UnaryOperator::Hash => "#",
            UnaryOperator::Address => "&",
            UnaryOperator::Dereference => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::Or | BinaryOperator::And)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, BinaryOperator::BitOr | BinaryOperator::BitXor | BinaryOperator::BitAnd)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::Less
                | BinaryOperator::LessEquals
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEquals
        )
    }
}

/// `name[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub base: Identifier,
    pub index: Box<Expr>,
    pub span: Span,
}

/// `name(arguments...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Identifier,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub operator_span: Span,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub operator_span: Span,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// `condition ? then_value : else_value`
#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    pub then_value: Box<Expr>,
    pub else_value: Box<Expr>,
    pub operator_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(Identifier),
    Index(IndexExpr),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Ternary(TernaryExpr),
}

impl Expr {
    /// The span a diagnostic about this expression points at.
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Literal(literal) => &literal.span,
            Expr::Identifier(identifier) => &identifier.span,
            Expr::Index(index) => &index.span,
            Expr::Call(call) => &call.span,
            Expr::Unary(unary) => &unary.operator_span,
            Expr::Binary(binary) => &binary.operator_span,
            Expr::Ternary(ternary) => &ternary.operator_span,
        }
    }
}

use crate::Span;

use super::{
    ast::Identifier,
    expressions::{CallExpr, Expr, IndexExpr},
    types::DataType,
};

/// Target of an assignment, shift or `input`.
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Variable(Identifier),
    Indexed(IndexExpr),
}

impl LValue {
    pub fn identifier(&self) -> &Identifier {
        match self {
            LValue::Variable(identifier) => identifier,
            LValue::Indexed(index) => &index.base,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            LValue::Variable(identifier) => &identifier.span,
            LValue::Indexed(index) => &index.span,
        }
    }
}

/// `<= value`, where value is a literal or an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    pub operator_span: Span,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalName {
    pub identifier: Identifier,
    pub initializer: Option<Initializer>,
}

/// `[static] [const] type a, b <= 1, c;`
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub is_static: bool,
    pub is_const: bool,
    pub data_type: DataType,
    pub type_span: Span,
    pub names: Vec<LocalName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: LValue,
    pub operator_span: Span,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

impl ShiftDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftDirection::Left => "<<",
            ShiftDirection::Right => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftStmt {
    pub target: LValue,
    pub direction: ShiftDirection,
    pub operator_span: Span,
    pub amount: i64,
    pub amount_text: String,
    pub amount_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// `for (init : condition : step) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: AssignStmt,
    pub condition: Expr,
    pub step: AssignStmt,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    LocalDecl(LocalDecl),
    Assign(AssignStmt),
    Shift(ShiftStmt),
    Input { target: Identifier, span: Span },
    Output { value: Expr, span: Span },
    Call(CallExpr),
    Return { value: Expr, span: Span },
    Break(Span),
    Continue(Span),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Block(Block),
}

/// An ordered command list between braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

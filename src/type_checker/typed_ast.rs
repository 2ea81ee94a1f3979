//! Typed Abstract Syntax Tree definitions.
//!
//! This module contains the annotated tree produced by the type checker.
//! Every expression carries its resolved type and every declaration its
//! storage size, which is all the code generator needs to pick instructions
//! and lay out frames.

use crate::{
    ast::{
        expressions::{BinaryOperator, LiteralValue, UnaryOperator},
        statements::ShiftDirection,
        types::DataType,
    },
    Span,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Literal(LiteralValue),
    Variable(String),
    Index {
        name: String,
        index: Box<TypedExpr>,
    },
    Call(TypedCall),
    Unary {
        operator: UnaryOperator,
        operand: Box<TypedExpr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Ternary {
        condition: Box<TypedExpr>,
        then_value: Box<TypedExpr>,
        else_value: Box<TypedExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedCall {
    pub name: String,
    pub arguments: Vec<TypedExpr>,
}

/// A store destination with the type of the stored element.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedLValue {
    Variable { name: String, data_type: DataType },
    Indexed { name: String, index: Box<TypedExpr>, data_type: DataType },
}

impl TypedLValue {
    pub fn name(&self) -> &str {
        match self {
            TypedLValue::Variable { name, .. } | TypedLValue::Indexed { name, .. } => name,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            TypedLValue::Variable { data_type, .. } | TypedLValue::Indexed { data_type, .. } => *data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    /// One declared local, initialized or not.
    Declare {
        name: String,
        data_type: DataType,
        size: u32,
        initializer: Option<TypedExpr>,
        span: Span,
    },
    Assign {
        target: TypedLValue,
        value: TypedExpr,
    },
    Shift {
        target: TypedLValue,
        direction: ShiftDirection,
        amount: u32,
    },
    Input {
        target: TypedLValue,
    },
    Output {
        value: TypedExpr,
    },
    Call(TypedCall),
    Return {
        value: TypedExpr,
    },
    Break,
    Continue,
    If {
        condition: TypedExpr,
        then_block: TypedBlock,
        else_block: Option<TypedBlock>,
    },
    While {
        condition: TypedExpr,
        body: TypedBlock,
    },
    For {
        init: Box<TypedStmt>,
        condition: TypedExpr,
        step: Box<TypedStmt>,
        body: TypedBlock,
    },
    Block(TypedBlock),
}

impl TypedStmt {
    /// Collects the names this command may store to, nested commands included.
    pub fn collect_assigned(&self, names: &mut Vec<String>) {
        match self {
            TypedStmt::Assign { target, .. } | TypedStmt::Shift { target, .. } | TypedStmt::Input { target } => {
                names.push(target.name().to_string())
            }
            TypedStmt::If { then_block, else_block, .. } => {
                then_block.collect_assigned(names);
                if let Some(else_block) = else_block {
                    else_block.collect_assigned(names);
                }
            }
            TypedStmt::While { body, .. } => body.collect_assigned(names),
            TypedStmt::For { init, step, body, .. } => {
                init.collect_assigned(names);
                step.collect_assigned(names);
                body.collect_assigned(names);
            }
            TypedStmt::Block(block) => block.collect_assigned(names),
            TypedStmt::Declare { .. }
            | TypedStmt::Output { .. }
            | TypedStmt::Call(_)
            | TypedStmt::Return { .. }
            | TypedStmt::Break
            | TypedStmt::Continue => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedBlock {
    pub statements: Vec<TypedStmt>,
}

impl TypedBlock {
    pub fn collect_assigned(&self, names: &mut Vec<String>) {
        for stmt in &self.statements {
            stmt.collect_assigned(names);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedGlobal {
    pub name: String,
    pub data_type: DataType,
    /// Element count for vectors.
    pub length: Option<u32>,
    /// Total size in bytes.
    pub size: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedParam {
    pub name: String,
    pub data_type: DataType,
    pub size: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunction {
    pub name: String,
    pub return_type: DataType,
    pub params: Vec<TypedParam>,
    pub body: TypedBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedItem {
    Global(TypedGlobal),
    Function(TypedFunction),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedProgram {
    pub items: Vec<TypedItem>,
}

//! Program-level AST nodes.

use crate::Span;

use super::{statements::Block, types::DataType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// One name of a global declaration list; `length` is set for vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalName {
    pub identifier: Identifier,
    pub length: Option<u32>,
    /// From the type keyword to the closing bracket (or the name, for scalars).
    pub span: Span,
}

/// `[static] type a, b[10], c;`
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
    pub is_static: bool,
    pub data_type: DataType,
    pub type_span: Span,
    pub names: Vec<GlobalName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub is_const: bool,
    pub data_type: DataType,
    pub type_span: Span,
    pub identifier: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub is_static: bool,
    pub return_type: DataType,
    pub type_span: Span,
    pub identifier: Identifier,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Global(GlobalDecl),
    Function(FnDecl),
}

/// A whole translation unit, items in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FnDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            Item::Global(_) => None,
        })
    }
}

//! Type system definitions for the AST.
//!
//! The language has five primitive types. Vectors are one-dimensional and
//! only appear in global declarations, so they are modelled as a property of
//! the declared name rather than as a type of their own.

use std::fmt::Display;

/// A primitive type as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Bool,
    Char,
    String,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::Char => "char",
            DataType::String => "string",
        }
    }

    /// `int`, `float` and `bool` freely coerce into each other.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float | DataType::Bool)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

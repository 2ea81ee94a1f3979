/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Program, items and identifiers
/// - expressions: Expression nodes and operators
/// - statements: Commands and blocks
/// - types: The primitive data types
/// - graph: Export of the threaded AST graph
pub mod ast;
pub mod expressions;
pub mod graph;
pub mod statements;
pub mod types;

//! AST graph export.
//!
//! The tree is flattened into the threaded form the graph consumers expect:
//! commands of a block are linked one to the next, a node's children are its
//! operands, and every function header hangs off the previous function. The
//! result is printed as all edges (`a, b`) followed by all labels
//! (`a [label="x"];`).
//!
//! Bare declarations, globals and empty blocks produce no nodes. A nested
//! block contributes its commands straight into the enclosing chain.

use std::fmt::Display;

use crate::config::{CallArgumentLayout, FunctionLink, GraphLayout};

use super::{
    ast::{Identifier, Program},
    expressions::{CallExpr, Expr},
    statements::{AssignStmt, Block, LValue, Stmt},
};

struct Node {
    id: usize,
    label: String,
    children: Vec<Node>,
    next: Option<Box<Node>>,
}

impl Node {
    fn new(label: impl Into<String>) -> Self {
        Node {
            id: 0,
            label: label.into(),
            children: vec![],
            next: None,
        }
    }

    fn with_children(label: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            children,
            ..Node::new(label)
        }
    }
}

/// An exported AST: edges in emission order, labels in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub edges: Vec<(usize, usize)>,
    pub labels: Vec<(usize, String)>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of a node id, if it exists.
    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels
            .iter()
            .find(|(node, _)| *node == id)
            .map(|(_, label)| label.as_str())
    }

    /// Edges rendered as label pairs, handy for comparing layouts.
    pub fn labelled_edges(&self) -> Vec<(String, String)> {
        self.edges
            .iter()
            .map(|(from, to)| {
                (
                    self.label(*from).unwrap_or_default().to_string(),
                    self.label(*to).unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn number(&mut self, node: &mut Node) {
        let mut current = Some(node);
        while let Some(node) = current {
            node.id = self.labels.len();
            self.labels.push((node.id, node.label.clone()));
            for child in node.children.iter_mut() {
                self.number(child);
            }
            current = node.next.as_deref_mut();
        }
    }

    fn connect(&mut self, node: &Node) {
        let mut current = Some(node);
        while let Some(node) = current {
            for child in &node.children {
                self.edges.push((node.id, child.id));
            }
            if let Some(next) = &node.next {
                self.edges.push((node.id, next.id));
            }
            for child in &node.children {
                self.connect(child);
            }
            current = node.next.as_deref();
        }
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (from, to) in &self.edges {
            writeln!(f, "n{}, n{}", from, to)?;
        }
        for (id, label) in &self.labels {
            writeln!(f, "n{} [label=\"{}\"];", id, label.replace('\\', "\\\\").replace('"', "\\\""))?;
        }
        Ok(())
    }
}

/// Builds the exported graph of a parsed program.
///
/// # Arguments
///
/// * `program` - The parsed program
/// * `layout` - Call-argument and function-link options
pub fn ast_graph(program: &Program, layout: &GraphLayout) -> Graph {
    let builder = GraphBuilder { layout };
    let mut graph = Graph::default();

    let mut following: Option<Node> = None;
    for function in program.functions().collect::<Vec<_>>().into_iter().rev() {
        let body = builder.block(&function.body);
        let mut header = Node::new(function.identifier.name.clone());

        match layout.function_link {
            FunctionLink::ChainTail => {
                if body.is_empty() {
                    header.next = following.map(Box::new);
                } else {
                    header.children.extend(chain(body, following));
                }
            }
            FunctionLink::Header => {
                header.children.extend(chain(body, None));
                header.next = following.map(Box::new);
            }
        }

        following = Some(header);
    }

    if let Some(mut root) = following {
        graph.number(&mut root);
        graph.connect(&root);
    }

    graph
}

/// Threads `nodes` in order and appends `tail` after the last one.
fn chain(nodes: Vec<Node>, tail: Option<Node>) -> Option<Node> {
    let mut next = tail;
    for mut node in nodes.into_iter().rev() {
        node.next = next.map(Box::new);
        next = Some(node);
    }
    next
}

struct GraphBuilder<'a> {
    layout: &'a GraphLayout,
}

impl GraphBuilder<'_> {
    fn block(&self, block: &Block) -> Vec<Node> {
        block.statements.iter().flat_map(|stmt| self.statement(stmt)).collect()
    }

    fn block_child(&self, block: &Block) -> Option<Node> {
        chain(self.block(block), None)
    }

    fn statement(&self, stmt: &Stmt) -> Vec<Node> {
        match stmt {
            Stmt::LocalDecl(decl) => decl
                .names
                .iter()
                .filter_map(|name| {
                    name.initializer.as_ref().map(|initializer| {
                        Node::with_children(
                            "<=",
                            vec![identifier(&name.identifier), self.expression(&initializer.value)],
                        )
                    })
                })
                .collect(),
            Stmt::Assign(assign) => vec![self.assignment(assign)],
            Stmt::Shift(shift) => vec![Node::with_children(
                shift.direction.as_str(),
                vec![self.lvalue(&shift.target), Node::new(shift.amount_text.clone())],
            )],
            Stmt::Input { target, .. } => vec![Node::with_children("input", vec![identifier(target)])],
            Stmt::Output { value, .. } => vec![Node::with_children("output", vec![self.expression(value)])],
            Stmt::Call(call) => vec![self.call(call)],
            Stmt::Return { value, .. } => vec![Node::with_children("return", vec![self.expression(value)])],
            Stmt::Break(_) => vec![Node::new("break")],
            Stmt::Continue(_) => vec![Node::new("continue")],
            Stmt::If(if_stmt) => {
                let mut children = vec![self.expression(&if_stmt.condition)];
                children.extend(self.block_child(&if_stmt.then_block));
                if let Some(else_block) = &if_stmt.else_block {
                    children.extend(self.block_child(else_block));
                }
                vec![Node::with_children("if", children)]
            }
            Stmt::While(while_stmt) => {
                let mut children = vec![self.expression(&while_stmt.condition)];
                children.extend(self.block_child(&while_stmt.body));
                vec![Node::with_children("while", children)]
            }
            Stmt::For(for_stmt) => {
                let mut children = vec![
                    self.assignment(&for_stmt.init),
                    self.expression(&for_stmt.condition),
                    self.assignment(&for_stmt.step),
                ];
                children.extend(self.block_child(&for_stmt.body));
                vec![Node::with_children("for", children)]
            }
            Stmt::Block(block) => self.block(block),
        }
    }

    fn assignment(&self, assign: &AssignStmt) -> Node {
        Node::with_children("=", vec![self.lvalue(&assign.target), self.expression(&assign.value)])
    }

    fn lvalue(&self, target: &LValue) -> Node {
        match target {
            LValue::Variable(name) => identifier(name),
            LValue::Indexed(index) => {
                Node::with_children("[]", vec![identifier(&index.base), self.expression(&index.index)])
            }
        }
    }

    fn call(&self, call: &CallExpr) -> Node {
        let arguments: Vec<Node> = call.arguments.iter().map(|argument| self.expression(argument)).collect();
        let label = format!("call {}", call.callee.name);

        match self.layout.call_arguments {
            CallArgumentLayout::Children => Node::with_children(label, arguments),
            CallArgumentLayout::Chained => Node::with_children(label, chain(arguments, None).into_iter().collect()),
        }
    }

    fn expression(&self, expr: &Expr) -> Node {
        match expr {
            Expr::Literal(literal) => Node::new(literal.text.clone()),
            Expr::Identifier(name) => identifier(name),
            Expr::Index(index) => {
                Node::with_children("[]", vec![identifier(&index.base), self.expression(&index.index)])
            }
            Expr::Call(call) => self.call(call),
            Expr::Unary(unary) => Node::with_children(unary.operator.as_str(), vec![self.expression(&unary.operand)]),
            Expr::Binary(binary) => Node::with_children(
                binary.operator.as_str(),
                vec![self.expression(&binary.left), self.expression(&binary.right)],
            ),
            Expr::Ternary(ternary) => Node::with_children(
                "?:",
                vec![
                    self.expression(&ternary.condition),
                    self.expression(&ternary.then_value),
                    self.expression(&ternary.else_value),
                ],
            ),
        }
    }
}

fn identifier(identifier: &Identifier) -> Node {
    Node::new(identifier.name.clone())
}

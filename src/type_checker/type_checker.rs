use tracing::trace;

use crate::{
    ast::{
        ast::{FnDecl, GlobalDecl, Identifier, Item, Program},
        expressions::{BinaryExpr, CallExpr, Expr, IndexExpr, LiteralValue, TernaryExpr, UnaryExpr, UnaryOperator},
        statements::{AssignStmt, Block, LValue, LocalDecl, ShiftStmt, Stmt},
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::{
    coercion::{can_coerce, check_assignment, infer, require_numeric, size_of, EXPECTED_BOOL, EXPECTED_INT, EXPECTED_NUMERIC},
    scope::{ScopeEntry, ScopeStack},
    typed_ast::{
        TypedBlock, TypedCall, TypedExpr, TypedExprKind, TypedFunction, TypedGlobal, TypedItem, TypedLValue,
        TypedParam, TypedProgram, TypedStmt,
    },
};

/// Largest shift amount accepted by `<<` and `>>`.
pub const MAX_SHIFT: i64 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSignature {
    pub name: String,
    pub data_type: DataType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Vector { length: u32 },
    Function { params: Vec<ParamSignature> },
}

impl SymbolKind {
    fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Vector { .. } => "vector",
            SymbolKind::Function { .. } => "function",
        }
    }
}

/// What an identifier names, as recorded at its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub data_type: DataType,
    /// Declared length of a string variable; zero for everything else.
    pub capacity: u32,
    pub declared_at: Span,
}

impl ScopeEntry for Symbol {
    fn declared_at(&self) -> &Span {
        &self.declared_at
    }
}

/// How an identifier is being used at a given site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    Variable,
    Vector,
    Function,
}

impl Usage {
    fn as_str(&self) -> &'static str {
        match self {
            Usage::Variable => "variable",
            Usage::Vector => "vector",
            Usage::Function => "function",
        }
    }

    fn accepts(&self, kind: &SymbolKind) -> bool {
        matches!(
            (self, kind),
            (Usage::Variable, SymbolKind::Variable)
                | (Usage::Vector, SymbolKind::Vector { .. })
                | (Usage::Function, SymbolKind::Function { .. })
        )
    }
}

#[derive(Debug, Default)]
pub struct TypeChecker {
    scopes: ScopeStack<Symbol>,
    return_type: Option<DataType>,
}

/// Analyses a whole program, stopping at the first semantic error.
pub fn type_check(program: &Program) -> Result<TypedProgram, Error> {
    let mut type_checker = TypeChecker::default();
    let mut items = Vec::with_capacity(program.items.len());

    for item in &program.items {
        match item {
            Item::Global(global) => items.extend(type_checker.check_global(global)?.into_iter().map(TypedItem::Global)),
            Item::Function(function) => items.push(TypedItem::Function(type_checker.check_function(function)?)),
        }
    }

    Ok(TypedProgram { items })
}

impl TypeChecker {
    /// Resolves `identifier` and checks that it names the kind of thing `usage` needs.
    fn resolve_as(&self, identifier: &Identifier, usage: Usage) -> Result<&Symbol, Error> {
        let symbol = self.scopes.resolve(&identifier.name, &identifier.span)?;

        if usage.accepts(&symbol.kind) {
            return Ok(symbol);
        }

        let name = identifier.name.clone();
        let used_as = usage.as_str().to_string();
        let error = match symbol.kind {
            SymbolKind::Variable => ErrorImpl::VariableMisuse { identifier: name, used_as },
            SymbolKind::Vector { .. } => ErrorImpl::VectorMisuse { identifier: name, used_as },
            SymbolKind::Function { .. } => ErrorImpl::FunctionMisuse { identifier: name, used_as },
        };
        trace!(identifier = %identifier.name, declared = symbol.kind.as_str(), "identifier misuse");

        Err(Error::with_first_occurrence(error, symbol.declared_at.clone(), identifier.span.clone()))
    }

    fn check_global(&mut self, global: &GlobalDecl) -> Result<Vec<TypedGlobal>, Error> {
        let mut typed = Vec::with_capacity(global.names.len());

        for name in &global.names {
            if name.length.is_some() && global.data_type == DataType::String {
                return Err(Error::new(
                    ErrorImpl::StringVector {
                        identifier: name.identifier.name.clone(),
                    },
                    name.span.clone(),
                ));
            }

            let size = size_of(global.data_type, 0)
                .checked_mul(name.length.unwrap_or(1))
                .ok_or_else(|| {
                    Error::new(
                        ErrorImpl::VectorTooLarge {
                            identifier: name.identifier.name.clone(),
                            length: name.length.unwrap_or(1),
                        },
                        name.span.clone(),
                    )
                })?;

            let kind = match name.length {
                Some(length) => SymbolKind::Vector { length },
                None => SymbolKind::Variable,
            };
            let symbol = Symbol {
                kind,
                data_type: global.data_type,
                capacity: 0,
                declared_at: name.identifier.span.clone(),
            };
            self.scopes.declare(&name.identifier.name, symbol, &name.identifier.span)?;

            typed.push(TypedGlobal {
                name: name.identifier.name.clone(),
                data_type: global.data_type,
                length: name.length,
                size,
                span: name.identifier.span.clone(),
            });
        }

        Ok(typed)
    }

    fn check_function(&mut self, function: &FnDecl) -> Result<TypedFunction, Error> {
        if function.return_type == DataType::String {
            return Err(function_string(&function.identifier, "return", &function.type_span));
        }

        if let Some(param) = function.params.iter().find(|param| param.data_type == DataType::String) {
            return Err(function_string(&param.identifier, "parameter", &param.type_span));
        }

        let signature = function
            .params
            .iter()
            .map(|param| ParamSignature {
                name: param.identifier.name.clone(),
                data_type: param.data_type,
                span: param.identifier.span.clone(),
            })
            .collect();

        self.scopes.declare(
            &function.identifier.name,
            Symbol {
                kind: SymbolKind::Function { params: signature },
                data_type: function.return_type,
                capacity: 0,
                declared_at: function.identifier.span.clone(),
            },
            &function.identifier.span,
        )?;

        // Parameters and top-level locals share this frame.
        self.scopes.enter_scope();
        self.return_type = Some(function.return_type);

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            self.scopes.declare(
                &param.identifier.name,
                Symbol {
                    kind: SymbolKind::Variable,
                    data_type: param.data_type,
                    capacity: 0,
                    declared_at: param.identifier.span.clone(),
                },
                &param.identifier.span,
            )?;
            params.push(TypedParam {
                name: param.identifier.name.clone(),
                data_type: param.data_type,
                size: size_of(param.data_type, 0),
                span: param.identifier.span.clone(),
            });
        }

        let body = self.check_statements(&function.body.statements)?;

        self.return_type = None;
        self.scopes.exit_scope();

        Ok(TypedFunction {
            name: function.identifier.name.clone(),
            return_type: function.return_type,
            params,
            body,
            span: function.identifier.span.clone(),
        })
    }

    fn check_statements(&mut self, statements: &[Stmt]) -> Result<TypedBlock, Error> {
        let mut typed = Vec::with_capacity(statements.len());

        for stmt in statements {
            match stmt {
                Stmt::LocalDecl(decl) => typed.extend(self.check_local_decl(decl)?),
                stmt => typed.push(self.check_stmt(stmt)?),
            }
        }

        Ok(TypedBlock { statements: typed })
    }

    /// Analyses `block` inside a fresh frame.
    fn check_scoped_block(&mut self, block: &Block) -> Result<TypedBlock, Error> {
        self.scopes.enter_scope();
        let typed = self.check_statements(&block.statements);
        self.scopes.exit_scope();

        typed
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<TypedStmt, Error> {
        match stmt {
            Stmt::LocalDecl(_) => Err(Error::new(
                ErrorImpl::InternalError {
                    message: "local declaration outside of a command list".to_string(),
                },
                Span::null(),
            )),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Shift(shift) => self.check_shift(shift),
            Stmt::Input { target, .. } => {
                let symbol = self.resolve_as(target, Usage::Variable)?;

                if !matches!(symbol.data_type, DataType::Int | DataType::Float) {
                    return Err(Error::with_first_occurrence(
                        ErrorImpl::WrongParInput {
                            received: symbol.data_type.to_string(),
                        },
                        symbol.declared_at.clone(),
                        target.span.clone(),
                    ));
                }

                Ok(TypedStmt::Input {
                    target: TypedLValue::Variable {
                        name: target.name.clone(),
                        data_type: symbol.data_type,
                    },
                })
            }
            Stmt::Output { value, .. } => self.check_output(value),
            Stmt::Call(call) => Ok(TypedStmt::Call(self.check_call(call)?.0)),
            Stmt::Return { value, .. } => {
                let typed = self.check_expr(value)?;
                let expected = self.return_type.ok_or_else(|| {
                    Error::new(
                        ErrorImpl::InternalError {
                            message: "return outside of a function".to_string(),
                        },
                        value.get_span().clone(),
                    )
                })?;

                if !can_coerce(typed.data_type, expected) {
                    return Err(Error::new(
                        ErrorImpl::WrongParReturn {
                            expected: expected.to_string(),
                            received: typed.data_type.to_string(),
                        },
                        value.get_span().clone(),
                    ));
                }

                Ok(TypedStmt::Return { value: typed })
            }
            Stmt::Break(_) => Ok(TypedStmt::Break),
            Stmt::Continue(_) => Ok(TypedStmt::Continue),
            Stmt::If(if_stmt) => {
                let condition = self.check_condition(&if_stmt.condition)?;
                let then_block = self.check_scoped_block(&if_stmt.then_block)?;
                let else_block = match &if_stmt.else_block {
                    Some(block) => Some(self.check_scoped_block(block)?),
                    None => None,
                };

                Ok(TypedStmt::If {
                    condition,
                    then_block,
                    else_block,
                })
            }
            Stmt::While(while_stmt) => {
                let condition = self.check_condition(&while_stmt.condition)?;
                let body = self.check_scoped_block(&while_stmt.body)?;

                Ok(TypedStmt::While { condition, body })
            }
            Stmt::For(for_stmt) => {
                let init = self.check_assign(&for_stmt.init)?;
                let condition = self.check_condition(&for_stmt.condition)?;
                let step = self.check_assign(&for_stmt.step)?;
                let body = self.check_scoped_block(&for_stmt.body)?;

                Ok(TypedStmt::For {
                    init: Box::new(init),
                    condition,
                    step: Box::new(step),
                    body,
                })
            }
            Stmt::Block(block) => Ok(TypedStmt::Block(self.check_scoped_block(block)?)),
        }
    }

    /// Declares every name of a local declaration list, one `Declare` each.
    ///
    /// A name enters the frame before its initializer is checked, so a
    /// redeclaration is reported ahead of any error in the initializer.
    fn check_local_decl(&mut self, decl: &LocalDecl) -> Result<Vec<TypedStmt>, Error> {
        let mut typed = Vec::with_capacity(decl.names.len());

        for name in &decl.names {
            self.scopes.declare(
                &name.identifier.name,
                Symbol {
                    kind: SymbolKind::Variable,
                    data_type: decl.data_type,
                    capacity: 0,
                    declared_at: name.identifier.span.clone(),
                },
                &name.identifier.span,
            )?;

            let mut capacity = 0;
            let initializer = match &name.initializer {
                Some(initializer) => {
                    let value = self.check_expr(&initializer.value)?;
                    check_assignment(decl.data_type, value.data_type)
                        .map_err(|error| Error::new(error, initializer.value.get_span().clone()))?;

                    if decl.data_type == DataType::String {
                        capacity = self.string_length(&initializer.value).unwrap_or(0);
                    }
                    Some(value)
                }
                None => None,
            };

            if let Some(symbol) = self.scopes.lookup_mut(&name.identifier.name) {
                symbol.capacity = capacity;
            }

            typed.push(TypedStmt::Declare {
                name: name.identifier.name.clone(),
                data_type: decl.data_type,
                size: size_of(decl.data_type, capacity),
                initializer,
                span: name.identifier.span.clone(),
            });
        }

        Ok(typed)
    }

    fn check_lvalue(&self, target: &LValue) -> Result<(TypedLValue, &Symbol), Error> {
        match target {
            LValue::Variable(identifier) => {
                let symbol = self.resolve_as(identifier, Usage::Variable)?;

                Ok((
                    TypedLValue::Variable {
                        name: identifier.name.clone(),
                        data_type: symbol.data_type,
                    },
                    symbol,
                ))
            }
            LValue::Indexed(index) => {
                let symbol = self.resolve_as(&index.base, Usage::Vector)?;
                let typed_index = self.check_index(index)?;

                Ok((
                    TypedLValue::Indexed {
                        name: index.base.name.clone(),
                        index: Box::new(typed_index),
                        data_type: symbol.data_type,
                    },
                    symbol,
                ))
            }
        }
    }

    fn check_assign(&self, assign: &AssignStmt) -> Result<TypedStmt, Error> {
        let (target, symbol) = self.check_lvalue(&assign.target)?;
        let value = self.check_expr(&assign.value)?;
        let length = self.string_length(&assign.value);

        check_assignment(target.data_type(), value.data_type)
            .map_err(|error| Error::new(error, assign.value.get_span().clone()))?;

        if target.data_type() == DataType::String {
            if let Some(length) = length {
                if length > symbol.capacity {
                    return Err(Error::new(
                        ErrorImpl::StringMax {
                            capacity: symbol.capacity,
                            length,
                        },
                        assign.value.get_span().clone(),
                    ));
                }
            }
        }

        Ok(TypedStmt::Assign { target, value })
    }

    fn check_shift(&self, shift: &ShiftStmt) -> Result<TypedStmt, Error> {
        let (target, _) = self.check_lvalue(&shift.target)?;

        require_numeric(target.data_type(), EXPECTED_INT)
            .map_err(|error| Error::new(error, shift.target.get_span().clone()))?;

        if shift.amount > MAX_SHIFT || shift.amount < 0 {
            return Err(Error::new(
                ErrorImpl::WrongParShift { received: shift.amount },
                shift.amount_span.clone(),
            ));
        }

        Ok(TypedStmt::Shift {
            target,
            direction: shift.direction,
            amount: shift.amount as u32,
        })
    }

    fn check_output(&self, value: &Expr) -> Result<TypedStmt, Error> {
        let typed = self.check_expr(value)?;

        if matches!(typed.data_type, DataType::Int | DataType::Float) {
            return Ok(TypedStmt::Output { value: typed });
        }

        let error = ErrorImpl::WrongParOutput {
            received: typed.data_type.to_string(),
        };

        match value {
            Expr::Identifier(identifier) => {
                let symbol = self.resolve_as(identifier, Usage::Variable)?;
                Err(Error::with_first_occurrence(error, symbol.declared_at.clone(), identifier.span.clone()))
            }
            value => Err(Error::new(error, value.get_span().clone())),
        }
    }

    fn check_condition(&self, condition: &Expr) -> Result<TypedExpr, Error> {
        let typed = self.check_expr(condition)?;

        require_numeric(typed.data_type, EXPECTED_BOOL).map_err(|error| Error::new(error, condition.get_span().clone()))?;

        Ok(typed)
    }

    fn check_index(&self, index: &IndexExpr) -> Result<TypedExpr, Error> {
        let typed = self.check_expr(&index.index)?;

        require_numeric(typed.data_type, EXPECTED_INT).map_err(|error| Error::new(error, index.index.get_span().clone()))?;

        Ok(typed)
    }

    /// Checks a call and returns it with the callee's return type.
    fn check_call(&self, call: &CallExpr) -> Result<(TypedCall, DataType), Error> {
        let symbol = self.resolve_as(&call.callee, Usage::Function)?;
        let SymbolKind::Function { params } = &symbol.kind else {
            return Err(Error::new(
                ErrorImpl::InternalError {
                    message: format!("\"{}\" resolved to a non-function", call.callee.name),
                },
                call.callee.span.clone(),
            ));
        };

        let expected = params.len();
        let received = call.arguments.len();
        if received != expected {
            let function = call.callee.name.clone();
            let error = if received < expected {
                ErrorImpl::MissingArgs {
                    function,
                    expected,
                    received,
                }
            } else {
                ErrorImpl::ExcessArgs {
                    function,
                    expected,
                    received,
                }
            };

            return Err(Error::with_first_occurrence(error, symbol.declared_at.clone(), call.callee.span.clone()));
        }

        let mut arguments = Vec::with_capacity(received);
        for (index, (argument, param)) in call.arguments.iter().zip(params).enumerate() {
            let typed = self.check_expr(argument)?;

            if !can_coerce(typed.data_type, param.data_type) {
                return Err(Error::with_first_occurrence(
                    ErrorImpl::WrongTypeArgs {
                        function: call.callee.name.clone(),
                        index: index + 1,
                        expected: param.data_type.to_string(),
                        received: typed.data_type.to_string(),
                    },
                    param.span.clone(),
                    argument.get_span().clone(),
                ));
            }
            arguments.push(typed);
        }

        Ok((
            TypedCall {
                name: call.callee.name.clone(),
                arguments,
            },
            symbol.data_type,
        ))
    }

    pub fn check_expr(&self, expr: &Expr) -> Result<TypedExpr, Error> {
        match expr {
            Expr::Literal(literal) => Ok(TypedExpr {
                kind: TypedExprKind::Literal(literal.value.clone()),
                data_type: literal.value.data_type(),
            }),
            Expr::Identifier(identifier) => {
                let symbol = self.resolve_as(identifier, Usage::Variable)?;

                Ok(TypedExpr {
                    kind: TypedExprKind::Variable(identifier.name.clone()),
                    data_type: symbol.data_type,
                })
            }
            Expr::Index(index) => {
                let symbol = self.resolve_as(&index.base, Usage::Vector)?;
                let typed_index = self.check_index(index)?;

                Ok(TypedExpr {
                    kind: TypedExprKind::Index {
                        name: index.base.name.clone(),
                        index: Box::new(typed_index),
                    },
                    data_type: symbol.data_type,
                })
            }
            Expr::Call(call) => {
                let (call, data_type) = self.check_call(call)?;

                Ok(TypedExpr {
                    kind: TypedExprKind::Call(call),
                    data_type,
                })
            }
            Expr::Unary(unary) => self.check_unary(unary),
            Expr::Binary(binary) => self.check_binary(binary),
            Expr::Ternary(ternary) => self.check_ternary(ternary),
        }
    }

    fn check_unary(&self, unary: &UnaryExpr) -> Result<TypedExpr, Error> {
        let operand = self.check_expr(&unary.operand)?;
        let at = |error| Error::new(error, unary.operator_span.clone());

        let data_type = match unary.operator {
            UnaryOperator::Not | UnaryOperator::Test => {
                require_numeric(operand.data_type, EXPECTED_BOOL).map_err(at)?;
                DataType::Bool
            }
            UnaryOperator::Minus | UnaryOperator::Plus => {
                require_numeric(operand.data_type, EXPECTED_NUMERIC).map_err(at)?;
                match operand.data_type {
                    DataType::Bool => DataType::Int,
                    other => other,
                }
            }
            UnaryOperator::Hash => DataType::Int,
            UnaryOperator::Address | UnaryOperator::Dereference => operand.data_type,
        };

        Ok(TypedExpr {
            kind: TypedExprKind::Unary {
                operator: unary.operator,
                operand: Box::new(operand),
            },
            data_type,
        })
    }

    fn check_binary(&self, binary: &BinaryExpr) -> Result<TypedExpr, Error> {
        let left = self.check_expr(&binary.left)?;
        let right = self.check_expr(&binary.right)?;
        let at = |error| Error::new(error, binary.operator_span.clone());

        let data_type = if binary.operator.is_logical() {
            infer(left.data_type, right.data_type, EXPECTED_BOOL).map_err(at)?;
            DataType::Bool
        } else if binary.operator.is_bitwise() {
            require_numeric(left.data_type, EXPECTED_INT).map_err(at)?;
            require_numeric(right.data_type, EXPECTED_INT).map_err(at)?;
            DataType::Int
        } else if binary.operator.is_comparison() {
            infer(left.data_type, right.data_type, EXPECTED_NUMERIC).map_err(at)?;
            DataType::Bool
        } else {
            infer(left.data_type, right.data_type, EXPECTED_NUMERIC).map_err(at)?
        };

        Ok(TypedExpr {
            kind: TypedExprKind::Binary {
                operator: binary.operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            data_type,
        })
    }

    fn check_ternary(&self, ternary: &TernaryExpr) -> Result<TypedExpr, Error> {
        let condition = self.check_expr(&ternary.condition)?;
        let then_value = self.check_expr(&ternary.then_value)?;
        let else_value = self.check_expr(&ternary.else_value)?;
        let at = |error| Error::new(error, ternary.operator_span.clone());

        require_numeric(condition.data_type, EXPECTED_BOOL).map_err(at)?;

        let data_type = if then_value.data_type == else_value.data_type {
            then_value.data_type
        } else {
            infer(then_value.data_type, else_value.data_type, EXPECTED_NUMERIC).map_err(at)?
        };

        Ok(TypedExpr {
            kind: TypedExprKind::Ternary {
                condition: Box::new(condition),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            },
            data_type,
        })
    }

    /// Length of a string value when it is known: literal text or a string variable's capacity.
    fn string_length(&self, value: &Expr) -> Option<u32> {
        match value {
            Expr::Literal(literal) => match &literal.value {
                LiteralValue::String(text) => Some(text.len() as u32),
                _ => None,
            },
            Expr::Identifier(identifier) => self
                .scopes
                .lookup(&identifier.name)
                .filter(|symbol| symbol.data_type == DataType::String && symbol.kind == SymbolKind::Variable)
                .map(|symbol| symbol.capacity),
            _ => None,
        }
    }
}

fn function_string(identifier: &Identifier, role: &str, at: &Span) -> Error {
    Error::new(
        ErrorImpl::FunctionString {
            identifier: identifier.name.clone(),
            role: role.to_string(),
        },
        at.clone(),
    )
}

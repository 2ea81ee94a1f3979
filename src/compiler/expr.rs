use crate::{
    ast::{
        expressions::{BinaryOperator, LiteralValue, UnaryOperator},
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::{TypedCall, TypedExpr, TypedExprKind},
    Span,
};

use super::{
    compiler::{load, store, width_of, Binding, Compiler, RETURN_ADDRESS_OFFSET, RETURN_VALUE_OFFSET, SAVED_RFP_OFFSET, SAVED_RSP_OFFSET},
    iloc::{ArithmeticOp, CompareOp, ImmediateOp, Operation, Register, Width},
};

/// Number of instructions from the return-address `addI` to the result load
/// of a call sequence.
const CALL_RETURN_DISTANCE: i64 = 5;

/// Result of lowering an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Constant(i64),
    Register(Register),
}

/// Machine representation of a literal.
///
/// Floats are truncated toward zero; strings are not lowered.
pub fn literal_value(value: &LiteralValue) -> i64 {
    match value {
        LiteralValue::Int(number) => *number,
        LiteralValue::Float(number) => number.trunc() as i64,
        LiteralValue::Bool(value) => i64::from(*value),
        LiteralValue::Char(character) => i64::from(u32::from(*character)),
        LiteralValue::String(_) => 0,
    }
}

/// Puts `operand` in a register, loading constants with `loadI`.
pub fn into_register(compiler: &mut Compiler, operand: Operand) -> Register {
    match operand {
        Operand::Register(register) => register,
        Operand::Constant(constant) => {
            let register = compiler.new_register();
            compiler.emit(Operation::LoadI(constant, register));
            register
        }
    }
}

/// Generates code for `expr` and returns where its value ends up.
pub fn gen_expression(compiler: &mut Compiler, expr: &TypedExpr) -> Result<Operand, Error> {
    match &expr.kind {
        TypedExprKind::Literal(value) => Ok(Operand::Constant(literal_value(value))),
        TypedExprKind::Variable(name) => {
            let slot = compiler.slot(name)?.clone();

            match slot.binding {
                Binding::Constant(constant) => Ok(Operand::Constant(constant)),
                Binding::Memory => {
                    let register = compiler.new_register();
                    compiler.emit(load(slot.width(), slot.base, slot.offset, register));
                    Ok(Operand::Register(register))
                }
            }
        }
        TypedExprKind::Index { name, index } => {
            let element = gen_element_address(compiler, name, index)?;
            let register = compiler.new_register();
            compiler.emit(element.load(register));
            Ok(Operand::Register(register))
        }
        TypedExprKind::Call(call) => gen_call(compiler, call).map(Operand::Register),
        TypedExprKind::Unary {
            operator: UnaryOperator::Address,
            operand,
        } => gen_address(compiler, operand),
        TypedExprKind::Unary {
            operator: UnaryOperator::Dereference,
            operand,
        } => {
            let address = gen_expression(compiler, operand)?;
            let address = into_register(compiler, address);
            let register = compiler.new_register();
            compiler.emit(load(width_of(expr.data_type), address, 0, register));
            Ok(Operand::Register(register))
        }
        TypedExprKind::Unary { operator, operand } => {
            let value = gen_expression(compiler, operand)?;
            gen_unary(compiler, *operator, value)
        }
        TypedExprKind::Binary { operator, left, right } => {
            let left = gen_expression(compiler, left)?;
            let right = gen_expression(compiler, right)?;
            gen_binary(compiler, *operator, left, right)
        }
        TypedExprKind::Ternary {
            condition,
            then_value,
            else_value,
        } => gen_ternary(compiler, condition, then_value, else_value),
    }
}

/// Where a vector element lives: a fixed offset or a computed one.
#[derive(Debug, Clone, Copy)]
pub enum ElementAddress {
    Fixed { width: Width, base: Register, offset: i64 },
    Computed { width: Width, base: Register, offset: Register },
}

impl ElementAddress {
    pub fn load(&self, target: Register) -> Operation {
        match *self {
            ElementAddress::Fixed { width, base, offset } => load(width, base, offset, target),
            ElementAddress::Computed { width, base, offset } => Operation::LoadAO(width, base, offset, target),
        }
    }

    pub fn store(&self, source: Register) -> Operation {
        match *self {
            ElementAddress::Fixed { width, base, offset } => store(width, source, base, offset),
            ElementAddress::Computed { width, base, offset } => Operation::StoreAO(width, source, base, offset),
        }
    }
}

/// `base + offset + index * element size`, folded when the index is constant.
///
/// A constant index whose offset does not fit in an `i64` is computed at run
/// time instead.
pub fn gen_element_address(compiler: &mut Compiler, name: &str, index: &TypedExpr) -> Result<ElementAddress, Error> {
    let index = gen_expression(compiler, index)?;
    let slot = compiler.slot(name)?.clone();
    let element_size = element_size(slot.data_type);
    let width = slot.width();

    let fixed = match index {
        Operand::Constant(index) => index
            .checked_mul(element_size)
            .and_then(|scaled| scaled.checked_add(slot.offset)),
        Operand::Register(_) => None,
    };
    if let Some(offset) = fixed {
        return Ok(ElementAddress::Fixed {
            width,
            base: slot.base,
            offset,
        });
    }

    let index = into_register(compiler, index);
    let scaled = compiler.new_register();
    compiler.emit(Operation::Immediate(ImmediateOp::MultI, index, element_size, scaled));
    let offset = compiler.new_register();
    compiler.emit(Operation::Immediate(ImmediateOp::AddI, scaled, slot.offset, offset));

    Ok(ElementAddress::Computed {
        width,
        base: slot.base,
        offset,
    })
}

/// `&operand`: the address of a variable or of a vector element.
///
/// Operands without storage evaluate to their own value.
fn gen_address(compiler: &mut Compiler, operand: &TypedExpr) -> Result<Operand, Error> {
    let element = match &operand.kind {
        TypedExprKind::Variable(name) => {
            let slot = compiler.slot(name)?;
            ElementAddress::Fixed {
                width: slot.width(),
                base: slot.base,
                offset: slot.offset,
            }
        }
        TypedExprKind::Index { name, index } => gen_element_address(compiler, name, index)?,
        _ => return gen_expression(compiler, operand),
    };

    let target = compiler.new_register();
    match element {
        ElementAddress::Fixed { base, offset, .. } => {
            compiler.emit(Operation::Immediate(ImmediateOp::AddI, base, offset, target))
        }
        ElementAddress::Computed { base, offset, .. } => {
            compiler.emit(Operation::Arithmetic(ArithmeticOp::Add, base, offset, target))
        }
    }

    Ok(Operand::Register(target))
}

fn element_size(data_type: DataType) -> i64 {
    match width_of(data_type) {
        Width::Byte => 1,
        Width::Word if data_type == DataType::Float => 8,
        Width::Word => 4,
    }
}

/// Emits a full call sequence and returns the register holding the result.
///
/// Arguments are evaluated before any of them is stored, so nested calls
/// cannot overwrite the outgoing parameter area. The callee's frame starts
/// at `rfp` plus the caller's frame size.
pub fn gen_call(compiler: &mut Compiler, call: &TypedCall) -> Result<Register, Error> {
    let function = compiler.functions.get(&call.name).cloned().ok_or_else(|| {
        Error::new(
            ErrorImpl::InternalError {
                message: format!("call to function \"{}\" before its definition", call.name),
            },
            Span::null(),
        )
    })?;

    let mut values = Vec::with_capacity(call.arguments.len());
    for argument in &call.arguments {
        let operand = gen_expression(compiler, argument)?;
        values.push(into_register(compiler, operand));
    }

    compiler.sync_stack_pointer();
    for (value, (data_type, offset)) in values.into_iter().zip(&function.params) {
        compiler.emit(store(width_of(*data_type), value, Register::Rsp, *offset));
    }

    let return_address = compiler.new_register();
    compiler.emit(Operation::Immediate(ImmediateOp::AddI, Register::Rpc, CALL_RETURN_DISTANCE, return_address));
    compiler.emit(store(Width::Word, return_address, Register::Rsp, RETURN_ADDRESS_OFFSET));
    compiler.emit(store(Width::Word, Register::Rsp, Register::Rsp, SAVED_RSP_OFFSET));
    compiler.emit(store(Width::Word, Register::Rfp, Register::Rsp, SAVED_RFP_OFFSET));
    compiler.emit(Operation::JumpI(function.label));

    let result = compiler.new_register();
    compiler.emit(load(Width::Word, Register::Rsp, RETURN_VALUE_OFFSET, result));

    Ok(result)
}

fn gen_unary(compiler: &mut Compiler, operator: UnaryOperator, value: Operand) -> Result<Operand, Error> {
    Ok(match (operator, value) {
        (UnaryOperator::Plus | UnaryOperator::Hash, value) => value,
        (UnaryOperator::Test, value) => normalize(compiler, value),
        (UnaryOperator::Minus, Operand::Constant(constant)) => Operand::Constant(constant.wrapping_neg()),
        (UnaryOperator::Minus, Operand::Register(register)) => {
            let target = compiler.new_register();
            compiler.emit(Operation::Immediate(ImmediateOp::MultI, register, -1, target));
            Operand::Register(target)
        }
        (UnaryOperator::Not, Operand::Constant(constant)) => Operand::Constant(i64::from(constant == 0)),
        (UnaryOperator::Not, Operand::Register(register)) => {
            let zero = compiler.new_register();
            compiler.emit(Operation::LoadI(0, zero));
            let target = compiler.new_register();
            compiler.emit(Operation::Compare(CompareOp::Eq, register, zero, target));
            Operand::Register(target)
        }
        (UnaryOperator::Address | UnaryOperator::Dereference, _) => {
            return Err(Error::new(
                ErrorImpl::InternalError {
                    message: format!("operator \"{}\" needs its operand unevaluated", operator.as_str()),
                },
                Span::null(),
            ))
        }
    })
}

fn compare_op(operator: BinaryOperator) -> Option<CompareOp> {
    match operator {
        BinaryOperator::Less => Some(CompareOp::Lt),
        BinaryOperator::LessEquals => Some(CompareOp::Le),
        BinaryOperator::Equals => Some(CompareOp::Eq),
        BinaryOperator::GreaterEquals => Some(CompareOp::Ge),
        BinaryOperator::Greater => Some(CompareOp::Gt),
        BinaryOperator::NotEquals => Some(CompareOp::Ne),
        _ => None,
    }
}

/// Folds two constants; `None` when the result is not defined (division by zero).
fn fold(operator: BinaryOperator, left: i64, right: i64) -> Option<i64> {
    if let Some(compare) = compare_op(operator) {
        return Some(i64::from(compare.fold(left, right)));
    }

    match operator {
        BinaryOperator::Add => Some(left.wrapping_add(right)),
        BinaryOperator::Subtract => Some(left.wrapping_sub(right)),
        BinaryOperator::Multiply => Some(left.wrapping_mul(right)),
        BinaryOperator::Divide => left.checked_div(right),
        BinaryOperator::Modulo => left.checked_rem(right),
        BinaryOperator::And => Some(i64::from(left != 0 && right != 0)),
        BinaryOperator::Or => Some(i64::from(left != 0 || right != 0)),
        BinaryOperator::BitOr => Some(left | right),
        BinaryOperator::BitXor => Some(left ^ right),
        BinaryOperator::BitAnd => Some(left & right),
        _ => None,
    }
}

fn gen_binary(compiler: &mut Compiler, operator: BinaryOperator, left: Operand, right: Operand) -> Result<Operand, Error> {
    if let (Operand::Constant(left), Operand::Constant(right)) = (left, right) {
        if let Some(value) = fold(operator, left, right) {
            return Ok(Operand::Constant(value));
        }
    }

    if operator.is_logical() {
        return Ok(gen_logical(compiler, operator, left, right));
    }

    if let Some(compare) = compare_op(operator) {
        let left = into_register(compiler, left);
        let right = into_register(compiler, right);
        let target = compiler.new_register();
        compiler.emit(Operation::Compare(compare, left, right, target));
        return Ok(Operand::Register(target));
    }

    let immediate = match (operator, left, right) {
        (BinaryOperator::Add, Operand::Register(register), Operand::Constant(constant))
        | (BinaryOperator::Add, Operand::Constant(constant), Operand::Register(register)) => {
            Some((ImmediateOp::AddI, register, constant))
        }
        (BinaryOperator::Multiply, Operand::Register(register), Operand::Constant(constant))
        | (BinaryOperator::Multiply, Operand::Constant(constant), Operand::Register(register)) => {
            Some((ImmediateOp::MultI, register, constant))
        }
        (BinaryOperator::Subtract, Operand::Register(register), Operand::Constant(constant)) => {
            Some((ImmediateOp::SubI, register, constant))
        }
        (BinaryOperator::Divide, Operand::Register(register), Operand::Constant(constant)) if constant != 0 => {
            Some((ImmediateOp::DivI, register, constant))
        }
        _ => None,
    };

    if let Some((op, register, constant)) = immediate {
        let target = compiler.new_register();
        compiler.emit(Operation::Immediate(op, register, constant, target));
        return Ok(Operand::Register(target));
    }

    let left = into_register(compiler, left);
    let right = into_register(compiler, right);

    let op = match operator {
        BinaryOperator::Add => ArithmeticOp::Add,
        BinaryOperator::Subtract => ArithmeticOp::Sub,
        BinaryOperator::Multiply => ArithmeticOp::Mult,
        BinaryOperator::Divide => ArithmeticOp::Div,
        BinaryOperator::BitOr => ArithmeticOp::Or,
        BinaryOperator::BitXor => ArithmeticOp::Xor,
        BinaryOperator::BitAnd => ArithmeticOp::And,
        BinaryOperator::Modulo => {
            // a - (a / b) * b
            let quotient = compiler.new_register();
            compiler.emit(Operation::Arithmetic(ArithmeticOp::Div, left, right, quotient));
            let product = compiler.new_register();
            compiler.emit(Operation::Arithmetic(ArithmeticOp::Mult, quotient, right, product));
            let target = compiler.new_register();
            compiler.emit(Operation::Arithmetic(ArithmeticOp::Sub, left, product, target));
            return Ok(Operand::Register(target));
        }
        other => {
            return Err(Error::new(
                ErrorImpl::InternalError {
                    message: format!("operator \"{}\" has no arithmetic lowering", other.as_str()),
                },
                Span::null(),
            ))
        }
    };

    let target = compiler.new_register();
    compiler.emit(Operation::Arithmetic(op, left, right, target));
    Ok(Operand::Register(target))
}

/// Maps a value to 0 or 1.
fn normalize(compiler: &mut Compiler, operand: Operand) -> Operand {
    match operand {
        Operand::Constant(constant) => Operand::Constant(i64::from(constant != 0)),
        Operand::Register(register) => {
            let zero = compiler.new_register();
            compiler.emit(Operation::LoadI(0, zero));
            let target = compiler.new_register();
            compiler.emit(Operation::Compare(CompareOp::Ne, register, zero, target));
            Operand::Register(target)
        }
    }
}

/// `&&` and `||` over already evaluated operands; both sides always run.
fn gen_logical(compiler: &mut Compiler, operator: BinaryOperator, left: Operand, right: Operand) -> Operand {
    let is_and = operator == BinaryOperator::And;
    let left = normalize(compiler, left);
    let right = normalize(compiler, right);

    match (left, right) {
        // A constant either decides the result or is the identity.
        (Operand::Constant(constant), other) | (other, Operand::Constant(constant)) => match (is_and, constant) {
            (true, 0) => Operand::Constant(0),
            (false, 1) => Operand::Constant(1),
            _ => other,
        },
        (Operand::Register(left), Operand::Register(right)) => {
            let op = if is_and { ArithmeticOp::And } else { ArithmeticOp::Or };
            let target = compiler.new_register();
            compiler.emit(Operation::Arithmetic(op, left, right, target));
            Operand::Register(target)
        }
    }
}

fn gen_ternary(
    compiler: &mut Compiler,
    condition: &TypedExpr,
    then_value: &TypedExpr,
    else_value: &TypedExpr,
) -> Result<Operand, Error> {
    let condition = match gen_expression(compiler, condition)? {
        Operand::Constant(0) => return gen_expression(compiler, else_value),
        Operand::Constant(_) => return gen_expression(compiler, then_value),
        Operand::Register(register) => register,
    };

    let taken = compiler.new_label();
    let not_taken = compiler.new_label();
    let end = compiler.new_label();
    let result = compiler.new_register();

    compiler.emit(Operation::Cbr(condition, taken, not_taken));

    compiler.emit_label(taken);
    let value = gen_expression(compiler, then_value)?;
    let value = into_register(compiler, value);
    compiler.emit(Operation::I2i(value, result));
    compiler.emit(Operation::JumpI(end));

    compiler.emit_label(not_taken);
    let value = gen_expression(compiler, else_value)?;
    let value = into_register(compiler, value);
    compiler.emit(Operation::I2i(value, result));

    compiler.emit_label(end);
    Ok(Operand::Register(result))
}

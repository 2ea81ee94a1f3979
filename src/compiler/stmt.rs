use tracing::{trace, warn};

use crate::{
    ast::{statements::ShiftDirection, types::DataType},
    errors::errors::Error,
    type_checker::typed_ast::{TypedBlock, TypedExpr, TypedLValue, TypedStmt},
    Span,
};

use super::{
    compiler::{store, Binding, Compiler, LoopLabels, Slot, RETURN_VALUE_OFFSET},
    expr::{gen_call, gen_element_address, gen_expression, into_register, ElementAddress, Operand},
    iloc::{ImmediateOp, Label, Operation, Register, Width},
};

/// Generates every command of `block` in the current frame.
pub fn gen_block(compiler: &mut Compiler, block: &TypedBlock) -> Result<(), Error> {
    for statement in &block.statements {
        gen_statement(compiler, statement)?;
    }
    Ok(())
}

/// Generates `block` inside its own scope.
fn gen_scoped_block(compiler: &mut Compiler, block: &TypedBlock) -> Result<(), Error> {
    compiler.slots.enter_scope();
    let result = gen_block(compiler, block);
    compiler.slots.exit_scope();
    result
}

pub fn gen_statement(compiler: &mut Compiler, statement: &TypedStmt) -> Result<(), Error> {
    match statement {
        TypedStmt::Declare {
            name,
            data_type,
            size,
            initializer,
            span,
        } => gen_declare(compiler, name, *data_type, *size, initializer.as_ref(), span),
        TypedStmt::Assign { target, value } => {
            if target.data_type() == DataType::String {
                trace!(target = target.name(), "string assignment not lowered");
                return Ok(());
            }

            let value = gen_expression(compiler, value)?;
            let value = into_register(compiler, value);
            gen_store(compiler, target, value)
        }
        TypedStmt::Shift {
            target,
            direction,
            amount,
        } => {
            let (address, current) = gen_load_target(compiler, target)?;
            let op = match direction {
                ShiftDirection::Left => ImmediateOp::LshiftI,
                ShiftDirection::Right => ImmediateOp::RshiftI,
            };
            let shifted = compiler.new_register();
            compiler.emit(Operation::Immediate(op, current, i64::from(*amount), shifted));
            compiler.emit(address.store(shifted));
            compiler.demote(target.name());
            Ok(())
        }
        TypedStmt::Input { target } => {
            // No code: the value comes from outside and is only known in memory.
            compiler.demote(target.name());
            Ok(())
        }
        TypedStmt::Output { .. } => Ok(()),
        TypedStmt::Call(call) => gen_call(compiler, call).map(|_| ()),
        TypedStmt::Return { value } => {
            let value = gen_expression(compiler, value)?;
            let value = into_register(compiler, value);
            compiler.emit(store(Width::Word, value, Register::Rfp, RETURN_VALUE_OFFSET));
            compiler.gen_epilogue();
            Ok(())
        }
        TypedStmt::Break => gen_loop_jump(compiler, "break", |labels| labels.break_to),
        TypedStmt::Continue => gen_loop_jump(compiler, "continue", |labels| labels.continue_to),
        TypedStmt::If {
            condition,
            then_block,
            else_block,
        } => gen_if(compiler, condition, then_block, else_block.as_ref()),
        TypedStmt::While { condition, body } => {
            demote_assigned(compiler, statement);

            let check = compiler.new_label();
            let exit = compiler.new_label();

            compiler.emit_label(check);
            gen_branch(compiler, condition, exit)?;

            compiler.loops.push(LoopLabels {
                continue_to: check,
                break_to: exit,
            });
            let body = gen_scoped_block(compiler, body);
            compiler.loops.pop();
            body?;

            compiler.emit(Operation::JumpI(check));
            compiler.emit_label(exit);
            Ok(())
        }
        TypedStmt::For {
            init,
            condition,
            step,
            body,
        } => {
            gen_statement(compiler, init)?;
            demote_assigned(compiler, statement);

            let check = compiler.new_label();
            let next = compiler.new_label();
            let exit = compiler.new_label();

            compiler.emit_label(check);
            gen_branch(compiler, condition, exit)?;

            compiler.loops.push(LoopLabels {
                continue_to: next,
                break_to: exit,
            });
            let body = gen_scoped_block(compiler, body);
            compiler.loops.pop();
            body?;

            compiler.emit_label(next);
            gen_statement(compiler, step)?;
            compiler.emit(Operation::JumpI(check));
            compiler.emit_label(exit);
            Ok(())
        }
        TypedStmt::Block(block) => gen_scoped_block(compiler, block),
    }
}

fn gen_declare(
    compiler: &mut Compiler,
    name: &str,
    data_type: DataType,
    size: u32,
    initializer: Option<&TypedExpr>,
    span: &Span,
) -> Result<(), Error> {
    let offset = compiler.reserve_local(size);
    let slot = Slot {
        base: Register::Rfp,
        offset,
        data_type,
        binding: Binding::Memory,
        declared_at: span.clone(),
    };
    let width = slot.width();
    compiler.slots.declare(name, slot, span)?;

    let value = match initializer {
        Some(value) if data_type != DataType::String => gen_expression(compiler, value)?,
        _ => return Ok(()),
    };

    let register = into_register(compiler, value);
    compiler.emit(store(width, register, Register::Rfp, offset));

    if let (Operand::Constant(constant), Some(slot)) = (value, compiler.slots.lookup_mut(name)) {
        slot.binding = Binding::Constant(constant);
    }

    Ok(())
}

/// Resolves the address of an assignment target.
fn gen_target_address(compiler: &mut Compiler, target: &TypedLValue) -> Result<ElementAddress, Error> {
    match target {
        TypedLValue::Variable { name, .. } => {
            let slot = compiler.slot(name)?;
            Ok(ElementAddress::Fixed {
                width: slot.width(),
                base: slot.base,
                offset: slot.offset,
            })
        }
        TypedLValue::Indexed { name, index, .. } => gen_element_address(compiler, name, index),
    }
}

fn gen_store(compiler: &mut Compiler, target: &TypedLValue, value: Register) -> Result<(), Error> {
    let address = gen_target_address(compiler, target)?;
    compiler.emit(address.store(value));
    compiler.demote(target.name());
    Ok(())
}

/// Loads the current value of a target, keeping its address for the store back.
fn gen_load_target(compiler: &mut Compiler, target: &TypedLValue) -> Result<(ElementAddress, Register), Error> {
    let address = gen_target_address(compiler, target)?;
    let current = compiler.new_register();
    compiler.emit(address.load(current));
    Ok((address, current))
}

/// Falls through when `condition` holds and jumps to `otherwise` when it does not.
fn gen_branch(compiler: &mut Compiler, condition: &TypedExpr, otherwise: Label) -> Result<(), Error> {
    match gen_expression(compiler, condition)? {
        Operand::Constant(0) => compiler.emit(Operation::JumpI(otherwise)),
        Operand::Constant(_) => {}
        Operand::Register(register) => {
            let taken = compiler.new_label();
            compiler.emit(Operation::Cbr(register, taken, otherwise));
            compiler.emit_label(taken);
        }
    }
    Ok(())
}

fn gen_if(
    compiler: &mut Compiler,
    condition: &TypedExpr,
    then_block: &TypedBlock,
    else_block: Option<&TypedBlock>,
) -> Result<(), Error> {
    let otherwise = compiler.new_label();
    gen_branch(compiler, condition, otherwise)?;
    gen_scoped_block(compiler, then_block)?;

    match else_block {
        Some(else_block) => {
            let end = compiler.new_label();
            compiler.emit(Operation::JumpI(end));
            compiler.emit_label(otherwise);
            gen_scoped_block(compiler, else_block)?;
            compiler.emit_label(end);
        }
        None => compiler.emit_label(otherwise),
    }

    Ok(())
}

fn gen_loop_jump(compiler: &mut Compiler, keyword: &str, target: impl Fn(&LoopLabels) -> Label) -> Result<(), Error> {
    match compiler.loops.last() {
        Some(labels) => {
            let label = target(labels);
            compiler.emit(Operation::JumpI(label));
        }
        None => {
            warn!("\"{}\" outside of a loop has no effect", keyword);
            compiler.emit(Operation::Nop);
        }
    }
    Ok(())
}

/// Drops the compile-time value of every variable the loop may store to.
fn demote_assigned(compiler: &mut Compiler, statement: &TypedStmt) {
    let mut names = vec![];
    statement.collect_assigned(&mut names);

    for name in names {
        compiler.demote(&name);
    }
}

//! Main code generation module.
//!
//! This module contains the [`Compiler`] structure, which walks a typed
//! program and emits ILOC. It owns the register and label allocators, the
//! frame bookkeeping for locals and globals, and the promise lines that are
//! filled in once the whole listing is known.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    ast::types::DataType,
    config::{CodegenConfig, StaticSegmentBase},
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        scope::{ScopeEntry, ScopeStack},
        typed_ast::{TypedFunction, TypedGlobal, TypedItem, TypedProgram},
    },
    Span,
};

use super::{
    iloc::{CodeLine, IlocProgram, ImmediateOp, Instruction, Label, Operation, Register, Voucher, Width},
    stmt::gen_block,
};

/// Frame offset of the return address.
pub const RETURN_ADDRESS_OFFSET: i64 = 0;
/// Frame offset of the caller's `rsp`.
pub const SAVED_RSP_OFFSET: i64 = 4;
/// Frame offset of the caller's `rfp`.
pub const SAVED_RFP_OFFSET: i64 = 8;
/// Frame offset of the return value.
pub const RETURN_VALUE_OFFSET: i64 = 12;
/// Frame offset of the first parameter.
pub const FRAME_HEADER_SIZE: i64 = 16;

const STATIC_SEGMENT: Voucher = Voucher(0);
const MAIN_JUMP: Voucher = Voucher(1);

/// What the generator knows about a slot's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Holds a value known at compile time.
    Constant(i64),
    /// Only memory knows.
    Memory,
}

/// A variable or vector placed in a frame or in the static segment.
#[derive(Debug, Clone)]
pub struct Slot {
    /// `rfp` for locals and parameters, `rbss` for globals.
    pub base: Register,
    pub offset: i64,
    pub data_type: DataType,
    pub binding: Binding,
    pub declared_at: Span,
}

impl ScopeEntry for Slot {
    fn declared_at(&self) -> &Span {
        &self.declared_at
    }
}

impl Slot {
    pub fn width(&self) -> Width {
        width_of(self.data_type)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub label: Label,
    /// Type and frame offset of each parameter.
    pub params: Vec<(DataType, i64)>,
}

/// Targets of `break` and `continue` in the innermost loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopLabels {
    pub continue_to: Label,
    pub break_to: Label,
}

pub fn width_of(data_type: DataType) -> Width {
    match data_type {
        DataType::Bool | DataType::Char => Width::Byte,
        _ => Width::Word,
    }
}

/// The code generator state.
pub struct Compiler<'a> {
    config: &'a CodegenConfig,
    code: Vec<CodeLine>,
    next_register: u32,
    next_label: u32,

    pub functions: HashMap<String, FunctionInfo>,
    pub slots: ScopeStack<Slot>,
    pub loops: Vec<LoopLabels>,

    /// Next free offset in the current frame.
    frame_offset: i64,
    /// Next free offset in the static segment.
    static_offset: i64,
    main_label: Option<Label>,
}

/// Generates the ILOC listing for a checked program.
///
/// # Arguments
///
/// * `program` - The typed program produced by semantic analysis
/// * `config` - Stack base and static segment placement
///
/// # Returns
///
/// The finished listing, with every promise paid.
pub fn compile(program: &TypedProgram, config: &CodegenConfig) -> Result<IlocProgram, Error> {
    let mut compiler = Compiler::new(config);

    for item in &program.items {
        match item {
            TypedItem::Global(global) => compiler.gen_global(global)?,
            TypedItem::Function(function) => compiler.gen_function(function)?,
        }
    }

    compiler.finish()
}

impl<'a> Compiler<'a> {
    /// Creates a compiler with the preamble already emitted.
    ///
    /// The preamble sets up `rfp`, `rsp` and `rbss`, builds a frame whose
    /// return address points at the trailing `halt`, and jumps to `main`.
    pub fn new(config: &'a CodegenConfig) -> Self {
        let mut compiler = Compiler {
            config,
            code: vec![],
            next_register: 0,
            next_label: 0,
            functions: HashMap::new(),
            slots: ScopeStack::new(),
            loops: vec![],
            frame_offset: FRAME_HEADER_SIZE,
            static_offset: 0,
            main_label: None,
        };

        let return_address = compiler.new_register();
        compiler.emit(Operation::LoadI(config.stack_base, Register::Rfp));
        compiler.emit(Operation::LoadI(config.stack_base, Register::Rsp));
        compiler.code.push(CodeLine::Promise(STATIC_SEGMENT));
        // Index of the `halt` below.
        compiler.emit(Operation::LoadI(8, return_address));
        compiler.emit(store(Width::Word, return_address, Register::Rsp, RETURN_ADDRESS_OFFSET));
        compiler.emit(store(Width::Word, Register::Rsp, Register::Rsp, SAVED_RSP_OFFSET));
        compiler.emit(store(Width::Word, Register::Rfp, Register::Rsp, SAVED_RFP_OFFSET));
        compiler.code.push(CodeLine::Promise(MAIN_JUMP));
        compiler.emit(Operation::Halt);

        compiler
    }

    pub fn new_register(&mut self) -> Register {
        let register = Register::R(self.next_register);
        self.next_register += 1;
        register
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, operation: Operation) {
        self.code.push(CodeLine::Deliver(Instruction::new(operation)));
    }

    /// Emits `label: nop`.
    pub fn emit_label(&mut self, label: Label) {
        self.code.push(CodeLine::Deliver(Instruction::labelled(label, Operation::Nop)));
    }

    /// Reserves `size` bytes in the current frame and returns their offset.
    ///
    /// The slot is claimed at run time with `addI rsp, size => rsp`.
    pub fn reserve_local(&mut self, size: u32) -> i64 {
        let offset = self.frame_offset;
        self.frame_offset += i64::from(size);
        self.emit(Operation::Immediate(ImmediateOp::AddI, Register::Rsp, i64::from(size), Register::Rsp));
        offset
    }

    /// Points `rsp` just past every slot of the current frame.
    ///
    /// Declarations in skipped branches or repeated loop bodies leave `rsp`
    /// away from the frame end, so each call sequence starts from here.
    pub fn sync_stack_pointer(&mut self) {
        self.emit(Operation::Immediate(ImmediateOp::AddI, Register::Rfp, self.frame_offset, Register::Rsp));
    }

    /// Forgets any compile-time value of `name`.
    pub fn demote(&mut self, name: &str) {
        if let Some(slot) = self.slots.lookup_mut(name) {
            slot.binding = Binding::Memory;
        }
    }

    pub fn slot(&self, name: &str) -> Result<&Slot, Error> {
        self.slots.resolve(name, &Span::null())
    }

    fn gen_global(&mut self, global: &TypedGlobal) -> Result<(), Error> {
        let slot = Slot {
            base: Register::Rbss,
            offset: self.static_offset,
            data_type: global.data_type,
            binding: Binding::Memory,
            declared_at: global.span.clone(),
        };
        debug!(name = %global.name, offset = slot.offset, size = global.size, "placed global");

        self.static_offset += i64::from(global.size);
        self.slots.declare(&global.name, slot, &global.span)
    }

    fn gen_function(&mut self, function: &TypedFunction) -> Result<(), Error> {
        let label = self.new_label();

        let mut offset = FRAME_HEADER_SIZE;
        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            params.push((param.data_type, offset));
            offset += i64::from(param.size);
        }

        // Registered before the body so recursive calls find it.
        self.functions.insert(
            function.name.clone(),
            FunctionInfo {
                label,
                params: params.clone(),
            },
        );
        if function.name == "main" {
            self.main_label = Some(label);
        }

        self.emit_label(label);
        self.emit(Operation::I2i(Register::Rsp, Register::Rfp));
        self.emit(Operation::Immediate(ImmediateOp::AddI, Register::Rsp, offset, Register::Rsp));

        self.slots.enter_scope();
        self.frame_offset = offset;
        for (param, (data_type, param_offset)) in function.params.iter().zip(params) {
            self.slots.declare(
                &param.name,
                Slot {
                    base: Register::Rfp,
                    offset: param_offset,
                    data_type,
                    binding: Binding::Memory,
                    declared_at: param.span.clone(),
                },
                &param.span,
            )?;
        }

        gen_block(self, &function.body)?;

        self.slots.exit_scope();
        self.gen_epilogue();

        debug!(function = %function.name, %label, frame = self.frame_offset, "generated function");
        Ok(())
    }

    /// Restores the caller's frame and jumps back to it.
    pub fn gen_epilogue(&mut self) {
        let return_address = self.new_register();
        let saved_rsp = self.new_register();
        let saved_rfp = self.new_register();

        self.emit(load(Width::Word, Register::Rfp, RETURN_ADDRESS_OFFSET, return_address));
        self.emit(load(Width::Word, Register::Rfp, SAVED_RSP_OFFSET, saved_rsp));
        self.emit(load(Width::Word, Register::Rfp, SAVED_RFP_OFFSET, saved_rfp));
        self.emit(Operation::I2i(saved_rsp, Register::Rsp));
        self.emit(Operation::I2i(saved_rfp, Register::Rfp));
        self.emit(Operation::Jump(return_address));
    }

    /// Pays the outstanding promises and returns the listing.
    fn finish(self) -> Result<IlocProgram, Error> {
        let static_base = match self.config.static_segment {
            StaticSegmentBase::CodeLength => self.code.len() as i64,
            StaticSegmentBase::Fixed(address) => address,
        };

        let main_jump = match self.main_label {
            Some(label) => Operation::JumpI(label),
            None => {
                warn!("program has no main function; the preamble falls through to halt");
                Operation::Nop
            }
        };

        let mut payments = HashMap::from([
            (STATIC_SEGMENT, Operation::LoadI(static_base, Register::Rbss)),
            (MAIN_JUMP, main_jump),
        ]);

        let instructions = self
            .code
            .into_iter()
            .map(|line| match line {
                CodeLine::Deliver(instruction) => Ok(instruction),
                CodeLine::Promise(voucher) => payments.remove(&voucher).map(Instruction::new).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::InternalError {
                            message: format!("unpaid promise {:?}", voucher),
                        },
                        Span::null(),
                    )
                }),
            })
            .collect::<Result<Vec<Instruction>, Error>>()?;

        Ok(IlocProgram::new(instructions))
    }
}

pub fn load(width: Width, base: Register, offset: i64, target: Register) -> Operation {
    Operation::LoadAI(width, base, offset, target)
}

pub fn store(width: Width, source: Register, base: Register, offset: i64) -> Operation {
    Operation::StoreAI(width, source, base, offset)
}

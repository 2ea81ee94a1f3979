//! ILOC instruction model.
//!
//! Registers, labels and operations with their textual syntax, plus the
//! promise lines the generator back-patches once the whole program is known.

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Rfp,
    Rsp,
    Rbss,
    Rpc,
    R(u32),
}

impl Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Rfp => write!(f, "rfp"),
            Register::Rsp => write!(f, "rsp"),
            Register::Rbss => write!(f, "rbss"),
            Register::Rpc => write!(f, "rpc"),
            Register::R(number) => write!(f, "r{}", number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Three-register arithmetic and logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mult,
    Div,
    And,
    Or,
    Xor,
}

impl ArithmeticOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mult => "mult",
            ArithmeticOp::Div => "div",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Xor => "xor",
        }
    }
}

/// Register-immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateOp {
    AddI,
    SubI,
    MultI,
    DivI,
    LshiftI,
    RshiftI,
}

impl ImmediateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImmediateOp::AddI => "addI",
            ImmediateOp::SubI => "subI",
            ImmediateOp::MultI => "multI",
            ImmediateOp::DivI => "divI",
            ImmediateOp::LshiftI => "lshiftI",
            ImmediateOp::RshiftI => "rshiftI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "cmp_LT",
            CompareOp::Le => "cmp_LE",
            CompareOp::Eq => "cmp_EQ",
            CompareOp::Ge => "cmp_GE",
            CompareOp::Gt => "cmp_GT",
            CompareOp::Ne => "cmp_NE",
        }
    }

    /// Evaluates the comparison at compile time.
    pub fn fold(&self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Ge => left >= right,
            CompareOp::Gt => left > right,
            CompareOp::Ne => left != right,
        }
    }
}

/// Width of a memory access: a word, or a single byte (`c` forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Byte,
}

impl Width {
    fn prefix(&self) -> &'static str {
        match self {
            Width::Word => "",
            Width::Byte => "c",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    LoadI(i64, Register),
    LoadAI(Width, Register, i64, Register),
    LoadAO(Width, Register, Register, Register),
    StoreAI(Width, Register, Register, i64),
    StoreAO(Width, Register, Register, Register),
    I2i(Register, Register),
    Arithmetic(ArithmeticOp, Register, Register, Register),
    Immediate(ImmediateOp, Register, i64, Register),
    Compare(CompareOp, Register, Register, Register),
    Cbr(Register, Label, Label),
    JumpI(Label),
    Jump(Register),
    Nop,
    Halt,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::LoadI(constant, target) => write!(f, "loadI {} => {}", constant, target),
            Operation::LoadAI(width, base, offset, target) => {
                write!(f, "{}loadAI {}, {} => {}", width.prefix(), base, offset, target)
            }
            Operation::LoadAO(width, base, offset, target) => {
                write!(f, "{}loadAO {}, {} => {}", width.prefix(), base, offset, target)
            }
            Operation::StoreAI(width, source, base, offset) => {
                write!(f, "{}storeAI {} => {}, {}", width.prefix(), source, base, offset)
            }
            Operation::StoreAO(width, source, base, offset) => {
                write!(f, "{}storeAO {} => {}, {}", width.prefix(), source, base, offset)
            }
            Operation::I2i(source, target) => write!(f, "i2i {} => {}", source, target),
            Operation::Arithmetic(op, left, right, target) => {
                write!(f, "{} {}, {} => {}", op.as_str(), left, right, target)
            }
            Operation::Immediate(op, source, constant, target) => {
                write!(f, "{} {}, {} => {}", op.as_str(), source, constant, target)
            }
            Operation::Compare(op, left, right, target) => {
                write!(f, "{} {}, {} -> {}", op.as_str(), left, right, target)
            }
            Operation::Cbr(condition, taken, not_taken) => write!(f, "cbr {} -> {}, {}", condition, taken, not_taken),
            Operation::JumpI(label) => write!(f, "jumpI -> {}", label),
            Operation::Jump(register) => write!(f, "jump -> {}", register),
            Operation::Nop => write!(f, "nop"),
            Operation::Halt => write!(f, "halt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub label: Option<Label>,
    pub operation: Operation,
}

impl Instruction {
    pub fn new(operation: Operation) -> Self {
        Instruction { label: None, operation }
    }

    pub fn labelled(label: Label, operation: Operation) -> Self {
        Instruction {
            label: Some(label),
            operation,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{}: {}", label, self.operation),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Names a line whose instruction is only known after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Voucher(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeLine {
    Deliver(Instruction),
    Promise(Voucher),
}

/// A finished listing, one instruction per line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IlocProgram {
    instructions: Vec<Instruction>,
}

impl IlocProgram {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        IlocProgram { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Display for IlocProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

//! Instruction decoding.
//!
//! Field extraction is positional and identical for every opcode; only the
//! immediate depends on the instruction format. Fields an opcode does not
//! use are still extracted and simply ignored by the executor.

use std::fmt;

/// A general-purpose register index.
///
/// Only constructible from a 5-bit field, so the index is always 0..=31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    pub const X0: Register = Register(0);
    pub const COUNT: usize = 32;

    pub fn from_u32(v: u32) -> Self {
        Register((v & 0x1F) as u8)
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

pub const OPCODE_LUI: u8 = 0b0110111;
pub const OPCODE_AUIPC: u8 = 0b0010111;
pub const OPCODE_JAL: u8 = 0b1101111;
pub const OPCODE_JALR: u8 = 0b1100111;
pub const OPCODE_OP_IMM: u8 = 0b0010011;
pub const OPCODE_OP: u8 = 0b0110011;

pub const FUNCT7_ADD: u8 = 0b0000000;
pub const FUNCT7_SUB: u8 = 0b0100000;

/// Major opcode (bits 6:0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Lui,
    Auipc,
    Jal,
    Jalr,
    /// I-type ALU (ADDI etc)
    OpImm,
    /// R-type ALU (ADD, SUB etc)
    Op,
    /// Any opcode this core does not model.
    Unsupported(u8),
}

impl Opcode {
    pub fn from_bits(bits: u32) -> Self {
        match (bits & 0x7F) as u8 {
            OPCODE_LUI => Opcode::Lui,
            OPCODE_AUIPC => Opcode::Auipc,
            OPCODE_JAL => Opcode::Jal,
            OPCODE_JALR => Opcode::Jalr,
            OPCODE_OP_IMM => Opcode::OpImm,
            OPCODE_OP => Opcode::Op,
            other => Opcode::Unsupported(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Opcode::Lui => OPCODE_LUI,
            Opcode::Auipc => OPCODE_AUIPC,
            Opcode::Jal => OPCODE_JAL,
            Opcode::Jalr => OPCODE_JALR,
            Opcode::OpImm => OPCODE_OP_IMM,
            Opcode::Op => OPCODE_OP,
            Opcode::Unsupported(bits) => bits,
        }
    }
}

/// ALU operation selector (bits 14:12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funct3 {
    AddSub,
    Sll,
    Slt,
    Sltu,
    Xor,
    SrlSra,
    Or,
    And,
}

impl Funct3 {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0b000 => Funct3::AddSub,
            0b001 => Funct3::Sll,
            0b010 => Funct3::Slt,
            0b011 => Funct3::Sltu,
            0b100 => Funct3::Xor,
            0b101 => Funct3::SrlSra,
            0b110 => Funct3::Or,
            _ => Funct3::And,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Funct3::AddSub => 0b000,
            Funct3::Sll => 0b001,
            Funct3::Slt => 0b010,
            Funct3::Sltu => 0b011,
            Funct3::Xor => 0b100,
            Funct3::SrlSra => 0b101,
            Funct3::Or => 0b110,
            Funct3::And => 0b111,
        }
    }
}

/// One decoded instruction word. Lives for a single fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub raw: u32,
    pub opcode: Opcode,
    pub rd: Register,
    pub funct3: Funct3,
    pub rs1: Register,
    pub rs2: Register,
    pub funct7: u8,
    pub imm: i32,
}

pub fn decode(insn: u32) -> DecodedInstruction {
    let opcode = Opcode::from_bits(insn);
    let rd = Register::from_u32(insn >> 7);
    let funct3 = Funct3::from_bits(insn >> 12);
    let rs1 = Register::from_u32(insn >> 15);
    let rs2 = Register::from_u32(insn >> 20);
    let funct7 = ((insn >> 25) & 0x7F) as u8;

    let imm = match opcode {
        // I-type: imm[11:0], sign-extended from bit 31
        Opcode::OpImm | Opcode::Jalr => (insn as i32) >> 20,
        // U-type: imm[31:12], already in place
        Opcode::Lui | Opcode::Auipc => (insn & 0xFFFF_F000) as i32,
        // J-type: imm[20|10:1|11|19:12]
        Opcode::Jal => {
            let bit31 = (insn >> 31) & 1;
            let bit30_21 = (insn >> 21) & 0x3FF;
            let bit20 = (insn >> 20) & 1;
            let bit19_12 = (insn >> 12) & 0xFF;
            let val = (bit31 << 20) | (bit19_12 << 12) | (bit20 << 11) | (bit30_21 << 1);
            ((val as i32) << 11) >> 11
        }
        Opcode::Op | Opcode::Unsupported(_) => 0,
    };

    DecodedInstruction {
        raw: insn,
        opcode,
        rd,
        funct3,
        rs1,
        rs2,
        funct7,
        imm,
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let upper = (self.imm as u32) >> 12;
        match self.opcode {
            Opcode::Lui => write!(f, "lui {}, {:#x}", self.rd, upper),
            Opcode::Auipc => write!(f, "auipc {}, {:#x}", self.rd, upper),
            Opcode::Jal => write!(f, "jal {}, {}", self.rd, self.imm),
            Opcode::Jalr => write!(f, "jalr {}, {}({})", self.rd, self.imm, self.rs1),
            Opcode::OpImm if self.funct3 == Funct3::AddSub => {
                write!(f, "addi {}, {}, {}", self.rd, self.rs1, self.imm)
            }
            Opcode::Op if self.funct3 == Funct3::AddSub && self.funct7 == FUNCT7_ADD => {
                write!(f, "add {}, {}, {}", self.rd, self.rs1, self.rs2)
            }
            Opcode::Op if self.funct3 == Funct3::AddSub && self.funct7 == FUNCT7_SUB => {
                write!(f, "sub {}, {}, {}", self.rd, self.rs1, self.rs2)
            }
            _ => write!(f, "unknown {:#010x}", self.raw),
        }
    }
}

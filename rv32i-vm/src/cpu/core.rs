use crate::decoder::Register;
use crate::memory::{Memory, MemoryError};

use super::types::ExecStats;

/// RV32I hart state: general-purpose registers and program counter.
///
/// `pc` is a word index into [`Memory`], not a byte address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub regs: [u32; 32],
    pub pc: u32,
    /// Discard writes to x0 and read it as zero.
    pub hardwire_x0: bool,
    /// Read rs1 before writing rd in JALR.
    pub jalr_reads_rs1_first: bool,
    pub(crate) stats: ExecStats,
}

impl Cpu {
    /// Create a CPU with zeroed registers and `pc = 0`.
    pub fn new(hardwire_x0: bool) -> Self {
        Self {
            regs: [0; 32],
            pc: 0,
            hardwire_x0,
            jalr_reads_rs1_first: false,
            stats: ExecStats::default(),
        }
    }

    pub fn with_jalr_reads_rs1_first(mut self, enabled: bool) -> Self {
        self.jalr_reads_rs1_first = enabled;
        self
    }

    pub fn read_reg(&self, reg: Register) -> u32 {
        debug_assert!(reg.to_usize() < Register::COUNT);
        if self.hardwire_x0 && reg == Register::X0 {
            0
        } else {
            self.regs[reg.to_usize()]
        }
    }

    pub fn write_reg(&mut self, reg: Register, val: u32) {
        debug_assert!(reg.to_usize() < Register::COUNT);
        if self.hardwire_x0 && reg == Register::X0 {
            return;
        }
        self.regs[reg.to_usize()] = val;
    }

    /// Read the word at `pc` and advance `pc` by one word.
    pub fn fetch(&mut self, memory: &Memory) -> Result<u32, MemoryError> {
        let insn = memory.load_word(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(insn)
    }

    pub fn stats(&self) -> ExecStats {
        self.stats
    }

    /// Zero registers, pc and counters.
    pub fn reset(&mut self) {
        self.regs = [0; 32];
        self.pc = 0;
        self.stats = ExecStats::default();
    }
}

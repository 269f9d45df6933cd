use serde::{Deserialize, Serialize};

/// Default instruction memory size, in 32-bit words.
pub const DEFAULT_MEMORY_WORDS: usize = 1024;

/// Construction-time configuration for an [`Emulator`](crate::emulator::Emulator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Size of the flat instruction memory, in words.
    pub memory_words: usize,
    /// Treat x0 as the architectural constant zero.
    ///
    /// Off by default: x0 is then an ordinary read/write register. Turning it
    /// on gives strict RV32I behavior where writes to x0 are discarded.
    pub hardwire_x0: bool,
    /// Compute the JALR target from rs1 before the link register is written.
    ///
    /// Off by default: the link value is written first, so `jalr x1, 0(x1)`
    /// jumps relative to the new link value. Turning it on gives the RV32I
    /// ordering, which only differs when rd == rs1.
    pub jalr_reads_rs1_first: bool,
}

impl VmConfig {
    pub fn with_memory_words(mut self, words: usize) -> Self {
        self.memory_words = words;
        self
    }

    pub fn with_hardwired_x0(mut self, enabled: bool) -> Self {
        self.hardwire_x0 = enabled;
        self
    }

    pub fn with_jalr_reads_rs1_first(mut self, enabled: bool) -> Self {
        self.jalr_reads_rs1_first = enabled;
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_words: DEFAULT_MEMORY_WORDS,
            hardwire_x0: false,
            jalr_reads_rs1_first: false,
        }
    }
}

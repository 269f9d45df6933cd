use crate::decoder::{DecodedInstruction, Funct3, Opcode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an instruction was executed as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The major opcode is not modelled.
    UnsupportedOpcode(u8),
    /// Known opcode, but the ALU operation is not implemented.
    UnsupportedFunct3 { opcode: Opcode, funct3: Funct3 },
    /// R-type ADD/SUB slot with a funct7 other than ADD or SUB.
    UnsupportedFunct7(u8),
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::UnsupportedOpcode(op) => write!(f, "unsupported opcode {op:#09b}"),
            NoOpReason::UnsupportedFunct3 { opcode, funct3 } => write!(
                f,
                "unsupported funct3 {:#05b} for opcode {:#09b}",
                funct3.bits(),
                opcode.bits()
            ),
            NoOpReason::UnsupportedFunct7(funct7) => write!(f, "unsupported funct7 {funct7:#09b}"),
        }
    }
}

/// Result of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction was carried out.
    Executed(DecodedInstruction),
    /// The instruction was recognised as unsupported and left state unchanged
    /// (apart from the fetch increment of pc).
    Ignored {
        insn: DecodedInstruction,
        reason: NoOpReason,
    },
}

impl StepOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, StepOutcome::Ignored { .. })
    }

    pub fn instruction(&self) -> &DecodedInstruction {
        match self {
            StepOutcome::Executed(insn) | StepOutcome::Ignored { insn, .. } => insn,
        }
    }
}

/// Running counters kept by the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecStats {
    /// Fetch-decode-execute cycles completed.
    pub cycles: u64,
    pub executed: u64,
    pub ignored: u64,
}

impl ExecStats {
    pub(crate) fn record(&mut self, outcome: &StepOutcome) {
        self.cycles += 1;
        if outcome.is_ignored() {
            self.ignored += 1;
        } else {
            self.executed += 1;
        }
    }
}

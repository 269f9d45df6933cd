//! Word-addressed interpreter for a subset of RV32I.
//!
//! Supported instructions: LUI, AUIPC, JAL, JALR, ADDI, ADD and SUB. Every
//! other encoding executes as an observable no-op. The program counter is a
//! word index into a flat instruction memory and a run ends when it leaves
//! that memory.

pub mod config;
pub mod cpu;
pub mod decoder;
pub mod emulator;
pub mod loader;
pub mod memory;
pub mod snapshot;

pub use config::VmConfig;
pub use cpu::{Cpu, ExecStats, NoOpReason, StepOutcome};
pub use decoder::{DecodedInstruction, Register};
pub use emulator::{Emulator, RunExit};
pub use memory::{Memory, MemoryError};

use thiserror::Error;

/// Crate-level errors.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("program of {words} words does not fit in {capacity} words of memory")]
    ProgramTooLarge { words: usize, capacity: usize },

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    SnapshotVersion { expected: String, found: String },

    #[error("snapshot memory digest does not match its contents")]
    SnapshotDigest,

    #[error("snapshot memory holds {found} words but its config declares {expected}")]
    SnapshotSize { expected: usize, found: usize },

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

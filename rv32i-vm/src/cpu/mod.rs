pub mod core;
pub mod execution;
pub mod types;

pub use self::core::Cpu;
pub use types::{ExecStats, NoOpReason, StepOutcome};

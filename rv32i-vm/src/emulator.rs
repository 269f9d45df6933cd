use crate::VmError;
use crate::config::VmConfig;
use crate::cpu::{Cpu, ExecStats, StepOutcome};
use crate::decoder::Register;
use crate::memory::Memory;
use crate::snapshot::{CpuSnapshot, MemorySnapshot, SNAPSHOT_VERSION, Snapshot};

/// How [`Emulator::run_with_limit`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The program counter left memory.
    Completed,
    /// The step budget ran out with pc still inside memory.
    StepLimit,
}

/// A single core plus its instruction memory.
///
/// ```
/// use rv32i_vm::{Emulator, Register};
///
/// let mut emu = Emulator::with_memory(16);
/// emu.load_program(&[0x00500113, 0x00600193, 0x003101B3]).unwrap();
/// emu.run();
/// assert_eq!(emu.register(Register::from_u32(3)), 11);
/// ```
#[derive(Debug, Clone)]
pub struct Emulator {
    pub cpu: Cpu,
    pub memory: Memory,
    config: VmConfig,
}

impl Emulator {
    pub fn new(config: VmConfig) -> Self {
        Self {
            cpu: Cpu::new(config.hardwire_x0)
                .with_jalr_reads_rs1_first(config.jalr_reads_rs1_first),
            memory: Memory::new(config.memory_words),
            config,
        }
    }

    /// Default configuration with `words` words of memory.
    pub fn with_memory(words: usize) -> Self {
        Self::new(VmConfig::default().with_memory_words(words))
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Copy `program` into memory starting at word 0.
    ///
    /// Words past the end of `program` keep their previous contents. Fails
    /// without touching memory if the program does not fit.
    pub fn load_program(&mut self, program: &[u32]) -> Result<(), VmError> {
        let capacity = self.memory.len();
        if program.len() > capacity {
            return Err(VmError::ProgramTooLarge {
                words: program.len(),
                capacity,
            });
        }
        self.memory.write_words(0, program)?;
        log::debug!("Loaded {} words into {} words of memory", program.len(), capacity);
        Ok(())
    }

    /// Execute until pc leaves memory.
    ///
    /// There is no halt instruction and no step limit: a program that jumps
    /// backwards forever never returns.
    pub fn run(&mut self) -> ExecStats {
        while self.cpu_in_bounds() {
            if !self.run_cycle() {
                break;
            }
        }
        self.log_summary();
        self.cpu.stats()
    }

    /// Like [`run`](Self::run) but stops after at most `max_steps` cycles.
    pub fn run_with_limit(&mut self, max_steps: u64) -> RunExit {
        let mut steps = 0u64;
        while self.cpu_in_bounds() {
            if steps >= max_steps {
                log::warn!(
                    "Step limit of {} reached at pc={:#06x}",
                    max_steps,
                    self.cpu.pc
                );
                return RunExit::StepLimit;
            }
            if !self.run_cycle() {
                break;
            }
            steps += 1;
        }
        self.log_summary();
        RunExit::Completed
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<StepOutcome, VmError> {
        Ok(self.cpu.step(&self.memory)?)
    }

    fn cpu_in_bounds(&self) -> bool {
        self.memory.contains(self.cpu.pc)
    }

    fn run_cycle(&mut self) -> bool {
        match self.cpu.step(&self.memory) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Fetch failed at pc={:#06x}: {}", self.cpu.pc, e);
                false
            }
        }
    }

    fn log_summary(&self) {
        let stats = self.cpu.stats();
        log::info!(
            "Run finished: pc={:#06x} cycles={} executed={} ignored={}",
            self.cpu.pc,
            stats.cycles,
            stats.executed,
            stats.ignored
        );
    }

    pub fn registers(&self) -> &[u32; 32] {
        &self.cpu.regs
    }

    /// Architectural read of `reg` (honors the x0 setting).
    pub fn register(&self, reg: Register) -> u32 {
        self.cpu.read_reg(reg)
    }

    pub fn pc(&self) -> u32 {
        self.cpu.pc
    }

    pub fn stats(&self) -> ExecStats {
        self.cpu.stats()
    }

    /// Zero registers, pc and counters. Memory is kept.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Capture a complete, deterministic snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            config: self.config,
            cpu: CpuSnapshot {
                pc: self.cpu.pc,
                regs: self.cpu.regs,
                stats: self.cpu.stats(),
            },
            memory: MemorySnapshot::new(self.memory.words().to_vec()),
        }
    }

    /// Restore state from a snapshot taken with the same memory size.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), VmError> {
        validate(snapshot)?;
        if snapshot.config.memory_words != self.memory.len() {
            return Err(VmError::SnapshotSize {
                expected: self.memory.len(),
                found: snapshot.config.memory_words,
            });
        }

        self.config = snapshot.config;
        self.cpu = Cpu::new(snapshot.config.hardwire_x0)
            .with_jalr_reads_rs1_first(snapshot.config.jalr_reads_rs1_first);
        self.cpu.pc = snapshot.cpu.pc;
        self.cpu.regs = snapshot.cpu.regs;
        if self.cpu.hardwire_x0 {
            self.cpu.regs[0] = 0;
        }
        self.cpu.stats = snapshot.cpu.stats;
        self.memory.write_words(0, &snapshot.memory.words)?;
        Ok(())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, VmError> {
        let mut emu = Self::new(snapshot.config);
        emu.apply_snapshot(&snapshot)?;
        Ok(emu)
    }
}

fn validate(snapshot: &Snapshot) -> Result<(), VmError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(VmError::SnapshotVersion {
            expected: SNAPSHOT_VERSION.to_string(),
            found: snapshot.version.clone(),
        });
    }
    if snapshot.memory.words.len() != snapshot.config.memory_words {
        return Err(VmError::SnapshotSize {
            expected: snapshot.config.memory_words,
            found: snapshot.memory.words.len(),
        });
    }
    if !snapshot.memory.verify() {
        return Err(VmError::SnapshotDigest);
    }
    Ok(())
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

use crate::VmError;
use crate::config::VmConfig;
use crate::cpu::ExecStats;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version identifier for snapshot compatibility checks.
pub const SNAPSHOT_VERSION: &str = "1.1";

/// Full emulator snapshot: configuration, CPU state and memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub config: VmConfig,
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
}

/// Serializable CPU state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub pc: u32,
    pub regs: [u32; 32],
    pub stats: ExecStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Hex SHA-256 of the little-endian memory image.
    pub hash: String,
    pub words: Vec<u32>,
}

impl MemorySnapshot {
    pub fn new(words: Vec<u32>) -> Self {
        let hash = memory_digest(&words);
        Self { hash, words }
    }

    pub fn verify(&self) -> bool {
        memory_digest(&self.words) == self.hash
    }
}

pub fn memory_digest(words: &[u32]) -> String {
    let mut hasher = Sha256::new();
    for word in words {
        hasher.update(word.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

impl Snapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, VmError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VmError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

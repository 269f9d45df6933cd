use super::core::Cpu;
use super::types::{NoOpReason, StepOutcome};
use crate::decoder::{self, DecodedInstruction, FUNCT7_ADD, FUNCT7_SUB, Funct3, Opcode};
use crate::memory::{Memory, MemoryError};

impl Cpu {
    /// Run one fetch-decode-execute cycle.
    pub fn step(&mut self, memory: &Memory) -> Result<StepOutcome, MemoryError> {
        let pc = self.pc;
        let insn_raw = self.fetch(memory)?;
        let insn = decoder::decode(insn_raw);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("pc={:#06x} insn={:#010x} {}", pc, insn_raw, insn);
        }

        let outcome = self.execute(&insn);
        if let StepOutcome::Ignored { reason, .. } = &outcome {
            log::debug!("pc={:#06x} insn={:#010x} ignored: {}", pc, insn_raw, reason);
        }
        self.stats.record(&outcome);
        Ok(outcome)
    }

    /// Apply a decoded instruction to architectural state.
    ///
    /// `self.pc` must already point past the instruction (fetch has run).
    /// Arithmetic wraps in 32 bits.
    pub fn execute(&mut self, insn: &DecodedInstruction) -> StepOutcome {
        let pc = self.pc;
        let imm = insn.imm as u32;

        match insn.opcode {
            Opcode::Lui => {
                self.write_reg(insn.rd, imm);
            }
            Opcode::Auipc => {
                self.write_reg(insn.rd, pc.wrapping_add(imm));
            }
            Opcode::Jal => {
                self.write_reg(insn.rd, pc);
                self.pc = pc.wrapping_add(imm);
            }
            Opcode::Jalr => {
                if self.jalr_reads_rs1_first {
                    let target = self.read_reg(insn.rs1).wrapping_add(imm) & !1;
                    self.write_reg(insn.rd, pc);
                    self.pc = target;
                } else {
                    // Link first: with rd == rs1 the target uses the new link value
                    self.write_reg(insn.rd, pc);
                    self.pc = self.read_reg(insn.rs1).wrapping_add(imm) & !1;
                }
            }
            Opcode::OpImm => match insn.funct3 {
                Funct3::AddSub => {
                    let val = self.read_reg(insn.rs1).wrapping_add(imm);
                    self.write_reg(insn.rd, val);
                }
                funct3 => {
                    let reason = NoOpReason::UnsupportedFunct3 {
                        opcode: insn.opcode,
                        funct3,
                    };
                    return ignored(insn, reason);
                }
            },
            Opcode::Op => match insn.funct3 {
                Funct3::AddSub => {
                    let val1 = self.read_reg(insn.rs1);
                    let val2 = self.read_reg(insn.rs2);
                    let val = match insn.funct7 {
                        FUNCT7_ADD => val1.wrapping_add(val2),
                        FUNCT7_SUB => val1.wrapping_sub(val2),
                        funct7 => return ignored(insn, NoOpReason::UnsupportedFunct7(funct7)),
                    };
                    self.write_reg(insn.rd, val);
                }
                funct3 => {
                    let reason = NoOpReason::UnsupportedFunct3 {
                        opcode: insn.opcode,
                        funct3,
                    };
                    return ignored(insn, reason);
                }
            },
            Opcode::Unsupported(bits) => {
                return ignored(insn, NoOpReason::UnsupportedOpcode(bits));
            }
        }

        StepOutcome::Executed(*insn)
    }
}

fn ignored(insn: &DecodedInstruction, reason: NoOpReason) -> StepOutcome {
    StepOutcome::Ignored {
        insn: *insn,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Register;
    use crate::decoder::encode::*;

    fn reg(i: u32) -> Register {
        Register::from_u32(i)
    }

    fn make_memory(prog: &[u32]) -> Memory {
        let mut mem = Memory::new(32);
        mem.write_words(0, prog).unwrap();
        mem
    }

    #[test]
    fn test_addi() {
        let mem = make_memory(&[0x00500113]);
        let mut cpu = Cpu::new(false);

        let outcome = cpu.step(&mem).unwrap();
        assert!(!outcome.is_ignored());
        assert_eq!(cpu.read_reg(reg(2)), 5);
        assert_eq!(cpu.pc, 1);
        for i in (0..32).filter(|&i| i != 2) {
            assert_eq!(cpu.read_reg(reg(i)), 0, "x{i}");
        }
    }

    #[test]
    fn test_addi_negative_wraps() {
        let mem = make_memory(&[addi(1, 0, -1), addi(1, 1, 1)]);
        let mut cpu = Cpu::new(false);

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 0xFFFF_FFFF);
        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 0);
    }

    #[test]
    fn test_add() {
        let mem = make_memory(&[0x003101B3]);
        let mut cpu = Cpu::new(false);
        cpu.regs[2] = 5;
        cpu.regs[3] = 6;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(3)), 11);
        assert_eq!(cpu.read_reg(reg(2)), 5);
    }

    #[test]
    fn test_sub() {
        let mem = make_memory(&[sub(3, 3, 2)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[2] = 5;
        cpu.regs[3] = 6;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(3)), 1);
    }

    #[test]
    fn test_add_sub_overflow_wraps() {
        let mem = make_memory(&[add(3, 1, 2), sub(4, 0, 2)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[1] = 0xFFFF_FFFF;
        cpu.regs[2] = 2;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(3)), 1);
        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(4)), 0xFFFF_FFFE);
    }

    #[test]
    fn test_lui() {
        let mem = make_memory(&[encode_u(0x12345, 2, 0x37)]);
        let mut cpu = Cpu::new(false);

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(2)), 0x1234_5000);
    }

    #[test]
    fn test_auipc_uses_post_fetch_pc() {
        let mut mem = Memory::new(8);
        mem.write_words(3, &[encode_u(0x1, 4, 0x17)]).unwrap();
        let mut cpu = Cpu::new(false);
        cpu.pc = 3;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(4)), 4 + 0x1000);
        assert_eq!(cpu.pc, 4);
    }

    #[test]
    fn test_jal() {
        // JAL x1, 8 at word index 4
        let mut mem = Memory::new(32);
        mem.write_words(4, &[encode_j(8, 1)]).unwrap();
        mem.write_words(13, &[addi(5, 0, 1)]).unwrap();
        let mut cpu = Cpu::new(false);
        cpu.pc = 4;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 5); // Link = post-fetch pc
        assert_eq!(cpu.pc, 13); // 5 + 8

        let next = cpu.step(&mem).unwrap();
        assert_eq!(next.instruction().raw, addi(5, 0, 1));
        assert_eq!(cpu.read_reg(reg(5)), 1);
    }

    #[test]
    fn test_jal_backward_wraps_below_zero() {
        let mem = make_memory(&[encode_j(-4, 1)]);
        let mut cpu = Cpu::new(false);

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 1);
        assert_eq!(cpu.pc, 1u32.wrapping_sub(4));
    }

    #[test]
    fn test_jalr_clears_low_bit() {
        let mem = make_memory(&[encode_i(3, 6, 0, 1, 0x67)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[6] = 8;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 1);
        assert_eq!(cpu.pc, 10); // (8 + 3) & !1
    }

    #[test]
    fn test_jalr_writes_link_before_reading_rs1() {
        // JALR x1, 6(x1)
        let mem = make_memory(&[encode_i(6, 1, 0, 1, 0x67)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[1] = 20;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 1);
        assert_eq!(cpu.pc, 6); // (1 + 6) & !1
    }

    #[test]
    fn test_jalr_reads_rs1_first_when_enabled() {
        // JALR x1, 6(x1)
        let mem = make_memory(&[encode_i(6, 1, 0, 1, 0x67)]);
        let mut cpu = Cpu::new(false).with_jalr_reads_rs1_first(true);
        cpu.regs[1] = 20;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(1)), 1);
        assert_eq!(cpu.pc, 26); // 20 + 6
    }

    #[test]
    fn test_jalr_negative_target_wraps() {
        // JALR x3, -4(x2) with x2 = 1
        let mem = make_memory(&[encode_i(-4, 2, 0, 3, 0x67)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[2] = 1;

        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(reg(3)), 1);
        assert_eq!(cpu.pc, 0xFFFF_FFFC); // (1 - 4) & !1
        assert!(!mem.contains(cpu.pc));
    }

    #[test]
    fn test_auipc_wraps() {
        let mut mem = Memory::new(0x1001);
        mem.write_words(0x1000, &[encode_u(0xFFFFF, 4, 0x17)]).unwrap();
        let mut cpu = Cpu::new(false);
        cpu.pc = 0x1000;

        cpu.step(&mem).unwrap();
        // 0x1001 + 0xFFFF_F000 overflows to 1
        assert_eq!(cpu.read_reg(reg(4)), 1);
        assert_eq!(cpu.pc, 0x1001);
    }

    #[test]
    fn test_x0_writes_follow_config() {
        let mem = make_memory(&[addi(0, 0, 7)]);

        let mut cpu = Cpu::new(false);
        cpu.step(&mem).unwrap();
        assert_eq!(cpu.read_reg(Register::X0), 7);

        let mut strict = Cpu::new(true);
        strict.step(&mem).unwrap();
        assert_eq!(strict.read_reg(Register::X0), 0);
    }

    #[test]
    fn test_unsupported_opcode_is_noop() {
        // SW x5, 4(x6)
        let mem = make_memory(&[0x0053_2223]);
        let mut cpu = Cpu::new(false);
        cpu.regs[5] = 1;
        cpu.regs[6] = 2;
        let before = cpu.regs;

        let outcome = cpu.step(&mem).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Ignored { reason: NoOpReason::UnsupportedOpcode(0x23), .. }
        ));
        assert_eq!(cpu.regs, before);
        assert_eq!(cpu.pc, 1);
    }

    #[test]
    fn test_unsupported_funct3_is_noop() {
        // XORI x1, x0, 1 and SLL x1, x2, x3
        let mem = make_memory(&[
            encode_i(1, 0, 0b100, 1, 0x13),
            encode_r(0, 3, 2, 0b001, 1, 0x33),
        ]);
        let mut cpu = Cpu::new(false);
        cpu.regs[2] = 1;
        cpu.regs[3] = 1;

        let first = cpu.step(&mem).unwrap();
        assert_eq!(
            first,
            StepOutcome::Ignored {
                insn: decoder::decode(encode_i(1, 0, 0b100, 1, 0x13)),
                reason: NoOpReason::UnsupportedFunct3 {
                    opcode: Opcode::OpImm,
                    funct3: Funct3::Xor,
                },
            }
        );
        let second = cpu.step(&mem).unwrap();
        assert!(matches!(
            second,
            StepOutcome::Ignored {
                reason: NoOpReason::UnsupportedFunct3 { opcode: Opcode::Op, funct3: Funct3::Sll },
                ..
            }
        ));
        assert_eq!(cpu.read_reg(reg(1)), 0);
    }

    #[test]
    fn test_unsupported_funct7_is_noop() {
        // MUL x1, x2, x3 (funct7 = 1)
        let mem = make_memory(&[encode_r(0b0000001, 3, 2, 0, 1, 0x33)]);
        let mut cpu = Cpu::new(false);
        cpu.regs[2] = 3;
        cpu.regs[3] = 4;

        let outcome = cpu.step(&mem).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Ignored { reason: NoOpReason::UnsupportedFunct7(1), .. }
        ));
        assert_eq!(cpu.read_reg(reg(1)), 0);
    }

    #[test]
    fn test_stats_count_cycles() {
        let mem = make_memory(&[addi(1, 0, 1), 0x0000_0000, addi(2, 0, 2)]);
        let mut cpu = Cpu::new(false);
        for _ in 0..3 {
            cpu.step(&mem).unwrap();
        }
        let stats = cpu.stats();
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.executed, 2);
        assert_eq!(stats.ignored, 1);
    }
}

//! Opcode fetch/decode/execute: the 256-entry instruction table.
//!
//! Twelve opcodes (0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9,
//! 0xDD, 0xED, 0xFD) are undocumented on the 8080 — the 8085 repurposes
//! them, but on the 8080 they behave as plain single-byte `NOP`s and are
//! kept that way here rather than implementing 8085 semantics.

use super::control::Condition;
use super::memory::Memory8080;
use super::Cpu8080;
use crate::logging::{LogCategory, LogLevel};

impl<M: Memory8080> Cpu8080<M> {
    /// Read one of the eight `MOV`-style register operands, 0..=7 mapping to
    /// B, C, D, E, H, L, M, A (the 8080's standard register field encoding).
    fn read_reg(&self, idx: u8) -> u8 {
        match idx {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => self.read_m(),
            7 => self.a,
            _ => unreachable!("register field is only ever 3 bits"),
        }
    }

    fn write_reg(&mut self, idx: u8, val: u8) {
        match idx {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            6 => self.write_m(val),
            7 => self.a = val,
            _ => unreachable!("register field is only ever 3 bits"),
        }
    }

    /// Read one of the four register-pair operands used by `LXI`/`INX`/
    /// `DCX`/`DAD`/`PUSH`/`POP`, 0..=3 mapping to BC, DE, HL, and (SP or
    /// PSW, depending on the instruction family).
    fn read_rp_sp(&self, idx: u8) -> u16 {
        match idx {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            3 => self.sp,
            _ => unreachable!("register-pair field is only ever 2 bits"),
        }
    }

    fn write_rp_sp(&mut self, idx: u8, val: u16) {
        match idx {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            3 => self.sp = val,
            _ => unreachable!("register-pair field is only ever 2 bits"),
        }
    }

    /// Execute the instruction identified by `opcode`, consuming any further
    /// operand bytes from the instruction stream at the current PC.
    pub(super) fn execute(&mut self, opcode: u8) {
        match opcode {
            0x00 => {}

            // 8085-only / undocumented opcodes: plain NOPs on the 8080.
            0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 | 0xCB | 0xD9 | 0xDD | 0xED | 0xFD => {
                crate::log!(
                    LogCategory::Stubs,
                    LogLevel::Trace,
                    "undocumented/8085-only opcode {opcode:#04x} hit, treated as NOP"
                );
            }

            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch_u16();
                self.write_rp_sp((opcode >> 4) & 0x03, val);
            }

            0x02 => self.memory.write(self.bc(), self.a),
            0x12 => self.memory.write(self.de(), self.a),

            0x0A => self.a = self.memory.read(self.bc()),
            0x1A => self.a = self.memory.read(self.de()),

            0x03 | 0x13 | 0x23 | 0x33 => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.read_rp_sp(idx).wrapping_add(1);
                self.write_rp_sp(idx, val);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.read_rp_sp(idx).wrapping_sub(1);
                self.write_rp_sp(idx, val);
            }

            0x09 | 0x19 | 0x29 | 0x39 => {
                let rp = self.read_rp_sp((opcode >> 4) & 0x03);
                self.dad(rp);
            }

            // INR r (0x04, 0x0C, 0x14, ... step 8, register field in bits 3-5)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let idx = (opcode >> 3) & 0x07;
                let val = self.read_reg(idx);
                let result = self.inr(val);
                self.write_reg(idx, result);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let idx = (opcode >> 3) & 0x07;
                let val = self.read_reg(idx);
                let result = self.dcr(val);
                self.write_reg(idx, result);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let idx = (opcode >> 3) & 0x07;
                let imm = self.read_next();
                self.write_reg(idx, imm);
            }

            0x07 => self.rlc(),
            0x0F => self.rrc(),
            0x17 => self.ral(),
            0x1F => self.rar(),
            0x27 => self.daa(),
            0x2F => self.cma(),
            0x37 => self.stc(),
            0x3F => self.cmc(),

            0x22 => {
                let addr = self.fetch_u16();
                self.memory.write(addr, self.l);
                self.memory.write(addr.wrapping_add(1), self.h);
            }
            0x2A => {
                let addr = self.fetch_u16();
                self.l = self.memory.read(addr);
                self.h = self.memory.read(addr.wrapping_add(1));
            }
            0x32 => {
                let addr = self.fetch_u16();
                self.memory.write(addr, self.a);
            }
            0x3A => {
                let addr = self.fetch_u16();
                self.a = self.memory.read(addr);
            }

            0x76 => self.halted = true,

            // MOV r,r' — the 64-entry block, HLT (0x76) already handled above.
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 0x07;
                let src = opcode & 0x07;
                let val = self.read_reg(src);
                self.write_reg(dst, val);
            }

            0x80..=0x87 => {
                let v = self.read_reg(opcode & 0x07);
                self.add(v, false);
            }
            0x88..=0x8F => {
                let v = self.read_reg(opcode & 0x07);
                self.add(v, self.flags.cf);
            }
            0x90..=0x97 => {
                let v = self.read_reg(opcode & 0x07);
                self.sub(v, false);
            }
            0x98..=0x9F => {
                let v = self.read_reg(opcode & 0x07);
                self.sub(v, self.flags.cf);
            }
            0xA0..=0xA7 => {
                let v = self.read_reg(opcode & 0x07);
                self.ana(v);
            }
            0xA8..=0xAF => {
                let v = self.read_reg(opcode & 0x07);
                self.xra(v);
            }
            0xB0..=0xB7 => {
                let v = self.read_reg(opcode & 0x07);
                self.ora(v);
            }
            0xB8..=0xBF => {
                let v = self.read_reg(opcode & 0x07);
                self.cmp(v);
            }

            0xC6 => {
                let imm = self.read_next();
                self.add(imm, false);
            }
            0xCE => {
                let imm = self.read_next();
                self.add(imm, self.flags.cf);
            }
            0xD6 => {
                let imm = self.read_next();
                self.sub(imm, false);
            }
            0xDE => {
                let imm = self.read_next();
                self.sub(imm, self.flags.cf);
            }
            0xE6 => {
                let imm = self.read_next();
                self.ana(imm);
            }
            0xEE => {
                let imm = self.read_next();
                self.xra(imm);
            }
            0xF6 => {
                let imm = self.read_next();
                self.ora(imm);
            }
            0xFE => {
                let imm = self.read_next();
                self.cmp(imm);
            }

            0xC1 | 0xD1 | 0xE1 => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.pop_u16();
                self.write_rp_sp(idx, val);
            }
            0xF1 => {
                let val = self.pop_u16();
                self.set_psw(val);
            }
            0xC5 | 0xD5 | 0xE5 => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.read_rp_sp(idx);
                self.push_u16(val);
            }
            0xF5 => {
                let val = self.psw();
                self.push_u16(val);
            }

            _ => self.execute_control(opcode),
        }
    }

    /// The control-transfer half of the table: unconditional and
    /// conditional JMP/CALL/RET, RST, and the HL/stack/PC shuffles. Split
    /// out of [`Cpu8080::execute`] purely to keep that match arm list a
    /// manageable size.
    fn execute_control(&mut self, opcode: u8) {
        match opcode {
            0xC3 => {
                let target = self.fetch_u16();
                self.jump(target);
            }
            0xCD => {
                let target = self.fetch_u16();
                self.call(target);
            }
            0xC9 => self.ret(),

            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let target = self.fetch_u16();
                if self.test_condition(condition_for(opcode)) {
                    self.jump(target);
                }
            }
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let target = self.fetch_u16();
                if self.test_condition(condition_for(opcode)) {
                    self.call(target);
                }
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.test_condition(condition_for(opcode)) {
                    self.ret();
                }
            }

            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let n = (opcode >> 3) & 0x07;
                self.rst(n);
            }

            0xE3 => self.xthl(),
            0xEB => self.xchg(),
            0xE9 => self.pchl(),
            0xF9 => self.sphl(),

            // IN/OUT: only the immediate port byte is consumed. No port
            // device model exists, so these have no further effect.
            0xD3 | 0xDB => {
                self.read_next();
            }

            0xF3 => self.ie = false,
            0xFB => self.ie = true,

            _ => unreachable!("opcode {opcode:#04x} not covered by any dispatch arm"),
        }
    }
}

/// Map a conditional JMP/CALL/RET opcode to its [`Condition`]. The
/// condition is encoded in bits 3-4, shared across all three families.
fn condition_for(opcode: u8) -> Condition {
    match (opcode >> 3) & 0x07 {
        0 => Condition::Nz,
        1 => Condition::Z,
        2 => Condition::Nc,
        3 => Condition::C,
        4 => Condition::Po,
        5 => Condition::Pe,
        6 => Condition::P,
        7 => Condition::M,
        _ => unreachable!("condition field is only ever 3 bits"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::memory::FlatMemory;
    use super::super::{Cpu8080, StepResult};

    fn cpu() -> Cpu8080<FlatMemory> {
        Cpu8080::new(FlatMemory::new())
    }

    fn load(cpu: &mut Cpu8080<FlatMemory>, at: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            cpu.memory.write(at + i as u16, b);
        }
    }

    #[test]
    fn all_256_opcodes_execute_without_panicking() {
        // A coarse sweep: every opcode, alone, with enough trailing zero
        // bytes to satisfy any immediate/address operand, must execute
        // without panicking from an unmapped index or unreachable arm.
        for opcode in 0u8..=255 {
            let mut cpu = cpu();
            cpu.sp = 0x8000;
            cpu.pc = 0x0100;
            load(&mut cpu, 0x0100, &[opcode, 0x00, 0x00]);
            cpu.step();
        }
    }

    #[test]
    fn undocumented_8085_opcodes_are_single_byte_nops() {
        fn snapshot(cpu: &Cpu8080<FlatMemory>) -> (u8, u8, u8, u8, u8, u8, u8, u16, super::super::Flags) {
            (cpu.a, cpu.b, cpu.c, cpu.d, cpu.e, cpu.h, cpu.l, cpu.sp, cpu.flags)
        }

        for opcode in [
            0x08u8, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD,
        ] {
            let mut cpu = cpu();
            cpu.pc = 0x0100;
            let before = snapshot(&cpu);
            load(&mut cpu, 0x0100, &[opcode]);
            cpu.step();
            assert_eq!(cpu.pc, 0x0101, "opcode {opcode:#04x} should consume one byte");
            assert_eq!(before, snapshot(&cpu), "opcode {opcode:#04x} must not touch registers or flags");
        }
    }

    #[test]
    fn lxi_sp_loads_little_endian_16_bit_immediate() {
        let mut cpu = cpu();
        load(&mut cpu, 0x0000, &[0x31, 0xCD, 0xAB]); // LXI SP,0xABCD
        cpu.step();
        assert_eq!(cpu.sp, 0xABCD);
    }

    #[test]
    fn sta_and_lda_use_little_endian_addressing() {
        let mut cpu = cpu();
        cpu.a = 0x77;
        load(&mut cpu, 0x0000, &[0x32, 0x00, 0x20]); // STA 0x2000
        cpu.step();
        assert_eq!(cpu.memory.read(0x2000), 0x77);

        cpu.a = 0x00;
        load(&mut cpu, cpu.pc, &[0x3A, 0x00, 0x20]); // LDA 0x2000
        cpu.step();
        assert_eq!(cpu.a, 0x77);
    }

    #[test]
    fn shld_and_lhld_roundtrip_hl_through_memory() {
        let mut cpu = cpu();
        cpu.set_hl(0xBEEF);
        load(&mut cpu, 0x0000, &[0x22, 0x00, 0x30]); // SHLD 0x3000
        cpu.step();
        assert_eq!(cpu.memory.read(0x3000), 0xEF);
        assert_eq!(cpu.memory.read(0x3001), 0xBE);

        cpu.set_hl(0x0000);
        load(&mut cpu, cpu.pc, &[0x2A, 0x00, 0x30]); // LHLD 0x3000
        cpu.step();
        assert_eq!(cpu.hl(), 0xBEEF);
    }

    #[test]
    fn conditional_jump_skips_target_when_condition_false() {
        let mut cpu = cpu();
        cpu.flags.zf = false;
        load(&mut cpu, 0x0000, &[0xCA, 0x00, 0x10]); // JZ 0x1000, not taken
        cpu.step();
        assert_eq!(cpu.pc, 0x0003);

        cpu.flags.zf = true;
        load(&mut cpu, cpu.pc, &[0xCA, 0x00, 0x10]); // JZ 0x1000, taken
        cpu.step();
        assert_eq!(cpu.pc, 0x1000);
    }

    #[test]
    fn in_and_out_only_consume_the_port_byte() {
        let mut cpu = cpu();
        cpu.a = 0x42;
        load(&mut cpu, 0x0000, &[0xD3, 0x01]); // OUT 1
        cpu.step();
        assert_eq!(cpu.a, 0x42, "OUT must not mutate A");
        assert_eq!(cpu.pc, 0x0002);

        cpu.a = 0x99;
        load(&mut cpu, cpu.pc, &[0xDB, 0x01]); // IN 1
        cpu.step();
        assert_eq!(cpu.a, 0x99, "IN must not mutate A with no device model");
    }

    #[test]
    fn ei_and_di_toggle_the_interrupt_enable_latch() {
        let mut cpu = cpu();
        load(&mut cpu, 0x0000, &[0xFB, 0xF3]); // EI ; DI
        cpu.step();
        assert!(cpu.ie);
        cpu.step();
        assert!(!cpu.ie);
    }

    #[test]
    fn mov_m_passes_through_the_hl_addressed_byte() {
        let mut cpu = cpu();
        cpu.set_hl(0x4000);
        cpu.memory.write(0x4000, 0x55);
        load(&mut cpu, 0x0000, &[0x7E]); // MOV A,M
        cpu.step();
        assert_eq!(cpu.a, 0x55);
    }

    #[test]
    fn full_reset_on_wrap_is_observable_through_step() {
        let mut cpu = cpu();
        cpu.pc = 0xFFFF;
        assert_eq!(cpu.step(), StepResult::Reset);
    }
}

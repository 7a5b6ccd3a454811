//! Instruction execution for the Z80.
//!
//! One function per instruction-set family, each a flat match over the
//! final opcode byte, sharing the ALU primitives. Executors read and write
//! guest memory only through the memory interface and report control-flow
//! decisions via [`Outcome`].

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::alu;
use crate::error::Error;
use crate::flags::{szp, CF, HF, NF, PF, SF, ZF};
use crate::opcodes::OpcodeSet;

use super::{Index, Outcome, Z80};

impl Z80 {
    /// Dispatch to the family executor.
    pub(crate) fn execute(
        &mut self,
        set: OpcodeSet,
        op: u8,
        displacement: i8,
        size: u8,
    ) -> Result<Outcome, Error> {
        match set {
            OpcodeSet::Standard => self.execute_standard(op, size),
            OpcodeSet::ExtendedStandard => self.execute_extended(op),
            OpcodeSet::ExtendedBit => self.execute_bit(op),
            OpcodeSet::Ix => self.execute_index(op, Index::Ix),
            OpcodeSet::Iy => self.execute_index(op, Index::Iy),
            OpcodeSet::IxBit => self.execute_index_bit(op, displacement, Index::Ix),
            OpcodeSet::IyBit => self.execute_index_bit(op, displacement, Index::Iy),
        }
    }

    // =========================================================================
    // Unprefixed instructions
    // =========================================================================

    fn execute_standard(&mut self, op: u8, size: u8) -> Result<Outcome, Error> {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.imm16(1)?;
                self.set_reg16((op >> 4) & 3, value);
            }

            // LD (BC), A
            0x02 => {
                self.memory.write_byte(self.regs.bc(), self.regs.a)?;
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = (op >> 4) & 3;
                let value = self.reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (op >> 3) & 7;
                let result = alu::inc8(self.reg8(r));
                self.set_reg8(r, result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (op >> 3) & 7;
                let result = alu::dec8(self.reg8(r));
                self.set_reg8(r, result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.imm8(1)?;
                self.set_reg8((op >> 3) & 7, value);
            }

            // RLCA — only C updates; S/Z/P stay, H=N=0
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | if carry != 0 { CF } else { 0 };
            }

            // EX AF, AF'
            0x08 => self.regs.exchange_af(),

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP) — H, N, C only
            0x09 | 0x19 | 0x29 | 0x39 => {
                let rr = self.reg16((op >> 4) & 3);
                let (value, flags) = alu::add16(self.regs.hl(), rr);
                self.regs.set_hl(value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
            }

            // LD A, (BC)
            0x0A => {
                self.regs.a = self.memory.read_byte(self.regs.bc())?;
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = (op >> 4) & 3;
                let value = self.reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry << 7);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | if carry != 0 { CF } else { 0 };
            }

            // DJNZ e
            0x10 => {
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b == 0 {
                    return Ok(Outcome::alternate());
                }
                self.relative_jump(size)?;
                return Ok(Outcome::hold());
            }

            // LD (DE), A
            0x12 => {
                self.memory.write_byte(self.regs.de(), self.regs.a)?;
            }

            // RLA
            0x17 => {
                let old_carry = self.regs.f & CF;
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | if carry != 0 { CF } else { 0 };
            }

            // JR e
            0x18 => {
                self.relative_jump(size)?;
                return Ok(Outcome::hold());
            }

            // LD A, (DE)
            0x1A => {
                self.regs.a = self.memory.read_byte(self.regs.de())?;
            }

            // RRA
            0x1F => {
                let old_carry = if self.regs.f & CF != 0 { 0x80 } else { 0 };
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | old_carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | if carry != 0 { CF } else { 0 };
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                if !self.condition((op >> 3) & 3) {
                    return Ok(Outcome::alternate());
                }
                self.relative_jump(size)?;
                return Ok(Outcome::hold());
            }

            // LD (nn), HL
            0x22 => {
                let address = self.imm16(1)?;
                self.memory.write_word(address, self.regs.hl())?;
            }

            // DAA
            0x27 => self.daa(),

            // LD HL, (nn)
            0x2A => {
                let address = self.imm16(1)?;
                let value = self.memory.read_word(address)?;
                self.regs.set_hl(value);
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.f = (self.regs.f & (SF | ZF | PF | CF)) | HF | NF;
            }

            // LD (nn), A
            0x32 => {
                let address = self.imm16(1)?;
                self.memory.write_byte(address, self.regs.a)?;
            }

            // INC (HL)
            0x34 => {
                let address = self.regs.hl();
                let result = alu::inc8(self.memory.read_byte(address)?);
                self.memory.write_byte(address, result.value)?;
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // DEC (HL)
            0x35 => {
                let address = self.regs.hl();
                let result = alu::dec8(self.memory.read_byte(address)?);
                self.memory.write_byte(address, result.value)?;
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // LD (HL), n
            0x36 => {
                let value = self.imm8(1)?;
                self.memory.write_byte(self.regs.hl(), value)?;
            }

            // SCF
            0x37 => {
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | CF;
            }

            // LD A, (nn)
            0x3A => {
                let address = self.imm16(1)?;
                self.regs.a = self.memory.read_byte(address)?;
            }

            // CCF — H takes the old carry
            0x3F => {
                let old_carry = self.regs.f & CF;
                self.regs.f = (self.regs.f & (SF | ZF | PF))
                    | if old_carry != 0 { HF } else { CF };
            }

            // HALT — PC stays on the instruction
            0x76 => {
                self.halt();
                return Ok(Outcome::hold());
            }

            // LD r, r' (40-7F except 76)
            0x40..=0x7F => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    let value = self.memory.read_byte(self.regs.hl())?;
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    self.memory.write_byte(self.regs.hl(), self.reg8(src))?;
                } else {
                    let value = self.reg8(src);
                    self.set_reg8(dst, value);
                }
            }

            // ALU A, r (80-BF)
            0x80..=0xBF => {
                let r = op & 7;
                let value = if r == 6 {
                    self.memory.read_byte(self.regs.hl())?
                } else {
                    self.reg8(r)
                };
                self.alu_a(op, value);
            }

            // RET cc (C0=NZ, C8=Z, D0=NC, D8=C, E0=PO, E8=PE, F0=P, F8=M)
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if !self.condition((op >> 3) & 7) {
                    return Ok(Outcome::alternate());
                }
                self.regs.pc = self.pop_word()?;
                return Ok(Outcome::hold());
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_word()?;
                self.set_reg16_af((op >> 4) & 3, value);
            }

            // JP cc, nn — same cost either way
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let target = self.imm16(1)?;
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = target;
                    return Ok(Outcome::hold());
                }
            }

            // JP nn
            0xC3 => {
                self.regs.pc = self.imm16(1)?;
                return Ok(Outcome::hold());
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                if !self.condition((op >> 3) & 7) {
                    return Ok(Outcome::alternate());
                }
                let target = self.imm16(1)?;
                self.call(target, size)?;
                return Ok(Outcome::hold());
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.reg16_af((op >> 4) & 3);
                self.push_word(value)?;
            }

            // ALU A, n (C6=ADD, CE=ADC, D6=SUB, DE=SBC, E6=AND, EE=XOR, F6=OR, FE=CP)
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.imm8(1)?;
                self.alu_a(op, value);
            }

            // RST p (C7=00, CF=08, D7=10, DF=18, E7=20, EF=28, F7=30, FF=38)
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = u16::from(op & 0x38);
                self.call(target, size)?;
                return Ok(Outcome::hold());
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop_word()?;
                return Ok(Outcome::hold());
            }

            // CALL nn
            0xCD => {
                let target = self.imm16(1)?;
                self.call(target, size)?;
                return Ok(Outcome::hold());
            }

            // OUT (n), A
            0xD3 => {
                let port = self.imm8(1)?;
                let value = self.regs.a;
                self.write_port(port, value);
            }

            // EXX
            0xD9 => self.regs.exchange_banks(),

            // IN A, (n) — no flags
            0xDB => {
                let port = self.imm8(1)?;
                self.regs.a = self.read_port(port);
            }

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let stacked = self.memory.read_word(sp)?;
                self.memory.write_word(sp, self.regs.hl())?;
                self.regs.set_hl(stacked);
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.regs.hl();
                return Ok(Outcome::hold());
            }

            // EX DE, HL
            0xEB => self.regs.exchange_de_hl(),

            // DI — also cancels a pending EI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
                self.ei_delay = false;
            }

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.regs.hl();
            }

            // EI — takes effect after the next instruction
            0xFB => {
                self.ei_delay = true;
            }

            // Prefix bytes never reach the executor.
            _ => unreachable!("prefix byte {op:#04X} consumed by the decoder"),
        }

        Ok(Outcome::advance())
    }

    /// ALU operation on A selected by bits 5-3 of the opcode.
    fn alu_a(&mut self, op: u8, value: u8) {
        match (op >> 3) & 7 {
            // ADD
            0 => {
                let result = alu::add8(self.regs.a, value, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            // ADC
            1 => {
                let carry = self.regs.f & CF != 0;
                let result = alu::add8(self.regs.a, value, carry);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            // SUB
            2 => {
                let result = alu::sub8(self.regs.a, value, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            // SBC
            3 => {
                let carry = self.regs.f & CF != 0;
                let result = alu::sub8(self.regs.a, value, carry);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            // AND — H set, C and N clear
            4 => {
                self.regs.a &= value;
                self.regs.f = szp(self.regs.a) | HF;
            }
            // XOR
            5 => {
                self.regs.a ^= value;
                self.regs.f = szp(self.regs.a);
            }
            // OR
            6 => {
                self.regs.a |= value;
                self.regs.f = szp(self.regs.a);
            }
            // CP — SUB without the store
            _ => {
                let result = alu::sub8(self.regs.a, value, false);
                self.regs.f = result.flags;
            }
        }
    }

    /// Decimal-adjust A after a BCD add or subtract.
    fn daa(&mut self) {
        let a = self.regs.a;
        let nf = self.regs.f & NF != 0;
        let cf = self.regs.f & CF != 0;
        let hf = self.regs.f & HF != 0;

        let mut correction: u8 = 0;
        let mut new_cf = cf;

        if hf || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if cf || a > 0x99 {
            correction |= 0x60;
            new_cf = true;
        }

        let result = if nf {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let new_hf = if nf {
            hf && (a & 0x0F) < 6
        } else {
            (a & 0x0F) > 9
        };

        self.regs.a = result;
        self.regs.f = szp(result)
            | if nf { NF } else { 0 }
            | if new_cf { CF } else { 0 }
            | if new_hf { HF } else { 0 };
    }

    /// Displacement jump: PC moves relative to the following instruction.
    fn relative_jump(&mut self, size: u8) -> Result<(), Error> {
        let offset = self.imm8(1)? as i8;
        self.regs.pc = self
            .regs
            .pc
            .wrapping_add(u16::from(size))
            .wrapping_add(offset as u16);
        Ok(())
    }

    /// CALL/RST: push the address of the following instruction and jump.
    fn call(&mut self, target: u16, size: u8) -> Result<(), Error> {
        let return_address = self.regs.pc.wrapping_add(u16::from(size));
        self.push_word(return_address)?;
        self.regs.pc = target;
        Ok(())
    }

    // =========================================================================
    // ED-prefixed instructions
    // =========================================================================

    fn execute_extended(&mut self, op: u8) -> Result<Outcome, Error> {
        match op {
            // IN r, (C) (40=B, 48=C, 50=D, 58=E, 60=H, 68=L, 78=A; 70 sets
            // flags only)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let value = self.read_port(self.regs.c);
                if op != 0x70 {
                    self.set_reg8((op >> 3) & 7, value);
                }
                self.regs.f = (self.regs.f & CF) | szp(value);
            }

            // OUT (C), r (41=B, 49=C, 51=D, 59=E, 61=H, 69=L, 79=A; 71
            // writes zero)
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let value = if op == 0x71 {
                    0
                } else {
                    self.reg8((op >> 3) & 7)
                };
                let port = self.regs.c;
                self.write_port(port, value);
            }

            // SBC HL, rr (42=BC, 52=DE, 62=HL, 72=SP)
            0x42 | 0x52 | 0x62 | 0x72 => {
                let rr = self.reg16((op >> 4) & 3);
                let carry = self.regs.f & CF != 0;
                let (value, flags) = alu::sbc16(self.regs.hl(), rr, carry);
                self.regs.set_hl(value);
                self.regs.f = flags;
            }

            // ADC HL, rr (4A=BC, 5A=DE, 6A=HL, 7A=SP)
            0x4A | 0x5A | 0x6A | 0x7A => {
                let rr = self.reg16((op >> 4) & 3);
                let carry = self.regs.f & CF != 0;
                let (value, flags) = alu::adc16(self.regs.hl(), rr, carry);
                self.regs.set_hl(value);
                self.regs.f = flags;
            }

            // LD (nn), rr (43=BC, 53=DE, 63=HL, 73=SP)
            0x43 | 0x53 | 0x63 | 0x73 => {
                let address = self.imm16(2)?;
                let value = self.reg16((op >> 4) & 3);
                self.memory.write_word(address, value)?;
            }

            // LD rr, (nn) (4B=BC, 5B=DE, 6B=HL, 7B=SP)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let address = self.imm16(2)?;
                let value = self.memory.read_word(address)?;
                self.set_reg16((op >> 4) & 3, value);
            }

            // NEG (44 and its duplicate encodings)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }

            // RETN (45 and duplicates) / RETI (4D) — restore IFF1 from IFF2
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.pc = self.pop_word()?;
                self.regs.iff1 = self.regs.iff2;
                return Ok(Outcome::hold());
            }

            // IM 0 (46 and duplicates)
            0x46 | 0x4E | 0x66 | 0x6E => self.regs.im = 0,
            // IM 1 (56, 76)
            0x56 | 0x76 => self.regs.im = 1,
            // IM 2 (5E, 7E)
            0x5E | 0x7E => self.regs.im = 2,

            // LD I, A
            0x47 => self.regs.i = self.regs.a,

            // LD R, A
            0x4F => self.regs.r = self.regs.a,

            // LD A, I — S/Z from the value, P/V from IFF2
            0x57 => {
                self.regs.a = self.regs.i;
                self.interrupt_register_flags();
            }

            // LD A, R
            0x5F => {
                self.regs.a = self.regs.r;
                self.interrupt_register_flags();
            }

            // RRD — low nibble of (HL) into A, nibbles rotate right
            0x67 => {
                let address = self.regs.hl();
                let value = self.memory.read_byte(address)?;
                let a = self.regs.a;
                self.memory
                    .write_byte(address, (a << 4) | (value >> 4))?;
                self.regs.a = (a & 0xF0) | (value & 0x0F);
                self.regs.f = (self.regs.f & CF) | szp(self.regs.a);
            }

            // RLD — nibbles rotate left through A
            0x6F => {
                let address = self.regs.hl();
                let value = self.memory.read_byte(address)?;
                let a = self.regs.a;
                self.memory
                    .write_byte(address, (value << 4) | (a & 0x0F))?;
                self.regs.a = (a & 0xF0) | (value >> 4);
                self.regs.f = (self.regs.f & CF) | szp(self.regs.a);
            }

            // LDI / LDD
            0xA0 => {
                self.block_transfer(1)?;
            }
            0xA8 => {
                self.block_transfer(-1)?;
            }

            // LDIR / LDDR — hold PC while BC != 0
            0xB0 | 0xB8 => {
                let delta = if op == 0xB0 { 1 } else { -1 };
                self.block_transfer(delta)?;
                if self.regs.bc() != 0 {
                    return Ok(Outcome::hold());
                }
                return Ok(Outcome::alternate());
            }

            // CPI / CPD
            0xA1 => {
                self.block_compare(1)?;
            }
            0xA9 => {
                self.block_compare(-1)?;
            }

            // CPIR / CPDR — continue while BC != 0 and not matched
            0xB1 | 0xB9 => {
                let delta = if op == 0xB1 { 1 } else { -1 };
                let matched = self.block_compare(delta)?;
                if self.regs.bc() != 0 && !matched {
                    return Ok(Outcome::hold());
                }
                return Ok(Outcome::alternate());
            }

            // INI / IND
            0xA2 => {
                self.block_input(1)?;
            }
            0xAA => {
                self.block_input(-1)?;
            }

            // INIR / INDR — hold PC while B != 0
            0xB2 | 0xBA => {
                let delta = if op == 0xB2 { 1 } else { -1 };
                self.block_input(delta)?;
                if self.regs.b != 0 {
                    return Ok(Outcome::hold());
                }
                return Ok(Outcome::alternate());
            }

            // OUTI / OUTD
            0xA3 => {
                self.block_output(1)?;
            }
            0xAB => {
                self.block_output(-1)?;
            }

            // OTIR / OTDR
            0xB3 | 0xBB => {
                let delta = if op == 0xB3 { 1 } else { -1 };
                self.block_output(delta)?;
                if self.regs.b != 0 {
                    return Ok(Outcome::hold());
                }
                return Ok(Outcome::alternate());
            }

            _ => unreachable!("undefined ED opcode {op:#04X} rejected by the table"),
        }

        Ok(Outcome::advance())
    }

    /// Flags for `LD A, I` / `LD A, R`: S/Z from the loaded value, H and N
    /// clear, P/V copies IFF2, C preserved.
    fn interrupt_register_flags(&mut self) {
        let mut f = self.regs.f & CF;
        if self.regs.a == 0 {
            f |= ZF;
        }
        if self.regs.a & 0x80 != 0 {
            f |= SF;
        }
        if self.regs.iff2 {
            f |= PF;
        }
        self.regs.f = f;
    }

    /// One step of LDI/LDD/LDIR/LDDR: copy (HL) to (DE), move both
    /// pointers, decrement BC. P/V reports BC != 0.
    fn block_transfer(&mut self, delta: i16) -> Result<(), Error> {
        let value = self.memory.read_byte(self.regs.hl())?;
        self.memory.write_byte(self.regs.de(), value)?;
        self.regs.set_hl(self.regs.hl().wrapping_add(delta as u16));
        self.regs.set_de(self.regs.de().wrapping_add(delta as u16));
        self.regs.set_bc(self.regs.bc().wrapping_sub(1));

        self.regs.f = (self.regs.f & (SF | ZF | CF))
            | if self.regs.bc() != 0 { PF } else { 0 };
        Ok(())
    }

    /// One step of CPI/CPD/CPIR/CPDR: compare A with (HL) without storing,
    /// move HL, decrement BC. Returns whether the bytes matched. Carry is
    /// preserved; P/V reports BC != 0.
    fn block_compare(&mut self, delta: i16) -> Result<bool, Error> {
        let value = self.memory.read_byte(self.regs.hl())?;
        let result = alu::sub8(self.regs.a, value, false);
        self.regs.set_hl(self.regs.hl().wrapping_add(delta as u16));
        self.regs.set_bc(self.regs.bc().wrapping_sub(1));

        self.regs.f = (self.regs.f & CF)
            | (result.flags & (SF | ZF | HF | NF))
            | if self.regs.bc() != 0 { PF } else { 0 };
        Ok(result.flags & ZF != 0)
    }

    /// One step of INI/IND/INIR/INDR: port read into (HL), move HL,
    /// decrement B. Z reports B reaching zero; N is set.
    fn block_input(&mut self, delta: i16) -> Result<(), Error> {
        let port = self.regs.c;
        let value = self.read_port(port);
        self.memory.write_byte(self.regs.hl(), value)?;
        self.regs.set_hl(self.regs.hl().wrapping_add(delta as u16));
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.block_io_flags();
        Ok(())
    }

    /// One step of OUTI/OUTD/OTIR/OTDR: (HL) written to the port, move HL,
    /// decrement B.
    fn block_output(&mut self, delta: i16) -> Result<(), Error> {
        let value = self.memory.read_byte(self.regs.hl())?;
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.c;
        self.write_port(port, value);
        self.regs.set_hl(self.regs.hl().wrapping_add(delta as u16));
        self.block_io_flags();
        Ok(())
    }

    fn block_io_flags(&mut self) {
        self.regs.f = (self.regs.f & CF) | NF | (szp(self.regs.b) & (SF | ZF));
    }

    // =========================================================================
    // CB-prefixed instructions
    // =========================================================================

    fn execute_bit(&mut self, op: u8) -> Result<Outcome, Error> {
        let r = op & 7;

        let value = if r == 6 {
            self.memory.read_byte(self.regs.hl())?
        } else {
            self.reg8(r)
        };

        let written = match op >> 6 {
            // Rotate/shift rows
            0 => {
                let result = self.rotate_shift(op, value);
                self.regs.f = result.flags;
                Some(result.value)
            }
            // BIT b
            1 => {
                self.bit_test(op, value);
                None
            }
            // RES b
            2 => Some(value & !(1 << ((op >> 3) & 7))),
            // SET b
            _ => Some(value | (1 << ((op >> 3) & 7))),
        };

        if let Some(new_value) = written {
            if r == 6 {
                self.memory.write_byte(self.regs.hl(), new_value)?;
            } else {
                self.set_reg8(r, new_value);
            }
        }

        Ok(Outcome::advance())
    }

    /// Rotate/shift selected by bits 5-3 of a bit-family opcode.
    fn rotate_shift(&mut self, op: u8, value: u8) -> alu::AluResult {
        let carry = self.regs.f & CF != 0;
        match (op >> 3) & 7 {
            0 => alu::rlc8(value),
            1 => alu::rrc8(value),
            2 => alu::rl8(value, carry),
            3 => alu::rr8(value, carry),
            4 => alu::sla8(value),
            5 => alu::sra8(value),
            6 => alu::sll8(value),
            _ => alu::srl8(value),
        }
    }

    /// BIT b: Z is the complement of the tested bit; S and P/V mirror Z;
    /// H set, N clear, C preserved.
    fn bit_test(&mut self, op: u8, value: u8) {
        let bit = (op >> 3) & 7;
        let zero = value & (1 << bit) == 0;
        self.regs.f = (self.regs.f & CF)
            | HF
            | if zero { ZF | SF | PF } else { 0 };
    }

    // =========================================================================
    // DD/FD-prefixed instructions
    // =========================================================================

    fn execute_index(&mut self, op: u8, index: Index) -> Result<Outcome, Error> {
        match op {
            // ADD IX/IY, rr (09=BC, 19=DE, 29=IX/IY, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let rr = match (op >> 4) & 3 {
                    0 => self.regs.bc(),
                    1 => self.regs.de(),
                    2 => self.index_reg(index),
                    _ => self.regs.sp,
                };
                let (value, flags) = alu::add16(self.index_reg(index), rr);
                self.set_index_reg(index, value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
            }

            // LD IX/IY, nn
            0x21 => {
                let value = self.imm16(2)?;
                self.set_index_reg(index, value);
            }

            // LD (nn), IX/IY
            0x22 => {
                let address = self.imm16(2)?;
                self.memory.write_word(address, self.index_reg(index))?;
            }

            // INC IX/IY
            0x23 => {
                let value = self.index_reg(index).wrapping_add(1);
                self.set_index_reg(index, value);
            }

            // INC/DEC IXH/IXL (24/25, 2C/2D)
            0x24 | 0x25 | 0x2C | 0x2D => {
                let code = (op >> 3) & 7;
                let value = self.reg8_indexed(code, index);
                let result = if op & 1 == 0 {
                    alu::inc8(value)
                } else {
                    alu::dec8(value)
                };
                self.set_reg8_indexed(code, index, result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // LD IXH/IXL, n (26, 2E)
            0x26 | 0x2E => {
                let value = self.imm8(2)?;
                self.set_reg8_indexed((op >> 3) & 7, index, value);
            }

            // LD IX/IY, (nn)
            0x2A => {
                let address = self.imm16(2)?;
                let value = self.memory.read_word(address)?;
                self.set_index_reg(index, value);
            }

            // DEC IX/IY
            0x2B => {
                let value = self.index_reg(index).wrapping_sub(1);
                self.set_index_reg(index, value);
            }

            // INC (IX+d) / DEC (IX+d)
            0x34 | 0x35 => {
                let address = self.indexed_address(index)?;
                let value = self.memory.read_byte(address)?;
                let result = if op == 0x34 {
                    alu::inc8(value)
                } else {
                    alu::dec8(value)
                };
                self.memory.write_byte(address, result.value)?;
                self.regs.f = (self.regs.f & CF) | result.flags;
            }

            // LD (IX+d), n
            0x36 => {
                let address = self.indexed_address(index)?;
                let value = self.imm8(3)?;
                self.memory.write_byte(address, value)?;
            }

            // LD r, r' with H/L redirected; (IX+d) pairs with the plain
            // register set
            0x40..=0x7F if op != 0x76 => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    let address = self.indexed_address(index)?;
                    let value = self.memory.read_byte(address)?;
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    let address = self.indexed_address(index)?;
                    self.memory.write_byte(address, self.reg8(src))?;
                } else {
                    let value = self.reg8_indexed(src, index);
                    self.set_reg8_indexed(dst, index, value);
                }
            }

            // ALU A, r with H/L redirected
            0x80..=0xBF => {
                let r = op & 7;
                let value = if r == 6 {
                    let address = self.indexed_address(index)?;
                    self.memory.read_byte(address)?
                } else {
                    self.reg8_indexed(r, index)
                };
                self.alu_a(op, value);
            }

            // POP IX/IY
            0xE1 => {
                let value = self.pop_word()?;
                self.set_index_reg(index, value);
            }

            // EX (SP), IX/IY
            0xE3 => {
                let sp = self.regs.sp;
                let stacked = self.memory.read_word(sp)?;
                self.memory.write_word(sp, self.index_reg(index))?;
                self.set_index_reg(index, stacked);
            }

            // PUSH IX/IY
            0xE5 => {
                let value = self.index_reg(index);
                self.push_word(value)?;
            }

            // JP (IX/IY)
            0xE9 => {
                self.regs.pc = self.index_reg(index);
                return Ok(Outcome::hold());
            }

            // LD SP, IX/IY
            0xF9 => {
                self.regs.sp = self.index_reg(index);
            }

            _ => unreachable!("undefined indexed opcode {op:#04X} rejected by the table"),
        }

        Ok(Outcome::advance())
    }

    /// Effective address of the `(IX+d)`/`(IY+d)` operand; the displacement
    /// byte sits after the prefix and opcode bytes.
    fn indexed_address(&self, index: Index) -> Result<u16, Error> {
        let displacement = self.imm8(2)? as i8;
        Ok(self
            .index_reg(index)
            .wrapping_add(displacement as u16))
    }

    // =========================================================================
    // DD CB / FD CB-prefixed instructions
    // =========================================================================

    /// Bit-family operation on `(IX+d)`/`(IY+d)`. Every encoding addresses
    /// memory; the non-memory register encodings also receive a copy of
    /// the result (undocumented store-back).
    fn execute_index_bit(
        &mut self,
        op: u8,
        displacement: i8,
        index: Index,
    ) -> Result<Outcome, Error> {
        let address = self
            .index_reg(index)
            .wrapping_add(displacement as u16);
        let value = self.memory.read_byte(address)?;
        let r = op & 7;

        let written = match op >> 6 {
            0 => {
                let result = self.rotate_shift(op, value);
                self.regs.f = result.flags;
                Some(result.value)
            }
            1 => {
                self.bit_test(op, value);
                None
            }
            2 => Some(value & !(1 << ((op >> 3) & 7))),
            _ => Some(value | (1 << ((op >> 3) & 7))),
        };

        if let Some(new_value) = written {
            self.memory.write_byte(address, new_value)?;
            if r != 6 {
                self.set_reg8(r, new_value);
            }
        }

        Ok(Outcome::advance())
    }
}

//! Static opcode metadata for every instruction-set family.
//!
//! Keyed first by [`OpcodeSet`], then by opcode byte. Each entry carries the
//! informational mnemonic, total size in bytes (prefixes and displacement
//! included), the base cycle count, and — for instructions whose cost
//! depends on whether the action was taken — an alternate count. Base is
//! always the taken/continuing path; the alternate is the suppressed or
//! terminating path.
//!
//! Gaps are `None` and surface as `UnimplementedOpcode`. Bytes a real Z80
//! executes despite being undocumented (the ED NEG/RETN/IM duplicates, the
//! prefix-transparent DD/FD register block, SLL, the IXH/IXL halves) are
//! defined entries; each such decision is visible in the table source.

/// Instruction-set family selected by the prefix bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpcodeSet {
    /// No prefix.
    Standard,
    /// `ED` prefix: block ops, 16-bit arithmetic with carry, I/O.
    ExtendedStandard,
    /// `CB` prefix: rotates, shifts, bit test/set/reset.
    ExtendedBit,
    /// `DD` prefix: HL-indexed instructions redirected to IX.
    Ix,
    /// `FD` prefix: HL-indexed instructions redirected to IY.
    Iy,
    /// `DD CB d` prefix pair; the displacement precedes the final byte.
    IxBit,
    /// `FD CB d` prefix pair.
    IyBit,
}

/// Immutable metadata for one (family, byte) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Human mnemonic, informational only.
    pub mnemonic: &'static str,
    /// Total instruction size in bytes, 1-4, prefixes included.
    pub size: u8,
    /// Machine cycles for the taken/continuing path.
    pub cycles: u32,
    /// Machine cycles for the suppressed/terminating path, where the two
    /// differ.
    pub alternate_cycles: Option<u32>,
}

type Table = [Option<Opcode>; 256];

const fn op(mnemonic: &'static str, size: u8, cycles: u32) -> Option<Opcode> {
    Some(Opcode {
        mnemonic,
        size,
        cycles,
        alternate_cycles: None,
    })
}

const fn op_alt(
    mnemonic: &'static str,
    size: u8,
    cycles: u32,
    alternate: u32,
) -> Option<Opcode> {
    Some(Opcode {
        mnemonic,
        size,
        cycles,
        alternate_cycles: Some(alternate),
    })
}

/// Look up the metadata for an opcode byte within a family.
#[must_use]
pub fn lookup(set: OpcodeSet, byte: u8) -> Option<&'static Opcode> {
    let table = match set {
        OpcodeSet::Standard => &STANDARD,
        OpcodeSet::ExtendedStandard => &EXTENDED_STANDARD,
        OpcodeSet::ExtendedBit => &EXTENDED_BIT,
        OpcodeSet::Ix => &IX,
        OpcodeSet::Iy => &IY,
        OpcodeSet::IxBit => &IX_BIT,
        OpcodeSet::IyBit => &IY_BIT,
    };
    table[byte as usize].as_ref()
}

static STANDARD: Table = standard_table();
static EXTENDED_STANDARD: Table = extended_standard_table();
static EXTENDED_BIT: Table = bit_table("(HL)", 2, 8, 15, 12);
static IX: Table = index_table(IndexNames::Ix);
static IY: Table = index_table(IndexNames::Iy);
static IX_BIT: Table = bit_table("(IX+d)", 4, 23, 23, 20);
static IY_BIT: Table = bit_table("(IY+d)", 4, 23, 23, 20);

#[allow(clippy::too_many_lines)]
const fn standard_table() -> Table {
    let mut t: Table = [None; 256];

    t[0x00] = op("NOP", 1, 4);
    t[0x01] = op("LD BC, nn", 3, 10);
    t[0x02] = op("LD (BC), A", 1, 7);
    t[0x03] = op("INC BC", 1, 6);
    t[0x04] = op("INC B", 1, 4);
    t[0x05] = op("DEC B", 1, 4);
    t[0x06] = op("LD B, n", 2, 7);
    t[0x07] = op("RLCA", 1, 4);
    t[0x08] = op("EX AF, AF'", 1, 4);
    t[0x09] = op("ADD HL, BC", 1, 11);
    t[0x0A] = op("LD A, (BC)", 1, 7);
    t[0x0B] = op("DEC BC", 1, 6);
    t[0x0C] = op("INC C", 1, 4);
    t[0x0D] = op("DEC C", 1, 4);
    t[0x0E] = op("LD C, n", 2, 7);
    t[0x0F] = op("RRCA", 1, 4);

    t[0x10] = op_alt("DJNZ e", 2, 13, 8);
    t[0x11] = op("LD DE, nn", 3, 10);
    t[0x12] = op("LD (DE), A", 1, 7);
    t[0x13] = op("INC DE", 1, 6);
    t[0x14] = op("INC D", 1, 4);
    t[0x15] = op("DEC D", 1, 4);
    t[0x16] = op("LD D, n", 2, 7);
    t[0x17] = op("RLA", 1, 4);
    t[0x18] = op("JR e", 2, 12);
    t[0x19] = op("ADD HL, DE", 1, 11);
    t[0x1A] = op("LD A, (DE)", 1, 7);
    t[0x1B] = op("DEC DE", 1, 6);
    t[0x1C] = op("INC E", 1, 4);
    t[0x1D] = op("DEC E", 1, 4);
    t[0x1E] = op("LD E, n", 2, 7);
    t[0x1F] = op("RRA", 1, 4);

    t[0x20] = op_alt("JR NZ, e", 2, 12, 7);
    t[0x21] = op("LD HL, nn", 3, 10);
    t[0x22] = op("LD (nn), HL", 3, 16);
    t[0x23] = op("INC HL", 1, 6);
    t[0x24] = op("INC H", 1, 4);
    t[0x25] = op("DEC H", 1, 4);
    t[0x26] = op("LD H, n", 2, 7);
    t[0x27] = op("DAA", 1, 4);
    t[0x28] = op_alt("JR Z, e", 2, 12, 7);
    t[0x29] = op("ADD HL, HL", 1, 11);
    t[0x2A] = op("LD HL, (nn)", 3, 16);
    t[0x2B] = op("DEC HL", 1, 6);
    t[0x2C] = op("INC L", 1, 4);
    t[0x2D] = op("DEC L", 1, 4);
    t[0x2E] = op("LD L, n", 2, 7);
    t[0x2F] = op("CPL", 1, 4);

    t[0x30] = op_alt("JR NC, e", 2, 12, 7);
    t[0x31] = op("LD SP, nn", 3, 10);
    t[0x32] = op("LD (nn), A", 3, 13);
    t[0x33] = op("INC SP", 1, 6);
    t[0x34] = op("INC (HL)", 1, 11);
    t[0x35] = op("DEC (HL)", 1, 11);
    t[0x36] = op("LD (HL), n", 2, 10);
    t[0x37] = op("SCF", 1, 4);
    t[0x38] = op_alt("JR C, e", 2, 12, 7);
    t[0x39] = op("ADD HL, SP", 1, 11);
    t[0x3A] = op("LD A, (nn)", 3, 13);
    t[0x3B] = op("DEC SP", 1, 6);
    t[0x3C] = op("INC A", 1, 4);
    t[0x3D] = op("DEC A", 1, 4);
    t[0x3E] = op("LD A, n", 2, 7);
    t[0x3F] = op("CCF", 1, 4);

    // LD r, r' block; (HL) operands cost an extra memory access.
    let mut byte = 0x40;
    while byte < 0x80 {
        if byte != 0x76 {
            let src = byte & 7;
            let dst = (byte >> 3) & 7;
            t[byte] = if src == 6 {
                op("LD r, (HL)", 1, 7)
            } else if dst == 6 {
                op("LD (HL), r", 1, 7)
            } else {
                op("LD r, r'", 1, 4)
            };
        }
        byte += 1;
    }
    t[0x76] = op("HALT", 1, 4);

    // ALU A, r block.
    let mut byte = 0x80;
    while byte < 0xC0 {
        t[byte] = if byte & 7 == 6 {
            match (byte >> 3) & 7 {
                0 => op("ADD A, (HL)", 1, 7),
                1 => op("ADC A, (HL)", 1, 7),
                2 => op("SUB (HL)", 1, 7),
                3 => op("SBC A, (HL)", 1, 7),
                4 => op("AND (HL)", 1, 7),
                5 => op("XOR (HL)", 1, 7),
                6 => op("OR (HL)", 1, 7),
                _ => op("CP (HL)", 1, 7),
            }
        } else {
            match (byte >> 3) & 7 {
                0 => op("ADD A, r", 1, 4),
                1 => op("ADC A, r", 1, 4),
                2 => op("SUB r", 1, 4),
                3 => op("SBC A, r", 1, 4),
                4 => op("AND r", 1, 4),
                5 => op("XOR r", 1, 4),
                6 => op("OR r", 1, 4),
                _ => op("CP r", 1, 4),
            }
        };
        byte += 1;
    }

    t[0xC0] = op_alt("RET NZ", 1, 11, 5);
    t[0xC1] = op("POP BC", 1, 10);
    t[0xC2] = op("JP NZ, nn", 3, 10);
    t[0xC3] = op("JP nn", 3, 10);
    t[0xC4] = op_alt("CALL NZ, nn", 3, 17, 10);
    t[0xC5] = op("PUSH BC", 1, 11);
    t[0xC6] = op("ADD A, n", 2, 7);
    t[0xC7] = op("RST 00h", 1, 11);
    t[0xC8] = op_alt("RET Z", 1, 11, 5);
    t[0xC9] = op("RET", 1, 10);
    t[0xCA] = op("JP Z, nn", 3, 10);
    // 0xCB is the bit-family prefix; the decoder consumes it.
    t[0xCC] = op_alt("CALL Z, nn", 3, 17, 10);
    t[0xCD] = op("CALL nn", 3, 17);
    t[0xCE] = op("ADC A, n", 2, 7);
    t[0xCF] = op("RST 08h", 1, 11);

    t[0xD0] = op_alt("RET NC", 1, 11, 5);
    t[0xD1] = op("POP DE", 1, 10);
    t[0xD2] = op("JP NC, nn", 3, 10);
    t[0xD3] = op("OUT (n), A", 2, 11);
    t[0xD4] = op_alt("CALL NC, nn", 3, 17, 10);
    t[0xD5] = op("PUSH DE", 1, 11);
    t[0xD6] = op("SUB n", 2, 7);
    t[0xD7] = op("RST 10h", 1, 11);
    t[0xD8] = op_alt("RET C", 1, 11, 5);
    t[0xD9] = op("EXX", 1, 4);
    t[0xDA] = op("JP C, nn", 3, 10);
    t[0xDB] = op("IN A, (n)", 2, 11);
    t[0xDC] = op_alt("CALL C, nn", 3, 17, 10);
    // 0xDD is the IX prefix.
    t[0xDE] = op("SBC A, n", 2, 7);
    t[0xDF] = op("RST 18h", 1, 11);

    t[0xE0] = op_alt("RET PO", 1, 11, 5);
    t[0xE1] = op("POP HL", 1, 10);
    t[0xE2] = op("JP PO, nn", 3, 10);
    t[0xE3] = op("EX (SP), HL", 1, 19);
    t[0xE4] = op_alt("CALL PO, nn", 3, 17, 10);
    t[0xE5] = op("PUSH HL", 1, 11);
    t[0xE6] = op("AND n", 2, 7);
    t[0xE7] = op("RST 20h", 1, 11);
    t[0xE8] = op_alt("RET PE", 1, 11, 5);
    t[0xE9] = op("JP (HL)", 1, 4);
    t[0xEA] = op("JP PE, nn", 3, 10);
    t[0xEB] = op("EX DE, HL", 1, 4);
    t[0xEC] = op_alt("CALL PE, nn", 3, 17, 10);
    // 0xED is the extended prefix.
    t[0xEE] = op("XOR n", 2, 7);
    t[0xEF] = op("RST 28h", 1, 11);

    t[0xF0] = op_alt("RET P", 1, 11, 5);
    t[0xF1] = op("POP AF", 1, 10);
    t[0xF2] = op("JP P, nn", 3, 10);
    t[0xF3] = op("DI", 1, 4);
    t[0xF4] = op_alt("CALL P, nn", 3, 17, 10);
    t[0xF5] = op("PUSH AF", 1, 11);
    t[0xF6] = op("OR n", 2, 7);
    t[0xF7] = op("RST 30h", 1, 11);
    t[0xF8] = op_alt("RET M", 1, 11, 5);
    t[0xF9] = op("LD SP, HL", 1, 6);
    t[0xFA] = op("JP M, nn", 3, 10);
    t[0xFB] = op("EI", 1, 4);
    t[0xFC] = op_alt("CALL M, nn", 3, 17, 10);
    // 0xFD is the IY prefix.
    t[0xFE] = op("CP n", 2, 7);
    t[0xFF] = op("RST 38h", 1, 11);

    t
}

#[allow(clippy::too_many_lines)]
const fn extended_standard_table() -> Table {
    let mut t: Table = [None; 256];

    t[0x40] = op("IN B, (C)", 2, 12);
    t[0x41] = op("OUT (C), B", 2, 12);
    t[0x42] = op("SBC HL, BC", 2, 15);
    t[0x43] = op("LD (nn), BC", 4, 20);
    t[0x44] = op("NEG", 2, 8);
    t[0x45] = op("RETN", 2, 14);
    t[0x46] = op("IM 0", 2, 8);
    t[0x47] = op("LD I, A", 2, 9);
    t[0x48] = op("IN C, (C)", 2, 12);
    t[0x49] = op("OUT (C), C", 2, 12);
    t[0x4A] = op("ADC HL, BC", 2, 15);
    t[0x4B] = op("LD BC, (nn)", 4, 20);
    t[0x4C] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x4D] = op("RETI", 2, 14);
    t[0x4E] = op("IM 0", 2, 8); // Undocumented duplicate encoding.
    t[0x4F] = op("LD R, A", 2, 9);

    t[0x50] = op("IN D, (C)", 2, 12);
    t[0x51] = op("OUT (C), D", 2, 12);
    t[0x52] = op("SBC HL, DE", 2, 15);
    t[0x53] = op("LD (nn), DE", 4, 20);
    t[0x54] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x55] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x56] = op("IM 1", 2, 8);
    t[0x57] = op("LD A, I", 2, 9);
    t[0x58] = op("IN E, (C)", 2, 12);
    t[0x59] = op("OUT (C), E", 2, 12);
    t[0x5A] = op("ADC HL, DE", 2, 15);
    t[0x5B] = op("LD DE, (nn)", 4, 20);
    t[0x5C] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x5D] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x5E] = op("IM 2", 2, 8);
    t[0x5F] = op("LD A, R", 2, 9);

    t[0x60] = op("IN H, (C)", 2, 12);
    t[0x61] = op("OUT (C), H", 2, 12);
    t[0x62] = op("SBC HL, HL", 2, 15);
    t[0x63] = op("LD (nn), HL", 4, 20);
    t[0x64] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x65] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x66] = op("IM 0", 2, 8); // Undocumented duplicate encoding.
    t[0x67] = op("RRD", 2, 18);
    t[0x68] = op("IN L, (C)", 2, 12);
    t[0x69] = op("OUT (C), L", 2, 12);
    t[0x6A] = op("ADC HL, HL", 2, 15);
    t[0x6B] = op("LD HL, (nn)", 4, 20);
    t[0x6C] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x6D] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x6E] = op("IM 0", 2, 8); // Undocumented duplicate encoding.
    t[0x6F] = op("RLD", 2, 18);

    t[0x70] = op("IN (C)", 2, 12); // Undocumented: flags only.
    t[0x71] = op("OUT (C), 0", 2, 12); // Undocumented: writes zero.
    t[0x72] = op("SBC HL, SP", 2, 15);
    t[0x73] = op("LD (nn), SP", 4, 20);
    t[0x74] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x75] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x76] = op("IM 1", 2, 8); // Undocumented duplicate encoding.
    t[0x78] = op("IN A, (C)", 2, 12);
    t[0x79] = op("OUT (C), A", 2, 12);
    t[0x7A] = op("ADC HL, SP", 2, 15);
    t[0x7B] = op("LD SP, (nn)", 4, 20);
    t[0x7C] = op("NEG", 2, 8); // Undocumented duplicate encoding.
    t[0x7D] = op("RETN", 2, 14); // Undocumented duplicate encoding.
    t[0x7E] = op("IM 2", 2, 8); // Undocumented duplicate encoding.

    t[0xA0] = op("LDI", 2, 16);
    t[0xA1] = op("CPI", 2, 16);
    t[0xA2] = op("INI", 2, 16);
    t[0xA3] = op("OUTI", 2, 16);
    t[0xA8] = op("LDD", 2, 16);
    t[0xA9] = op("CPD", 2, 16);
    t[0xAA] = op("IND", 2, 16);
    t[0xAB] = op("OUTD", 2, 16);

    t[0xB0] = op_alt("LDIR", 2, 21, 16);
    t[0xB1] = op_alt("CPIR", 2, 21, 16);
    t[0xB2] = op_alt("INIR", 2, 21, 16);
    t[0xB3] = op_alt("OTIR", 2, 21, 16);
    t[0xB8] = op_alt("LDDR", 2, 21, 16);
    t[0xB9] = op_alt("CPDR", 2, 21, 16);
    t[0xBA] = op_alt("INDR", 2, 21, 16);
    t[0xBB] = op_alt("OTDR", 2, 21, 16);

    t
}

/// Build a bit-family table (`CB`, `DD CB`, `FD CB`).
///
/// All 256 bytes are defined. Within a row the eight register encodings
/// share metadata; the memory operand name is the documented form. For the
/// indexed families every encoding addresses `(IX+d)`/`(IY+d)`, with the
/// non-memory encodings additionally copying the result back to the named
/// register (undocumented store-back, handled by the executor).
const fn bit_table(
    mem_operand: &'static str,
    size: u8,
    reg_cycles: u32,
    mem_cycles: u32,
    bit_mem_cycles: u32,
) -> Table {
    // The indexed families route every encoding through memory.
    let indexed = size == 4;

    let mut t: Table = [None; 256];
    let mut byte = 0;
    while byte < 256 {
        let row = byte >> 3;
        let memory_operand = byte & 7 == 6 || indexed;

        let mnemonic = if memory_operand {
            match row {
                0x00 => match_mem(mem_operand, MemRow::Rlc),
                0x01 => match_mem(mem_operand, MemRow::Rrc),
                0x02 => match_mem(mem_operand, MemRow::Rl),
                0x03 => match_mem(mem_operand, MemRow::Rr),
                0x04 => match_mem(mem_operand, MemRow::Sla),
                0x05 => match_mem(mem_operand, MemRow::Sra),
                0x06 => match_mem(mem_operand, MemRow::Sll),
                0x07 => match_mem(mem_operand, MemRow::Srl),
                0x08..=0x0F => match_mem(mem_operand, MemRow::Bit(row - 0x08)),
                0x10..=0x17 => match_mem(mem_operand, MemRow::Res(row - 0x10)),
                _ => match_mem(mem_operand, MemRow::Set(row - 0x18)),
            }
        } else {
            match row {
                0x00 => "RLC r",
                0x01 => "RRC r",
                0x02 => "RL r",
                0x03 => "RR r",
                0x04 => "SLA r",
                0x05 => "SRA r",
                0x06 => "SLL r",
                0x07 => "SRL r",
                0x08..=0x0F => "BIT b, r",
                0x10..=0x17 => "RES b, r",
                _ => "SET b, r",
            }
        };

        let is_bit_test = byte >= 0x40 && byte < 0x80;
        let cycles = if memory_operand {
            if is_bit_test {
                bit_mem_cycles
            } else {
                mem_cycles
            }
        } else {
            reg_cycles
        };

        t[byte] = op(mnemonic, size, cycles);
        byte += 1;
    }
    t
}

enum MemRow {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
    Bit(usize),
    Res(usize),
    Set(usize),
}

/// Pick the memory-operand mnemonic literal for a bit-family row.
const fn match_mem(operand: &'static str, row: MemRow) -> &'static str {
    // Three operand spellings x every row; string literals cannot be
    // concatenated in const context, so the matrix is spelled out.
    let hl = str_eq(operand, "(HL)");
    let ix = str_eq(operand, "(IX+d)");
    match row {
        MemRow::Rlc => pick(hl, ix, "RLC (HL)", "RLC (IX+d)", "RLC (IY+d)"),
        MemRow::Rrc => pick(hl, ix, "RRC (HL)", "RRC (IX+d)", "RRC (IY+d)"),
        MemRow::Rl => pick(hl, ix, "RL (HL)", "RL (IX+d)", "RL (IY+d)"),
        MemRow::Rr => pick(hl, ix, "RR (HL)", "RR (IX+d)", "RR (IY+d)"),
        MemRow::Sla => pick(hl, ix, "SLA (HL)", "SLA (IX+d)", "SLA (IY+d)"),
        MemRow::Sra => pick(hl, ix, "SRA (HL)", "SRA (IX+d)", "SRA (IY+d)"),
        MemRow::Sll => pick(hl, ix, "SLL (HL)", "SLL (IX+d)", "SLL (IY+d)"),
        MemRow::Srl => pick(hl, ix, "SRL (HL)", "SRL (IX+d)", "SRL (IY+d)"),
        MemRow::Bit(n) => match n {
            0 => pick(hl, ix, "BIT 0, (HL)", "BIT 0, (IX+d)", "BIT 0, (IY+d)"),
            1 => pick(hl, ix, "BIT 1, (HL)", "BIT 1, (IX+d)", "BIT 1, (IY+d)"),
            2 => pick(hl, ix, "BIT 2, (HL)", "BIT 2, (IX+d)", "BIT 2, (IY+d)"),
            3 => pick(hl, ix, "BIT 3, (HL)", "BIT 3, (IX+d)", "BIT 3, (IY+d)"),
            4 => pick(hl, ix, "BIT 4, (HL)", "BIT 4, (IX+d)", "BIT 4, (IY+d)"),
            5 => pick(hl, ix, "BIT 5, (HL)", "BIT 5, (IX+d)", "BIT 5, (IY+d)"),
            6 => pick(hl, ix, "BIT 6, (HL)", "BIT 6, (IX+d)", "BIT 6, (IY+d)"),
            _ => pick(hl, ix, "BIT 7, (HL)", "BIT 7, (IX+d)", "BIT 7, (IY+d)"),
        },
        MemRow::Res(n) => match n {
            0 => pick(hl, ix, "RES 0, (HL)", "RES 0, (IX+d)", "RES 0, (IY+d)"),
            1 => pick(hl, ix, "RES 1, (HL)", "RES 1, (IX+d)", "RES 1, (IY+d)"),
            2 => pick(hl, ix, "RES 2, (HL)", "RES 2, (IX+d)", "RES 2, (IY+d)"),
            3 => pick(hl, ix, "RES 3, (HL)", "RES 3, (IX+d)", "RES 3, (IY+d)"),
            4 => pick(hl, ix, "RES 4, (HL)", "RES 4, (IX+d)", "RES 4, (IY+d)"),
            5 => pick(hl, ix, "RES 5, (HL)", "RES 5, (IX+d)", "RES 5, (IY+d)"),
            6 => pick(hl, ix, "RES 6, (HL)", "RES 6, (IX+d)", "RES 6, (IY+d)"),
            _ => pick(hl, ix, "RES 7, (HL)", "RES 7, (IX+d)", "RES 7, (IY+d)"),
        },
        MemRow::Set(n) => match n {
            0 => pick(hl, ix, "SET 0, (HL)", "SET 0, (IX+d)", "SET 0, (IY+d)"),
            1 => pick(hl, ix, "SET 1, (HL)", "SET 1, (IX+d)", "SET 1, (IY+d)"),
            2 => pick(hl, ix, "SET 2, (HL)", "SET 2, (IX+d)", "SET 2, (IY+d)"),
            3 => pick(hl, ix, "SET 3, (HL)", "SET 3, (IX+d)", "SET 3, (IY+d)"),
            4 => pick(hl, ix, "SET 4, (HL)", "SET 4, (IX+d)", "SET 4, (IY+d)"),
            5 => pick(hl, ix, "SET 5, (HL)", "SET 5, (IX+d)", "SET 5, (IY+d)"),
            6 => pick(hl, ix, "SET 6, (HL)", "SET 6, (IX+d)", "SET 6, (IY+d)"),
            _ => pick(hl, ix, "SET 7, (HL)", "SET 7, (IX+d)", "SET 7, (IY+d)"),
        },
    }
}

const fn pick(
    hl: bool,
    ix: bool,
    hl_name: &'static str,
    ix_name: &'static str,
    iy_name: &'static str,
) -> &'static str {
    if hl {
        hl_name
    } else if ix {
        ix_name
    } else {
        iy_name
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Mnemonic spellings that differ between the IX and IY families.
enum IndexNames {
    Ix,
    Iy,
}

#[allow(clippy::too_many_lines)]
const fn index_table(names: IndexNames) -> Table {
    let ix = matches!(names, IndexNames::Ix);
    let mut t: Table = [None; 256];

    // s(a, b) below: IX spelling, IY spelling.
    macro_rules! s {
        ($ix:literal, $iy:literal) => {
            if ix {
                $ix
            } else {
                $iy
            }
        };
    }

    t[0x09] = op(s!("ADD IX, BC", "ADD IY, BC"), 2, 15);
    t[0x19] = op(s!("ADD IX, DE", "ADD IY, DE"), 2, 15);
    t[0x21] = op(s!("LD IX, nn", "LD IY, nn"), 4, 14);
    t[0x22] = op(s!("LD (nn), IX", "LD (nn), IY"), 4, 20);
    t[0x23] = op(s!("INC IX", "INC IY"), 2, 10);
    t[0x24] = op(s!("INC IXH", "INC IYH"), 2, 8);
    t[0x25] = op(s!("DEC IXH", "DEC IYH"), 2, 8);
    t[0x26] = op(s!("LD IXH, n", "LD IYH, n"), 3, 11);
    t[0x29] = op(s!("ADD IX, IX", "ADD IY, IY"), 2, 15);
    t[0x2A] = op(s!("LD IX, (nn)", "LD IY, (nn)"), 4, 20);
    t[0x2B] = op(s!("DEC IX", "DEC IY"), 2, 10);
    t[0x2C] = op(s!("INC IXL", "INC IYL"), 2, 8);
    t[0x2D] = op(s!("DEC IXL", "DEC IYL"), 2, 8);
    t[0x2E] = op(s!("LD IXL, n", "LD IYL, n"), 3, 11);
    t[0x34] = op(s!("INC (IX+d)", "INC (IY+d)"), 3, 23);
    t[0x35] = op(s!("DEC (IX+d)", "DEC (IY+d)"), 3, 23);
    t[0x36] = op(s!("LD (IX+d), n", "LD (IY+d), n"), 4, 19);
    t[0x39] = op(s!("ADD IX, SP", "ADD IY, SP"), 2, 15);

    // Register-to-register block. H and L operands address the index
    // halves; encodings touching neither are prefix-transparent and run as
    // the unprefixed instruction with the prefix fetch cost added.
    let mut byte = 0x40;
    while byte < 0x80 {
        if byte != 0x76 {
            let src = byte & 7;
            let dst = (byte >> 3) & 7;
            t[byte] = if src == 6 {
                op(s!("LD r, (IX+d)", "LD r, (IY+d)"), 3, 19)
            } else if dst == 6 {
                op(s!("LD (IX+d), r", "LD (IY+d), r"), 3, 19)
            } else {
                op("LD r, r'", 2, 8)
            };
        }
        byte += 1;
    }

    let mut byte = 0x80;
    while byte < 0xC0 {
        t[byte] = if byte & 7 == 6 {
            match (byte >> 3) & 7 {
                0 => op(s!("ADD A, (IX+d)", "ADD A, (IY+d)"), 3, 19),
                1 => op(s!("ADC A, (IX+d)", "ADC A, (IY+d)"), 3, 19),
                2 => op(s!("SUB (IX+d)", "SUB (IY+d)"), 3, 19),
                3 => op(s!("SBC A, (IX+d)", "SBC A, (IY+d)"), 3, 19),
                4 => op(s!("AND (IX+d)", "AND (IY+d)"), 3, 19),
                5 => op(s!("XOR (IX+d)", "XOR (IY+d)"), 3, 19),
                6 => op(s!("OR (IX+d)", "OR (IY+d)"), 3, 19),
                _ => op(s!("CP (IX+d)", "CP (IY+d)"), 3, 19),
            }
        } else {
            match (byte >> 3) & 7 {
                0 => op("ADD A, r", 2, 8),
                1 => op("ADC A, r", 2, 8),
                2 => op("SUB r", 2, 8),
                3 => op("SBC A, r", 2, 8),
                4 => op("AND r", 2, 8),
                5 => op("XOR r", 2, 8),
                6 => op("OR r", 2, 8),
                _ => op("CP r", 2, 8),
            }
        };
        byte += 1;
    }

    t[0xE1] = op(s!("POP IX", "POP IY"), 2, 14);
    t[0xE3] = op(s!("EX (SP), IX", "EX (SP), IY"), 2, 23);
    t[0xE5] = op(s!("PUSH IX", "PUSH IY"), 2, 15);
    t[0xE9] = op(s!("JP (IX)", "JP (IY)"), 2, 8);
    t[0xF9] = op(s!("LD SP, IX", "LD SP, IY"), 2, 10);

    t
}

//! Z80 CPU core: construction, reset, decode, and dispatch.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Intentional i8 casts for displacements.

use log::{debug, trace, warn};
use zed80_core::{Cpu, Observable, Ticks, Value};

use crate::config::Config;
use crate::error::Error;
use crate::flags::{CF, HF, NF, PF, SF, ZF};
use crate::memory::Memory;
use crate::opcodes::{self, OpcodeSet};
use crate::registers::Registers;

/// Host hook invoked on IN-family instructions with the port number; the
/// returned byte is what the guest reads.
pub type DeviceRead = Box<dyn FnMut(u8) -> u8>;

/// Host hook invoked on OUT-family instructions with the port number and
/// the byte written.
pub type DeviceWrite = Box<dyn FnMut(u8, u8)>;

/// What the guest reads from a port when no read hook is installed
/// (floating bus).
const OPEN_BUS: u8 = 0xFF;

/// Cycle cost of an RST, which is also what a delivered interrupt costs.
const RST_CYCLES: u64 = 11;

/// Executor verdict for one instruction.
///
/// `advance_pc` defaults to true; executors that transferred control (or
/// that hold PC for a repeating block instruction) clear it.
/// `use_alternate_cycles` selects the suppressed/terminating cycle count.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Outcome {
    pub advance_pc: bool,
    pub use_alternate_cycles: bool,
}

impl Outcome {
    /// Normal completion: advance PC, report base cycles.
    pub(crate) const fn advance() -> Self {
        Self {
            advance_pc: true,
            use_alternate_cycles: false,
        }
    }

    /// Control transferred or PC held for a repeat: base cycles.
    pub(crate) const fn hold() -> Self {
        Self {
            advance_pc: false,
            use_alternate_cycles: false,
        }
    }

    /// Suppressed conditional or terminating block step: advance PC,
    /// report the alternate cycle count.
    pub(crate) const fn alternate() -> Self {
        Self {
            advance_pc: true,
            use_alternate_cycles: true,
        }
    }
}

/// Which index register a `DD`/`FD` family executor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Index {
    Ix,
    Iy,
}

/// The decoded location of one instruction: family, final opcode byte, and
/// the displacement for the doubly-prefixed bit families.
struct Decoded {
    set: OpcodeSet,
    opcode: u8,
    displacement: i8,
}

/// The Z80 core.
///
/// Owns its memory image. `step()` executes one instruction and returns
/// its machine-cycle cost; `step_interrupt()` injects a RST-style
/// interrupt between steps. Port traffic is surfaced through the two
/// injected device hooks.
pub struct Z80 {
    pub(crate) regs: Registers,
    pub(crate) memory: Memory,
    config: Config,
    /// True once HALT executed and no interrupt has since fired.
    finished: bool,
    /// EI takes effect after the following instruction completes.
    pub(crate) ei_delay: bool,
    device_read: Option<DeviceRead>,
    device_write: Option<DeviceWrite>,
}

impl Z80 {
    /// Create a core from a configuration snapshot and reset it.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            memory: Memory::new(0, (0, 0), (0, 0)),
            config,
            finished: false,
            ei_delay: false,
            device_read: None,
            device_write: None,
        };
        cpu.reset();
        cpu
    }

    /// Reset to the configured initial state.
    ///
    /// Re-allocates the memory image, restores registers, flags, PC, SP,
    /// and the interrupt latches from the configuration, and clears the
    /// finished state.
    pub fn reset(&mut self) {
        self.memory = Memory::new(
            self.config.effective_memory_size(),
            (
                self.config.writeable_memory_start,
                self.config.writeable_memory_end,
            ),
            (
                self.config.mirror_memory_start,
                self.config.mirror_memory_end,
            ),
        );
        self.regs = self.config.registers;
        self.regs.pc = self.config.program_counter;
        self.regs.sp = self.config.stack_pointer;
        self.regs.iff1 = self.config.interrupts_enabled;
        self.regs.iff2 = self.config.interrupts_enabled;
        self.regs.halted = false;
        self.finished = false;
        self.ei_delay = false;
        debug!(
            "reset: pc={:#06X} sp={:#06X} memory={} bytes",
            self.regs.pc,
            self.regs.sp,
            self.memory.len()
        );
    }

    /// Copy a program image into low memory, zero-filling the rest.
    ///
    /// # Errors
    ///
    /// `MemoryOverflow` when the image exceeds the configured memory size.
    pub fn load_memory(&mut self, image: &[u8]) -> Result<(), Error> {
        self.memory.load(image)?;
        debug!("loaded {} bytes into low memory", image.len());
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// Fetches at PC, consumes prefix bytes, dispatches to the executor,
    /// advances PC by the table size unless the executor transferred
    /// control, and returns the cycle count the table assigns to the path
    /// taken.
    ///
    /// # Errors
    ///
    /// `ExecutionAfterHalt` once finished; `UnimplementedOpcode` for table
    /// gaps; `IllegalMemoryAccess` from any rejected memory access;
    /// `InvalidOpcodeTable` if an executor requests a missing alternate
    /// count.
    pub fn step(&mut self) -> Result<Ticks, Error> {
        if self.finished {
            return Err(Error::ExecutionAfterHalt);
        }
        let pending_ei = self.ei_delay;

        let pc = self.regs.pc;
        let decoded = self.decode(pc)?;
        let Some(entry) = opcodes::lookup(decoded.set, decoded.opcode) else {
            warn!(
                "undefined opcode {:#04X} in {:?} set at {pc:#06X}",
                decoded.opcode, decoded.set
            );
            return Err(Error::UnimplementedOpcode {
                set: decoded.set,
                bytes: self.raw_bytes(&decoded),
                pc,
            });
        };

        self.bump_r(decoded.set);
        let outcome = self.execute(
            decoded.set,
            decoded.opcode,
            decoded.displacement,
            entry.size,
        )?;

        if outcome.advance_pc {
            self.regs.pc = pc.wrapping_add(u16::from(entry.size));
        }

        let cycles = if outcome.use_alternate_cycles {
            entry.alternate_cycles.ok_or(Error::InvalidOpcodeTable {
                set: decoded.set,
                opcode: decoded.opcode,
            })?
        } else {
            entry.cycles
        };

        // EI defers the latch update until the end of the next instruction,
        // unless that instruction cancelled it (DI).
        if pending_ei && self.ei_delay {
            self.regs.iff1 = true;
            self.regs.iff2 = true;
            self.ei_delay = false;
        }

        Ok(Ticks::from(cycles))
    }

    /// Deliver an interrupt on vector `id`, as `RST 8*id`.
    ///
    /// Pushes the current PC through the memory interface, jumps to the
    /// vector, clears both interrupt latches (maskable acknowledge), and
    /// wakes a halted core.
    ///
    /// # Errors
    ///
    /// `UnhandledInterrupt` for ids outside 0..=7; `IllegalMemoryAccess`
    /// if the stack push is rejected.
    pub fn step_interrupt(&mut self, id: u8) -> Result<Ticks, Error> {
        if id > 7 {
            return Err(Error::UnhandledInterrupt { id });
        }
        trace!("interrupt {id} at pc={:#06X}", self.regs.pc);

        let pc = self.regs.pc;
        self.push_word(pc)?;
        self.regs.pc = u16::from(id) * 8;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.halted = false;
        self.finished = false;
        self.ei_delay = false;
        Ok(Ticks::new(RST_CYCLES))
    }

    /// Install the device-read hook for IN-family instructions.
    pub fn on_device_read(&mut self, hook: DeviceRead) {
        self.device_read = Some(hook);
    }

    /// Install the device-write hook for OUT-family instructions.
    pub fn on_device_write(&mut self, hook: DeviceWrite) {
        self.device_write = Some(hook);
    }

    /// Architectural register snapshot.
    #[must_use]
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Mutable access to the architectural registers between steps.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// The memory image, readable between steps.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to the memory image. Writes through this reference
    /// bypass the writeable-window check.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// True once HALT executed and no interrupt has since fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    // === Decode ===

    /// Identify the instruction at `pc`: consume prefixes and, for the
    /// doubly-prefixed families, the displacement byte that precedes the
    /// final opcode byte.
    fn decode(&self, pc: u16) -> Result<Decoded, Error> {
        let first = self.memory.read_byte(pc)?;
        let decoded = match first {
            0xCB => Decoded {
                set: OpcodeSet::ExtendedBit,
                opcode: self.memory.read_byte(pc.wrapping_add(1))?,
                displacement: 0,
            },
            0xED => Decoded {
                set: OpcodeSet::ExtendedStandard,
                opcode: self.memory.read_byte(pc.wrapping_add(1))?,
                displacement: 0,
            },
            0xDD | 0xFD => {
                let second = self.memory.read_byte(pc.wrapping_add(1))?;
                if second == 0xCB {
                    Decoded {
                        set: if first == 0xDD {
                            OpcodeSet::IxBit
                        } else {
                            OpcodeSet::IyBit
                        },
                        opcode: self.memory.read_byte(pc.wrapping_add(3))?,
                        displacement: self.memory.read_byte(pc.wrapping_add(2))? as i8,
                    }
                } else {
                    Decoded {
                        set: if first == 0xDD {
                            OpcodeSet::Ix
                        } else {
                            OpcodeSet::Iy
                        },
                        opcode: second,
                        displacement: 0,
                    }
                }
            }
            byte => Decoded {
                set: OpcodeSet::Standard,
                opcode: byte,
                displacement: 0,
            },
        };
        Ok(decoded)
    }

    /// The raw instruction bytes for error reporting.
    fn raw_bytes(&self, decoded: &Decoded) -> Vec<u8> {
        match decoded.set {
            OpcodeSet::Standard => vec![decoded.opcode],
            OpcodeSet::ExtendedBit => vec![0xCB, decoded.opcode],
            OpcodeSet::ExtendedStandard => vec![0xED, decoded.opcode],
            OpcodeSet::Ix => vec![0xDD, decoded.opcode],
            OpcodeSet::Iy => vec![0xFD, decoded.opcode],
            OpcodeSet::IxBit => {
                vec![0xDD, 0xCB, decoded.displacement as u8, decoded.opcode]
            }
            OpcodeSet::IyBit => {
                vec![0xFD, 0xCB, decoded.displacement as u8, decoded.opcode]
            }
        }
    }

    /// Advance the refresh counter once per fetched opcode byte (prefix
    /// bytes refresh too; the displacement fetch does not). Bit 7 is
    /// preserved.
    fn bump_r(&mut self, set: OpcodeSet) {
        let fetches = match set {
            OpcodeSet::Standard => 1,
            _ => 2,
        };
        for _ in 0..fetches {
            self.regs.r = (self.regs.r & 0x80) | (self.regs.r.wrapping_add(1) & 0x7F);
        }
    }

    // === Operand access ===

    /// Immediate byte at `pc + offset`.
    pub(crate) fn imm8(&self, offset: u16) -> Result<u8, Error> {
        self.memory.read_byte(self.regs.pc.wrapping_add(offset))
    }

    /// Little-endian immediate word at `pc + offset`.
    pub(crate) fn imm16(&self, offset: u16) -> Result<u16, Error> {
        self.memory.read_word(self.regs.pc.wrapping_add(offset))
    }

    // === Register encodings ===

    /// Register by 3-bit encoding. Encoding 6 is the memory operand and is
    /// handled by the callers.
    pub(crate) fn reg8(&self, code: u8) -> u8 {
        match code & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => 0,
        }
    }

    pub(crate) fn set_reg8(&mut self, code: u8, value: u8) {
        match code & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => {}
        }
    }

    /// Register by 3-bit encoding with H/L redirected to the index-register
    /// halves (undocumented IXH/IXL/IYH/IYL forms).
    pub(crate) fn reg8_indexed(&self, code: u8, index: Index) -> u8 {
        match code & 7 {
            4 => (self.index_reg(index) >> 8) as u8,
            5 => self.index_reg(index) as u8,
            other => self.reg8(other),
        }
    }

    pub(crate) fn set_reg8_indexed(&mut self, code: u8, index: Index, value: u8) {
        match code & 7 {
            4 => {
                let reg = self.index_reg(index);
                self.set_index_reg(index, (reg & 0x00FF) | (u16::from(value) << 8));
            }
            5 => {
                let reg = self.index_reg(index);
                self.set_index_reg(index, (reg & 0xFF00) | u16::from(value));
            }
            other => self.set_reg8(other, value),
        }
    }

    /// Register pair by 2-bit encoding (BC, DE, HL, SP).
    pub(crate) fn reg16(&self, code: u8) -> u16 {
        match code & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_reg16(&mut self, code: u8, value: u16) {
        match code & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Register pair for PUSH/POP (AF in place of SP).
    pub(crate) fn reg16_af(&self, code: u8) -> u16 {
        match code & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.af(),
        }
    }

    pub(crate) fn set_reg16_af(&mut self, code: u8, value: u16) {
        match code & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.set_af(value),
        }
    }

    pub(crate) fn index_reg(&self, index: Index) -> u16 {
        match index {
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    pub(crate) fn set_index_reg(&mut self, index: Index, value: u16) {
        match index {
            Index::Ix => self.regs.ix = value,
            Index::Iy => self.regs.iy = value,
        }
    }

    /// Evaluate a 3-bit condition code.
    pub(crate) fn condition(&self, code: u8) -> bool {
        match code & 7 {
            0 => self.regs.f & ZF == 0, // NZ
            1 => self.regs.f & ZF != 0, // Z
            2 => self.regs.f & CF == 0, // NC
            3 => self.regs.f & CF != 0, // C
            4 => self.regs.f & PF == 0, // PO
            5 => self.regs.f & PF != 0, // PE
            6 => self.regs.f & SF == 0, // P
            _ => self.regs.f & SF != 0, // M
        }
    }

    // === Stack ===

    /// Push a word: pre-decrement SP twice, high byte at the higher
    /// address.
    pub(crate) fn push_word(&mut self, value: u16) -> Result<(), Error> {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.memory.write_byte(self.regs.sp, (value >> 8) as u8)?;
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.memory.write_byte(self.regs.sp, value as u8)
    }

    /// Pop a word: low byte first, SP post-incremented twice.
    pub(crate) fn pop_word(&mut self) -> Result<u16, Error> {
        let lo = self.memory.read_byte(self.regs.sp)?;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.memory.read_byte(self.regs.sp)?;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        Ok(u16::from(lo) | (u16::from(hi) << 8))
    }

    // === Device I/O ===

    /// Read a byte from a port through the injected hook.
    pub(crate) fn read_port(&mut self, port: u8) -> u8 {
        match &mut self.device_read {
            Some(hook) => hook(port),
            None => OPEN_BUS,
        }
    }

    /// Write a byte to a port through the injected hook.
    pub(crate) fn write_port(&mut self, port: u8, value: u8) {
        if let Some(hook) = &mut self.device_write {
            hook(port, value);
        }
    }

    /// Mark the core finished: the last executed opcode was HALT.
    pub(crate) fn halt(&mut self) {
        self.finished = true;
        self.regs.halted = true;
    }
}

// Instruction execution lives in a separate file for readability.
mod execute;

impl Cpu for Z80 {
    type Registers = Registers;
    type Error = Error;

    fn step(&mut self) -> Result<Ticks, Error> {
        self.step()
    }

    fn step_interrupt(&mut self, id: u8) -> Result<Ticks, Error> {
        self.step_interrupt(id)
    }

    fn reset(&mut self) {
        self.reset();
    }

    fn pc(&self) -> u16 {
        self.pc()
    }

    fn registers(&self) -> Registers {
        self.registers()
    }

    fn is_finished(&self) -> bool {
        self.is_finished()
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Shadow registers
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r",
    // Flags (individual)
    "flags.s", "flags.z", "flags.h", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im",
    // CPU state
    "halted", "finished",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),

            "a'" => Some(self.regs.a_alt.into()),
            "f'" => Some(self.regs.f_alt.into()),
            "b'" => Some(self.regs.b_alt.into()),
            "c'" => Some(self.regs.c_alt.into()),
            "d'" => Some(self.regs.d_alt.into()),
            "e'" => Some(self.regs.e_alt.into()),
            "h'" => Some(self.regs.h_alt.into()),
            "l'" => Some(self.regs.l_alt.into()),

            "ix" => Some(self.regs.ix.into()),
            "iy" => Some(self.regs.iy.into()),
            "ixh" => Some(((self.regs.ix >> 8) as u8).into()),
            "ixl" => Some((self.regs.ix as u8).into()),
            "iyh" => Some(((self.regs.iy >> 8) as u8).into()),
            "iyl" => Some((self.regs.iy as u8).into()),

            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),
            "i" => Some(self.regs.i.into()),
            "r" => Some(self.regs.r.into()),

            "flags.s" => Some((self.regs.f & SF != 0).into()),
            "flags.z" => Some((self.regs.f & ZF != 0).into()),
            "flags.h" => Some((self.regs.f & HF != 0).into()),
            "flags.p" => Some((self.regs.f & PF != 0).into()),
            "flags.n" => Some((self.regs.f & NF != 0).into()),
            "flags.c" => Some((self.regs.f & CF != 0).into()),

            "iff1" => Some(self.regs.iff1.into()),
            "iff2" => Some(self.regs.iff2.into()),
            "im" => Some(self.regs.im.into()),

            "halted" => Some(self.regs.halted.into()),
            "finished" => Some(self.finished.into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}

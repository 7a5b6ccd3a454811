//! Instruction-stepped, cycle-counted Zilog Z80 emulator core.
//!
//! Each call to [`Z80::step`] executes exactly one instruction against the
//! core's own memory and returns the machine cycles it consumed. Interrupts
//! are injected by the host via [`Z80::step_interrupt`]; port traffic is
//! surfaced through two injected device hooks.

mod alu;
mod config;
mod cpu;
mod error;
mod flags;
mod memory;
mod opcodes;
mod registers;

pub use config::Config;
pub use cpu::{DeviceRead, DeviceWrite, Z80};
pub use error::Error;
pub use flags::{CF, HF, NF, PF, SF, ZF};
pub use memory::Memory;
pub use opcodes::{Opcode, OpcodeSet};
pub use registers::Registers;

pub use zed80_core::{Cpu, Observable, Ticks, Value};

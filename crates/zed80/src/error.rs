//! Errors surfaced at the core boundary.
//!
//! All of these are fatal with respect to the current step: they unwind to
//! the caller without rolling back effects already committed earlier in the
//! step. Guest-code arithmetic overflow is never an error.

use thiserror::Error;

use crate::opcodes::OpcodeSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The opcode table has no entry for the decoded (prefix, byte) pair.
    #[error("unimplemented opcode {bytes:02X?} in {set:?} set at {pc:#06X}")]
    UnimplementedOpcode {
        set: OpcodeSet,
        bytes: Vec<u8>,
        pc: u16,
    },

    /// Internal table inconsistency: an executor requested the alternate
    /// cycle count but the entry carries none. A bug in the table, not in
    /// guest code.
    #[error("opcode table entry {opcode:#04X} in {set:?} set has no alternate cycle count")]
    InvalidOpcodeTable { set: OpcodeSet, opcode: u8 },

    /// Read or write outside the legal bounds after considering mirroring.
    #[error("illegal memory access at {address:#06X} (allowed {start:#06X}..={end:#06X})")]
    IllegalMemoryAccess { address: u16, start: u16, end: u16 },

    /// LoadMemory was handed more bytes than the configured memory size.
    #[error("memory image of {len} bytes exceeds memory size {capacity}")]
    MemoryOverflow { len: usize, capacity: usize },

    /// Step was called after HALT without an intervening reset or interrupt.
    #[error("execution after HALT")]
    ExecutionAfterHalt,

    /// StepInterrupt was given a vector id outside 0..=7.
    #[error("unhandled interrupt id {id}")]
    UnhandledInterrupt { id: u8 },
}

//! CPU instance configuration.

use typed_builder::TypedBuilder;

use crate::registers::Registers;

/// Largest addressable memory image (the full 16-bit address space).
pub const MAX_MEMORY_SIZE: usize = 0x1_0000;

/// Configuration snapshot a [`crate::Z80`] is constructed from.
///
/// Only `memory_size` is required; everything else defaults to the
/// power-on state. Window pairs with both bounds zero are disabled:
/// a disabled writeable window makes every in-image address writeable.
///
/// ```
/// use zed80::Config;
///
/// let config = Config::builder()
///     .memory_size(0x10000)
///     .program_counter(0x0100)
///     .stack_pointer(0xFE00)
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Size of the linear memory image in bytes. At most 65,536.
    pub memory_size: usize,

    /// Initial register and flag values. Defaults to all zero.
    #[builder(default)]
    pub registers: Registers,

    /// Initial program counter.
    #[builder(default)]
    pub program_counter: u16,

    /// Initial stack pointer.
    #[builder(default)]
    pub stack_pointer: u16,

    /// Initial state of both interrupt-enable latches.
    #[builder(default)]
    pub interrupts_enabled: bool,

    /// Inclusive start of the writeable window.
    #[builder(default)]
    pub writeable_memory_start: u16,

    /// Inclusive end of the writeable window.
    #[builder(default)]
    pub writeable_memory_end: u16,

    /// Inclusive start of the mirror window.
    #[builder(default)]
    pub mirror_memory_start: u16,

    /// Inclusive end of the mirror window.
    #[builder(default)]
    pub mirror_memory_end: u16,
}

impl Config {
    /// Memory size clamped to the 16-bit address space.
    #[must_use]
    pub fn effective_memory_size(&self) -> usize {
        self.memory_size.min(MAX_MEMORY_SIZE)
    }
}

//! CPU core trait.

use crate::Ticks;

/// An instruction-stepped CPU core.
///
/// One call to `step()` fetches, decodes, and executes exactly one
/// instruction. The core owns its memory; hosts drive it in a loop and
/// inject interrupts between steps.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// The error type surfaced at the core boundary.
    type Error;

    /// Execute one instruction, returning the machine cycles it consumed.
    ///
    /// # Errors
    ///
    /// Fails when the core has finished (executed HALT), when the decoded
    /// opcode has no table entry, or when a memory access falls outside the
    /// legal bounds.
    fn step(&mut self) -> Result<Ticks, Self::Error>;

    /// Deliver an interrupt on the given vector, as a RST to `8 * id`.
    ///
    /// Returns the cycle cost of the restart. Clears the finished state so
    /// a halted core resumes at the vector.
    ///
    /// # Errors
    ///
    /// Fails when `id` is outside `0..=7` or the stack push is rejected by
    /// the memory interface.
    fn step_interrupt(&mut self, id: u8) -> Result<Ticks, Self::Error>;

    /// Reset the CPU to its configured initial state.
    fn reset(&mut self);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true once HALT has executed and no interrupt has since fired.
    fn is_finished(&self) -> bool;
}

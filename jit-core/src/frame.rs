use crate::operand::StackSlot;
use crate::reg::WORD_SIZE;

/// Fixed record shared with the runtime (spec §3 "Stack frame descriptor").
///
/// The argument area offset is carried as a field rather than a literal
/// scattered through the emitter, per the invariant that the emitter "must
/// reference the argument area offset from an external constant, not
/// hard-code it" — callers construct one `StackFrameDescriptor` from the
/// runtime's layout and every stub/emitter call takes it as a parameter.
#[derive(Debug, Clone, Copy)]
pub struct StackFrameDescriptor {
    /// Total size, in bytes, of the locals/spill area below the saved
    /// `%ebp` (passed to `sub $frame_size, %esp` in the prologue).
    pub frame_size: i32,
    /// Offset from `%ebp` at which the first incoming argument lives.
    /// Positive: arguments sit above the saved return address and saved
    /// `%ebp`, i.e. at `%ebp + args_offset`.
    pub args_offset: i32,
}

impl StackFrameDescriptor {
    pub fn new(frame_size: i32, args_offset: i32) -> Self {
        assert!(frame_size >= 0, "frame size must be non-negative");
        Self {
            frame_size,
            args_offset,
        }
    }

    /// Resolve a local slot to its `%ebp`-relative displacement. Slots are
    /// laid out downward from the saved `%ebp`, in declaration order.
    pub fn slot_offset(&self, slot: StackSlot) -> i32 {
        -((slot.0 as i32 + 1) * WORD_SIZE)
    }

    /// Resolve the `n`th incoming argument (0-indexed) to its
    /// `%ebp`-relative displacement.
    pub fn arg_offset(&self, index: u32) -> i32 {
        self.args_offset + (index as i32) * WORD_SIZE
    }
}

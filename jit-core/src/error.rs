use thiserror::Error;

/// Resource-exhaustion failures that the code buffer and the shared JIT-text
/// arena can report. Everything else (illegal ModR/M, unknown instruction
/// kind, use of the buffer before it is locked) is a programmer error and
/// is asserted against instead of being represented here.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("code buffer overflow: tried to write {requested} bytes at offset {offset}, capacity is {capacity}")]
    BufferOverflow {
        offset: usize,
        requested: usize,
        capacity: usize,
    },

    #[error("jit-text arena exhausted: {requested} bytes requested, {remaining} remaining")]
    ArenaExhausted { requested: usize, remaining: usize },

    #[error("branch displacement {disp} out of range for a 32-bit relative field")]
    DisplacementOutOfRange { disp: i64 },
}

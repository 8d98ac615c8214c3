//! Target-independent data model for the machine-code emission core: the
//! instruction and operand vocabulary, stack-frame and itable layout
//! records, the error type shared across the emission pipeline, and the
//! offset index used to map code-buffer bytes back to the instructions
//! that produced them.
//!
//! The x86-specific encoder, emitter, branch engine, and stub synthesizer
//! live in `jit-x86`; this crate only defines the shapes they operate on,
//! so a future second backend could reuse the same model.

pub mod block;
pub mod error;
pub mod frame;
pub mod instruction;
pub mod itable;
pub mod operand;
pub mod rbtree;
pub mod reg;

pub use block::{BasicBlock, ResolutionBlock};
pub use error::EmitError;
pub use frame::StackFrameDescriptor;
pub use instruction::{AluOp, Cond, InsnFlags, InsnKind, Instruction, SseAluOp, SseWidth, ShiftOp};
pub use itable::{is_valid_itable, ItableEntry};
pub use operand::{BlockId, Operand, StackSlot};
pub use rbtree::OffsetIndex;
pub use reg::{Reg, XmmReg, CALLEE_SAVED, WORD_SIZE};

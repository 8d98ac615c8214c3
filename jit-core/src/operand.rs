use crate::reg::{Reg, XmmReg};

/// A stack slot index, resolved to a frame-pointer-relative displacement by
/// [`crate::frame::StackFrameDescriptor::slot_offset`]. Kept as an opaque
/// index rather than a raw displacement so the frame layout stays the only
/// place that knows how slots map to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackSlot(pub u32);

/// Index into a per-compilation basic-block vector. Using an index instead
/// of an owning reference breaks the cyclic successor/predecessor graph
/// between basic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// Operand sum type, per spec §3. Every addressing mode the encoder and
/// emitter need to discriminate on is a distinct variant rather than a
/// flags-qualified single struct, so illegal combinations (e.g. a memory
/// index with no scale) are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Zero-operand instructions (ret, leave, cdq, nop) use this for both
    /// src and dst.
    None,
    Reg(Reg),
    Xmm(XmmReg),
    Imm(i64),
    /// A stack slot local to the current frame.
    MemLocal(StackSlot),
    /// `[base + disp]`. A base of `%esp` forces a SIB byte; a base of
    /// `%ebp` with `disp == 0` forces an explicit `disp8 = 0` rather than
    /// the `mod=00` short form (see encoder rules).
    MemBase { base: Reg, disp: i32 },
    /// Absolute `[disp]`, no base register.
    MemDisp(i32),
    /// `[base + index*2^scale + disp]`. `scale` is the log2 shift (0..=3).
    MemIndex {
        base: Reg,
        index: Reg,
        scale: u8,
        disp: i32,
    },
    /// GS-relative absolute displacement, used exclusively for
    /// thread-local storage (spec §6).
    ThreadLocalDisp(i32),
    /// GS-relative `[base + disp]`.
    ThreadLocalBase { base: Reg, disp: i32 },
    /// A successor basic block, for branch instructions.
    BranchTarget(BlockId),
    /// An already-resolved relative call target (e.g. to a fixed runtime
    /// helper address), used by `call rel32` forms the emitter does not
    /// need to backpatch.
    Rel(i32),
}

impl Operand {
    pub fn as_reg(&self) -> Reg {
        match self {
            Operand::Reg(r) => *r,
            other => panic!("operand is not a register: {other:?}"),
        }
    }

    pub fn as_xmm(&self) -> XmmReg {
        match self {
            Operand::Xmm(x) => *x,
            other => panic!("operand is not an xmm register: {other:?}"),
        }
    }

    pub fn as_imm(&self) -> i64 {
        match self {
            Operand::Imm(v) => *v,
            other => panic!("operand is not an immediate: {other:?}"),
        }
    }

    pub fn as_branch_target(&self) -> BlockId {
        match self {
            Operand::BranchTarget(b) => *b,
            other => panic!("operand is not a branch target: {other:?}"),
        }
    }
}

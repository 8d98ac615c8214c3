use crate::operand::Operand;

/// ALU sub-opcode selecting which of add/or/adc/sbb/and/sub/xor/cmp an
/// `Alu*` instruction kind performs. Mirrors the `/r` extension field the
/// 0x80-0x83 and 0x00-0x3D opcode groups share on real x86.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AluOp {
    Add = 0,
    Or = 1,
    Adc = 2,
    Sbb = 3,
    And = 4,
    Sub = 5,
    Xor = 6,
    Cmp = 7,
}

/// Shift-group sub-opcode (sar/shl/shr), matching the `/r` field of the
/// 0xC0-0xD3 opcode group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShiftOp {
    Shl = 4,
    Shr = 5,
    Sar = 7,
}

/// SSE scalar arithmetic kind, crossed with [`SseWidth`] to pick the
/// mandatory prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseAluOp {
    Add,
    Sub,
    Mul,
    Div,
    Xor,
}

/// Scalar width for SSE forms: single (`ss`, `0xF3` prefix) vs. double
/// (`sd`, `0xF2` prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseWidth {
    Single,
    Double,
}

/// x86 condition codes used by `Jcc`, matching the low nibble of the
/// two-byte `0x0F 0x8x` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cond {
    O = 0x0,
    No = 0x1,
    B = 0x2,
    Ae = 0x3,
    E = 0x4,
    Ne = 0x5,
    Be = 0x6,
    A = 0x7,
    S = 0x8,
    Ns = 0x9,
    L = 0xC,
    Ge = 0xD,
    Le = 0xE,
    G = 0xF,
}

/// The instruction kinds this core knows how to emit. Grouped by
/// addressing-mode family to match the encoder's own entry points; this is
/// the "contract-level" subset named in spec §6, not every x86 form that
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsnKind {
    // -- Integer ALU family: add/or/adc/sbb/and/sub/xor/cmp --
    AluRegReg(AluOp),
    AluImmReg(AluOp),
    AluMembaseReg(AluOp),
    AluMemdispReg(AluOp),
    AluRegMembase(AluOp),
    AluRegMemdisp(AluOp),

    // -- mov, every form listed in spec §3 --
    MovRegReg,
    MovImmReg,
    MovMembaseReg,
    MovRegMembase,
    MovMemdispReg,
    MovRegMemdisp,
    MovMemlocalReg,
    MovRegMemlocal,
    MovImmMembase,
    MovImmMemlocal,
    MovMemindexReg,
    MovRegMemindex,
    MovThreadLocalMemdispReg,
    MovRegThreadLocalMemdisp,
    MovRegThreadLocalMembase,
    MovImmThreadLocalMembase,

    // -- sign/zero extension --
    Movsx8RegReg,
    Movsx8MembaseReg,
    Movsx16RegReg,
    Movsx16MembaseReg,
    Movzx16RegReg,

    // -- shift family --
    ShiftRegReg(ShiftOp),
    ShiftImmReg(ShiftOp),

    // -- neg/mul/div/cdq --
    NegReg,
    MulRegEax,
    MulMembaseEax,
    MulRegReg,
    DivRegReg,
    DivMembaseReg,
    Cdq,

    // -- push/pop --
    PushReg,
    PushImm,
    PushMembase,
    PushMemlocal,
    PopReg,
    PopMemlocal,

    // -- control transfer --
    CallRel,
    CallReg,
    JmpBranch,
    JmpMembase,
    JmpMemindex,
    JmpReg,
    Jcc(Cond),
    Ret,
    Leave,
    Nop,

    // -- SSE scalar --
    SseAlu(SseAluOp, SseWidth),
    SseMovRegReg(SseWidth),
    SseMovMembaseXmm(SseWidth),
    SseMovXmmMembase(SseWidth),
    SseMovMemdispXmm(SseWidth),
    SseMovXmmMemdisp(SseWidth),
    SseMovMemlocalXmm(SseWidth),
    SseMovXmmMemlocal(SseWidth),
    SseMovMemindexXmm(SseWidth),
    SseMovXmmMemindex(SseWidth),
    SseXorpX(SseWidth),

    // -- x87, memory-base only (spec §4.1: no reg-reg forms required) --
    FldMembase,
    FldMembase64,
    FldMemlocal,
    FldMemlocal64,
    FstpMembase,
    FstpMembase64,
    FstpMemlocal,
    FstpMemlocal64,
    FildMembase64,
    FistpMembase64,
    Fldcw,
    Fnstcw,

    TestMembaseReg,
    TestImmMemdisp,

    // -- pseudo-instructions: accepted, emit nothing --
    SaveCallerRegs,
    RestoreCallerRegs,
    Phi,
}

impl InsnKind {
    /// Pseudo-instructions occupy a slot in the instruction stream (for
    /// liveness/allocator bookkeeping) but the emitter writes no bytes for
    /// them, per spec §4.2.
    pub fn is_pseudo(&self) -> bool {
        matches!(
            self,
            InsnKind::SaveCallerRegs | InsnKind::RestoreCallerRegs | InsnKind::Phi
        )
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, InsnKind::JmpBranch | InsnKind::Jcc(_))
    }
}

/// A macro-free, minimal stand-in for `bitflags!` — the crate doesn't
/// otherwise need the full `bitflags` dependency for a single three-bit
/// field.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(
                $(#[$cmeta:meta])*
                const $cname:ident = $cval:expr;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name($ty);

        impl $name {
            $(
                $(#[$cmeta])*
                pub const $cname: $name = $name($cval);
            )*

            pub const NONE: $name = $name(0);

            #[inline]
            pub fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0
            }

            #[inline]
            pub fn set(&mut self, other: $name) {
                self.0 |= other.0;
            }

            #[inline]
            pub fn bits(self) -> $ty {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    /// Per-instruction emission flags. Monotonic: bits are only ever set,
    /// never cleared, until patching completes (spec §3 invariant).
    pub struct InsnFlags: u8 {
        /// A two-byte `0x0F`-prefixed opcode was emitted, shifting the
        /// displacement field one byte later.
        const ESCAPED = 0b001;
        /// Target offset was not yet known when this branch was emitted;
        /// `apply_all()` must patch it.
        const BACKPATCH_BRANCH = 0b010;
        /// This branch goes through a resolution block rather than
        /// directly to its target.
        const BACKPATCH_RESOLUTION = 0b100;
    }
}

/// A single low-level instruction: opcode kind, operands, and the
/// bookkeeping the branch engine needs. Per spec §3: `mach_offset` is
/// assigned exactly once, at the moment emission starts for this
/// instruction, and `flags` only grows until patching completes.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub kind: InsnKind,
    pub src: Operand,
    pub dst: Operand,
    pub flags: InsnFlags,
    /// Byte offset within the code buffer. `None` until the emitter
    /// assigns it.
    pub mach_offset: Option<usize>,
}

impl Instruction {
    pub fn new(kind: InsnKind, src: Operand, dst: Operand) -> Self {
        Self {
            kind,
            src,
            dst,
            flags: InsnFlags::NONE,
            mach_offset: None,
        }
    }

    pub fn branch(kind: InsnKind, target: crate::operand::BlockId) -> Self {
        Self::new(kind, Operand::BranchTarget(target), Operand::None)
    }

    /// Assign `mach_offset`, enforcing the "exactly once" invariant.
    pub fn set_mach_offset(&mut self, offset: usize) {
        assert!(
            self.mach_offset.is_none(),
            "mach_offset assigned twice for the same instruction"
        );
        self.mach_offset = Some(offset);
    }

    pub fn mach_offset(&self) -> usize {
        self.mach_offset
            .expect("mach_offset read before emission assigned it")
    }
}

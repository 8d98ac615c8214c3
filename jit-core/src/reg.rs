//! The 32-bit x86 register file this core ever names directly.
//!
//! No REX-extended registers exist on this target (see spec's Non-goals),
//! so every encoding fits in the classic 3-bit ModR/M/SIB register field.

/// General-purpose 32-bit registers, in their native ModR/M encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    Eax = 0,
    Ecx = 1,
    Edx = 2,
    Ebx = 3,
    Esp = 4,
    Ebp = 5,
    Esi = 6,
    Edi = 7,
}

impl Reg {
    /// The 3-bit field used in ModR/M `reg`/`rm` and in SIB `base`/`index`.
    #[inline]
    pub fn encode(self) -> u8 {
        self as u8
    }

    pub fn from_encoding(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Reg::Eax,
            1 => Reg::Ecx,
            2 => Reg::Edx,
            3 => Reg::Ebx,
            4 => Reg::Esp,
            5 => Reg::Ebp,
            6 => Reg::Esi,
            7 => Reg::Edi,
            _ => unreachable!(),
        }
    }
}

/// Scalar SSE registers (XMM0-XMM7; no YMM/ZMM on this target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum XmmReg {
    Xmm0 = 0,
    Xmm1 = 1,
    Xmm2 = 2,
    Xmm3 = 3,
    Xmm4 = 4,
    Xmm5 = 5,
    Xmm6 = 6,
    Xmm7 = 7,
}

impl XmmReg {
    #[inline]
    pub fn encode(self) -> u8 {
        self as u8
    }
}

/// Registers callee-saved under this target's calling convention, in the
/// order the prologue pushes them and the epilogue pops them (reversed).
pub const CALLEE_SAVED: &[Reg] = &[Reg::Ebx, Reg::Esi, Reg::Edi];

pub const WORD_SIZE: i32 = 4;

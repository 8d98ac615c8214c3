//! Pure byte-level x86 (32-bit) encoder: one function per addressing-mode
//! family, each writing exactly one instruction's bytes into a
//! [`CodeBuffer`]. Nothing here knows about basic blocks, fixups, or
//! instruction kinds as a dispatch target — that's `emitter`'s job. Every
//! precondition this module asserts (known register, legal scale) is a
//! programmer error, not a runtime one, so it panics rather than returning
//! a `Result`; only buffer exhaustion, which is a resource limit, goes
//! through [`EmitError`].

use jit_core::{AluOp, Cond, EmitError, Reg, ShiftOp, SseAluOp, SseWidth, XmmReg};

use crate::buffer::CodeBuffer;

const GS_PREFIX: u8 = 0x65;
const OPC_ESCAPE: u8 = 0x0F;

fn modrm(m: u8, reg: u8, rm: u8) -> u8 {
    (m << 6) | ((reg & 0x7) << 3) | (rm & 0x7)
}

fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | ((index & 0x7) << 3) | (base & 0x7)
}

fn fits_i8(disp: i32) -> bool {
    disp >= i8::MIN as i32 && disp <= i8::MAX as i32
}

/// Writes the ModR/M byte (and SIB/displacement if required) addressing
/// `[base + index*2^scale + disp]`. `index` is `None` for a plain
/// base+displacement operand; `base` is `None` only for the absolute
/// `[disp32]` form, which requires no index.
fn encode_mem(
    buf: &mut CodeBuffer,
    reg_field: u8,
    base: Option<Reg>,
    index: Option<(Reg, u8)>,
    disp: i32,
) -> Result<(), EmitError> {
    let base = match base {
        None => {
            assert!(index.is_none(), "absolute operand cannot carry an index");
            buf.emit_u8(modrm(0b00, reg_field, 0b101))?;
            return buf.emit_i32(disp);
        }
        Some(b) => b,
    };

    let needs_sib = index.is_some() || base == Reg::Esp;
    let ebp_zero = base == Reg::Ebp && disp == 0;

    let (m, disp_bytes): (u8, Option<EncodedDisp>) = if ebp_zero {
        (0b01, Some(EncodedDisp::Byte(0)))
    } else if disp == 0 {
        (0b00, None)
    } else if fits_i8(disp) {
        (0b01, Some(EncodedDisp::Byte(disp as i8 as u8)))
    } else {
        (0b10, Some(EncodedDisp::Dword(disp)))
    };

    let rm = if needs_sib { 0b100 } else { base.encode() };
    buf.emit_u8(modrm(m, reg_field, rm))?;
    if needs_sib {
        let (scale, index_field) = match index {
            Some((idx, scale)) => {
                assert!(scale <= 3, "SIB scale must be a log2 shift in 0..=3");
                (scale, idx.encode())
            }
            None => (0, 0b100),
        };
        buf.emit_u8(sib(scale, index_field, base.encode()))?;
    }
    match disp_bytes {
        Some(EncodedDisp::Byte(b)) => buf.emit_u8(b),
        Some(EncodedDisp::Dword(d)) => buf.emit_i32(d),
        None => Ok(()),
    }
}

enum EncodedDisp {
    Byte(u8),
    Dword(i32),
}

fn alu_base_opcode(op: AluOp) -> u8 {
    (op as u8) << 3
}

// -- integer ALU family --

pub fn alu_reg_reg(buf: &mut CodeBuffer, op: AluOp, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(alu_base_opcode(op) + 0x01)?;
    buf.emit_u8(modrm(0b11, src.encode(), dst.encode()))
}

/// `cmp dst, src` as its own entry point rather than routed through
/// [`alu_reg_reg`] — stubs compare register pairs often enough (inline
/// cache checks, itable dispatch) that it gets the same dedicated
/// function the general ALU dispatch doesn't need.
pub fn cmp_reg_reg(buf: &mut CodeBuffer, a: Reg, b: Reg) -> Result<(), EmitError> {
    alu_reg_reg(buf, AluOp::Cmp, a, b)
}

pub fn alu_imm_reg(buf: &mut CodeBuffer, op: AluOp, imm: i32, dst: Reg) -> Result<(), EmitError> {
    if fits_i8(imm) {
        buf.emit_u8(0x83)?;
        buf.emit_u8(modrm(0b11, op as u8, dst.encode()))?;
        buf.emit_u8(imm as i8 as u8)
    } else {
        buf.emit_u8(0x81)?;
        buf.emit_u8(modrm(0b11, op as u8, dst.encode()))?;
        buf.emit_i32(imm)
    }
}

pub fn alu_membase_reg(
    buf: &mut CodeBuffer,
    op: AluOp,
    base: Reg,
    disp: i32,
    dst: Reg,
) -> Result<(), EmitError> {
    buf.emit_u8(alu_base_opcode(op) + 0x03)?;
    encode_mem(buf, dst.encode(), Some(base), None, disp)
}

pub fn alu_memdisp_reg(buf: &mut CodeBuffer, op: AluOp, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(alu_base_opcode(op) + 0x03)?;
    encode_mem(buf, dst.encode(), None, None, disp)
}

pub fn alu_reg_membase(
    buf: &mut CodeBuffer,
    op: AluOp,
    src: Reg,
    base: Reg,
    disp: i32,
) -> Result<(), EmitError> {
    buf.emit_u8(alu_base_opcode(op) + 0x01)?;
    encode_mem(buf, src.encode(), Some(base), None, disp)
}

pub fn alu_reg_memdisp(buf: &mut CodeBuffer, op: AluOp, src: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(alu_base_opcode(op) + 0x01)?;
    encode_mem(buf, src.encode(), None, None, disp)
}

// -- mov family --

pub fn mov_reg_reg(buf: &mut CodeBuffer, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x89)?;
    buf.emit_u8(modrm(0b11, src.encode(), dst.encode()))
}

pub fn mov_imm_reg(buf: &mut CodeBuffer, imm: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xB8 + dst.encode())?;
    buf.emit_i32(imm)
}

pub fn mov_membase_reg(buf: &mut CodeBuffer, base: Reg, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x8B)?;
    encode_mem(buf, dst.encode(), Some(base), None, disp)
}

pub fn mov_reg_membase(buf: &mut CodeBuffer, src: Reg, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0x89)?;
    encode_mem(buf, src.encode(), Some(base), None, disp)
}

pub fn mov_memdisp_reg(buf: &mut CodeBuffer, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x8B)?;
    encode_mem(buf, dst.encode(), None, None, disp)
}

pub fn mov_reg_memdisp(buf: &mut CodeBuffer, src: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0x89)?;
    encode_mem(buf, src.encode(), None, None, disp)
}

pub fn mov_imm_membase(buf: &mut CodeBuffer, imm: i32, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xC7)?;
    encode_mem(buf, 0, Some(base), None, disp)?;
    buf.emit_i32(imm)
}

pub fn mov_memindex_reg(
    buf: &mut CodeBuffer,
    base: Reg,
    index: Reg,
    scale: u8,
    disp: i32,
    dst: Reg,
) -> Result<(), EmitError> {
    buf.emit_u8(0x8B)?;
    encode_mem(buf, dst.encode(), Some(base), Some((index, scale)), disp)
}

pub fn mov_reg_memindex(
    buf: &mut CodeBuffer,
    src: Reg,
    base: Reg,
    index: Reg,
    scale: u8,
    disp: i32,
) -> Result<(), EmitError> {
    buf.emit_u8(0x89)?;
    encode_mem(buf, src.encode(), Some(base), Some((index, scale)), disp)
}

/// GS-relative `mov reg, %gs:disp32` — absolute thread-local load.
pub fn mov_threadlocal_memdisp_reg(buf: &mut CodeBuffer, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(GS_PREFIX)?;
    mov_memdisp_reg(buf, disp, dst)
}

pub fn mov_reg_threadlocal_memdisp(buf: &mut CodeBuffer, src: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(GS_PREFIX)?;
    mov_reg_memdisp(buf, src, disp)
}

pub fn mov_reg_threadlocal_membase(buf: &mut CodeBuffer, src: Reg, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(GS_PREFIX)?;
    mov_reg_membase(buf, src, base, disp)
}

pub fn mov_imm_threadlocal_membase(
    buf: &mut CodeBuffer,
    imm: i32,
    base: Reg,
    disp: i32,
) -> Result<(), EmitError> {
    buf.emit_u8(GS_PREFIX)?;
    mov_imm_membase(buf, imm, base, disp)
}

// -- sign/zero extension --

pub fn movsx8_reg_reg(buf: &mut CodeBuffer, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xBE)?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

pub fn movsx8_membase_reg(buf: &mut CodeBuffer, base: Reg, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xBE)?;
    encode_mem(buf, dst.encode(), Some(base), None, disp)
}

pub fn movsx16_reg_reg(buf: &mut CodeBuffer, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xBF)?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

pub fn movsx16_membase_reg(buf: &mut CodeBuffer, base: Reg, disp: i32, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xBF)?;
    encode_mem(buf, dst.encode(), Some(base), None, disp)
}

pub fn movzx16_reg_reg(buf: &mut CodeBuffer, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xB7)?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

// -- shift family: /4 shl, /5 shr, /7 sar --

fn shift_ext(op: ShiftOp) -> u8 {
    op as u8
}

/// Shift-by-`%cl` form (the only register-sourced shift count on this ISA).
pub fn shift_reg_reg(buf: &mut CodeBuffer, op: ShiftOp, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xD3)?;
    buf.emit_u8(modrm(0b11, shift_ext(op), dst.encode()))
}

pub fn shift_imm_reg(buf: &mut CodeBuffer, op: ShiftOp, imm: u8, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xC1)?;
    buf.emit_u8(modrm(0b11, shift_ext(op), dst.encode()))?;
    buf.emit_u8(imm)
}

// -- neg/mul/div/cdq --

pub fn neg_reg(buf: &mut CodeBuffer, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    buf.emit_u8(modrm(0b11, 3, dst.encode()))
}

/// `mul %src` — implicit `%eax *= src`, result in `%edx:%eax`.
pub fn mul_reg_eax(buf: &mut CodeBuffer, src: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    buf.emit_u8(modrm(0b11, 4, src.encode()))
}

pub fn mul_membase_eax(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    encode_mem(buf, 4, Some(base), None, disp)
}

/// `imul dst, src` — two-operand signed multiply.
pub fn mul_reg_reg(buf: &mut CodeBuffer, src: Reg, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0xAF)?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

pub fn div_reg_reg(buf: &mut CodeBuffer, src: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    buf.emit_u8(modrm(0b11, 6, src.encode()))
}

pub fn div_membase_reg(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    encode_mem(buf, 6, Some(base), None, disp)
}

pub fn cdq(buf: &mut CodeBuffer) -> Result<(), EmitError> {
    buf.emit_u8(0x99)
}

// -- push/pop --

pub fn push_reg(buf: &mut CodeBuffer, src: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x50 + src.encode())
}

pub fn push_imm(buf: &mut CodeBuffer, imm: i32) -> Result<(), EmitError> {
    if fits_i8(imm) {
        buf.emit_u8(0x6A)?;
        buf.emit_u8(imm as i8 as u8)
    } else {
        buf.emit_u8(0x68)?;
        buf.emit_i32(imm)
    }
}

pub fn push_membase(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xFF)?;
    encode_mem(buf, 6, Some(base), None, disp)
}

pub fn pop_reg(buf: &mut CodeBuffer, dst: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x58 + dst.encode())
}

pub fn pop_membase(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0x8F)?;
    encode_mem(buf, 0, Some(base), None, disp)
}

// -- control transfer --

pub fn call_rel(buf: &mut CodeBuffer, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xE8)?;
    buf.emit_i32(disp)
}

pub fn call_reg(buf: &mut CodeBuffer, target: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xFF)?;
    buf.emit_u8(modrm(0b11, 2, target.encode()))
}

/// Unconditional relative jump, single-byte opcode. Returns the offset of
/// the displacement field so the caller can backpatch it.
pub fn jmp_rel(buf: &mut CodeBuffer, disp: i32) -> Result<usize, EmitError> {
    buf.emit_u8(0xE9)?;
    let disp_offset = buf.offset();
    buf.emit_i32(disp)?;
    Ok(disp_offset)
}

pub fn jmp_membase(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xFF)?;
    encode_mem(buf, 4, Some(base), None, disp)
}

pub fn jmp_memindex(buf: &mut CodeBuffer, base: Reg, index: Reg, scale: u8, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xFF)?;
    encode_mem(buf, 4, Some(base), Some((index, scale)), disp)
}

pub fn jmp_reg(buf: &mut CodeBuffer, target: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0xFF)?;
    buf.emit_u8(modrm(0b11, 4, target.encode()))
}

/// Two-byte `0x0F 0x8x` conditional relative jump. Returns the offset of
/// the displacement field.
pub fn jcc_rel(buf: &mut CodeBuffer, cond: Cond, disp: i32) -> Result<usize, EmitError> {
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x80 + cond as u8)?;
    let disp_offset = buf.offset();
    buf.emit_i32(disp)?;
    Ok(disp_offset)
}

pub fn ret(buf: &mut CodeBuffer) -> Result<(), EmitError> {
    buf.emit_u8(0xC3)
}

pub fn leave(buf: &mut CodeBuffer) -> Result<(), EmitError> {
    buf.emit_u8(0xC9)
}

pub fn nop(buf: &mut CodeBuffer) -> Result<(), EmitError> {
    buf.emit_u8(0x90)
}

// -- test --

pub fn test_membase_reg(buf: &mut CodeBuffer, base: Reg, disp: i32, reg: Reg) -> Result<(), EmitError> {
    buf.emit_u8(0x85)?;
    encode_mem(buf, reg.encode(), Some(base), None, disp)
}

pub fn test_imm_memdisp(buf: &mut CodeBuffer, imm: i32, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(0xF7)?;
    encode_mem(buf, 0, None, None, disp)?;
    buf.emit_i32(imm)
}

// -- SSE scalar --

fn sse_prefix(width: SseWidth) -> u8 {
    match width {
        SseWidth::Single => 0xF3,
        SseWidth::Double => 0xF2,
    }
}

fn sse_alu_opcode(op: SseAluOp) -> u8 {
    match op {
        SseAluOp::Add => 0x58,
        SseAluOp::Mul => 0x59,
        SseAluOp::Sub => 0x5C,
        SseAluOp::Div => 0x5E,
        SseAluOp::Xor => 0x57,
    }
}

pub fn sse_alu_xmm_xmm(
    buf: &mut CodeBuffer,
    op: SseAluOp,
    width: SseWidth,
    src: XmmReg,
    dst: XmmReg,
) -> Result<(), EmitError> {
    if op == SseAluOp::Xor {
        // pxor/xorpd have no scalar ss/sd form; packed-double logic uses
        // the 0x66 prefix instead per spec's SSE prefix rule.
        buf.emit_u8(0x66)?;
    } else {
        buf.emit_u8(sse_prefix(width))?;
    }
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(sse_alu_opcode(op))?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

pub fn sse_mov_reg_reg(buf: &mut CodeBuffer, width: SseWidth, src: XmmReg, dst: XmmReg) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x10)?;
    buf.emit_u8(modrm(0b11, dst.encode(), src.encode()))
}

pub fn sse_mov_membase_xmm(
    buf: &mut CodeBuffer,
    width: SseWidth,
    base: Reg,
    disp: i32,
    dst: XmmReg,
) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x10)?;
    encode_mem(buf, dst.encode(), Some(base), None, disp)
}

pub fn sse_mov_xmm_membase(
    buf: &mut CodeBuffer,
    width: SseWidth,
    src: XmmReg,
    base: Reg,
    disp: i32,
) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x11)?;
    encode_mem(buf, src.encode(), Some(base), None, disp)
}

pub fn sse_mov_memdisp_xmm(buf: &mut CodeBuffer, width: SseWidth, disp: i32, dst: XmmReg) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x10)?;
    encode_mem(buf, dst.encode(), None, None, disp)
}

pub fn sse_mov_xmm_memdisp(buf: &mut CodeBuffer, width: SseWidth, src: XmmReg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x11)?;
    encode_mem(buf, src.encode(), None, None, disp)
}

pub fn sse_mov_memindex_xmm(
    buf: &mut CodeBuffer,
    width: SseWidth,
    base: Reg,
    index: Reg,
    scale: u8,
    disp: i32,
    dst: XmmReg,
) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x10)?;
    encode_mem(buf, dst.encode(), Some(base), Some((index, scale)), disp)
}

pub fn sse_mov_xmm_memindex(
    buf: &mut CodeBuffer,
    width: SseWidth,
    src: XmmReg,
    base: Reg,
    index: Reg,
    scale: u8,
    disp: i32,
) -> Result<(), EmitError> {
    buf.emit_u8(sse_prefix(width))?;
    buf.emit_u8(OPC_ESCAPE)?;
    buf.emit_u8(0x11)?;
    encode_mem(buf, src.encode(), Some(base), Some((index, scale)), disp)
}

// -- x87, memory-base only --

fn fpu_mem(buf: &mut CodeBuffer, opc: u8, ext: u8, base: Reg, disp: i32) -> Result<(), EmitError> {
    buf.emit_u8(opc)?;
    encode_mem(buf, ext, Some(base), None, disp)
}

pub fn fld_membase(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xD9, 0, base, disp)
}

pub fn fld_membase64(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xDD, 0, base, disp)
}

pub fn fstp_membase(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xD9, 3, base, disp)
}

pub fn fstp_membase64(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xDD, 3, base, disp)
}

pub fn fild_membase64(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xDF, 5, base, disp)
}

pub fn fistp_membase64(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xDF, 7, base, disp)
}

pub fn fldcw(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xD9, 5, base, disp)
}

pub fn fnstcw(buf: &mut CodeBuffer, base: Reg, disp: i32) -> Result<(), EmitError> {
    fpu_mem(buf, 0xD9, 7, base, disp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf() -> CodeBuffer {
        CodeBuffer::with_default_size().unwrap()
    }

    #[test]
    fn mov_reg_reg_matches_reference_bytes() {
        let mut b = buf();
        mov_reg_reg(&mut b, Reg::Eax, Reg::Ebx).unwrap();
        assert_eq!(b.as_slice(), &[0x89, 0xC3]);
    }

    #[test]
    fn add_imm_reg_picks_8bit_form_when_it_fits() {
        let mut b = buf();
        alu_imm_reg(&mut b, AluOp::Add, 5, Reg::Ecx).unwrap();
        assert_eq!(b.as_slice(), &[0x83, 0xC1, 0x05]);
    }

    #[test]
    fn add_imm_reg_falls_back_to_32bit_form() {
        let mut b = buf();
        alu_imm_reg(&mut b, AluOp::Add, 0x12345678, Reg::Ecx).unwrap();
        assert_eq!(b.as_slice(), &[0x81, 0xC1, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn cmp_reg_reg_matches_alu_reg_reg_cmp() {
        let mut b = buf();
        cmp_reg_reg(&mut b, Reg::Eax, Reg::Ecx).unwrap();
        assert_eq!(b.as_slice(), &[0x39, 0xC1]);
    }

    #[test]
    fn mov_membase_reg_esp_base_forces_sib() {
        let mut b = buf();
        mov_membase_reg(&mut b, Reg::Esp, 0, Reg::Eax).unwrap();
        assert_eq!(b.as_slice(), &[0x8B, 0x04, 0x24]);
    }

    #[test]
    fn mov_membase_reg_ebp_zero_disp_forces_explicit_disp8() {
        let mut b = buf();
        mov_membase_reg(&mut b, Reg::Ebp, 0, Reg::Eax).unwrap();
        assert_eq!(b.as_slice(), &[0x8B, 0x45, 0x00]);
    }

    #[test]
    fn addsd_xmm_xmm_matches_reference_bytes() {
        let mut b = buf();
        sse_alu_xmm_xmm(&mut b, SseAluOp::Add, SseWidth::Double, XmmReg::Xmm1, XmmReg::Xmm2).unwrap();
        assert_eq!(b.as_slice(), &[0xF2, 0x0F, 0x58, 0xD1]);
    }

    #[test]
    fn mov_membase_reg_large_disp_uses_disp32() {
        let mut b = buf();
        mov_membase_reg(&mut b, Reg::Ebx, 1000, Reg::Eax).unwrap();
        assert_eq!(b.as_slice()[0], 0x8B);
        assert_eq!(b.as_slice()[1], modrm(0b10, 0, 3));
        assert_eq!(&b.as_slice()[2..6], &1000i32.to_le_bytes());
    }

    #[test]
    fn mov_memindex_reg_encodes_sib_with_scale() {
        let mut b = buf();
        mov_memindex_reg(&mut b, Reg::Ebx, Reg::Ecx, 2, 0, Reg::Eax).unwrap();
        assert_eq!(b.as_slice()[0], 0x8B);
        assert_eq!(b.as_slice()[1], modrm(0b00, 0, 0b100));
        assert_eq!(b.as_slice()[2], sib(2, Reg::Ecx.encode(), Reg::Ebx.encode()));
    }
}

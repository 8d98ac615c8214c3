//! Byte-exact reference sequences for the forms called out as testable
//! scenarios: every emitted form must decode, under an independent
//! disassembler, to the instruction the encoder was asked for. Lacking a
//! disassembler dependency here, these assert the concrete byte sequences
//! directly, which is equivalent for a fixed, known instruction set.

use jit_core::{AluOp, Reg, SseAluOp, SseWidth, XmmReg};
use jit_x86::buffer::CodeBuffer;
use jit_x86::encoder;

fn buf() -> CodeBuffer {
    CodeBuffer::with_default_size().unwrap()
}

#[test]
fn mov_reg_reg_eax_to_ebx() {
    let mut b = buf();
    encoder::mov_reg_reg(&mut b, Reg::Eax, Reg::Ebx).unwrap();
    assert_eq!(b.as_slice(), &[0x89, 0xC3]);
}

#[test]
fn add_imm_reg_8bit_form() {
    let mut b = buf();
    encoder::alu_imm_reg(&mut b, AluOp::Add, 5, Reg::Ecx).unwrap();
    assert_eq!(b.as_slice(), &[0x83, 0xC1, 0x05]);
}

#[test]
fn add_imm_reg_32bit_form() {
    let mut b = buf();
    encoder::alu_imm_reg(&mut b, AluOp::Add, 0x12345678, Reg::Ecx).unwrap();
    assert_eq!(b.as_slice(), &[0x81, 0xC1, 0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn mov_membase_reg_esp_base_needs_sib() {
    let mut b = buf();
    encoder::mov_membase_reg(&mut b, Reg::Esp, 0, Reg::Eax).unwrap();
    assert_eq!(b.as_slice(), &[0x8B, 0x04, 0x24]);
}

#[test]
fn mov_membase_reg_ebp_zero_disp_is_explicit() {
    let mut b = buf();
    encoder::mov_membase_reg(&mut b, Reg::Ebp, 0, Reg::Eax).unwrap();
    assert_eq!(b.as_slice(), &[0x8B, 0x45, 0x00]);
}

#[test]
fn addsd_xmm1_xmm2() {
    let mut b = buf();
    encoder::sse_alu_xmm_xmm(&mut b, SseAluOp::Add, SseWidth::Double, XmmReg::Xmm1, XmmReg::Xmm2).unwrap();
    assert_eq!(b.as_slice(), &[0xF2, 0x0F, 0x58, 0xD1]);
}

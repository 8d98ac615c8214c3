//! `int f(int x) { return x + 1; }`, compiled by hand through the same
//! encoder/stub calls a real emitter would make, with an empty
//! callee-saved set and no frame locals so the expected bytes are fully
//! determined.

use jit_core::{AluOp, Reg, StackFrameDescriptor};
use jit_x86::buffer::CodeBuffer;
use jit_x86::encoder;
use jit_x86::options::EmitOptions;
use jit_x86::stubs;

#[test]
fn f_of_x_equals_x_plus_one() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let frame = StackFrameDescriptor::new(0, 8); // first arg at %ebp+8

    stubs::emit_prologue(&mut buf, &frame, &[], EmitOptions::release()).unwrap();
    encoder::mov_membase_reg(&mut buf, Reg::Ebp, frame.arg_offset(0), Reg::Eax).unwrap();
    encoder::alu_imm_reg(&mut buf, AluOp::Add, 1, Reg::Eax).unwrap();
    stubs::emit_epilogue(&mut buf, &[], EmitOptions::release(), Reg::Eax, 0).unwrap();

    let expected: &[u8] = &[
        0x55, 0x89, 0xE5, // push %ebp; mov %esp,%ebp
        0x8B, 0x45, 0x08, // mov 8(%ebp), %eax
        0x83, 0xC0, 0x01, // add $1, %eax
        0xC9, 0xC3, // leave; ret
    ];
    assert_eq!(buf.as_slice(), expected);
}

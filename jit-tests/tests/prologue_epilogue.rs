//! Prologue/epilogue symmetry: the callee-saved registers pushed by the
//! prologue must be popped in exactly reverse order by the epilogue, and
//! a debug-mode red-zone push must be matched by a check-and-pop before
//! any of them.

use jit_core::{Reg, StackFrameDescriptor};
use jit_x86::buffer::CodeBuffer;
use jit_x86::options::EmitOptions;
use jit_x86::stubs;

const CALLEE_SAVED: &[Reg] = &[Reg::Ebx, Reg::Esi, Reg::Edi];

#[test]
fn release_build_prologue_epilogue_byte_exact() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let frame = StackFrameDescriptor::new(16, 8);
    stubs::emit_prologue(&mut buf, &frame, CALLEE_SAVED, EmitOptions::release()).unwrap();

    let mut expected = vec![0x55, 0x89, 0xE5]; // push ebp; mov esp,ebp
    expected.extend_from_slice(&[0x83, 0xEC, 0x10]); // sub $16,%esp
    for &r in CALLEE_SAVED {
        expected.push(0x50 + r.encode());
    }
    assert_eq!(buf.as_slice(), expected.as_slice());

    let prologue_len = buf.offset();
    stubs::emit_epilogue(&mut buf, CALLEE_SAVED, EmitOptions::release(), Reg::Eax, 0).unwrap();
    let epilogue = &buf.as_slice()[prologue_len..];

    let mut expected_epilogue = Vec::new();
    for &r in CALLEE_SAVED.iter().rev() {
        expected_epilogue.push(0x58 + r.encode());
    }
    expected_epilogue.push(0xC9); // leave
    expected_epilogue.push(0xC3); // ret
    assert_eq!(epilogue, expected_epilogue.as_slice());
}

#[test]
fn debug_build_pairs_redzone_push_with_check_and_pop() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let frame = StackFrameDescriptor::new(0, 8);
    stubs::emit_prologue(&mut buf, &frame, &[], EmitOptions::debug()).unwrap();
    let bytes = buf.as_slice().to_vec();
    assert_eq!(&bytes[0..3], &[0x55, 0x89, 0xE5]);
    assert_eq!(bytes[3], 0x68); // push imm32
    assert_eq!(&bytes[4..8], &stubs::REDZONE_MAGIC.to_le_bytes());

    let prologue_len = buf.offset();
    stubs::emit_epilogue(&mut buf, &[], EmitOptions::debug(), Reg::Eax, 0xDEAD0000).unwrap();
    let epilogue = &buf.as_slice()[prologue_len..];
    assert_eq!(epilogue[0], 0x58); // pop %eax (scratch)
    assert_eq!(epilogue[1], 0x81); // cmp $imm32, %eax (imm32 form, magic doesn't fit i8)
    assert_eq!(&epilogue[3..7], &stubs::REDZONE_MAGIC.to_le_bytes());
    assert_eq!(epilogue[7], 0x0F); // jne, two-byte form
    assert_eq!(epilogue[8], 0x85);
}

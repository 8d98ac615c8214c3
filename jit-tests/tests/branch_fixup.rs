//! Exercises the branch/fixup engine across a real two-block program: a
//! forward conditional branch from block 0 to block 1, resolved by
//! `apply_all` once both blocks have been emitted.

use jit_core::{BasicBlock, BlockId, Cond, InsnKind, Instruction, Operand};
use jit_x86::branch::FixupEngine;
use jit_x86::buffer::CodeBuffer;
use jit_x86::emitter;

#[test]
fn forward_branch_resolves_to_correct_displacement() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let mut fixups = FixupEngine::new();

    let mut block0 = BasicBlock::new(BlockId(0));
    block0.push(Instruction::branch(InsnKind::Jcc(Cond::E), BlockId(1)));

    let mut block1 = BasicBlock::new(BlockId(1));
    block1.push(Instruction::new(
        jit_core::InsnKind::Nop,
        Operand::None,
        Operand::None,
    ));

    let mut blocks = vec![block0, block1];

    emitter::emit_block(&mut buf, &mut blocks, 0, &mut fixups).unwrap();
    emitter::emit_block(&mut buf, &mut blocks, 1, &mut fixups).unwrap();

    let branch_insn = blocks[0].insns[0].clone();
    assert!(branch_insn.flags.contains(jit_core::InsnFlags::BACKPATCH_BRANCH));
    let insn_offset = branch_insn.mach_offset();

    fixups.apply_all(&mut buf, &blocks);

    let disp_field_offset = insn_offset + 2; // 0F 8x opcode, then the disp32 field
    let target_offset = blocks[1].mach_offset.unwrap();
    let expected = target_offset as i32 - (insn_offset as i32 + 5) - 1; // ESCAPED
    let actual = buf.read_u32(disp_field_offset) as i32;
    assert_eq!(actual, expected);

    // Re-applying must be a no-op on the already-patched bytes.
    let before = buf.read_u32(disp_field_offset);
    fixups.apply_all(&mut buf, &blocks);
    let after = buf.read_u32(disp_field_offset);
    assert_eq!(before, after);
}

#[test]
fn back_edge_patches_immediately_without_a_pending_fixup() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let mut fixups = FixupEngine::new();

    let mut target = BasicBlock::new(BlockId(0));
    target.push(Instruction::new(InsnKind::Nop, Operand::None, Operand::None));
    let mut looper = BasicBlock::new(BlockId(1));
    looper.push(Instruction::branch(InsnKind::JmpBranch, BlockId(0)));

    let mut blocks = vec![target, looper];
    emitter::emit_block(&mut buf, &mut blocks, 0, &mut fixups).unwrap();
    emitter::emit_block(&mut buf, &mut blocks, 1, &mut fixups).unwrap();

    assert_eq!(fixups.pending_count(), 0);
    let branch_offset = blocks[1].insns[0].mach_offset();
    let target_offset = blocks[0].mach_offset.unwrap();
    let disp = buf.read_u32(branch_offset + 1) as i32;
    assert_eq!(disp, target_offset as i32 - (branch_offset as i32 + 5));
}

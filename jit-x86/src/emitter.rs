//! Dispatches from instruction kind to encoder calls, assigns each
//! instruction's `mach_offset`, and installs branch fixups.
//!
//! One `match` over [`InsnKind`] is the whole dispatch table: every kind is
//! either handled here directly or explicitly rejected with a panic. There
//! is deliberately no second, overlapping "legacy" path for any kind that
//! also has a direct encoder call — a single dispatch is the contract.

use jit_core::{BasicBlock, BlockId, EmitError, InsnFlags, InsnKind, Operand, Reg, SseAluOp, XmmReg};

use crate::branch::FixupEngine;
use crate::buffer::CodeBuffer;
use crate::encoder;

fn reg(op: &Operand) -> Reg {
    op.as_reg()
}

fn xmm(op: &Operand) -> XmmReg {
    op.as_xmm()
}

fn imm32(op: &Operand) -> i32 {
    op.as_imm() as i32
}

fn membase(op: &Operand) -> (Reg, i32) {
    match op {
        Operand::MemLocal(_) => panic!("memlocal operand must be resolved to MemBase before emission"),
        Operand::MemBase { base, disp } => (*base, *disp),
        other => panic!("operand is not a memory-base address: {other:?}"),
    }
}

fn memdisp(op: &Operand) -> i32 {
    match op {
        Operand::MemDisp(d) => *d,
        other => panic!("operand is not an absolute memory address: {other:?}"),
    }
}

fn memindex(op: &Operand) -> (Reg, Reg, u8, i32) {
    match op {
        Operand::MemIndex {
            base,
            index,
            scale,
            disp,
        } => (*base, *index, *scale, *disp),
        other => panic!("operand is not an indexed memory address: {other:?}"),
    }
}

fn threadlocal_disp(op: &Operand) -> i32 {
    match op {
        Operand::ThreadLocalDisp(d) => *d,
        other => panic!("operand is not a thread-local address: {other:?}"),
    }
}

fn threadlocal_membase(op: &Operand) -> (Reg, i32) {
    match op {
        Operand::ThreadLocalBase { base, disp } => (*base, *disp),
        other => panic!("operand is not a thread-local base address: {other:?}"),
    }
}

/// Emits every instruction of `blocks[block_idx]` in order, recording
/// `mach_offset`s and registering branch fixups with `fixups`. Forward
/// branches and resolution edges are deferred; back edges are patched
/// immediately since their target offset is already known.
pub fn emit_block(
    buf: &mut CodeBuffer,
    blocks: &mut [BasicBlock],
    block_idx: usize,
    fixups: &mut FixupEngine,
) -> Result<(), EmitError> {
    let count = blocks[block_idx].insns.len();
    for i in 0..count {
        let (kind, src, dst, pre_flags) = {
            let insn = &blocks[block_idx].insns[i];
            (insn.kind, insn.src, insn.dst, insn.flags)
        };

        if kind.is_pseudo() {
            blocks[block_idx].insns[i].mach_offset = Some(buf.offset());
            continue;
        }

        let mach_offset = buf.offset();
        let flags = if kind.is_branch() {
            emit_branch(buf, blocks, block_idx, kind, src, mach_offset, pre_flags, fixups)?
        } else {
            emit_straightline(buf, kind, src, dst)?;
            InsnFlags::NONE
        };

        let insn = &mut blocks[block_idx].insns[i];
        insn.mach_offset = Some(mach_offset);
        insn.flags.set(flags);
    }

    blocks[block_idx].mach_offset = blocks[block_idx]
        .insns
        .first()
        .and_then(|i| i.mach_offset)
        .or(Some(buf.offset()));
    blocks[block_idx].is_emitted = true;
    Ok(())
}

/// Emits every resolution block attached to `blocks[block_idx]`. Must run
/// after every ordinary basic block has been emitted, since resolution
/// blocks sit outside the normal block order and backpatch engine targets
/// always resolve to a resolution block that hasn't been written yet.
pub fn emit_resolution_blocks(
    buf: &mut CodeBuffer,
    blocks: &mut [BasicBlock],
    block_idx: usize,
) -> Result<(), EmitError> {
    let count = blocks[block_idx].resolution_blocks.len();
    for r in 0..count {
        let insn_count = blocks[block_idx].resolution_blocks[r].insns.len();
        let entry = buf.offset();
        for i in 0..insn_count {
            let (kind, src, dst) = {
                let insn = &blocks[block_idx].resolution_blocks[r].insns[i];
                (insn.kind, insn.src, insn.dst)
            };
            let off = buf.offset();
            if !kind.is_pseudo() {
                emit_straightline(buf, kind, src, dst)?;
            }
            blocks[block_idx].resolution_blocks[r].insns[i].mach_offset = Some(off);
        }
        blocks[block_idx].resolution_blocks[r].mach_offset = Some(entry);
    }
    Ok(())
}

fn emit_branch(
    buf: &mut CodeBuffer,
    blocks: &mut [BasicBlock],
    block_idx: usize,
    kind: InsnKind,
    src: Operand,
    insn_mach_offset: usize,
    pre_flags: InsnFlags,
    fixups: &mut FixupEngine,
) -> Result<InsnFlags, EmitError> {
    let target = src.as_branch_target();
    let wants_resolution = pre_flags.contains(InsnFlags::BACKPATCH_RESOLUTION);
    let escaped = matches!(kind, InsnKind::Jcc(_));

    let disp_field_offset = match kind {
        InsnKind::JmpBranch => encoder::jmp_rel(buf, 0)?,
        InsnKind::Jcc(cond) => encoder::jcc_rel(buf, cond, 0)?,
        other => panic!("not a branch kind: {other:?}"),
    };

    if wants_resolution {
        let resolution_idx = blocks[block_idx]
            .has_resolution(target)
            .expect("BACKPATCH_RESOLUTION set without a registered resolution block");
        fixups.record_forward_to_resolution(
            disp_field_offset,
            insn_mach_offset,
            escaped,
            BlockId(block_idx as u32),
            resolution_idx,
        );
        return Ok(InsnFlags::BACKPATCH_RESOLUTION);
    }

    let target_mach_offset = blocks[target.0 as usize].mach_offset;
    match target_mach_offset {
        Some(target_offset) => {
            let disp = FixupEngine::displacement(insn_mach_offset, escaped, target_offset);
            buf.patch_u32(disp_field_offset, disp as u32);
            Ok(InsnFlags::NONE)
        }
        None => {
            fixups.record_forward_to_block(disp_field_offset, insn_mach_offset, escaped, target);
            Ok(InsnFlags::BACKPATCH_BRANCH)
        }
    }
}

fn emit_straightline(
    buf: &mut CodeBuffer,
    kind: InsnKind,
    src: Operand,
    dst: Operand,
) -> Result<(), EmitError> {
    use InsnKind::*;

    match kind {
        AluRegReg(op) => encoder::alu_reg_reg(buf, op, reg(&src), reg(&dst)),
        AluImmReg(op) => encoder::alu_imm_reg(buf, op, imm32(&src), reg(&dst)),
        AluMembaseReg(op) => {
            let (base, disp) = membase(&src);
            encoder::alu_membase_reg(buf, op, base, disp, reg(&dst))
        }
        AluMemdispReg(op) => encoder::alu_memdisp_reg(buf, op, memdisp(&src), reg(&dst)),
        AluRegMembase(op) => {
            let (base, disp) = membase(&dst);
            encoder::alu_reg_membase(buf, op, reg(&src), base, disp)
        }
        AluRegMemdisp(op) => encoder::alu_reg_memdisp(buf, op, reg(&src), memdisp(&dst)),

        MovRegReg => encoder::mov_reg_reg(buf, reg(&src), reg(&dst)),
        MovImmReg => encoder::mov_imm_reg(buf, imm32(&src), reg(&dst)),
        MovMembaseReg | MovMemlocalReg => {
            let (base, disp) = membase(&src);
            encoder::mov_membase_reg(buf, base, disp, reg(&dst))
        }
        MovRegMembase | MovRegMemlocal => {
            let (base, disp) = membase(&dst);
            encoder::mov_reg_membase(buf, reg(&src), base, disp)
        }
        MovMemdispReg => encoder::mov_memdisp_reg(buf, memdisp(&src), reg(&dst)),
        MovRegMemdisp => encoder::mov_reg_memdisp(buf, reg(&src), memdisp(&dst)),
        MovImmMembase | MovImmMemlocal => {
            let (base, disp) = membase(&dst);
            encoder::mov_imm_membase(buf, imm32(&src), base, disp)
        }
        MovMemindexReg => {
            let (base, index, scale, disp) = memindex(&src);
            encoder::mov_memindex_reg(buf, base, index, scale, disp, reg(&dst))
        }
        MovRegMemindex => {
            let (base, index, scale, disp) = memindex(&dst);
            encoder::mov_reg_memindex(buf, reg(&src), base, index, scale, disp)
        }
        MovThreadLocalMemdispReg => {
            encoder::mov_threadlocal_memdisp_reg(buf, threadlocal_disp(&src), reg(&dst))
        }
        MovRegThreadLocalMemdisp => {
            encoder::mov_reg_threadlocal_memdisp(buf, reg(&src), threadlocal_disp(&dst))
        }
        MovRegThreadLocalMembase => {
            let (base, disp) = threadlocal_membase(&dst);
            encoder::mov_reg_threadlocal_membase(buf, reg(&src), base, disp)
        }
        MovImmThreadLocalMembase => {
            let (base, disp) = threadlocal_membase(&dst);
            encoder::mov_imm_threadlocal_membase(buf, imm32(&src), base, disp)
        }

        Movsx8RegReg => encoder::movsx8_reg_reg(buf, reg(&src), reg(&dst)),
        Movsx8MembaseReg => {
            let (base, disp) = membase(&src);
            encoder::movsx8_membase_reg(buf, base, disp, reg(&dst))
        }
        Movsx16RegReg => encoder::movsx16_reg_reg(buf, reg(&src), reg(&dst)),
        Movsx16MembaseReg => {
            let (base, disp) = membase(&src);
            encoder::movsx16_membase_reg(buf, base, disp, reg(&dst))
        }
        Movzx16RegReg => encoder::movzx16_reg_reg(buf, reg(&src), reg(&dst)),

        ShiftRegReg(op) => encoder::shift_reg_reg(buf, op, reg(&dst)),
        ShiftImmReg(op) => encoder::shift_imm_reg(buf, op, imm32(&src) as u8, reg(&dst)),

        NegReg => encoder::neg_reg(buf, reg(&dst)),
        MulRegEax => encoder::mul_reg_eax(buf, reg(&src)),
        MulMembaseEax => {
            let (base, disp) = membase(&src);
            encoder::mul_membase_eax(buf, base, disp)
        }
        MulRegReg => encoder::mul_reg_reg(buf, reg(&src), reg(&dst)),
        DivRegReg => encoder::div_reg_reg(buf, reg(&src)),
        DivMembaseReg => {
            let (base, disp) = membase(&src);
            encoder::div_membase_reg(buf, base, disp)
        }
        Cdq => encoder::cdq(buf),

        PushReg => encoder::push_reg(buf, reg(&src)),
        PushImm => encoder::push_imm(buf, imm32(&src)),
        PushMembase | PushMemlocal => {
            let (base, disp) = membase(&src);
            encoder::push_membase(buf, base, disp)
        }
        PopReg => encoder::pop_reg(buf, reg(&dst)),
        PopMemlocal => {
            let (base, disp) = membase(&dst);
            encoder::pop_membase(buf, base, disp)
        }

        CallRel => encoder::call_rel(buf, imm32(&src)),
        CallReg => encoder::call_reg(buf, reg(&src)),
        JmpMembase => {
            let (base, disp) = membase(&src);
            encoder::jmp_membase(buf, base, disp)
        }
        JmpMemindex => {
            let (base, index, scale, disp) = memindex(&src);
            encoder::jmp_memindex(buf, base, index, scale, disp)
        }
        JmpReg => encoder::jmp_reg(buf, reg(&src)),
        Ret => encoder::ret(buf),
        Leave => encoder::leave(buf),
        Nop => encoder::nop(buf),

        TestMembaseReg => {
            let (base, disp) = membase(&src);
            encoder::test_membase_reg(buf, base, disp, reg(&dst))
        }
        TestImmMemdisp => encoder::test_imm_memdisp(buf, imm32(&src), memdisp(&dst)),

        SseAlu(op, width) => encoder::sse_alu_xmm_xmm(buf, op, width, xmm(&src), xmm(&dst)),
        SseMovRegReg(width) => encoder::sse_mov_reg_reg(buf, width, xmm(&src), xmm(&dst)),
        SseMovMembaseXmm(width) => {
            let (base, disp) = membase(&src);
            encoder::sse_mov_membase_xmm(buf, width, base, disp, xmm(&dst))
        }
        SseMovXmmMembase(width) => {
            let (base, disp) = membase(&dst);
            encoder::sse_mov_xmm_membase(buf, width, xmm(&src), base, disp)
        }
        SseMovMemdispXmm(width) => encoder::sse_mov_memdisp_xmm(buf, width, memdisp(&src), xmm(&dst)),
        SseMovXmmMemdisp(width) => encoder::sse_mov_xmm_memdisp(buf, width, xmm(&src), memdisp(&dst)),
        SseMovMemlocalXmm(width) => {
            let (base, disp) = membase(&src);
            encoder::sse_mov_membase_xmm(buf, width, base, disp, xmm(&dst))
        }
        SseMovXmmMemlocal(width) => {
            let (base, disp) = membase(&dst);
            encoder::sse_mov_xmm_membase(buf, width, xmm(&src), base, disp)
        }
        SseMovMemindexXmm(width) => {
            let (base, index, scale, disp) = memindex(&src);
            encoder::sse_mov_memindex_xmm(buf, width, base, index, scale, disp, xmm(&dst))
        }
        SseMovXmmMemindex(width) => {
            let (base, index, scale, disp) = memindex(&dst);
            encoder::sse_mov_xmm_memindex(buf, width, xmm(&src), base, index, scale, disp)
        }
        SseXorpX(width) => encoder::sse_alu_xmm_xmm(buf, SseAluOp::Xor, width, xmm(&src), xmm(&dst)),

        FldMembase | FldMemlocal => {
            let (base, disp) = membase(&src);
            encoder::fld_membase(buf, base, disp)
        }
        FldMembase64 | FldMemlocal64 => {
            let (base, disp) = membase(&src);
            encoder::fld_membase64(buf, base, disp)
        }
        FstpMembase | FstpMemlocal => {
            let (base, disp) = membase(&dst);
            encoder::fstp_membase(buf, base, disp)
        }
        FstpMembase64 | FstpMemlocal64 => {
            let (base, disp) = membase(&dst);
            encoder::fstp_membase64(buf, base, disp)
        }
        FildMembase64 => {
            let (base, disp) = membase(&src);
            encoder::fild_membase64(buf, base, disp)
        }
        FistpMembase64 => {
            let (base, disp) = membase(&dst);
            encoder::fistp_membase64(buf, base, disp)
        }
        Fldcw => {
            let (base, disp) = membase(&src);
            encoder::fldcw(buf, base, disp)
        }
        Fnstcw => {
            let (base, disp) = membase(&dst);
            encoder::fnstcw(buf, base, disp)
        }

        JmpBranch | Jcc(_) => unreachable!("branches are dispatched through emit_branch"),
        SaveCallerRegs | RestoreCallerRegs | Phi => Ok(()),
    }
}


//! Hand-assembled stubs that bridge compiled code to the runtime: method
//! prologue/epilogue, the invocation and JNI trampolines, monitor
//! enter/exit, the inline-cache check/miss pair, and the itable resolver.
//!
//! Every function here calls the encoder directly — stubs never go through
//! `emitter::emit_block`, since there is no basic-block structure to a
//! hand-rolled fragment. Runtime entry points (`jit_compile`,
//! `fixup_vtable`, `vm_object_lock`, ...) are taken as raw addresses rather
//! than symbols: resolving a symbol to an address is the loader's job, not
//! this core's.

use jit_core::{is_valid_itable, AluOp, Cond, EmitError, ItableEntry, Reg, StackFrameDescriptor, WORD_SIZE};

use crate::branch::FixupEngine;
use crate::buffer::CodeBuffer;
use crate::encoder;
use crate::options::EmitOptions;

/// Pushed below the frame in debug builds and checked on the way out to
/// catch stack-layout corruption.
pub const REDZONE_MAGIC: u32 = 0xDEADBEEF;

/// Emits `call target`, computing the relative displacement from the
/// buffer's own executable address — valid because `CodeBuffer` backs
/// real mmap'd pages, so `current_ptr()` is the address this code will
/// actually run at.
fn call_abs(buf: &mut CodeBuffer, target: usize) -> Result<(), EmitError> {
    let insn_addr = buf.current_ptr() as usize;
    let disp = (target as i64 - (insn_addr as i64 + 5)) as i32;
    encoder::call_rel(buf, disp)
}

fn jmp_abs(buf: &mut CodeBuffer, target: usize) -> Result<(), EmitError> {
    let insn_addr = buf.current_ptr() as usize;
    let disp = (target as i64 - (insn_addr as i64 + 5)) as i32;
    encoder::jmp_rel(buf, disp).map(|_| ())
}

fn jcc_abs(buf: &mut CodeBuffer, cond: Cond, target: usize) -> Result<(), EmitError> {
    let insn_addr = buf.current_ptr() as usize;
    let disp = (target as i64 - (insn_addr as i64 + 6)) as i32;
    encoder::jcc_rel(buf, cond, disp).map(|_| ())
}

/// The thread-local exception poll: a GS-relative load followed by a
/// dereference that deliberately faults if the loaded pointer is non-null.
/// The two instructions must stay adjacent; the SIGSEGV handler that turns
/// this into Java-level exception propagation is an external collaborator
/// this core never calls directly.
fn emit_exception_poll(buf: &mut CodeBuffer, exception_ptr_gs_disp: i32, scratch: Reg) -> Result<(), EmitError> {
    encoder::mov_threadlocal_memdisp_reg(buf, exception_ptr_gs_disp, scratch)?;
    encoder::test_membase_reg(buf, scratch, 0, scratch)
}

/// `push %ebp; mov %esp, %ebp; sub $frame_size, %esp; push <callee-saves>;
/// [push $REDZONE_MAGIC]`.
pub fn emit_prologue(
    buf: &mut CodeBuffer,
    frame: &StackFrameDescriptor,
    callee_saved: &[Reg],
    options: EmitOptions,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, Reg::Ebp)?;
    encoder::mov_reg_reg(buf, Reg::Esp, Reg::Ebp)?;
    if frame.frame_size > 0 {
        encoder::alu_imm_reg(buf, AluOp::Sub, frame.frame_size, Reg::Esp)?;
    }
    for &r in callee_saved {
        encoder::push_reg(buf, r)?;
    }
    if options.stack_debug {
        encoder::push_imm(buf, REDZONE_MAGIC as i32)?;
    }
    Ok(())
}

/// Reverse of the prologue. In stack-debug mode, pops the red-zone magic
/// into `scratch` and jumps to `abort_handler_addr` if it was clobbered.
fn emit_epilogue_body(
    buf: &mut CodeBuffer,
    callee_saved: &[Reg],
    options: EmitOptions,
    scratch: Reg,
    abort_handler_addr: usize,
) -> Result<(), EmitError> {
    if options.stack_debug {
        encoder::pop_reg(buf, scratch)?;
        encoder::alu_imm_reg(buf, AluOp::Cmp, REDZONE_MAGIC as i32, scratch)?;
        jcc_abs(buf, Cond::Ne, abort_handler_addr)?;
    }
    for &r in callee_saved.iter().rev() {
        encoder::pop_reg(buf, r)?;
    }
    Ok(())
}

/// `[redzone check]; pop <callee-saves reversed>; leave; ret`.
pub fn emit_epilogue(
    buf: &mut CodeBuffer,
    callee_saved: &[Reg],
    options: EmitOptions,
    scratch: Reg,
    abort_handler_addr: usize,
) -> Result<(), EmitError> {
    emit_epilogue_body(buf, callee_saved, options, scratch, abort_handler_addr)?;
    encoder::leave(buf)?;
    encoder::ret(buf)
}

/// Same as [`emit_epilogue`] but ends with an indirect jump to the external
/// unwinder instead of `ret` — used when the method is returning through a
/// stack-unwind path rather than a normal call return.
pub fn emit_unwind_epilogue(
    buf: &mut CodeBuffer,
    callee_saved: &[Reg],
    options: EmitOptions,
    scratch: Reg,
    abort_handler_addr: usize,
    unwind_addr: usize,
) -> Result<(), EmitError> {
    emit_epilogue_body(buf, callee_saved, options, scratch, abort_handler_addr)?;
    encoder::leave(buf)?;
    encoder::mov_imm_reg(buf, unwind_addr as i32, scratch)?;
    encoder::jmp_reg(buf, scratch)
}

/// Invoked by the runtime the first time a method is called. Compiles the
/// method, fixes up the call-site vtable slot for virtual dispatch, and
/// falls into the freshly compiled code.
pub fn emit_invocation_trampoline(
    buf: &mut CodeBuffer,
    frame: &StackFrameDescriptor,
    cu_handle: i32,
    jit_compile_addr: usize,
    fixup_vtable_addr: usize,
    exception_ptr_gs_disp: i32,
    is_virtual: bool,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, Reg::Ebp)?;
    encoder::mov_reg_reg(buf, Reg::Esp, Reg::Ebp)?;

    encoder::push_imm(buf, cu_handle)?;
    call_abs(buf, jit_compile_addr)?;
    encoder::alu_imm_reg(buf, AluOp::Add, WORD_SIZE, Reg::Esp)?;

    emit_exception_poll(buf, exception_ptr_gs_disp, Reg::Ecx)?;

    if is_virtual {
        encoder::push_reg(buf, Reg::Eax)?;
        encoder::push_membase(buf, Reg::Ebp, frame.args_offset)?;
        encoder::push_imm(buf, cu_handle)?;
        call_abs(buf, fixup_vtable_addr)?;
        encoder::alu_imm_reg(buf, AluOp::Add, 2 * WORD_SIZE, Reg::Esp)?;
        encoder::pop_reg(buf, Reg::Eax)?;
    }

    encoder::pop_reg(buf, Reg::Ebp)?;
    encoder::jmp_reg(buf, Reg::Eax)
}

/// Rearranges the stack so a shared `jni_trampoline` entry point receives
/// `(return_pc, target_fn, vmm, saved_ebp)`, in that order on the stack.
pub fn emit_jni_trampoline(
    buf: &mut CodeBuffer,
    jni_trampoline_addr: usize,
    return_pc: Reg,
    target_fn: Reg,
    vmm: Reg,
    saved_ebp: Reg,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, saved_ebp)?;
    encoder::push_reg(buf, vmm)?;
    encoder::push_reg(buf, target_fn)?;
    encoder::push_reg(buf, return_pc)?;
    jmp_abs(buf, jni_trampoline_addr)
}

/// `trace_invoke(cu_handle)` emitted at method entry in trace builds —
/// `push $cu_handle; call trace_invoke; add $WORD_SIZE, %esp`. Gated behind
/// the `trace` feature since it adds a call on every single invocation of
/// every compiled method.
#[cfg(feature = "trace")]
pub fn emit_trace_invoke(buf: &mut CodeBuffer, cu_handle: i32, trace_invoke_addr: usize) -> Result<(), EmitError> {
    encoder::push_imm(buf, cu_handle)?;
    call_abs(buf, trace_invoke_addr)?;
    encoder::alu_imm_reg(buf, AluOp::Add, WORD_SIZE, Reg::Esp)
}

/// `vm_object_lock(receiver)` followed by an exception poll.
pub fn emit_monitor_enter(
    buf: &mut CodeBuffer,
    lock_addr: usize,
    receiver: Reg,
    exception_ptr_gs_disp: i32,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, receiver)?;
    call_abs(buf, lock_addr)?;
    encoder::alu_imm_reg(buf, AluOp::Add, WORD_SIZE, Reg::Esp)?;
    emit_exception_poll(buf, exception_ptr_gs_disp, Reg::Ecx)
}

/// `vm_object_unlock(receiver)` followed by an exception poll, preserving
/// `%eax`/`%edx` across the call since either may be carrying a return
/// value out of the method.
pub fn emit_monitor_exit(
    buf: &mut CodeBuffer,
    unlock_addr: usize,
    receiver: Reg,
    exception_ptr_gs_disp: i32,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, Reg::Eax)?;
    encoder::push_reg(buf, Reg::Edx)?;
    encoder::push_reg(buf, receiver)?;
    call_abs(buf, unlock_addr)?;
    encoder::alu_imm_reg(buf, AluOp::Add, WORD_SIZE, Reg::Esp)?;
    encoder::pop_reg(buf, Reg::Edx)?;
    encoder::pop_reg(buf, Reg::Eax)?;
    emit_exception_poll(buf, exception_ptr_gs_disp, Reg::Ecx)
}

/// Compares the type hash loaded at the call site against the expected
/// hash and emits an open-coded `jne` with a placeholder displacement.
/// Returns the byte offset of that displacement field, to be backpatched
/// by [`finish_ic_check`] once the miss handler's address is known.
pub fn emit_ic_check(buf: &mut CodeBuffer, actual_hash: Reg, expected_hash: Reg) -> Result<(usize, usize), EmitError> {
    let insn_offset = buf.offset();
    encoder::cmp_reg_reg(buf, actual_hash, expected_hash)?;
    let disp_field_offset = encoder::jcc_rel(buf, Cond::Ne, 0)?;
    Ok((insn_offset, disp_field_offset))
}

/// Backpatches the `jne` emitted by [`emit_ic_check`] to land on the miss
/// handler. The check and miss handler live in the same buffer, so this
/// reuses the branch engine's displacement formula directly rather than
/// going through a full [`crate::branch::FixupEngine`].
pub fn finish_ic_check(buf: &mut CodeBuffer, check_insn_offset: usize, disp_field_offset: usize, miss_handler_offset: usize) {
    let disp = FixupEngine::displacement(check_insn_offset, true, miss_handler_offset);
    buf.patch_u32(disp_field_offset, disp as u32);
}

/// `resolve_ic_miss(receiver, expected_method, current_type)`, then an
/// indirect jump to the resolved code address the call leaves in `%eax`.
pub fn emit_ic_miss_handler(
    buf: &mut CodeBuffer,
    resolve_ic_miss_addr: usize,
    receiver: Reg,
    expected_method: Reg,
    current_type: Reg,
) -> Result<(), EmitError> {
    encoder::push_reg(buf, receiver)?;
    encoder::push_reg(buf, expected_method)?;
    encoder::push_reg(buf, current_type)?;
    call_abs(buf, resolve_ic_miss_addr)?;
    encoder::alu_imm_reg(buf, AluOp::Add, 3 * WORD_SIZE, Reg::Esp)?;
    encoder::jmp_reg(buf, Reg::Eax)
}

/// Generated per implementing class. `%eax` carries the interface-method
/// hash at call time; `vtable_reg` must already hold the class's vtable
/// base address. Recursively emits a binary search over `table`, sorted
/// ascending by hash, landing on `vtable_entry = vtable_reg +
/// table[match].slot_index * word_size` and jumping indirectly through it.
pub fn emit_itable_resolver_stub(
    buf: &mut CodeBuffer,
    table: &[ItableEntry],
    vtable_reg: Reg,
    options: EmitOptions,
    error_handler_addr: usize,
) -> Result<(), EmitError> {
    assert!(
        is_valid_itable(table),
        "itable resolver requires >=2 entries sorted ascending by hash"
    );
    emit_search_node(buf, table, 0, table.len() - 1, vtable_reg, options, error_handler_addr)
}

fn emit_search_node(
    buf: &mut CodeBuffer,
    table: &[ItableEntry],
    a: usize,
    b: usize,
    vtable_reg: Reg,
    options: EmitOptions,
    error_handler_addr: usize,
) -> Result<(), EmitError> {
    let m = a + (b - a) / 2;
    encoder::alu_imm_reg(buf, AluOp::Cmp, table[m].hash as i32, Reg::Eax)?;

    let leaf = a == b;
    if leaf {
        if options.itable_debug_checks {
            jcc_abs(buf, Cond::Ne, error_handler_addr)?;
        }
        encoder::alu_imm_reg(buf, AluOp::Add, (table[m].slot_index * WORD_SIZE as u32) as i32, vtable_reg)?;
        return encoder::jmp_membase(buf, vtable_reg, 0);
    }

    let jb_pending = if m > a {
        let insn_offset = buf.offset();
        let disp_field_offset = encoder::jcc_rel(buf, Cond::B, 0)?;
        Some((insn_offset, disp_field_offset))
    } else {
        None
    };
    let ja_pending = if m < b {
        let insn_offset = buf.offset();
        let disp_field_offset = encoder::jcc_rel(buf, Cond::A, 0)?;
        Some((insn_offset, disp_field_offset))
    } else {
        None
    };

    encoder::alu_imm_reg(buf, AluOp::Add, (table[m].slot_index * WORD_SIZE as u32) as i32, vtable_reg)?;
    encoder::jmp_membase(buf, vtable_reg, 0)?;

    if let Some((insn_offset, disp_field_offset)) = jb_pending {
        let left_entry = buf.offset();
        let disp = FixupEngine::displacement(insn_offset, true, left_entry);
        buf.patch_u32(disp_field_offset, disp as u32);
        emit_search_node(buf, table, a, m - 1, vtable_reg, options, error_handler_addr)?;
    }
    if let Some((insn_offset, disp_field_offset)) = ja_pending {
        let right_entry = buf.offset();
        let disp = FixupEngine::displacement(insn_offset, true, right_entry);
        buf.patch_u32(disp_field_offset, disp as u32);
        emit_search_node(buf, table, m + 1, b, vtable_reg, options, error_handler_addr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_core::CALLEE_SAVED;

    #[test]
    fn prologue_then_epilogue_restores_callee_saves() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        let frame = StackFrameDescriptor::new(16, 8);
        emit_prologue(&mut buf, &frame, CALLEE_SAVED, EmitOptions::release()).unwrap();
        let after_prologue = buf.offset();
        emit_epilogue(&mut buf, CALLEE_SAVED, EmitOptions::release(), Reg::Eax, 0).unwrap();
        assert!(buf.offset() > after_prologue);
        assert_eq!(*buf.as_slice().last().unwrap(), 0xC3);
    }

    #[test]
    fn redzone_prologue_pushes_magic() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        let frame = StackFrameDescriptor::new(0, 8);
        emit_prologue(&mut buf, &frame, &[], EmitOptions::debug()).unwrap();
        let bytes = buf.as_slice();
        // push ebp; mov esp,ebp; push imm32 REDZONE_MAGIC
        assert_eq!(&bytes[0..3], &[0x55, 0x89, 0xE5]);
        assert_eq!(bytes[3], 0x68);
        assert_eq!(&bytes[4..8], &REDZONE_MAGIC.to_le_bytes());
    }

    #[test]
    #[cfg(feature = "trace")]
    fn trace_invoke_pushes_handle_then_restores_esp() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        emit_trace_invoke(&mut buf, 0x1234, 0).unwrap();
        let bytes = buf.as_slice();
        assert_eq!(bytes[0], 0x68); // push imm32
        assert_eq!(&bytes[1..5], &0x1234i32.to_le_bytes());
        assert_eq!(*bytes.last().unwrap(), WORD_SIZE as u8); // add $4, %esp's imm8
    }

    #[test]
    fn itable_two_entry_search_emits_both_leaves() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        let table = [ItableEntry::new(10, 0), ItableEntry::new(20, 1)];
        emit_itable_resolver_stub(&mut buf, &table, Reg::Ecx, EmitOptions::release(), 0).unwrap();
        assert!(buf.offset() > 0);
    }

    #[test]
    fn ic_check_and_miss_patch_to_correct_displacement() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        let (insn_offset, disp_field_offset) = emit_ic_check(&mut buf, Reg::Eax, Reg::Ecx).unwrap();
        let miss_offset = buf.offset() + 16; // pretend some other code sits in between
        buf.set_offset(miss_offset);
        finish_ic_check(&mut buf, insn_offset, disp_field_offset, miss_offset);
        let patched = buf.read_u32(disp_field_offset) as i32;
        assert_eq!(patched, (miss_offset as i64 - (insn_offset as i64 + 6)) as i32);
    }
}

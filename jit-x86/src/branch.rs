//! Branch / fixup engine: tracks every branch whose target wasn't known at
//! emission time and patches the relative displacement in once the whole
//! method has been laid out.
//!
//! The displacement formula is the same one used for an immediately-known
//! back edge (see `emitter::emit_branch`) and for a deferred forward edge:
//! `target_offset - (insn_mach_offset + 5) - (1 if ESCAPED else 0)`. Storing
//! pending fixups as `(field offset, insn offset, escaped, target)` rather
//! than as a delta means `apply_all` recomputes from scratch every time —
//! running it twice is a no-op on the bytes it writes.

use log::debug;

use jit_core::{BasicBlock, BlockId};

use crate::buffer::CodeBuffer;

#[derive(Debug, Clone, Copy)]
enum FixupTarget {
    Block(BlockId),
    Resolution(BlockId, usize),
}

#[derive(Debug, Clone, Copy)]
struct PendingFixup {
    /// Byte offset of the 4-byte displacement field to patch.
    disp_field_offset: usize,
    /// `mach_offset` of the branch instruction itself.
    insn_mach_offset: usize,
    escaped: bool,
    target: FixupTarget,
}

#[derive(Debug, Default)]
pub struct FixupEngine {
    pending: Vec<PendingFixup>,
    applied: bool,
}

impl FixupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the relative displacement for a branch whose target offset
    /// is already known (a back edge), per the formula in spec §4.2.
    pub fn displacement(insn_mach_offset: usize, escaped: bool, target_offset: usize) -> i32 {
        let escape_byte = if escaped { 1 } else { 0 };
        (target_offset as i64 - (insn_mach_offset as i64 + 5) - escape_byte) as i32
    }

    /// Records a forward branch to a basic block not yet emitted, to be
    /// resolved by [`FixupEngine::apply_all`].
    pub fn record_forward_to_block(
        &mut self,
        disp_field_offset: usize,
        insn_mach_offset: usize,
        escaped: bool,
        target: BlockId,
    ) {
        self.pending.push(PendingFixup {
            disp_field_offset,
            insn_mach_offset,
            escaped,
            target: FixupTarget::Block(target),
        });
    }

    /// Records a branch that must land in a resolution block rather than
    /// directly on its nominal successor.
    pub fn record_forward_to_resolution(
        &mut self,
        disp_field_offset: usize,
        insn_mach_offset: usize,
        escaped: bool,
        successor: BlockId,
        resolution_idx: usize,
    ) {
        self.pending.push(PendingFixup {
            disp_field_offset,
            insn_mach_offset,
            escaped,
            target: FixupTarget::Resolution(successor, resolution_idx),
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Patches every recorded fixup in place. Every `BACKPATCH_BRANCH` and
    /// `BACKPATCH_RESOLUTION` flag set during emission must be resolvable
    /// here — an unresolved target is a fatal bug in the caller, not a
    /// recoverable condition, so this asserts rather than returning an
    /// error.
    pub fn apply_all(&mut self, buf: &mut CodeBuffer, blocks: &[BasicBlock]) {
        debug!("applying {} pending branch fixup(s)", self.pending.len());
        for fixup in &self.pending {
            let target_offset = match fixup.target {
                FixupTarget::Block(id) => blocks[id.0 as usize]
                    .mach_offset
                    .expect("branch target block was never emitted"),
                FixupTarget::Resolution(id, idx) => blocks[id.0 as usize].resolution_blocks[idx]
                    .mach_offset
                    .expect("resolution block was never emitted"),
            };
            let disp = Self::displacement(fixup.insn_mach_offset, fixup.escaped, target_offset);
            debug!(
                "branch at {:#x} -> {:#x}: disp {:#x}",
                fixup.insn_mach_offset, target_offset, disp
            );
            buf.patch_u32(fixup.disp_field_offset, disp as u32);
        }
        self.applied = true;
    }

    pub fn all_applied(&self) -> bool {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_core::{BasicBlock, BlockId};

    #[test]
    fn displacement_matches_branch_fixup_law() {
        // insn at offset 10, target at offset 50, not escaped.
        let d = FixupEngine::displacement(10, false, 50);
        assert_eq!(d, 50 - (10 + 5));
    }

    #[test]
    fn escaped_branch_shifts_displacement_by_one() {
        let d = FixupEngine::displacement(10, true, 50);
        assert_eq!(d, 50 - (10 + 5) - 1);
    }

    #[test]
    fn apply_all_is_idempotent() {
        let mut buf = CodeBuffer::with_default_size().unwrap();
        // Reserve space for a 5-byte jmp at offset 0, then land a target at offset 20.
        buf.emit_u8(0xE9).unwrap();
        let disp_offset = buf.offset();
        buf.emit_i32(0).unwrap();
        buf.set_offset(20);

        let mut block = BasicBlock::new(BlockId(0));
        block.mach_offset = Some(20);
        block.is_emitted = true;
        let blocks = vec![block];

        let mut engine = FixupEngine::new();
        engine.record_forward_to_block(disp_offset, 0, false, BlockId(0));
        engine.apply_all(&mut buf, &blocks);
        let first = buf.read_u32(disp_offset);
        engine.apply_all(&mut buf, &blocks);
        let second = buf.read_u32(disp_offset);
        assert_eq!(first, second);
        assert_eq!(first as i32, 20 - 5);
    }
}

use std::collections::HashMap;

use crate::instruction::Instruction;
use crate::operand::BlockId;

/// A straight-line run of instructions with no internal branch targets.
///
/// `mach_offset` is filled in the moment the first instruction of the block
/// is emitted. `is_emitted` flips to `true` only once every instruction in
/// `insns` carries a `mach_offset` — that's the signal the branch engine
/// uses to tell a back edge (target already emitted, patch immediately)
/// from a forward edge (target unknown, defer).
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub insns: Vec<Instruction>,
    pub mach_offset: Option<usize>,
    pub is_emitted: bool,
    pub resolution_blocks: Vec<ResolutionBlock>,
    /// Successor block -> index into `resolution_blocks`, for edges that
    /// need per-edge preparation code rather than a direct jump.
    successor_resolution: HashMap<BlockId, usize>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            insns: Vec::new(),
            mach_offset: None,
            is_emitted: false,
            resolution_blocks: Vec::new(),
            successor_resolution: HashMap::new(),
        }
    }

    pub fn push(&mut self, insn: Instruction) {
        self.insns.push(insn);
    }

    /// Registers (or looks up) the resolution block guarding the edge to
    /// `successor`, returning its index into `resolution_blocks`.
    pub fn resolution_for(&mut self, successor: BlockId) -> usize {
        if let Some(&idx) = self.successor_resolution.get(&successor) {
            return idx;
        }
        let idx = self.resolution_blocks.len();
        self.resolution_blocks.push(ResolutionBlock::new(successor));
        self.successor_resolution.insert(successor, idx);
        idx
    }

    pub fn has_resolution(&self, successor: BlockId) -> Option<usize> {
        self.successor_resolution.get(&successor).copied()
    }
}

/// A tiny synthetic code region placed on a control-flow edge when several
/// predecessors fan into the same successor but each needs distinct
/// per-edge preparation (e.g. restoring a register one path clobbered that
/// another didn't). Holds its own instruction stream and `mach_offset`,
/// exactly like a basic block, but is never a jump target from outside the
/// edge it guards.
#[derive(Debug, Clone)]
pub struct ResolutionBlock {
    pub target: BlockId,
    pub insns: Vec<Instruction>,
    pub mach_offset: Option<usize>,
}

impl ResolutionBlock {
    pub fn new(target: BlockId) -> Self {
        Self {
            target,
            insns: Vec::new(),
            mach_offset: None,
        }
    }

    pub fn push(&mut self, insn: Instruction) {
        self.insns.push(insn);
    }
}

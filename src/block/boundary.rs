use tracing::{debug};

use super::{Block};
use crate::arch::{self, Architecture, BranchType};
use crate::code::{Field, Condition, Backend};
use crate::memory::{MemoryMap};
use crate::pipeline::{INVALID_PC};

/** Where a [`Block`] really ends. */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Boundary {
    /** The address of the upper half of the last pair to compile. */
    pub fixed_end: u32,
    /** `true` if the block was extended to include a delay slot. */
    pub needs_pc_adjust: bool,
}

impl Boundary {
    /**
     * Make sure that `block` does not end between a branch and its delay
     * slot. Whoever partitions the microcode into blocks sometimes cuts a
     * block just after a branch; if so, we take one more pair.
     */
    pub fn normalize<M: MemoryMap, A: Architecture>(block: Block, memory: &M, arch: &A) -> Self {
        let address_lo = block.end() - 4;
        let address_hi = block.end();
        let opcode_lo = memory.fetch_word(address_lo);
        let opcode_hi = memory.fetch_word(address_hi);
        // With the I bit set, the lower word is an immediate.
        if !arch::is_loi(opcode_hi) && arch.classify_branch(address_lo, opcode_lo) == BranchType::Normal {
            let fixed_end = block.end() + 8;
            debug!(branch = address_lo, fixed_end, "extending block to include delay slot");
            Boundary {fixed_end, needs_pc_adjust: true}
        } else {
            Boundary {fixed_end: block.end(), needs_pc_adjust: false}
        }
    }

    /**
     * If the block was extended, the delay slot has now been executed. When
     * no jump is pending, make execution continue after it rather than
     * running the delay slot again as the start of the next block.
     */
    pub fn emit_pc_adjust(&self, b: &mut impl Backend) {
        if !self.needs_pc_adjust { return; }
        b.push_const(INVALID_PC);
        b.push(Field::DelayedJumpAddr);
        b.begin_if(Condition::Eq);
        {
            b.push_const(self.fixed_end + 4);
            b.pull(Field::DelayedJumpAddr);
        }
        b.end_if();
    }
}

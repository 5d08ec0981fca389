//! Conditional branches whose condition register was written by the
//! instruction just before them.
//!
//! Normally a branch sees the integer result of the previous instruction
//! through a pipeline shortcut. The shortcut does not work for a branch at
//! the end of a block, and the hardware then uses the value the register had
//! when the fourth pair before the branch issued. We reproduce that by taking
//! a snapshot of the register at that point and swapping it in while the
//! branch is compiled.

use tracing::{debug};

use super::{Block};
use crate::arch::{self, Architecture};
use crate::code::{Field, Backend};
use crate::error::{CompileError, Result};
use crate::memory::{MemoryMap};

/** How many pairs before the branch the snapshot is taken. */
pub const SNAPSHOT_DISTANCE: u32 = 4;

/** Where to snapshot an integer register, and where to use the snapshot. */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct IntegerDelay {
    /** The VI register. */
    pub reg: u8,
    /** Snapshot the register before compiling the pair at this address. */
    pub save_address: u32,
    /** Use the snapshot while compiling the lower half of this pair. */
    pub use_address: u32,
}

impl IntegerDelay {
    /**
     * Decide whether `block`, ending at `fixed_end`, needs an `IntegerDelay`.
     * It does if its last branch (two pairs before `fixed_end`'s pair) is
     * conditional, reads a register written by the previous lower
     * instruction, and the block is not a special loop.
     */
    pub fn detect<M: MemoryMap, A: Architecture>(
        block: Block,
        fixed_end: u32,
        memory: &M,
        arch: &A,
    ) -> Result<Option<Self>> {
        let adjusted_end = fixed_end - 4;
        if adjusted_end < block.begin() + 8 { return Ok(None); }
        let branch_address = adjusted_end - 8;
        let branch_opcode = memory.fetch_word(branch_address);
        if !arch::is_conditional_branch(branch_opcode) { return Ok(None); }
        // The previous instruction may precede the block.
        let prior_address = match branch_address.checked_sub(8) {
            Some(address) => address,
            None => return Ok(None),
        };
        let prior_opcode = memory.fetch_word(prior_address);
        let prior = arch.operand_effects(prior_address, prior_opcode);
        if prior.write_i == 0 || prior.branch_value { return Ok(None); }
        let branch = arch.operand_effects(branch_address, branch_opcode);
        if !branch.reads_i(prior.write_i) { return Ok(None); }
        if is_special_loop(block, fixed_end, prior.write_i, memory, arch)? {
            debug!(branch = branch_address, reg = prior.write_i, "special loop: no integer branch delay");
            return Ok(None);
        }
        let distance = SNAPSHOT_DISTANCE * 8;
        let save_address = branch_address.saturating_sub(distance).max(block.begin());
        let ret = IntegerDelay {reg: prior.write_i, save_address, use_address: branch_address};
        debug!(?ret, "integer branch delay");
        Ok(Some(ret))
    }

    /** Called before compiling the pair at `address`. */
    pub fn save(&self, address: u32, b: &mut impl Backend) {
        if address == self.save_address {
            b.move_(Field::SavedIntReg, Field::Vi(self.reg));
        }
    }

    /** Called before compiling the lower instruction at `address`. */
    pub fn swap_in(&self, address: u32, b: &mut impl Backend) {
        if address == self.use_address {
            b.move_(Field::SavedIntRegTemp, Field::Vi(self.reg));
            b.move_(Field::Vi(self.reg), Field::SavedIntReg);
        }
    }

    /** Called after compiling the lower instruction at `address`. */
    pub fn swap_out(&self, address: u32, b: &mut impl Backend) {
        if address == self.use_address {
            b.move_(Field::Vi(self.reg), Field::SavedIntRegTemp);
        }
    }
}

/**
 * The lowest address that [`IntegerDelay::detect()`] reads for `block`
 * ending at `fixed_end`.
 */
pub fn first_read(block: Block, fixed_end: u32) -> u32 {
    let adjusted_end = fixed_end - 4;
    if adjusted_end < block.begin() + 8 { return block.begin(); }
    adjusted_end.saturating_sub(16).min(block.begin())
}

/**
 * Recognises a four-pair loop in which every lower instruction but the
 * branch writes `reg`, and the branch jumps back to the start of the block.
 * Some game microcode counts with such a loop, and it only works if the
 * branch sees the current value of `reg`.
 *
 * Only the four pairs before the delay slot are inspected. The delay slot
 * itself need not write `reg`, which makes this exemption slightly broader
 * than one that also checks the delay slot.
 */
// TODO: Find out what the hardware really does here, and replace this
// pattern match with a model of it.
pub fn is_special_loop<M: MemoryMap, A: Architecture>(
    block: Block,
    fixed_end: u32,
    reg: u8,
    memory: &M,
    arch: &A,
) -> Result<bool> {
    let length = (fixed_end - block.begin()) / 8;
    if length != 4 { return Ok(false); }
    for index in 0..length {
        let address = block.begin() + index * 8;
        let opcode = memory.fetch_word(address);
        if index == length - 1 {
            if !arch::is_conditional_branch(opcode) {
                return Err(CompileError::NotConditionalBranch {address, opcode});
            }
            if arch.effective_branch_target(address, opcode) != block.begin() { return Ok(false); }
        } else if arch.operand_effects(address, opcode).write_i != reg {
            return Ok(false);
        }
    }
    Ok(true)
}

//! What the block compiler needs to know about the instruction set.
//!
//! Decoding is not done here. An [`Architecture`] reports, for one 32-bit
//! sub-instruction, which registers it touches and how it branches, and
//! emits the code for it. The block compiler only decides what has to
//! happen around each instruction.

use super::code::{Backend};

/** How a sub-instruction affects control flow. */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum BranchType {
    /** Not a branch. */
    None,
    /** A branch or jump with a delay slot. */
    Normal,
    /** Anything else that ends a block, e.g. a halt. */
    Other,
}

/**
 * The registers read and written by one sub-instruction.
 *
 * Register indices are 0 for "none". `VF0` and `VI0` are constant, so no
 * instruction really depends on them.
 */
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Operands {
    /** First VF register read. */
    pub read_f0: u8,
    /** Second VF register read. */
    pub read_f1: u8,
    /** VF register written. */
    pub write_f: u8,
    /** First VI register read. */
    pub read_i0: u8,
    /** Second VI register read. */
    pub read_i1: u8,
    /** VI register written. */
    pub write_i: u8,
    /** Reads Q. Only upper instructions do this. */
    pub read_q: bool,
    /** Writes Q. Only lower instructions do this. */
    pub sync_q: bool,
    /** Writes a flag-derived value to `write_i`, not an arithmetic result. */
    pub branch_value: bool,
}

impl Operands {
    /** The VF registers read, excluding "none". */
    pub fn reads_f(&self) -> impl Iterator<Item=u8> {
        [self.read_f0, self.read_f1].into_iter().filter(|&r| r != 0)
    }

    /** Returns `true` if `reg` is one of the VI registers read. */
    pub fn reads_i(&self, reg: u8) -> bool {
        reg != 0 && (self.read_i0 == reg || self.read_i1 == reg)
    }
}

/** Scheduling information passed to [`Architecture::compile_instruction()`]. */
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Schedule {
    /** Cycles since the start of the block, including stalls. */
    pub relative_pipe_time: u32,
}

/**
 * The instruction set of the coprocessor.
 *
 * All methods take `&self` so that one `Architecture` can serve several
 * compilations at once.
 */
pub trait Architecture {
    /** Classify the sub-instruction `opcode` found at `address`. */
    fn classify_branch(&self, address: u32, opcode: u32) -> BranchType;

    /** Report the registers that `opcode` reads and writes. */
    fn operand_effects(&self, address: u32, opcode: u32) -> Operands;

    /** The address that the branch `opcode` at `address` jumps to. */
    fn effective_branch_target(&self, address: u32, opcode: u32) -> u32;

    /** Emit code for the sub-instruction `opcode` found at `address`. */
    fn compile_instruction<B: Backend>(
        &self,
        address: u32,
        opcode: u32,
        schedule: Schedule,
        backend: &mut B,
    );
}

/** The I bit of an upper instruction: the lower word is an immediate. */
pub fn is_loi(upper_opcode: u32) -> bool {
    upper_opcode & 0x8000_0000 != 0
}

/** Conditional branches are the lower opcodes `0x28` to `0x2F`. */
pub fn is_conditional_branch(lower_opcode: u32) -> bool {
    let id = (lower_opcode >> 25) & 0x7F;
    (0x28..0x30).contains(&id)
}

//-----------------------------------------------------------------------------

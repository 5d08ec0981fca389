/*!
 * The basic-block compiler.
 *
 * A [`Block`] is a run of instruction pairs. Each pair is a lower and an
 * upper 32-bit instruction that issue in the same cycle. Compiling a block
 * means asking the [`Architecture`] to compile each instruction in turn, and
 * wrapping that code so that the result has the coprocessor's timing and
 * hazard behaviour:
 *
 *  - The block is extended if it would otherwise separate a branch from
 *    its delay slot ([`Boundary`]).
 *  - Q is drained or checked at the right cycles, and the block's duration
 *    is added to the cycle counter ([`HazardTracker`]).
 *  - If an upper instruction writes a VF register that the lower
 *    instruction reads, the lower instruction sees the old value.
 *  - A conditional branch that tests a register written by the previous
 *    instruction sees an older value of it ([`IntegerDelay`]).
 */

use std::fmt::{self, Display, Formatter};
use tracing::{trace, trace_span};

use super::arch::{Architecture, Operands, Schedule};
use super::code::{Field, Backend};
use super::error::{CompileError, Result};
use super::memory::{MemoryMap};
use super::pipeline::{LATENCY_MAC};

mod boundary;
pub use boundary::{Boundary};

mod hazard;
pub use hazard::{HazardTracker, VfReg, NUM_VF, NUM_VI, check_registers};

mod delay;
pub use delay::{IntegerDelay, is_special_loop, first_read, SNAPSHOT_DISTANCE};


/**
 * The highest `end` of a [`Block`]. Above it, the delay slot or the address
 * after it would not fit in 32 bits.
 */
pub const MAX_END: u32 = u32::MAX - 12;

/**
 * A range of instruction pairs from `begin` to `end` inclusive. `begin` is
 * the address of the first lower instruction and `end` the address of the
 * last upper instruction.
 */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Block {
    begin: u32,
    end: u32,
}

impl Block {
    pub fn new(begin: u32, end: u32) -> Result<Self> {
        if begin & 0x7 != 0 || end & 0x7 != 4 || end < begin {
            return Err(CompileError::Misaligned {begin, end});
        }
        if end > MAX_END {
            return Err(CompileError::AddressOverflow {begin, end});
        }
        Ok(Block {begin, end})
    }

    pub fn begin(&self) -> u32 { self.begin }

    pub fn end(&self) -> u32 { self.end }

    /** The number of instruction pairs. */
    pub fn pairs(&self) -> u32 { (self.end - self.begin) / 8 + 1 }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:#x}..={:#x}", self.begin, self.end)
    }
}

//-----------------------------------------------------------------------------

/** Options for [`compile_with()`]. */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /** Cycles from issuing an FMAC instruction to its result being readable. */
    pub mac_latency: u32,
    /** Whether to reproduce the stale condition register of a block-ending branch. */
    pub integer_branch_delay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {mac_latency: LATENCY_MAC, integer_branch_delay: true}
    }
}

/** What [`compile_with()`] decided about a block. */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Summary {
    /** See [`Boundary`]. */
    pub fixed_end: u32,
    /** See [`Boundary`]. */
    pub needs_pc_adjust: bool,
    /** The number of instruction pairs compiled. */
    pub cycles: u32,
    /** The number of cycles added to [`Field::PipeTime`], including stalls. */
    pub relative_pipe_time: u32,
    pub integer_delay: Option<IntegerDelay>,
    /**
     * The lowest address that was read. It is below the block if the
     * instruction before a block-ending branch precedes the block.
     */
    pub first_address: u32,
}

impl Summary {
    /**
     * Returns `true` if any byte in `begin..end` was read while compiling,
     * including the delay slot if the block was extended.
     */
    pub fn overlaps(&self, begin: u32, end: u32) -> bool {
        begin <= self.fixed_end + 3 && self.first_address < end
    }
}

/**
 * Compile `block` into `backend` using the default [`Config`].
 *
 * On error, whatever `backend` received must be discarded.
 */
pub fn compile<M, A, B>(
    block: Block,
    memory: &M,
    arch: &A,
    backend: &mut B,
) -> Result<()> where
    M: MemoryMap,
    A: Architecture,
    B: Backend,
{
    compile_with(&Config::default(), block, memory, arch, backend).map(|_| ())
}

/**
 * Compile `block` into `backend`, and report what was decided.
 *
 * On error, whatever `backend` received must be discarded.
 */
pub fn compile_with<M, A, B>(
    config: &Config,
    block: Block,
    memory: &M,
    arch: &A,
    backend: &mut B,
) -> Result<Summary> where
    M: MemoryMap,
    A: Architecture,
    B: Backend,
{
    let _span = trace_span!("compile_block", begin = block.begin(), end = block.end()).entered();
    let boundary = Boundary::normalize(block, memory, arch);
    let (integer_delay, first_address) = if config.integer_branch_delay {
        let delay = IntegerDelay::detect(block, boundary.fixed_end, memory, arch)?;
        (delay, first_read(block, boundary.fixed_end))
    } else {
        (None, block.begin())
    };
    let mut c = Compiler {
        memory,
        arch,
        backend,
        hazards: HazardTracker::new(config.mac_latency),
        integer_delay,
    };
    let mut cycles = 0;
    for address in (block.begin()..=boundary.fixed_end).step_by(8) {
        c.pair(address)?;
        cycles += 1;
    }
    c.hazards.finish(c.backend);
    boundary.emit_pc_adjust(c.backend);
    Ok(Summary {
        fixed_end: boundary.fixed_end,
        needs_pc_adjust: boundary.needs_pc_adjust,
        cycles,
        relative_pipe_time: c.hazards.relative_pipe_time(),
        integer_delay,
        first_address,
    })
}

//-----------------------------------------------------------------------------

/** The state of the compiler while it works through one block. */
struct Compiler<'a, M: MemoryMap, A: Architecture, B: Backend> {
    memory: &'a M,
    arch: &'a A,
    backend: &'a mut B,
    hazards: HazardTracker,
    integer_delay: Option<IntegerDelay>,
}

impl<'a, M: MemoryMap, A: Architecture, B: Backend> Compiler<'a, M, A, B> {
    /** Compile the instruction pair at `address`. */
    fn pair(&mut self, address: u32) -> Result<()> {
        let address_lo = address;
        let address_hi = address + 4;
        let opcode_lo = self.memory.fetch_word(address_lo);
        let opcode_hi = self.memory.fetch_word(address_hi);
        let lo = self.arch.operand_effects(address_lo, opcode_lo);
        let hi = self.arch.operand_effects(address_hi, opcode_hi);
        check_registers(address_lo, &lo)?;
        check_registers(address_hi, &hi)?;
        trace!(address, relative_pipe_time = self.hazards.relative_pipe_time(), "pair");

        self.hazards.issue(address, &lo, &hi, self.backend)?;
        let saved_reg = self.save_before_upper(address, &lo, &hi)?;
        if let Some(delay) = self.integer_delay {
            delay.save(address, self.backend);
        }

        let schedule = Schedule {relative_pipe_time: self.hazards.relative_pipe_time()};
        self.arch.compile_instruction(address_hi, opcode_hi, schedule, self.backend);

        if let Some(reg) = saved_reg {
            self.backend.move_(Field::VfUpRes, Field::Vf(reg));
            self.backend.move_(Field::Vf(reg), Field::VfPreUp);
        }
        if let Some(delay) = self.integer_delay {
            delay.swap_in(address, self.backend);
        }

        self.arch.compile_instruction(address_lo, opcode_lo, schedule, self.backend);

        if let Some(delay) = self.integer_delay {
            delay.swap_out(address, self.backend);
        }
        if let Some(reg) = saved_reg {
            self.backend.move_(Field::Vf(reg), Field::VfUpRes);
        }

        self.hazards.retire(&lo, &hi);
        if !self.backend.is_stack_empty() {
            return Err(CompileError::UnbalancedStack {address});
        }
        Ok(())
    }

    /**
     * The lower instruction reads its VF operands before the upper
     * instruction writes its result. If they clash, remember the old value.
     * Returns the register that needs restoring after the upper instruction.
     */
    fn save_before_upper(&mut self, address: u32, lo: &Operands, hi: &Operands) -> Result<Option<u8>> {
        if hi.write_f == 0 { return Ok(None); }
        if hi.write_f == lo.write_f {
            return Err(CompileError::DoubleWrite {address, register: hi.write_f});
        }
        if lo.read_f0 == hi.write_f || lo.read_f1 == hi.write_f {
            self.backend.move_(Field::VfPreUp, Field::Vf(hi.write_f));
            return Ok(Some(hi.write_f));
        }
        Ok(None)
    }
}

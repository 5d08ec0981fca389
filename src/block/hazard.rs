use std::cmp::{max};

use crate::arch::{Operands};
use crate::code::{Field, Backend};
use crate::error::{CompileError, Result};
use crate::pipeline::{self, Q};
use crate::util::{ArrayMap, AsUsize};

/** The number of VF registers. */
pub const NUM_VF: usize = 32;

/** The number of VI registers. */
pub const NUM_VI: usize = 16;

/** A VF register number, usable as an [`ArrayMap`] key. */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct VfReg(pub u8);

impl AsUsize for VfReg {
    fn as_usize(self) -> usize { self.0 as usize }
}

/**
 * Fail unless every register named by `ops` exists. The block compiler
 * indexes tables with these numbers, so it checks them before anything else.
 */
pub fn check_registers(address: u32, ops: &Operands) -> Result<()> {
    for r in [ops.read_f0, ops.read_f1, ops.write_f] {
        if usize::from(r) >= NUM_VF {
            return Err(CompileError::RegisterOutOfRange {address, register: r});
        }
    }
    for r in [ops.read_i0, ops.read_i1, ops.write_i] {
        if usize::from(r) >= NUM_VI {
            return Err(CompileError::RegisterOutOfRange {address, register: r});
        }
    }
    Ok(())
}

/**
 * Tracks the timing of one block: how many cycles have elapsed, including
 * stalls, and when each VF register's latest value becomes readable. The Q
 * pipeline's timing lives in the emulated state; see [`pipeline`].
 */
#[derive(Debug, Clone)]
pub struct HazardTracker {
    mac_latency: u32,
    /** Cycles since the start of the block. */
    relative_pipe_time: u32,
    /** The `relative_pipe_time` when each VF register is readable, or 0. */
    write_f_time: ArrayMap<VfReg, u32>,
}

impl HazardTracker {
    pub fn new(mac_latency: u32) -> Self {
        HazardTracker {
            mac_latency,
            relative_pipe_time: 0,
            write_f_time: ArrayMap::new(NUM_VF),
        }
    }

    pub fn relative_pipe_time(&self) -> u32 { self.relative_pipe_time }

    /** The `relative_pipe_time` at which `reg` is readable, or 0. */
    pub fn ready_time(&self, reg: u8) -> u32 { self.write_f_time[VfReg(reg)] }

    /**
     * Called before the pair at `address` is compiled. Checks the rules about
     * which half may touch Q, then drains or checks the Q pipeline as needed.
     */
    pub fn issue(
        &self,
        address: u32,
        lo: &Operands,
        hi: &Operands,
        b: &mut impl Backend,
    ) -> Result<()> {
        if hi.sync_q { return Err(CompileError::UpperWritesQ {address: address + 4}); }
        if lo.read_q { return Err(CompileError::LowerReadsQ {address}); }
        if lo.sync_q {
            pipeline::flush(Q, b);
        }
        if hi.read_q {
            pipeline::check(Q, b, self.relative_pipe_time);
        }
        Ok(())
    }

    /**
     * Called after the pair has been compiled. Advances the clock by one
     * cycle, then stalls until every VF register the pair read was ready,
     * then records when the VF registers it wrote will be ready.
     */
    pub fn retire(&mut self, lo: &Operands, hi: &Operands) {
        self.relative_pipe_time += 1;
        for r in lo.reads_f().chain(hi.reads_f()) {
            self.relative_pipe_time = max(self.relative_pipe_time, self.write_f_time[VfReg(r)]);
        }
        for r in [lo.write_f, hi.write_f] {
            if r != 0 {
                self.write_f_time[VfReg(r)] = self.relative_pipe_time.saturating_add(self.mac_latency);
            }
        }
    }

    /** Add the block's duration to [`Field::PipeTime`]. */
    pub fn finish(&self, b: &mut impl Backend) {
        b.push(Field::PipeTime);
        b.push_const(self.relative_pipe_time);
        b.add();
        b.pull(Field::PipeTime);
    }
}

//-----------------------------------------------------------------------------

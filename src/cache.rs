use indexmap::{IndexMap};
use tracing::{debug, error};

use super::arch::{Architecture};
use super::block::{self, Block, Config, Summary};
use super::code::{Action, Recorder};
use super::error::{Result};
use super::memory::{MemoryMap};
use super::util::{CommaSeparated};

/** The compiled code for a [`Block`], and the addresses it depends on. */
#[derive(Debug)]
struct Entry {
    summary: Summary,
    code: Box<[Action]>,
}

/**
 * Compiled [`Block`]s, in the order they were compiled. When full, the
 * oldest block is forgotten to make room.
 */
#[derive(Debug)]
pub struct BlockCache {
    config: Config,
    capacity: usize,
    blocks: IndexMap<Block, Entry>,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_config(Config::default(), capacity)
    }

    pub fn with_config(config: Config, capacity: usize) -> Self {
        assert!(capacity > 0);
        BlockCache {config, capacity, blocks: IndexMap::with_capacity(capacity)}
    }

    pub fn len(&self) -> usize { self.blocks.len() }

    pub fn is_empty(&self) -> bool { self.blocks.is_empty() }

    pub fn contains(&self, block: Block) -> bool { self.blocks.contains_key(&block) }

    /** What was decided when `block` was compiled, if it is cached. */
    pub fn summary(&self, block: Block) -> Option<&Summary> {
        self.blocks.get(&block).map(|entry| &entry.summary)
    }

    /**
     * Returns the code for `block`, compiling it if necessary. A block that
     * fails to compile is not remembered, so asking again repeats the error.
     */
    pub fn get_or_compile<M: MemoryMap, A: Architecture>(
        &mut self,
        block: Block,
        memory: &M,
        arch: &A,
    ) -> Result<&[Action]> {
        if let Some(index) = self.blocks.get_index_of(&block) {
            return Ok(&*self.blocks[index].code);
        }
        let mut recorder = Recorder::new();
        let summary = match block::compile_with(&self.config, block, memory, arch, &mut recorder) {
            Ok(summary) => summary,
            Err(e) => {
                error!(%block, "{}", e);
                return Err(e);
            },
        };
        if self.blocks.len() >= self.capacity {
            if let Some((oldest, _)) = self.blocks.shift_remove_index(0) {
                debug!(%oldest, "evicting block");
            }
        }
        let entry = Entry {summary, code: recorder.finish()};
        let (index, _) = self.blocks.insert_full(block, entry);
        Ok(&*self.blocks[index].code)
    }

    /**
     * Forget every block whose code depends on any byte in `begin..end`.
     * That includes an appended delay slot, and the instruction before a
     * block-ending branch.
     */
    pub fn invalidate(&mut self, begin: u32, end: u32) {
        let stale: Vec<Block> = self.blocks.iter()
            .filter(|(_, entry)| entry.summary.overlaps(begin, end))
            .map(|(&block, _)| block)
            .collect();
        if stale.is_empty() { return; }
        debug!("invalidating {}", CommaSeparated(|| stale.iter()));
        for block in stale {
            self.blocks.shift_remove(&block);
        }
    }

    pub fn clear(&mut self) { self.blocks.clear(); }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::arch::{BranchType, Operands, Schedule};
    use crate::code::{Backend, Field};
    use crate::error::{CompileError};
    use crate::memory::{Microcode};

    /** An unconditional branch, which compiles to nothing. */
    const BRANCH: u32 = 0x2000_0000;

    /**
     * Every other lower instruction increments VI1. An all-ones word writes
     * VF3.
     */
    struct Counter;

    impl Architecture for Counter {
        fn classify_branch(&self, address: u32, opcode: u32) -> BranchType {
            if address & 0x4 == 0 && opcode == BRANCH { BranchType::Normal } else { BranchType::None }
        }

        fn operand_effects(&self, address: u32, opcode: u32) -> Operands {
            if opcode == !0 { return Operands {write_f: 3, ..Default::default()}; }
            if address & 0x4 != 0 || opcode == BRANCH { return Operands::default(); }
            Operands {read_i0: 1, write_i: 1, ..Default::default()}
        }

        fn effective_branch_target(&self, _: u32, _: u32) -> u32 { 0 }

        fn compile_instruction<B: Backend>(&self, address: u32, opcode: u32, _: Schedule, b: &mut B) {
            if address & 0x4 != 0 {
                if opcode == !0 { b.move_(Field::Vf(3), Field::Vf(1)); }
                return;
            }
            if opcode == !0 { b.move_(Field::Vf(3), Field::Vf(2)); return; }
            if opcode == BRANCH { return; }
            b.push(Field::Vi(1));
            b.push_const(1);
            b.add();
            b.pull(Field::Vi(1));
        }
    }

    fn block(begin: u32, end: u32) -> Block { Block::new(begin, end).expect("Bad block") }

    #[test]
    fn hit_and_miss() {
        let memory = Microcode::new(64);
        let mut cache = BlockCache::new(4);
        let n = cache.get_or_compile(block(0, 12), &memory, &Counter).expect("Compiles").len();
        assert_eq!(n, 2 * 4 + 4);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(block(0, 12)));
        cache.get_or_compile(block(0, 12), &memory, &Counter).expect("Compiles");
        assert_eq!(cache.len(), 1);
        cache.get_or_compile(block(16, 20), &memory, &Counter).expect("Compiles");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_oldest() {
        let memory = Microcode::new(64);
        let mut cache = BlockCache::new(2);
        for begin in [0, 8, 16] {
            cache.get_or_compile(block(begin, begin + 4), &memory, &Counter).expect("Compiles");
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(block(0, 4)));
        assert!(cache.contains(block(8, 12)));
        assert!(cache.contains(block(16, 20)));
    }

    #[test]
    fn errors_are_not_cached() {
        let mut memory = Microcode::new(64);
        memory.store_pair(8, !0, !0);
        let mut cache = BlockCache::new(4);
        let e = cache.get_or_compile(block(0, 12), &memory, &Counter).expect_err("Double write");
        assert_eq!(e, CompileError::DoubleWrite {address: 8, register: 3});
        assert!(cache.is_empty());
        memory.store_pair(8, 0, 0);
        cache.get_or_compile(block(0, 12), &memory, &Counter).expect("Compiles");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_overlapping() {
        let memory = Microcode::new(64);
        let mut cache = BlockCache::new(8);
        for (begin, end) in [(0, 12), (16, 20), (24, 44)] {
            cache.get_or_compile(block(begin, end), &memory, &Counter).expect("Compiles");
        }
        cache.invalidate(16, 24);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(block(16, 20)));
        cache.invalidate(44, 48);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(block(0, 12)));
        cache.invalidate(100, 200);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_delay_slot() {
        let mut memory = Microcode::new(64);
        memory.store_pair(8, BRANCH, 0);
        let mut cache = BlockCache::new(4);
        let n = cache.get_or_compile(block(0, 12), &memory, &Counter).expect("Compiles").len();
        // Two increments, the pipe time, and the jump fixup.
        assert_eq!(n, 4 + 4 + 4 + 6);
        assert_eq!(cache.summary(block(0, 12)).map(|s| s.fixed_end), Some(20));
        // Replace the delay slot.
        memory.store_pair(16, BRANCH, 0);
        cache.invalidate(16, 24);
        assert!(!cache.contains(block(0, 12)));
        let n = cache.get_or_compile(block(0, 12), &memory, &Counter).expect("Compiles").len();
        assert_eq!(n, 4 + 4 + 6);
        cache.invalidate(24, 32);
        assert!(cache.contains(block(0, 12)));
    }
}

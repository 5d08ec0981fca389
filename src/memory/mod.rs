//! Sources of microcode.

mod mmap;
pub use mmap::{MappedMicrocode};

/**
 * Supplies instruction words by byte address. Must not change while a block
 * is being compiled.
 */
pub trait MemoryMap {
    /** Returns the 32-bit word at `address`, which is a multiple of 4. */
    fn fetch_word(&self, address: u32) -> u32;
}

impl<M: MemoryMap + ?Sized> MemoryMap for &M {
    fn fetch_word(&self, address: u32) -> u32 {
        (**self).fetch_word(address)
    }
}

/** Returns the index of the word at `address` in a memory of `len` words. */
fn word_index(address: u32, len: usize) -> usize {
    assert_eq!(address & 0x3, 0);
    assert!(len.is_power_of_two());
    ((address >> 2) as usize) & (len - 1)
}

//-----------------------------------------------------------------------------

/**
 * A micro memory held in a `Vec`. Addresses wrap around at the end, as they
 * do on the coprocessor.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Microcode {
    words: Vec<u32>,
}

impl Microcode {
    /** Constructs a `Microcode` of `len` zero words. `len` must be a power of two. */
    pub fn new(len: usize) -> Self {
        assert!(len.is_power_of_two());
        Microcode {words: vec![0; len]}
    }

    /**
     * Constructs a `Microcode` containing `object` at address zero. The size
     * is rounded up to a power of two.
     */
    pub fn from_words(object: &[u32]) -> Self {
        let mut ret = Self::new(object.len().max(2).next_power_of_two());
        ret.words[..object.len()].copy_from_slice(object);
        ret
    }

    pub fn words(&self) -> &[u32] { &self.words }

    /** Set the word at `address` to `value`. */
    pub fn store_word(&mut self, address: u32, value: u32) {
        let index = word_index(address, self.words.len());
        self.words[index] = value;
    }

    /** Set the lower and upper words of the instruction pair at `address`. */
    pub fn store_pair(&mut self, address: u32, lower: u32, upper: u32) {
        assert_eq!(address & 0x7, 0);
        self.store_word(address, lower);
        self.store_word(address + 4, upper);
    }
}

impl MemoryMap for Microcode {
    fn fetch_word(&self, address: u32) -> u32 {
        self.words[word_index(address, self.words.len())]
    }
}

//-----------------------------------------------------------------------------

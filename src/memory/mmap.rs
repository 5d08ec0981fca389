use std::fs::{File};
use std::io;
use std::path::{Path};
use memmap::{Mmap};

use super::{MemoryMap, word_index};

/**
 * A micro memory image in a file, e.g. a dump of the coprocessor's micro
 * memory, mapped read-only. Words are little-endian. Addresses wrap around
 * at the end.
 */
pub struct MappedMicrocode {
    memory: Mmap,
}

impl MappedMicrocode {
    /**
     * Maps the file at `path`. Its length must be a power of two and a
     * multiple of 8 (a whole number of instruction pairs).
     *
     * The file must not be modified while it is mapped.
     */
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < 8 || !len.is_power_of_two() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("microcode image of {} bytes is not a power-of-two number of instruction pairs", len),
            ));
        }
        // SAFETY: The caller promises not to modify the file.
        let memory = unsafe { Mmap::map(&file)? };
        Ok(MappedMicrocode {memory})
    }

    /** The size of the image in bytes. */
    pub fn len(&self) -> usize { self.memory.len() }

    pub fn is_empty(&self) -> bool { self.memory.is_empty() }
}

impl MemoryMap for MappedMicrocode {
    fn fetch_word(&self, address: u32) -> u32 {
        let pos = word_index(address, self.memory.len() >> 2) << 2;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.memory[pos..pos + 4]);
        u32::from_le_bytes(bytes)
    }
}

impl std::fmt::Debug for MappedMicrocode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        f.debug_struct("MappedMicrocode")
            .field("len", &format!("{:#x}", self.len()))
            .finish()
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io::{Write};
    use std::path::{PathBuf};

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vurec-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).expect("Couldn't create");
        file.write_all(contents).expect("Couldn't write");
        path
    }

    #[test]
    fn fetch() {
        let mut contents = Vec::new();
        for word in [0x0000_02FFu32, 0x8000_0000, 0x1234_5678, 0xDEAD_BEEF] {
            contents.extend_from_slice(&word.to_le_bytes());
        }
        let path = temp_file("fetch", &contents);
        let m = MappedMicrocode::open(&path).expect("Couldn't map");
        assert_eq!(m.len(), 16);
        assert_eq!(m.fetch_word(0), 0x0000_02FF);
        assert_eq!(m.fetch_word(4), 0x8000_0000);
        assert_eq!(m.fetch_word(12), 0xDEAD_BEEF);
        assert_eq!(m.fetch_word(16 + 8), 0x1234_5678);
        drop(m);
        std::fs::remove_file(path).expect("Couldn't remove");
    }

    #[test]
    fn bad_length() {
        let path = temp_file("bad_length", &[0; 24]);
        let e = MappedMicrocode::open(&path).expect_err("Should not map");
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        std::fs::remove_file(path).expect("Couldn't remove");
    }
}

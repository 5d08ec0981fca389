use thiserror::{Error};

/**
 * Reasons why a block cannot be compiled.
 *
 * All of these are fatal for the block: either the microcode breaks an
 * architectural rule of the coprocessor, or this crate has a bug. Whatever
 * the [`Backend`] received before the error must be discarded.
 *
 * [`Backend`]: crate::code::Backend
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("block {begin:#x}..={end:#x} is not a whole number of instruction pairs")]
    Misaligned { begin: u32, end: u32 },

    #[error("block {begin:#x}..={end:#x} leaves no room for a delay slot below 4GB")]
    AddressOverflow { begin: u32, end: u32 },

    #[error("upper instruction at {address:#x} writes Q")]
    UpperWritesQ { address: u32 },

    #[error("lower instruction at {address:#x} reads Q")]
    LowerReadsQ { address: u32 },

    #[error("both halves of the pair at {address:#x} write VF{register}")]
    DoubleWrite { address: u32, register: u8 },

    #[error("instruction at {address:#x} names register {register}, which does not exist")]
    RegisterOutOfRange { address: u32, register: u8 },

    #[error("emission stack is not empty after the pair at {address:#x}")]
    UnbalancedStack { address: u32 },

    #[error("expected a conditional branch at {address:#x}, found {opcode:#010x}")]
    NotConditionalBranch { address: u32, opcode: u32 },
}

pub type Result<T> = std::result::Result<T, CompileError>;

/*!
 * Compiles basic blocks of microcode for a VLIW vector coprocessor into a
 * stack-discipline [`code::Action`] stream, reproducing the coprocessor's
 * pipeline timing and hazards.
 *
 * The instruction set itself is supplied by the caller as an
 * [`arch::Architecture`]. This crate decides where blocks end, when
 * pipelined results become visible, how long each block takes, and which
 * register values each instruction observes.
 */

pub mod util;

pub mod error;
pub use error::{CompileError};

pub mod code;

pub mod pipeline;

pub mod arch;

pub mod memory;

pub mod block;
pub use block::{Block, Config, Summary, compile, compile_with};

pub mod cache;
pub use cache::{BlockCache};

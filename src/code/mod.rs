/*!
 * The stack-discipline instruction set that the block compiler emits.
 *
 * A [`Backend`] receives a stream of pushes and pulls of named fields of the
 * emulated coprocessor's [`State`], plus a little arithmetic and structured
 * conditional regions. Values are either 32-bit words or 128-bit vectors of
 * four `f32`s; every [`Field`] has exactly one [`Width`].
 *
 * The block compiler never looks at the output. [`Recorder`] keeps it as a
 * list of [`Action`]s, and [`sim::run()`] interprets such a list, which is
 * how the tests check that the emitted code means what it should.
 */

use std::fmt::{self, Display, Formatter};

mod state;
pub use state::{State};

mod recorder;
pub use recorder::{Recorder};

pub mod sim;

/** The number of bytes transferred by a push or pull. */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum Width {
    Four = 4,
    Sixteen = 16,
}

/**
 * A named piece of emulated state. Backends that lower to raw memory can
 * use [`Field::offset()`] to address it within a [`State`].
 */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    /** A vector float register, `VF0` to `VF31`. */
    Vf(u8),
    /** An integer register, `VI0` to `VI15`. */
    Vi(u8),
    /** Scratch: the value of a VF register before an upper instruction wrote it. */
    VfPreUp,
    /** Scratch: the value an upper instruction wrote to a VF register. */
    VfUpRes,
    /** Scratch: an old snapshot of a VI register, for a delayed branch. */
    SavedIntReg,
    /** Scratch: the live value of a VI register while the snapshot is in use. */
    SavedIntRegTemp,
    /** The number of cycles executed before the current block. */
    PipeTime,
    /// The target of a pending delayed jump, or [`INVALID_PC`].
    ///
    /// [`INVALID_PC`]: crate::pipeline::INVALID_PC
    DelayedJumpAddr,
    I,
    /** The value of Q that instructions observe. */
    Q,
    /** The value of Q that is still in the pipeline. */
    QHeld,
    /** The value of `PipeTime` at which `QHeld` becomes visible. */
    QTarget,
}

impl Field {
    pub fn width(self) -> Width {
        match self {
            Field::Vf(_) | Field::VfPreUp | Field::VfUpRes => Width::Sixteen,
            _ => Width::Four,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Field::Vf(r) => write!(f, "vf{}", r),
            Field::Vi(r) => write!(f, "vi{}", r),
            Field::VfPreUp => f.write_str("vf_pre_up"),
            Field::VfUpRes => f.write_str("vf_up_res"),
            Field::SavedIntReg => f.write_str("saved_int_reg"),
            Field::SavedIntRegTemp => f.write_str("saved_int_reg_temp"),
            Field::PipeTime => f.write_str("pipe_time"),
            Field::DelayedJumpAddr => f.write_str("delayed_jump_addr"),
            Field::I => f.write_str("i"),
            Field::Q => f.write_str("q"),
            Field::QHeld => f.write_str("q_held"),
            Field::QTarget => f.write_str("q_target"),
        }
    }
}

//-----------------------------------------------------------------------------

/**
 * Unsigned comparisons used by [`Backend::begin_if()`]. `a` is the deeper
 * of the two operands and `b` the one on top of the stack.
 */
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Ge,
}

impl Condition {
    /** Returns whether `a <self> b`. */
    pub fn test(self, a: u32, b: u32) -> bool {
        match self {
            Condition::Eq => a == b,
            Condition::Ne => a != b,
            Condition::Lt => a < b,
            Condition::Ge => a >= b,
        }
    }
}

/** One call to a [`Backend`] method. */
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Action {
    Push(Field),
    Pull(Field),
    PushVec(Field),
    PullVec(Field),
    Constant(u32),
    Add,
    AddVec,
    If(Condition),
    EndIf,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Action::Push(x) => write!(f, "push {} @{:#x}", x, x.offset()),
            Action::Pull(x) => write!(f, "pull {} @{:#x}", x, x.offset()),
            Action::PushVec(x) => write!(f, "push.v {} @{:#x}", x, x.offset()),
            Action::PullVec(x) => write!(f, "pull.v {} @{:#x}", x, x.offset()),
            Action::Constant(c) => write!(f, "const {:#x}", c),
            Action::Add => f.write_str("add"),
            Action::AddVec => f.write_str("add.v"),
            Action::If(c) => write!(f, "if {:?}", c),
            Action::EndIf => f.write_str("endif"),
        }
    }
}

//-----------------------------------------------------------------------------

/**
 * Receives the code generated for a block.
 *
 * The stack must be empty at the end of every instruction pair, and every
 * conditional region must leave the stack as deep as it found it.
 */
pub trait Backend {
    /** Push the 32-bit `field`. */
    fn push(&mut self, field: Field);

    /** Pop a word into the 32-bit `field`. */
    fn pull(&mut self, field: Field);

    /** Push the 128-bit `field`. */
    fn push_vec(&mut self, field: Field);

    /** Pop a vector into the 128-bit `field`. */
    fn pull_vec(&mut self, field: Field);

    /** Push the word `value`. */
    fn push_const(&mut self, value: u32);

    /** Pop two words and push their wrapping sum. */
    fn add(&mut self);

    /** Pop two vectors and push their lane-wise sum. */
    fn add_vec(&mut self);

    /**
     * Pop `b` then `a`, and run the code up to the matching `end_if()` only
     * if `a <condition> b`.
     */
    fn begin_if(&mut self, condition: Condition);

    /** Close the innermost region opened by `begin_if()`. */
    fn end_if(&mut self);

    /** Returns `true` if nothing has been pushed and not pulled. */
    fn is_stack_empty(&self) -> bool;

    /** Copy `src` into `dest`, which must have the same [`Width`]. */
    fn move_(&mut self, dest: Field, src: Field) {
        assert_eq!(dest.width(), src.width());
        match src.width() {
            Width::Four => {
                self.push(src);
                self.pull(dest);
            },
            Width::Sixteen => {
                self.push_vec(src);
                self.pull_vec(dest);
            },
        }
    }
}

//-----------------------------------------------------------------------------

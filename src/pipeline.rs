//! Latency-pipelined result registers, and the timing constants of the
//! coprocessor.
//!
//! A pipelined register such as Q has a visible value and a held value. An
//! instruction that produces a result [`queue()`]s it as the held value with
//! a target time. Code that consumes the register first [`check()`]s whether
//! the target time has been reached, and if so promotes the held value. A
//! [`flush()`] promotes unconditionally.

use super::code::{Field, Condition, Backend};

/** Cycles from issuing an FMAC instruction to its result being readable. */
pub const LATENCY_MAC: u32 = 4;
pub const LATENCY_DIV: u32 = 7;

/** The value of [`Field::DelayedJumpAddr`] when no jump is pending. */
pub const INVALID_PC: u32 = 0x0000_0001;

/** The three [`Field`]s that make up a pipelined register. */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PipeInfo {
    pub value: Field,
    pub held_value: Field,
    pub target: Field,
}

pub const Q: PipeInfo = PipeInfo {
    value: Field::Q,
    held_value: Field::QHeld,
    target: Field::QTarget,
};

/** Make the held value visible, whether or not it is due. */
pub fn flush(pipe: PipeInfo, b: &mut impl Backend) {
    b.move_(pipe.value, pipe.held_value);
}

/**
 * Make the held value visible if it is due at the time the current
 * instruction issues, i.e. `relative_time` cycles after `PipeTime`.
 */
pub fn check(pipe: PipeInfo, b: &mut impl Backend, relative_time: u32) {
    b.push(Field::PipeTime);
    b.push_const(relative_time);
    b.add();
    b.push(pipe.target);
    b.begin_if(Condition::Ge);
    {
        b.move_(pipe.value, pipe.held_value);
    }
    b.end_if();
}

/**
 * Pop a word and hold it in `pipe` until `latency` cycles after the current
 * instruction issues.
 */
pub fn queue(pipe: PipeInfo, b: &mut impl Backend, relative_time: u32, latency: u32) {
    b.pull(pipe.held_value);
    b.push(Field::PipeTime);
    b.push_const(relative_time.wrapping_add(latency));
    b.add();
    b.pull(pipe.target);
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use super::super::code::{Recorder, State, sim};

    fn run(state: &mut State, callback: impl FnOnce(&mut Recorder)) {
        let mut r = Recorder::new();
        callback(&mut r);
        assert!(r.is_stack_empty());
        sim::run(&r.finish(), state);
    }

    #[test]
    fn check_waits_for_latency() {
        let mut state = State::new();
        state.pipe_time = 100;
        state.vi[1] = 42;
        run(&mut state, |b| {
            b.push(Field::Vi(1));
            queue(Q, b, 2, LATENCY_DIV);
        });
        assert_eq!((state.q, state.q_held, state.q_target), (0, 42, 109));
        for (time, expected) in [(6, 0), (8, 0), (9, 42)] {
            let mut state = state.clone();
            run(&mut state, |b| check(Q, b, time));
            assert_eq!(state.q, expected, "relative time {}", time);
        }
    }

    #[test]
    fn flush_is_unconditional() {
        let mut state = State::new();
        state.q_held = 5;
        state.q_target = 1000;
        run(&mut state, |b| flush(Q, b));
        assert_eq!(state.q, 5);
    }
}

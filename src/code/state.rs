use std::mem::{size_of};
use memoffset::{offset_of};

use super::{Field};

/**
 * The emulated coprocessor state that compiled code reads and writes.
 *
 * Compiled code addresses it only through [`Field`]s. The layout is fixed so
 * that a backend which lowers to machine code can use [`Field::offset()`].
 */
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct State {
    pub vf: [[f32; 4]; 32],
    pub vi: [u32; 16],
    pub vf_pre_up: [f32; 4],
    pub vf_up_res: [f32; 4],
    pub saved_int_reg: u32,
    pub saved_int_reg_temp: u32,
    pub pipe_time: u32,
    pub delayed_jump_addr: u32,
    pub i: u32,
    pub q: u32,
    pub q_held: u32,
    pub q_target: u32,
}

/** Returns the offset of `field` in [`State`]. */
macro_rules! state_field {
    ($field: ident) => {
        offset_of!(State, $field)
    }
}

impl Field {
    /** The byte offset of this field in a [`State`]. */
    pub fn offset(self) -> usize {
        match self {
            Field::Vf(r) => state_field!(vf) + usize::from(r) * size_of::<[f32; 4]>(),
            Field::Vi(r) => state_field!(vi) + usize::from(r) * size_of::<u32>(),
            Field::VfPreUp => state_field!(vf_pre_up),
            Field::VfUpRes => state_field!(vf_up_res),
            Field::SavedIntReg => state_field!(saved_int_reg),
            Field::SavedIntRegTemp => state_field!(saved_int_reg_temp),
            Field::PipeTime => state_field!(pipe_time),
            Field::DelayedJumpAddr => state_field!(delayed_jump_addr),
            Field::I => state_field!(i),
            Field::Q => state_field!(q),
            Field::QHeld => state_field!(q_held),
            Field::QTarget => state_field!(q_target),
        }
    }
}

impl State {
    /** Constructs a `State` in which no delayed jump is pending. */
    pub fn new() -> Self {
        State {delayed_jump_addr: crate::pipeline::INVALID_PC, ..Default::default()}
    }

    /** Read the 32-bit `field`. */
    pub fn word(&self, field: Field) -> u32 {
        match field {
            Field::Vi(r) => self.vi[usize::from(r)],
            Field::SavedIntReg => self.saved_int_reg,
            Field::SavedIntRegTemp => self.saved_int_reg_temp,
            Field::PipeTime => self.pipe_time,
            Field::DelayedJumpAddr => self.delayed_jump_addr,
            Field::I => self.i,
            Field::Q => self.q,
            Field::QHeld => self.q_held,
            Field::QTarget => self.q_target,
            _ => panic!("{} is not a word", field),
        }
    }

    /** Read or write the 32-bit `field`. */
    pub fn word_mut(&mut self, field: Field) -> &mut u32 {
        match field {
            Field::Vi(r) => &mut self.vi[usize::from(r)],
            Field::SavedIntReg => &mut self.saved_int_reg,
            Field::SavedIntRegTemp => &mut self.saved_int_reg_temp,
            Field::PipeTime => &mut self.pipe_time,
            Field::DelayedJumpAddr => &mut self.delayed_jump_addr,
            Field::I => &mut self.i,
            Field::Q => &mut self.q,
            Field::QHeld => &mut self.q_held,
            Field::QTarget => &mut self.q_target,
            _ => panic!("{} is not a word", field),
        }
    }

    /** Read the 128-bit `field`. */
    pub fn vector(&self, field: Field) -> [f32; 4] {
        match field {
            Field::Vf(r) => self.vf[usize::from(r)],
            Field::VfPreUp => self.vf_pre_up,
            Field::VfUpRes => self.vf_up_res,
            _ => panic!("{} is not a vector", field),
        }
    }

    /** Read or write the 128-bit `field`. */
    pub fn vector_mut(&mut self, field: Field) -> &mut [f32; 4] {
        match field {
            Field::Vf(r) => &mut self.vf[usize::from(r)],
            Field::VfPreUp => &mut self.vf_pre_up,
            Field::VfUpRes => &mut self.vf_up_res,
            _ => panic!("{} is not a vector", field),
        }
    }
}

//-----------------------------------------------------------------------------

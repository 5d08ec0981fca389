//! A reference interpreter for recorded [`Action`]s.
//!
//! This is deliberately naive. It exists so that tests can compare the
//! effect of compiled code with a direct evaluation of what the coprocessor
//! would do.

use super::{Action, State};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Word(u32),
    Vector([f32; 4]),
}

impl Value {
    fn word(self) -> u32 {
        match self {
            Value::Word(w) => w,
            Value::Vector(_) => panic!("Expected a word"),
        }
    }

    fn vector(self) -> [f32; 4] {
        match self {
            Value::Vector(v) => v,
            Value::Word(_) => panic!("Expected a vector"),
        }
    }
}

/** Returns the index of the `EndIf` matching the `If` at `actions[start]`. */
fn matching_end_if(actions: &[Action], start: usize) -> usize {
    let mut depth = 0;
    for (i, action) in actions.iter().enumerate().skip(start) {
        match action {
            Action::If(_) => { depth += 1; },
            Action::EndIf => {
                depth -= 1;
                if depth == 0 { return i; }
            },
            _ => {},
        }
    }
    panic!("Unclosed conditional region");
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().expect("Stack underflow")
}

/**
 * Execute `actions`, reading and writing `state`. Panics if the stack is not
 * empty at the end.
 */
pub fn run(actions: &[Action], state: &mut State) {
    let mut stack: Vec<Value> = Vec::new();
    let mut pc = 0;
    while pc < actions.len() {
        match actions[pc] {
            Action::Push(field) => { stack.push(Value::Word(state.word(field))); },
            Action::Pull(field) => { *state.word_mut(field) = pop(&mut stack).word(); },
            Action::PushVec(field) => { stack.push(Value::Vector(state.vector(field))); },
            Action::PullVec(field) => { *state.vector_mut(field) = pop(&mut stack).vector(); },
            Action::Constant(c) => { stack.push(Value::Word(c)); },
            Action::Add => {
                let b = pop(&mut stack).word();
                let a = pop(&mut stack).word();
                stack.push(Value::Word(a.wrapping_add(b)));
            },
            Action::AddVec => {
                let b = pop(&mut stack).vector();
                let mut a = pop(&mut stack).vector();
                for (x, y) in a.iter_mut().zip(b) { *x += y; }
                stack.push(Value::Vector(a));
            },
            Action::If(condition) => {
                let b = pop(&mut stack).word();
                let a = pop(&mut stack).word();
                if !condition.test(a, b) {
                    pc = matching_end_if(actions, pc);
                }
            },
            Action::EndIf => {},
        }
        pc += 1;
    }
    assert!(stack.is_empty(), "Stack is not empty");
}

//-----------------------------------------------------------------------------

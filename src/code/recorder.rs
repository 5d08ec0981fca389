use std::fmt::{self, Display, Formatter};

use super::{Width, Field, Condition, Action, Backend};

/**
 * A [`Backend`] that remembers what it was asked to do.
 *
 * `Recorder` checks the stack discipline as it goes, and panics on misuse:
 * popping from an empty stack, mixing words and vectors, or leaving a
 * conditional region at a different depth from where it started. These are
 * bugs in whoever is generating code, not properties of the microcode.
 */
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    actions: Vec<Action>,
    /** The [`Width`] of every value currently on the stack. */
    stack: Vec<Width>,
    /** The stack depth at each open `begin_if()`. */
    regions: Vec<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {actions: Vec::new(), stack: Vec::new(), regions: Vec::new()}
    }

    /** All the [`Action`]s recorded so far. */
    pub fn actions(&self) -> &[Action] { &self.actions }

    /** Returns all the [`Action`]s that this `Recorder` has accumulated. */
    pub fn finish(self) -> Box<[Action]> {
        assert!(self.regions.is_empty(), "Unclosed conditional region");
        self.actions.into()
    }

    fn pop(&mut self, width: Width) {
        let top = self.stack.pop().expect("Stack underflow");
        assert_eq!(top, width);
    }

    fn record(&mut self, action: Action) {
        self.actions.push(action);
    }
}

impl Backend for Recorder {
    fn push(&mut self, field: Field) {
        assert_eq!(field.width(), Width::Four);
        self.stack.push(Width::Four);
        self.record(Action::Push(field));
    }

    fn pull(&mut self, field: Field) {
        assert_eq!(field.width(), Width::Four);
        self.pop(Width::Four);
        self.record(Action::Pull(field));
    }

    fn push_vec(&mut self, field: Field) {
        assert_eq!(field.width(), Width::Sixteen);
        self.stack.push(Width::Sixteen);
        self.record(Action::PushVec(field));
    }

    fn pull_vec(&mut self, field: Field) {
        assert_eq!(field.width(), Width::Sixteen);
        self.pop(Width::Sixteen);
        self.record(Action::PullVec(field));
    }

    fn push_const(&mut self, value: u32) {
        self.stack.push(Width::Four);
        self.record(Action::Constant(value));
    }

    fn add(&mut self) {
        self.pop(Width::Four);
        self.pop(Width::Four);
        self.stack.push(Width::Four);
        self.record(Action::Add);
    }

    fn add_vec(&mut self) {
        self.pop(Width::Sixteen);
        self.pop(Width::Sixteen);
        self.stack.push(Width::Sixteen);
        self.record(Action::AddVec);
    }

    fn begin_if(&mut self, condition: Condition) {
        self.pop(Width::Four);
        self.pop(Width::Four);
        self.regions.push(self.stack.len());
        self.record(Action::If(condition));
    }

    fn end_if(&mut self) {
        let depth = self.regions.pop().expect("end_if() without begin_if()");
        assert_eq!(depth, self.stack.len(), "Conditional region is unbalanced");
        self.record(Action::EndIf);
    }

    fn is_stack_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Display for Recorder {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = 0;
        for action in &self.actions {
            if *action == Action::EndIf { indent -= 1; }
            writeln!(f, "{:width$}{}", "", action, width = 4 * indent)?;
            if let Action::If(_) = action { indent += 1; }
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn balance() {
        let mut r = Recorder::new();
        assert!(r.is_stack_empty());
        r.push(Field::PipeTime);
        r.push_const(3);
        r.add();
        assert!(!r.is_stack_empty());
        r.pull(Field::PipeTime);
        assert!(r.is_stack_empty());
        assert_eq!(r.finish().len(), 4);
    }

    #[test]
    fn listing() {
        let mut r = Recorder::new();
        r.push_const(1);
        r.push(Field::DelayedJumpAddr);
        r.begin_if(Condition::Eq);
        r.push_const(0x40);
        r.pull(Field::DelayedJumpAddr);
        r.end_if();
        let listing = r.to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "if Eq");
        assert_eq!(lines[3], "    const 0x40");
        assert_eq!(lines[5], "endif");
    }

    #[test]
    #[should_panic]
    fn mixed_widths() {
        let mut r = Recorder::new();
        r.push_vec(Field::Vf(1));
        r.pull(Field::Vi(1));
    }

    #[test]
    #[should_panic]
    fn underflow() {
        let mut r = Recorder::new();
        r.add();
    }

    #[test]
    #[should_panic]
    fn unbalanced_region() {
        let mut r = Recorder::new();
        r.push_const(0);
        r.push_const(0);
        r.begin_if(Condition::Eq);
        r.push_const(5);
        r.end_if();
    }
}

use std::fmt::{self, Display, Formatter};

/// Helper for printing comma-separated items.
pub struct CommaSeparated<I: IntoIterator, F: Fn() -> I>(pub F) where I::Item: Display;

impl<I: IntoIterator, F: Fn() -> I> Display for CommaSeparated<I, F> where I::Item: Display {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut sep = "";
        for item in self.0() {
            f.write_str(sep)?;
            item.fmt(f)?;
            sep = ", ";
        }
        Ok(())
    }
}

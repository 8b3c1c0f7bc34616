use std::fmt;

use crate::id_set::UnitId;
use crate::module::Module;
use crate::sack::Sack;

/// Why a candidate set has no consistent solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problem {
    messages: Vec<String>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return write!(f, "no solution found");
        }
        write!(f, "{}", self.messages.join("; "))
    }
}

impl std::error::Error for Problem {}

/// The external constraint solver, consumed as an interface only.
///
/// Input is the selected candidate set; output is one consistent solution
/// as an ordered id sequence. Nothing beyond "one valid solution" is
/// guaranteed about the composition or order of the output, and the call
/// is treated as an opaque synchronous operation.
pub trait DependencySolver {
    fn solve(
        &self,
        sack: &Sack<Module>,
        candidates: &[UnitId],
    ) -> Result<Vec<UnitId>, Problem>;
}

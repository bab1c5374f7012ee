use std::fmt;

use crate::network::Wire;
use crate::sim::Value;

/// Single stuck-at fault: a wire forced to a fixed value in the faulty machine
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fault {
    /// Wire where the fault is located
    pub wire: Wire,
    /// Fault value
    pub value: bool,
}

impl Fault {
    /// Create a new fault
    pub fn new(wire: Wire, value: bool) -> Fault {
        Fault { wire, value }
    }

    /// Value that must appear on the faulty wire for the fault to be excited
    pub fn activation(&self) -> Value {
        Value::activation(self.value)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stuck at {}", self.wire, i32::from(self.value))
    }
}

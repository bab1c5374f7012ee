use std::fmt;

/// Handle to a wire of a [`Network`](crate::Network)
///
/// Wires are identified by an index into the flat tables of the network; the name is
/// kept by the network itself. A handle is only meaningful for the network that created it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Wire {
    a: u32,
}

impl Wire {
    /// Create a wire handle from its index
    pub fn from_index(i: usize) -> Wire {
        assert!(i <= u32::MAX as usize);
        Wire { a: i as u32 }
    }

    /// Obtain the index of the wire in the tables of its network
    pub fn index(&self) -> usize {
        self.a as usize
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.a)
    }
}

impl fmt::Debug for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

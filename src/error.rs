//! Error types

use thiserror::Error;

use crate::network::GateType;

/// The result of a fallible operation of this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned when a netlist does not describe a valid circuit
///
/// These are detected when the network is built, before any search is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// A wire is read but nothing drives it
    #[error("wire {0} is used but never driven")]
    UndefinedWire(String),

    /// Two gates, fanouts, flip-flops or primary inputs drive the same wire
    #[error("wire {0} has more than one driver")]
    MultipleDrivers(String),

    /// A fault is declared on a wire that does not exist
    #[error("fault declared on unknown wire {0}")]
    UnknownFaultWire(String),

    /// A gate has a number of inputs its type does not allow
    #[error("gate {output} of type {kind} cannot have {arity} inputs")]
    BadArity {
        /// Output wire of the gate
        output: String,
        /// Type of the gate
        kind: GateType,
        /// Number of inputs given
        arity: usize,
    },

    /// A fanout without any branch
    #[error("fanout of {0} has no branch")]
    EmptyFanout(String),

    /// A cycle that does not go through a flip-flop
    #[error("combinational loop through wire {0}")]
    CombinationalLoop(String),

    /// Unrolling requires at least one time-frame
    #[error("cannot unroll a circuit into {0} time-frames")]
    InvalidFrameCount(usize),
}

/// Error returned when reading a netlist from text failed
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line could not be understood
    #[error("line {line}: {message}")]
    Syntax {
        /// Line number, starting at 1
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A gate keyword that is not supported
    #[error("line {line}: unknown gate type {name}")]
    UnknownGate {
        /// Line number, starting at 1
        line: usize,
        /// The unknown keyword
        name: String,
    },

    /// The file extension does not match any supported format
    #[error("unsupported file extension {0}")]
    UnknownExtension(String),

    /// Just forwarding an [`std::io::Error`]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned when test pattern generation could not run
///
/// An untestable fault is not an error: it is one of the normal outcomes of the search.
#[derive(Debug, Error)]
pub enum AtpgError {
    /// The combinational search was called on a network with flip-flops
    #[error("network has {0} flip-flops; unroll it or expose them first")]
    Sequential(usize),

    /// A vector returned by the search does not detect its fault. This should never happen.
    #[error("internal error: generated vector does not detect {0}")]
    InvalidTest(String),

    /// Just forwarding a [`NetworkError`]
    #[error("{0}")]
    Network(#[from] NetworkError),
}

/// Any error of this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Just forwarding a [`NetworkError`]
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// Just forwarding a [`ParseError`]
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Just forwarding an [`AtpgError`]
    #[error("{0}")]
    Atpg(#[from] AtpgError),

    /// An IO error while writing results
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

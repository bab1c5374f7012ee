//! Representation and handling of gate-level circuits
//!
//! A circuit is first described by name as a [`Netlist`], then checked and turned into a
//! [`Network`] that uses compact [`Wire`] handles and precomputed driver and consumer lookups.

mod gates;
pub mod generators;
pub mod netlist;
mod network;
pub mod stats;
pub mod unroll;
mod wire;

pub use gates::{Fanout, FlipFlop, Gate, GateType};
pub use netlist::Netlist;
pub use network::{Consumer, Driver, Network, Node};
pub use wire::Wire;

//! Test pattern generation for gate-level netlists
//!
//! This crate generates tests for single [stuck-at faults](https://en.wikipedia.org/wiki/Stuck-at_fault)
//! in gate-level circuits, using the [D-algorithm](https://en.wikipedia.org/wiki/D-algorithm).
//! Sequential circuits are handled by unrolling them over several clock cycles, from an unknown
//! initial state, or by assuming that their flip-flops are on a scan chain.
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! datpg help
//! # Show statistics on a netlist
//! datpg show mydesign.txt
//! # Generate tests for the faults declared in the netlist, or all faults
//! datpg atpg mydesign.txt -o mydesign.test
//! # Write the circuit unrolled over 3 clock cycles
//! datpg unroll mydesign.txt -n 3 -o unrolled.txt
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! [`Network`] is an immutable graph of gates, fanout points and flip-flops connected by named
//! wires, each referred to by a [`Wire`] index. It is built and checked once from a [`Netlist`],
//! the name-based description produced by the readers in [`io`].
//!
//! All values during test generation are five-valued: 0, 1, X, and the fault effects D (1 in the
//! good circuit, 0 in the faulty one) and !D. The values of a search live in an
//! [`atpg::CircuitState`], separate from the network.
//!
//! For example, here is how to find a test for a stuck-at-0 fault on the output of an And gate:
//! ```
//! use datpg::atpg::{search, Outcome, SearchConfig};
//! use datpg::{GateType, Netlist, Network, Value};
//!
//! let mut netlist = Netlist::new();
//! netlist.add_gate(GateType::And, "c", &["a", "b"]);
//! netlist.derive_ports();
//! let network = Network::from_netlist(&netlist).unwrap();
//!
//! let fault = network.fault("c", false).unwrap();
//! let Ok(Outcome::Detected(pattern)) = search(&network, fault, &SearchConfig::default()) else {
//!     panic!("fault should be detected");
//! };
//! assert_eq!(pattern.values(), &[Value::One, Value::One]);
//! ```

#![warn(missing_docs)]

pub mod atpg;
pub mod error;
pub mod io;
pub mod network;
pub mod sim;

pub use error::{Error, Result};
pub use network::{stats, GateType, Netlist, Network, Wire};
pub use sim::{Fault, Value};

//! Compute gate statistics
//!
//! ```
//! # use datpg::network::generators::testcases;
//! # let network = testcases::and_gate(2);
//! use datpg::network::stats::stats;
//! let stats = stats(&network);
//!
//! // Check that there is no flip-flop
//! assert_eq!(stats.nb_dff, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::GateType;
use crate::Network;

/// Number of inputs, outputs and gates in a network
#[derive(Clone, Debug, Default)]
pub struct NetworkStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of wires
    pub nb_wires: usize,
    /// Number of gates of each type, in the order of [`GateType::ALL`]
    pub nb_by_type: [usize; 8],
    /// Arity of multi-input gates
    pub arity: Vec<usize>,
    /// Number of fanout points
    pub nb_fanouts: usize,
    /// Number of fanout branches
    pub nb_branches: usize,
    /// Number of flip-flops
    pub nb_dff: usize,
    /// Number of flip-flops with preset or reset
    pub nb_dffr: usize,
    /// Number of faults declared with the circuit
    pub nb_faults: usize,
}

impl NetworkStats {
    /// Total number of gates, including flip-flops but not fanouts
    pub fn nb_gates(&self) -> usize {
        self.nb_by_type.iter().sum::<usize>() + self.nb_dff
    }

    /// Number of gates of a given type
    pub fn nb(&self, kind: GateType) -> usize {
        match GateType::ALL.iter().position(|t| *t == kind) {
            Some(i) => self.nb_by_type[i],
            None => 0,
        }
    }

    /// Record a new multi-input gate
    fn add_arity(&mut self, sz: usize) {
        while self.arity.len() <= sz {
            self.arity.push(0);
        }
        self.arity[sz] += 1;
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Wires: {}", self.nb_wires)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        for (kind, nb) in GateType::ALL.iter().zip(self.nb_by_type.iter()) {
            if *nb != 0 {
                writeln!(f, "      {}: {}", kind, nb)?;
            }
        }
        if self.arity.iter().any(|nb| *nb != 0) {
            writeln!(f, "  Arity:")?;
            for (i, nb) in self.arity.iter().enumerate() {
                if *nb != 0 {
                    writeln!(f, "      {}: {}", i, nb)?;
                }
            }
        }
        if self.nb_fanouts != 0 {
            writeln!(f, "  Fanouts: {} ({} branches)", self.nb_fanouts, self.nb_branches)?;
        }
        if self.nb_dff != 0 {
            writeln!(f, "  Dff: {}", self.nb_dff)?;
            if self.nb_dffr != 0 {
                writeln!(f, "      preset/reset: {}", self.nb_dffr)?;
            }
        }
        if self.nb_faults != 0 {
            writeln!(f, "  Faults: {}", self.nb_faults)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the network
pub fn stats(a: &Network) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_inputs: a.nb_inputs(),
        nb_outputs: a.nb_outputs(),
        nb_wires: a.nb_wires(),
        nb_fanouts: a.nb_fanouts(),
        nb_dff: a.nb_flip_flops(),
        nb_faults: a.faults().len(),
        ..Default::default()
    };
    for g in a.gates() {
        if let Some(i) = GateType::ALL.iter().position(|t| *t == g.kind()) {
            ret.nb_by_type[i] += 1;
        }
        if !g.kind().is_unary() {
            ret.add_arity(g.inputs().len());
        }
    }
    ret.nb_branches = a.fanouts().iter().map(|f| f.branches().len()).sum();
    ret.nb_dffr = a
        .flip_flops()
        .iter()
        .filter(|ff| ff.preset().is_some() || ff.reset().is_some())
        .count();
    ret
}

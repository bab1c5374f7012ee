//! Name-based description of a circuit, as produced by the readers
//!
//! A [`Netlist`] is a plain record: it is not checked until it is turned into a
//! [`Network`](crate::Network).

use fxhash::FxHashSet;

use crate::network::GateType;

/// Description of a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDesc {
    /// Logic function
    pub kind: GateType,
    /// Output wire
    pub output: String,
    /// Input wires, in order
    pub inputs: Vec<String>,
}

/// Description of a fanout point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutDesc {
    /// Input wire
    pub stem: String,
    /// Output wires
    pub branches: Vec<String>,
}

/// Description of a flip-flop
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlipFlopDesc {
    /// Data input
    pub d: String,
    /// Clock input; .bench files do not name it
    pub clock: Option<String>,
    /// State output
    pub q: String,
    /// Complementary output
    pub q_bar: Option<String>,
    /// Preset input
    pub preset: Option<String>,
    /// Reset input
    pub reset: Option<String>,
}

/// Description of a single stuck-at fault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaultDesc {
    /// Faulty wire
    pub wire: String,
    /// Stuck value
    pub value: bool,
}

/// Name-based description of a circuit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Netlist {
    /// Gates, in order
    pub gates: Vec<GateDesc>,
    /// Fanout points, in order
    pub fanouts: Vec<FanoutDesc>,
    /// Flip-flops, in order
    pub flip_flops: Vec<FlipFlopDesc>,
    /// Declared faults, in order
    pub faults: Vec<FaultDesc>,
    /// Primary inputs
    pub inputs: Vec<String>,
    /// Primary outputs
    pub outputs: Vec<String>,
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

impl Netlist {
    /// Create an empty netlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gate
    pub fn add_gate(&mut self, kind: GateType, output: &str, inputs: &[&str]) -> &mut Self {
        self.gates.push(GateDesc {
            kind,
            output: output.to_string(),
            inputs: names(inputs),
        });
        self
    }

    /// Add a fanout point
    pub fn add_fanout(&mut self, stem: &str, branches: &[&str]) -> &mut Self {
        self.fanouts.push(FanoutDesc {
            stem: stem.to_string(),
            branches: names(branches),
        });
        self
    }

    /// Add a flip-flop
    pub fn add_flip_flop(&mut self, ff: FlipFlopDesc) -> &mut Self {
        self.flip_flops.push(ff);
        self
    }

    /// Add a stuck-at fault
    pub fn add_fault(&mut self, wire: &str, value: bool) -> &mut Self {
        self.faults.push(FaultDesc {
            wire: wire.to_string(),
            value,
        });
        self
    }

    /// Wires read by a gate, fanout or flip-flop
    fn sinks(&self) -> FxHashSet<&str> {
        let mut ret = FxHashSet::default();
        for g in &self.gates {
            ret.extend(g.inputs.iter().map(String::as_str));
        }
        for f in &self.fanouts {
            ret.insert(f.stem.as_str());
        }
        for ff in &self.flip_flops {
            ret.insert(ff.d.as_str());
            ret.extend(ff.clock.as_deref());
            ret.extend(ff.preset.as_deref());
            ret.extend(ff.reset.as_deref());
        }
        ret
    }

    /// Wires driven by a gate, fanout or flip-flop
    fn sources(&self) -> FxHashSet<&str> {
        let mut ret = FxHashSet::default();
        for g in &self.gates {
            ret.insert(g.output.as_str());
        }
        for f in &self.fanouts {
            ret.extend(f.branches.iter().map(String::as_str));
        }
        for ff in &self.flip_flops {
            ret.insert(ff.q.as_str());
            ret.extend(ff.q_bar.as_deref());
        }
        ret
    }

    /// Compute the primary inputs and outputs from the structure
    ///
    /// A primary input is read but never driven; a primary output is driven but never read.
    /// Both lists are sorted by name, replacing any previous value.
    pub fn derive_ports(&mut self) -> &mut Self {
        let sinks = self.sinks();
        let sources = self.sources();
        let mut inputs: Vec<String> = sinks
            .difference(&sources)
            .map(|s| s.to_string())
            .collect();
        let mut outputs: Vec<String> = sources
            .difference(&sinks)
            .map(|s| s.to_string())
            .collect();
        inputs.sort();
        outputs.sort();
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    /// Names of the clock wires
    pub fn clocks(&self) -> FxHashSet<&str> {
        self.flip_flops
            .iter()
            .filter_map(|ff| ff.clock.as_deref())
            .collect()
    }
}

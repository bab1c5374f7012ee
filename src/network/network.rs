use std::fmt;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::error::NetworkError;
use crate::network::netlist::{FanoutDesc, FaultDesc, FlipFlopDesc, GateDesc, Netlist};
use crate::network::{Fanout, FlipFlop, Gate, Wire};
use crate::sim::Fault;

/// What drives a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Primary input
    Input,
    /// Output of the gate at this index
    Gate(usize),
    /// Branch of the fanout at this index
    Fanout(usize),
    /// Output of the flip-flop at this index
    FlipFlop(usize),
    /// Not driven; only possible for unused wires
    None,
}

/// Something that reads a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumer {
    /// Input of the gate at this index
    Gate(usize),
    /// Stem of the fanout at this index
    Fanout(usize),
    /// Input of the flip-flop at this index
    FlipFlop(usize),
}

/// Combinational node of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// Gate at this index
    Gate(usize),
    /// Fanout at this index
    Fanout(usize),
}

/// Gate-level circuit graph, used as the main representation for test generation
///
/// All wires, gates, fanouts and flip-flops live in flat tables and refer to each other by index.
/// The lookups from a wire to its driver and to its consumers are computed once when the network is
/// built. A network is never modified after construction: per-run values live in a separate
/// [`CircuitState`](crate::atpg::CircuitState).
#[derive(Debug, Clone, Default)]
pub struct Network {
    names: Vec<String>,
    index: FxHashMap<String, Wire>,
    gates: Vec<Gate>,
    fanouts: Vec<Fanout>,
    flip_flops: Vec<FlipFlop>,
    faults: Vec<Fault>,
    inputs: Vec<Wire>,
    outputs: Vec<Wire>,
    initial_state: Vec<Wire>,
    drivers: Vec<Driver>,
    consumers: Vec<Vec<Consumer>>,
    topo_order: Vec<Node>,
}

impl Network {
    /// Build a network from its description, checking that it is well-formed
    ///
    /// Every wire that is read must be driven exactly once (by a gate, a fanout branch, a
    /// flip-flop output or as a primary input), gates must have a valid number of inputs,
    /// faults must target existing wires, and any cycle must go through a flip-flop.
    pub fn from_netlist(netlist: &Netlist) -> Result<Network, NetworkError> {
        let mut ret = Network::default();

        // Name all wires, in order of appearance
        for n in &netlist.inputs {
            ret.intern(n);
        }
        for g in &netlist.gates {
            ret.intern(&g.output);
            for i in &g.inputs {
                ret.intern(i);
            }
        }
        for f in &netlist.fanouts {
            ret.intern(&f.stem);
            for b in &f.branches {
                ret.intern(b);
            }
        }
        for ff in &netlist.flip_flops {
            for n in [Some(&ff.d), ff.clock.as_ref(), Some(&ff.q)]
                .into_iter()
                .chain([ff.q_bar.as_ref(), ff.preset.as_ref(), ff.reset.as_ref()])
                .flatten()
            {
                ret.intern(n);
            }
        }
        for n in &netlist.outputs {
            ret.intern(n);
        }

        // Structure
        for g in &netlist.gates {
            if !g.kind.accepts_arity(g.inputs.len()) {
                return Err(NetworkError::BadArity {
                    output: g.output.clone(),
                    kind: g.kind,
                    arity: g.inputs.len(),
                });
            }
            ret.gates.push(Gate {
                kind: g.kind,
                output: ret.index[&g.output],
                inputs: g.inputs.iter().map(|n| ret.index[n]).collect(),
            });
        }
        for f in &netlist.fanouts {
            if f.branches.is_empty() {
                return Err(NetworkError::EmptyFanout(f.stem.clone()));
            }
            ret.fanouts.push(Fanout {
                stem: ret.index[&f.stem],
                branches: f.branches.iter().map(|n| ret.index[n]).collect(),
            });
        }
        for ff in &netlist.flip_flops {
            let w = |n: &Option<String>| n.as_ref().map(|n| ret.index[n]);
            ret.flip_flops.push(FlipFlop {
                d: ret.index[&ff.d],
                clock: w(&ff.clock),
                q: ret.index[&ff.q],
                q_bar: w(&ff.q_bar),
                preset: w(&ff.preset),
                reset: w(&ff.reset),
            });
        }
        ret.inputs = netlist.inputs.iter().map(|n| ret.index[n]).collect();
        ret.outputs = netlist.outputs.iter().map(|n| ret.index[n]).collect();
        for f in &netlist.faults {
            match ret.index.get(&f.wire) {
                Some(w) => ret.faults.push(Fault {
                    wire: *w,
                    value: f.value,
                }),
                None => return Err(NetworkError::UnknownFaultWire(f.wire.clone())),
            }
        }

        ret.compute_drivers()?;
        ret.compute_consumers();
        ret.check_driven()?;
        ret.compute_topo_order()?;
        Ok(ret)
    }

    /// Obtain the handle for a name, creating the wire if needed
    fn intern(&mut self, name: &str) -> Wire {
        if let Some(w) = self.index.get(name) {
            return *w;
        }
        let w = Wire::from_index(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), w);
        w
    }

    fn set_driver(&mut self, w: Wire, d: Driver) -> Result<(), NetworkError> {
        if self.drivers[w.index()] != Driver::None {
            return Err(NetworkError::MultipleDrivers(
                self.wire_name(w).to_string(),
            ));
        }
        self.drivers[w.index()] = d;
        Ok(())
    }

    fn compute_drivers(&mut self) -> Result<(), NetworkError> {
        self.drivers = vec![Driver::None; self.nb_wires()];
        for w in self.inputs.clone() {
            self.set_driver(w, Driver::Input)?;
        }
        for i in 0..self.nb_gates() {
            self.set_driver(self.gates[i].output, Driver::Gate(i))?;
        }
        for i in 0..self.nb_fanouts() {
            for b in self.fanouts[i].branches.clone().iter() {
                self.set_driver(*b, Driver::Fanout(i))?;
            }
        }
        for i in 0..self.nb_flip_flops() {
            let outputs: Vec<Wire> = self.flip_flops[i].outputs().collect();
            for w in outputs {
                self.set_driver(w, Driver::FlipFlop(i))?;
            }
        }
        Ok(())
    }

    fn compute_consumers(&mut self) {
        let mut consumers = vec![Vec::new(); self.nb_wires()];
        for (i, g) in self.gates.iter().enumerate() {
            for w in g.inputs() {
                consumers[w.index()].push(Consumer::Gate(i));
            }
        }
        for (i, f) in self.fanouts.iter().enumerate() {
            consumers[f.stem.index()].push(Consumer::Fanout(i));
        }
        for (i, ff) in self.flip_flops.iter().enumerate() {
            for w in ff.dependencies() {
                consumers[w.index()].push(Consumer::FlipFlop(i));
            }
        }
        self.consumers = consumers;
    }

    /// Check that every wire that is read or exported has a driver
    fn check_driven(&self) -> Result<(), NetworkError> {
        for w in self.wires() {
            let used = !self.consumers[w.index()].is_empty() || self.outputs.contains(&w);
            if used && self.drivers[w.index()] == Driver::None {
                return Err(NetworkError::UndefinedWire(self.wire_name(w).to_string()));
            }
        }
        Ok(())
    }

    /// Sort gates and fanouts so that each node comes after the nodes driving its inputs
    fn compute_topo_order(&mut self) -> Result<(), NetworkError> {
        let nodes: Vec<Node> = (0..self.nb_gates())
            .map(Node::Gate)
            .chain((0..self.nb_fanouts()).map(Node::Fanout))
            .collect();
        let nb_gates = self.nb_gates();
        let slot = |n: Node| match n {
            Node::Gate(i) => i,
            Node::Fanout(i) => nb_gates + i,
        };
        let is_comb_driven =
            |w: Wire| matches!(self.drivers[w.index()], Driver::Gate(_) | Driver::Fanout(_));

        // Number of input slots still waiting for their driver
        let mut pending: Vec<usize> = nodes
            .iter()
            .map(|n| {
                self.node_inputs(*n)
                    .iter()
                    .filter(|w| is_comb_driven(**w))
                    .count()
            })
            .collect();
        let mut ready: Vec<Node> = nodes
            .iter()
            .rev()
            .filter(|n| pending[slot(**n)] == 0)
            .copied()
            .collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(n) = ready.pop() {
            order.push(n);
            for w in self.node_outputs(n) {
                for c in &self.consumers[w.index()] {
                    let next = match c {
                        Consumer::Gate(i) => Node::Gate(*i),
                        Consumer::Fanout(i) => Node::Fanout(*i),
                        Consumer::FlipFlop(_) => continue,
                    };
                    pending[slot(next)] -= 1;
                    if pending[slot(next)] == 0 {
                        ready.push(next);
                    }
                }
            }
        }
        if order.len() != nodes.len() {
            let stuck = nodes
                .iter()
                .find(|n| pending[slot(**n)] != 0)
                .map(|n| self.node_outputs(*n)[0]);
            let name = stuck.map(|w| self.wire_name(w).to_string()).unwrap_or_default();
            return Err(NetworkError::CombinationalLoop(name));
        }
        self.topo_order = order;
        Ok(())
    }

    /// Wires read by a combinational node
    pub fn node_inputs(&self, n: Node) -> &[Wire] {
        match n {
            Node::Gate(i) => self.gates[i].inputs(),
            Node::Fanout(i) => std::slice::from_ref(&self.fanouts[i].stem),
        }
    }

    /// Wires driven by a combinational node
    pub fn node_outputs(&self, n: Node) -> &[Wire] {
        match n {
            Node::Gate(i) => std::slice::from_ref(&self.gates[i].output),
            Node::Fanout(i) => self.fanouts[i].branches(),
        }
    }

    /// Mark wires as initial-state pseudo-inputs; used by time-frame unrolling
    pub(crate) fn set_initial_state(&mut self, wires: Vec<Wire>) {
        assert!(wires.iter().all(|w| self.inputs.contains(w)));
        self.initial_state = wires;
    }

    /// Return the number of wires
    pub fn nb_wires(&self) -> usize {
        self.names.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Return the number of fanout points
    pub fn nb_fanouts(&self) -> usize {
        self.fanouts.len()
    }

    /// Return the number of flip-flops
    pub fn nb_flip_flops(&self) -> usize {
        self.flip_flops.len()
    }

    /// Iterate over all wires
    pub fn wires(&self) -> impl Iterator<Item = Wire> {
        (0..self.nb_wires()).map(Wire::from_index)
    }

    /// Name of a wire
    pub fn wire_name(&self, w: Wire) -> &str {
        &self.names[w.index()]
    }

    /// Find a wire by name
    pub fn find_wire(&self, name: &str) -> Option<Wire> {
        self.index.get(name).copied()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Wire {
        self.inputs[i]
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Wire {
        self.outputs[i]
    }

    /// Primary inputs
    pub fn inputs(&self) -> &[Wire] {
        &self.inputs
    }

    /// Primary outputs
    pub fn outputs(&self) -> &[Wire] {
        &self.outputs
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.gates[i]
    }

    /// All gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get the fanout at index i
    pub fn fanout(&self, i: usize) -> &Fanout {
        &self.fanouts[i]
    }

    /// All fanouts
    pub fn fanouts(&self) -> &[Fanout] {
        &self.fanouts
    }

    /// Get the flip-flop at index i
    pub fn flip_flop(&self, i: usize) -> &FlipFlop {
        &self.flip_flops[i]
    }

    /// All flip-flops
    pub fn flip_flops(&self) -> &[FlipFlop] {
        &self.flip_flops
    }

    /// Faults declared with the netlist
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Primary inputs that stand for the state of the flip-flops before the oldest time-frame
    ///
    /// Only unrolled networks have some.
    pub fn initial_state(&self) -> &[Wire] {
        &self.initial_state
    }

    /// What drives a wire
    pub fn driver(&self, w: Wire) -> Driver {
        self.drivers[w.index()]
    }

    /// Everything that reads a wire; a gate reading it twice appears twice
    pub fn consumers(&self, w: Wire) -> &[Consumer] {
        &self.consumers[w.index()]
    }

    /// Gates and fanouts in topological order
    pub fn topo_order(&self) -> &[Node] {
        &self.topo_order
    }

    /// Return whether the network is purely combinatorial
    pub fn is_comb(&self) -> bool {
        self.flip_flops.is_empty()
    }

    /// Create a fault by wire name
    pub fn fault(&self, wire: &str, value: bool) -> Option<Fault> {
        self.find_wire(wire).map(|wire| Fault { wire, value })
    }

    /// Get all possible stuck-at faults: both values on every wire
    pub fn all_faults(&self) -> Vec<Fault> {
        let mut ret = Vec::new();
        for wire in self.wires() {
            for value in [false, true] {
                ret.push(Fault { wire, value });
            }
        }
        ret
    }

    /// Human-readable description of a fault
    pub fn fault_name(&self, fault: &Fault) -> String {
        format!(
            "{} stuck-at-{}",
            self.wire_name(fault.wire),
            i32::from(fault.value)
        )
    }

    /// Name-based description of the network
    pub fn to_netlist(&self) -> Netlist {
        let name = |w: &Wire| self.wire_name(*w).to_string();
        let opt_name = |w: &Option<Wire>| w.as_ref().map(name);
        Netlist {
            gates: self
                .gates
                .iter()
                .map(|g| GateDesc {
                    kind: g.kind,
                    output: name(&g.output),
                    inputs: g.inputs.iter().map(name).collect(),
                })
                .collect(),
            fanouts: self
                .fanouts
                .iter()
                .map(|f| FanoutDesc {
                    stem: name(&f.stem),
                    branches: f.branches.iter().map(name).collect(),
                })
                .collect(),
            flip_flops: self
                .flip_flops
                .iter()
                .map(|ff| FlipFlopDesc {
                    d: name(&ff.d),
                    clock: opt_name(&ff.clock),
                    q: name(&ff.q),
                    q_bar: opt_name(&ff.q_bar),
                    preset: opt_name(&ff.preset),
                    reset: opt_name(&ff.reset),
                })
                .collect(),
            faults: self
                .faults
                .iter()
                .map(|f| FaultDesc {
                    wire: name(&f.wire),
                    value: f.value,
                })
                .collect(),
            inputs: self.inputs.iter().map(name).collect(),
            outputs: self.outputs.iter().map(name).collect(),
        }
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert_eq!(self.names.len(), self.index.len());
        assert_eq!(self.drivers.len(), self.nb_wires());
        assert_eq!(self.consumers.len(), self.nb_wires());
        assert_eq!(self.topo_order.len(), self.nb_gates() + self.nb_fanouts());
        for (i, g) in self.gates.iter().enumerate() {
            assert_eq!(self.driver(g.output), Driver::Gate(i));
            assert!(g.kind.accepts_arity(g.inputs.len()));
        }
        for (i, f) in self.fanouts.iter().enumerate() {
            for b in f.branches() {
                assert_eq!(self.driver(*b), Driver::Fanout(i));
            }
        }
        for w in &self.inputs {
            assert_eq!(self.driver(*w), Driver::Input);
        }
        for f in &self.faults {
            assert!(f.wire.index() < self.nb_wires());
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |v: &[Wire]| v.iter().map(|w| self.wire_name(*w)).join(", ");
        writeln!(f, "Network with {} wires:", self.nb_wires())?;
        writeln!(f, "  inputs: {}", names(&self.inputs))?;
        writeln!(f, "  outputs: {}", names(&self.outputs))?;
        for g in &self.gates {
            writeln!(
                f,
                "  {} = {}({})",
                self.wire_name(g.output),
                g.kind,
                names(&g.inputs)
            )?;
        }
        for fo in &self.fanouts {
            writeln!(
                f,
                "  {} -> {}",
                self.wire_name(fo.stem),
                names(&fo.branches)
            )?;
        }
        for ff in &self.flip_flops {
            writeln!(f, "  {} = DFF({})", self.wire_name(ff.q), self.wire_name(ff.d))?;
        }
        Ok(())
    }
}

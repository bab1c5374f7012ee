use crate::network::Node;
use crate::sim::algebra::evaluate;
use crate::sim::Fault;
use crate::Network;

/// Three-valued simulation of a single machine, good or faulty, based directly on the network
///
/// Flip-flops start in an unknown state. Their preset and reset inputs are not simulated.
pub struct SimpleSimulator<'a> {
    network: &'a Network,
    fault: Option<Fault>,
    values: Vec<Option<bool>>,
    state: Vec<Option<bool>>,
}

impl<'a> SimpleSimulator<'a> {
    /// Simulator for the good machine, or for the faulty machine if a fault is given
    pub fn new(network: &'a Network, fault: Option<Fault>) -> SimpleSimulator<'a> {
        let mut ret = SimpleSimulator {
            network,
            fault,
            values: Vec::new(),
            state: Vec::new(),
        };
        ret.reset();
        ret
    }

    /// Run over multiple timesteps; return the output values at each timestep
    pub fn run(&mut self, input_values: &[Vec<Option<bool>>]) -> Vec<Vec<Option<bool>>> {
        self.reset();
        let mut ret = Vec::new();
        for (i, v) in input_values.iter().enumerate() {
            if i != 0 {
                self.run_dff();
            }
            self.copy_inputs(v);
            self.copy_state();
            self.run_comb();
            ret.push(self.get_output_values());
        }
        ret
    }

    /// State the flip-flops would take at the next clock edge
    pub fn next_state(&self) -> Vec<Option<bool>> {
        self.network
            .flip_flops()
            .iter()
            .map(|ff| self.values[ff.d().index()])
            .collect()
    }

    fn reset(&mut self) {
        self.values = vec![None; self.network.nb_wires()];
        self.state = vec![None; self.network.nb_flip_flops()];
        if let Some(f) = self.fault {
            self.values[f.wire.index()] = Some(f.value);
        }
    }

    fn set(&mut self, i: usize, v: Option<bool>) {
        self.values[i] = match self.fault {
            Some(f) if f.wire.index() == i => Some(f.value),
            _ => v,
        };
    }

    fn copy_inputs(&mut self, inputs: &[Option<bool>]) {
        let network = self.network;
        assert_eq!(inputs.len(), network.nb_inputs());
        for (w, v) in network.inputs().iter().zip(inputs.iter()) {
            self.set(w.index(), *v);
        }
    }

    fn copy_state(&mut self) {
        let network = self.network;
        for (ff, s) in network.flip_flops().iter().zip(self.state.clone()) {
            self.set(ff.q().index(), s);
            if let Some(q_bar) = ff.q_bar() {
                self.set(q_bar.index(), s.map(|b| !b));
            }
        }
    }

    fn run_dff(&mut self) {
        self.state = self.next_state();
    }

    fn run_comb(&mut self) {
        let network = self.network;
        for n in network.topo_order() {
            match *n {
                Node::Gate(i) => {
                    let g = network.gate(i);
                    let v = evaluate(g.kind(), g.inputs().iter().map(|w| self.values[w.index()]));
                    self.set(g.output().index(), v);
                }
                Node::Fanout(i) => {
                    let f = network.fanout(i);
                    let v = self.values[f.stem().index()];
                    for b in f.branches() {
                        self.set(b.index(), v);
                    }
                }
            }
        }
    }

    fn get_output_values(&self) -> Vec<Option<bool>> {
        self.network
            .outputs()
            .iter()
            .map(|w| self.values[w.index()])
            .collect()
    }
}

//! Implication of wire values to a fixed point, and maintenance of the D- and J-frontiers

use thiserror::Error;

use crate::atpg::CircuitState;
use crate::network::{Consumer, Driver, Wire};
use crate::sim::{simulate, Fault, Value};
use crate::Network;

/// Values that cannot all hold at once; the search must backtrack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("contradiction on wire {wire}")]
pub struct Contradiction {
    /// Wire where the conflict was found
    pub wire: Wire,
}

/// Propagation of known values forward and backward through the network
struct Implication<'a> {
    network: &'a Network,
    fault: Option<Fault>,
    state: &'a mut CircuitState,
    queue: Vec<Wire>,
}

impl<'a> Implication<'a> {
    fn assign(&mut self, w: Wire, v: Value) -> Result<(), Contradiction> {
        if !v.is_known() || self.state.get(w) == v {
            return Ok(());
        }
        if self.state.assign(w, v) {
            self.queue.push(w);
            Ok(())
        } else {
            Err(Contradiction { wire: w })
        }
    }

    /// Assign the value produced by the driver of a wire; the fault is injected at its site
    fn drive(&mut self, w: Wire, produced: Value) -> Result<(), Contradiction> {
        let v = match self.fault {
            Some(f) if f.wire == w => produced.inject(f.value),
            _ => produced,
        };
        self.assign(w, v)
    }

    /// Value the driver of a wire must produce; only the good machine is seen through the fault
    fn required(&self, w: Wire) -> Value {
        required(&*self.state, self.fault, w)
    }

    fn run(&mut self) -> Result<(), Contradiction> {
        let network = self.network;
        while let Some(w) = self.queue.pop() {
            match network.driver(w) {
                Driver::Gate(i) => self.process_gate(i)?,
                Driver::Fanout(i) => self.process_fanout(i)?,
                _ => (),
            }
            for c in network.consumers(w) {
                match *c {
                    Consumer::Gate(i) => self.process_gate(i)?,
                    Consumer::Fanout(i) => self.process_fanout(i)?,
                    Consumer::FlipFlop(_) => (),
                }
            }
        }
        Ok(())
    }

    fn process_gate(&mut self, i: usize) -> Result<(), Contradiction> {
        let network = self.network;
        let g = network.gate(i);
        let inputs: Vec<Value> = g.inputs().iter().map(|w| self.state.get(*w)).collect();
        self.drive(g.output(), simulate(g.kind(), &inputs))?;
        if let Some(r) = self.required(g.output()).as_bool() {
            self.justify(i, &inputs, r)?;
        }
        Ok(())
    }

    /// Unique backward implication from a plain output value
    fn justify(&mut self, i: usize, inputs: &[Value], r: bool) -> Result<(), Contradiction> {
        use crate::network::GateType::*;
        let network = self.network;
        let g = network.gate(i);
        let unknown: Vec<usize> = (0..inputs.len()).filter(|k| !inputs[*k].is_known()).collect();
        if unknown.is_empty() {
            return Ok(());
        }
        let forced = match g.kind() {
            Not => Some(!r),
            Buff => Some(r),
            And if r => Some(true),
            Nand if !r => Some(true),
            Or if !r => Some(false),
            Nor if r => Some(false),
            _ => None,
        };
        if let Some(v) = forced {
            for k in unknown {
                self.assign(g.inputs()[k], Value::from_bool(v))?;
            }
            return Ok(());
        }
        if unknown.len() == 1 {
            // The only value of the last unknown input compatible with the output
            let k = unknown[0];
            let mut trial = inputs.to_vec();
            let mut fits = Vec::new();
            for v in [Value::Zero, Value::One, Value::D, Value::DBar] {
                trial[k] = v;
                if simulate(g.kind(), &trial) == Value::from_bool(r) {
                    fits.push(v);
                }
            }
            match fits.as_slice() {
                [] => return Err(Contradiction { wire: g.output() }),
                [v] if !v.is_fault_effect() => self.assign(g.inputs()[k], *v)?,
                _ => (),
            }
        }
        Ok(())
    }

    fn process_fanout(&mut self, i: usize) -> Result<(), Contradiction> {
        let network = self.network;
        let f = network.fanout(i);
        let stem = self.state.get(f.stem());
        if stem.is_known() {
            for b in f.branches() {
                self.drive(*b, stem)?;
            }
        }
        for b in f.branches() {
            let r = self.required(*b);
            if r.is_known() {
                self.assign(f.stem(), r)?;
            }
        }
        Ok(())
    }
}

fn required(state: &CircuitState, fault: Option<Fault>, w: Wire) -> Value {
    let v = state.get(w);
    match fault {
        Some(f) if f.wire == w => Value::from_machines(v.good(), v.good()),
        _ => v,
    }
}

/// Whether a gate with unknown output could carry the fault effect further
fn is_d_frontier(network: &Network, state: &CircuitState, i: usize) -> bool {
    let g = network.gate(i);
    if state.get(g.output()).is_known() {
        return false;
    }
    let controlling = g.kind().controlling_value();
    let mut has_effect = false;
    for w in g.inputs() {
        let v = state.get(*w);
        has_effect |= v.is_fault_effect();
        if controlling.is_some() && v.as_bool() == controlling {
            return false;
        }
    }
    has_effect
}

/// Imply values to a fixed point and recompute both frontiers
///
/// The fault, if any, is injected at its wire: the value its driver produces is seen with the
/// faulty machine stuck. On success, `d_frontier` holds the gates whose output is unknown but
/// could carry the fault effect, and `j_frontier` the gates whose known output is not yet implied
/// by their inputs, both as gate indices in increasing order. On failure, the state is left as it
/// was when the contradiction was found.
pub fn imply_and_check(
    state: &mut CircuitState,
    network: &Network,
    fault: Option<Fault>,
    d_frontier: &mut Vec<usize>,
    j_frontier: &mut Vec<usize>,
) -> Result<(), Contradiction> {
    let queue = state.assigned().to_vec();
    let mut imp = Implication {
        network,
        fault,
        state: &mut *state,
        queue,
    };
    imp.run()?;

    d_frontier.clear();
    j_frontier.clear();
    for (i, g) in network.gates().iter().enumerate() {
        if is_d_frontier(network, state, i) {
            d_frontier.push(i);
        }
        let r = required(state, fault, g.output());
        if !r.is_known() {
            continue;
        }
        let inputs: Vec<Value> = g.inputs().iter().map(|w| state.get(*w)).collect();
        let implied = simulate(g.kind(), &inputs);
        if implied.is_known() && implied != r {
            return Err(Contradiction { wire: g.output() });
        }
        if !implied.is_known() {
            j_frontier.push(i);
        }
    }
    Ok(())
}

/// Returns whether the frontiers are consistent with the state
///
/// No gate of the D-frontier has a known output; every gate of the J-frontier has a known
/// output and at least one unknown input.
pub fn frontiers_are_sound(
    state: &CircuitState,
    network: &Network,
    d_frontier: &[usize],
    j_frontier: &[usize],
) -> bool {
    let d_ok = d_frontier
        .iter()
        .all(|i| !state.get(network.gate(*i).output()).is_known());
    let j_ok = j_frontier.iter().all(|i| {
        let g = network.gate(*i);
        state.get(g.output()).is_known() && g.inputs().iter().any(|w| !state.get(*w).is_known())
    });
    d_ok && j_ok
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{frontiers_are_sound, imply_and_check};
    use crate::atpg::CircuitState;
    use crate::network::generators::{random, testcases};
    use crate::network::{GateType, Netlist};
    use crate::sim::Value;
    use crate::Network;

    fn imply(
        state: &mut CircuitState,
        network: &Network,
        fault: Option<crate::sim::Fault>,
    ) -> Option<(Vec<usize>, Vec<usize>)> {
        let mut d = Vec::new();
        let mut j = Vec::new();
        imply_and_check(state, network, fault, &mut d, &mut j).ok()?;
        Some((d, j))
    }

    #[test]
    fn test_forward() {
        let net = testcases::inverter_chain(3);
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("n0").unwrap(), Value::One);
        imply(&mut state, &net, None).unwrap();
        assert_eq!(state.get(net.find_wire("n3").unwrap()), Value::Zero);
    }

    #[test]
    fn test_backward() {
        let net = testcases::and_gate(3);
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("z").unwrap(), Value::One);
        let (d, j) = imply(&mut state, &net, None).unwrap();
        assert!(d.is_empty());
        assert!(j.is_empty());
        for i in 0..3 {
            assert_eq!(state.get(net.input(i)), Value::One);
        }
    }

    #[test]
    fn test_j_frontier() {
        let net = testcases::and_gate(2);
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("z").unwrap(), Value::Zero);
        let (d, j) = imply(&mut state, &net, None).unwrap();
        assert!(d.is_empty());
        assert_eq!(j, vec![0]);
        // The last unknown input is forced
        state.assign(net.input(0), Value::One);
        let (_, j) = imply(&mut state, &net, None).unwrap();
        assert!(j.is_empty());
        assert_eq!(state.get(net.input(1)), Value::Zero);
    }

    #[test]
    fn test_contradiction() {
        let net = testcases::and_gate(2);
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("z").unwrap(), Value::One);
        state.assign(net.input(0), Value::Zero);
        assert!(imply(&mut state, &net, None).is_none());
    }

    #[test]
    fn test_fanout() {
        let net = testcases::fanout_and();
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("s2").unwrap(), Value::One);
        imply(&mut state, &net, None).unwrap();
        assert_eq!(state.get(net.find_wire("s").unwrap()), Value::One);
        assert_eq!(state.get(net.find_wire("s1").unwrap()), Value::One);
    }

    #[test]
    fn test_d_frontier() {
        let net = testcases::and_gate(2);
        let fault = net.fault("i0", false).unwrap();
        let mut state = CircuitState::new(&net);
        state.assign(fault.wire, fault.activation());
        let (d, j) = imply(&mut state, &net, Some(fault)).unwrap();
        assert_eq!(d, vec![0]);
        assert!(j.is_empty());
        state.assign(net.input(1), Value::One);
        let (d, _) = imply(&mut state, &net, Some(fault)).unwrap();
        assert!(d.is_empty());
        assert_eq!(state.get(net.find_wire("z").unwrap()), Value::D);
    }

    #[test]
    fn test_fault_site() {
        // The gate driving the faulty wire must produce the good value
        let net = testcases::and_gate(2);
        let fault = net.fault("z", false).unwrap();
        let mut state = CircuitState::new(&net);
        state.assign(fault.wire, fault.activation());
        imply(&mut state, &net, Some(fault)).unwrap();
        assert_eq!(state.get(net.input(0)), Value::One);
        assert_eq!(state.get(net.input(1)), Value::One);

        let mut state = CircuitState::new(&net);
        state.assign(fault.wire, fault.activation());
        state.assign(net.input(1), Value::Zero);
        assert!(imply(&mut state, &net, Some(fault)).is_none());
    }

    #[test]
    fn test_fault_on_branch() {
        let net = testcases::fanout_and();
        let fault = net.fault("s1", true).unwrap();
        let mut state = CircuitState::new(&net);
        state.assign(fault.wire, fault.activation());
        imply(&mut state, &net, Some(fault)).unwrap();
        // The stem carries the good value, the other branch is not affected
        assert_eq!(state.get(net.find_wire("s").unwrap()), Value::Zero);
        assert_eq!(state.get(net.find_wire("s2").unwrap()), Value::Zero);
        assert_eq!(state.get(net.find_wire("s1").unwrap()), Value::DBar);
    }

    #[test]
    fn test_xor_single_unknown() {
        let mut netlist = Netlist::new();
        netlist.add_gate(GateType::Xor, "z", &["a", "b"]);
        netlist.derive_ports();
        let net = Network::from_netlist(&netlist).unwrap();
        let mut state = CircuitState::new(&net);
        state.assign(net.find_wire("z").unwrap(), Value::One);
        state.assign(net.find_wire("a").unwrap(), Value::One);
        imply(&mut state, &net, None).unwrap();
        assert_eq!(state.get(net.find_wire("b").unwrap()), Value::Zero);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// After a successful implication, frontiers agree with the state
        #[test]
        fn frontiers_agree_with_state(
            seed in 0u64..1000,
            assignments in prop::collection::vec((0usize..64, any::<bool>()), 1..6),
            fault_index in 0usize..128,
        ) {
            let net = random::comb(4, 10, seed);
            let faults = net.all_faults();
            let fault = faults[fault_index % faults.len()];
            let mut state = CircuitState::new(&net);
            state.assign(fault.wire, fault.activation());
            for (i, b) in assignments {
                let w = net.input(i % net.nb_inputs());
                if w != fault.wire {
                    state.assign(w, Value::from_bool(b));
                }
            }
            if let Some((d, j)) = imply(&mut state, &net, Some(fault)) {
                prop_assert!(frontiers_are_sound(&state, &net, &d, &j));
                state.check();
            }
        }
    }
}

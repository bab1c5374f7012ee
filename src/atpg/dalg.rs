//! The D-algorithm: backtracking search for a test pattern detecting a single stuck-at fault

use std::fmt;

use itertools::Itertools;
use tracing::trace;

use crate::atpg::implication::imply_and_check;
use crate::atpg::CircuitState;
use crate::error::AtpgError;
use crate::network::{Consumer, Wire};
use crate::sim::{detects_fault, Fault, Value};
use crate::Network;

/// Value tried first on the side inputs of a Xor or Xnor gate to propagate a fault effect
///
/// The side inputs of a parity gate are decided one at a time, and both values are tried for
/// each of them: the policy only changes the order, never the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParityDrive {
    /// Try 0, then 1
    #[default]
    Zero,
    /// Try 1, then 0
    One,
}

impl ParityDrive {
    fn values(&self) -> [bool; 2] {
        match self {
            ParityDrive::Zero => [false, true],
            ParityDrive::One => [true, false],
        }
    }
}

/// Configuration of the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of decisions tried before giving up
    pub decision_limit: usize,
    /// Order of the values tried for parity gates on the D-frontier
    pub parity_drive: ParityDrive,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            decision_limit: 100_000,
            parity_drive: ParityDrive::default(),
        }
    }
}

/// Result of a search for a single fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The fault is detected by this test
    Detected(T),
    /// No test exists: the fault is redundant
    Untestable,
    /// The search gave up before reaching a conclusion
    BoundExceeded,
}

impl<T> Outcome<T> {
    /// Returns whether a test was found
    pub fn is_detected(&self) -> bool {
        matches!(self, Outcome::Detected(_))
    }

    /// Transform the test, if any
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Detected(t) => Outcome::Detected(f(t)),
            Outcome::Untestable => Outcome::Untestable,
            Outcome::BoundExceeded => Outcome::BoundExceeded,
        }
    }
}

/// Values of the primary inputs for a single time-frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestPattern {
    names: Vec<String>,
    values: Vec<Value>,
}

impl TestPattern {
    /// Create a pattern from input names and values
    pub fn new(names: Vec<String>, values: Vec<Value>) -> TestPattern {
        assert_eq!(names.len(), values.len());
        TestPattern { names, values }
    }

    /// Return the number of inputs
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the pattern has no input
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Input names, in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Input values, in order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Mutable access to the input values
    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    /// Value of an input by name
    pub fn get(&self, name: &str) -> Option<Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Iterate over (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().map(|(n, v)| format!("{n}={v}")).join(" "))
    }
}

/// An open decision: alternatives not tried yet, and how to return to the state before it
struct Decision {
    mark: usize,
    d_frontier: Vec<usize>,
    j_frontier: Vec<usize>,
    alternatives: Vec<Vec<(Wire, Value)>>,
}

/// State of the search for a single fault
///
/// Decisions are kept on an explicit stack. Returning from a decision undoes exactly the
/// assignments made since it was taken.
pub struct DAlgorithm<'a> {
    network: &'a Network,
    fault: Fault,
    config: SearchConfig,
    state: CircuitState,
    cone: Vec<bool>,
    d_frontier: Vec<usize>,
    j_frontier: Vec<usize>,
    stack: Vec<Decision>,
    nb_decisions: usize,
}

impl<'a> DAlgorithm<'a> {
    /// Prepare a search; the network must be combinatorial
    pub fn new(
        network: &'a Network,
        fault: Fault,
        config: SearchConfig,
    ) -> Result<DAlgorithm<'a>, AtpgError> {
        if !network.is_comb() {
            return Err(AtpgError::Sequential(network.nb_flip_flops()));
        }
        Ok(DAlgorithm {
            network,
            fault,
            config,
            state: CircuitState::new(network),
            cone: fault_cone(network, fault),
            d_frontier: Vec::new(),
            j_frontier: Vec::new(),
            stack: Vec::new(),
            nb_decisions: 0,
        })
    }

    /// Current values of the wires
    pub fn state(&self) -> &CircuitState {
        &self.state
    }

    /// Number of decisions tried so far
    pub fn nb_decisions(&self) -> usize {
        self.nb_decisions
    }

    /// Put the fault effect on the faulty wire and imply; returns false if the fault cannot be
    /// excited
    pub fn activate(&mut self) -> bool {
        self.state = CircuitState::new(self.network);
        self.stack.clear();
        self.state.assign(self.fault.wire, self.fault.activation());
        self.imply()
    }

    fn imply(&mut self) -> bool {
        imply_and_check(
            &mut self.state,
            self.network,
            Some(self.fault),
            &mut self.d_frontier,
            &mut self.j_frontier,
        )
        .is_ok()
    }

    fn effect_at_output(&self) -> bool {
        self.network
            .outputs()
            .iter()
            .any(|w| self.state.get(*w).is_fault_effect())
    }

    /// Assignments propagating the fault effect through each gate of the D-frontier
    fn d_drive_alternatives(&self) -> Vec<Vec<(Wire, Value)>> {
        let mut ret = Vec::new();
        for &i in &self.d_frontier {
            let g = self.network.gate(i);
            let mut unknown = g
                .inputs()
                .iter()
                .copied()
                .filter(|w| !self.state.get(*w).is_known());
            if let Some(v) = g.kind().non_controlling_value() {
                let alt: Vec<(Wire, Value)> = unknown.map(|w| (w, Value::from_bool(v))).collect();
                if !alt.is_empty() {
                    ret.push(alt);
                }
            } else if g.kind().is_parity() {
                // The gate stays on the D-frontier until all its side inputs are decided
                if let Some(w) = unknown.next() {
                    for v in self.config.parity_drive.values() {
                        ret.push(vec![(w, Value::from_bool(v))]);
                    }
                }
            }
        }
        ret
    }

    /// Assignments to justify the first gate of the J-frontier
    fn j_drive_alternatives(&self) -> Vec<Vec<(Wire, Value)>> {
        let Some(&i) = self.j_frontier.first() else {
            return Vec::new();
        };
        let g = self.network.gate(i);
        let Some(&w) = g
            .inputs()
            .iter()
            .find(|w| !self.state.get(**w).is_known())
        else {
            return Vec::new();
        };
        let values: &[Value] = if self.cone[w.index()] {
            // Reconvergent fault effects may be needed to justify the gate
            &[Value::Zero, Value::One, Value::D, Value::DBar]
        } else {
            &[Value::Zero, Value::One]
        };
        values.iter().map(|v| vec![(w, *v)]).collect()
    }

    /// Run the search from an activated state
    ///
    /// On success the state holds the test. Otherwise it is back to the state right after
    /// activation.
    pub fn run(&mut self) -> Outcome<()> {
        loop {
            let mut alternatives = if self.effect_at_output() {
                if self.j_frontier.is_empty() {
                    return Outcome::Detected(());
                }
                self.j_drive_alternatives()
            } else {
                self.d_drive_alternatives()
            };
            if !alternatives.is_empty() {
                alternatives.reverse();
                self.stack.push(Decision {
                    mark: self.state.mark(),
                    d_frontier: self.d_frontier.clone(),
                    j_frontier: self.j_frontier.clone(),
                    alternatives,
                });
            }
            if !self.next_alternative() {
                return if self.nb_decisions > self.config.decision_limit {
                    Outcome::BoundExceeded
                } else {
                    Outcome::Untestable
                };
            }
        }
    }

    /// Backtrack to the most recent decision with an alternative left, and apply it
    fn next_alternative(&mut self) -> bool {
        while let Some(top) = self.stack.last_mut() {
            self.state.undo(top.mark);
            self.d_frontier.clone_from(&top.d_frontier);
            self.j_frontier.clone_from(&top.j_frontier);
            let Some(alt) = top.alternatives.pop() else {
                self.stack.pop();
                continue;
            };
            self.nb_decisions += 1;
            if self.nb_decisions > self.config.decision_limit {
                // Give up, going back to the state after activation
                while let Some(top) = self.stack.pop() {
                    self.state.undo(top.mark);
                    self.d_frontier = top.d_frontier;
                    self.j_frontier = top.j_frontier;
                }
                return false;
            }
            if alt.iter().all(|(w, v)| self.state.assign(*w, *v)) && self.imply() {
                return true;
            }
        }
        false
    }

    /// Primary input values of the current state, good machine only
    pub fn test_pattern(&self) -> TestPattern {
        let names = self
            .network
            .inputs()
            .iter()
            .map(|w| self.network.wire_name(*w).to_string())
            .collect();
        let values = self
            .network
            .inputs()
            .iter()
            .map(|w| {
                let v = self.state.get(*w);
                Value::from_machines(v.good(), v.good())
            })
            .collect();
        TestPattern::new(names, values)
    }
}

/// Wires that may carry the effect of a fault: its own wire and everything it drives
fn fault_cone(network: &Network, fault: Fault) -> Vec<bool> {
    let mut ret = vec![false; network.nb_wires()];
    let mut stack = vec![fault.wire];
    while let Some(w) = stack.pop() {
        if std::mem::replace(&mut ret[w.index()], true) {
            continue;
        }
        for c in network.consumers(w) {
            match *c {
                Consumer::Gate(i) => stack.push(network.gate(i).output()),
                Consumer::Fanout(i) => stack.extend_from_slice(network.fanout(i).branches()),
                Consumer::FlipFlop(_) => (),
            }
        }
    }
    ret
}

/// Search for a test pattern detecting a fault in a combinatorial network
///
/// The pattern found is checked by simulation before it is returned.
pub fn search(
    network: &Network,
    fault: Fault,
    config: &SearchConfig,
) -> Result<Outcome<TestPattern>, AtpgError> {
    let mut alg = DAlgorithm::new(network, fault, *config)?;
    if !alg.activate() {
        trace!("{} cannot be excited", network.fault_name(&fault));
        return Ok(Outcome::Untestable);
    }
    let outcome = alg.run();
    trace!(
        "{}: {} decisions",
        network.fault_name(&fault),
        alg.nb_decisions()
    );
    match outcome {
        Outcome::Detected(()) => {
            let pattern = alg.test_pattern();
            if !detects_fault(network, pattern.values(), fault) {
                return Err(AtpgError::InvalidTest(network.fault_name(&fault)));
            }
            Ok(Outcome::Detected(pattern))
        }
        Outcome::Untestable => Ok(Outcome::Untestable),
        Outcome::BoundExceeded => Ok(Outcome::BoundExceeded),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{search, DAlgorithm, Outcome, ParityDrive, SearchConfig};
    use crate::error::AtpgError;
    use crate::network::generators::{random, testcases};
    use crate::network::{GateType, Netlist};
    use crate::sim::{detects_fault, Value};
    use crate::Network;

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn test_and_output() {
        let net = testcases::and_gate(2);
        let fault = net.fault("z", false).unwrap();
        let Outcome::Detected(p) = search(&net, fault, &config()).unwrap() else {
            panic!("fault should be detected");
        };
        assert_eq!(p.get("i0"), Some(Value::One));
        assert_eq!(p.get("i1"), Some(Value::One));
        assert_eq!(p.to_string(), "i0=1 i1=1");
    }

    #[test]
    fn test_inverter_chain() {
        let net = testcases::inverter_chain(3);
        let fault = net.fault("n0", true).unwrap();
        let Outcome::Detected(p) = search(&net, fault, &config()).unwrap() else {
            panic!("fault should be detected");
        };
        assert_eq!(p.get("n0"), Some(Value::Zero));
    }

    #[test]
    fn test_fanout_stem() {
        let net = testcases::fanout_and();
        let fault = net.fault("s", false).unwrap();
        let Outcome::Detected(p) = search(&net, fault, &config()).unwrap() else {
            panic!("fault should be detected");
        };
        assert_eq!(p.get("s"), Some(Value::One));
        // The effect reaches at least one output, through a side input set to 1
        assert!(p.get("a") == Some(Value::One) || p.get("b") == Some(Value::One));
        assert!(detects_fault(&net, p.values(), fault));
    }

    #[test]
    fn test_redundant() {
        let net = testcases::redundant_and();
        let fault = net.faults()[0];
        assert_eq!(search(&net, fault, &config()).unwrap(), Outcome::Untestable);
    }

    #[test]
    fn test_unobservable() {
        // The effect on a is always masked by the Or with its complement
        let mut netlist = Netlist::new();
        netlist
            .add_fanout("a", &["a1", "a2"])
            .add_gate(GateType::Not, "na", &["a2"])
            .add_gate(GateType::Xor, "x", &["a1", "b"])
            .add_fanout("x", &["x1", "x2"])
            .add_gate(GateType::Not, "nx", &["x1"])
            .add_gate(GateType::Or, "z", &["x2", "nx", "na"]);
        netlist.derive_ports();
        let net = Network::from_netlist(&netlist).unwrap();
        let fault = net.fault("b", false).unwrap();
        assert_eq!(search(&net, fault, &config()).unwrap(), Outcome::Untestable);
    }

    #[test]
    fn test_parity_drive() {
        let mut netlist = Netlist::new();
        netlist.add_gate(GateType::Xnor, "z", &["a", "b"]);
        netlist.derive_ports();
        let net = Network::from_netlist(&netlist).unwrap();
        let fault = net.fault("a", false).unwrap();
        for (policy, expected) in [
            (ParityDrive::Zero, Value::Zero),
            (ParityDrive::One, Value::One),
        ] {
            let config = SearchConfig {
                parity_drive: policy,
                ..SearchConfig::default()
            };
            let Outcome::Detected(p) = search(&net, fault, &config).unwrap() else {
                panic!("fault should be detected");
            };
            assert_eq!(p.get("b"), Some(expected));
        }
    }

    /// Xor side inputs that must take different values
    fn mixed_parity() -> Network {
        let mut netlist = Netlist::new();
        netlist
            .add_fanout("x", &["x1", "x2"])
            .add_gate(GateType::Not, "n", &["x2"])
            .add_gate(GateType::Xor, "z", &["a", "x1", "n"]);
        netlist.derive_ports();
        Network::from_netlist(&netlist).unwrap()
    }

    #[test]
    fn test_parity_mixed_side_values() {
        let net = mixed_parity();
        let fault = net.fault("a", false).unwrap();
        for policy in [ParityDrive::Zero, ParityDrive::One] {
            let config = SearchConfig {
                parity_drive: policy,
                ..SearchConfig::default()
            };
            let Outcome::Detected(p) = search(&net, fault, &config).unwrap() else {
                panic!("fault should be detected");
            };
            assert_eq!(p.get("a"), Some(Value::One));
            assert!(detects_fault(&net, p.values(), fault));
        }
    }

    #[test]
    fn test_reconvergent_parity() {
        // z = (a & b) ^ (a | c): the effect of a reaches z on both paths
        let mut netlist = Netlist::new();
        netlist
            .add_fanout("a", &["a1", "a2"])
            .add_gate(GateType::And, "p", &["a1", "b"])
            .add_gate(GateType::Or, "q", &["a2", "c"])
            .add_gate(GateType::Xor, "z", &["p", "q"]);
        netlist.derive_ports();
        let net = Network::from_netlist(&netlist).unwrap();
        for fault in net.all_faults() {
            let outcome = search(&net, fault, &config()).unwrap();
            let detectable = (0..1u32 << net.nb_inputs()).any(|m| {
                let pattern: Vec<Value> = (0..net.nb_inputs())
                    .map(|i| Value::from_bool(m >> i & 1 != 0))
                    .collect();
                detects_fault(&net, &pattern, fault)
            });
            assert_eq!(outcome.is_detected(), detectable, "{}", net.fault_name(&fault));
        }
    }

    #[test]
    fn test_bound() {
        let net = random::comb(6, 40, 3);
        let config = SearchConfig {
            decision_limit: 0,
            ..SearchConfig::default()
        };
        for fault in net.all_faults() {
            let mut alg = DAlgorithm::new(&net, fault, config).unwrap();
            if !alg.activate() {
                continue;
            }
            let before = alg.state().clone();
            match alg.run() {
                Outcome::Detected(()) => assert_eq!(alg.nb_decisions(), 0),
                Outcome::BoundExceeded => assert_eq!(alg.state(), &before),
                Outcome::Untestable => assert_eq!(alg.nb_decisions(), 0),
            }
        }
    }

    #[test]
    fn test_sequential_rejected() {
        let net = testcases::sequential_and();
        let fault = net.faults()[0];
        assert!(matches!(
            search(&net, fault, &config()),
            Err(AtpgError::Sequential(1))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every pattern found detects its fault, and searches on small circuits conclude
        #[test]
        fn search_is_sound(seed in 0u64..10_000) {
            let net = random::comb(4, 12, seed);
            for fault in net.all_faults() {
                let outcome = search(&net, fault, &SearchConfig::default()).unwrap();
                prop_assert!(outcome != Outcome::BoundExceeded);
                if let Outcome::Detected(p) = outcome {
                    prop_assert!(detects_fault(&net, p.values(), fault));
                }
            }
        }

        /// A fault reported untestable is detected by no input pattern
        #[test]
        fn untestable_is_exhaustive(seed in 0u64..10_000) {
            let net = random::comb(4, 12, seed);
            let patterns: Vec<Vec<Value>> = (0..1u32 << net.nb_inputs())
                .map(|m| {
                    (0..net.nb_inputs())
                        .map(|i| Value::from_bool(m >> i & 1 != 0))
                        .collect()
                })
                .collect();
            for fault in net.all_faults() {
                if search(&net, fault, &SearchConfig::default()).unwrap() == Outcome::Untestable {
                    for p in &patterns {
                        prop_assert!(
                            !detects_fault(&net, p, fault),
                            "{} reported untestable",
                            net.fault_name(&fault)
                        );
                    }
                }
            }
        }

        /// A failed search leaves the state as it was after activation
        #[test]
        fn failed_search_restores_state(seed in 0u64..10_000) {
            let net = random::comb(3, 10, seed);
            for fault in net.all_faults() {
                let mut alg = DAlgorithm::new(&net, fault, SearchConfig::default()).unwrap();
                if !alg.activate() {
                    continue;
                }
                let before = alg.state().snapshot();
                if alg.run() == Outcome::Untestable {
                    prop_assert_eq!(alg.state().snapshot(), before);
                }
            }
        }

        /// Without reconvergent fanout, every fault is detected
        #[test]
        fn fanout_free_is_complete(seed in 0u64..10_000) {
            let net = random::tree(3, seed);
            for fault in net.all_faults() {
                let outcome = search(&net, fault, &SearchConfig::default()).unwrap();
                prop_assert!(outcome.is_detected(), "{} not detected", net.fault_name(&fault));
            }
        }
    }
}

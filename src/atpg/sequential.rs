//! Test generation for sequential networks, by time-frame unrolling

use std::fmt;

use tracing::{debug, warn};

use crate::atpg::dalg::{search, Outcome, SearchConfig, TestPattern};
use crate::error::AtpgError;
use crate::network::unroll::{frame_wire_name, unroll};
use crate::sim::{sequence_detects_fault, Fault, Value};
use crate::Network;

/// Sequence of input patterns, one per clock cycle, oldest first
///
/// Clock inputs are not part of the patterns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestSequence {
    frames: Vec<TestPattern>,
}

impl TestSequence {
    /// Create a sequence from its patterns, oldest first
    pub fn new(frames: Vec<TestPattern>) -> TestSequence {
        TestSequence { frames }
    }

    /// Number of clock cycles
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns whether the sequence has no pattern
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Patterns, oldest first
    pub fn frames(&self) -> &[TestPattern] {
        &self.frames
    }

    /// Mutable access to the patterns
    pub fn frames_mut(&mut self) -> &mut [TestPattern] {
        &mut self.frames
    }

    /// Values for all primary inputs of a network at each cycle, in input order
    ///
    /// Inputs absent from the patterns, such as clocks, are X.
    pub fn input_values(&self, network: &Network) -> Vec<Vec<Value>> {
        self.frames
            .iter()
            .map(|p| {
                network
                    .inputs()
                    .iter()
                    .map(|w| p.get(network.wire_name(*w)).unwrap_or(Value::X))
                    .collect()
            })
            .collect()
    }
}

impl From<TestPattern> for TestSequence {
    fn from(p: TestPattern) -> TestSequence {
        TestSequence { frames: vec![p] }
    }
}

impl fmt::Display for TestSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.frames.iter().enumerate() {
            if i != 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

/// Extract the pattern of each frame from a pattern of the unrolled network
fn split_frames(network: &Network, pattern: &TestPattern, frames: usize) -> TestSequence {
    let clocks: Vec<_> = network
        .flip_flops()
        .iter()
        .filter_map(|ff| ff.clock())
        .collect();
    let inputs: Vec<String> = network
        .inputs()
        .iter()
        .filter(|w| !clocks.contains(w))
        .map(|w| network.wire_name(*w).to_string())
        .collect();
    let ret = (0..frames)
        .rev()
        .map(|frame| {
            let values = inputs
                .iter()
                .map(|n| {
                    pattern
                        .get(&frame_wire_name(n, frame))
                        .unwrap_or(Value::X)
                })
                .collect();
            TestPattern::new(inputs.clone(), values)
        })
        .collect();
    TestSequence::new(ret)
}

/// Search for a sequence of patterns detecting a fault, from an unknown initial state
///
/// The network is unrolled into 1, 2, ... up to `max_frames` time-frames, with the fault in the
/// most recent frame only. The fault is observed at the primary outputs of the last cycle, or at
/// the data inputs of the flip-flops.
///
/// A pattern that needs a known initial state is rejected and more frames are tried. So is a
/// sequence that does not detect the fault once it is present in every cycle: the fault may mask
/// its own effect in the earlier frames.
pub fn find_sequential_test(
    network: &Network,
    fault: Fault,
    max_frames: usize,
    config: &SearchConfig,
) -> Result<Outcome<TestSequence>, AtpgError> {
    let name = network.wire_name(fault.wire);
    for frames in 1..=max_frames {
        let unrolled = unroll(network, frames)?;
        let Some(f) = unrolled.fault(name, fault.value) else {
            warn!(
                "{} does not exist in the unrolled network",
                network.fault_name(&fault)
            );
            return Ok(Outcome::Untestable);
        };
        match search(&unrolled, f, config)? {
            Outcome::Detected(pattern) => {
                let needs_state = unrolled
                    .initial_state()
                    .iter()
                    .any(|w| pattern.get(unrolled.wire_name(*w)) != Some(Value::X));
                if needs_state {
                    debug!(
                        "{}: pattern with {} frames needs an initial state",
                        network.fault_name(&fault),
                        frames
                    );
                    continue;
                }
                let seq = split_frames(network, &pattern, frames);
                if !sequence_detects_fault(network, &seq.input_values(network), fault) {
                    debug!(
                        "{}: sequence with {} frames is masked by the fault in earlier cycles",
                        network.fault_name(&fault),
                        frames
                    );
                    continue;
                }
                debug!(
                    "{}: detected with {} frames",
                    network.fault_name(&fault),
                    frames
                );
                return Ok(Outcome::Detected(seq));
            }
            Outcome::Untestable => {
                // More frames only constrain the initial state further
                debug!(
                    "{}: untestable with {} frames",
                    network.fault_name(&fault),
                    frames
                );
                return Ok(Outcome::Untestable);
            }
            Outcome::BoundExceeded => return Ok(Outcome::BoundExceeded),
        }
    }
    Ok(Outcome::BoundExceeded)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::find_sequential_test;
    use crate::atpg::dalg::{Outcome, SearchConfig};
    use crate::network::generators::{random, testcases};
    use crate::network::{GateType, Netlist};
    use crate::sim::{sequence_detects_fault, Value};
    use crate::Network;

    #[test]
    fn test_two_frames() {
        let net = testcases::sequential_and();
        let fault = net.faults()[0];
        let config = SearchConfig::default();

        // One frame is not enough: the state must be 0
        assert_eq!(
            find_sequential_test(&net, fault, 1, &config).unwrap(),
            Outcome::BoundExceeded
        );

        let Outcome::Detected(seq) = find_sequential_test(&net, fault, 5, &config).unwrap() else {
            panic!("fault should be detected");
        };
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.frames()[0].get("a"), Some(Value::Zero));
        assert_eq!(seq.frames()[1].get("a"), Some(Value::One));
        assert_eq!(seq.frames()[0].get("clk"), None);
        assert_eq!(seq.to_string(), "a=0; a=1");
        assert!(sequence_detects_fault(&net, &seq.input_values(&net), fault));
    }

    #[test]
    fn test_shift_register() {
        let net = testcases::shift_register(2);
        let fault = net.fault("q1", true).unwrap();
        let Outcome::Detected(seq) =
            find_sequential_test(&net, fault, 5, &SearchConfig::default()).unwrap()
        else {
            panic!("fault should be detected");
        };
        // a must travel through both flip-flops
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.frames()[0].get("a"), Some(Value::Zero));
        assert!(sequence_detects_fault(&net, &seq.input_values(&net), fault));
    }

    #[test]
    fn test_clock_fault() {
        let net = testcases::shift_register(1);
        let fault = net.fault("clk", false).unwrap();
        assert_eq!(
            find_sequential_test(&net, fault, 3, &SearchConfig::default()).unwrap(),
            Outcome::Untestable
        );
    }

    #[test]
    fn test_combinational() {
        let net = testcases::and_gate(2);
        let fault = net.fault("z", true).unwrap();
        let Outcome::Detected(seq) =
            find_sequential_test(&net, fault, 3, &SearchConfig::default()).unwrap()
        else {
            panic!("fault should be detected");
        };
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_parity_side_inputs() {
        let mut netlist = Netlist::new();
        netlist
            .add_fanout("x", &["x1", "x2"])
            .add_gate(GateType::Not, "n", &["x2"])
            .add_gate(GateType::Xor, "z", &["a", "x1", "n"]);
        netlist.derive_ports();
        let net = Network::from_netlist(&netlist).unwrap();
        let fault = net.fault("a", false).unwrap();
        let Outcome::Detected(seq) =
            find_sequential_test(&net, fault, 3, &SearchConfig::default()).unwrap()
        else {
            panic!("fault should be detected");
        };
        assert_eq!(seq.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Every sequence found detects its fault when it is present in all cycles
        #[test]
        fn sequences_detect_faults(seed in 0u64..10_000) {
            let net = random::seq(2, 2, 5, seed);
            let config = SearchConfig {
                decision_limit: 10_000,
                ..SearchConfig::default()
            };
            for fault in net.all_faults() {
                let outcome = find_sequential_test(&net, fault, 3, &config).unwrap();
                if let Outcome::Detected(seq) = outcome {
                    prop_assert!(
                        sequence_detects_fault(&net, &seq.input_values(&net), fault),
                        "{} not detected by {}",
                        net.fault_name(&fault),
                        seq
                    );
                }
            }
        }
    }
}

//! Signal algebra and simulation of a network, with or without a fault
//!
//! Input patterns are given as one [`Value`] per primary input, in the order of
//! [`Network::inputs`]. Only the good-machine projection of each value is used: a `D` on an input
//! is simulated as 1.

mod algebra;
mod fault;
mod simple_sim;
mod value;

use crate::Network;

pub use algebra::{evaluate, simulate};
pub use fault::Fault;
pub use simple_sim::SimpleSimulator;
pub use value::Value;

fn to_ternary(pattern: &[Value]) -> Vec<Option<bool>> {
    pattern.iter().map(|v| v.good()).collect()
}

fn combine(good: &[Option<bool>], faulty: &[Option<bool>]) -> Vec<Value> {
    good.iter()
        .zip(faulty.iter())
        .map(|(g, f)| Value::from_machines(*g, *f))
        .collect()
}

/// Simulate a combinatorial network; return the output values
pub fn simulate_comb(a: &Network, pattern: &[Value]) -> Vec<Value> {
    assert!(a.is_comb());
    let mut sim = SimpleSimulator::new(a, None);
    let out = sim.run(&[to_ternary(pattern)]);
    out[0].iter().map(|v| Value::from_machines(*v, *v)).collect()
}

/// Simulate a combinatorial network with a fault injected; return the five-valued output values
pub fn simulate_comb_with_fault(a: &Network, pattern: &[Value], fault: Fault) -> Vec<Value> {
    assert!(a.is_comb());
    let input = [to_ternary(pattern)];
    let good = SimpleSimulator::new(a, None).run(&input);
    let faulty = SimpleSimulator::new(a, Some(fault)).run(&input);
    combine(&good[0], &faulty[0])
}

/// Returns whether a pattern detects a fault: some output is known in both machines and differs
pub fn detects_fault(a: &Network, pattern: &[Value], fault: Fault) -> bool {
    simulate_comb_with_fault(a, pattern, fault)
        .iter()
        .any(|v| v.is_fault_effect())
}

/// Simulate a network over multiple timesteps with a fault injected, starting from an unknown
/// state; return the five-valued output values at each timestep
pub fn simulate_with_fault(a: &Network, patterns: &[Vec<Value>], fault: Fault) -> Vec<Vec<Value>> {
    let input: Vec<Vec<Option<bool>>> = patterns.iter().map(|p| to_ternary(p)).collect();
    let good = SimpleSimulator::new(a, None).run(&input);
    let faulty = SimpleSimulator::new(a, Some(fault)).run(&input);
    good.iter()
        .zip(faulty.iter())
        .map(|(g, f)| combine(g, f))
        .collect()
}

/// Returns whether a sequence of patterns detects a fault, starting from an unknown state
///
/// The fault is detected if some output differs at some timestep, or if the state loaded at the
/// clock edge after the last timestep differs.
pub fn sequence_detects_fault(a: &Network, patterns: &[Vec<Value>], fault: Fault) -> bool {
    let input: Vec<Vec<Option<bool>>> = patterns.iter().map(|p| to_ternary(p)).collect();
    let mut good = SimpleSimulator::new(a, None);
    let mut faulty = SimpleSimulator::new(a, Some(fault));
    let good_out = good.run(&input);
    let faulty_out = faulty.run(&input);
    let differs = |g: &[Option<bool>], f: &[Option<bool>]| {
        combine(g, f).iter().any(|v| v.is_fault_effect())
    };
    good_out
        .iter()
        .zip(faulty_out.iter())
        .any(|(g, f)| differs(g, f))
        || differs(&good.next_state(), &faulty.next_state())
}

#[cfg(test)]
mod tests {
    use super::{detects_fault, sequence_detects_fault, simulate_comb, simulate_with_fault, Value};
    use crate::network::generators::testcases;

    #[test]
    fn test_basic() {
        let net = testcases::fanout_reconvergence();
        // Inputs a, b; output d = a | (a & b)
        assert_eq!(simulate_comb(&net, &[Value::Zero, Value::One]), vec![Value::Zero]);
        assert_eq!(simulate_comb(&net, &[Value::One, Value::X]), vec![Value::One]);
        assert_eq!(simulate_comb(&net, &[Value::X, Value::One]), vec![Value::X]);
        // D is simulated as its good value
        assert_eq!(simulate_comb(&net, &[Value::D, Value::Zero]), vec![Value::One]);
    }

    #[test]
    fn test_detects() {
        let net = testcases::and_gate(2);
        let fault = net.fault("z", false).unwrap();
        assert!(detects_fault(&net, &[Value::One, Value::One], fault));
        assert!(!detects_fault(&net, &[Value::One, Value::X], fault));
        assert!(!detects_fault(&net, &[Value::Zero, Value::One], fault));
        let fault = net.fault("i0", true).unwrap();
        assert!(detects_fault(&net, &[Value::Zero, Value::One], fault));
        assert!(!detects_fault(&net, &[Value::Zero, Value::Zero], fault));
    }

    #[test]
    fn test_redundant() {
        let net = testcases::redundant_and();
        let fault = net.faults()[0];
        for a in [Value::Zero, Value::One] {
            assert!(!detects_fault(&net, &[a], fault));
        }
    }

    #[test]
    fn test_sequence() {
        let net = testcases::sequential_and();
        let fault = net.faults()[0];
        // Inputs are a and clk; the first cycle loads 0 in the flip-flop, the second excites n
        let a0 = vec![Value::Zero, Value::X];
        let a1 = vec![Value::One, Value::X];
        assert!(!sequence_detects_fault(&net, &[a1.clone()], fault));
        assert!(sequence_detects_fault(&net, &[a0.clone(), a1.clone()], fault));
        let out = simulate_with_fault(&net, &[a0, a1.clone(), a1], fault);
        assert_eq!(out[2], vec![Value::D]);
    }
}

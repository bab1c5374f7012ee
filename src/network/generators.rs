//! Network generators and templates

use crate::network::Netlist;
use crate::Network;

/// Build a network from a netlist that is well-formed by construction
fn build(mut netlist: Netlist) -> Network {
    netlist.derive_ports();
    let ret = Network::from_netlist(&netlist).expect("generated netlist is well-formed");
    ret.check();
    ret
}

/// Simple generators to test functionality
pub mod testcases {
    use super::build;
    use crate::network::netlist::FlipFlopDesc;
    use crate::network::{GateType, Netlist};
    use crate::Network;

    /// A single And gate with output z and inputs i0, i1, ...
    pub fn and_gate(arity: usize) -> Network {
        assert!(arity > 0);
        let inputs: Vec<String> = (0..arity).map(|i| format!("i{i}")).collect();
        let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        let mut ret = Netlist::new();
        ret.add_gate(GateType::And, "z", &inputs);
        build(ret)
    }

    /// A chain of inverters from n0 to n{len}
    pub fn inverter_chain(len: usize) -> Network {
        assert!(len > 0);
        let mut ret = Netlist::new();
        for i in 0..len {
            ret.add_gate(
                GateType::Not,
                &format!("n{}", i + 1),
                &[format!("n{i}").as_str()],
            );
        }
        build(ret)
    }

    /// A stem s feeding two And gates through an explicit fanout
    pub fn fanout_and() -> Network {
        let mut ret = Netlist::new();
        ret.add_fanout("s", &["s1", "s2"])
            .add_gate(GateType::And, "y", &["s1", "a"])
            .add_gate(GateType::And, "z", &["s2", "b"]);
        build(ret)
    }

    /// A stem a reconverging through an And and an Or gate
    pub fn fanout_reconvergence() -> Network {
        let mut ret = Netlist::new();
        ret.add_fanout("a", &["a1", "a2"])
            .add_gate(GateType::And, "c", &["a1", "b"])
            .add_gate(GateType::Or, "d", &["a2", "c"]);
        build(ret)
    }

    /// And of a signal with its own complement: the output is constant 0, so stuck-at-0 on it
    /// is redundant
    pub fn redundant_and() -> Network {
        let mut ret = Netlist::new();
        ret.add_fanout("a", &["a1", "a2"])
            .add_gate(GateType::Not, "na", &["a2"])
            .add_gate(GateType::And, "c", &["a1", "na"])
            .add_fault("c", false);
        build(ret)
    }

    /// A flip-flop whose next state is the And of an input with the complemented state
    ///
    /// The output z copies the state. Detecting stuck-at-0 on the data input n requires two
    /// time-frames: one to bring the state to 0, one to set n to 1.
    pub fn sequential_and() -> Network {
        let mut ret = Netlist::new();
        ret.add_flip_flop(FlipFlopDesc {
            d: "n".to_string(),
            clock: Some("clk".to_string()),
            q: "q".to_string(),
            q_bar: Some("qb".to_string()),
            ..Default::default()
        })
        .add_gate(GateType::And, "n", &["a", "qb"])
        .add_gate(GateType::Buff, "z", &["q"])
        .add_fault("n", false);
        build(ret)
    }

    /// A shift register of flip-flops, from input a to output z
    pub fn shift_register(len: usize) -> Network {
        assert!(len > 0);
        let mut ret = Netlist::new();
        for i in 0..len {
            let d = if i == 0 {
                "a".to_string()
            } else {
                format!("q{}", i - 1)
            };
            ret.add_flip_flop(FlipFlopDesc {
                d,
                clock: Some("clk".to_string()),
                q: format!("q{i}"),
                ..Default::default()
            });
        }
        ret.add_gate(GateType::Buff, "z", &[format!("q{}", len - 1).as_str()]);
        build(ret)
    }
}

/// Random generators, used for property testing
pub mod random {
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::build;
    use crate::network::netlist::FlipFlopDesc;
    use crate::network::unroll::materialize_fanouts;
    use crate::network::{GateType, Netlist};
    use crate::Network;

    fn random_gate(rng: &mut SmallRng) -> (GateType, usize) {
        let kind = *GateType::ALL
            .choose(rng)
            .expect("gate type list is not empty");
        let arity = if kind.is_unary() {
            1
        } else {
            rng.gen_range(2..=3)
        };
        (kind, arity)
    }

    /// A random acyclic circuit; wires read several times get an explicit fanout
    pub fn comb(nb_inputs: usize, nb_gates: usize, seed: u64) -> Network {
        assert!(nb_inputs > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut wires: Vec<String> = (0..nb_inputs).map(|i| format!("i{i}")).collect();
        let mut ret = Netlist::new();
        for g in 0..nb_gates {
            let (kind, arity) = random_gate(&mut rng);
            let inputs: Vec<String> = (0..arity)
                .map(|_| wires[rng.gen_range(0..wires.len())].clone())
                .collect();
            let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
            let output = format!("g{g}");
            ret.add_gate(kind, &output, &inputs);
            wires.push(output);
        }
        if nb_gates == 0 {
            ret.add_gate(GateType::Buff, "g0", &["i0"]);
        }
        materialize_fanouts(&mut ret);
        build(ret)
    }

    /// A random sequential circuit
    ///
    /// Flip-flops q0, q1, ... are clocked by clk and load the gates d0, d1, ... The logic reads
    /// the inputs i0, i1, ... and the state, and z is a copy of one of its wires.
    pub fn seq(nb_inputs: usize, nb_flip_flops: usize, nb_gates: usize, seed: u64) -> Network {
        assert!(nb_inputs > 0 && nb_flip_flops > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut wires: Vec<String> = (0..nb_inputs)
            .map(|i| format!("i{i}"))
            .chain((0..nb_flip_flops).map(|i| format!("q{i}")))
            .collect();
        let mut ret = Netlist::new();
        let mut add_gate = |ret: &mut Netlist, wires: &[String], output: &str| {
            let (kind, arity) = random_gate(&mut rng);
            let inputs: Vec<&str> = (0..arity)
                .map(|_| wires[rng.gen_range(0..wires.len())].as_str())
                .collect();
            ret.add_gate(kind, output, &inputs);
        };
        for g in 0..nb_gates {
            let output = format!("g{g}");
            add_gate(&mut ret, &wires, &output);
            wires.push(output);
        }
        for i in 0..nb_flip_flops {
            let d = format!("d{i}");
            add_gate(&mut ret, &wires, &d);
            ret.add_flip_flop(FlipFlopDesc {
                d,
                clock: Some("clk".to_string()),
                q: format!("q{i}"),
                ..Default::default()
            });
        }
        let observed = wires[rng.gen_range(nb_inputs..wires.len())].clone();
        ret.add_gate(GateType::Buff, "z", &[observed.as_str()]);
        materialize_fanouts(&mut ret);
        build(ret)
    }

    /// A random fanout-free tree of the given depth; every leaf is a distinct input
    pub fn tree(depth: usize, seed: u64) -> Network {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = Netlist::new();
        let mut nb_inputs = 0;
        let mut nb_gates = 0;
        let root = tree_node(&mut ret, &mut rng, depth, &mut nb_inputs, &mut nb_gates);
        if nb_gates == 0 {
            ret.add_gate(GateType::Buff, "g0", &[root.as_str()]);
        }
        build(ret)
    }

    fn tree_node(
        netlist: &mut Netlist,
        rng: &mut SmallRng,
        depth: usize,
        nb_inputs: &mut usize,
        nb_gates: &mut usize,
    ) -> String {
        if depth == 0 || rng.gen_bool(0.2) {
            *nb_inputs += 1;
            return format!("i{}", *nb_inputs - 1);
        }
        let (kind, arity) = random_gate(rng);
        let inputs: Vec<String> = (0..arity)
            .map(|_| tree_node(netlist, rng, depth - 1, nb_inputs, nb_gates))
            .collect();
        let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        *nb_gates += 1;
        let output = format!("g{}", *nb_gates - 1);
        netlist.add_gate(kind, &output, &inputs);
        output
    }
}

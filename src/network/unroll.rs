//! Time-frame unrolling of sequential networks
//!
//! The combinational logic is copied once per clock cycle. Frame 0 is the present cycle and keeps
//! the unsuffixed wire names; frame k is k cycles in the past and its wires are suffixed with `-k`.
//! Each flip-flop becomes a buffer from the data input of frame k+1 to the state output of
//! frame k, and the state of the oldest frame becomes a primary input.

use fxhash::{FxHashMap, FxHashSet};

use crate::error::NetworkError;
use crate::network::netlist::{FanoutDesc, FaultDesc, GateDesc};
use crate::network::{GateType, Netlist};
use crate::Network;

/// Name of a wire in a given time-frame of an unrolled network
pub fn frame_wire_name(name: &str, frame: usize) -> String {
    if frame == 0 {
        name.to_string()
    } else {
        format!("{name}-{frame}")
    }
}

/// Unroll a network into a combinational network with the given number of time-frames
///
/// Only the primary outputs of frame 0 are outputs of the result, together with the data input
/// of each flip-flop in frame 0. Logic of older frames that does not reach them is removed, with
/// its faults; frame 0 is kept whole. Clocks are dropped. Declared faults are copied to every frame.
/// The state outputs of the oldest frame are the [initial state](Network::initial_state) of the
/// result. Every wire read more than once gets an explicit fanout.
pub fn unroll(network: &Network, frames: usize) -> Result<Network, NetworkError> {
    if frames == 0 {
        return Err(NetworkError::InvalidFrameCount(frames));
    }
    let (netlist, initial_state) = unroll_netlist(&network.to_netlist(), frames);
    let mut ret = Network::from_netlist(&netlist)?;
    let initial_state = initial_state
        .iter()
        .filter_map(|n| ret.find_wire(n))
        .collect();
    ret.set_initial_state(initial_state);
    Ok(ret)
}

/// Unroll a netlist, returning the names of the initial-state inputs as well
fn unroll_netlist(netlist: &Netlist, frames: usize) -> (Netlist, Vec<String>) {
    let clocks = netlist.clocks();
    let mut ret = Netlist::new();
    for frame in 0..frames {
        let n = |s: &String| frame_wire_name(s, frame);
        for g in &netlist.gates {
            ret.gates.push(GateDesc {
                kind: g.kind,
                output: n(&g.output),
                inputs: g.inputs.iter().map(n).collect(),
            });
        }
        for f in &netlist.fanouts {
            ret.fanouts.push(FanoutDesc {
                stem: n(&f.stem),
                branches: f.branches.iter().map(n).collect(),
            });
        }
        for f in &netlist.faults {
            ret.faults.push(FaultDesc {
                wire: n(&f.wire),
                value: f.value,
            });
        }
        for i in &netlist.inputs {
            if !clocks.contains(i.as_str()) {
                ret.inputs.push(n(i));
            }
        }
    }
    ret.outputs = netlist.outputs.clone();

    let mut initial_state = Vec::new();
    for ff in &netlist.flip_flops {
        for frame in 0..frames - 1 {
            ret.add_gate(
                GateType::Buff,
                &frame_wire_name(&ff.q, frame),
                &[frame_wire_name(&ff.d, frame + 1).as_str()],
            );
        }
        if let Some(q_bar) = &ff.q_bar {
            for frame in 0..frames {
                ret.add_gate(
                    GateType::Not,
                    &frame_wire_name(q_bar, frame),
                    &[frame_wire_name(&ff.q, frame).as_str()],
                );
            }
        }
    }
    for ff in &netlist.flip_flops {
        let q = frame_wire_name(&ff.q, frames - 1);
        ret.inputs.push(q.clone());
        initial_state.push(q);
        if !ret.outputs.contains(&ff.d) {
            ret.outputs.push(ff.d.clone());
        }
    }
    let present: FxHashSet<String> = netlist
        .gates
        .iter()
        .map(|g| g.output.clone())
        .chain(netlist.fanouts.iter().flat_map(|f| f.branches.iter().cloned()))
        .chain(
            netlist
                .flip_flops
                .iter()
                .flat_map(|ff| std::iter::once(&ff.q).chain(&ff.q_bar).cloned()),
        )
        .collect();
    remove_unread(&mut ret, &present);
    materialize_fanouts(&mut ret);
    (ret, initial_state)
}

/// Remove the gates and fanout branches that are neither read, outputs nor kept, to a fixed point
///
/// Primary inputs are kept even when unread. Faults on removed wires are removed as well.
fn remove_unread(netlist: &mut Netlist, keep: &FxHashSet<String>) {
    loop {
        let mut read = keep.clone();
        read.extend(netlist.outputs.iter().cloned());
        for g in &netlist.gates {
            read.extend(g.inputs.iter().cloned());
        }
        for f in &netlist.fanouts {
            read.insert(f.stem.clone());
        }
        let nb_gates = netlist.gates.len();
        let nb_fanouts = netlist.fanouts.len();
        let nb_branches: usize = netlist.fanouts.iter().map(|f| f.branches.len()).sum();
        netlist.gates.retain(|g| read.contains(&g.output));
        for f in &mut netlist.fanouts {
            f.branches.retain(|b| read.contains(b));
        }
        netlist.fanouts.retain(|f| !f.branches.is_empty());
        let nb_branches_after: usize = netlist.fanouts.iter().map(|f| f.branches.len()).sum();
        if netlist.gates.len() == nb_gates
            && netlist.fanouts.len() == nb_fanouts
            && nb_branches_after == nb_branches
        {
            break;
        }
    }
    let mut wires: FxHashSet<&str> = netlist.inputs.iter().map(String::as_str).collect();
    for g in &netlist.gates {
        wires.insert(g.output.as_str());
        wires.extend(g.inputs.iter().map(String::as_str));
    }
    for f in &netlist.fanouts {
        wires.insert(f.stem.as_str());
        wires.extend(f.branches.iter().map(String::as_str));
    }
    let faults = netlist
        .faults
        .iter()
        .filter(|f| wires.contains(f.wire.as_str()))
        .cloned()
        .collect();
    netlist.faults = faults;
}

/// Name of the i-th branch (starting at 1) of a materialized fanout
fn branch_name(stem: &str, i: usize) -> String {
    format!("{stem}_branch_{}", i + 1)
}

/// Give each consumer of a wire read several times its own branch wire
///
/// Consumers are numbered gate input slots first, in gate order, then fanout stems. A new fanout
/// maps the wire to the branches. Wires read once are left untouched.
pub fn materialize_fanouts(netlist: &mut Netlist) {
    let mut nb_reads: FxHashMap<String, usize> = FxHashMap::default();
    for g in &netlist.gates {
        for i in &g.inputs {
            *nb_reads.entry(i.clone()).or_default() += 1;
        }
    }
    for f in &netlist.fanouts {
        *nb_reads.entry(f.stem.clone()).or_default() += 1;
    }

    let mut new_fanouts = Vec::new();
    let mut next_branch: FxHashMap<String, usize> = FxHashMap::default();
    let mut take_branch = |wire: &mut String, new_fanouts: &mut Vec<FanoutDesc>| {
        let nb = nb_reads.get(wire.as_str()).copied().unwrap_or(0);
        if nb <= 1 {
            return;
        }
        let stem = wire.clone();
        let i = next_branch.entry(stem.clone()).or_default();
        if *i == 0 {
            new_fanouts.push(FanoutDesc {
                stem: stem.clone(),
                branches: (0..nb).map(|b| branch_name(&stem, b)).collect(),
            });
        }
        *wire = branch_name(&stem, *i);
        *i += 1;
    };
    for g in &mut netlist.gates {
        for i in g.inputs.iter_mut() {
            take_branch(i, &mut new_fanouts);
        }
    }
    for f in &mut netlist.fanouts {
        take_branch(&mut f.stem, &mut new_fanouts);
    }
    netlist.fanouts.extend(new_fanouts);
}

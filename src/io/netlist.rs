//! IO for the plain netlist format
//!
//! One statement per line, keywords are case-insensitive, and `#` starts a comment:
//! ```text
//!     # Gates: AND OR NAND NOR XOR XNOR BUFF NOT
//!     AND out(c), in(a), in(b)
//!     NOT in(c), out(cn)
//!     FANOUT in(cn), out(cn1), out(cn2)
//!     DFF d(cn1), clock(clk), q(q), q_bar(qn)
//!     STUCK_AT c, 0
//! ```
//!
//! Primary inputs and outputs are not declared: wires that are read but never driven are inputs,
//! and wires that are driven but never read are outputs.

use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::error::ParseError;
use crate::network::netlist::{FanoutDesc, FaultDesc, FlipFlopDesc, GateDesc};
use crate::network::{GateType, Netlist};
use crate::Network;

/// A `port(wire)` term of a statement
struct Term {
    port: String,
    wire: String,
}

fn syntax(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        line,
        message: message.into(),
    }
}

fn is_wire_name(s: &str) -> bool {
    !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || "(),#".contains(c))
}

fn parse_wire(line: usize, s: &str) -> Result<String, ParseError> {
    let s = s.trim();
    if is_wire_name(s) {
        Ok(s.to_string())
    } else {
        Err(syntax(line, format!("invalid wire name \"{s}\"")))
    }
}

fn parse_terms(line: usize, rest: &str) -> Result<Vec<Term>, ParseError> {
    rest.split(',')
        .map(|t| {
            let t = t.trim();
            let (port, wire) = t
                .strip_suffix(')')
                .and_then(|t| t.split_once('('))
                .ok_or_else(|| syntax(line, format!("expected port(wire), got \"{t}\"")))?;
            Ok(Term {
                port: port.trim().to_lowercase(),
                wire: parse_wire(line, wire)?,
            })
        })
        .collect()
}

/// Set a port that may appear at most once
fn set_port(line: usize, slot: &mut Option<String>, t: Term) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(syntax(line, format!("port {} given twice", t.port)));
    }
    *slot = Some(t.wire);
    Ok(())
}

fn parse_gate(line: usize, kind: GateType, terms: Vec<Term>) -> Result<GateDesc, ParseError> {
    let mut output = None;
    let mut inputs = Vec::new();
    for t in terms {
        match t.port.as_str() {
            "out" => set_port(line, &mut output, t)?,
            "in" => inputs.push(t.wire),
            p => return Err(syntax(line, format!("unknown gate port {p}"))),
        }
    }
    let output = output.ok_or_else(|| syntax(line, "gate without output"))?;
    if inputs.is_empty() {
        return Err(syntax(line, "gate without input"));
    }
    Ok(GateDesc {
        kind,
        output,
        inputs,
    })
}

fn parse_fanout(line: usize, terms: Vec<Term>) -> Result<(String, Vec<String>), ParseError> {
    let mut stem = None;
    let mut branches = Vec::new();
    for t in terms {
        match t.port.as_str() {
            "in" => set_port(line, &mut stem, t)?,
            "out" => branches.push(t.wire),
            p => return Err(syntax(line, format!("unknown fanout port {p}"))),
        }
    }
    let stem = stem.ok_or_else(|| syntax(line, "fanout without input"))?;
    Ok((stem, branches))
}

fn parse_flip_flop(line: usize, terms: Vec<Term>) -> Result<FlipFlopDesc, ParseError> {
    let mut d = None;
    let mut q = None;
    let mut ret = FlipFlopDesc::default();
    for t in terms {
        match t.port.as_str() {
            "d" => set_port(line, &mut d, t)?,
            "clock" => set_port(line, &mut ret.clock, t)?,
            "q" => set_port(line, &mut q, t)?,
            "q_bar" => set_port(line, &mut ret.q_bar, t)?,
            "preset" => set_port(line, &mut ret.preset, t)?,
            "reset" => set_port(line, &mut ret.reset, t)?,
            p => return Err(syntax(line, format!("unknown flip-flop port {p}"))),
        }
    }
    ret.d = d.ok_or_else(|| syntax(line, "flip-flop without d port"))?;
    ret.q = q.ok_or_else(|| syntax(line, "flip-flop without q port"))?;
    Ok(ret)
}

fn parse_fault(line: usize, rest: &str) -> Result<FaultDesc, ParseError> {
    let (wire, value) = rest
        .split_once(',')
        .ok_or_else(|| syntax(line, "expected STUCK_AT wire, value"))?;
    let value = match value.trim() {
        "0" => false,
        "1" => true,
        v => return Err(syntax(line, format!("stuck-at value must be 0 or 1, got \"{v}\""))),
    };
    Ok(FaultDesc {
        wire: parse_wire(line, wire)?,
        value,
    })
}

/// Read a netlist in the plain netlist format
///
/// Primary inputs and outputs are derived from the structure, sorted by name.
pub fn read_netlist<R: Read>(r: R) -> Result<Netlist, ParseError> {
    let mut ret = Netlist::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let line = i + 1;
        let s = l?;
        let t = match s.split_once('#') {
            Some((before, _)) => before.trim(),
            None => s.trim(),
        };
        if t.is_empty() {
            continue;
        }
        let (keyword, rest) = t.split_once(char::is_whitespace).unwrap_or((t, ""));
        match keyword.to_uppercase().as_str() {
            "STUCK_AT" => ret.faults.push(parse_fault(line, rest)?),
            "DFF" => {
                let ff = parse_flip_flop(line, parse_terms(line, rest)?)?;
                ret.add_flip_flop(ff);
            }
            "FANOUT" => {
                let (stem, branches) = parse_fanout(line, parse_terms(line, rest)?)?;
                ret.fanouts.push(FanoutDesc { stem, branches });
            }
            _ => {
                let kind: GateType = keyword.parse().map_err(|_| ParseError::UnknownGate {
                    line,
                    name: keyword.to_string(),
                })?;
                ret.gates
                    .push(parse_gate(line, kind, parse_terms(line, rest)?)?);
            }
        }
    }
    ret.derive_ports();
    Ok(ret)
}

/// Write a network in the plain netlist format
///
/// Primary inputs and outputs are listed in comments only, as is the initial state of an unrolled
/// network. The file is meant for inspection: reading it back derives the ports from the
/// structure, so a primary output that is also read inside the network is not an output anymore,
/// and the initial state is lost.
pub fn write_netlist<W: Write>(w: &mut W, network: &Network) -> std::io::Result<()> {
    let netlist = network.to_netlist();
    writeln!(w, "# Netlist file")?;
    writeln!(w, "# Generated by datpg")?;
    writeln!(w, "# Inputs: {}", netlist.inputs.iter().join(" "))?;
    writeln!(w, "# Outputs: {}", netlist.outputs.iter().join(" "))?;
    if !network.initial_state().is_empty() {
        let names = network
            .initial_state()
            .iter()
            .map(|s| network.wire_name(*s))
            .join(" ");
        writeln!(w, "# Initial state: {names}")?;
    }
    writeln!(w)?;
    for g in &netlist.gates {
        let inputs = g.inputs.iter().map(|i| format!("in({i})")).join(", ");
        if g.kind == GateType::Not {
            writeln!(w, "NOT {}, out({})", inputs, g.output)?;
        } else {
            writeln!(w, "{} out({}), {}", g.kind, g.output, inputs)?;
        }
    }
    for f in &netlist.fanouts {
        let branches = f.branches.iter().map(|b| format!("out({b})")).join(", ");
        writeln!(w, "FANOUT in({}), {}", f.stem, branches)?;
    }
    for ff in &netlist.flip_flops {
        write!(w, "DFF d({})", ff.d)?;
        if let Some(clock) = &ff.clock {
            write!(w, ", clock({clock})")?;
        }
        write!(w, ", q({})", ff.q)?;
        for (port, wire) in [
            ("q_bar", &ff.q_bar),
            ("preset", &ff.preset),
            ("reset", &ff.reset),
        ] {
            if let Some(wire) = wire {
                write!(w, ", {port}({wire})")?;
            }
        }
        writeln!(w)?;
    }
    for f in &netlist.faults {
        writeln!(w, "STUCK_AT {}, {}", f.wire, i32::from(f.value))?;
    }
    Ok(())
}

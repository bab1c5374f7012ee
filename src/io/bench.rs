//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read};

use crate::error::ParseError;
use crate::network::netlist::{FlipFlopDesc, GateDesc};
use crate::network::unroll::materialize_fanouts;
use crate::network::{GateType, Netlist};

fn syntax(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        line,
        message: message.into(),
    }
}

/// Split a statement into its names, dropping the punctuation
fn split_statement(t: &str) -> Vec<String> {
    t.split(&['=', '(', ',', ')'])
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

fn add_statement(netlist: &mut Netlist, line: usize, parts: Vec<String>) -> Result<(), ParseError> {
    if parts.len() < 3 {
        return Err(syntax(line, "expected output = GATE(inputs)"));
    }
    let mut parts = parts.into_iter();
    let output = parts.next().unwrap_or_default();
    let keyword = parts.next().unwrap_or_default();
    let inputs: Vec<String> = parts.collect();
    if keyword.eq_ignore_ascii_case("DFF") {
        let [d] = <[String; 1]>::try_from(inputs)
            .map_err(|_| syntax(line, "DFF takes a single input"))?;
        netlist.add_flip_flop(FlipFlopDesc {
            d,
            q: output,
            ..Default::default()
        });
        return Ok(());
    }
    let kind: GateType = keyword.parse().map_err(|_| ParseError::UnknownGate {
        line,
        name: keyword.clone(),
    })?;
    netlist.gates.push(GateDesc {
        kind,
        output,
        inputs,
    });
    Ok(())
}

/// Read a network in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUFF(x4)
///     x6 = NOT(x5)
///     x7 = DFF(x6)
///     OUTPUT(x0)
/// ```
///
/// Flip-flops have no clock wire. Wires read by several gates get an explicit fanout, so that
/// faults on each branch can be targeted. No fault is declared.
pub fn read_bench<R: Read>(r: R) -> Result<Netlist, ParseError> {
    let mut ret = Netlist::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let line = i + 1;
        let s = l?;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts = split_statement(t);
            if parts.len() != 2 {
                return Err(syntax(line, format!("expected KEYWORD(wire), got \"{t}\"")));
            }
            match parts[0].to_uppercase().as_str() {
                "INPUT" | "PINPUT" => ret.inputs.push(parts[1].clone()),
                "OUTPUT" | "POUTPUT" => ret.outputs.push(parts[1].clone()),
                _ => {
                    return Err(syntax(line, format!("unknown keyword {}", parts[0])));
                }
            }
        } else {
            add_statement(&mut ret, line, split_statement(t))?;
        }
    }
    materialize_fanouts(&mut ret);
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::read_bench;
    use crate::error::ParseError;
    use crate::network::GateType;
    use crate::Network;

    #[test]
    fn test_basic_read() {
        let example = "# .bench (ISCAS) file
INPUT(i0)
INPUT(i1)

OUTPUT(x0)
OUTPUT(x3)
OUTPUT(x6)

x0 = AND(i0, i1)
x1 = NAND(i0, i1)
x2 = OR(i0, i1)
x3 = NOR(x2, x1)
x4 = XOR(  i0, x5 )
x5   =  DFF(x4)
x6 = NOT(x5)
";
        let netlist = read_bench(example.as_bytes()).unwrap();
        assert_eq!(netlist.inputs, vec!["i0", "i1"]);
        assert_eq!(netlist.outputs, vec!["x0", "x3", "x6"]);
        assert_eq!(netlist.gates.len(), 6);
        assert_eq!(netlist.gates[3].kind, GateType::Nor);
        assert_eq!(netlist.flip_flops.len(), 1);
        assert_eq!(netlist.flip_flops[0].clock, None);
        assert!(netlist.faults.is_empty());

        // i0, i1 and x5 are read by several gates
        assert_eq!(netlist.fanouts.len(), 3);
        assert_eq!(netlist.gates[0].inputs, vec!["i0_branch_1", "i1_branch_1"]);
        assert_eq!(netlist.gates[4].inputs, vec!["i0_branch_4", "x5_branch_1"]);

        let net = Network::from_netlist(&netlist).unwrap();
        net.check();
        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.nb_outputs(), 3);
        assert_eq!(net.nb_flip_flops(), 1);
    }

    #[test]
    fn test_unknown_gate() {
        let example = "INPUT(a)\nOUTPUT(b)\nb = MUX(a, a, a)\n";
        match read_bench(example.as_bytes()) {
            Err(ParseError::UnknownGate { line, name }) => {
                assert_eq!(line, 3);
                assert_eq!(name, "MUX");
            }
            r => panic!("unexpected result {r:?}"),
        }
    }

    #[test]
    fn test_bad_statements() {
        for example in ["INPUT(a, b)", "WIRE(a)", "b = NOT", "b = DFF(a, c)"] {
            assert!(matches!(
                read_bench(example.as_bytes()),
                Err(ParseError::Syntax { line: 1, .. })
            ));
        }
    }
}

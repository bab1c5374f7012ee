use std::fmt;
use std::str::FromStr;

use crate::network::Wire;

/// Logic function of a gate
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum GateType {
    /// N-input And gate
    And,
    /// N-input Or gate
    Or,
    /// Inverter
    Not,
    /// N-input Nand gate
    Nand,
    /// N-input Nor gate
    Nor,
    /// N-input Xor gate
    Xor,
    /// N-input Xnor gate
    Xnor,
    /// Buffer
    Buff,
}

impl GateType {
    /// All gate types
    pub const ALL: [GateType; 8] = [
        GateType::And,
        GateType::Or,
        GateType::Not,
        GateType::Nand,
        GateType::Nor,
        GateType::Xor,
        GateType::Xnor,
        GateType::Buff,
    ];

    /// Input value that alone determines the output, if any
    pub fn controlling_value(&self) -> Option<bool> {
        use GateType::*;
        match self {
            And | Nand => Some(false),
            Or | Nor => Some(true),
            Not | Buff | Xor | Xnor => None,
        }
    }

    /// Input value that lets the other inputs decide the output, if any
    pub fn non_controlling_value(&self) -> Option<bool> {
        self.controlling_value().map(|v| !v)
    }

    /// Returns whether the output is inverted compared to the underlying And/Or/Xor/Buff
    pub fn is_inverting(&self) -> bool {
        matches!(self, GateType::Nand | GateType::Nor | GateType::Not | GateType::Xnor)
    }

    /// Returns whether the gate is a Xor or Xnor
    pub fn is_parity(&self) -> bool {
        matches!(self, GateType::Xor | GateType::Xnor)
    }

    /// Returns whether the gate takes exactly one input
    pub fn is_unary(&self) -> bool {
        matches!(self, GateType::Not | GateType::Buff)
    }

    /// Returns whether a gate of this type may have this number of inputs
    pub fn accepts_arity(&self, arity: usize) -> bool {
        if self.is_unary() {
            arity == 1
        } else {
            arity >= 1
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateType::And => "AND",
            GateType::Or => "OR",
            GateType::Not => "NOT",
            GateType::Nand => "NAND",
            GateType::Nor => "NOR",
            GateType::Xor => "XOR",
            GateType::Xnor => "XNOR",
            GateType::Buff => "BUFF",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GateType {
    type Err = String;

    /// Parse a gate keyword, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AND" => Ok(GateType::And),
            "OR" => Ok(GateType::Or),
            "NOT" => Ok(GateType::Not),
            "NAND" => Ok(GateType::Nand),
            "NOR" => Ok(GateType::Nor),
            "XOR" => Ok(GateType::Xor),
            "XNOR" => Ok(GateType::Xnor),
            "BUFF" | "BUF" => Ok(GateType::Buff),
            _ => Err(format!("Unknown gate type {s}")),
        }
    }
}

/// Logic gate, identified by its output wire
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Gate {
    pub(crate) kind: GateType,
    pub(crate) output: Wire,
    pub(crate) inputs: Box<[Wire]>,
}

impl Gate {
    /// Logic function of the gate
    pub fn kind(&self) -> GateType {
        self.kind
    }

    /// Wire driven by the gate
    pub fn output(&self) -> Wire {
        self.output
    }

    /// Obtain all wires feeding this gate, in order
    pub fn inputs(&self) -> &[Wire] {
        &self.inputs
    }
}

/// Explicit fanout point: the stem value is copied to every branch
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Fanout {
    pub(crate) stem: Wire,
    pub(crate) branches: Box<[Wire]>,
}

impl Fanout {
    /// Wire feeding the fanout
    pub fn stem(&self) -> Wire {
        self.stem
    }

    /// Wires carrying the stem value to each consumer
    pub fn branches(&self) -> &[Wire] {
        &self.branches
    }
}

/// D flip-flop
///
/// Clocking is never simulated: sequential behaviour is handled by time-frame unrolling.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct FlipFlop {
    pub(crate) d: Wire,
    pub(crate) clock: Option<Wire>,
    pub(crate) q: Wire,
    pub(crate) q_bar: Option<Wire>,
    pub(crate) preset: Option<Wire>,
    pub(crate) reset: Option<Wire>,
}

impl FlipFlop {
    /// Data input
    pub fn d(&self) -> Wire {
        self.d
    }

    /// Clock input, if the netlist names one
    pub fn clock(&self) -> Option<Wire> {
        self.clock
    }

    /// State output
    pub fn q(&self) -> Wire {
        self.q
    }

    /// Complementary state output
    pub fn q_bar(&self) -> Option<Wire> {
        self.q_bar
    }

    /// Asynchronous preset input
    pub fn preset(&self) -> Option<Wire> {
        self.preset
    }

    /// Asynchronous reset input
    pub fn reset(&self) -> Option<Wire> {
        self.reset
    }

    /// Obtain all wires read by the flip-flop
    pub fn dependencies(&self) -> impl Iterator<Item = Wire> + '_ {
        std::iter::once(self.d)
            .chain(self.clock)
            .chain(self.preset)
            .chain(self.reset)
    }

    /// Obtain all wires driven by the flip-flop
    pub fn outputs(&self) -> impl Iterator<Item = Wire> + '_ {
        std::iter::once(self.q).chain(self.q_bar)
    }
}

//! Gate evaluation in the five-valued algebra

use crate::network::GateType;
use crate::sim::Value;

fn and3(values: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut ret = Some(true);
    for v in values {
        match v {
            Some(false) => return Some(false),
            None => ret = None,
            Some(true) => (),
        }
    }
    ret
}

fn or3(values: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    and3(values.map(|v| v.map(|b| !b))).map(|b| !b)
}

fn xor3(values: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut ret = false;
    for v in values {
        ret ^= v?;
    }
    Some(ret)
}

/// Evaluate a gate in three-valued logic, with `None` standing for an unknown value
pub fn evaluate<I>(kind: GateType, values: I) -> Option<bool>
where
    I: IntoIterator<Item = Option<bool>>,
{
    use GateType::*;
    let mut values = values.into_iter();
    let base = match kind {
        And | Nand => and3(values),
        Or | Nor => or3(values),
        Xor | Xnor => xor3(values),
        Not | Buff => values.next().flatten(),
    };
    if kind.is_inverting() {
        base.map(|b| !b)
    } else {
        base
    }
}

/// Evaluate a gate on five-valued inputs
///
/// The good and faulty machines are evaluated independently, then recombined.
pub fn simulate(kind: GateType, values: &[Value]) -> Value {
    let good = evaluate(kind, values.iter().map(|v| v.good()));
    let faulty = evaluate(kind, values.iter().map(|v| v.faulty()));
    Value::from_machines(good, faulty)
}

#[cfg(test)]
mod tests {
    use super::{evaluate, simulate};
    use crate::network::GateType;
    use crate::sim::Value;
    use Value::*;

    #[test]
    fn test_and() {
        assert_eq!(simulate(GateType::And, &[One, One]), One);
        assert_eq!(simulate(GateType::And, &[One, D]), D);
        assert_eq!(simulate(GateType::And, &[D, DBar]), Zero);
        assert_eq!(simulate(GateType::And, &[D, D, One]), D);
        assert_eq!(simulate(GateType::And, &[X, Zero]), Zero);
        assert_eq!(simulate(GateType::And, &[X, One]), X);
        assert_eq!(simulate(GateType::And, &[X, D]), X);
        assert_eq!(simulate(GateType::Nand, &[One, D]), DBar);
        assert_eq!(simulate(GateType::Nand, &[Zero, D]), One);
    }

    #[test]
    fn test_or() {
        assert_eq!(simulate(GateType::Or, &[Zero, D]), D);
        assert_eq!(simulate(GateType::Or, &[X, One]), One);
        assert_eq!(simulate(GateType::Or, &[D, DBar]), One);
        assert_eq!(simulate(GateType::Nor, &[Zero, DBar]), D);
        assert_eq!(simulate(GateType::Nor, &[Zero, Zero, Zero]), One);
    }

    #[test]
    fn test_xor() {
        assert_eq!(simulate(GateType::Xor, &[One, D]), DBar);
        assert_eq!(simulate(GateType::Xor, &[D, D]), Zero);
        assert_eq!(simulate(GateType::Xor, &[D, DBar]), One);
        assert_eq!(simulate(GateType::Xor, &[X, Zero]), X);
        assert_eq!(simulate(GateType::Xnor, &[Zero, D]), DBar);
        assert_eq!(simulate(GateType::Xnor, &[One, One, One]), Zero);
    }

    #[test]
    fn test_unary() {
        for v in Value::ALL {
            assert_eq!(simulate(GateType::Buff, &[v]), v);
            assert_eq!(simulate(GateType::Not, &[v]), !v);
        }
    }

    #[test]
    fn test_closure() {
        // Every combination of up to three inputs, compared with bitwise evaluation
        for kind in GateType::ALL {
            let arities: &[usize] = if kind.is_unary() { &[1] } else { &[1, 2, 3] };
            for &arity in arities {
                let nb = Value::ALL.len().pow(arity as u32);
                for mut code in 0..nb {
                    let mut values = Vec::new();
                    for _ in 0..arity {
                        values.push(Value::ALL[code % Value::ALL.len()]);
                        code /= Value::ALL.len();
                    }
                    let out = simulate(kind, &values);
                    assert!(Value::ALL.contains(&out));
                    if let (Some(g), Some(f)) = (out.good(), out.faulty()) {
                        assert_eq!(Some(g), evaluate(kind, values.iter().map(|v| v.good())));
                        assert_eq!(Some(f), evaluate(kind, values.iter().map(|v| v.faulty())));
                    }
                    if values.iter().all(|v| !v.is_fault_effect()) {
                        assert!(!out.is_fault_effect());
                    }
                }
            }
        }
    }
}

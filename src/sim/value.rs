use std::fmt;
use std::ops::Not;
use std::str::FromStr;

/// Five-valued signal, describing the good and the faulty machine at once
///
/// `D` is 1 in the good machine and 0 in the faulty machine; `!D` is the opposite.
/// Recombining a known value with an unknown one gives `X`: a value that is known in one machine
/// only is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Value {
    /// Zero in both machines
    Zero,
    /// One in both machines
    One,
    /// Unknown
    #[default]
    X,
    /// One in the good machine, zero in the faulty machine
    D,
    /// Zero in the good machine, one in the faulty machine
    DBar,
}

impl Value {
    /// All five values
    pub const ALL: [Value; 5] = [Value::Zero, Value::One, Value::X, Value::D, Value::DBar];

    /// Plain value from a boolean
    pub fn from_bool(b: bool) -> Value {
        if b {
            Value::One
        } else {
            Value::Zero
        }
    }

    /// Combine the values of the good and faulty machines
    pub fn from_machines(good: Option<bool>, faulty: Option<bool>) -> Value {
        match (good, faulty) {
            (Some(false), Some(false)) => Value::Zero,
            (Some(true), Some(true)) => Value::One,
            (Some(true), Some(false)) => Value::D,
            (Some(false), Some(true)) => Value::DBar,
            _ => Value::X,
        }
    }

    /// Value that activates a stuck-at fault: `D` for stuck-at-0, `!D` for stuck-at-1
    pub fn activation(stuck: bool) -> Value {
        if stuck {
            Value::DBar
        } else {
            Value::D
        }
    }

    /// Value in the good machine
    pub fn good(&self) -> Option<bool> {
        match self {
            Value::Zero | Value::DBar => Some(false),
            Value::One | Value::D => Some(true),
            Value::X => None,
        }
    }

    /// Value in the faulty machine
    pub fn faulty(&self) -> Option<bool> {
        match self {
            Value::Zero | Value::D => Some(false),
            Value::One | Value::DBar => Some(true),
            Value::X => None,
        }
    }

    /// Boolean value if the signal is the same in both machines
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Zero => Some(false),
            Value::One => Some(true),
            _ => None,
        }
    }

    /// Returns whether the value is not X
    pub fn is_known(&self) -> bool {
        *self != Value::X
    }

    /// Returns whether the value differs between the good and faulty machines
    pub fn is_fault_effect(&self) -> bool {
        matches!(self, Value::D | Value::DBar)
    }

    /// Value seen downstream of a wire stuck at the given value, when its driver produces self
    pub fn inject(&self, stuck: bool) -> Value {
        Value::from_machines(self.good(), self.good().map(|_| stuck))
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Value {
        match self {
            Value::Zero => Value::One,
            Value::One => Value::Zero,
            Value::X => Value::X,
            Value::D => Value::DBar,
            Value::DBar => Value::D,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::from_bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Value::Zero => "0",
            Value::One => "1",
            Value::X => "X",
            Value::D => "D",
            Value::DBar => "!D",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Value::Zero),
            "1" => Ok(Value::One),
            "X" | "x" | "-" => Ok(Value::X),
            "D" | "d" => Ok(Value::D),
            "!D" | "!d" | "D'" => Ok(Value::DBar),
            _ => Err(format!("Unknown signal value {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn test_machines() {
        for v in Value::ALL {
            assert_eq!(Value::from_machines(v.good(), v.faulty()), v);
            assert_eq!(v.to_string().parse::<Value>(), Ok(v));
            assert_eq!(!!v, v);
        }
        assert_eq!(Value::from_machines(Some(true), None), Value::X);
        assert_eq!(Value::from_machines(None, Some(false)), Value::X);
    }

    #[test]
    fn test_inject() {
        assert_eq!(Value::One.inject(false), Value::D);
        assert_eq!(Value::Zero.inject(false), Value::Zero);
        assert_eq!(Value::Zero.inject(true), Value::DBar);
        assert_eq!(Value::D.inject(true), Value::One);
        assert_eq!(Value::DBar.inject(true), Value::DBar);
        assert_eq!(Value::X.inject(true), Value::X);
        assert_eq!(Value::activation(false), Value::D);
        assert_eq!(Value::activation(true), Value::DBar);
    }
}

use crate::network::Wire;
use crate::sim::Value;
use crate::Network;

/// Values of all wires of a network during a search
///
/// Values only ever go from X to a known value; a conflicting assignment is refused. Every
/// assignment is recorded on a trail, so that a search can return to an earlier point with
/// [`mark`](CircuitState::mark) and [`undo`](CircuitState::undo) in time proportional to the
/// number of assignments undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitState {
    values: Vec<Value>,
    trail: Vec<Wire>,
}

/// Full copy of a [`CircuitState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    values: Vec<Value>,
    trail: Vec<Wire>,
}

impl CircuitState {
    /// State with all wires of the network unknown
    pub fn new(network: &Network) -> CircuitState {
        CircuitState::with_wires(network.nb_wires())
    }

    /// State with the given number of wires, all unknown
    pub fn with_wires(nb_wires: usize) -> CircuitState {
        CircuitState {
            values: vec![Value::X; nb_wires],
            trail: Vec::new(),
        }
    }

    /// Return the number of wires
    pub fn nb_wires(&self) -> usize {
        self.values.len()
    }

    /// Current value of a wire
    pub fn get(&self, w: Wire) -> Value {
        self.values[w.index()]
    }

    /// Values of all wires, by wire index
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Wires with a known value, in the order they were assigned
    pub fn assigned(&self) -> &[Wire] {
        &self.trail
    }

    /// Assign a value to a wire
    ///
    /// Returns false, without any change, if the wire already holds a different known value.
    /// Assigning X or the current value is a no-op.
    pub fn assign(&mut self, w: Wire, v: Value) -> bool {
        let cur = self.values[w.index()];
        if v == Value::X || cur == v {
            true
        } else if cur == Value::X {
            self.values[w.index()] = v;
            self.trail.push(w);
            true
        } else {
            false
        }
    }

    /// Current position in the trail of assignments
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Reset to X every wire assigned since the mark was taken
    pub fn undo(&mut self, mark: usize) {
        assert!(mark <= self.trail.len());
        for w in self.trail.drain(mark..) {
            self.values[w.index()] = Value::X;
        }
    }

    /// Copy the whole state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.values.clone(),
            trail: self.trail.clone(),
        }
    }

    /// Overwrite the whole state with a copy
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.values.clone_from(&snapshot.values);
        self.trail.clone_from(&snapshot.trail);
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert_eq!(
            self.trail.len(),
            self.values.iter().filter(|v| v.is_known()).count()
        );
        for w in &self.trail {
            assert!(self.values[w.index()].is_known());
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::CircuitState;
    use crate::network::Wire;
    use crate::sim::Value;

    #[test]
    fn test_assign() {
        let mut state = CircuitState::with_wires(3);
        let w = Wire::from_index(1);
        assert!(state.assign(w, Value::X));
        assert_eq!(state.get(w), Value::X);
        assert!(state.assign(w, Value::D));
        assert!(state.assign(w, Value::D));
        assert!(!state.assign(w, Value::One));
        assert!(state.assign(w, Value::X));
        assert_eq!(state.get(w), Value::D);
        state.check();
    }

    #[test]
    fn test_undo() {
        let mut state = CircuitState::with_wires(4);
        state.assign(Wire::from_index(0), Value::One);
        let mark = state.mark();
        state.assign(Wire::from_index(2), Value::Zero);
        state.assign(Wire::from_index(3), Value::DBar);
        assert_eq!(state.assigned().len(), 3);
        state.undo(mark);
        assert_eq!(
            state.values(),
            &[Value::One, Value::X, Value::X, Value::X]
        );
        state.check();
    }

    fn value() -> impl Strategy<Value = Value> {
        prop::sample::select(Value::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A known value never changes to another known value
        #[test]
        fn assignment_is_monotonic(ops in prop::collection::vec((0usize..8, value()), 0..64)) {
            let mut state = CircuitState::with_wires(8);
            let mut first: Vec<Option<Value>> = vec![None; 8];
            for (i, v) in ops {
                let w = Wire::from_index(i);
                let ok = state.assign(w, v);
                match first[i] {
                    Some(f) => {
                        prop_assert_eq!(state.get(w), f);
                        prop_assert_eq!(ok, v == f || v == Value::X);
                    }
                    None => {
                        prop_assert!(ok);
                        if v.is_known() {
                            first[i] = Some(v);
                        }
                    }
                }
            }
            state.check();
        }

        /// Restoring a snapshot gives back the same values, whatever happened in between
        #[test]
        fn snapshot_restore(
            before in prop::collection::vec((0usize..8, value()), 0..16),
            after in prop::collection::vec((0usize..8, value()), 0..16),
        ) {
            let mut state = CircuitState::with_wires(8);
            for (i, v) in before {
                state.assign(Wire::from_index(i), v);
            }
            let snapshot = state.snapshot();
            let copy = state.clone();
            let mark = state.mark();
            for (i, v) in after {
                state.assign(Wire::from_index(i), v);
            }
            let mut undone = state.clone();
            undone.undo(mark);
            state.restore(&snapshot);
            prop_assert_eq!(&state, &copy);
            prop_assert_eq!(&undone, &copy);
        }
    }
}

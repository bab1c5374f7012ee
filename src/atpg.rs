//! Test pattern generation
//!
//! The core is the [D-algorithm](dalg), a backtracking search over the five-valued
//! [`Value`]s of a [`CircuitState`], driven by the [implication engine](implication).
//! Sequential networks are handled by [time-frame unrolling](crate::network::unroll).
//!
//! ```
//! # use datpg::network::generators::testcases;
//! use datpg::atpg::{search, Outcome, SearchConfig};
//! use datpg::sim::Value;
//!
//! let network = testcases::and_gate(2);
//! let fault = network.fault("z", false).unwrap();
//! let Ok(Outcome::Detected(pattern)) = search(&network, fault, &SearchConfig::default()) else {
//!     panic!("And gate output is testable");
//! };
//! assert_eq!(pattern.get("i0"), Some(Value::One));
//! ```

pub mod dalg;
pub mod implication;
pub mod sequential;
mod state;

use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::{AtpgError, NetworkError};
use crate::network::unroll::unroll;
use crate::sim::{Fault, Value};
use crate::Network;

pub use dalg::{search, DAlgorithm, Outcome, ParityDrive, SearchConfig, TestPattern};
pub use implication::{imply_and_check, Contradiction};
pub use sequential::{find_sequential_test, TestSequence};
pub use state::{CircuitState, Snapshot};

/// Expose flip-flops as inputs for ATPG
///
/// Flip-flop outputs are exposed as primary inputs and their data inputs become primary outputs,
/// as if the flip-flops were on a scan chain. Complementary outputs are driven by an inverter.
/// Clocks disappear.
pub fn expose_flip_flops(network: &Network) -> Result<Network, NetworkError> {
    unroll(network, 1)
}

/// How unassigned inputs of a test are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// Leave them X
    #[default]
    Keep,
    /// Set them to 0
    Zero,
    /// Set them to random values from a seed
    Random(u64),
}

/// Options of the test pattern generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtpgOptions {
    /// Maximum number of time-frames for sequential networks
    pub max_frames: usize,
    /// Configuration of each search
    pub search: SearchConfig,
    /// Filling of unassigned inputs
    pub fill: FillPolicy,
    /// Treat flip-flops as scan cells instead of unrolling
    pub scan: bool,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for AtpgOptions {
    fn default() -> Self {
        AtpgOptions {
            max_frames: 10,
            search: SearchConfig::default(),
            fill: FillPolicy::Keep,
            scan: false,
            progress: false,
        }
    }
}

/// Result for one fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    /// Human-readable name of the fault
    pub name: String,
    /// The fault, in the analyzed network
    pub fault: Fault,
    /// Test sequence found, or why there is none
    pub outcome: Outcome<TestSequence>,
}

/// Results of test pattern generation on a whole network
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtpgReport {
    /// Per-fault results, in the order of the fault list
    pub faults: Vec<FaultReport>,
}

impl AtpgReport {
    /// Return the number of faults
    pub fn nb_faults(&self) -> usize {
        self.faults.len()
    }

    /// Return the number of faults with a test
    pub fn nb_detected(&self) -> usize {
        self.faults
            .iter()
            .filter(|f| f.outcome.is_detected())
            .count()
    }

    /// Return the number of faults proven untestable
    pub fn nb_untestable(&self) -> usize {
        self.faults
            .iter()
            .filter(|f| f.outcome == Outcome::Untestable)
            .count()
    }

    /// Return the number of faults where the search gave up
    pub fn nb_aborted(&self) -> usize {
        self.faults
            .iter()
            .filter(|f| f.outcome == Outcome::BoundExceeded)
            .count()
    }

    /// Percentage of detected faults
    pub fn coverage(&self) -> f64 {
        if self.faults.is_empty() {
            return 100.0;
        }
        100.0 * (self.nb_detected() as f64) / (self.nb_faults() as f64)
    }
}

/// Fill the X values of a sequence according to the policy
fn fill_sequence(seq: &mut TestSequence, rng: &mut Option<SmallRng>, fill: FillPolicy) {
    for p in seq.frames_mut() {
        for v in p.values_mut() {
            if v.is_known() {
                continue;
            }
            *v = match (fill, rng.as_mut()) {
                (FillPolicy::Zero, _) => Value::Zero,
                (FillPolicy::Random(_), Some(rng)) => Value::from_bool(rng.gen()),
                _ => Value::X,
            };
        }
    }
}

/// Generate a test for each fault
///
/// Faults are searched independently. Combinatorial networks use the D-algorithm directly;
/// sequential networks are unrolled, or have their flip-flops exposed if the `scan` option is set.
/// Faults refer to the wires of `network`.
pub fn generate_test_patterns(
    network: &Network,
    faults: &[Fault],
    options: &AtpgOptions,
) -> Result<AtpgReport, AtpgError> {
    let exposed = if options.scan && !network.is_comb() {
        Some(expose_flip_flops(network)?)
    } else {
        None
    };
    let mut rng = match options.fill {
        FillPolicy::Random(seed) => Some(SmallRng::seed_from_u64(seed)),
        _ => None,
    };
    info!(
        "Analyzing network with {} inputs, {} outputs, {} flip-flops and {} faults",
        network.nb_inputs(),
        network.nb_outputs(),
        network.nb_flip_flops(),
        faults.len()
    );

    let mut progress = options.progress.then(|| {
        let mut bar = tqdm!(total = faults.len());
        bar.set_description("Faults processed");
        bar
    });
    let mut report = AtpgReport::default();
    for (i, fault) in faults.iter().enumerate() {
        let name = network.fault_name(fault);
        let mut outcome = if let Some(exposed) = &exposed {
            match exposed.fault(network.wire_name(fault.wire), fault.value) {
                Some(f) => search(exposed, f, &options.search)?.map(TestSequence::from),
                None => {
                    warn!("{} does not exist once flip-flops are exposed", name);
                    Outcome::Untestable
                }
            }
        } else if network.is_comb() {
            search(network, *fault, &options.search)?.map(TestSequence::from)
        } else {
            find_sequential_test(network, *fault, options.max_frames, &options.search)?
        };
        if let Outcome::Detected(seq) = &mut outcome {
            fill_sequence(seq, &mut rng, options.fill);
        }
        report.faults.push(FaultReport {
            name,
            fault: *fault,
            outcome,
        });
        if let Some(bar) = &mut progress {
            bar.set_postfix(format!(
                "detected={} untestable={} aborted={}",
                report.nb_detected(),
                report.nb_untestable(),
                report.nb_aborted()
            ));
            let _ = bar.update_to(i + 1);
        }
    }
    info!(
        "Detected {}/{} faults ({:.2}% coverage), {} untestable, {} aborted",
        report.nb_detected(),
        report.nb_faults(),
        report.coverage(),
        report.nb_untestable(),
        report.nb_aborted()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{generate_test_patterns, AtpgOptions, FillPolicy, Outcome};
    use crate::network::generators::testcases;
    use crate::sim::{detects_fault, Value};

    #[test]
    fn test_comb_report() {
        let net = testcases::redundant_and();
        let report =
            generate_test_patterns(&net, &net.all_faults(), &AtpgOptions::default()).unwrap();
        assert_eq!(report.nb_faults(), net.all_faults().len());
        assert_eq!(
            report.nb_detected() + report.nb_untestable() + report.nb_aborted(),
            report.nb_faults()
        );
        assert_eq!(report.nb_aborted(), 0);
        let c = report
            .faults
            .iter()
            .find(|f| f.name == "c stuck-at-0")
            .unwrap();
        assert_eq!(c.outcome, Outcome::Untestable);
    }

    #[test]
    fn test_fill() {
        let net = testcases::fanout_and();
        let fault = net.fault("s", false).unwrap();
        for fill in [FillPolicy::Zero, FillPolicy::Random(1)] {
            let options = AtpgOptions {
                fill,
                ..AtpgOptions::default()
            };
            let report = generate_test_patterns(&net, &[fault], &options).unwrap();
            let Outcome::Detected(seq) = &report.faults[0].outcome else {
                panic!("fault should be detected");
            };
            let p = &seq.frames()[0];
            assert!(p.values().iter().all(|v| v.is_known()));
            assert!(detects_fault(&net, p.values(), fault));
        }
    }

    #[test]
    fn test_sequential_and_scan() {
        let net = testcases::sequential_and();
        let fault = net.faults()[0];
        let report = generate_test_patterns(&net, &[fault], &AtpgOptions::default()).unwrap();
        let Outcome::Detected(seq) = &report.faults[0].outcome else {
            panic!("fault should be detected");
        };
        assert_eq!(seq.len(), 2);

        // With scan, the state is an input and a single pattern is enough
        let options = AtpgOptions {
            scan: true,
            ..AtpgOptions::default()
        };
        let report = generate_test_patterns(&net, &[fault], &options).unwrap();
        let Outcome::Detected(seq) = &report.faults[0].outcome else {
            panic!("fault should be detected");
        };
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.frames()[0].get("q"), Some(Value::Zero));
    }
}

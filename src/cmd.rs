//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use datpg::atpg::{
    generate_test_patterns, AtpgOptions, FillPolicy, Outcome, ParityDrive, SearchConfig,
};
use datpg::io::{read_network_file, write_network_file, write_report_file};
use datpg::network::stats::stats;
use datpg::network::unroll::unroll;
use datpg::Result;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a logic network
    ///
    /// Will print statistics on the number of inputs, outputs, gates and flip-flops in the network.
    #[clap()]
    Show(ShowArgs),

    /// Test pattern generation for a logic network
    ///
    /// Generate a test for each single stuck-at fault with the D-algorithm. Faults declared in
    /// the netlist are targeted; if there are none, both faults on every wire are.
    ///
    /// Sequential networks are unrolled over multiple clock cycles, starting from an unknown
    /// state, unless flip-flops are assumed to be on a scan chain.
    #[clap()]
    Atpg(AtpgArgs),

    /// Unroll a sequential network over several clock cycles
    ///
    /// Writes the combinatorial network obtained by copying the logic once per cycle. Wires of
    /// older cycles are suffixed with the number of cycles before the last one. The result is
    /// meant for inspection: logic of older cycles that nothing reads is dropped, and the wires
    /// holding the initial state are only listed in a comment.
    #[clap()]
    Unroll(UnrollArgs),
}

/// Command arguments for network informations
#[derive(Args)]
pub struct ShowArgs {
    /// Network to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> Result<()> {
        let network = read_network_file(&self.file)?;
        println!("Network stats:\n{}\n\n", stats(&network));
        Ok(())
    }
}

/// Filling of unassigned inputs in the test patterns
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fill {
    /// Keep X values
    Keep,
    /// Replace X values by 0
    Zero,
    /// Replace X values by random bits
    Random,
}

/// Value tried first on the side inputs of Xor gates
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Parity {
    /// 0, then 1
    Zero,
    /// 1, then 0
    One,
}

/// Command arguments for test pattern generation
#[derive(Args)]
pub struct AtpgArgs {
    /// Network to write test patterns for
    network: PathBuf,

    /// Output file for test patterns
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Assume that flip-flops are on a scan chain
    #[arg(long)]
    scan: bool,

    /// Maximum number of clock cycles for sequential networks
    #[arg(short = 'c', long, default_value_t = 10)]
    max_frames: usize,

    /// Maximum number of decisions for each fault
    #[arg(long, default_value_t = 100_000)]
    decision_limit: usize,

    /// Value tried first on the side inputs of Xor gates
    #[arg(long, value_enum, default_value_t = Parity::Zero)]
    parity: Parity,

    /// Filling of unassigned inputs
    #[arg(long, value_enum, default_value_t = Fill::Keep)]
    fill: Fill,

    /// Random seed for random filling
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl AtpgArgs {
    fn options(&self) -> AtpgOptions {
        let fill = match self.fill {
            Fill::Keep => FillPolicy::Keep,
            Fill::Zero => FillPolicy::Zero,
            Fill::Random => FillPolicy::Random(self.seed),
        };
        let parity_drive = match self.parity {
            Parity::Zero => ParityDrive::Zero,
            Parity::One => ParityDrive::One,
        };
        AtpgOptions {
            max_frames: self.max_frames,
            search: SearchConfig {
                decision_limit: self.decision_limit,
                parity_drive,
            },
            fill,
            scan: self.scan,
            progress: !self.no_progress,
        }
    }

    pub fn run(&self) -> Result<()> {
        let network = read_network_file(&self.network)?;
        let faults = if network.faults().is_empty() {
            info!("No fault declared, targeting all stuck-at faults");
            network.all_faults()
        } else {
            network.faults().to_vec()
        };
        let report = generate_test_patterns(&network, &faults, &self.options())?;
        println!(
            "Detected {}/{} faults ({:.2}% coverage), {} untestable, {} aborted",
            report.nb_detected(),
            report.nb_faults(),
            report.coverage(),
            report.nb_untestable(),
            report.nb_aborted()
        );
        match &self.output {
            Some(path) => write_report_file(path, &report)?,
            None => {
                for f in &report.faults {
                    match &f.outcome {
                        Outcome::Detected(seq) => println!("{}: {}", f.name, seq),
                        Outcome::Untestable => println!("{}: untestable", f.name),
                        Outcome::BoundExceeded => println!("{}: aborted", f.name),
                    }
                }
            }
        }
        Ok(())
    }
}

/// Command arguments for unrolling
#[derive(Args)]
pub struct UnrollArgs {
    /// Network to unroll
    network: PathBuf,

    /// Output file for the unrolled network
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Number of clock cycles
    #[arg(short = 'n', long, default_value_t = 1)]
    num_frames: usize,
}

impl UnrollArgs {
    pub fn run(&self) -> Result<()> {
        let network = read_network_file(&self.network)?;
        let unrolled = unroll(&network, self.num_frames)?;
        info!(
            "Unrolled into {} cycles: {} inputs, {} outputs, {} gates",
            self.num_frames,
            unrolled.nb_inputs(),
            unrolled.nb_outputs(),
            unrolled.nb_gates()
        );
        write_network_file(&self.output, &unrolled)
    }
}

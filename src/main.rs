mod cmd;

use clap::Parser;
use cmd::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let res = match cli.command {
        Commands::Show(a) => a.run(),
        Commands::Atpg(a) => a.run(),
        Commands::Unroll(a) => a.run(),
    };
    if let Err(e) = res {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

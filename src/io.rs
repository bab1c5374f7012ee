//! Read and write networks and test patterns to files

mod bench;
mod netlist;
mod patterns;

use std::fs::File;
use std::path::Path;

pub use bench::read_bench;
pub use netlist::{read_netlist, write_netlist};
pub use patterns::write_report;

use crate::atpg::AtpgReport;
use crate::error::{ParseError, Result};
use crate::network::Netlist;
use crate::Network;

enum Format {
    Netlist,
    Bench,
}

fn format(path: &Path) -> std::result::Result<Format, ParseError> {
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "net" => Ok(Format::Netlist),
        "bench" => Ok(Format::Bench),
        _ => Err(ParseError::UnknownExtension(ext)),
    }
}

/// Read a netlist description from a file
///
/// Following extensions are supported: .txt and .net (plain netlist), .bench
pub fn read_netlist_file(path: &Path) -> std::result::Result<Netlist, ParseError> {
    let format = format(path)?;
    let f = File::open(path)?;
    match format {
        Format::Netlist => read_netlist(f),
        Format::Bench => read_bench(f),
    }
}

/// Read a network from a file, checking that it is well-formed
///
/// Following extensions are supported: .txt and .net (plain netlist), .bench
pub fn read_network_file(path: &Path) -> Result<Network> {
    let netlist = read_netlist_file(path)?;
    Ok(Network::from_netlist(&netlist)?)
}

/// Write a network to a file
///
/// Only the plain netlist format is supported for writing: .txt or .net
pub fn write_network_file(path: &Path, network: &Network) -> Result<()> {
    match format(path)? {
        Format::Netlist => {
            let mut f = File::create(path)?;
            write_netlist(&mut f, network)?;
            Ok(())
        }
        Format::Bench => Err(ParseError::UnknownExtension("bench".to_string()).into()),
    }
}

/// Write the results of test pattern generation to a file
pub fn write_report_file(path: &Path, report: &AtpgReport) -> Result<()> {
    let mut f = File::create(path)?;
    write_report(&mut f, report)?;
    Ok(())
}

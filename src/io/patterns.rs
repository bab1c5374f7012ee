//! IO for test pattern reports

use std::io::Write;

use itertools::Itertools;

use crate::atpg::{AtpgReport, Outcome};

/// Write the results of test pattern generation
///
/// Each fault gets a status line. A detected fault is followed by one line per clock cycle, with
/// one character per input in the order given in the header, similar to Atalanta's format:
/// ```text
///     # Inputs: a b
///     n stuck-at-0: detected in 2 cycles
///     1: 0X
///     2: 11
///     c stuck-at-0: untestable
/// ```
pub fn write_report<W: Write>(w: &mut W, report: &AtpgReport) -> std::io::Result<()> {
    writeln!(w, "# Test patterns")?;
    writeln!(w, "# Generated by datpg")?;
    let names = report.faults.iter().find_map(|f| match &f.outcome {
        Outcome::Detected(seq) => seq.frames().first().map(|p| p.names().join(" ")),
        _ => None,
    });
    writeln!(w, "# Inputs: {}", names.unwrap_or_default())?;
    writeln!(
        w,
        "# Detected {}/{} faults ({:.2}% coverage), {} untestable, {} aborted",
        report.nb_detected(),
        report.nb_faults(),
        report.coverage(),
        report.nb_untestable(),
        report.nb_aborted()
    )?;
    writeln!(w)?;
    for f in &report.faults {
        match &f.outcome {
            Outcome::Detected(seq) => {
                writeln!(w, "{}: detected in {} cycles", f.name, seq.len())?;
                for (i, p) in seq.frames().iter().enumerate() {
                    writeln!(w, "{}: {}", i + 1, p.values().iter().join(""))?;
                }
            }
            Outcome::Untestable => writeln!(w, "{}: untestable", f.name)?,
            Outcome::BoundExceeded => writeln!(w, "{}: aborted", f.name)?,
        }
    }
    Ok(())
}

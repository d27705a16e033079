//! CSV export for simulation history.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::Sample;

/// Column header for CSV history export.
const HEADER: &str = "iteration,time_s,voltage_v,current_a,power_w,operating_point,\
                       irradiance_w_m2,temperature_c,max_power_w,efficiency_pct";

/// Exports samples to a CSV file at the given path.
///
/// Writes a header row followed by one data row per sample. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `samples` - Run history
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(samples: &[Sample], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(samples, buf)
}

/// Writes samples as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(samples: &[Sample], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in samples {
        wtr.write_record(&[
            s.iteration.to_string(),
            format!("{:.3}", s.time_s),
            format!("{:.4}", s.voltage),
            format!("{:.4}", s.current),
            format!("{:.4}", s.power),
            format!("{:.4}", s.operating_point),
            format!("{:.1}", s.irradiance),
            format!("{:.2}", s.temperature),
            format!("{:.4}", s.max_power),
            format!("{:.2}", s.efficiency_pct()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

//! CSV export of the hourly dispatch result.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::EnergyResult;

/// Fixed leading columns; one `<id>_kw` column per producer follows.
const HEADER: &[&str] = &[
    "hour",
    "load_kw",
    "supplied_kw",
    "net_supply_kw",
    "buffer_discharge_kw",
    "buffer_charge_kw",
    "buffer_loss_kw",
    "buffer_capacity_kwh",
    "unmet_kw",
];

/// Exports the hourly result to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(result: &EnergyResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(result, buf)
}

/// Writes the hourly result as CSV to any writer.
///
/// Output is deterministic for identical results.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(result: &EnergyResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let producer_columns = result.producer_ids.iter().map(|id| format!("{id}_kw"));
    wtr.write_record(
        HEADER
            .iter()
            .map(|h| (*h).to_string())
            .chain(producer_columns),
    )?;

    for hour in 0..result.load_curve.len() {
        let mut row = vec![
            hour.to_string(),
            format!("{:.4}", result.load_curve[hour]),
            format!("{:.4}", result.supplied_power[hour]),
            format!("{:.4}", result.net_supply[hour]),
            format!("{:.4}", result.supplied_buffer_heat[hour]),
            format!("{:.4}", result.buffer_charged[hour]),
            format!("{:.4}", result.buffer_loss[hour]),
            format!("{:.4}", result.buffer_capacity[hour]),
            format!("{:.4}", result.unmet_load[hour]),
        ];
        row.extend(
            result
                .producer_results
                .iter()
                .map(|series| format!("{:.4}", series[hour])),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

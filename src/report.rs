//! CSV export of projection schedules for charting

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::projection::{MonthRow, MonthlySchedule};

/// Row granularity of an exported schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// One row per month
    #[default]
    Monthly,
    /// One row per loan year (months 12, 24, ...)
    Yearly,
}

impl Resolution {
    /// Rows of the schedule at this resolution
    pub fn rows<'a>(&self, schedule: &'a MonthlySchedule) -> Vec<&'a MonthRow> {
        match self {
            Resolution::Monthly => schedule.rows().iter().collect(),
            Resolution::Yearly => schedule.year_end_rows().collect(),
        }
    }
}

/// Write schedule rows as CSV with a header line
pub fn write_schedule_csv<W: Write>(
    writer: W,
    schedule: &MonthlySchedule,
    resolution: Resolution,
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in resolution.rows(schedule) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write schedule rows to a CSV file
pub fn write_schedule_csv_file<P: AsRef<Path>>(
    path: P,
    schedule: &MonthlySchedule,
    resolution: Resolution,
) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_schedule_csv(file, schedule, resolution)
}

/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// stats module
//
// writes the per-checkpoint state counts to a csv log
//
////////////////////////////////////////////////////////////////////////////////////

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::prelude::Write;
use std::path::{Path, PathBuf};

use crate::disease::{HealthState, PopulationSize, Timestamp};
use crate::world::{aggregate, Location, Summary};
use crate::ModelError;

/// One csv row: the state counts of one location (or the aggregate) at one
/// checkpoint.
#[derive(Debug, Serialize)]
pub struct SummaryRecord {
    pub time: Timestamp,
    pub location: String,
    pub susceptible: PopulationSize,
    pub exposed: PopulationSize,
    pub infectious: PopulationSize,
    pub hospitalized: PopulationSize,
    pub critical: PopulationSize,
    pub recovered: PopulationSize,
    pub deceased: PopulationSize,
}

impl SummaryRecord {
    pub fn new(time: Timestamp, location: &str, summary: &Summary) -> SummaryRecord {
        SummaryRecord {
            time,
            location: String::from(location),
            susceptible: summary.get(HealthState::Susceptible),
            exposed: summary.get(HealthState::Exposed),
            infectious: summary.get(HealthState::Infectious),
            hospitalized: summary.get(HealthState::Hospitalized),
            critical: summary.get(HealthState::Critical),
            recovered: summary.get(HealthState::Recovered),
            deceased: summary.get(HealthState::Deceased),
        }
    }

    /// One row per location plus a combined "All" row.
    pub fn from_checkpoint(time: Timestamp, locations: &[Location]) -> Vec<SummaryRecord> {
        let mut records: Vec<SummaryRecord> = Vec::with_capacity(locations.len() + 1);
        for loc in locations {
            records.push(SummaryRecord::new(
                time,
                &loc.place().to_string(),
                loc.report(),
            ));
        }
        records.push(SummaryRecord::new(time, "All", &aggregate(locations)));
        records
    }

    fn header() -> &'static [u8] {
        b"time,location,susceptible,exposed,infectious,hospitalized,critical,recovered,deceased\n"
    }
}

pub struct SummaryLog {
    file_path: PathBuf,
}

impl SummaryLog {
    /// Create the log file and write the header line.
    pub fn new(file_path: &Path) -> Result<SummaryLog, ModelError> {
        let mut file = File::create(file_path)?;
        file.write_all(SummaryRecord::header())?;
        Ok(SummaryLog {
            file_path: file_path.to_path_buf(),
        })
    }

    pub fn append(&self, records: &[SummaryRecord]) -> Result<(), ModelError> {
        let file = OpenOptions::new().append(true).open(&self.file_path)?;
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

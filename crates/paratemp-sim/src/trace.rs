use std::error::Error;
use std::path::Path;

use paratemp_engine::Replica;
use serde::Serialize;

/// One slot of the ensemble after a settled iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub iteration: usize,
    pub slot: usize,
    pub temperature: f64,
    pub state: f64,
    pub energy: f64,
}

/// Collects per-iteration snapshots of a scalar ensemble.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    rows: Vec<TraceRow>,
}

impl TraceRecorder {
    pub fn record(&mut self, iteration: usize, replicas: &[Replica<f64>]) {
        self.rows.extend(replicas.iter().map(|replica| TraceRow {
            iteration,
            slot: replica.index(),
            temperature: replica.temperature(),
            state: *replica.state(),
            energy: replica.energy(),
        }));
    }

    /// States visited by the coldest slot, one per iteration.
    pub fn cold_trajectory(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .filter(|row| row.slot == 0)
            .map(|row| row.state)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use crate::config::{Settings, SourceKind};

pub mod csv_files;
pub mod synthetic;

pub use csv_files::*;
pub use synthetic::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Medium => "Medium",
            CongestionLevel::High => "High",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CongestionLevel {
    type Err = SourceError;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CongestionLevel::Low),
            "medium" => Ok(CongestionLevel::Medium),
            "high" => Ok(CongestionLevel::High),
            _ => Err(SourceError::UnknownCongestionLevel(s.to_string())),
        }
    }
}

/// One logged observation at a toll gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    pub timestamp: NaiveDateTime,
    pub vehicle_count: u32,
    pub average_speed_kmh: f64,
    pub congestion_level: CongestionLevel,
    pub hour: u32,
    pub minute: u32,
    /// Monday = 0
    pub day_of_week: u32,
}

impl TrafficRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        vehicle_count: u32,
        average_speed_kmh: f64,
        congestion_level: CongestionLevel,
    ) -> Self {
        Self {
            timestamp,
            vehicle_count,
            average_speed_kmh,
            congestion_level,
            hour: timestamp.hour(),
            minute: timestamp.minute(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to read traffic data: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),
    #[error("unknown congestion level '{0}'")]
    UnknownCongestionLevel(String),
    #[error("invalid average speed {0} km/h")]
    InvalidSpeed(f64),
}

/// Yields the historical records of a single gate.
///
/// `Ok(None)` means the gate simply has no data, which is not an error.
pub trait RecordSource {
    fn load_gate(&self, gate_id: &str) -> Result<Option<Vec<TrafficRecord>>, SourceError>;
    fn get_name(&self) -> &'static str;
}

pub enum DataSource {
    Csv(CsvDirectorySource),
    Synthetic(SyntheticSource),
}

impl DataSource {
    pub fn from_settings(settings: &Settings, seed: Option<u64>) -> Self {
        match settings.data.source {
            SourceKind::Csv => DataSource::Csv(CsvDirectorySource::new(&settings.data.directory)),
            SourceKind::Synthetic => {
                let synthetic = &settings.synthetic;
                DataSource::Synthetic(SyntheticSource::new(
                    seed.or(synthetic.seed),
                    synthetic.days,
                    synthetic.interval_minutes,
                ))
            }
        }
    }
}

impl RecordSource for DataSource {
    fn load_gate(&self, gate_id: &str) -> Result<Option<Vec<TrafficRecord>>, SourceError> {
        match self {
            DataSource::Csv(source) => source.load_gate(gate_id),
            DataSource::Synthetic(source) => source.load_gate(gate_id),
        }
    }
    
    fn get_name(&self) -> &'static str {
        match self {
            DataSource::Csv(source) => source.get_name(),
            DataSource::Synthetic(source) => source.get_name(),
        }
    }
}

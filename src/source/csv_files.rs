use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use super::{CongestionLevel, RecordSource, SourceError, TrafficRecord};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Deserialize, Serialize)]
struct CsvRow {
    datetime: String,
    vehicle_count: u32,
    average_speed_kmh: f64,
    congestion_level: String,
}

impl CsvRow {
    fn into_record(self) -> Result<TrafficRecord, SourceError> {
        let timestamp = parse_timestamp(&self.datetime)?;
        let congestion_level: CongestionLevel = self.congestion_level.parse()?;
        
        if self.average_speed_kmh.is_nan() || self.average_speed_kmh < 0.0 {
            return Err(SourceError::InvalidSpeed(self.average_speed_kmh));
        }
        
        Ok(TrafficRecord::new(timestamp, self.vehicle_count, self.average_speed_kmh, congestion_level))
    }
    
    fn from_record(record: &TrafficRecord) -> Self {
        Self {
            datetime: record.timestamp.format(TIMESTAMP_FORMATS[0]).to_string(),
            vehicle_count: record.vehicle_count,
            average_speed_kmh: record.average_speed_kmh,
            congestion_level: record.congestion_level.label().to_string(),
        }
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, SourceError> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| SourceError::BadTimestamp(value.to_string()))
}

/// Reads `<directory>/<gate_id>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    directory: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }
    
    pub fn directory(&self) -> &Path {
        &self.directory
    }
    
    pub fn path_for(&self, gate_id: &str) -> PathBuf {
        self.directory.join(format!("{}.csv", gate_id))
    }
    
    pub fn write_gate(&self, gate_id: &str, records: &[TrafficRecord]) -> Result<PathBuf, SourceError> {
        std::fs::create_dir_all(&self.directory)?;
        
        let path = self.path_for(gate_id);
        let csv_error = |source| SourceError::Csv { path: path.clone(), source };
        
        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        for record in records {
            writer.serialize(CsvRow::from_record(record)).map_err(csv_error)?;
        }
        writer.flush()?;
        
        Ok(path)
    }
}

impl RecordSource for CsvDirectorySource {
    fn load_gate(&self, gate_id: &str) -> Result<Option<Vec<TrafficRecord>>, SourceError> {
        let path = self.path_for(gate_id);
        if !path.is_file() {
            return Ok(None);
        }
        
        let csv_error = |source| SourceError::Csv { path: path.clone(), source };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_error)?;
        
        let mut records = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            records.push(row.map_err(csv_error)?.into_record()?);
        }
        
        Ok(Some(records))
    }
    
    fn get_name(&self) -> &'static str {
        "CSV"
    }
}

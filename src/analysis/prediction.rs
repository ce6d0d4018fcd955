use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use super::baseline::{level_rate, mean, BaselineStore, GateBaseline};
use crate::round_to;
use crate::source::{CongestionLevel, TrafficRecord};

/// Returned for gates without historical data.
pub const FALLBACK_PROBABILITY: f64 = 50.0;
/// Records within this many hours of the requested hour are compared.
pub const HOUR_WINDOW: i64 = 1;

const HISTORICAL_WEIGHT: f64 = 0.40;
const DENSITY_WEIGHT: f64 = 0.30;
const SPEED_WEIGHT: f64 = 0.20;
const PEAK_WEIGHT: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rain,
    HeavyRain,
    /// Any label outside the known set; scored like clear weather
    Other(String),
}

impl Weather {
    pub fn from_label(label: &str) -> Self {
        match label {
            "clear" => Weather::Clear,
            "cloudy" => Weather::Cloudy,
            "rain" => Weather::Rain,
            "heavy_rain" => Weather::HeavyRain,
            other => Weather::Other(other.to_string()),
        }
    }
    
    pub fn label(&self) -> &str {
        match self {
            Weather::Clear => "clear",
            Weather::Cloudy => "cloudy",
            Weather::Rain => "rain",
            Weather::HeavyRain => "heavy_rain",
            Weather::Other(label) => label,
        }
    }
    
    pub fn multiplier(&self) -> f64 {
        match self {
            Weather::Clear => 1.0,
            Weather::Cloudy => 1.1,
            Weather::Rain => 1.25,
            Weather::HeavyRain => 1.5,
            Weather::Other(_) => 1.0,
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weather {
    type Err = std::convert::Infallible;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Weather::from_label(s))
    }
}

impl Serialize for Weather {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Component scores behind one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub historical: f64,
    pub density: f64,
    pub speed: f64,
    pub peak: f64,
    pub base: f64,
    pub weather_multiplier: f64,
    pub probability: f64,
}

/// Multi-factor congestion model over an immutable baseline snapshot.
#[derive(Clone, Copy)]
pub struct PredictionModel<'a> {
    records: &'a HashMap<String, Vec<TrafficRecord>>,
    baselines: &'a BaselineStore,
}

impl<'a> PredictionModel<'a> {
    pub fn new(records: &'a HashMap<String, Vec<TrafficRecord>>, baselines: &'a BaselineStore) -> Self {
        Self { records, baselines }
    }
    
    /// Congestion probability in [0, 100], rounded to two decimals.
    pub fn predict(&self, gate_id: &str, hour: u32, weather: &Weather) -> f64 {
        self.explain(gate_id, hour, weather)
            .map(|breakdown| breakdown.probability)
            .unwrap_or(FALLBACK_PROBABILITY)
    }
    
    /// `None` when the gate has no baseline.
    pub fn explain(&self, gate_id: &str, hour: u32, weather: &Weather) -> Option<ScoreBreakdown> {
        let baseline = self.baselines.get_baseline(gate_id)?;
        let records = self.records.get(gate_id).filter(|records| !records.is_empty())?;
        
        Some(score(records, baseline, hour, weather))
    }
}

/// Scores `records` against `baseline` for the requested hour and weather.
pub fn score(records: &[TrafficRecord], baseline: &GateBaseline, hour: u32, weather: &Weather) -> ScoreBreakdown {
    let window = hour_window(records, hour);
    
    let vehicles: Vec<f64> = window.iter().map(|r| r.vehicle_count as f64).collect();
    let speeds: Vec<f64> = window.iter().map(|r| r.average_speed_kmh).collect();
    
    let historical = historical_score(&window);
    let density = density_score(mean(&vehicles), baseline);
    let speed = speed_score(mean(&speeds));
    let peak = peak_score(baseline, hour);
    
    let base = historical * HISTORICAL_WEIGHT
        + density * DENSITY_WEIGHT
        + speed * SPEED_WEIGHT
        + peak * PEAK_WEIGHT;
    
    let weather_multiplier = weather.multiplier();
    let probability = round_to((base * weather_multiplier).clamp(0.0, 100.0), 2);
    
    ScoreBreakdown {
        historical,
        density,
        speed,
        peak,
        base,
        weather_multiplier,
        probability,
    }
}

/// Records whose hour lies within one hour of `hour`, without wrapping
/// around midnight. Falls back to every record when nothing matches.
pub fn hour_window(records: &[TrafficRecord], hour: u32) -> Vec<&TrafficRecord> {
    let hour = hour as i64;
    let window: Vec<&TrafficRecord> = records
        .iter()
        .filter(|r| (r.hour as i64 - hour).abs() <= HOUR_WINDOW)
        .collect();
    
    if window.is_empty() {
        records.iter().collect()
    } else {
        window
    }
}

pub fn historical_score(window: &[&TrafficRecord]) -> f64 {
    let high = level_rate(window.iter().copied(), CongestionLevel::High);
    let medium = level_rate(window.iter().copied(), CongestionLevel::Medium);
    high * 1.0 + medium * 0.5
}

pub fn density_score(window_mean: f64, baseline: &GateBaseline) -> f64 {
    if baseline.std_vehicle_count > 0.0 {
        let z = (window_mean - baseline.avg_vehicle_count) / baseline.std_vehicle_count;
        (50.0 + z * 20.0).clamp(0.0, 100.0)
    } else {
        50.0
    }
}

pub fn speed_score(window_mean_speed: f64) -> f64 {
    if window_mean_speed < 40.0 {
        80.0
    } else if window_mean_speed < 50.0 {
        60.0
    } else if window_mean_speed < 60.0 {
        40.0
    } else {
        20.0
    }
}

pub fn peak_score(baseline: &GateBaseline, hour: u32) -> f64 {
    if baseline.is_peak_hour(hour) {
        75.0
    } else {
        25.0
    }
}

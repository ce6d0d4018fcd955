use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use crate::round_to;
use crate::source::{CongestionLevel, TrafficRecord};

pub const PEAK_HOUR_COUNT: usize = 3;

/// Statistics over the records logged in one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyStats {
    pub records: usize,
    pub mean_vehicle_count: f64,
    pub std_vehicle_count: f64,
    pub min_vehicle_count: u32,
    pub max_vehicle_count: u32,
    pub mean_speed: f64,
    pub std_speed: f64,
    /// Share of High records in this hour, in percent
    pub high_congestion_rate: f64,
}

impl HourlyStats {
    fn from_bucket(bucket: &[&TrafficRecord]) -> Self {
        let vehicles: Vec<f64> = bucket.iter().map(|r| r.vehicle_count as f64).collect();
        let speeds: Vec<f64> = bucket.iter().map(|r| r.average_speed_kmh).collect();
        let mean_vehicle_count = mean(&vehicles);
        let mean_speed = mean(&speeds);
        
        Self {
            records: bucket.len(),
            mean_vehicle_count,
            std_vehicle_count: sample_std(&vehicles, mean_vehicle_count),
            min_vehicle_count: bucket.iter().map(|r| r.vehicle_count).min().unwrap_or(0),
            max_vehicle_count: bucket.iter().map(|r| r.vehicle_count).max().unwrap_or(0),
            mean_speed,
            std_speed: sample_std(&speeds, mean_speed),
            high_congestion_rate: level_rate(bucket.iter().copied(), CongestionLevel::High),
        }
    }
}

/// Historical reference distribution of one gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateBaseline {
    pub record_count: usize,
    pub avg_vehicle_count: f64,
    pub std_vehicle_count: f64,
    pub avg_speed: f64,
    pub std_speed: f64,
    pub high_congestion_rate: f64,
    pub medium_congestion_rate: f64,
    pub low_congestion_rate: f64,
    /// Busiest hours by mean vehicle count, busiest first
    pub peak_hours: Vec<u32>,
    pub hourly: BTreeMap<u32, HourlyStats>,
}

impl GateBaseline {
    /// Returns `None` for an empty record sequence.
    pub fn from_records(records: &[TrafficRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        
        let mut buckets: BTreeMap<u32, Vec<&TrafficRecord>> = BTreeMap::new();
        for record in records {
            buckets.entry(record.hour).or_default().push(record);
        }
        
        let hourly: BTreeMap<u32, HourlyStats> = buckets
            .iter()
            .map(|(&hour, bucket)| (hour, HourlyStats::from_bucket(bucket)))
            .collect();
        
        let vehicles: Vec<f64> = records.iter().map(|r| r.vehicle_count as f64).collect();
        let speeds: Vec<f64> = records.iter().map(|r| r.average_speed_kmh).collect();
        let avg_vehicle_count = mean(&vehicles);
        let avg_speed = mean(&speeds);
        
        Some(Self {
            record_count: records.len(),
            avg_vehicle_count,
            std_vehicle_count: sample_std(&vehicles, avg_vehicle_count),
            avg_speed,
            std_speed: sample_std(&speeds, avg_speed),
            high_congestion_rate: level_rate(records.iter(), CongestionLevel::High),
            medium_congestion_rate: level_rate(records.iter(), CongestionLevel::Medium),
            low_congestion_rate: level_rate(records.iter(), CongestionLevel::Low),
            peak_hours: peak_hours(&hourly),
            hourly,
        })
    }
    
    pub fn is_peak_hour(&self, hour: u32) -> bool {
        self.peak_hours.contains(&hour)
    }
    
    pub fn summary(&self) -> GateSummary {
        GateSummary {
            avg_vehicles: round_to(self.avg_vehicle_count, 1),
            avg_speed: round_to(self.avg_speed, 1),
            high_congestion_rate: round_to(self.high_congestion_rate, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateSummary {
    pub avg_vehicles: f64,
    pub avg_speed: f64,
    pub high_congestion_rate: f64,
}

/// Baselines of every gate that has at least one record.
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    baselines: HashMap<String, GateBaseline>,
}

impl BaselineStore {
    pub fn build<'a, I>(gates: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [TrafficRecord])>,
    {
        let baselines = gates
            .into_iter()
            .filter_map(|(gate_id, records)| {
                GateBaseline::from_records(records).map(|baseline| (gate_id.to_string(), baseline))
            })
            .collect();
        
        Self { baselines }
    }
    
    pub fn get_baseline(&self, gate_id: &str) -> Option<&GateBaseline> {
        self.baselines.get(gate_id)
    }
    
    pub fn gate_summary(&self, gate_id: &str) -> Option<GateSummary> {
        self.get_baseline(gate_id).map(GateBaseline::summary)
    }
    
    pub fn contains(&self, gate_id: &str) -> bool {
        self.baselines.contains_key(gate_id)
    }
    
    pub fn len(&self) -> usize {
        self.baselines.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

/// Ranks hours by mean volume, descending; equal means keep ascending hour order.
pub fn peak_hours(hourly: &BTreeMap<u32, HourlyStats>) -> Vec<u32> {
    let mut ranked: Vec<(u32, f64)> = hourly
        .iter()
        .map(|(&hour, stats)| (hour, stats.mean_vehicle_count))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    
    ranked.into_iter().take(PEAK_HOUR_COUNT).map(|(hour, _)| hour).collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); zero below two values.
pub(crate) fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Percentage of `records` at `level`.
pub(crate) fn level_rate<'a>(records: impl Iterator<Item = &'a TrafficRecord>, level: CongestionLevel) -> f64 {
    let (total, matching) = records.fold((0usize, 0usize), |(total, matching), record| {
        (total + 1, matching + (record.congestion_level == level) as usize)
    });
    
    if total == 0 {
        return 0.0;
    }
    matching as f64 / total as f64 * 100.0
}

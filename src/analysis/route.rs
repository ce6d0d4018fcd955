use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use super::baseline::{BaselineStore, GateSummary};
use super::prediction::{PredictionModel, Weather};
use crate::config::GateRegistry;
use crate::geo::GeoPoint;
use crate::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatePrediction {
    pub gate_id: String,
    pub gate_name: String,
    pub congestion_probability: f64,
    /// `None` for ids missing from the registry
    pub location: Option<GeoPoint>,
    #[serde(rename = "baseline_data")]
    pub baseline: Option<GateSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteAnalysis {
    pub overall_congestion: f64,
    pub gates: Vec<GatePrediction>,
    pub gate_count: usize,
    pub weather_condition: Weather,
    #[serde(serialize_with = "serialize_timestamp")]
    pub prediction_time: NaiveDateTime,
}

fn serialize_timestamp<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&at.format("%Y-%m-%d %H:%M:%S"))
}

/// Runs the prediction model over an ordered list of gates.
pub struct RouteAnalyzer<'a> {
    registry: &'a GateRegistry,
    baselines: &'a BaselineStore,
    model: PredictionModel<'a>,
}

impl<'a> RouteAnalyzer<'a> {
    pub fn new(registry: &'a GateRegistry, baselines: &'a BaselineStore, model: PredictionModel<'a>) -> Self {
        Self {
            registry,
            baselines,
            model,
        }
    }
    
    pub fn analyze<S: AsRef<str>>(&self, gate_ids: &[S], weather: &Weather, at: NaiveDateTime) -> RouteAnalysis {
        let hour = at.hour();
        
        let gates: Vec<GatePrediction> = gate_ids
            .iter()
            .map(|gate_id| self.predict_gate(gate_id.as_ref(), hour, weather))
            .collect();
        
        let overall_congestion = if gates.is_empty() {
            0.0
        } else {
            let total: f64 = gates.iter().map(|g| g.congestion_probability).sum();
            round_to(total / gates.len() as f64, 2)
        };
        
        log::debug!(
            "Route of {} gates at hour {} ({}): {:.2}%",
            gates.len(),
            hour,
            weather,
            overall_congestion
        );
        
        RouteAnalysis {
            overall_congestion,
            gate_count: gates.len(),
            gates,
            weather_condition: weather.clone(),
            prediction_time: at,
        }
    }
    
    fn predict_gate(&self, gate_id: &str, hour: u32, weather: &Weather) -> GatePrediction {
        let gate = self.registry.get(gate_id);
        
        GatePrediction {
            gate_id: gate_id.to_string(),
            gate_name: gate.map_or_else(|| gate_id.to_string(), |gate| gate.name.clone()),
            congestion_probability: self.model.predict(gate_id, hour, weather),
            location: gate.map(|gate| gate.location()),
            baseline: self.baselines.gate_summary(gate_id),
        }
    }
}

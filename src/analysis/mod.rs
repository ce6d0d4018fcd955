use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use crate::config::GateRegistry;
use crate::geo::{self, GeoPoint, NearbyGate, RouteCandidate, RouteStrategy};
use crate::source::{RecordSource, TrafficRecord};

pub mod baseline;
pub mod prediction;
pub mod route;

pub use baseline::*;
pub use prediction::*;
pub use route::*;

/// One analyzed candidate route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteForecast {
    pub route_id: usize,
    pub strategy: RouteStrategy,
    pub color: &'static str,
    #[serde(flatten)]
    pub analysis: RouteAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOverview {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub baseline: Option<GateSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub gates_registered: usize,
    pub gates_loaded: usize,
    pub total_records: usize,
    pub baselines_calculated: usize,
}

/// Immutable snapshot of the registry, the historical records and their baselines.
///
/// Built once at startup and shared read-only between requests; reloading
/// data means building a new snapshot and swapping it in whole.
#[derive(Debug, Clone)]
pub struct Analyzer {
    registry: GateRegistry,
    records: HashMap<String, Vec<TrafficRecord>>,
    baselines: BaselineStore,
}

impl Analyzer {
    /// Loads every registered gate from `source`. Gates without data, or whose
    /// data fails to load, are left out with a warning.
    pub fn build<S: RecordSource + ?Sized>(registry: GateRegistry, source: &S) -> Self {
        info!("Loading {} toll gate datasets from {} source", registry.len(), source.get_name());
        
        let mut records = HashMap::new();
        for gate_id in registry.ids() {
            match source.load_gate(gate_id) {
                Ok(Some(gate_records)) => {
                    info!("Loaded {}: {} records", gate_id, gate_records.len());
                    records.insert(gate_id.to_string(), gate_records);
                }
                Ok(None) => warn!("No data found for {}", gate_id),
                Err(e) => warn!("Error loading {}: {}", gate_id, e),
            }
        }
        
        Self::from_records(registry, records)
    }
    
    /// Builds the snapshot from records already in memory. Records of gates
    /// outside the registry are ignored.
    pub fn from_records(registry: GateRegistry, mut records: HashMap<String, Vec<TrafficRecord>>) -> Self {
        records.retain(|gate_id, _| {
            let known = registry.contains(gate_id);
            if !known {
                warn!("Ignoring records for unregistered gate {}", gate_id);
            }
            known
        });
        
        let baselines = BaselineStore::build(
            records.iter().map(|(gate_id, gate_records)| (gate_id.as_str(), gate_records.as_slice())),
        );
        
        let analyzer = Self {
            registry,
            records,
            baselines,
        };
        
        let status = analyzer.status();
        info!(
            "Datasets loaded: {}/{}, total records: {}",
            status.gates_loaded, status.gates_registered, status.total_records
        );
        info!("Baseline calculated for {} toll gates", status.baselines_calculated);
        
        analyzer
    }
    
    pub fn registry(&self) -> &GateRegistry {
        &self.registry
    }
    
    pub fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }
    
    pub fn records(&self, gate_id: &str) -> Option<&[TrafficRecord]> {
        self.records.get(gate_id).map(Vec::as_slice)
    }
    
    pub fn model(&self) -> PredictionModel<'_> {
        PredictionModel::new(&self.records, &self.baselines)
    }
    
    pub fn route_analyzer(&self) -> RouteAnalyzer<'_> {
        RouteAnalyzer::new(&self.registry, &self.baselines, self.model())
    }
    
    pub fn get_baseline_summary(&self, gate_id: &str) -> Option<GateSummary> {
        self.baselines.gate_summary(gate_id)
    }
    
    pub fn predict_congestion(&self, gate_id: &str, hour: u32, weather: &Weather) -> f64 {
        self.model().predict(gate_id, hour, weather)
    }
    
    pub fn explain_prediction(&self, gate_id: &str, hour: u32, weather: &Weather) -> Option<ScoreBreakdown> {
        self.model().explain(gate_id, hour, weather)
    }
    
    /// Analyzes `gate_ids` at the current local hour.
    pub fn analyze_route<S: AsRef<str>>(&self, gate_ids: &[S], weather: &Weather) -> RouteAnalysis {
        self.analyze_route_at(gate_ids, weather, Local::now().naive_local())
    }
    
    pub fn analyze_route_at<S: AsRef<str>>(&self, gate_ids: &[S], weather: &Weather, at: NaiveDateTime) -> RouteAnalysis {
        self.route_analyzer().analyze(gate_ids, weather, at)
    }
    
    pub fn compose_routes(&self, origin_lat: f64, origin_lng: f64, dest_lat: f64, dest_lng: f64) -> [RouteCandidate; 4] {
        geo::compose_routes(
            &self.registry,
            GeoPoint::new(origin_lat, origin_lng),
            GeoPoint::new(dest_lat, dest_lng),
        )
    }
    
    /// Composes the four candidate routes and scores each of them.
    pub fn forecast_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        weather: &Weather,
        at: NaiveDateTime,
    ) -> Vec<RouteForecast> {
        let analyzer = self.route_analyzer();
        
        geo::compose_routes(&self.registry, origin, destination)
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let analysis = analyzer.analyze(candidate.gates.as_slice(), weather, at);
                debug!(
                    "Route {} ({}): {:.2}% over {} gates",
                    i + 1,
                    candidate.strategy,
                    analysis.overall_congestion,
                    analysis.gate_count
                );
                
                RouteForecast {
                    route_id: i + 1,
                    strategy: candidate.strategy,
                    color: candidate.color,
                    analysis,
                }
            })
            .collect()
    }
    
    pub fn nearest_gates(&self, point: GeoPoint, radius_km: f64) -> Vec<NearbyGate> {
        geo::nearest_gates(&self.registry, point, radius_km)
    }
    
    pub fn gate_overview(&self) -> Vec<GateOverview> {
        self.registry
            .iter()
            .map(|gate| GateOverview {
                id: gate.id.clone(),
                name: gate.name.clone(),
                lat: gate.lat,
                lng: gate.lng,
                baseline: self.get_baseline_summary(&gate.id),
            })
            .collect()
    }
    
    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            gates_registered: self.registry.len(),
            gates_loaded: self.records.len(),
            total_records: self.records.values().map(Vec::len).sum(),
            baselines_calculated: self.baselines.len(),
        }
    }
}

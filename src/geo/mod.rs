use serde::{Deserialize, Serialize};
use crate::config::GateRegistry;
use crate::round_to;

pub mod routes;

pub use routes::*;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
    
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Great-circle (haversine) distance in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();
    
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyGate {
    pub gate_id: String,
    pub name: String,
    pub distance_km: f64,
}

/// Gates within `radius_km` of `point`, closest first.
pub fn nearest_gates(registry: &GateRegistry, point: GeoPoint, radius_km: f64) -> Vec<NearbyGate> {
    let mut nearby: Vec<NearbyGate> = registry
        .iter()
        .filter_map(|gate| {
            let distance = point.distance_km(&gate.location());
            (distance <= radius_km).then(|| NearbyGate {
                gate_id: gate.id.clone(),
                name: gate.name.clone(),
                distance_km: round_to(distance, 2),
            })
        })
        .collect();
    
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

use serde::Serialize;
use std::fmt;
use super::GeoPoint;
use crate::config::{GateRegistry, TollGate};

const DIRECT_GATES: usize = 5;
const CORRIDOR_GATES: usize = 6;
const ALTERNATIVE_POOL: usize = 12;
const ALTERNATIVE_STRIDE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteStrategy {
    Direct,
    Northern,
    Southern,
    Alternative,
}

impl RouteStrategy {
    pub const ALL: [RouteStrategy; 4] = [
        RouteStrategy::Direct,
        RouteStrategy::Northern,
        RouteStrategy::Southern,
        RouteStrategy::Alternative,
    ];
    
    pub fn label(&self) -> &'static str {
        match self {
            RouteStrategy::Direct => "Direct",
            RouteStrategy::Northern => "Northern",
            RouteStrategy::Southern => "Southern",
            RouteStrategy::Alternative => "Alternative",
        }
    }
    
    pub fn color(&self) -> &'static str {
        match self {
            RouteStrategy::Direct => "#FF0000",
            RouteStrategy::Northern => "#0000FF",
            RouteStrategy::Southern => "#00FF00",
            RouteStrategy::Alternative => "#FFA500",
        }
    }
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCandidate {
    pub gates: Vec<String>,
    pub strategy: RouteStrategy,
    pub color: &'static str,
}

impl RouteCandidate {
    fn from_gates<'a>(strategy: RouteStrategy, gates: impl Iterator<Item = &'a TollGate>) -> Self {
        Self {
            gates: gates.map(|gate| gate.id.clone()).collect(),
            strategy,
            color: strategy.color(),
        }
    }
}

struct RankedGate<'a> {
    gate: &'a TollGate,
    dist: f64,
}

/// Builds the four candidate routes between `origin` and `destination`.
///
/// Every gate is ranked by its distance to the closer of the two endpoints.
/// The Northern and Southern corridors re-sort that ranking by latitude
/// (ascending and descending respectively); sorts are stable, so ties keep
/// the distance order, which itself keeps registry order.
pub fn compose_routes(registry: &GateRegistry, origin: GeoPoint, destination: GeoPoint) -> [RouteCandidate; 4] {
    let mut ranked: Vec<RankedGate> = registry
        .iter()
        .map(|gate| {
            let location = gate.location();
            let dist = origin.distance_km(&location).min(destination.distance_km(&location));
            RankedGate { gate, dist }
        })
        .collect();
    ranked.sort_by(|a, b| a.dist.total_cmp(&b.dist));
    
    let direct = RouteCandidate::from_gates(
        RouteStrategy::Direct,
        ranked.iter().take(DIRECT_GATES).map(|r| r.gate),
    );
    
    let mut by_latitude: Vec<&RankedGate> = ranked.iter().collect();
    by_latitude.sort_by(|a, b| a.gate.lat.total_cmp(&b.gate.lat));
    let northern = RouteCandidate::from_gates(
        RouteStrategy::Northern,
        by_latitude.iter().take(CORRIDOR_GATES).map(|r| r.gate),
    );
    
    let mut by_latitude_desc: Vec<&RankedGate> = ranked.iter().collect();
    by_latitude_desc.sort_by(|a, b| b.gate.lat.total_cmp(&a.gate.lat));
    let southern = RouteCandidate::from_gates(
        RouteStrategy::Southern,
        by_latitude_desc.iter().take(CORRIDOR_GATES).map(|r| r.gate),
    );
    
    let alternative = RouteCandidate::from_gates(
        RouteStrategy::Alternative,
        ranked
            .iter()
            .take(ALTERNATIVE_POOL)
            .step_by(ALTERNATIVE_STRIDE)
            .take(CORRIDOR_GATES)
            .map(|r| r.gate),
    );
    
    [direct, northern, southern, alternative]
}

use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use super::Validate;
use crate::geo::GeoPoint;

/// Jakarta toll gates, coordinates from OpenStreetMap.
const BUILTIN_GATES: &str = include_str!("../../gates.toml");

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TollGate {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl TollGate {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct GateFile {
    gates: Vec<TollGate>,
}

/// Static set of toll gates, kept in declaration order.
#[derive(Debug, Clone)]
pub struct GateRegistry {
    gates: Vec<TollGate>,
    index: HashMap<String, usize>,
}

impl GateRegistry {
    pub fn new(gates: Vec<TollGate>) -> Result<Self> {
        let index = gates
            .iter()
            .enumerate()
            .map(|(i, gate)| (gate.id.clone(), i))
            .collect();
        
        let registry = Self { gates, index };
        registry.validate()?;
        Ok(registry)
    }
    
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: GateFile = toml::from_str(content)?;
        Self::new(file.gates)
    }
    
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_GATES)
    }
    
    pub fn get(&self, gate_id: &str) -> Option<&TollGate> {
        self.index.get(gate_id).map(|&i| &self.gates[i])
    }
    
    pub fn contains(&self, gate_id: &str) -> bool {
        self.index.contains_key(gate_id)
    }
    
    pub fn iter(&self) -> impl Iterator<Item = &TollGate> {
        self.gates.iter()
    }
    
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.gates.iter().map(|gate| gate.id.as_str())
    }
    
    pub fn len(&self) -> usize {
        self.gates.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

impl Validate for GateRegistry {
    fn validate(&self) -> Result<()> {
        if self.gates.is_empty() {
            return Err(anyhow!("At least one toll gate must be defined"));
        }
        
        if self.index.len() != self.gates.len() {
            let mut seen = HashSet::new();
            for gate in &self.gates {
                if !seen.insert(gate.id.as_str()) {
                    return Err(anyhow!("Duplicate toll gate id '{}'", gate.id));
                }
            }
        }
        
        for gate in &self.gates {
            if gate.id.trim().is_empty() {
                return Err(anyhow!("Toll gate ids must not be empty"));
            }
            
            if gate.name.trim().is_empty() {
                return Err(anyhow!("Toll gate '{}' has an empty name", gate.id));
            }
            
            if !(-90.0..=90.0).contains(&gate.lat) {
                return Err(anyhow!("Latitude {} of '{}' must be in range [-90, 90]", gate.lat, gate.id));
            }
            
            if !(-180.0..=180.0).contains(&gate.lng) {
                return Err(anyhow!("Longitude {} of '{}' must be in range [-180, 180]", gate.lng, gate.id));
            }
        }
        
        Ok(())
    }
}

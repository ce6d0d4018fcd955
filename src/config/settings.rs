use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use super::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    pub data: DataSettings,
    #[serde(default)]
    pub synthetic: SyntheticSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataSettings {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            directory: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyntheticSettings {
    pub seed: Option<u64>,
    pub days: u32,
    pub interval_minutes: u32,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            seed: None,
            days: 28,
            interval_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupSettings {
    pub nearby_radius_km: f64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self { nearby_radius_km: 5.0 }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if self.data.source == SourceKind::Csv && self.data.directory.as_os_str().is_empty() {
            return Err(anyhow!("Data directory is required for the csv source"));
        }
        
        let synthetic = &self.synthetic;
        if synthetic.days == 0 {
            return Err(anyhow!("Synthetic days must be greater than zero"));
        }
        
        if synthetic.interval_minutes == 0 || synthetic.interval_minutes > 60 || 60 % synthetic.interval_minutes != 0 {
            return Err(anyhow!("Synthetic interval {} must divide an hour evenly", synthetic.interval_minutes));
        }
        
        if self.lookup.nearby_radius_km.is_nan() || self.lookup.nearby_radius_km <= 0.0 {
            return Err(anyhow!("Nearby radius must be positive"));
        }
        
        Ok(())
    }
}

use anyhow::{Context, Result};

pub mod gates;
pub mod settings;

pub use gates::*;
pub use settings::*;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gates: GateRegistry,
    pub settings: Settings,
}

impl AppConfig {
    pub fn load_from_files(gates_path: &str, settings_path: &str) -> Result<Self> {
        let gates_content = std::fs::read_to_string(gates_path)
            .with_context(|| format!("reading gate registry {}", gates_path))?;
        let settings_content = std::fs::read_to_string(settings_path)
            .with_context(|| format!("reading settings {}", settings_path))?;
        
        let gates = GateRegistry::from_toml(&gates_content)?;
        let settings: Settings = toml::from_str(&settings_content)?;
        
        // Registry is validated on construction
        settings.validate()?;
        
        Ok(AppConfig { gates, settings })
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

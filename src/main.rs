use anyhow::{bail, Result};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use toll_congestion::{
    analysis::{Analyzer, GateSummary, ScoreBreakdown, Weather},
    config::{AppConfig, SourceKind},
    geo::GeoPoint,
    source::{CsvDirectorySource, DataSource, SyntheticSource},
};

#[derive(Parser)]
#[command(name = "toll-congestion")]
#[command(about = "Toll-gate congestion prediction and route comparison")]
struct Args {
    /// Gate registry file
    #[arg(short, long, default_value = "gates.toml")]
    gates: String,
    
    /// Settings file
    #[arg(short, long, default_value = "settings.toml")]
    settings: String,
    
    /// Random seed for synthetic data, overrides the settings file
    #[arg(long)]
    seed: Option<u64>,
    
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how much historical data was loaded
    Status,
    /// List toll gates with their baseline summaries
    Gates,
    /// Predict congestion at a single gate
    Predict {
        gate_id: String,
        /// Hour of day, defaults to the current hour
        #[arg(long)]
        hour: Option<u32>,
        #[arg(short, long, default_value = "clear")]
        weather: String,
        /// Include the component scores
        #[arg(long)]
        explain: bool,
    },
    /// Compare the four candidate routes between two coordinates
    Routes {
        #[arg(allow_negative_numbers = true)]
        origin_lat: f64,
        #[arg(allow_negative_numbers = true)]
        origin_lng: f64,
        #[arg(allow_negative_numbers = true)]
        dest_lat: f64,
        #[arg(allow_negative_numbers = true)]
        dest_lng: f64,
        #[arg(short, long, default_value = "clear")]
        weather: String,
    },
    /// List gates near a coordinate
    Nearby {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in km, defaults to the settings file
        #[arg(short, long)]
        radius: Option<f64>,
    },
    /// Write synthetic CSV data for every registered gate
    Generate {
        out_dir: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    
    let config = AppConfig::load_from_files(&args.gates, &args.settings)?;
    info!("Loaded {} toll gates from {}", config.gates.len(), args.gates);
    
    match args.command {
        Command::Generate { out_dir } => generate(&config, &out_dir, args.seed),
        command => {
            let source = DataSource::from_settings(&config.settings, args.seed);
            let analyzer = Analyzer::build(config.gates.clone(), &source);
            query(&analyzer, &config, command)
        }
    }
}

fn query(analyzer: &Analyzer, config: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Status => print_json(&analyzer.status()),
        Command::Gates => print_json(&analyzer.gate_overview()),
        Command::Predict { gate_id, hour, weather, explain } => {
            let Some(gate) = analyzer.registry().get(&gate_id) else {
                bail!("Toll gate '{}' not found", gate_id);
            };
            let name = gate.name.clone();
            
            let hour = hour.unwrap_or_else(|| Local::now().hour());
            if hour > 23 {
                bail!("Hour {} must be in range 0-23", hour);
            }
            
            let weather = Weather::from_label(&weather);
            let breakdown = if explain {
                analyzer.explain_prediction(&gate_id, hour, &weather)
            } else {
                None
            };
            
            print_json(&GateForecast {
                congestion_prediction: analyzer.predict_congestion(&gate_id, hour, &weather),
                baseline: analyzer.get_baseline_summary(&gate_id),
                gate_id,
                name,
                weather,
                hour,
                breakdown,
            })
        }
        Command::Routes { origin_lat, origin_lng, dest_lat, dest_lng, weather } => {
            let origin = GeoPoint::new(origin_lat, origin_lng);
            let destination = GeoPoint::new(dest_lat, dest_lng);
            let weather = Weather::from_label(&weather);
            info!("Prediction request: {:?} -> {:?}, weather: {}", origin, destination, weather);
            
            let routes = analyzer.forecast_routes(origin, destination, &weather, Local::now().naive_local());
            print_json(&routes)
        }
        Command::Nearby { lat, lng, radius } => {
            let radius = radius.unwrap_or(config.settings.lookup.nearby_radius_km);
            print_json(&analyzer.nearest_gates(GeoPoint::new(lat, lng), radius))
        }
        Command::Generate { .. } => bail!("generate does not query historical data"),
    }
}

#[derive(Serialize)]
struct GateForecast {
    gate_id: String,
    name: String,
    congestion_prediction: f64,
    weather: Weather,
    hour: u32,
    baseline: Option<GateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<ScoreBreakdown>,
}

fn generate(config: &AppConfig, out_dir: &str, seed: Option<u64>) -> Result<()> {
    let synthetic = &config.settings.synthetic;
    if config.settings.data.source == SourceKind::Synthetic {
        info!("Settings already use the synthetic source; writing CSV copies anyway");
    }
    
    let generator = SyntheticSource::new(seed.or(synthetic.seed), synthetic.days, synthetic.interval_minutes);
    let target = CsvDirectorySource::new(out_dir);
    
    let mut total_records = 0;
    for gate in config.gates.iter() {
        let records = generator.generate(&gate.id);
        let path = target.write_gate(&gate.id, &records)?;
        info!("Wrote {} records to {}", records.len(), path.display());
        total_records += records.len();
    }
    
    info!("Generated {} records for {} toll gates", total_records, config.gates.len());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

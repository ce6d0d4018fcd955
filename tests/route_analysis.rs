use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use toll_congestion::{
    analysis::{Analyzer, Weather},
    config::GateRegistry,
    geo::{GeoPoint, RouteStrategy},
    source::{CongestionLevel, SyntheticSource, TrafficRecord},
};

fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 6).unwrap().and_hms_opt(8, 15, 0).unwrap()
}

fn record(hour: u32, vehicles: u32, speed: f64, level: CongestionLevel) -> TrafficRecord {
    let timestamp = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap().and_hms_opt(hour, 0, 0).unwrap();
    TrafficRecord::new(timestamp, vehicles, speed, level)
}

/// Tebet is jammed around 8am, Senayan flows freely, the other gates have no data.
fn jakarta() -> Result<Analyzer> {
    let mut data = HashMap::new();
    data.insert(
        "GT_Tebet".to_string(),
        (7..=9).map(|h| record(h, 100, 35.0, CongestionLevel::High)).collect(),
    );
    data.insert(
        "GT_Senayan".to_string(),
        vec![
            record(8, 40, 85.0, CongestionLevel::Low),
            record(14, 60, 80.0, CongestionLevel::Low),
            record(15, 70, 80.0, CongestionLevel::Low),
            record(16, 80, 80.0, CongestionLevel::Low),
        ],
    );
    Ok(Analyzer::from_records(GateRegistry::builtin()?, data))
}

#[test]
fn test_empty_route() -> Result<()> {
    let analyzer = jakarta()?;
    let empty: [&str; 0] = [];
    let analysis = analyzer.analyze_route_at(&empty, &Weather::Rain, morning());
    
    assert_eq!(analysis.overall_congestion, 0.0);
    assert_eq!(analysis.gate_count, 0);
    assert!(analysis.gates.is_empty());
    assert_eq!(analysis.weather_condition, Weather::Rain);
    Ok(())
}

#[test]
fn test_route_mean_and_details() -> Result<()> {
    let analyzer = jakarta()?;
    let analysis = analyzer.analyze_route_at(&["GT_Tebet", "GT_Senayan", "GT_Bintara"], &Weather::Clear, morning());
    
    assert_eq!(analysis.gate_count, 3);
    assert_eq!(analysis.prediction_time, morning());
    
    let tebet = &analysis.gates[0];
    assert_eq!(tebet.gate_id, "GT_Tebet");
    assert_eq!(tebet.gate_name, "Tebet");
    assert_eq!(tebet.congestion_probability, 78.5);
    assert_eq!(tebet.location, Some(GeoPoint::new(-6.242407369059627, 106.84980314882971)));
    assert_eq!(tebet.baseline.map(|b| b.avg_speed), Some(35.0));
    
    // Low congestion, below-average volume, fast, outside the 14-16h peak
    let senayan = &analysis.gates[1];
    let expected_senayan = analyzer.predict_congestion("GT_Senayan", 8, &Weather::Clear);
    assert_eq!(senayan.congestion_probability, expected_senayan);
    assert!(expected_senayan < 20.0);
    
    // No data: fallback score and no baseline
    let bintara = &analysis.gates[2];
    assert_eq!(bintara.congestion_probability, 50.0);
    assert!(bintara.baseline.is_none());
    
    let mean = (78.5 + expected_senayan + 50.0) / 3.0;
    assert_eq!(analysis.overall_congestion, (mean * 100.0).round_ties_even() / 100.0);
    Ok(())
}

#[test]
fn test_unregistered_gate_in_route() -> Result<()> {
    let analyzer = jakarta()?;
    let analysis = analyzer.analyze_route_at(&["GT_Atlantis".to_string()], &Weather::HeavyRain, morning());
    
    let gate = &analysis.gates[0];
    assert_eq!(gate.gate_name, "GT_Atlantis");
    assert_eq!(gate.congestion_probability, 50.0);
    assert!(gate.location.is_none());
    assert_eq!(analysis.overall_congestion, 50.0);
    Ok(())
}

#[test]
fn test_route_mean_ties_round_to_even() -> Result<()> {
    // Off-peak, all Low, fast: 21.5 clear, 32.25 in heavy rain
    let mut data = HashMap::new();
    data.insert(
        "GT_Senayan".to_string(),
        vec![
            record(2, 50, 90.0, CongestionLevel::Low),
            record(2, 50, 90.0, CongestionLevel::Low),
            record(3, 50, 90.0, CongestionLevel::Low),
            record(4, 50, 90.0, CongestionLevel::Low),
        ],
    );
    let analyzer = Analyzer::from_records(GateRegistry::builtin()?, data);
    let noon = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap().and_hms_opt(12, 0, 0).unwrap();
    
    let route = ["GT_Senayan".to_string(), "GT_Bintara".to_string()];
    let analysis = analyzer.analyze_route_at(&route, &Weather::HeavyRain, noon);
    let scores: Vec<f64> = analysis.gates.iter().map(|g| g.congestion_probability).collect();
    assert_eq!(scores, vec![32.25, 50.0]);
    
    // (32.25 + 50.0) / 2 = 41.125 exactly
    assert_eq!(analysis.overall_congestion, 41.12);
    Ok(())
}

#[test]
fn test_forecast_routes() -> Result<()> {
    let analyzer = jakarta()?;
    let origin = GeoPoint::new(-6.105471302305508, 106.69645950813556);
    let destination = GeoPoint::new(-6.242407369059627, 106.84980314882971);
    
    let forecasts = analyzer.forecast_routes(origin, destination, &Weather::Cloudy, morning());
    assert_eq!(forecasts.len(), 4);
    
    for (i, (forecast, strategy)) in forecasts.iter().zip(RouteStrategy::ALL).enumerate() {
        assert_eq!(forecast.route_id, i + 1);
        assert_eq!(forecast.strategy, strategy);
        assert_eq!(forecast.color, strategy.color());
        assert_eq!(forecast.analysis.weather_condition, Weather::Cloudy);
        assert!((0.0..=100.0).contains(&forecast.analysis.overall_congestion));
    }
    
    let candidates = analyzer.compose_routes(origin.lat, origin.lng, destination.lat, destination.lng);
    let direct: Vec<&str> = forecasts[0].analysis.gates.iter().map(|g| g.gate_id.as_str()).collect();
    assert_eq!(direct, candidates[0].gates);
    Ok(())
}

#[test]
fn test_forecast_serializes_flat() -> Result<()> {
    let analyzer = jakarta()?;
    let origin = GeoPoint::new(-6.2, 106.8);
    let forecasts = analyzer.forecast_routes(origin, origin, &Weather::from_label("smog"), morning());
    
    let json = serde_json::to_value(&forecasts[0])?;
    assert_eq!(json["route_id"], 1);
    assert_eq!(json["strategy"], "Direct");
    assert_eq!(json["weather_condition"], "smog");
    assert_eq!(json["gate_count"], 5);
    assert!(json["gates"].is_array());
    assert_eq!(json["prediction_time"], "2024-02-06 08:15:00");
    assert!(json["gates"][0].get("baseline_data").is_some());
    Ok(())
}

#[test]
fn test_status_and_overview() -> Result<()> {
    let analyzer = jakarta()?;
    let status = analyzer.status();
    
    assert_eq!(status.gates_registered, 27);
    assert_eq!(status.gates_loaded, 2);
    assert_eq!(status.total_records, 7);
    assert_eq!(status.baselines_calculated, 2);
    
    let overview = analyzer.gate_overview();
    assert_eq!(overview.len(), 27);
    assert_eq!(overview.iter().filter(|g| g.baseline.is_some()).count(), 2);
    assert_eq!(overview[0].id, "GT_Bambu_Apus_1");
    Ok(())
}

#[test]
fn test_unregistered_records_are_ignored() -> Result<()> {
    let mut data = HashMap::new();
    data.insert("GT_Tebet".to_string(), vec![record(8, 10, 50.0, CongestionLevel::Medium)]);
    data.insert("GT_Ghost".to_string(), vec![record(8, 10, 50.0, CongestionLevel::High)]);
    
    let analyzer = Analyzer::from_records(GateRegistry::builtin()?, data);
    assert!(analyzer.records("GT_Ghost").is_none());
    assert_eq!(analyzer.predict_congestion("GT_Ghost", 8, &Weather::Clear), 50.0);
    assert_eq!(analyzer.status().gates_loaded, 1);
    Ok(())
}

#[test]
fn test_synthetic_build_is_reproducible() -> Result<()> {
    let source = SyntheticSource::new(Some(99), 3, 60);
    let first = Analyzer::build(GateRegistry::builtin()?, &source);
    let second = Analyzer::build(GateRegistry::builtin()?, &source);
    
    assert_eq!(first.status().total_records, 27 * 3 * 24);
    for gate_id in first.registry().ids() {
        assert_eq!(first.records(gate_id), second.records(gate_id));
        assert_eq!(
            first.baselines().get_baseline(gate_id).map(|b| b.peak_hours.clone()),
            second.baselines().get_baseline(gate_id).map(|b| b.peak_hours.clone())
        );
    }
    Ok(())
}

#[test]
fn test_snapshot_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Analyzer>();
}

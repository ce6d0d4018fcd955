use anyhow::Result;
use chrono::NaiveDate;
use tempfile::TempDir;
use toll_congestion::{
    analysis::{Analyzer, Weather},
    config::{GateRegistry, Settings, SourceKind, Validate},
    source::{parse_timestamp, CongestionLevel, CsvDirectorySource, DataSource, RecordSource, SourceError, SyntheticSource},
};

#[test]
fn test_csv_round_trip() -> Result<()> {
    let scratch = TempDir::new()?;
    let dir = scratch.path().join("gates");
    let source = CsvDirectorySource::new(&dir);
    
    let records = SyntheticSource::new(Some(5), 2, 30).generate("GT_Tebet");
    let path = source.write_gate("GT_Tebet", &records)?;
    assert_eq!(path, dir.join("GT_Tebet.csv"));
    
    let loaded = source.load_gate("GT_Tebet")?.unwrap();
    assert_eq!(loaded.len(), records.len());
    for (written, read) in records.iter().zip(&loaded) {
        assert_eq!(written.timestamp, read.timestamp);
        assert_eq!(written.vehicle_count, read.vehicle_count);
        assert!((written.average_speed_kmh - read.average_speed_kmh).abs() < 1e-9);
        assert_eq!(written.congestion_level, read.congestion_level);
    }
    Ok(())
}

#[test]
fn test_csv_reads_export_layout() -> Result<()> {
    let scratch = TempDir::new()?;
    let dir = scratch.path().join("gates");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
        dir.join("GT_Slipi_1.csv"),
        "datetime,gate,vehicle_count,average_speed_kmh,congestion_level\n\
         2024-01-01 07:45:00,Slipi 1,310,38.5,High\n\
         2024-01-01T08:00:00,Slipi 1,290,44.0,medium\n\
         2024-01-06 23:15, Slipi 1 ,40,88.2, Low\n",
    )?;
    
    let records = CsvDirectorySource::new(&dir).load_gate("GT_Slipi_1")?.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].hour, 7);
    assert_eq!(records[0].minute, 45);
    assert_eq!(records[0].congestion_level, CongestionLevel::High);
    assert_eq!(records[1].congestion_level, CongestionLevel::Medium);
    assert_eq!(records[2].day_of_week, 5);
    assert_eq!(records[2].vehicle_count, 40);
    Ok(())
}

#[test]
fn test_csv_missing_and_broken_files() -> Result<()> {
    let scratch = TempDir::new()?;
    let dir = scratch.path().join("gates");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
        dir.join("GT_Bad_Level.csv"),
        "datetime,vehicle_count,average_speed_kmh,congestion_level\n2024-01-01 07:00:00,10,50.0,Gridlock\n",
    )?;
    std::fs::write(
        dir.join("GT_Bad_Time.csv"),
        "datetime,vehicle_count,average_speed_kmh,congestion_level\nyesterday,10,50.0,Low\n",
    )?;
    std::fs::write(
        dir.join("GT_Bad_Count.csv"),
        "datetime,vehicle_count,average_speed_kmh,congestion_level\n2024-01-01 07:00:00,-3,50.0,Low\n",
    )?;
    
    let source = CsvDirectorySource::new(&dir);
    assert!(source.load_gate("GT_Missing")?.is_none());
    assert!(matches!(source.load_gate("GT_Bad_Level"), Err(SourceError::UnknownCongestionLevel(_))));
    assert!(matches!(source.load_gate("GT_Bad_Time"), Err(SourceError::BadTimestamp(_))));
    assert!(matches!(source.load_gate("GT_Bad_Count"), Err(SourceError::Csv { .. })));
    Ok(())
}

#[test]
fn test_build_skips_unreadable_gates() -> Result<()> {
    let scratch = TempDir::new()?;
    let dir = scratch.path().join("gates");
    let source = CsvDirectorySource::new(&dir);
    source.write_gate("GT_Tebet", &SyntheticSource::new(Some(1), 1, 60).generate("GT_Tebet"))?;
    std::fs::write(dir.join("GT_Senayan.csv"), "datetime,vehicle_count\nnot,a number\n")?;
    
    let analyzer = Analyzer::build(GateRegistry::builtin()?, &source);
    let status = analyzer.status();
    assert_eq!(status.gates_loaded, 1);
    assert_eq!(status.total_records, 24);
    assert_eq!(analyzer.predict_congestion("GT_Senayan", 8, &Weather::Clear), 50.0);
    Ok(())
}

#[test]
fn test_timestamp_formats() -> Result<()> {
    let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(17, 30, 0).unwrap();
    
    assert_eq!(parse_timestamp("2024-03-01 17:30:00")?, expected);
    assert_eq!(parse_timestamp("2024-03-01T17:30:00")?, expected);
    assert_eq!(parse_timestamp("2024-03-01 17:30")?, expected);
    assert_eq!(parse_timestamp(" 2024-03-01 17:30:00 ")?, expected);
    assert!(parse_timestamp("01/03/2024").is_err());
    Ok(())
}

#[test]
fn test_registry_config() -> Result<()> {
    let registry = GateRegistry::builtin()?;
    assert_eq!(registry.len(), 27);
    assert_eq!(registry.get("GT_Cengkareng").map(|g| g.name.as_str()), Some("Cengkareng"));
    
    let duplicate = r#"
        [[gates]]
        id = "GT_A"
        name = "A"
        lat = -6.2
        lng = 106.8

        [[gates]]
        id = "GT_A"
        name = "A again"
        lat = -6.3
        lng = 106.9
    "#;
    assert!(GateRegistry::from_toml(duplicate).is_err());
    
    let out_of_range = r#"
        [[gates]]
        id = "GT_A"
        name = "A"
        lat = -96.2
        lng = 106.8
    "#;
    assert!(GateRegistry::from_toml(out_of_range).is_err());
    assert!(GateRegistry::new(Vec::new()).is_err());
    Ok(())
}

#[test]
fn test_settings_config() -> Result<()> {
    let settings: Settings = toml::from_str(
        r#"
        [data]
        source = "synthetic"

        [synthetic]
        seed = 3
        days = 2
        interval_minutes = 20
        "#,
    )?;
    settings.validate()?;
    assert_eq!(settings.data.source, SourceKind::Synthetic);
    assert_eq!(settings.lookup.nearby_radius_km, 5.0);
    
    let source = DataSource::from_settings(&settings, None);
    assert_eq!(source.get_name(), "Synthetic");
    assert_eq!(source.load_gate("GT_Tebet")?.map(|r| r.len()), Some(2 * 24 * 3));
    
    let mut bad = settings.clone();
    bad.synthetic.interval_minutes = 7;
    assert!(bad.validate().is_err());
    
    let mut bad = settings;
    bad.lookup.nearby_radius_km = 0.0;
    assert!(bad.validate().is_err());
    Ok(())
}

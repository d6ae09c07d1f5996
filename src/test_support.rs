//! Shared fixtures for unit tests.

use crate::models::{BoundaryDataset, CorrectionKind, CorrectionTable, PlanningArea, SystemRecord};
use chrono::NaiveDate;
use geo::{polygon, MultiPolygon};

pub fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
        (x: x, y: y),
    ]])
}

/// Three areas across two regions
pub fn boundary() -> BoundaryDataset {
    BoundaryDataset::from_areas(vec![
        PlanningArea::new("BEDOK".into(), "EAST REGION".into(), Some(1.0), square(0.0, 0.0, 1.0)),
        PlanningArea::new("TAMPINES".into(), "EAST REGION".into(), Some(1.0), square(1.0, 0.0, 1.0)),
        PlanningArea::new("JURONG WEST".into(), "WEST REGION".into(), Some(4.0), square(-3.0, 0.0, 2.0)),
    ])
    .expect("fixture boundary is valid")
}

pub fn location_corrections() -> CorrectionTable {
    let mut table = CorrectionTable::new(CorrectionKind::Location);
    table.insert("BEDOK NORTH", "BEDOK");
    table.insert("TAMPINES ST 81", "TAMPINES");
    table.insert("PULAU UBIN", "NOT SPECIFIED");
    table.insert("SENTOSA COVE", "SENTOSA");
    table
}

pub fn name_corrections() -> CorrectionTable {
    let mut table = CorrectionTable::new(CorrectionKind::SystemName);
    table.insert("Jurong Point Mall", "JURONG WEST");
    table
}

pub fn ymd(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).expect("fixture date is valid")
}

pub fn record(name: &str, location: &str, technology: &str, commissioned: NaiveDate, kwp: f64) -> SystemRecord {
    SystemRecord::new(
        name.to_string(),
        "Commercial".to_string(),
        "Integrator A".to_string(),
        technology.to_string(),
        commissioned,
        kwp,
        location.to_uppercase(),
        Some(10.0),
    )
}

/// Six records exercising every resolution path
pub fn records() -> Vec<SystemRecord> {
    vec![
        record("Bedok Mall", "Bedok", "Monocrystalline silicon", ymd(2015, 3), 100.4),
        record("Tampines Hub", "Tampines St 81", "Polycrystalline silicon", ymd(2015, 1), 50.6),
        record("Jurong Point Mall", "NOT SPECIFIED", "CIGS", ymd(2016, 2), 20.0),
        record("SolarNova2", "BEDOK", "Monocrystalline silicon", ymd(2016, 2), 1000.0),
        record("Unknown Rooftop", "Somewhere", "Thin film", ymd(2015, 2), 7.5),
        record("Bedok Reservoir Float", "BEDOK NORTH", "Monocrystalline silicon", ymd(2016, 1), 30.0),
    ]
}

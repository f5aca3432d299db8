use chrono::NaiveDate;
use serde::Serialize;

/// One daily temperature reading for a station.
///
/// `avg_temp` is `None` when the source field did not parse as a number;
/// such rows are carried for lookups but excluded from model features.
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureObservation {
    pub station_id: String,
    pub station_name: String,
    pub date: NaiveDate,
    pub avg_temp: Option<f64>,
}

/// One monthly rainfall total for a station. `(station_id, year, month)`
/// uniquely identifies a row in the historical record.
#[derive(Debug, Clone, Serialize)]
pub struct RainfallObservation {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub rainfall_mm: f64,
}

/// Temperature tolerance range for a crop. `best` is optional; callers
/// fall back to the min/max midpoint when it is absent.
#[derive(Debug, Clone, Serialize)]
pub struct CropTemperatureRule {
    pub crop: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub best: Option<f64>,
}

/// Rainfall tolerance range for a crop.
#[derive(Debug, Clone, Serialize)]
pub struct CropRainfallRule {
    pub crop: String,
    pub rainfall_min: f64,
    pub rainfall_max: f64,
}

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::models::{
    CropRainfallRule, CropTemperatureRule, RainfallObservation, TemperatureObservation,
};
use super::StoreError;

/// Column lookup against a trimmed header row.
fn column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, StoreError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or(StoreError::MissingColumn(name))
}

fn parse_f64(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(field: &str) -> Option<NaiveDate> {
    let trimmed = field.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

/// Load the daily temperature dataset.
///
/// Rows with an unparseable date or a blank station name are dropped;
/// an unparseable temperature becomes `None` (excluded from training but
/// still visible to lookups).
pub fn load_temperature_csv(path: &Path) -> Result<Vec<TemperatureObservation>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let date_col = column(&headers, "date")?;
    let id_col = column(&headers, "station_id")?;
    let temp_col = column(&headers, "avg_temp")?;
    let name_col = column(&headers, "station_name")?;

    let mut observations = Vec::new();
    let mut dropped = 0_usize;
    for record in reader.records() {
        let record = record?;
        let Some(date) = record.get(date_col).and_then(parse_date) else {
            dropped += 1;
            continue;
        };
        let station_name = record.get(name_col).unwrap_or("").trim().to_string();
        if station_name.is_empty() {
            dropped += 1;
            continue;
        }
        observations.push(TemperatureObservation {
            station_id: record.get(id_col).unwrap_or("").trim().to_string(),
            station_name,
            date,
            avg_temp: record.get(temp_col).and_then(parse_f64),
        });
    }
    debug!(
        rows = observations.len(),
        dropped, "loaded temperature dataset"
    );
    Ok(observations)
}

/// Load the monthly rainfall dataset. The station column is kept as a
/// trimmed string and never numerically coerced; rows with unparseable
/// year/month/rainfall are dropped.
pub fn load_rainfall_csv(path: &Path) -> Result<Vec<RainfallObservation>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let station_col = column(&headers, "Bureau of Meteorology station number")?;
    let year_col = column(&headers, "Year")?;
    let month_col = column(&headers, "Month")?;
    let rain_col = column(&headers, "Total_Monthly_Rainfall_mm")?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let station_id = record.get(station_col).unwrap_or("").trim().to_string();
        let year = record.get(year_col).and_then(parse_f64).map(|v| v as i32);
        let month = record.get(month_col).and_then(parse_f64).map(|v| v as u32);
        let rainfall = record.get(rain_col).and_then(parse_f64);
        let (Some(year), Some(month), Some(rainfall_mm)) = (year, month, rainfall) else {
            continue;
        };
        if station_id.is_empty() || !(1..=12).contains(&month) {
            continue;
        }
        observations.push(RainfallObservation {
            station_id,
            year,
            month,
            rainfall_mm,
        });
    }
    debug!(rows = observations.len(), "loaded rainfall dataset");
    Ok(observations)
}

/// Load the crop temperature tolerance table. Min/best/max are re-sorted
/// per row so `min <= best <= max` even when the source mixed them up.
pub fn load_crop_temperature_csv(path: &Path) -> Result<Vec<CropTemperatureRule>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let crop_col = column(&headers, "Crop")?;
    let min_col = column(&headers, "Temp_Min")?;
    let max_col = column(&headers, "Temp_Max")?;
    let best_col = headers.iter().position(|h| h.trim() == "Best");

    let mut rules = Vec::new();
    for record in reader.records() {
        let record = record?;
        let crop = record.get(crop_col).unwrap_or("").trim().to_string();
        let min = record.get(min_col).and_then(parse_f64);
        let max = record.get(max_col).and_then(parse_f64);
        let (Some(min), Some(max)) = (min, max) else {
            continue;
        };
        if crop.is_empty() {
            continue;
        }
        let best = best_col
            .and_then(|col| record.get(col))
            .and_then(parse_f64);

        let (temp_min, best, temp_max) = match best {
            Some(best) => {
                let mut values = [min, best, max];
                values.sort_by(f64::total_cmp);
                (values[0], Some(values[1]), values[2])
            }
            None => (min.min(max), None, min.max(max)),
        };
        rules.push(CropTemperatureRule {
            crop,
            temp_min,
            temp_max,
            best,
        });
    }
    debug!(rows = rules.len(), "loaded crop temperature rules");
    Ok(rules)
}

/// Load the crop rainfall tolerance table.
pub fn load_crop_rainfall_csv(path: &Path) -> Result<Vec<CropRainfallRule>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let crop_col = column(&headers, "Crop")?;
    let min_col = column(&headers, "Rainfall_Min")?;
    let max_col = column(&headers, "Rainfall_Max")?;

    let mut rules = Vec::new();
    for record in reader.records() {
        let record = record?;
        let crop = record.get(crop_col).unwrap_or("").trim().to_string();
        let min = record.get(min_col).and_then(parse_f64);
        let max = record.get(max_col).and_then(parse_f64);
        let (Some(rainfall_min), Some(rainfall_max)) = (min, max) else {
            continue;
        };
        if crop.is_empty() {
            continue;
        }
        rules.push(CropRainfallRule {
            crop,
            rainfall_min,
            rainfall_max,
        });
    }
    debug!(rows = rules.len(), "loaded crop rainfall rules");
    Ok(rules)
}

/// Run a loader, falling back to an empty table (with a warning) when the
/// file is missing or unreadable. The service still boots without any
/// individual dataset.
pub fn load_or_empty<T>(
    description: &str,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<Vec<T>, StoreError>,
) -> Vec<T> {
    match load(path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                dataset = description,
                path = %path.display(),
                error = %e,
                "could not load dataset; continuing with an empty table"
            );
            Vec::new()
        }
    }
}

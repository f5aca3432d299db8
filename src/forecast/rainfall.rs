use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ForecastError;
use crate::features::{month_cyclical, rainfall_training_rows, StationEncoder};
use crate::model::{
    GradientBoostingRegressor, NewtonBoostingRegressor, RandomForestRegressor, Regressor,
    StackingRegressor, StandardScaler,
};
use crate::store::RainfallObservation;

/// Minimum historical rows a station needs to be forecast at all.
const MIN_HISTORY_ROWS: usize = 12;
/// How many trailing working-history rows feed the lag features.
const FEATURE_WINDOW: usize = 24;
const CV_FOLDS: usize = 5;
const ENSEMBLE_SEED: u64 = 42;

/// One forecast month for one station.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRainfallForecast {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub predicted_rainfall_mm: f64,
}

/// A station's private working history: seeded from the real
/// observations and extended with each produced forecast so later months
/// see earlier predictions in their lag features.
#[derive(Debug, Clone, Copy)]
struct WorkingRow {
    month: u32,
    rainfall_mm: f64,
}

/// Train the stacked ensemble once across all stations, then forecast
/// months 1..12 of the target year for each requested station.
///
/// Stations with fewer than 12 historical rows are skipped silently (no
/// partial output); every other requested station yields exactly 12 rows.
/// Month order is load-bearing: each prediction is appended to the
/// station's working history before the next month is derived, so an
/// early-month bias propagates into later lag features by design.
pub fn forecast_rainfall(
    observations: &[RainfallObservation],
    station_ids: &[String],
    target_year: i32,
) -> Result<Vec<MonthlyRainfallForecast>, ForecastError> {
    let training = rainfall_training_rows(observations);
    info!(
        training_rows = training.len(),
        stations = station_ids.len(),
        target_year,
        "training stacked rainfall ensemble"
    );

    let encoder = StationEncoder::fit(training.iter().map(|r| r.station_id.as_str()));
    let raw_matrix: Vec<Vec<f64>> = training
        .iter()
        .map(|row| {
            let mut features = row.numeric_features();
            features.extend(encoder.encode(&row.station_id));
            features
        })
        .collect();
    let targets: Vec<f64> = training.iter().map(|r| r.target).collect();

    // Scaling statistics are fitted once here and reused verbatim for
    // every prediction row; anything else silently misaligns.
    let scaler = StandardScaler::fit(&raw_matrix);
    let scaled_matrix = scaler.transform(&raw_matrix);

    let bases: Vec<Box<dyn Regressor>> = vec![
        Box::new(
            RandomForestRegressor::new(100, Some(20), ENSEMBLE_SEED).with_leaf_size(2),
        ),
        Box::new(GradientBoostingRegressor::new(100, 3, 0.05)),
        Box::new(NewtonBoostingRegressor::new(100, 3, 0.05)),
    ];
    let mut ensemble = StackingRegressor::new(bases, CV_FOLDS);
    ensemble.fit(&scaled_matrix, &targets)?;

    let mut histories = seed_working_histories(observations);
    let mut forecasts = Vec::with_capacity(station_ids.len() * 12);

    for station_id in station_ids {
        let history = histories.entry(station_id.clone()).or_default();
        if history.len() < MIN_HISTORY_ROWS {
            warn!(
                station = %station_id,
                rows = history.len(),
                "skipping station: insufficient historical data"
            );
            continue;
        }

        for month in 1..=12 {
            let window_start = history.len().saturating_sub(FEATURE_WINDOW);
            let window = &history[window_start..];

            let last_month = window[window.len() - 1].rainfall_mm;
            let last_year = window
                .iter()
                .rev()
                .find(|row| row.month == month)
                .map(|row| row.rainfall_mm)
                .ok_or_else(|| ForecastError::MissingSeasonalLag {
                    station: station_id.clone(),
                    month,
                })?;
            let rolling = window[window.len() - 3..]
                .iter()
                .map(|row| row.rainfall_mm)
                .sum::<f64>()
                / 3.0;

            let (month_sin, month_cos) = month_cyclical(month);
            let mut features = vec![
                target_year as f64,
                month_sin,
                month_cos,
                last_month,
                last_year,
                rolling,
            ];
            features.extend(encoder.encode(station_id));
            let scaled = scaler.transform_row(&features);

            // Physical rainfall cannot be negative.
            let predicted = ensemble.predict_one(&scaled).max(0.0);
            debug!(station = %station_id, month, predicted, "forecast month");

            forecasts.push(MonthlyRainfallForecast {
                station_id: station_id.clone(),
                year: target_year,
                month,
                predicted_rainfall_mm: predicted,
            });
            // Autoregressive feedback: the prediction joins the working
            // history before the next month is derived.
            history.push(WorkingRow {
                month,
                rainfall_mm: predicted,
            });
        }
    }

    Ok(forecasts)
}

/// Per-station chronological working copies of the historical record.
fn seed_working_histories(
    observations: &[RainfallObservation],
) -> HashMap<String, Vec<WorkingRow>> {
    let mut sorted: Vec<&RainfallObservation> = observations.iter().collect();
    sorted.sort_by(|a, b| (&a.station_id, a.year, a.month).cmp(&(&b.station_id, b.year, b.month)));

    let mut histories: HashMap<String, Vec<WorkingRow>> = HashMap::new();
    for obs in sorted {
        histories
            .entry(obs.station_id.clone())
            .or_default()
            .push(WorkingRow {
                month: obs.month,
                rainfall_mm: obs.rainfall_mm,
            });
    }
    histories
}

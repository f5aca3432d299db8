use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, warn};

use super::ForecastError;
use crate::features::{future_month_rows, temperature_training_rows};
use crate::model::{
    DecisionTreeRegressor, PolynomialRegression, RandomForestRegressor, Regressor,
};
use crate::store::TemperatureObservation;

/// Fixed seed shared by every tree-based model so repeated calls with
/// identical inputs yield bit-identical output.
pub const MODEL_SEED: u64 = 42;

const POLYNOMIAL_DEGREE: usize = 4;
const TREE_MAX_DEPTH: usize = 10;
const FOREST_TREES: usize = 200;

/// The three interchangeable temperature model strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureModelKind {
    Polynomial,
    DecisionTree,
    RandomForest,
}

impl TemperatureModelKind {
    pub const ALL: [TemperatureModelKind; 3] = [
        TemperatureModelKind::Polynomial,
        TemperatureModelKind::DecisionTree,
        TemperatureModelKind::RandomForest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureModelKind::Polynomial => "polynomial",
            TemperatureModelKind::DecisionTree => "decision_tree",
            TemperatureModelKind::RandomForest => "random_forest",
        }
    }

    /// Strict parse, for callers that want to reject bad input.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "polynomial" => Some(TemperatureModelKind::Polynomial),
            "decision_tree" => Some(TemperatureModelKind::DecisionTree),
            "random_forest" => Some(TemperatureModelKind::RandomForest),
            _ => None,
        }
    }

    /// Lenient parse: an unrecognized key substitutes the default model
    /// (random forest). The substitution is logged but never an error;
    /// existing callers rely on it.
    pub fn parse_or_default(key: &str) -> Self {
        Self::parse(key).unwrap_or_else(|| {
            warn!(model_key = key, "unrecognized model key; falling back to random_forest");
            TemperatureModelKind::RandomForest
        })
    }

    fn build(&self) -> Box<dyn Regressor> {
        match self {
            TemperatureModelKind::Polynomial => {
                Box::new(PolynomialRegression::new(POLYNOMIAL_DEGREE))
            }
            TemperatureModelKind::DecisionTree => {
                Box::new(DecisionTreeRegressor::new(Some(TREE_MAX_DEPTH)))
            }
            TemperatureModelKind::RandomForest => {
                Box::new(RandomForestRegressor::new(FOREST_TREES, None, MODEL_SEED))
            }
        }
    }
}

/// One predicted day of the requested month.
#[derive(Debug, Clone, Serialize)]
pub struct DailyTemperatureForecast {
    pub day: u32,
    pub predicted_temp: f64,
}

/// Train a per-request model on one station's history and predict every
/// day of the target month.
///
/// Training rows are those with `year < target_year`; when no prior years
/// exist the entire station history is used instead, so any station with
/// data produces a non-empty training set. A station with no rows at all
/// yields an empty result, not an error.
pub fn forecast_temperature(
    observations: &[TemperatureObservation],
    station_name: &str,
    target_year: i32,
    target_month: u32,
    kind: TemperatureModelKind,
) -> Result<Vec<DailyTemperatureForecast>, ForecastError> {
    let station_rows: Vec<&TemperatureObservation> = observations
        .iter()
        .filter(|o| o.station_name == station_name)
        .collect();
    if station_rows.is_empty() {
        debug!(station = station_name, "no historical rows; returning empty forecast");
        return Ok(Vec::new());
    }

    let prior_years: Vec<&TemperatureObservation> = station_rows
        .iter()
        .copied()
        .filter(|o| o.date.year() < target_year)
        .collect();
    let (x, y) = if prior_years.iter().any(|o| o.avg_temp.is_some()) {
        temperature_training_rows(&prior_years)
    } else {
        // Explicit fallback: no usable prior-year rows, train on the
        // whole station history instead.
        debug!(
            station = station_name,
            target_year, "no prior-year training rows; using full history"
        );
        temperature_training_rows(&station_rows)
    };
    if x.is_empty() {
        return Ok(Vec::new());
    }

    let mut model = kind.build();
    model.fit(&x, &y)?;

    let future = future_month_rows(target_year, target_month).ok_or(
        ForecastError::InvalidTargetMonth {
            year: target_year,
            month: target_month,
        },
    )?;
    let predictions = model.predict(&future);

    Ok(predictions
        .into_iter()
        .zip(1..)
        .map(|(predicted_temp, day)| DailyTemperatureForecast { day, predicted_temp })
        .collect())
}

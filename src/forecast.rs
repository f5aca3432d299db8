pub mod rainfall;
pub mod temperature;

pub use rainfall::{forecast_rainfall, MonthlyRainfallForecast};
pub use temperature::{forecast_temperature, DailyTemperatureForecast, TemperatureModelKind};

use crate::model::ModelError;

/// Failures of the forecasting core. Leniency policies (unknown station,
/// insufficient history, unknown model key) never surface here; only
/// genuinely unrecoverable conditions do.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("model fitting failed: {0}")]
    Model(#[from] ModelError),
    #[error("{year}-{month} is not a valid calendar month")]
    InvalidTargetMonth { year: i32, month: u32 },
    #[error("station {station} has no row for month {month} in its recent history")]
    MissingSeasonalLag { station: String, month: u32 },
}

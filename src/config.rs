use std::env;
use std::path::PathBuf;

use crate::forecast::TemperatureModelKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub temperature_csv: PathBuf,
    pub crop_temperature_csv: PathBuf,
    pub rainfall_csv: PathBuf,
    pub crop_rainfall_csv: PathBuf,
    /// The single year the models forecast into; every earlier year with
    /// data serves actuals.
    pub forecast_year: i32,
    pub default_model: TemperatureModelKind,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            temperature_csv: env::var("TEMPERATURE_CSV")
                .unwrap_or_else(|_| "datasets/temperature_daily_clean.csv".to_string())
                .into(),
            crop_temperature_csv: env::var("CROP_TEMPERATURE_CSV")
                .unwrap_or_else(|_| "datasets/Australian_Crop_Suitability.csv".to_string())
                .into(),
            rainfall_csv: env::var("RAINFALL_CSV")
                .unwrap_or_else(|_| "datasets/monthly_rainfall_summary.csv".to_string())
                .into(),
            crop_rainfall_csv: env::var("CROP_RAINFALL_CSV")
                .unwrap_or_else(|_| "datasets/crop_rainfall_suitability.csv".to_string())
                .into(),
            forecast_year: env::var("FORECAST_YEAR")
                .unwrap_or_else(|_| "2025".to_string())
                .parse()
                .unwrap_or(2025),
            default_model: env::var("DEFAULT_MODEL")
                .map(|key| TemperatureModelKind::parse_or_default(&key))
                .unwrap_or(TemperatureModelKind::RandomForest),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

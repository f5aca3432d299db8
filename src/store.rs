pub mod loader;
pub mod models;
pub mod repository;

pub use models::{CropRainfallRule, CropTemperatureRule, RainfallObservation, TemperatureObservation};
pub use repository::{CropRepository, RainfallRepository, TemperatureRepository};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}' in dataset header")]
    MissingColumn(&'static str),
}

pub mod crop_service;
pub mod rainfall_service;
pub mod suitability_service;
pub mod temperature_service;

pub use crop_service::CropService;
pub use rainfall_service::RainfallService;
pub use suitability_service::SuitabilityService;
pub use temperature_service::TemperatureService;

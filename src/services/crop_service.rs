use serde::Serialize;

use crate::store::CropRepository;

/// Temperature tolerance response for `/crop/limits`.
#[derive(Debug, Clone, Serialize)]
pub struct CropTemperatureLimits {
    pub crop: String,
    pub min: f64,
    pub max: f64,
    pub best: f64,
}

/// Rainfall tolerance response for `/crop/rainfall-limits`.
#[derive(Debug, Clone, Serialize)]
pub struct CropRainfallLimits {
    pub crop: String,
    pub min: f64,
    pub max: f64,
}

/// Crop tolerance reference lookups over the startup-loaded tables.
#[derive(Clone)]
pub struct CropService {
    repo: CropRepository,
}

impl CropService {
    pub fn new(repo: CropRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &CropRepository {
        &self.repo
    }

    pub fn temperature_crops(&self) -> Vec<String> {
        self.repo.temperature_crop_names()
    }

    pub fn rainfall_crops(&self) -> Vec<String> {
        self.repo.rainfall_crop_names()
    }

    pub fn temperature_limits(&self, crop: &str) -> Option<CropTemperatureLimits> {
        self.repo.find_temperature_rule(crop).map(|rule| {
            // Midpoint fallback when the table carries no explicit best.
            let best = rule
                .best
                .unwrap_or((rule.temp_min + rule.temp_max) / 2.0);
            CropTemperatureLimits {
                crop: rule.crop.clone(),
                min: rule.temp_min,
                max: rule.temp_max,
                best,
            }
        })
    }

    pub fn rainfall_limits(&self, crop: &str) -> Option<CropRainfallLimits> {
        self.repo.find_rainfall_rule(crop).map(|rule| CropRainfallLimits {
            crop: rule.crop.clone(),
            min: rule.rainfall_min,
            max: rule.rainfall_max,
        })
    }
}

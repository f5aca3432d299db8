pub mod boosting;
pub mod forest;
pub mod linear;
pub mod scaler;
pub mod stacking;
pub mod tree;

pub use boosting::{GradientBoostingRegressor, NewtonBoostingRegressor};
pub use forest::RandomForestRegressor;
pub use linear::{LinearRegression, PolynomialRegression};
pub use scaler::StandardScaler;
pub use stacking::StackingRegressor;
pub use tree::DecisionTreeRegressor;

/// Failure modes of the in-crate model fitting routines.
///
/// Fitting is per-request and ephemeral; any of these propagate to the
/// caller as a service error rather than being silently recovered.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("feature/target length mismatch: {features} rows vs {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("normal equations are singular (degenerate training data)")]
    SingularSystem,
    #[error("not enough rows ({rows}) for {folds}-fold cross-validation")]
    TooFewRowsForCv { rows: usize, folds: usize },
}

/// A regression model that can be fitted to a numeric feature matrix.
///
/// `unfitted` returns a fresh model with the same hyperparameters; the
/// stacking ensemble uses it to train per-fold copies during
/// cross-validation.
pub trait Regressor: Send + Sync {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError>;
    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64>;
    fn unfitted(&self) -> Box<dyn Regressor>;
}

pub(crate) fn check_training_set(x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            features: x.len(),
            targets: y.len(),
        });
    }
    Ok(())
}

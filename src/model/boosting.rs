use super::tree::{RegressionTree, TreeParams};
use super::{check_training_set, ModelError, Regressor};

/// Classic gradient boosting for squared loss: start from the target
/// mean, then repeatedly fit a shallow tree to the current residuals and
/// add its (learning-rate-scaled) predictions. Deterministic, no
/// subsampling.
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    init: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            init: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let boosted: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_one(row))
            .sum::<f64>();
        self.init + self.learning_rate * boosted
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.len();
        let params = TreeParams {
            max_depth: Some(self.max_depth),
            ..TreeParams::default()
        };
        let indices: Vec<usize> = (0..n).collect();

        self.init = y.iter().sum::<f64>() / n as f64;
        let mut current: Vec<f64> = vec![self.init; n];
        self.trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, c)| t - c).collect();
            let tree = RegressionTree::fit(x, &residuals, &indices, &params);
            for (value, row) in current.iter_mut().zip(x) {
                *value += self.learning_rate * tree.predict_one(row);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self::new(self.n_estimators, self.max_depth, self.learning_rate))
    }
}

/// Newton-style boosting variant with the same hyperparameter surface but
/// an independent update rule: a constant 0.5 base score and L2-regularized
/// leaf values (`sum(residual) / (count + lambda)`). For squared loss the
/// hessian is the sample count, so this is the second-order update with
/// `lambda = 1`, mirroring how the rainfall ensemble's second booster
/// differs from the first.
#[derive(Debug, Clone)]
pub struct NewtonBoostingRegressor {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    lambda: f64,
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl NewtonBoostingRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            lambda: 1.0,
            base_score: 0.5,
            trees: Vec::new(),
        }
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let boosted: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_one(row))
            .sum::<f64>();
        self.base_score + self.learning_rate * boosted
    }
}

impl Regressor for NewtonBoostingRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.len();
        let params = TreeParams {
            max_depth: Some(self.max_depth),
            leaf_regularization: self.lambda,
            ..TreeParams::default()
        };
        let indices: Vec<usize> = (0..n).collect();

        let mut current: Vec<f64> = vec![self.base_score; n];
        self.trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, c)| t - c).collect();
            let tree = RegressionTree::fit(x, &residuals, &indices, &params);
            for (value, row) in current.iter_mut().zip(x) {
                *value += self.learning_rate * tree.predict_one(row);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self::new(self.n_estimators, self.max_depth, self.learning_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| if i < 15 { 3.0 } else { 8.0 }).collect();
        (x, y)
    }

    #[test]
    fn gradient_boosting_converges_to_the_step() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(100, 3, 0.05);
        model.fit(&x, &y).unwrap();
        assert!((model.predict_one(&[3.0]) - 3.0).abs() < 0.2);
        assert!((model.predict_one(&[25.0]) - 8.0).abs() < 0.2);
    }

    #[test]
    fn newton_boosting_converges_to_the_step() {
        let (x, y) = step_data();
        let mut model = NewtonBoostingRegressor::new(100, 3, 0.05);
        model.fit(&x, &y).unwrap();
        assert!((model.predict_one(&[3.0]) - 3.0).abs() < 0.3);
        assert!((model.predict_one(&[25.0]) - 8.0).abs() < 0.3);
    }

    #[test]
    fn the_two_boosters_are_distinct_implementations() {
        let (x, y) = step_data();
        let mut gb = GradientBoostingRegressor::new(10, 3, 0.05);
        let mut newton = NewtonBoostingRegressor::new(10, 3, 0.05);
        gb.fit(&x, &y).unwrap();
        newton.fit(&x, &y).unwrap();
        assert_ne!(gb.predict(&x), newton.predict(&x));
    }

    #[test]
    fn boosting_is_deterministic() {
        let (x, y) = step_data();
        let mut a = GradientBoostingRegressor::new(50, 3, 0.05);
        let mut b = GradientBoostingRegressor::new(50, 3, 0.05);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x), b.predict(&x));
    }
}

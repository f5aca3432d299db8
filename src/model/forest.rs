use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::tree::{RegressionTree, TreeParams};
use super::{check_training_set, ModelError, Regressor};

/// Bagged ensemble of regression trees, averaged at prediction time.
///
/// Each tree draws its bootstrap sample from an rng seeded with
/// `seed + tree_index`, so the fitted forest is identical whether the
/// trees are built in parallel or serially, and identical across runs.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    params: TreeParams,
    seed: u64,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            n_estimators,
            params: TreeParams {
                max_depth,
                ..TreeParams::default()
            },
            seed,
            trees: Vec::new(),
        }
    }

    pub fn with_leaf_size(mut self, min_samples_leaf: usize) -> Self {
        self.params.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn with_split_size(mut self, min_samples_split: usize) -> Self {
        self.params.min_samples_split = min_samples_split;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict_one(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.len();
        let params = self.params.clone();
        let seed = self.seed;

        self.trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_index as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, &params)
            })
            .collect();
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            n_estimators: self.n_estimators,
            params: self.params.clone(),
            seed: self.seed,
            trees: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..40)
            .map(|i| if i < 20 { 2.0 } else { 9.0 } + (i % 3) as f64 * 0.1)
            .collect();
        (x, y)
    }

    #[test]
    fn fit_is_deterministic_for_a_fixed_seed() {
        let (x, y) = toy_data();
        let mut a = RandomForestRegressor::new(25, None, 42);
        let mut b = RandomForestRegressor::new(25, None, 42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let query = vec![vec![3.0, 3.0], vec![30.0, 2.0]];
        assert_eq!(a.predict(&query), b.predict(&query));
    }

    #[test]
    fn different_seeds_differ() {
        let (x, y) = toy_data();
        let mut a = RandomForestRegressor::new(10, None, 1);
        let mut b = RandomForestRegressor::new(10, None, 2);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        // Bootstrap samples differ, so at least one prediction should.
        let query: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        assert_ne!(a.predict(&query), b.predict(&query));
    }

    #[test]
    fn predictions_track_the_step() {
        let (x, y) = toy_data();
        let mut forest = RandomForestRegressor::new(50, None, 42);
        forest.fit(&x, &y).unwrap();
        assert!(forest.predict_one(&[5.0, 5.0]) < 4.0);
        assert!(forest.predict_one(&[35.0, 0.0]) > 7.0);
    }

    #[test]
    fn empty_training_set_is_an_error() {
        let mut forest = RandomForestRegressor::new(5, None, 42);
        assert!(matches!(
            forest.fit(&[], &[]),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}

use super::linear::LinearRegression;
use super::{check_training_set, ModelError, Regressor};

/// Stacking ensemble: a linear meta-regressor trained on the out-of-fold
/// predictions of the base models.
///
/// Fitting runs k-fold cross-validation (contiguous folds, no shuffling)
/// to produce one out-of-fold prediction per base model per training row,
/// fits the meta-regressor on that matrix, then refits every base model on
/// the full training set for prediction time.
pub struct StackingRegressor {
    bases: Vec<Box<dyn Regressor>>,
    meta: LinearRegression,
    cv_folds: usize,
}

impl StackingRegressor {
    pub fn new(bases: Vec<Box<dyn Regressor>>, cv_folds: usize) -> Self {
        Self {
            bases,
            meta: LinearRegression::new(),
            cv_folds,
        }
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.len();
        if n < self.cv_folds {
            return Err(ModelError::TooFewRowsForCv {
                rows: n,
                folds: self.cv_folds,
            });
        }

        let mut oof = vec![vec![0.0_f64; self.bases.len()]; n];
        for (fold_start, fold_end) in fold_bounds(n, self.cv_folds) {
            let mut train_x: Vec<Vec<f64>> = Vec::with_capacity(n - (fold_end - fold_start));
            let mut train_y: Vec<f64> = Vec::with_capacity(train_x.capacity());
            for i in (0..fold_start).chain(fold_end..n) {
                train_x.push(x[i].clone());
                train_y.push(y[i]);
            }
            let holdout: Vec<Vec<f64>> = x[fold_start..fold_end].to_vec();

            for (base_index, base) in self.bases.iter().enumerate() {
                let mut fold_model = base.unfitted();
                fold_model.fit(&train_x, &train_y)?;
                for (offset, pred) in fold_model.predict(&holdout).into_iter().enumerate() {
                    oof[fold_start + offset][base_index] = pred;
                }
            }
        }

        self.meta.fit(&oof, y)?;
        for base in &mut self.bases {
            base.fit(x, y)?;
        }
        Ok(())
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let query = [row.to_vec()];
        let base_preds: Vec<f64> = self
            .bases
            .iter()
            .map(|base| base.predict(&query)[0])
            .collect();
        self.meta.predict_one(&base_preds)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        let per_base: Vec<Vec<f64>> = self.bases.iter().map(|base| base.predict(x)).collect();
        (0..x.len())
            .map(|i| {
                let row: Vec<f64> = per_base.iter().map(|preds| preds[i]).collect();
                self.meta.predict_one(&row)
            })
            .collect()
    }
}

/// Contiguous fold boundaries; the first `n % k` folds get one extra row.
fn fold_bounds(n: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n / k;
    let extra = n % k;
    let mut bounds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        bounds.push((start, start + size));
        start += size;
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::RandomForestRegressor;
    use crate::model::tree::DecisionTreeRegressor;

    #[test]
    fn fold_bounds_cover_every_row_once() {
        let bounds = fold_bounds(13, 5);
        assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 9), (9, 11), (11, 13)]);
        assert_eq!(bounds.last().unwrap().1, 13);
    }

    #[test]
    fn stacking_fits_and_tracks_a_linear_target() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| 2.0 * i as f64 + 1.0).collect();

        let bases: Vec<Box<dyn Regressor>> = vec![
            Box::new(DecisionTreeRegressor::new(Some(6))),
            Box::new(RandomForestRegressor::new(20, Some(6), 42)),
        ];
        let mut stack = StackingRegressor::new(bases, 5);
        stack.fit(&x, &y).unwrap();

        // Interpolation inside the training range should be close.
        let pred = stack.predict_one(&[20.0]);
        assert!((pred - 41.0).abs() < 5.0, "prediction {pred}");
    }

    #[test]
    fn too_few_rows_for_cv_is_an_error() {
        let x: Vec<Vec<f64>> = (0..3).map(|i| vec![i as f64]).collect();
        let y = vec![1.0, 2.0, 3.0];
        let bases: Vec<Box<dyn Regressor>> =
            vec![Box::new(DecisionTreeRegressor::new(Some(2)))];
        let mut stack = StackingRegressor::new(bases, 5);
        assert!(matches!(
            stack.fit(&x, &y),
            Err(ModelError::TooFewRowsForCv { rows: 3, folds: 5 })
        ));
    }
}

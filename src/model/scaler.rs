/// Column-wise standardization to zero mean and unit variance.
///
/// The statistics are computed once from the training matrix and must be
/// reused unchanged for every later prediction row; rescaling prediction
/// rows with different statistics silently corrupts results. Zero-variance
/// columns are passed through unscaled.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let width = rows[0].len();

        let mut means = vec![0.0_f64; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut stds = vec![0.0_f64; width];
        for row in rows {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                let diff = value - mean;
                *std += diff * diff;
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
            if *std < 1e-12 {
                *std = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 100.0 + 3.0 * i as f64]).collect();
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        for col in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / 10.0;
            let var: f64 = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 10.0;
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_column_survives_unscaled() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![7.0, i as f64]).collect();
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform_row(&[7.0, 2.0]);
        assert_eq!(scaled[0], 0.0);
        assert!(scaled[1].is_finite());
    }

    #[test]
    fn training_statistics_are_reused_for_new_rows() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let scaler = StandardScaler::fit(&rows);
        // mean 1.5, population std ~1.118
        let scaled = scaler.transform_row(&[1.5]);
        assert!(scaled[0].abs() < 1e-12);
        let scaled = scaler.transform_row(&[100.0]);
        assert!(scaled[0] > 10.0);
    }
}

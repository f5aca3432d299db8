use super::{check_training_set, ModelError, Regressor};

/// Ordinary least squares fitted via the normal equations.
///
/// The design matrix gets an implicit intercept column; the system is
/// solved by Gaussian elimination with partial pivoting. A singular
/// system (e.g. perfectly collinear columns) is reported as `ModelError`.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(v, c)| v * c)
                .sum::<f64>()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let solution = solve_normal_equations(x, y, 0.0)?;
        self.intercept = solution[0];
        self.coefficients = solution[1..].to_vec();
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self::new())
    }
}

/// Accumulate `X^T X` / `X^T y` (intercept column first) and solve.
/// `ridge > 0` adds `ridge * n` to the non-intercept diagonal.
fn solve_normal_equations(
    x: &[Vec<f64>],
    y: &[f64],
    ridge: f64,
) -> Result<Vec<f64>, ModelError> {
    let dim = x[0].len() + 1;
    let mut xtx = vec![vec![0.0_f64; dim]; dim];
    let mut xty = vec![0.0_f64; dim];
    for (row, &target) in x.iter().zip(y) {
        let mut augmented = Vec::with_capacity(dim);
        augmented.push(1.0);
        augmented.extend_from_slice(row);
        for i in 0..dim {
            xty[i] += augmented[i] * target;
            for j in 0..dim {
                xtx[i][j] += augmented[i] * augmented[j];
            }
        }
    }
    if ridge > 0.0 {
        for (i, row) in xtx.iter_mut().enumerate().skip(1) {
            row[i] += ridge * x.len() as f64;
        }
    }
    solve(&mut xtx, &mut xty)
}

/// Solve `a * w = b` in place via Gaussian elimination with partial pivoting.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>, ModelError> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .ok_or(ModelError::SingularSystem)?;
        if a[pivot][col].abs() < 1e-12 {
            return Err(ModelError::SingularSystem);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for col in (row + 1)..n {
            acc -= a[row][col] * solution[col];
        }
        solution[row] = acc / a[row][row];
    }
    Ok(solution)
}

/// Polynomial regression: the full cross/power expansion of the input
/// features up to `degree` total degree, fed into least squares.
///
/// For three inputs at degree 4 this is every monomial
/// `x1^a * x2^b * x3^c` with `1 <= a+b+c <= 4`. High-degree monomials of
/// calendar features span thirteen orders of magnitude and are affinely
/// dependent whenever few distinct years are present, so the expanded
/// columns are standardized and the normal equations carry a small ridge
/// term; plain elimination would reject such systems as singular.
#[derive(Debug, Clone)]
pub struct PolynomialRegression {
    degree: usize,
    means: Vec<f64>,
    scales: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
}

const POLY_RIDGE: f64 = 1e-6;

impl PolynomialRegression {
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            means: Vec::new(),
            scales: Vec::new(),
            coefficients: Vec::new(),
            intercept: 0.0,
        }
    }

    fn expand(&self, row: &[f64]) -> Vec<f64> {
        let mut terms = Vec::new();
        let mut exponents = vec![0_usize; row.len()];
        expand_rec(row, self.degree, 0, &mut exponents, &mut terms);
        terms
    }

    fn standardize(&self, expanded: &[f64]) -> Vec<f64> {
        expanded
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect()
    }
}

/// Enumerate exponent combinations with total degree 1..=degree.
fn expand_rec(
    row: &[f64],
    remaining: usize,
    position: usize,
    exponents: &mut Vec<usize>,
    terms: &mut Vec<f64>,
) {
    if position == row.len() {
        if exponents.iter().sum::<usize>() > 0 {
            let term = row
                .iter()
                .zip(exponents.iter())
                .map(|(v, &e)| v.powi(e as i32))
                .product();
            terms.push(term);
        }
        return;
    }
    for exp in 0..=remaining {
        exponents[position] = exp;
        expand_rec(row, remaining - exp, position + 1, exponents, terms);
    }
    exponents[position] = 0;
}

impl Regressor for PolynomialRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let expanded: Vec<Vec<f64>> = x.iter().map(|row| self.expand(row)).collect();

        let n = expanded.len() as f64;
        let width = expanded[0].len();
        self.means = vec![0.0; width];
        for row in &expanded {
            for (mean, v) in self.means.iter_mut().zip(row) {
                *mean += v / n;
            }
        }
        self.scales = vec![0.0; width];
        for row in &expanded {
            for ((scale, mean), v) in self.scales.iter_mut().zip(&self.means).zip(row) {
                *scale += (v - mean) * (v - mean) / n;
            }
        }
        for scale in &mut self.scales {
            // Constant columns (single training year) carry no signal;
            // leave them centered at zero.
            *scale = if scale.sqrt() < 1e-12 { 1.0 } else { scale.sqrt() };
        }

        let standardized: Vec<Vec<f64>> =
            expanded.iter().map(|row| self.standardize(row)).collect();
        let solution = solve_normal_equations(&standardized, y, POLY_RIDGE)?;
        self.intercept = solution[0];
        self.coefficients = solution[1..].to_vec();
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter()
            .map(|row| {
                let standardized = self.standardize(&self.expand(row));
                self.intercept
                    + standardized
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(v, c)| v * c)
                        .sum::<f64>()
            })
            .collect()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self::new(self.degree))
    }
}

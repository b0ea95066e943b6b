//! Ordinary least squares over a standardized design matrix.

use error_stack::{Report, bail};
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::ForecastError;

/// Tikhonov term added to the normal-equation diagonal.
const RIDGE: f64 = 1e-10;

/// Column-wise z-score transform fitted on a training matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl Standardizer {
    /// Mean and population standard deviation per column. A column with
    /// zero spread keeps scale 1 so it is only centered.
    pub fn fit(x: &Array2<f64>) -> Result<Self, Report<ForecastError>> {
        let Some(means) = x.mean_axis(Axis(0)) else {
            bail!(ForecastError::Shape);
        };
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std > 0.0 { std } else { 1.0 });
        Ok(Self { means, scales })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, Report<ForecastError>> {
        if x.ncols() != self.means.len() {
            bail!(ForecastError::Shape);
        }
        Ok((x - &self.means) / &self.scales)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, Report<ForecastError>> {
        if row.len() != self.means.len() {
            bail!(ForecastError::Shape);
        }
        Ok((&row - &self.means) / &self.scales)
    }
}

/// Fitted linear model `y = intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: Array1<f64>,
}

impl LinearFit {
    pub fn predict(&self, row: ArrayView1<f64>) -> Result<f64, Report<ForecastError>> {
        if row.len() != self.coefficients.len() {
            bail!(ForecastError::Shape);
        }
        let value = self.intercept + self.coefficients.dot(&row);
        if !value.is_finite() {
            bail!(ForecastError::NonFinite);
        }
        Ok(value)
    }
}

/// Fit `y ~ x` by least squares. Stateless: the returned parameters are
/// the only output.
///
/// Columns and target are centered first, so the intercept is recovered
/// from the means and the solve only involves the slopes.
pub fn fit_ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearFit, Report<ForecastError>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        bail!(ForecastError::Shape);
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        bail!(ForecastError::NonFinite);
    }

    let Some(x_mean) = x.mean_axis(Axis(0)) else {
        bail!(ForecastError::Shape);
    };
    let Some(y_mean) = y.mean() else {
        bail!(ForecastError::Shape);
    };

    let xc = x - &x_mean;
    let yc = y - y_mean;

    let mut xtx = xc.t().dot(&xc);
    for i in 0..xtx.nrows() {
        xtx[[i, i]] += RIDGE;
    }
    let xty = xc.t().dot(&yc);

    let coefficients = solve(xtx, xty)?;
    let intercept = y_mean - x_mean.dot(&coefficients);
    if !intercept.is_finite() {
        bail!(ForecastError::NonFinite);
    }

    Ok(LinearFit {
        intercept,
        coefficients,
    })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, Report<ForecastError>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        let pivot = a[[pivot_row, col]];
        if pivot == 0.0 || !pivot.is_finite() {
            bail!(ForecastError::Singular);
        }

        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }

    if x.iter().any(|v: &f64| !v.is_finite()) {
        bail!(ForecastError::NonFinite);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_relation() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 4.0], [4.0, 3.0], [5.0, 7.0]];
        let y = x.map_axis(Axis(1), |row| 1.5 + 2.0 * row[0] - 0.5 * row[1]);

        let fit = fit_ols(&x, &y).unwrap();
        assert!((fit.intercept - 1.5).abs() < 1e-6);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((fit.coefficients[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn predict_uses_intercept_and_slopes() {
        let fit = LinearFit {
            intercept: 1.0,
            coefficients: array![2.0, -1.0],
        };
        assert_eq!(fit.predict(array![3.0, 4.0].view()).unwrap(), 3.0);
        assert_eq!(
            fit.predict(array![1.0].view()).unwrap_err().current_context(),
            &ForecastError::Shape
        );
    }

    #[test]
    fn constant_columns_fit_the_mean() {
        let x = Array2::from_elem((10, 3), 4.0);
        let y = Array1::from_elem(10, 0.25);
        let fit = fit_ols(&x, &y).unwrap();
        assert!(fit.coefficients.iter().all(|c| c.abs() < 1e-12));
        assert!((fit.predict(array![4.0, 4.0, 4.0].view()).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn collinear_columns_stay_finite() {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| i as f64 * (j + 1) as f64);
        let y = Array1::from_shape_fn(20, |i| i as f64);
        let fit = fit_ols(&x, &y).unwrap();
        let prediction = fit.predict(array![5.0, 10.0].view()).unwrap();
        assert!((prediction - 5.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let x = Array2::zeros((4, 2));
        let y = Array1::zeros(3);
        assert_eq!(
            fit_ols(&x, &y).unwrap_err().current_context(),
            &ForecastError::Shape
        );
    }

    #[test]
    fn rejects_non_finite_input() {
        let mut x = Array2::zeros((4, 2));
        x[[1, 1]] = f64::NAN;
        let y = Array1::zeros(4);
        assert_eq!(
            fit_ols(&x, &y).unwrap_err().current_context(),
            &ForecastError::NonFinite
        );
    }

    #[test]
    fn standardizer_uses_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = Standardizer::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();
        assert_eq!(z, array![[-1.0, 0.0], [1.0, 0.0]]);
        let row = scaler.transform_row(array![2.0, 6.0].view()).unwrap();
        assert_eq!(row, array![0.0, 1.0]);
    }
}

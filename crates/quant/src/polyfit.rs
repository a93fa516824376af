//! Least-squares polynomial fitting.
//!
//! The demand forecaster fits a polynomial through the trailing window
//! of net-demand (and price) observations and extrapolates it a few
//! ticks ahead. The fit solves the Vandermonde normal equations with
//! Gaussian elimination; abscissas are shifted to the window origin
//! before fitting, which leaves the fitted curve unchanged but keeps
//! the system well scaled for tick-valued inputs.

/// A polynomial fitted to `(x, y)` observations, evaluated relative to
/// the origin it was fitted at.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPoly {
    origin: f64,
    /// Coefficients, lowest degree first.
    coeffs: Vec<f64>,
}

impl FittedPoly {
    /// Fit a polynomial of the requested degree through the points.
    ///
    /// The degree is capped at `points - 1` so the system stays
    /// determined. Returns `None` when the slices are empty or their
    /// lengths differ. An all-zero `ys` window is a valid input and
    /// yields the zero polynomial.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        let degree = degree.min(xs.len() - 1);
        let terms = degree + 1;
        let origin = xs[0];

        // Normal equations: A * c = b with A[j][k] = sum x^(j+k),
        // b[j] = sum y * x^j, over origin-shifted abscissas.
        let mut a = vec![vec![0.0; terms]; terms];
        let mut b = vec![0.0; terms];
        for (&x, &y) in xs.iter().zip(ys) {
            let x = x - origin;
            let mut x_pow = vec![1.0; 2 * terms - 1];
            for p in 1..x_pow.len() {
                x_pow[p] = x_pow[p - 1] * x;
            }
            for j in 0..terms {
                for k in 0..terms {
                    a[j][k] += x_pow[j + k];
                }
                b[j] += y * x_pow[j];
            }
        }

        let coeffs = solve(a, b)?;
        Some(Self { origin, coeffs })
    }

    /// Evaluate the polynomial at `x` (in the original coordinates).
    pub fn value(&self, x: f64) -> f64 {
        let x = x - self.origin;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Coefficients relative to the fit origin, lowest degree first.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }
}

/// Gaussian elimination with partial pivoting. A pivot collapsing to
/// zero means the column carries no information (e.g. duplicate
/// abscissas); the corresponding coefficient is fixed at zero instead
/// of failing, so degenerate windows still produce a usable curve.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    const PIVOT_EPS: f64 = 1e-12;

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < PIVOT_EPS {
            a[col][col] = 1.0;
            b[col] = 0.0;
            for row in col + 1..n {
                a[row][col] = 0.0;
            }
            continue;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
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

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        let value = sum / a[row][row];
        if !value.is_finite() {
            return None;
        }
        x[row] = value;
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_quadratic() {
        let xs: Vec<f64> = (0..10).map(|t| 100.0 + t as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 3.0 + 2.0 * x + 0.5 * x * x).collect();
        let poly = FittedPoly::fit(&xs, &ys, 2).unwrap();
        for &x in &[100.0, 105.0, 112.0] {
            let expected = 3.0 + 2.0 * x + 0.5 * x * x;
            assert!((poly.value(x) - expected).abs() < 1e-6 * expected.abs());
        }
    }

    #[test]
    fn test_all_zero_window_fits_flat_zero() {
        let xs: Vec<f64> = (0..10).map(|t| t as f64).collect();
        let ys = vec![0.0; 10];
        let poly = FittedPoly::fit(&xs, &ys, 9).unwrap();
        assert!(poly.value(15.0).abs() < 1e-9);
    }

    #[test]
    fn test_degree_capped_by_points() {
        let poly = FittedPoly::fit(&[1.0, 2.0], &[4.0, 6.0], 10).unwrap();
        assert_eq!(poly.coeffs().len(), 2);
        assert!((poly.value(3.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_degree_extrapolation_is_finite() {
        let xs: Vec<f64> = (190..200).map(|t| t as f64).collect();
        let ys: Vec<f64> = (0..10).map(|t| ((t * 7919) % 13) as f64 - 6.0).collect();
        let poly = FittedPoly::fit(&xs, &ys, 10).unwrap();
        assert!(poly.value(200.0).is_finite());
    }

    #[test]
    fn test_mismatched_or_empty_input() {
        assert!(FittedPoly::fit(&[], &[], 3).is_none());
        assert!(FittedPoly::fit(&[1.0], &[1.0, 2.0], 1).is_none());
    }
}

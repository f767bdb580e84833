use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Model file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Failed to fit model: {0}")]
    Fit(String),
}

/// Ordinary-least-squares linear model. `coefficients[0]` is the intercept;
/// the remaining entries pair with the input features in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionModel {
    pub coefficients: Vec<f64>,
}

impl RegressionModel {
    /// Fits the model to rows of features and their targets via the normal
    /// equations. Each row in `features` excludes the intercept term.
    pub fn fit(features: &[Vec<f64>], targets: &[f64]) -> Result<Self, ModelError> {
        if features.is_empty() || features.len() != targets.len() {
            return Err(ModelError::Fit(format!(
                "{} feature rows for {} targets",
                features.len(),
                targets.len()
            )));
        }
        let width = features[0].len() + 1;
        if features.iter().any(|row| row.len() + 1 != width) {
            return Err(ModelError::Fit("inconsistent feature row widths".into()));
        }
        if features.len() < width {
            return Err(ModelError::Fit(format!(
                "need at least {} samples for {} coefficients",
                width,
                width
            )));
        }

        // Normal equations: (XᵀX) beta = Xᵀy with X carrying a leading 1s column.
        let mut xtx = vec![vec![0.0f64; width]; width];
        let mut xty = vec![0.0f64; width];
        for (row, &y) in features.iter().zip(targets) {
            let mut design = Vec::with_capacity(width);
            design.push(1.0);
            design.extend_from_slice(row);
            for i in 0..width {
                xty[i] += design[i] * y;
                for j in 0..width {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }

        let coefficients = solve(xtx, xty)
            .ok_or_else(|| ModelError::Fit("singular normal-equation system".into()))?;
        Ok(Self { coefficients })
    }

    /// Predicts the target for one feature row (without the intercept term).
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let blob = fs::read(path)?;
        Ok(serde_json::from_slice(&blob)?)
    }
}

/// Expands a scalar into polynomial features `[x, x^2, .., x^degree]`.
pub fn polynomial_features(x: f64, degree: u32) -> Vec<f64> {
    (1..=degree).map(|d| x.powi(d as i32)).collect()
}

/// Gaussian elimination with partial pivoting on a small dense system.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for col in (row + 1)..n {
            acc -= a[row][col] * x[col];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}

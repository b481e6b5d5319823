//! Feature standardization applied by the dataset loader.
//!
//! Provides a per-column mean/std `Scaler`. Models are fitted on scaled
//! features, so the loader scales the evaluation set the same way before
//! handing it to the engine.
use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2, Axis};

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-6;
}

/// Fit a `Scaler` from a matrix where rows are samples and columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    ensure!(
        x.nrows() > 0 && x.ncols() > 0,
        "cannot fit a scaler on an empty {}x{} matrix",
        x.nrows(),
        x.ncols()
    );

    let mean = x
        .mean_axis(Axis(0))
        .context("failed to compute column means")?;
    let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Scaler::MIN_STD));

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler` and return a new matrix.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    ensure!(
        x.ncols() == sc.mean.len(),
        "scaler was fitted on {} columns, matrix has {}",
        sc.mean.len(),
        x.ncols()
    );

    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        row -= &sc.mean;
        row /= &sc.std;
    }
    Ok(out)
}

/// Fit a scaler and return the transformed matrix in one call.
pub fn fit_transform(x: &Array2<f64>) -> Result<Array2<f64>> {
    let sc = fit_scaler(x)?;
    transform_all(x, &sc)
}

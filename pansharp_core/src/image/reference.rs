//! Baseline D-lambda over channel-last batches.
//!
//! A direct double loop over band pairs that writes both similarity matrices
//! in `f64` and applies the score formula. Beyond the exponent and an empty
//! band axis it leaves input checks to the quality index. Used to cross-check
//! [`spectral_distortion_index`](super::d_lambda::spectral_distortion_index).

use ndarray::{s, Array2, ArrayView4, NdFloat};
use num_traits::ToPrimitive;

use super::uqi::{universal_image_quality_index, Reduction, WindowConfig};
use super::d_lambda::validate_p;
use crate::error::{MetricError, MetricResult};

/// D-lambda of two `(N, H, W, C)` batches.
pub fn baseline_d_lambda<A: NdFloat>(
    preds: ArrayView4<'_, A>,
    target: ArrayView4<'_, A>,
    p: i64,
    window: &WindowConfig,
) -> MetricResult<f64> {
    let p = validate_p(p)?;
    let target = target.permuted_axes([0, 3, 1, 2]);
    let preds = preds.permuted_axes([0, 3, 1, 2]);

    let length = preds.dim().1;
    if length == 0 {
        return Err(MetricError::EmptyInput {
            what: "channel axis must be non-empty",
        });
    }
    let mut m1 = Array2::<f64>::zeros((length, length));
    let mut m2 = Array2::<f64>::zeros((length, length));

    for k in 0..length {
        for r in k..length {
            let t = quality(
                target.slice(s![.., k..k + 1, .., ..]),
                target.slice(s![.., r..r + 1, .., ..]),
                window,
            )?;
            m1[[k, r]] = t;
            m1[[r, k]] = t;

            let q = quality(
                preds.slice(s![.., k..k + 1, .., ..]),
                preds.slice(s![.., r..r + 1, .., ..]),
                window,
            )?;
            m2[[k, r]] = q;
            m2[[r, k]] = q;
        }
    }

    let diff = (&m1 - &m2).mapv(|v| v.abs().powi(p));
    let inv_p = 1.0 / f64::from(p);

    if length == 1 {
        return Ok(diff[[0, 0]].powf(inv_p));
    }
    Ok((diff.sum() / (length * (length - 1)) as f64).powf(inv_p))
}

fn quality<A: NdFloat>(
    a: ArrayView4<'_, A>,
    b: ArrayView4<'_, A>,
    window: &WindowConfig,
) -> MetricResult<f64> {
    let score = universal_image_quality_index(a, b, window, Reduction::ElementwiseMean)?;
    Ok(score.sum().to_f64().unwrap_or(f64::NAN))
}

//! Spectral Distortion Index (D-lambda).
//!
//! D-lambda measures how the inter-band similarity structure of a predicted
//! multi-band image departs from that of the reference. For each batch a
//! symmetric `L x L` band-similarity matrix is built from the mean quality
//! index of every band pair `(k, r)` with `k <= r`; the score is
//!
//! ```text
//! (sum |m1 - m2|^p / (L (L - 1)))^(1/p)      for L > 1
//! |m1[0,0] - m2[0,0]|                        for L == 1
//! ```
//!
//! where `m1` belongs to the target and `m2` to the predictions.

use ndarray::{s, Array2, ArrayView4, ArrayViewD, NdFloat, Zip};
use rayon::prelude::*;

use super::batch::{ensure_same_precision, flatten_to_nchw, ImageBatch};
use super::gaussian::cast;
use super::uqi::{mean_uqi, WindowConfig};
use crate::error::{MetricError, MetricResult};

/// Checks that `p` is a positive integer that fits an `i32` exponent.
pub fn validate_p(p: i64) -> MetricResult<i32> {
    if p <= 0 {
        return Err(MetricError::invalid_parameter(
            "p",
            p,
            "must be a positive integer",
        ));
    }
    i32::try_from(p).map_err(|_| MetricError::invalid_parameter("p", p, "exceeds the i32 range"))
}

/// Symmetric matrix of mean quality indices between every pair of bands.
///
/// Entry `(k, r)` compares band `k` with band `r` over the whole batch. The
/// `L (L + 1) / 2` pairs with `k <= r` are evaluated in parallel and mirrored.
pub fn band_similarity_matrix<A: NdFloat>(
    batch: ArrayView4<'_, A>,
    window: &WindowConfig,
) -> MetricResult<Array2<A>> {
    let length = batch.dim().1;
    if length == 0 {
        return Err(MetricError::EmptyInput {
            what: "channel axis must be non-empty",
        });
    }
    let pairs: Vec<(usize, usize)> = (0..length)
        .flat_map(|k| (k..length).map(move |r| (k, r)))
        .collect();

    let scores = pairs
        .par_iter()
        .map(|&(k, r)| {
            mean_uqi(
                batch.slice(s![.., k..k + 1, .., ..]),
                batch.slice(s![.., r..r + 1, .., ..]),
                window,
            )
        })
        .collect::<MetricResult<Vec<A>>>()?;

    let mut matrix = Array2::<A>::zeros((length, length));
    for (&(k, r), score) in pairs.iter().zip(scores) {
        matrix[[k, r]] = score;
        matrix[[r, k]] = score;
    }
    Ok(matrix)
}

/// Collapses the target (`m1`) and prediction (`m2`) matrices into the score.
///
/// Both matrices must be square, non-empty and of equal size.
pub fn distortion_from_matrices<A: NdFloat>(
    m1: &Array2<A>,
    m2: &Array2<A>,
    p: i64,
) -> MetricResult<A> {
    let p = validate_p(p)?;
    if m1.dim() != m2.dim() || m1.nrows() != m1.ncols() {
        return Err(MetricError::ShapeMismatch {
            preds: m2.shape().to_vec(),
            target: m1.shape().to_vec(),
        });
    }
    let length = m1.nrows();
    if length == 0 {
        return Err(MetricError::EmptyInput {
            what: "similarity matrices must be non-empty",
        });
    }

    let diff = Zip::from(m1)
        .and(m2)
        .map_collect(|&a, &b| (a - b).abs().powi(p));
    let inv_p = A::one() / cast::<A>(f64::from(p));

    if length == 1 {
        return Ok(diff[[0, 0]].powf(inv_p));
    }
    let pairs = cast::<A>((length * (length - 1)) as f64);
    Ok((diff.sum() / pairs).powf(inv_p))
}

/// D-lambda of two `(N, C, H, W)` batches.
pub fn spectral_distortion_index_nchw<A: NdFloat>(
    preds: ArrayView4<'_, A>,
    target: ArrayView4<'_, A>,
    p: i64,
    window: &WindowConfig,
) -> MetricResult<A> {
    validate_p(p)?;
    if preds.shape() != target.shape() {
        return Err(MetricError::ShapeMismatch {
            preds: preds.shape().to_vec(),
            target: target.shape().to_vec(),
        });
    }
    let (batch, channels, height, width) = preds.dim();
    if batch == 0 || channels == 0 {
        return Err(MetricError::EmptyInput {
            what: "batch and channel axes must be non-empty",
        });
    }
    window.validate()?;

    tracing::debug!(batch, channels, height, width, p, "computing spectral distortion index");

    let (m1, m2) = rayon::join(
        || band_similarity_matrix(target, window),
        || band_similarity_matrix(preds, window),
    );
    distortion_from_matrices(&m1?, &m2?, p)
}

/// D-lambda of two `(..., C, H, W)` arrays of rank 4 or more.
///
/// Leading axes are folded into the batch axis before evaluation.
pub fn spectral_distortion_index_array<A: NdFloat>(
    preds: ArrayViewD<'_, A>,
    target: ArrayViewD<'_, A>,
    p: i64,
    window: &WindowConfig,
) -> MetricResult<A> {
    validate_p(p)?;
    if preds.shape() != target.shape() {
        return Err(MetricError::ShapeMismatch {
            preds: preds.shape().to_vec(),
            target: target.shape().to_vec(),
        });
    }
    let preds = flatten_to_nchw(preds, "preds")?;
    let target = flatten_to_nchw(target, "target")?;
    spectral_distortion_index_nchw(preds.view(), target.view(), p, window)
}

/// D-lambda of two runtime-typed batches with the default Gaussian window.
///
/// # Errors
///
/// Value errors for `p <= 0`, rank below 4, mismatched shapes, empty axes or
/// planes smaller than the window; a type error when `preds` and `target`
/// differ in precision.
///
/// # Examples
///
/// ```
/// use pansharp_metrics_core::{spectral_distortion_index, ImageBatch, Precision};
///
/// let preds = ImageBatch::from_seed(1, &[2, 3, 16, 16], Precision::F32);
/// let target = ImageBatch::from_seed(2, &[2, 3, 16, 16], Precision::F32);
///
/// let score = spectral_distortion_index(&preds, &target, 1).unwrap();
/// assert!(score >= 0.0);
/// assert_eq!(spectral_distortion_index(&target, &target, 1).unwrap(), 0.0);
/// ```
pub fn spectral_distortion_index(
    preds: &ImageBatch,
    target: &ImageBatch,
    p: i64,
) -> MetricResult<f64> {
    spectral_distortion_index_with_window(preds, target, p, &WindowConfig::default())
}

pub fn spectral_distortion_index_with_window(
    preds: &ImageBatch,
    target: &ImageBatch,
    p: i64,
    window: &WindowConfig,
) -> MetricResult<f64> {
    validate_p(p)?;
    ensure_same_precision(preds, target)?;
    match (preds, target) {
        (ImageBatch::F32(preds), ImageBatch::F32(target)) => {
            spectral_distortion_index_array(preds.view(), target.view(), p, window).map(f64::from)
        }
        (ImageBatch::F64(preds), ImageBatch::F64(target)) => {
            spectral_distortion_index_array(preds.view(), target.view(), p, window)
        }
        (preds, target) => Err(MetricError::PrecisionMismatch {
            preds: preds.precision(),
            target: target.precision(),
        }),
    }
}

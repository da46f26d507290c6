//! Universal Image Quality Index with a Gaussian window.
//!
//! For every window position the index combines correlation, luminance and
//! contrast terms of the two planes:
//!
//! ```text
//! uqi = (2 mu_p mu_t) (2 sigma_pt) / ((mu_p^2 + mu_t^2) (sigma_p^2 + sigma_t^2) + eps)
//! ```
//!
//! The windowed moments come from a normalized Gaussian kernel rather than a
//! uniform box, and only windows fully inside the plane contribute.

use ndarray::{arr0, s, Array1, Array2, Array4, ArrayD, ArrayView2, ArrayView4, NdFloat, Zip};
use serde::{Deserialize, Serialize};

use super::batch::{flatten_to_nchw, ImageBatch};
use super::gaussian::{filter_valid, gaussian_kernel_1d};
use crate::error::{MetricError, MetricResult};

/// Gaussian window settings as `(height, width)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub kernel_size: (usize, usize),
    pub sigma: (f64, f64),
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            kernel_size: (11, 11),
            sigma: (1.5, 1.5),
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> MetricResult<()> {
        gaussian_kernel_1d::<f64>(self.kernel_size.0, self.sigma.0)?;
        gaussian_kernel_1d::<f64>(self.kernel_size.1, self.sigma.1)?;
        Ok(())
    }

    fn kernels<A: NdFloat>(&self) -> MetricResult<(Array1<A>, Array1<A>)> {
        Ok((
            gaussian_kernel_1d(self.kernel_size.0, self.sigma.0)?,
            gaussian_kernel_1d(self.kernel_size.1, self.sigma.1)?,
        ))
    }
}

/// How a per-pixel index map is collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    ElementwiseMean,
    Sum,
    None,
}

/// Per-pixel index map of shape `(N, C, H - kh + 1, W - kw + 1)`.
pub fn uqi_map<A: NdFloat>(
    preds: ArrayView4<'_, A>,
    target: ArrayView4<'_, A>,
    window: &WindowConfig,
) -> MetricResult<Array4<A>> {
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
    let (kernel_y, kernel_x) = window.kernels::<A>()?;
    if height < kernel_y.len() || width < kernel_x.len() {
        return Err(MetricError::WindowTooLarge {
            height,
            width,
            kernel_height: kernel_y.len(),
            kernel_width: kernel_x.len(),
        });
    }

    let out_h = height + 1 - kernel_y.len();
    let out_w = width + 1 - kernel_x.len();
    let mut map = Array4::<A>::zeros((batch, channels, out_h, out_w));
    for b in 0..batch {
        for c in 0..channels {
            let plane = plane_index(
                preds.slice(s![b, c, .., ..]),
                target.slice(s![b, c, .., ..]),
                &kernel_y,
                &kernel_x,
            )?;
            map.slice_mut(s![b, c, .., ..]).assign(&plane);
        }
    }
    Ok(map)
}

/// Universal Image Quality Index of two `(N, C, H, W)` batches.
///
/// With [`Reduction::ElementwiseMean`] or [`Reduction::Sum`] the result is a
/// zero-dimensional array; with [`Reduction::None`] it is the full map.
pub fn universal_image_quality_index<A: NdFloat>(
    preds: ArrayView4<'_, A>,
    target: ArrayView4<'_, A>,
    window: &WindowConfig,
    reduction: Reduction,
) -> MetricResult<ArrayD<A>> {
    let map = uqi_map(preds, target, window)?;
    Ok(match reduction {
        Reduction::ElementwiseMean => arr0(mean(&map)).into_dyn(),
        Reduction::Sum => arr0(map.sum()).into_dyn(),
        Reduction::None => map.into_dyn(),
    })
}

/// Mean index over every window of every plane.
pub fn mean_uqi<A: NdFloat>(
    preds: ArrayView4<'_, A>,
    target: ArrayView4<'_, A>,
    window: &WindowConfig,
) -> MetricResult<A> {
    Ok(mean(&uqi_map(preds, target, window)?))
}

/// Mean index of two runtime-typed batches of rank 4.
pub fn universal_image_quality_index_batch(
    preds: &ImageBatch,
    target: &ImageBatch,
    window: &WindowConfig,
) -> MetricResult<f64> {
    for (argument, batch) in [("preds", preds), ("target", target)] {
        if batch.ndim() != 4 {
            return Err(MetricError::InvalidRank {
                argument,
                expected: "exactly 4".to_string(),
                got: batch.ndim(),
            });
        }
    }
    match (preds, target) {
        (ImageBatch::F32(p), ImageBatch::F32(t)) => {
            let p = flatten_to_nchw(p.view(), "preds")?;
            let t = flatten_to_nchw(t.view(), "target")?;
            mean_uqi(p.view(), t.view(), window).map(f64::from)
        }
        (ImageBatch::F64(p), ImageBatch::F64(t)) => {
            let p = flatten_to_nchw(p.view(), "preds")?;
            let t = flatten_to_nchw(t.view(), "target")?;
            mean_uqi(p.view(), t.view(), window)
        }
        (preds, target) => Err(MetricError::PrecisionMismatch {
            preds: preds.precision(),
            target: target.precision(),
        }),
    }
}

fn plane_index<A: NdFloat>(
    preds: ArrayView2<'_, A>,
    target: ArrayView2<'_, A>,
    kernel_y: &Array1<A>,
    kernel_x: &Array1<A>,
) -> MetricResult<Array2<A>> {
    let (ky, kx) = (kernel_y.view(), kernel_x.view());

    let mu_p = filter_valid(preds, ky, kx)?;
    let mu_t = filter_valid(target, ky, kx)?;
    let pp = filter_valid((&preds * &preds).view(), ky, kx)?;
    let tt = filter_valid((&target * &target).view(), ky, kx)?;
    let pt = filter_valid((&preds * &target).view(), ky, kx)?;

    let two = A::one() + A::one();
    let eps = A::epsilon();
    let mut out = Array2::<A>::zeros(mu_p.dim());
    Zip::from(&mut out)
        .and(&mu_p)
        .and(&mu_t)
        .and(&pp)
        .and(&tt)
        .and(&pt)
        .for_each(|out, &mp, &mt, &pp, &tt, &pt| {
            let mp_sq = mp * mp;
            let mt_sq = mt * mt;
            let mpt = mp * mt;
            let sigma_p = pp - mp_sq;
            let sigma_t = tt - mt_sq;
            let sigma_pt = pt - mpt;
            let upper = two * sigma_pt;
            let lower = sigma_p + sigma_t;
            *out = (two * mpt * upper) / ((mp_sq + mt_sq) * lower + eps);
        });
    Ok(out)
}

fn mean<A: NdFloat>(map: &Array4<A>) -> A {
    map.sum() / super::gaussian::cast::<A>(map.len() as f64)
}

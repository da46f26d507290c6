use std::fmt::{self, Display};

use ndarray::{concatenate, Array, Array4, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};

/// Element precision of an [`ImageBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    F32,
    F64,
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::F32 => write!(f, "f32"),
            Precision::F64 => write!(f, "f64"),
        }
    }
}

/// A dense image batch whose element precision is only known at runtime.
///
/// The array is laid out `(..., channels, height, width)`. Any number of
/// leading axes is allowed; they are folded into a single batch axis before
/// evaluation.
///
/// # Examples
///
/// ```
/// use pansharp_metrics_core::{ImageBatch, Precision};
///
/// let batch = ImageBatch::from_seed(42, &[2, 4, 3, 16, 16], Precision::F32);
/// assert_eq!(batch.precision(), Precision::F32);
///
/// let nchw = batch.to_nchw().unwrap();
/// assert_eq!(nchw.shape(), &[8, 3, 16, 16]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ImageBatch {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl ImageBatch {
    /// Creates a batch of uniform samples in `[0, 1)` from a seed.
    ///
    /// The same seed, shape and precision always produce the same batch.
    pub fn from_seed(seed: u64, shape: &[usize], precision: Precision) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        match precision {
            Precision::F32 => {
                ImageBatch::F32(ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen::<f32>()))
            }
            Precision::F64 => {
                ImageBatch::F64(ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen::<f64>()))
            }
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            ImageBatch::F32(_) => Precision::F32,
            ImageBatch::F64(_) => Precision::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            ImageBatch::F32(array) => array.shape(),
            ImageBatch::F64(array) => array.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Folds every leading axis into the batch axis, giving `(N, C, H, W)`.
    pub fn to_nchw(&self) -> MetricResult<Self> {
        Ok(match self {
            ImageBatch::F32(array) => {
                ImageBatch::F32(flatten_to_nchw(array.view(), "input")?.into_dyn())
            }
            ImageBatch::F64(array) => {
                ImageBatch::F64(flatten_to_nchw(array.view(), "input")?.into_dyn())
            }
        })
    }

    /// Returns the batch as `(N, H, W, C)`, the layout image libraries store.
    pub fn to_channel_last(&self) -> MetricResult<Self> {
        Ok(match self {
            ImageBatch::F32(array) => ImageBatch::F32(channel_last(array.view())?),
            ImageBatch::F64(array) => ImageBatch::F64(channel_last(array.view())?),
        })
    }

    /// Joins batches along the batch axis after folding each to `(N, C, H, W)`.
    ///
    /// All batches must share precision and `(C, H, W)`.
    pub fn concatenate(batches: &[ImageBatch]) -> MetricResult<Self> {
        let first = batches.first().ok_or(MetricError::EmptyInput {
            what: "no batches to concatenate",
        })?;
        match first {
            ImageBatch::F32(_) => {
                let arrays = batches
                    .iter()
                    .map(|batch| match batch {
                        ImageBatch::F32(array) => flatten_to_nchw(array.view(), "input"),
                        other => Err(MetricError::PrecisionMismatch {
                            preds: other.precision(),
                            target: Precision::F32,
                        }),
                    })
                    .collect::<MetricResult<Vec<_>>>()?;
                let views: Vec<_> = arrays.iter().map(|array| array.view()).collect();
                Ok(ImageBatch::F32(concatenate(Axis(0), &views)?.into_dyn()))
            }
            ImageBatch::F64(_) => {
                let arrays = batches
                    .iter()
                    .map(|batch| match batch {
                        ImageBatch::F64(array) => flatten_to_nchw(array.view(), "input"),
                        other => Err(MetricError::PrecisionMismatch {
                            preds: other.precision(),
                            target: Precision::F64,
                        }),
                    })
                    .collect::<MetricResult<Vec<_>>>()?;
                let views: Vec<_> = arrays.iter().map(|array| array.view()).collect();
                Ok(ImageBatch::F64(concatenate(Axis(0), &views)?.into_dyn()))
            }
        }
    }
}

impl<D: Dimension> From<Array<f32, D>> for ImageBatch {
    fn from(array: Array<f32, D>) -> Self {
        ImageBatch::F32(array.into_dyn())
    }
}

impl<D: Dimension> From<Array<f64, D>> for ImageBatch {
    fn from(array: Array<f64, D>) -> Self {
        ImageBatch::F64(array.into_dyn())
    }
}

/// Fails with a type error when the two batches differ in precision.
pub(crate) fn ensure_same_precision(
    preds: &ImageBatch,
    target: &ImageBatch,
) -> MetricResult<Precision> {
    if preds.precision() != target.precision() {
        return Err(MetricError::PrecisionMismatch {
            preds: preds.precision(),
            target: target.precision(),
        });
    }
    Ok(preds.precision())
}

/// Reshapes `(..., C, H, W)` into `(N, C, H, W)` with `N` the product of the
/// leading axes.
pub(crate) fn flatten_to_nchw<A: Clone>(
    array: ArrayViewD<'_, A>,
    argument: &'static str,
) -> MetricResult<Array4<A>> {
    let shape = array.shape();
    if shape.len() < 4 {
        return Err(MetricError::InvalidRank {
            argument,
            expected: "at least 4".to_string(),
            got: shape.len(),
        });
    }
    let (leading, tail) = shape.split_at(shape.len() - 3);
    let dims = (leading.iter().product::<usize>(), tail[0], tail[1], tail[2]);
    Ok(array.as_standard_layout().into_owned().into_shape(dims)?)
}

fn channel_last<A: Clone>(array: ArrayViewD<'_, A>) -> MetricResult<ArrayD<A>> {
    let nchw = flatten_to_nchw(array, "input")?;
    Ok(nchw
        .permuted_axes([0, 2, 3, 1])
        .as_standard_layout()
        .into_owned()
        .into_dyn())
}

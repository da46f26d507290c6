//! Gaussian windows and the separable windowed filter used by the quality index.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, NdFloat};
use num_traits::NumCast;

use crate::error::{MetricError, MetricResult};

/// Builds a normalized 1-D Gaussian kernel of odd length `size`.
///
/// Offsets run from `-(size - 1) / 2` to `(size - 1) / 2` and each weight is
/// `exp(-(d / sigma)^2 / 2)`; the weights sum to one.
pub fn gaussian_kernel_1d<A: NdFloat>(size: usize, sigma: f64) -> MetricResult<Array1<A>> {
    if size == 0 || size % 2 == 0 {
        return Err(MetricError::invalid_parameter(
            "kernel_size",
            size,
            "must be an odd positive integer",
        ));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(MetricError::invalid_parameter(
            "sigma",
            sigma,
            "must be a finite positive number",
        ));
    }

    let half = (size / 2) as f64;
    let weights: Array1<f64> = Array1::from_shape_fn(size, |idx| {
        let dist = (idx as f64 - half) / sigma;
        (-0.5 * dist * dist).exp()
    });
    let total = weights.sum();
    Ok(weights.mapv(|w| cast(w / total)))
}

/// Outer product of a height and a width kernel.
pub fn gaussian_kernel_2d<A: NdFloat>(
    kernel_size: (usize, usize),
    sigma: (f64, f64),
) -> MetricResult<Array2<A>> {
    let ky = gaussian_kernel_1d::<A>(kernel_size.0, sigma.0)?;
    let kx = gaussian_kernel_1d::<A>(kernel_size.1, sigma.1)?;
    Ok(Array2::from_shape_fn((ky.len(), kx.len()), |(y, x)| ky[y] * kx[x]))
}

/// Correlates `plane` with the separable window `kernel_y x kernel_x`.
///
/// Only windows that lie fully inside the plane are evaluated, so the result
/// is `(h - ky + 1) x (w - kx + 1)`. A plane smaller than the window, or an
/// empty kernel, is rejected.
pub fn filter_valid<A: NdFloat>(
    plane: ArrayView2<'_, A>,
    kernel_y: ArrayView1<'_, A>,
    kernel_x: ArrayView1<'_, A>,
) -> MetricResult<Array2<A>> {
    let (height, width) = plane.dim();
    if kernel_y.is_empty() || kernel_x.is_empty() {
        return Err(MetricError::EmptyInput {
            what: "filter kernels must be non-empty",
        });
    }
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

    let mut rows = Array2::<A>::zeros((height, out_w));
    for y in 0..height {
        for x in 0..out_w {
            let mut acc = A::zero();
            for (offset, &weight) in kernel_x.iter().enumerate() {
                acc += plane[[y, x + offset]] * weight;
            }
            rows[[y, x]] = acc;
        }
    }

    let mut out = Array2::<A>::zeros((out_h, out_w));
    for y in 0..out_h {
        for x in 0..out_w {
            let mut acc = A::zero();
            for (offset, &weight) in kernel_y.iter().enumerate() {
                acc += rows[[y + offset, x]] * weight;
            }
            out[[y, x]] = acc;
        }
    }
    Ok(out)
}

pub(crate) fn cast<A: NdFloat>(value: f64) -> A {
    <A as NumCast>::from(value).unwrap_or_else(A::nan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel_1d::<f64>(11, 1.5).unwrap();
        assert_abs_diff_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        for i in 0..kernel.len() {
            assert_abs_diff_eq!(kernel[i], kernel[kernel.len() - 1 - i], epsilon = 1e-15);
        }
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn kernel_rejects_even_size_and_bad_sigma() {
        assert!(gaussian_kernel_1d::<f32>(4, 1.5).is_err());
        assert!(gaussian_kernel_1d::<f32>(0, 1.5).is_err());
        assert!(gaussian_kernel_1d::<f32>(3, 0.0).is_err());
        assert!(gaussian_kernel_1d::<f32>(3, f64::NAN).is_err());
    }

    #[test]
    fn kernel_2d_is_outer_product() {
        let k2 = gaussian_kernel_2d::<f64>((3, 5), (1.0, 2.0)).unwrap();
        assert_eq!(k2.dim(), (3, 5));
        assert_abs_diff_eq!(k2.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn filter_matches_direct_window_sum() {
        let plane = Array2::from_shape_fn((6, 7), |(y, x)| (y * 7 + x) as f64 * 0.1);
        let ky = gaussian_kernel_1d::<f64>(3, 1.0).unwrap();
        let kx = gaussian_kernel_1d::<f64>(5, 1.0).unwrap();
        let kernel = gaussian_kernel_2d::<f64>((3, 5), (1.0, 1.0)).unwrap();

        let filtered = filter_valid(plane.view(), ky.view(), kx.view()).unwrap();
        assert_eq!(filtered.dim(), (4, 3));
        for y in 0..4 {
            for x in 0..3 {
                let mut direct = 0.0;
                for dy in 0..3 {
                    for dx in 0..5 {
                        direct += plane[[y + dy, x + dx]] * kernel[[dy, dx]];
                    }
                }
                assert_abs_diff_eq!(filtered[[y, x]], direct, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn filter_preserves_constant_planes() {
        let plane = Array2::from_elem((5, 5), 0.25f32);
        let k = gaussian_kernel_1d::<f32>(3, 1.5).unwrap();
        let filtered = filter_valid(plane.view(), k.view(), k.view()).unwrap();
        assert!(filtered.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn filter_rejects_planes_smaller_than_kernel() {
        let plane = Array2::from_elem((4, 9), 1.0f64);
        let k = gaussian_kernel_1d::<f64>(5, 1.0).unwrap();
        let err = filter_valid(plane.view(), k.view(), k.view()).unwrap_err();
        assert!(matches!(
            err,
            MetricError::WindowTooLarge {
                height: 4,
                kernel_height: 5,
                ..
            }
        ));

        let empty = Array1::<f64>::zeros(0);
        let err = filter_valid(plane.view(), empty.view(), k.view()).unwrap_err();
        assert!(matches!(err, MetricError::EmptyInput { .. }));
    }
}

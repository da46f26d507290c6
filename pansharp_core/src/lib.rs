//! # Pansharpening Metrics Core
//!
//! Image quality metrics for multi-band (pansharpened) imagery on dense
//! `ndarray` batches laid out `(N, C, H, W)`.
//!
//! The central metric is the Spectral Distortion Index (D-lambda), which
//! compares the band-to-band similarity structure of a predicted batch with
//! that of a reference batch. Band similarity is scored with a Gaussian-window
//! Universal Image Quality Index.
//!
//! ## Quick Start
//!
//! ```rust
//! use pansharp_metrics_core::{
//!     spectral_distortion_index, ImageBatch, Precision, SpectralDistortionIndex,
//! };
//!
//! let preds = ImageBatch::from_seed(42, &[4, 3, 16, 16], Precision::F64);
//! let target = ImageBatch::from_seed(7, &[4, 3, 16, 16], Precision::F64);
//!
//! // One-shot evaluation
//! let score = spectral_distortion_index(&preds, &target, 1).unwrap();
//!
//! // Accumulated over several updates
//! let mut metric = SpectralDistortionIndex::with_p(1).unwrap();
//! metric.update(preds, target).unwrap();
//! assert!((metric.compute().unwrap() - score).abs() < 1e-12);
//! ```
//!
//! ## Core Modules
//!
//! - [`image`] - quality index, D-lambda and the baseline implementation
//! - [`metric`] - accumulating D-lambda metric
//! - [`config`] - metric configuration via TOML
//! - [`logging`] - JSON line-delimited evaluation log
//! - [`error`] - value and type errors

pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod metric;

pub use config::{ConfigError, MetricConfig};
pub use error::{ErrorKind, MetricError, MetricResult};
pub use image::{
    band_similarity_matrix, baseline_d_lambda, distortion_from_matrices, mean_uqi,
    spectral_distortion_index, spectral_distortion_index_array, spectral_distortion_index_nchw,
    spectral_distortion_index_with_window, universal_image_quality_index,
    universal_image_quality_index_batch, uqi_map, ImageBatch, Precision, Reduction, WindowConfig,
};
pub use logging::EvaluationLogEntry;
pub use metric::SpectralDistortionIndex;

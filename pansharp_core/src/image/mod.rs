//! Image quality metrics over dense `(N, C, H, W)` batches.
//!
//! - [`batch`] - runtime-typed image batches
//! - [`gaussian`] - Gaussian windows and the windowed filter
//! - [`uqi`] - Universal Image Quality Index
//! - [`d_lambda`] - Spectral Distortion Index
//! - [`reference`] - baseline D-lambda over channel-last batches

pub mod batch;
pub mod d_lambda;
pub mod gaussian;
pub mod reference;
pub mod uqi;

pub use batch::{ImageBatch, Precision};
pub use d_lambda::{
    band_similarity_matrix, distortion_from_matrices, spectral_distortion_index,
    spectral_distortion_index_array, spectral_distortion_index_nchw,
    spectral_distortion_index_with_window,
};
pub use reference::baseline_d_lambda;
pub use uqi::{
    mean_uqi, universal_image_quality_index, universal_image_quality_index_batch, uqi_map,
    Reduction, WindowConfig,
};

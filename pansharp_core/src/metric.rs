//! Accumulating Spectral Distortion Index.
//!
//! Batches are validated and stored on [`SpectralDistortionIndex::update`];
//! [`SpectralDistortionIndex::compute`] joins everything seen so far along the
//! batch axis and scores it in one pass, so the result equals calling
//! [`spectral_distortion_index`](crate::spectral_distortion_index) on the
//! concatenated inputs.

use crate::config::MetricConfig;
use crate::error::{MetricError, MetricResult};
use crate::image::batch::{ensure_same_precision, ImageBatch, Precision};
use crate::image::d_lambda::{spectral_distortion_index_with_window, validate_p};
use crate::logging::{self, EvaluationLogEntry};

const METRIC_NAME: &str = "spectral_distortion_index";

#[derive(Debug, Clone)]
pub struct SpectralDistortionIndex {
    config: MetricConfig,
    preds: Vec<ImageBatch>,
    target: Vec<ImageBatch>,
}

impl SpectralDistortionIndex {
    pub fn new(config: MetricConfig) -> MetricResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            preds: Vec::new(),
            target: Vec::new(),
        })
    }

    /// Metric with the default window and the given exponent.
    pub fn with_p(p: i64) -> MetricResult<Self> {
        Self::new(MetricConfig::default().with_p(p))
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Number of batch pairs accumulated since the last reset.
    pub fn update_count(&self) -> usize {
        self.preds.len()
    }

    /// Validates a batch pair and stores it in `(N, C, H, W)` form.
    ///
    /// The pair must agree in precision and shape, have rank 4 or more, and
    /// match the precision and `(C, H, W)` of earlier updates.
    pub fn update(&mut self, preds: ImageBatch, target: ImageBatch) -> MetricResult<()> {
        let precision = ensure_same_precision(&preds, &target)?;
        if preds.shape() != target.shape() {
            return Err(MetricError::ShapeMismatch {
                preds: preds.shape().to_vec(),
                target: target.shape().to_vec(),
            });
        }
        let preds = preds.to_nchw()?;
        let target = target.to_nchw()?;

        if let Some(first) = self.preds.first() {
            if first.precision() != precision {
                return Err(MetricError::PrecisionMismatch {
                    preds: precision,
                    target: first.precision(),
                });
            }
            if first.shape()[1..] != preds.shape()[1..] {
                return Err(MetricError::ShapeMismatch {
                    preds: preds.shape().to_vec(),
                    target: first.shape().to_vec(),
                });
            }
        }

        tracing::debug!(
            update = self.preds.len() + 1,
            shape = ?preds.shape(),
            "accumulated spectral distortion batch"
        );
        self.preds.push(preds);
        self.target.push(target);
        Ok(())
    }

    /// Scores every batch accumulated since the last reset.
    pub fn compute(&self) -> MetricResult<f64> {
        validate_p(self.config.p)?;
        if self.preds.is_empty() {
            return Err(MetricError::EmptyInput {
                what: "compute called before any update",
            });
        }
        let preds = ImageBatch::concatenate(&self.preds)?;
        let target = ImageBatch::concatenate(&self.target)?;
        let (p, window) = (self.config.p, &self.config.window);
        let score = spectral_distortion_index_with_window(&preds, &target, p, window)?;

        if let Some(path) = &self.config.log_path {
            let shape = preds.shape();
            let entry = EvaluationLogEntry::new(
                METRIC_NAME,
                self.config.p,
                [shape[0], shape[1], shape[2], shape[3]],
                score,
            );
            if let Err(err) = logging::log_evaluation(path, &entry) {
                tracing::warn!(
                    "failed to log {METRIC_NAME} evaluation to {}: {err}",
                    path.display()
                );
            }
        }
        Ok(score)
    }

    pub fn reset(&mut self) {
        self.preds.clear();
        self.target.clear();
    }

    /// Precision fixed by the first update, if any.
    pub fn precision(&self) -> Option<Precision> {
        self.preds.first().map(ImageBatch::precision)
    }
}

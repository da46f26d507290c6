use pansharp_metrics_core::config::ConfigError;
use pansharp_metrics_core::{
    spectral_distortion_index_with_window, ImageBatch, MetricConfig, Precision,
    SpectralDistortionIndex,
};
use tracing_subscriber::EnvFilter;

const NUM_BATCHES: u64 = 3;
const BATCH_SHAPE: [usize; 4] = [4, 4, 32, 32];

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config()?;
    tracing::info!(p = config.p, window = ?config.window, "loaded metric config");

    let mut metric = SpectralDistortionIndex::new(config.clone())?;
    for batch in 0..NUM_BATCHES {
        let target = ImageBatch::from_seed(batch * 2 + 1, &BATCH_SHAPE, Precision::F32);
        let preds = perturb(&target, 0.05, batch * 2 + 2);
        metric.update(preds, target)?;
    }
    let accumulated = metric.compute()?;
    tracing::info!(batches = metric.update_count(), score = accumulated, "accumulated D-lambda");

    let reference = ImageBatch::from_seed(99, &BATCH_SHAPE, Precision::F32);
    for noise in [0.0f32, 0.1, 0.3] {
        let preds = perturb(&reference, noise, 100);
        let score =
            spectral_distortion_index_with_window(&preds, &reference, config.p, &config.window)?;
        println!("noise={noise:.2} d_lambda={score:.6}");
    }

    if let Some(path) = &config.log_path {
        println!("Evaluation log: {}", path.display());
    }
    Ok(())
}

fn load_config() -> Result<MetricConfig, ConfigError> {
    match MetricConfig::load_from_file("config/metric.toml") {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(_)) => Ok(MetricConfig::default()),
        Err(err) => Err(err),
    }
}

/// Adds scaled uniform noise to every sample of `batch`.
fn perturb(batch: &ImageBatch, amplitude: f32, seed: u64) -> ImageBatch {
    let noise = ImageBatch::from_seed(seed, batch.shape(), Precision::F32);
    match (batch, noise) {
        (ImageBatch::F32(clean), ImageBatch::F32(noise)) => {
            ImageBatch::F32(clean + &noise.mapv(|n| (n - 0.5) * amplitude))
        }
        (other, _) => other.clone(),
    }
}

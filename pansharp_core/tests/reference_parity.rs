//! Cross-checks the production D-lambda against the channel-last baseline.

use ndarray::{Axis, Ix4};
use pansharp_metrics_core::{
    baseline_d_lambda, spectral_distortion_index, ImageBatch, Precision, SpectralDistortionIndex,
    WindowConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_BATCHES: usize = 2;
const BATCH_SIZE: usize = 4;
const ATOL: f64 = 6e-3;
const RANDOM_SEED: u64 = 42;

struct Case {
    preds: ImageBatch,
    target: ImageBatch,
    p: i64,
}

/// `(size, channels, p, precision)` grid mirroring the upstream fixtures.
fn cases() -> Vec<Case> {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    [
        (12, 3, 1, Precision::F32),
        (13, 1, 3, Precision::F32),
        (14, 1, 4, Precision::F64),
        (15, 3, 1, Precision::F64),
    ]
    .into_iter()
    .map(|(size, channels, p, precision)| {
        let shape = [NUM_BATCHES, BATCH_SIZE, channels, size, size];
        Case {
            preds: ImageBatch::from_seed(rng.gen(), &shape, precision),
            target: ImageBatch::from_seed(rng.gen(), &shape, precision),
            p,
        }
    })
    .collect()
}

fn baseline(preds: &ImageBatch, target: &ImageBatch, p: i64) -> f64 {
    let window = WindowConfig::default();
    let preds = preds.to_channel_last().expect("rank >= 4");
    let target = target.to_channel_last().expect("rank >= 4");
    match (preds, target) {
        (ImageBatch::F32(preds), ImageBatch::F32(target)) => baseline_d_lambda(
            preds.into_dimensionality::<Ix4>().unwrap().view(),
            target.into_dimensionality::<Ix4>().unwrap().view(),
            p,
            &window,
        )
        .unwrap(),
        (ImageBatch::F64(preds), ImageBatch::F64(target)) => baseline_d_lambda(
            preds.into_dimensionality::<Ix4>().unwrap().view(),
            target.into_dimensionality::<Ix4>().unwrap().view(),
            p,
            &window,
        )
        .unwrap(),
        _ => panic!("precision mismatch in fixture"),
    }
}

fn outer_batch(batch: &ImageBatch, index: usize) -> ImageBatch {
    match batch {
        ImageBatch::F32(array) => ImageBatch::F32(array.index_axis(Axis(0), index).to_owned()),
        ImageBatch::F64(array) => ImageBatch::F64(array.index_axis(Axis(0), index).to_owned()),
    }
}

#[test]
fn functional_matches_baseline() {
    for (idx, case) in cases().iter().enumerate() {
        let expected = baseline(&case.preds, &case.target, case.p);
        let actual = spectral_distortion_index(&case.preds, &case.target, case.p).unwrap();
        assert!(
            (actual - expected).abs() <= ATOL,
            "case {idx}: functional {actual} vs baseline {expected}"
        );
    }
}

#[test]
fn accumulated_metric_matches_baseline() {
    for (idx, case) in cases().iter().enumerate() {
        let mut metric = SpectralDistortionIndex::with_p(case.p).unwrap();
        for batch in 0..NUM_BATCHES {
            metric
                .update(
                    outer_batch(&case.preds, batch),
                    outer_batch(&case.target, batch),
                )
                .unwrap();
        }
        assert_eq!(metric.update_count(), NUM_BATCHES);

        let expected = baseline(&case.preds, &case.target, case.p);
        let actual = metric.compute().unwrap();
        assert!(
            (actual - expected).abs() <= ATOL,
            "case {idx}: metric {actual} vs baseline {expected}"
        );
    }
}

#[test]
fn single_update_matches_functional_exactly() {
    for case in cases() {
        let mut metric = SpectralDistortionIndex::with_p(case.p).unwrap();
        metric.update(case.preds.clone(), case.target.clone()).unwrap();
        let functional = spectral_distortion_index(&case.preds, &case.target, case.p).unwrap();
        assert_eq!(metric.compute().unwrap(), functional);
    }
}

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use echomap::affinity::{build_training_affinity, extend_affinity, AffinityParams, Bandwidth};
use echomap::covariance::{estimate_metric, CovarianceParams, SourceMetric};
use echomap::spectral::{embed, SpectralParams};
use rand::prelude::*;
use std::f64::consts::TAU;
use std::hint::black_box;
use std::time::Duration;

/// Synthetic feature set on a noisy ring, plus per-point metrics estimated
/// from jittered copies, mirroring what the pipeline feeds the affinity stage.
fn synthetic_stage_input(
    n: usize,
    dim: usize,
    n_perturb: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<SourceMetric>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let features: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let theta = i as f64 * TAU / n as f64;
            let mut v = vec![0.0; dim];
            v[0] = theta.cos();
            v[1] = theta.sin();
            for coord in v.iter_mut().skip(2) {
                *coord = rng.random_range(-0.05..0.05);
            }
            v
        })
        .collect();

    let params = CovarianceParams::default();
    let metrics = features
        .iter()
        .enumerate()
        .map(|(i, feat)| {
            let samples: Vec<Vec<f64>> = (0..n_perturb)
                .map(|_| {
                    feat.iter()
                        .map(|&x| x + rng.random_range(-0.02..0.02))
                        .collect()
                })
                .collect();
            estimate_metric(&samples, params, i).unwrap()
        })
        .collect();

    (features, metrics)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group_affinity = c.benchmark_group("build_training_affinity");
    group_affinity.warm_up_time(Duration::from_millis(500));
    group_affinity.measurement_time(Duration::from_secs(3));
    group_affinity.sample_size(20);

    for &n in &[25, 50, 100, 200] {
        group_affinity.bench_function(BenchmarkId::new("n_train", n), |b| {
            b.iter_batched(
                || synthetic_stage_input(n, 18, 5, 7),
                |(features, metrics)| {
                    let w = build_training_affinity(
                        &features,
                        &metrics,
                        AffinityParams { bandwidth: Bandwidth::MedianScale(1.0) },
                    );
                    black_box(w.unwrap());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group_affinity.finish();

    let mut group_embed = c.benchmark_group("spectral_embedding");
    group_embed.warm_up_time(Duration::from_millis(500));
    group_embed.measurement_time(Duration::from_secs(5));
    group_embed.sample_size(10);

    for &n in &[25, 50, 100] {
        group_embed.bench_function(BenchmarkId::new("n_train", n), |b| {
            b.iter_batched(
                || {
                    let (features, metrics) = synthetic_stage_input(n + n / 2, 18, 5, 7);
                    let (train, test) = features.split_at(n);
                    let metrics = metrics[..n].to_vec();
                    let w = build_training_affinity(
                        train,
                        &metrics,
                        AffinityParams { bandwidth: Bandwidth::MedianScale(1.0) },
                    )
                    .unwrap();
                    (extend_affinity(&w, train, test, &metrics), n)
                },
                |(a, n)| {
                    let embedding = embed(&a, n, &SpectralParams::default());
                    black_box(embedding.unwrap());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group_embed.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

//! Benchmarks for the feature extractors

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{GrayImage, Luma};
use malimg_features::prelude::*;

fn create_image(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| Luma([((x * 7 + y * 13 + (x * y) % 31) % 256) as u8]))
}

fn bench_extractor(c: &mut Criterion, name: &str, extractor: &dyn FeatureExtractor) {
    let mut group = c.benchmark_group(format!("extractors/{}", name));
    for size in [64, 128, 256] {
        let img = create_image(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| extractor.extract(black_box(&img)).unwrap())
        });
    }
    group.finish();
}

fn bench_global(c: &mut Criterion) {
    bench_extractor(c, "global", &GlobalExtractor::new());
}

fn bench_glcm(c: &mut Criterion) {
    bench_extractor(c, "glcm", &GlcmExtractor::default());
}

fn bench_wavelet(c: &mut Criterion) {
    bench_extractor(c, "wavelet", &WaveletExtractor::new());
}

fn bench_gabor(c: &mut Criterion) {
    bench_extractor(c, "gabor", &GaborExtractor::default());
}

fn bench_lbp(c: &mut Criterion) {
    bench_extractor(c, "lbp", &LbpExtractor::default());
}

fn bench_hog(c: &mut Criterion) {
    bench_extractor(c, "hog", &HogExtractor::new());
}

fn bench_all(c: &mut Criterion) {
    let registry = ExtractorRegistry::with_builtins();
    let img = create_image(256);
    c.bench_function("extractors/all_256", |b| {
        b.iter(|| registry.extract_all(black_box(&img)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_global,
    bench_glcm,
    bench_wavelet,
    bench_gabor,
    bench_lbp,
    bench_hog,
    bench_all
);
criterion_main!(benches);

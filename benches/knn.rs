use cifar_knn::config::ExecutionMode;
use cifar_knn::dataset::{decode_packed, RECORD_LEN};
use cifar_knn::knn::{KnnClassifier, NoProgress};
use cifar_knn::record::{ImageRecord, Label, PIXEL_COUNT};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

fn generate_images(n: usize, seed: u32) -> Vec<ImageRecord> {
    (0..n as u32)
        .map(|i| {
            let pixels = (0..PIXEL_COUNT as u32)
                .map(|p| (p.wrapping_mul(2_654_435_761) ^ (i + seed).wrapping_mul(40_503)) & 0x00FF_FFFF)
                .collect();
            ImageRecord::new(pixels, (i % 10) as Label).expect("valid grid")
        })
        .collect()
}

fn bench_distance(c: &mut Criterion) {
    let images = generate_images(2, 1);
    c.bench_function("distance_32x32", |b| {
        b.iter(|| black_box(&images[0]).distance(black_box(&images[1])));
    });
}

fn bench_decode(c: &mut Criterion) {
    let blob: Vec<u8> = (0..RECORD_LEN * 1_000)
        .map(|i| if i % RECORD_LEN == 0 { (i / RECORD_LEN % 10) as u8 } else { i as u8 })
        .collect();

    c.bench_function("decode_packed_1k", |b| {
        b.iter(|| decode_packed(Path::new("bench.bin"), black_box(&blob)).expect("should succeed"));
    });
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_classify");
    group.sample_size(20); // Each iteration is train * test distances

    let test = generate_images(20, 7_000);
    for size in [100, 500, 2_000].iter() {
        let train = generate_images(*size, 0);
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, _| {
            let knn = KnnClassifier::new(5);
            b.iter(|| knn.run(black_box(&train), black_box(&test), &NoProgress).expect("should succeed"));
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, _| {
            let knn = KnnClassifier::new(5).with_execution(ExecutionMode::Parallel);
            b.iter(|| knn.run(black_box(&train), black_box(&test), &NoProgress).expect("should succeed"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_distance, bench_decode, bench_classify);
criterion_main!(benches);

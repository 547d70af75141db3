use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::{IVec2, Vec2, Vec3};
use strata_coords::ChunkGrid;
use strata_terrain::{BatchDispatcher, NoiseParams, TerrainNoise, upsample_heights};

fn bench_height_sample(c: &mut Criterion) {
    let noise = TerrainNoise::new(NoiseParams::default());
    let p = black_box(Vec2::new(1234.5, -678.25));
    c.bench_function("height_sample", |bencher| {
        bencher.iter(|| black_box(noise.height(p)))
    });
}

fn bench_chunk_heights(c: &mut Criterion) {
    let dispatcher = BatchDispatcher::new(ChunkGrid::default(), NoiseParams::default(), 0)
        .expect("dispatcher");
    c.bench_function("chunk_heights", |bencher| {
        bencher.iter(|| black_box(dispatcher.generate_chunk_heights(black_box(Vec2::ZERO))))
    });
}

fn bench_batch_heights(c: &mut Criterion) {
    let dispatcher = BatchDispatcher::new(ChunkGrid::default(), NoiseParams::default(), 0)
        .expect("dispatcher");
    let mut group = c.benchmark_group("batch_heights");
    for count in [1_i32, 4, 16] {
        let clusters: Vec<IVec2> = (0..count).map(|i| IVec2::new(i * 5, 0)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &clusters, |bencher, clusters| {
            bencher.iter(|| black_box(dispatcher.generate_batch_heights(clusters)))
        });
    }
    group.finish();
}

fn bench_chunk_density(c: &mut Criterion) {
    let dispatcher = BatchDispatcher::new(ChunkGrid::default(), NoiseParams::default(), 0)
        .expect("dispatcher");
    c.bench_function("chunk_density", |bencher| {
        bencher.iter(|| black_box(dispatcher.generate_chunk_density(black_box(Vec3::ZERO))))
    });
}

fn bench_upsample(c: &mut Criterion) {
    let noise = TerrainNoise::new(NoiseParams::default());
    let grid = ChunkGrid::default();
    let heights: Vec<f32> = (0..grid.samples_per_chunk())
        .map(|s| noise.height(grid.sample_world_pos(Vec2::ZERO, s)))
        .collect();
    c.bench_function("upsample_9_to_32", |bencher| {
        bencher.iter(|| black_box(upsample_heights(&heights, 9, 32)))
    });
}

criterion_group!(
    benches,
    bench_height_sample,
    bench_chunk_heights,
    bench_batch_heights,
    bench_chunk_density,
    bench_upsample,
);
criterion_main!(benches);

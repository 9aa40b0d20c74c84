use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cgmath::{Vector3, Zero};
use voxel_engine::engine_state::occlusion::{FloodFill, OcclusionGraphBuilder};
use voxel_engine::engine_state::rendering::meshing::GreedyMesher;
use voxel_engine::engine_state::voxels::chunk::{
    generators::{Checkerboard, Flat, RandomFill},
    ChunkGenerator, ChunkKey, Lod, RunLengthChunk, VoxelGrid,
};

fn grid(generator: &dyn ChunkGenerator) -> VoxelGrid {
    generator.generate(ChunkKey::new(0, 0, 0), 7, Lod::FINEST)
}

fn bench_greedy_terrain(c: &mut Criterion) {
    let grid = grid(&Flat {
        height: 17,
        material: 1,
    });
    let mut mesher = GreedyMesher::new(Lod::FINEST);

    c.bench_function("greedy_mesh_flat_terrain", |b| {
        b.iter(|| mesher.mesh(black_box(&grid), Vector3::zero()));
    });
}

fn bench_greedy_noise(c: &mut Criterion) {
    let grid = grid(&RandomFill::new(0.3, 2));
    let mut mesher = GreedyMesher::new(Lod::FINEST);

    c.bench_function("greedy_mesh_random_30", |b| {
        b.iter(|| mesher.mesh(black_box(&grid), Vector3::zero()));
    });
}

fn bench_greedy_worst_case(c: &mut Criterion) {
    let grid = grid(&Checkerboard(3));
    let mut mesher = GreedyMesher::new(Lod::FINEST);

    c.bench_function("greedy_mesh_checkerboard", |b| {
        b.iter(|| mesher.mesh(black_box(&grid), Vector3::zero()));
    });
}

fn bench_occlusion(c: &mut Criterion) {
    let grid = grid(&RandomFill::new(0.45, 2));
    let mut flood_fill = FloodFill::for_lod(Lod::FINEST);

    c.bench_function("occlusion_graph_random_45", |b| {
        b.iter(|| OcclusionGraphBuilder::build(black_box(&grid), &mut flood_fill));
    });
}

fn bench_run_length(c: &mut Criterion) {
    let grid = grid(&RandomFill::new(0.3, 2));

    c.bench_function("compress_random_30", |b| {
        b.iter(|| RunLengthChunk::compress_from(black_box(&grid)));
    });

    let chunk = RunLengthChunk::compress_from(&grid);
    let mut scratch = VoxelGrid::new(Lod::FINEST);
    c.bench_function("decompress_random_30", |b| {
        b.iter(|| chunk.decompress_into(black_box(scratch.as_mut_slice())));
    });
}

criterion_group!(
    benches,
    bench_greedy_terrain,
    bench_greedy_noise,
    bench_greedy_worst_case,
    bench_occlusion,
    bench_run_length,
);
criterion_main!(benches);

//! End-to-end tests of the chunk pipeline: generation on the worker pool, meshing,
//! visibility records and voxel edits.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use cgmath::Point3;
use voxel_engine::core::{EngineConfig, VoxelError};
use voxel_engine::engine_state::{
    occlusion::ChunkVisibility,
    voxels::{
        block::block_side::BlockSide,
        chunk::{
            generators::{Empty, Flat, RandomFill},
            ChunkGenerator, ChunkKey, Lod, RunLengthChunk,
        },
    },
    Engine,
};

fn engine_with(config_json: &str, generator: Arc<dyn ChunkGenerator>) -> Engine {
    voxel_engine::init_logger();
    let config = EngineConfig::from_json_str(config_json).unwrap();
    Engine::new(config, generator).unwrap()
}

#[test]
fn terrain_is_generated_meshed_and_analysed() {
    let mut engine = engine_with(
        r#"{ "worker_count": 4 }"#,
        Arc::new(Flat {
            height: 8,
            material: 1,
        }),
    );
    let scheduled = engine.request_area(ChunkKey::new(0, 0, 0), 1);
    assert_eq!(scheduled, 27);
    engine.flush();

    assert_eq!(engine.world().len(), 27);
    assert_eq!(engine.pending_tasks(), 0);

    // The ground surface runs through the middle layer of chunks.
    let surface = ChunkKey::new(0, 0, 0);
    let mesh = engine.mesh(surface).unwrap();
    assert_eq!(mesh.side_quad_count(BlockSide::TOP), 1);
    assert_eq!(mesh.quad_count(), 1);
    assert!(!mesh.overflowed);

    // Sky and bedrock chunks have nothing to show.
    assert!(engine.mesh(ChunkKey::new(0, 1, 0)).unwrap().is_empty());
    assert!(engine.mesh(ChunkKey::new(0, -1, 0)).unwrap().is_empty());

    assert_eq!(engine.visibility(ChunkKey::new(0, 1, 0)), Some(ChunkVisibility::ALL));
    assert_eq!(engine.visibility(ChunkKey::new(0, -1, 0)), Some(ChunkVisibility::NONE));
    let layered = engine.visibility(surface).unwrap();
    assert!(layered.get_visible(BlockSide::TOP, BlockSide::LEFT));
    assert!(!layered.get_visible(BlockSide::TOP, BlockSide::BOTTOM));
}

#[test]
fn uniform_chunks_are_stored_coarse() {
    let mut engine = engine_with(
        r#"{ "worker_count": 2 }"#,
        Arc::new(Flat {
            height: 0,
            material: 3,
        }),
    );
    engine.request_chunk(ChunkKey::new(0, -1, 0)).unwrap();
    engine.request_chunk(ChunkKey::new(0, 0, 0)).unwrap();
    engine.flush();

    for key in [ChunkKey::new(0, -1, 0), ChunkKey::new(0, 0, 0)] {
        let chunk = engine.world().get(key).unwrap();
        assert_eq!(chunk.get().lod(), Lod::COARSEST);
        assert_eq!(chunk.get().run_count(), 1);
    }
    assert_eq!(engine.get_voxel(Point3::new(0, -1, 0)), Some(3));
    assert_eq!(engine.get_voxel(Point3::new(0, 0, 0)), Some(0));
}

#[test]
fn edits_are_remeshed() {
    let mut engine = engine_with(r#"{ "worker_count": 2 }"#, Arc::new(Empty));
    let key = ChunkKey::new(0, 0, 0);
    engine.request_chunk(key).unwrap();
    engine.flush();
    assert!(engine.mesh(key).unwrap().is_empty());

    assert!(engine.set_voxel(Point3::new(10, 10, 10), 5));
    assert!(engine.set_voxel(Point3::new(11, 10, 10), 5));
    assert!(!engine.is_idle());
    engine.flush();

    let mesh = engine.mesh(key).unwrap();
    assert_eq!(mesh.quad_count(), 6);
    assert_eq!(mesh.vertices.len(), 8);

    assert!(engine.set_voxel(Point3::new(11, 10, 10), 0));
    engine.flush();
    assert_eq!(engine.mesh(key).unwrap().quad_count(), 6);
    assert_eq!(engine.get_voxel(Point3::new(11, 10, 10)), Some(0));
}

#[test]
fn edits_outside_loaded_chunks_are_ignored() {
    let mut engine = engine_with("{}", Arc::new(Empty));
    assert!(!engine.set_voxel(Point3::new(100, 0, 0), 1));
    assert_eq!(engine.get_voxel(Point3::new(100, 0, 0)), None);
    assert!(engine.is_idle());
}

#[test]
fn duplicate_requests_are_rejected_until_done() {
    let mut engine = engine_with(r#"{ "worker_count": 1 }"#, Arc::new(RandomFill::new(0.5, 2)));
    let key = ChunkKey::new(3, 0, 0);
    assert!(engine.request_chunk(key).unwrap());
    match engine.request_chunk(key) {
        Err(VoxelError::AlreadyInFlight(task)) => assert_eq!(task.chunk, key),
        other => panic!("expected AlreadyInFlight, got {:?}", other.map(|_| ())),
    }
    engine.flush();
    assert!(!engine.request_chunk(key).unwrap());
}

#[test]
fn inserted_chunks_are_processed_and_announced() {
    let mut engine = engine_with(r#"{ "worker_count": 2 }"#, Arc::new(Empty));
    let announced = Arc::new(AtomicUsize::new(0));
    let counter = announced.clone();
    engine
        .state_mut()
        .world
        .add_listener(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

    let key = ChunkKey::new(-4, 2, 7);
    engine.insert_chunk(key, RunLengthChunk::filled(Lod::FINEST, 9));
    engine.set_voxel(Point3::new(-128 + 5, 64 + 5, 224 + 5), 0);
    engine.flush();

    assert_eq!(announced.load(Ordering::SeqCst), 2);
    assert_eq!(engine.visibility(key), Some(ChunkVisibility::NONE));
    assert_eq!(engine.mesh(key).unwrap().quad_count(), 6);
}

#[test]
fn unloading_forgets_derived_data() {
    let mut engine = engine_with(r#"{ "worker_count": 2 }"#, Arc::new(Empty));
    let key = ChunkKey::new(0, 0, 0);
    engine.request_chunk(key).unwrap();
    engine.flush();
    assert!(engine.unload_chunk(key));
    assert!(engine.mesh(key).is_none());
    assert!(engine.visibility(key).is_none());
    assert!(engine.request_chunk(key).unwrap());
    engine.flush();
    assert!(engine.world().contains(key));
}

#[test]
fn invalid_config_is_reported() {
    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "worker_count": "many" }"#),
        Err(VoxelError::Config(_))
    ));
    let config = EngineConfig::from_json_str(r#"{ "generation_lod": 7 }"#).unwrap();
    assert!(matches!(
        Engine::new(config, Arc::new(Empty)),
        Err(VoxelError::InvalidLod(7))
    ));
}

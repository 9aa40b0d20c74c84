//! # Engine State Module
//!
//! The core engine module that ties the voxel subsystems together.
//!
//! ## Key Components
//!
//! * `Engine` - The entry point: owns the state and the worker pool
//! * `EngineState` - The host-side data results are applied to
//! * `occlusion` - Chunk visibility records and the occlusion culler
//! * `rendering` - Greedy meshing and the mesh cache
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, and world generation
//!
//! ## Architecture
//!
//! All mutable state lives on the host thread in [`EngineState`]. Workers receive
//! shared read-only chunk handles, compute a mesh or a visibility record, and send
//! it back; [`Engine::update`] applies the results and schedules rebuilds of chunks
//! edited since the last update.
//!
//! ```
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_engine::core::EngineConfig;
//! use voxel_engine::engine_state::{occlusion::Frustum, voxels::chunk::{generators::Flat, ChunkKey}, Engine};
//!
//! let config = EngineConfig { worker_count: 2, ..EngineConfig::default() };
//! let mut engine = Engine::new(config, Arc::new(Flat { height: 8, material: 1 })).unwrap();
//!
//! let key = ChunkKey::new(0, 0, 0);
//! engine.request_chunk(key).unwrap();
//! engine.flush();
//!
//! assert!(engine.mesh(key).is_some());
//! assert!(engine.visibility(key).is_some());
//! let visible = engine.visible_chunks(Point3::new(16.0, 20.0, 16.0), &Frustum::everything());
//! assert_eq!(visible[0], key);
//! ```

use std::{collections::HashMap, sync::Arc};

use cgmath::Point3;
use log::{debug, info};

use occlusion::{ChunkVisibility, Frustum, OcclusionCuller};
use rendering::{meshing::ChunkMesh, MeshManager};
use task_management::TaskManager;
use voxels::{
    block::Material,
    chunk::{ChunkGenerator, ChunkKey, Lod, RunLengthChunk},
    tasks::chunk_generation_task::ChunkGenerationTask,
    world::World,
};

use crate::core::{error::Result, EngineConfig};

pub mod occlusion;
pub mod rendering;
pub mod task_management;
pub mod voxels;

use occlusion::tasks::chunk_occlusion_task::ChunkOcclusionTask;
use rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask;

/// The host-side state task results are applied to.
pub struct EngineState {
    /// Loaded chunks
    pub world: World,
    /// Finished meshes
    pub meshes: MeshManager,
    /// Visibility records of analysed chunks
    pub visibility: HashMap<ChunkKey, ChunkVisibility>,
    /// Fills newly requested chunks
    pub generator: Arc<dyn ChunkGenerator>,
    /// Engine settings
    pub config: EngineConfig,
}

impl EngineState {
    /// Creates an empty state.
    pub fn new(config: EngineConfig, generator: Arc<dyn ChunkGenerator>) -> Self {
        EngineState {
            world: World::new(),
            meshes: MeshManager::new(config.mesh_cache_capacity()),
            visibility: HashMap::new(),
            generator,
            config,
        }
    }
}

/// The voxel engine: world state plus the worker pool that processes it.
pub struct Engine {
    state: EngineState,
    task_manager: TaskManager,
    generation_lod: Lod,
}

impl Engine {
    /// Creates an engine and starts its workers.
    ///
    /// # Arguments
    /// * `config` - Engine settings
    /// * `generator` - Fills chunks requested with [`Engine::request_chunk`]
    ///
    /// # Errors
    /// [`VoxelError::InvalidLod`](crate::core::VoxelError::InvalidLod) if
    /// `config.generation_lod` is out of range.
    pub fn new(config: EngineConfig, generator: Arc<dyn ChunkGenerator>) -> Result<Self> {
        let generation_lod = Lod::new(config.generation_lod)?;
        let task_manager = TaskManager::new(config.resolved_worker_count());
        info!(
            "Engine ready: {} workers, view distance {}, mesh cache {}",
            task_manager.worker_count(),
            config.view_distance,
            config.mesh_cache_capacity
        );

        Ok(Engine {
            state: EngineState::new(config, generator),
            task_manager,
            generation_lod,
        })
    }

    /// The engine's state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The engine's state, mutably. Edits made through the world directly are
    /// rebuilt on the next update only if the chunk is marked dirty.
    pub fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    /// The loaded world.
    pub fn world(&self) -> &World {
        &self.state.world
    }

    /// The mesh of `key`, if one has been built and is still cached.
    pub fn mesh(&mut self, key: ChunkKey) -> Option<Arc<ChunkMesh>> {
        self.state.meshes.get(key)
    }

    /// The visibility record of `key`, if one has been built.
    pub fn visibility(&self, key: ChunkKey) -> Option<ChunkVisibility> {
        self.state.visibility.get(&key).copied()
    }

    /// Schedules generation of `key`.
    ///
    /// # Returns
    /// `Ok(false)` if the chunk is already loaded, `Ok(true)` once generation is scheduled.
    ///
    /// # Errors
    /// [`VoxelError::AlreadyInFlight`](crate::core::VoxelError::AlreadyInFlight) if the
    /// chunk is already being generated.
    pub fn request_chunk(&mut self, key: ChunkKey) -> Result<bool> {
        if self.state.world.contains(key) {
            return Ok(false);
        }
        let task = ChunkGenerationTask::new(
            key,
            self.generation_lod,
            self.state.config.world_seed,
            self.state.generator.clone(),
            self.state.config.promote_monochrome,
        );
        self.task_manager.publish_task(Box::new(task))?;
        Ok(true)
    }

    /// Requests every chunk within `radius` chunks of `center`.
    ///
    /// # Returns
    /// Number of chunks newly scheduled.
    pub fn request_area(&mut self, center: ChunkKey, radius: i32) -> usize {
        let mut scheduled = 0;
        for z in -radius..=radius {
            for y in -radius..=radius {
                for x in -radius..=radius {
                    let key = ChunkKey::new(center.0.x + x, center.0.y + y, center.0.z + z);
                    match self.request_chunk(key) {
                        Ok(true) => scheduled += 1,
                        Ok(false) => {}
                        Err(e) => debug!("Skipping {}: {}", key, e),
                    }
                }
            }
        }
        scheduled
    }

    /// Inserts a ready-made chunk and schedules its mesh and visibility builds.
    pub fn insert_chunk(&mut self, key: ChunkKey, chunk: RunLengthChunk) {
        self.state.world.insert(key, chunk);
        self.state.world.mark_dirty(key);
    }

    /// Drops a chunk with its mesh and visibility record.
    ///
    /// # Returns
    /// `true` if the chunk was loaded.
    pub fn unload_chunk(&mut self, key: ChunkKey) -> bool {
        self.state.meshes.unload_chunks(&[key]);
        self.state.visibility.remove(&key);
        self.state.world.remove(key).is_some()
    }

    /// The material at world voxel `pos`, or `None` if its chunk is not loaded.
    pub fn get_voxel(&self, pos: Point3<i32>) -> Option<Material> {
        self.state.world.get_voxel(pos)
    }

    /// Sets the world voxel at `pos`. The chunk is rebuilt on the next update.
    ///
    /// # Returns
    /// `false` if the chunk containing `pos` is not loaded.
    ///
    /// Uniform chunks stored coarser than the generation level of detail are first
    /// expanded back to it, so the edit touches a single voxel.
    pub fn set_voxel(&mut self, pos: Point3<i32>, material: Material) -> bool {
        if let Some(handle) = self.state.world.get(ChunkKey::from_world_position(pos)) {
            let mut chunk = handle.get_mut();
            if chunk.lod() > self.generation_lod && chunk.is_monochrome() {
                let material = chunk.get_index(0);
                *chunk = RunLengthChunk::filled(self.generation_lod, material);
            }
        }
        self.state.world.set_voxel(pos, material)
    }

    /// Applies finished task results and schedules rebuilds of dirty chunks.
    ///
    /// Call once per frame.
    pub fn update(&mut self) {
        self.task_manager.process_completed_tasks(&mut self.state);

        for key in self.state.world.take_dirty() {
            if let Err(e) = self.schedule_rebuild(key) {
                debug!("Rebuild of {} postponed: {}", key, e);
                self.state.world.mark_dirty(key);
            }
        }
    }

    fn schedule_rebuild(&mut self, key: ChunkKey) -> Result<()> {
        let Some(handle) = self.state.world.get(key) else {
            return Ok(());
        };
        let mesh_task = Box::new(ChunkMeshGenerationTask::new(key, handle.clone()));
        let occlusion_task = Box::new(ChunkOcclusionTask::new(key, handle));

        let mesh_scheduled = self.task_manager.publish_task(mesh_task);
        let occlusion_scheduled = self.task_manager.publish_task(occlusion_task);
        match (mesh_scheduled, occlusion_scheduled) {
            (Err(e), _) | (_, Err(e)) => Err(e),
            _ => Ok(()),
        }
    }

    /// Blocks until every scheduled task has finished and no chunk is dirty.
    pub fn flush(&mut self) {
        loop {
            self.update();
            if self.is_idle() {
                return;
            }
            std::thread::yield_now();
        }
    }

    /// Returns `true` when no task is pending and no chunk waits for a rebuild.
    pub fn is_idle(&self) -> bool {
        self.task_manager.is_idle() && !self.state.world.has_dirty()
    }

    /// Number of tasks scheduled or running.
    pub fn pending_tasks(&self) -> usize {
        self.task_manager.pending_count()
    }

    /// The chunks visible from `camera`, nearest first.
    ///
    /// # Arguments
    /// * `camera` - Camera position in world space
    /// * `frustum` - The camera frustum in world space
    pub fn visible_chunks(&self, camera: Point3<f32>, frustum: &Frustum) -> Vec<ChunkKey> {
        let camera_chunk = ChunkKey::from_world_position(Point3::new(
            camera.x.floor() as i32,
            camera.y.floor() as i32,
            camera.z.floor() as i32,
        ));
        OcclusionCuller::visible_chunks(
            camera_chunk,
            frustum,
            &self.state.visibility,
            self.state.config.view_distance,
        )
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("chunks", &self.state.world.len())
            .field("meshes", &self.state.meshes.len())
            .field("pending_tasks", &self.task_manager.pending_count())
            .finish()
    }
}

//! # Occlusion Culler
//!
//! Walks the chunk grid outward from the camera's chunk, the way light would
//! travel through open space. A chunk leads on to its neighbour across face `F`
//! only when:
//!
//! - the neighbour is within the view distance and intersects the frustum
//! - the chunk's [`ChunkVisibility`] connects the face the walk came in through
//!   to `F` (the camera's own chunk may be left through any face)
//!
//! Chunks without a visibility record are reported as visible but never walked
//! through: without occlusion data nothing behind them is assumed visible.

use std::collections::{hash_map::Entry, HashMap, VecDeque};

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4, Zero};
use log::trace;

use crate::engine_state::voxels::{
    block::block_side::BlockSide,
    chunk::{ChunkKey, CHUNK_DIMENSION},
};

use super::visibility::ChunkVisibility;

/// An axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a box from its corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Aabb { min, max }
    }

    /// The box covered by chunk `key`.
    pub fn of_chunk(key: ChunkKey) -> Self {
        let origin = key.world_origin();
        let min = Point3::new(origin.x as f32, origin.y as f32, origin.z as f32);
        let size = CHUNK_DIMENSION as f32;
        Aabb {
            min,
            max: Point3::new(min.x + size, min.y + size, min.z + size),
        }
    }
}

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    /// Unit normal pointing into the frustum
    pub normal: Vector3<f32>,
    /// Signed offset along the normal
    pub distance: f32,
}

impl Plane {
    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(Vector3::new(point.x, point.y, point.z)) + self.distance
    }
}

/// View frustum with 6 planes (Left, Right, Bottom, Top, Near, Far)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    /// Inward-facing planes
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts frustum planes from a view-projection matrix.
    ///
    /// Expects OpenGL clip space (`-w <= z <= w`), which is what `cgmath::perspective`
    /// and `cgmath::ortho` produce.
    pub fn from_view_projection(view_projection: &Matrix4<f32>) -> Self {
        let rows = [
            view_projection.row(0),
            view_projection.row(1),
            view_projection.row(2),
            view_projection.row(3),
        ];
        let raw = [
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[3] + rows[2],
            rows[3] - rows[2],
        ];
        Frustum {
            planes: raw.map(Self::normalize_plane),
        }
    }

    /// A frustum that contains everything.
    pub fn everything() -> Self {
        Frustum {
            planes: [Plane {
                normal: Vector3::zero(),
                distance: 0.0,
            }; 6],
        }
    }

    fn normalize_plane(plane: Vector4<f32>) -> Plane {
        let normal = plane.truncate();
        let length = normal.magnitude();
        if length > 0.0 {
            Plane {
                normal: normal / length,
                distance: plane.w / length,
            }
        } else {
            Plane {
                normal,
                distance: plane.w,
            }
        }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if AABB intersects frustum (conservative test)
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // The corner furthest along the normal
            let p = Point3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.distance_to_point(p) >= 0.0
        })
    }
}

/// Portal-style visibility walk over chunks.
pub struct OcclusionCuller;

impl OcclusionCuller {
    /// Collects the chunks visible from `camera`.
    ///
    /// # Arguments
    /// * `camera` - The chunk containing the camera
    /// * `frustum` - The camera frustum in world space
    /// * `visibility` - Visibility records of the chunks analysed so far
    /// * `view_distance` - Largest Chebyshev distance, in chunks, the walk goes from `camera`
    ///
    /// # Returns
    /// The visible chunks in the order the walk reached them, nearest first.
    pub fn visible_chunks(
        camera: ChunkKey,
        frustum: &Frustum,
        visibility: &HashMap<ChunkKey, ChunkVisibility>,
        view_distance: i32,
    ) -> Vec<ChunkKey> {
        let mut visible = vec![camera];
        // Faces each reached chunk has been entered through, as a side bitmask.
        let mut entered: HashMap<ChunkKey, u8> = HashMap::new();
        entered.insert(camera, 0);
        let mut queue: VecDeque<(ChunkKey, Option<BlockSide>)> = VecDeque::new();
        queue.push_back((camera, None));

        while let Some((key, entered_through)) = queue.pop_front() {
            let Some(record) = visibility.get(&key) else {
                continue;
            };

            for exit in BlockSide::all() {
                if let Some(entry) = entered_through {
                    if exit == entry || !record.get_visible(entry, exit) {
                        continue;
                    }
                }

                let next = key.neighbor(exit);
                if next.distance(camera) > view_distance
                    || !frustum.intersects_aabb(&next.aabb())
                {
                    continue;
                }

                let entry_face = exit.opposite();
                let bit = 1 << entry_face as u8;
                match entered.entry(next) {
                    Entry::Occupied(mut faces) => {
                        if *faces.get() & bit != 0 {
                            continue;
                        }
                        *faces.get_mut() |= bit;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(bit);
                        visible.push(next);
                    }
                }
                queue.push_back((next, Some(entry_face)));
            }
        }

        trace!("{} chunks visible from {}", visible.len(), camera);
        visible
    }
}

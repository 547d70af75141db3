//! Coordinate mapping between world positions, chunk coordinates, cluster coordinates
//! and chunk-local sample indices.
//!
//! Everything here is a pure function of its arguments. The generators and the
//! consumers of their output buffers use these same functions, so a work-item index
//! resolves to one world position and one output slot no matter which dispatch mode
//! produced it.
//!
//! # Spaces
//!
//! 1. **World space**: `f32` positions in world units (`Vec2` for the ground plane
//!    `(x, z)`, `Vec3` for volumes).
//! 2. **Chunk space**: integer chunk coordinates (`IVec2` / `IVec3`). A chunk spans
//!    `chunk_world_size` world units per axis.
//! 3. **Cluster space**: a cluster is addressed by its lower-corner chunk and owns
//!    `cluster_dim²` chunk slots, enumerated row-major.
//! 4. **Sample space**: row-major sample indices inside one chunk.
//!
//! ```rust
//! use glam::IVec2;
//! use strata_coords::cluster_chunk_coord;
//!
//! // Slot 6 of a 5×5 cluster is one step along x and one along z.
//! assert_eq!(cluster_chunk_coord(IVec2::new(2, 3), 6, 5), IVec2::new(3, 4));
//! ```

mod grid;

use glam::{IVec2, IVec3, UVec2, UVec3, Vec2, Vec3};

pub use grid::{ChunkGrid, GridError};

// ---------------------------------------------------------------------------
// Sample space
// ---------------------------------------------------------------------------

/// Split a row-major sample index into `(x, z)` for a `dim`-wide grid.
#[inline]
pub fn sample_to_local_xy(index: u32, dim: u32) -> UVec2 {
    UVec2::new(index % dim, index / dim)
}

/// Split a row-major voxel index into `(x, y, z)` for a `dim³` grid.
///
/// Inverse of [`flatten_index`].
#[inline]
pub fn sample_to_local_xyz(index: u32, dim: u32) -> UVec3 {
    UVec3::new(index % dim, (index / dim) % dim, index / (dim * dim))
}

/// Row-major voxel index: `z·dim² + y·dim + x`.
#[inline]
pub fn flatten_index(local: UVec3, dim: u32) -> u32 {
    local.z * dim * dim + local.y * dim + local.x
}

/// Distance between neighbouring heightmap samples.
///
/// Dividing by `samples_per_dim - 1` puts the last sample exactly on the far
/// edge of the chunk, so neighbouring chunks share their edge samples.
/// `samples_per_dim` must be at least 2.
#[inline]
pub fn sample_spacing(chunk_world_size: f32, samples_per_dim: u32) -> f32 {
    chunk_world_size / (samples_per_dim - 1) as f32
}

// ---------------------------------------------------------------------------
// Chunk space
// ---------------------------------------------------------------------------

/// World-space lower corner of a 2D chunk.
#[inline]
pub fn chunk_origin_world(chunk: IVec2, chunk_world_size: f32) -> Vec2 {
    chunk.as_vec2() * chunk_world_size
}

/// World-space lower corner of a 3D chunk.
#[inline]
pub fn chunk_origin_world_3d(chunk: IVec3, chunk_world_size: f32) -> Vec3 {
    chunk.as_vec3() * chunk_world_size
}

/// The chunk whose cell contains `world_pos`.
///
/// Positions are biased by half a chunk before flooring, which centers chunk
/// `(0, 0, 0)` on the world origin.
pub fn world_pos_to_chunk_coord(world_pos: Vec3, chunk_world_size: f32) -> IVec3 {
    let half = chunk_world_size * 0.5;
    ((world_pos + Vec3::splat(half)) / chunk_world_size)
        .floor()
        .as_ivec3()
}

/// Voxel containing `world_pos` inside the centered cell of `chunk`.
///
/// Uses the same half-chunk bias as [`world_pos_to_chunk_coord`]. Returns
/// `None` when the position lies outside that cell.
pub fn world_pos_to_voxel_index(
    world_pos: Vec3,
    chunk: IVec3,
    chunk_world_size: f32,
    voxel_dim: u32,
) -> Option<UVec3> {
    let cell_min =
        chunk_origin_world_3d(chunk, chunk_world_size) - Vec3::splat(chunk_world_size * 0.5);
    let relative = world_pos - cell_min;
    if relative.min_element() < 0.0 {
        return None;
    }
    let voxel_size = sample_spacing(chunk_world_size, voxel_dim);
    let voxel = (relative / voxel_size).floor().as_uvec3();
    (voxel.max_element() < voxel_dim).then_some(voxel)
}

// ---------------------------------------------------------------------------
// Cluster space
// ---------------------------------------------------------------------------

/// Chunk coordinate of slot `chunk_in_cluster` of the cluster at `cluster_lower_chunk`.
#[inline]
pub fn cluster_chunk_coord(
    cluster_lower_chunk: IVec2,
    chunk_in_cluster: u32,
    cluster_dim: u32,
) -> IVec2 {
    cluster_lower_chunk + sample_to_local_xy(chunk_in_cluster, cluster_dim).as_ivec2()
}

/// Index of the aligned cluster containing `chunk`, in cluster units.
#[inline]
pub fn chunk_coord_to_cluster_coord(chunk: IVec2, cluster_dim: u32) -> IVec2 {
    chunk.div_euclid(IVec2::splat(cluster_dim as i32))
}

/// Lower-corner chunk of the aligned cluster `cluster` (in cluster units).
#[inline]
pub fn cluster_coord_to_min_chunk_coord(cluster: IVec2, cluster_dim: u32) -> IVec2 {
    cluster * cluster_dim as i32
}

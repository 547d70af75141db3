//! Validated grid dimensions shared by every generator and consumer.

use glam::{IVec2, IVec3, Vec2, Vec3};
use thiserror::Error;

use crate::{
    chunk_origin_world, chunk_origin_world_3d, cluster_chunk_coord, sample_spacing,
    sample_to_local_xy, sample_to_local_xyz,
};

/// Errors raised when grid tunables cannot describe a usable chunk layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// A dimension is smaller than its minimum.
    #[error("{name} must be at least {min}, got {value}")]
    DimensionTooSmall {
        name: &'static str,
        min: u32,
        value: u32,
    },
    /// The chunk world size is zero, negative, or not finite.
    #[error("chunk world size must be finite and positive, got {0}")]
    InvalidWorldSize(f32),
    /// The chunk coordinate limit is negative.
    #[error("max chunk coordinate must be non-negative, got {0}")]
    InvalidCoordLimit(i32),
    /// A derived element count overflows `u32` sample indices.
    #[error("{name} overflows the sample index range")]
    TooManySamples { name: &'static str },
}

/// Dimensions of the sample → chunk → cluster hierarchy.
///
/// Construct through [`ChunkGrid::new`] so the interpolation denominator
/// (`noise_samples_per_dim - 1`) and voxel spacing are never zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkGrid {
    chunk_voxel_dim: u32,
    noise_samples_per_dim: u32,
    cluster_dim: u32,
    chunk_world_size: f32,
    max_chunk_coord: i32,
}

impl Default for ChunkGrid {
    /// 32³ voxels, 9×9 heightmap samples, 5×5 clusters, 50-unit chunks.
    fn default() -> Self {
        Self {
            chunk_voxel_dim: 32,
            noise_samples_per_dim: 9,
            cluster_dim: 5,
            chunk_world_size: 50.0,
            max_chunk_coord: i16::MAX as i32,
        }
    }
}

impl ChunkGrid {
    /// Validate and build a grid. Chunk coordinates are limited to
    /// `±i16::MAX` until [`with_max_chunk_coord`](Self::with_max_chunk_coord).
    pub fn new(
        chunk_voxel_dim: u32,
        noise_samples_per_dim: u32,
        cluster_dim: u32,
        chunk_world_size: f32,
    ) -> Result<Self, GridError> {
        check_min("chunk_voxel_dim", chunk_voxel_dim, 2)?;
        check_min("noise_samples_per_dim", noise_samples_per_dim, 2)?;
        check_min("cluster_dim", cluster_dim, 1)?;
        if !chunk_world_size.is_finite() || chunk_world_size <= 0.0 {
            return Err(GridError::InvalidWorldSize(chunk_world_size));
        }
        chunk_voxel_dim
            .checked_pow(3)
            .ok_or(GridError::TooManySamples { name: "voxels per chunk" })?;
        noise_samples_per_dim
            .checked_pow(2)
            .and_then(|s| s.checked_mul(cluster_dim.checked_pow(2)?))
            .ok_or(GridError::TooManySamples { name: "samples per cluster" })?;

        Ok(Self {
            chunk_voxel_dim,
            noise_samples_per_dim,
            cluster_dim,
            chunk_world_size,
            max_chunk_coord: i16::MAX as i32,
        })
    }

    /// Replace the largest accepted absolute chunk coordinate.
    pub fn with_max_chunk_coord(mut self, max_chunk_coord: i32) -> Result<Self, GridError> {
        if max_chunk_coord < 0 {
            return Err(GridError::InvalidCoordLimit(max_chunk_coord));
        }
        self.max_chunk_coord = max_chunk_coord;
        Ok(self)
    }

    pub fn chunk_voxel_dim(&self) -> u32 {
        self.chunk_voxel_dim
    }

    pub fn noise_samples_per_dim(&self) -> u32 {
        self.noise_samples_per_dim
    }

    pub fn cluster_dim(&self) -> u32 {
        self.cluster_dim
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_world_size
    }

    pub fn max_chunk_coord(&self) -> i32 {
        self.max_chunk_coord
    }

    /// Voxels in one density chunk (`chunk_voxel_dim³`).
    pub fn voxels_per_chunk(&self) -> u32 {
        self.chunk_voxel_dim.pow(3)
    }

    /// Heightmap samples in one chunk (`noise_samples_per_dim²`).
    pub fn samples_per_chunk(&self) -> u32 {
        self.noise_samples_per_dim.pow(2)
    }

    /// Chunk slots in one cluster (`cluster_dim²`).
    pub fn chunks_per_cluster(&self) -> u32 {
        self.cluster_dim.pow(2)
    }

    /// Heightmap samples in one cluster.
    pub fn samples_per_cluster(&self) -> u32 {
        self.chunks_per_cluster() * self.samples_per_chunk()
    }

    /// World distance between neighbouring heightmap samples.
    pub fn sample_spacing(&self) -> f32 {
        sample_spacing(self.chunk_world_size, self.noise_samples_per_dim)
    }

    /// World distance between neighbouring voxels.
    pub fn voxel_spacing(&self) -> f32 {
        sample_spacing(self.chunk_world_size, self.chunk_voxel_dim)
    }

    /// Side length of a cluster in world units.
    pub fn cluster_world_size(&self) -> f32 {
        self.chunk_world_size * self.cluster_dim as f32
    }

    /// World-space lower corner of `chunk`.
    pub fn chunk_origin(&self, chunk: IVec2) -> Vec2 {
        chunk_origin_world(chunk, self.chunk_world_size)
    }

    /// World-space lower corner of a 3D `chunk`.
    pub fn chunk_origin_3d(&self, chunk: IVec3) -> Vec3 {
        chunk_origin_world_3d(chunk, self.chunk_world_size)
    }

    /// Chunk occupying slot `chunk_in_cluster` of the cluster at `cluster_lower_chunk`.
    pub fn cluster_chunk(&self, cluster_lower_chunk: IVec2, chunk_in_cluster: u32) -> IVec2 {
        cluster_chunk_coord(cluster_lower_chunk, chunk_in_cluster, self.cluster_dim)
    }

    /// World position of heightmap sample `sample` of the chunk starting at `chunk_origin`.
    #[inline]
    pub fn sample_world_pos(&self, chunk_origin: Vec2, sample: u32) -> Vec2 {
        let local = sample_to_local_xy(sample, self.noise_samples_per_dim);
        chunk_origin + local.as_vec2() * self.sample_spacing()
    }

    /// World position of voxel `index` of the chunk starting at `chunk_origin`.
    #[inline]
    pub fn voxel_world_pos(&self, chunk_origin: Vec3, index: u32) -> Vec3 {
        let local = sample_to_local_xyz(index, self.chunk_voxel_dim);
        chunk_origin + local.as_vec3() * self.voxel_spacing()
    }

    /// Whether every axis of `chunk` lies within `±max_chunk_coord`.
    pub fn contains_chunk(&self, chunk: IVec2) -> bool {
        chunk.as_i64vec2().abs().max_element() <= self.max_chunk_coord as i64
    }

    /// Whether every axis of a 3D `chunk` lies within `±max_chunk_coord`.
    pub fn contains_chunk_3d(&self, chunk: IVec3) -> bool {
        chunk.as_i64vec3().abs().max_element() <= self.max_chunk_coord as i64
    }

    /// Whether every chunk of the cluster at `cluster_lower_chunk` is in range.
    pub fn contains_cluster(&self, cluster_lower_chunk: IVec2) -> bool {
        let lower = cluster_lower_chunk.as_i64vec2();
        let far = lower + self.cluster_dim as i64 - 1;
        let limit = self.max_chunk_coord as i64;
        lower.abs().max_element() <= limit && far.abs().max_element() <= limit
    }
}

fn check_min(name: &'static str, value: u32, min: u32) -> Result<(), GridError> {
    if value < min {
        return Err(GridError::DimensionTooSmall { name, min, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_counts() {
        let grid = ChunkGrid::default();
        assert_eq!(grid.voxels_per_chunk(), 32_768);
        assert_eq!(grid.samples_per_chunk(), 81);
        assert_eq!(grid.chunks_per_cluster(), 25);
        assert_eq!(grid.samples_per_cluster(), 2025);
        assert_eq!(grid.cluster_world_size(), 250.0);
    }

    #[test]
    fn test_new_matches_default() {
        let grid = ChunkGrid::new(32, 9, 5, 50.0).unwrap();
        assert_eq!(grid, ChunkGrid::default());
    }

    #[test]
    fn test_single_noise_sample_rejected() {
        let err = ChunkGrid::new(32, 1, 5, 50.0).unwrap_err();
        assert_eq!(
            err,
            GridError::DimensionTooSmall {
                name: "noise_samples_per_dim",
                min: 2,
                value: 1
            }
        );
    }

    #[test]
    fn test_bad_world_size_rejected() {
        for size in [0.0, -12.0, f32::NAN, f32::INFINITY] {
            assert!(
                ChunkGrid::new(32, 9, 5, size).is_err(),
                "world size {size} should be rejected"
            );
        }
    }

    #[test]
    fn test_oversized_grid_rejected() {
        assert!(matches!(
            ChunkGrid::new(4096, 9, 5, 50.0),
            Err(GridError::TooManySamples { .. })
        ));
    }

    #[test]
    fn test_sample_world_pos_edges() {
        let grid = ChunkGrid::default();
        let origin = Vec2::new(100.0, -50.0);
        assert_eq!(grid.sample_world_pos(origin, 0), origin);
        assert_eq!(grid.sample_world_pos(origin, 80), origin + Vec2::splat(50.0));
        assert_eq!(grid.sample_world_pos(origin, 9), origin + Vec2::new(0.0, 6.25));
    }

    #[test]
    fn test_voxel_world_pos_last_voxel_on_edge() {
        let grid = ChunkGrid::new(32, 9, 5, 62.0).unwrap();
        let origin = Vec3::new(0.0, 62.0, 0.0);
        assert_eq!(grid.voxel_world_pos(origin, 0), origin);
        assert_eq!(
            grid.voxel_world_pos(origin, grid.voxels_per_chunk() - 1),
            origin + Vec3::splat(62.0)
        );
    }

    #[test]
    fn test_cluster_bounds_include_far_corner() {
        let grid = ChunkGrid::default().with_max_chunk_coord(10).unwrap();
        assert!(grid.contains_cluster(IVec2::new(6, -10)));
        assert!(!grid.contains_cluster(IVec2::new(7, 0)), "far corner x=11 is out of range");
        assert!(!grid.contains_cluster(IVec2::new(0, -11)));
        assert!(!grid.contains_cluster(IVec2::new(i32::MAX, 0)));
    }

    #[test]
    fn test_negative_coord_limit_rejected() {
        assert_eq!(
            ChunkGrid::default().with_max_chunk_coord(-1),
            Err(GridError::InvalidCoordLimit(-1))
        );
    }
}

//! Density field derived from the terrain heightmap.
//!
//! Each voxel stores its signed vertical distance to the terrain surface,
//! clamped to a band of [`SURFACE_BAND`] world units and quantized to the `i16`
//! range. Materials follow the distance: air above the surface, a one-unit skin
//! of grass (sand below sea level) and dirt underneath.

use glam::{Vec2, Vec3};
use strata_coords::{ChunkGrid, sample_to_local_xyz};

use crate::density::{DensityFunction, DensitySample, MaterialId};
use crate::error::GenerationError;
use crate::heightmap::upsample_heights;
use crate::terrain_noise::TerrainNoise;

/// Distances are clamped to `±SURFACE_BAND` before quantization.
pub const SURFACE_BAND: f32 = 10.0;

/// Depth below the surface where the grass or sand skin gives way to dirt.
pub const SKIN_DEPTH: f32 = 1.0;

const QUANT_SCALE: f32 = i16::MAX as f32 / SURFACE_BAND;

/// Map a distance in `[-SURFACE_BAND, SURFACE_BAND]` onto `[-i16::MAX, i16::MAX]`.
#[inline]
pub fn quantize_distance(distance: f32) -> i16 {
    (distance.clamp(-SURFACE_BAND, SURFACE_BAND) * QUANT_SCALE).round() as i16
}

/// Inverse of [`quantize_distance`], exact to within half a quantization step.
#[inline]
pub fn dequantize_distance(q: i16) -> f32 {
    q as f32 / QUANT_SCALE
}

/// Surface-distance density for one chunk, sampled from its heightmap.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightfieldDensity {
    voxel_dim: u32,
    /// Terrain height per voxel column, `z·voxel_dim + x`.
    column_heights: Box<[f32]>,
    sea_level: f32,
    solid_threshold: i16,
}

impl HeightfieldDensity {
    /// Build from a chunk's `noise_samples_per_dim²` heightmap, upsampled to one
    /// height per voxel column.
    pub fn new(grid: &ChunkGrid, chunk_heights: &[f32]) -> Result<Self, GenerationError> {
        let column_heights = upsample_heights(
            chunk_heights,
            grid.noise_samples_per_dim(),
            grid.chunk_voxel_dim(),
        )?;
        Ok(Self {
            voxel_dim: grid.chunk_voxel_dim(),
            column_heights: column_heights.into_boxed_slice(),
            sea_level: 0.0,
            solid_threshold: quantize_distance(-SKIN_DEPTH),
        })
    }

    /// Sample `noise` on the heightmap grid of the chunk at `chunk_origin`.
    pub fn from_noise(
        grid: &ChunkGrid,
        noise: &TerrainNoise,
        chunk_origin: Vec3,
    ) -> Result<Self, GenerationError> {
        let ground = Vec2::new(chunk_origin.x, chunk_origin.z);
        let heights: Vec<f32> = (0..grid.samples_per_chunk())
            .map(|sample| noise.height(grid.sample_world_pos(ground, sample)))
            .collect();
        Self::new(grid, &heights)
    }

    /// Voxels whose skin lies below `sea_level` become sand instead of grass.
    pub fn with_sea_level(mut self, sea_level: f32) -> Self {
        self.sea_level = sea_level;
        self
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    /// Upsampled terrain height of every voxel column.
    pub fn column_heights(&self) -> &[f32] {
        &self.column_heights
    }

    fn material(&self, distance: i16, world_y: f32) -> MaterialId {
        if distance >= 0 {
            MaterialId::EMPTY
        } else if distance < self.solid_threshold {
            MaterialId::DIRT
        } else if world_y < self.sea_level {
            MaterialId::SAND
        } else {
            MaterialId::GRASS
        }
    }
}

impl DensityFunction for HeightfieldDensity {
    fn sample(&self, index: u32, world_pos: Vec3) -> DensitySample {
        let local = sample_to_local_xyz(index, self.voxel_dim);
        let column = (local.z * self.voxel_dim + local.x) as usize;
        let height = self.column_heights.get(column).copied().unwrap_or(0.0);
        let distance = quantize_distance(world_pos.y - height);
        DensitySample {
            density: distance as i32,
            material: self.material(distance, world_pos.y),
        }
    }
}

//! Per-chunk 3D density and material fields.
//!
//! [`DensityFieldGenerator`] owns the index arithmetic (voxel index → chunk-local
//! position → world position → output slot) and delegates the value at each voxel
//! to a [`DensityFunction`]. The shipped [`RampDensity`] is a placeholder ramp;
//! volumetric terrain (signed distance fields, caves) plugs in through the trait
//! without touching the addressing.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use strata_coords::ChunkGrid;

use crate::error::GenerationError;

/// Material identifier written next to every density sample.
///
/// Ids index the renderer's texture atlas, so they stay small and
/// non-negative. Zero-initialized material memory reads as [`MaterialId::EMPTY`].
#[repr(transparent)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub const EMPTY: Self = Self(0);
    pub const DIRT: Self = Self(1);
    pub const GRASS: Self = Self(2);
    pub const SAND: Self = Self(3);
}

/// One voxel's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DensitySample {
    /// Signed density; the surface lies where the sign changes.
    pub density: i32,
    pub material: MaterialId,
}

/// Value of the density field at one voxel.
///
/// Called concurrently from many worker threads, once per voxel, with no
/// ordering between calls.
pub trait DensityFunction: Send + Sync {
    /// Density and material for voxel `index` located at `world_pos`.
    fn sample(&self, index: u32, world_pos: Vec3) -> DensitySample;
}

/// Placeholder field: density `index + 1`, material dirt everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct RampDensity;

impl DensityFunction for RampDensity {
    #[inline]
    fn sample(&self, index: u32, _world_pos: Vec3) -> DensitySample {
        DensitySample {
            density: index as i32 + 1,
            material: MaterialId::DIRT,
        }
    }
}

impl<F> DensityFunction for F
where
    F: Fn(u32, Vec3) -> DensitySample + Send + Sync,
{
    fn sample(&self, index: u32, world_pos: Vec3) -> DensitySample {
        self(index, world_pos)
    }
}

/// A fully generated chunk: one density and one material per voxel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkDensity {
    pub densities: Box<[i32]>,
    pub materials: Box<[MaterialId]>,
}

impl ChunkDensity {
    /// Material ids as raw bytes, ready for a 3D material texture upload.
    pub fn material_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }

    /// Whether a surface crosses this chunk.
    pub fn has_surface(&self) -> bool {
        chunk_has_surface(&self.densities)
    }

    /// Whether every voxel holds the same density and material.
    ///
    /// Uniform chunks (solid rock, open air) need no mesh and can be stored as a
    /// single value.
    pub fn is_uniform(&self) -> bool {
        let same_density = self.densities.windows(2).all(|w| w[0] == w[1]);
        same_density && self.materials.windows(2).all(|w| w[0] == w[1])
    }
}

/// True when the field holds both a positive and a negative density.
///
/// Zero densities are on the surface itself and count as neither side.
pub fn chunk_has_surface(densities: &[i32]) -> bool {
    let mut has_positive = false;
    let mut has_negative = false;
    for &density in densities {
        has_positive |= density > 0;
        has_negative |= density < 0;
        if has_positive && has_negative {
            return true;
        }
    }
    false
}

/// Produces a chunk's density/material grid from its world-space origin.
#[derive(Clone, Debug)]
pub struct DensityFieldGenerator<F = RampDensity> {
    grid: ChunkGrid,
    function: F,
}

impl DensityFieldGenerator<RampDensity> {
    /// Generator using the placeholder ramp.
    pub fn new(grid: ChunkGrid) -> Self {
        Self::with_function(grid, RampDensity)
    }
}

impl<F: DensityFunction> DensityFieldGenerator<F> {
    /// Generator using a custom density function.
    pub fn with_function(grid: ChunkGrid, function: F) -> Self {
        Self { grid, function }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn function(&self) -> &F {
        &self.function
    }

    /// Work-item body: write voxel `index` of the chunk at `chunk_origin`.
    ///
    /// `first_index` is the voxel index stored at `densities[0]`, which lets a
    /// worker own any contiguous run of the chunk. Indices outside the chunk or
    /// outside the provided slices are skipped.
    #[inline]
    pub fn write_sample(
        &self,
        chunk_origin: Vec3,
        index: u32,
        first_index: u32,
        densities: &mut [i32],
        materials: &mut [MaterialId],
    ) {
        if index >= self.grid.voxels_per_chunk() || index < first_index {
            return;
        }
        let slot = (index - first_index) as usize;
        let (Some(density), Some(material)) = (densities.get_mut(slot), materials.get_mut(slot))
        else {
            return;
        };
        let world_pos = self.grid.voxel_world_pos(chunk_origin, index);
        let sample = self.function.sample(index, world_pos);
        *density = sample.density;
        *material = sample.material;
    }

    /// Fill caller-owned buffers with the whole chunk at `chunk_origin`.
    pub fn fill_chunk(
        &self,
        chunk_origin: Vec3,
        densities: &mut [i32],
        materials: &mut [MaterialId],
    ) -> Result<(), GenerationError> {
        check_origin(chunk_origin)?;
        let expected = self.grid.voxels_per_chunk() as usize;
        for actual in [densities.len(), materials.len()] {
            if actual != expected {
                return Err(GenerationError::BufferSizeMismatch { expected, actual });
            }
        }
        for index in 0..self.grid.voxels_per_chunk() {
            self.write_sample(chunk_origin, index, 0, densities, materials);
        }
        Ok(())
    }

    /// Generate the chunk at `chunk_origin` into freshly allocated buffers.
    pub fn generate_chunk(&self, chunk_origin: Vec3) -> Result<ChunkDensity, GenerationError> {
        let len = self.grid.voxels_per_chunk() as usize;
        let mut densities = vec![0; len].into_boxed_slice();
        let mut materials = vec![MaterialId::EMPTY; len].into_boxed_slice();
        self.fill_chunk(chunk_origin, &mut densities, &mut materials)?;
        Ok(ChunkDensity {
            densities,
            materials,
        })
    }
}

pub(crate) fn check_origin(origin: Vec3) -> Result<(), GenerationError> {
    if origin.is_finite() {
        Ok(())
    } else {
        Err(GenerationError::NonFiniteOrigin(origin.to_string()))
    }
}

//! Terrain sample generation: a deterministic fractal height function, per-chunk
//! density fields, and heightmaps for single chunks, clusters of chunks, or whole
//! batches of clusters, dispatched in parallel.

mod async_generation;
mod density;
mod dispatch;
mod error;
mod heightfield;
mod heightmap;
mod settings;
mod terrain_noise;

pub use async_generation::{AsyncBatchGenerator, BatchId, CompletedBatch};
pub use density::{
    ChunkDensity, DensityFieldGenerator, DensityFunction, DensitySample, MaterialId, RampDensity,
    chunk_has_surface,
};
pub use dispatch::{BatchDispatcher, HeightBatch};
pub use error::{GenerationError, IndexAxis};
pub use heightfield::{
    HeightfieldDensity, SKIN_DEPTH, SURFACE_BAND, dequantize_distance, quantize_distance,
};
pub use heightmap::{
    HeightLayout, HeightRequest, HeightmapGenerator, WORKGROUP_WIDTH, WorkItem,
    heights_contain_surface, upsample_heights,
};
pub use settings::grid_from_config;
pub use terrain_noise::{NoiseParams, TerrainNoise, hash, value_noise};

//! Heightmap generation at three granularities: one chunk, one cluster, or a batch
//! of clusters.
//!
//! All three run the same per-sample kernel. A work-item is addressed by
//! `(cluster, chunk_in_cluster, sample)`; [`HeightLayout`] turns that triple into
//! the flat output index and rejects anything outside the request, and
//! [`HeightRequest`] turns it into the chunk's world origin. Single-chunk and
//! single-cluster requests are batches with the leading axes fixed at one entry.

use glam::{IVec2, Vec2};
use strata_coords::ChunkGrid;

use crate::error::{GenerationError, IndexAxis};
use crate::terrain_noise::TerrainNoise;

/// Work-items are issued in groups of this many samples; the tail of the last
/// group runs past the chunk and must be a no-op.
pub const WORKGROUP_WIDTH: u32 = 64;

/// One logical unit of heightmap work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub cluster: u32,
    pub chunk_in_cluster: u32,
    pub sample: u32,
}

impl WorkItem {
    pub fn new(cluster: u32, chunk_in_cluster: u32, sample: u32) -> Self {
        Self {
            cluster,
            chunk_in_cluster,
            sample,
        }
    }
}

/// Shape of a flat height buffer: `cluster_count × chunks_per_cluster × samples_per_chunk`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightLayout {
    samples_per_chunk: u32,
    chunks_per_cluster: u32,
    cluster_count: u32,
}

impl HeightLayout {
    /// One chunk: the output index is the sample index.
    pub fn single_chunk(grid: &ChunkGrid) -> Self {
        Self {
            samples_per_chunk: grid.samples_per_chunk(),
            chunks_per_cluster: 1,
            cluster_count: 1,
        }
    }

    /// One cluster of `cluster_dim²` chunks.
    pub fn single_cluster(grid: &ChunkGrid) -> Self {
        Self::batch(grid, 1)
    }

    /// `cluster_count` clusters laid out back to back in request order.
    pub fn batch(grid: &ChunkGrid, cluster_count: u32) -> Self {
        Self {
            samples_per_chunk: grid.samples_per_chunk(),
            chunks_per_cluster: grid.chunks_per_cluster(),
            cluster_count,
        }
    }

    pub fn samples_per_chunk(&self) -> usize {
        self.samples_per_chunk as usize
    }

    pub fn chunks_per_cluster(&self) -> usize {
        self.chunks_per_cluster as usize
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count as usize
    }

    /// Total chunk slots across all clusters.
    pub fn chunk_count(&self) -> usize {
        self.cluster_count() * self.chunks_per_cluster()
    }

    /// Number of `f32` heights the buffer must hold.
    pub fn len(&self) -> usize {
        self.chunk_count() * self.samples_per_chunk()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat output index of `item`, or `None` if any axis is out of range.
    #[inline]
    pub fn output_index(&self, item: WorkItem) -> Option<usize> {
        if item.cluster >= self.cluster_count
            || item.chunk_in_cluster >= self.chunks_per_cluster
            || item.sample >= self.samples_per_chunk
        {
            return None;
        }
        Some(
            item.cluster as usize * self.chunks_per_cluster() * self.samples_per_chunk()
                + item.chunk_in_cluster as usize * self.samples_per_chunk()
                + item.sample as usize,
        )
    }

    /// Inverse of [`output_index`](Self::output_index).
    pub fn work_item(&self, index: usize) -> Option<WorkItem> {
        if index >= self.len() {
            return None;
        }
        let spc = self.samples_per_chunk();
        let chunk = index / spc;
        Some(WorkItem::new(
            (chunk / self.chunks_per_cluster()) as u32,
            (chunk % self.chunks_per_cluster()) as u32,
            (index % spc) as u32,
        ))
    }

    /// Heights of one chunk slot inside a buffer with this layout.
    pub fn chunk_slice<'a>(
        &self,
        heights: &'a [f32],
        cluster: usize,
        chunk_in_cluster: usize,
    ) -> Result<&'a [f32], GenerationError> {
        self.check_buffer(heights.len())?;
        check_index(IndexAxis::Cluster, cluster, self.cluster_count())?;
        check_index(
            IndexAxis::ChunkInCluster,
            chunk_in_cluster,
            self.chunks_per_cluster(),
        )?;
        let start = (cluster * self.chunks_per_cluster() + chunk_in_cluster) * self.samples_per_chunk();
        Ok(&heights[start..start + self.samples_per_chunk()])
    }

    /// Heights of one whole cluster inside a buffer with this layout.
    pub fn cluster_slice<'a>(
        &self,
        heights: &'a [f32],
        cluster: usize,
    ) -> Result<&'a [f32], GenerationError> {
        self.check_buffer(heights.len())?;
        check_index(IndexAxis::Cluster, cluster, self.cluster_count())?;
        let len = self.chunks_per_cluster() * self.samples_per_chunk();
        Ok(&heights[cluster * len..(cluster + 1) * len])
    }

    /// Fail unless a buffer of `actual` elements matches this layout exactly.
    pub fn check_buffer(&self, actual: usize) -> Result<(), GenerationError> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(GenerationError::BufferSizeMismatch {
                expected: self.len(),
                actual,
            })
        }
    }
}

fn check_index(axis: IndexAxis, index: usize, len: usize) -> Result<(), GenerationError> {
    if index < len {
        Ok(())
    } else {
        Err(GenerationError::OutOfRange { axis, index, len })
    }
}

/// What a heightmap dispatch covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeightRequest<'a> {
    /// One chunk given by its world-space lower corner.
    Chunk { origin: Vec2 },
    /// One cluster given by its lower-corner chunk.
    Cluster { lower_chunk: IVec2 },
    /// Many clusters, each given by its lower-corner chunk, in output order.
    Batch { clusters: &'a [IVec2] },
}

impl HeightRequest<'_> {
    /// Buffer layout for this request.
    pub fn layout(&self, grid: &ChunkGrid) -> HeightLayout {
        match self {
            Self::Chunk { .. } => HeightLayout::single_chunk(grid),
            Self::Cluster { .. } => HeightLayout::single_cluster(grid),
            Self::Batch { clusters } => HeightLayout::batch(grid, clusters.len() as u32),
        }
    }

    /// World origin of the chunk in slot `(cluster, chunk_in_cluster)`.
    ///
    /// Assumes the indices were already range-checked by the layout.
    #[inline]
    fn chunk_origin(&self, grid: &ChunkGrid, cluster: u32, chunk_in_cluster: u32) -> Option<Vec2> {
        match *self {
            Self::Chunk { origin } => Some(origin),
            Self::Cluster { lower_chunk } => {
                Some(grid.chunk_origin(grid.cluster_chunk(lower_chunk, chunk_in_cluster)))
            }
            Self::Batch { clusters } => clusters
                .get(cluster as usize)
                .map(|&lower| grid.chunk_origin(grid.cluster_chunk(lower, chunk_in_cluster))),
        }
    }

    /// Chunk coordinate stored in slot `(cluster, chunk_in_cluster)`.
    ///
    /// `None` for single-chunk requests, which are addressed by world origin.
    pub fn chunk_coord(&self, grid: &ChunkGrid, cluster: u32, chunk_in_cluster: u32) -> Option<IVec2> {
        match *self {
            Self::Chunk { .. } => None,
            Self::Cluster { lower_chunk } => Some(grid.cluster_chunk(lower_chunk, chunk_in_cluster)),
            Self::Batch { clusters } => clusters
                .get(cluster as usize)
                .map(|&lower| grid.cluster_chunk(lower, chunk_in_cluster)),
        }
    }
}

/// Evaluates terrain heights on the chunk sample grid.
#[derive(Clone, Debug)]
pub struct HeightmapGenerator {
    grid: ChunkGrid,
    noise: TerrainNoise,
}

impl HeightmapGenerator {
    pub fn new(grid: ChunkGrid, noise: TerrainNoise) -> Self {
        Self { grid, noise }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn noise(&self) -> &TerrainNoise {
        &self.noise
    }

    /// Height of sample `sample` of the chunk whose lower corner is `chunk_origin`.
    #[inline]
    pub fn sample_height(&self, chunk_origin: Vec2, sample: u32) -> f32 {
        self.noise
            .height(self.grid.sample_world_pos(chunk_origin, sample))
    }

    /// The kernel: output slot and height for one work-item, or `None` when the
    /// item falls outside the request.
    #[inline]
    pub fn evaluate(&self, request: &HeightRequest<'_>, item: WorkItem) -> Option<(usize, f32)> {
        let index = request.layout(&self.grid).output_index(item)?;
        let origin = request.chunk_origin(&self.grid, item.cluster, item.chunk_in_cluster)?;
        Some((index, self.sample_height(origin, item.sample)))
    }

    /// Run one work-item against a full output buffer. Out-of-range items and
    /// indices past the end of `out` write nothing.
    #[inline]
    pub fn run_item(&self, request: &HeightRequest<'_>, item: WorkItem, out: &mut [f32]) {
        if let Some((index, height)) = self.evaluate(request, item)
            && let Some(slot) = out.get_mut(index)
        {
            *slot = height;
        }
    }

    /// Run every sample work-item of one chunk slot into that slot's sub-slice.
    ///
    /// Samples are issued in whole workgroups, so ids up to the next multiple of
    /// [`WORKGROUP_WIDTH`] are visited and the overhang is skipped by the kernel.
    pub fn run_chunk_slot(
        &self,
        request: &HeightRequest<'_>,
        cluster: u32,
        chunk_in_cluster: u32,
        slot: &mut [f32],
    ) {
        let layout = request.layout(&self.grid);
        let Some(base) = layout.output_index(WorkItem::new(cluster, chunk_in_cluster, 0)) else {
            return;
        };
        let issued = self.grid.samples_per_chunk().div_ceil(WORKGROUP_WIDTH) * WORKGROUP_WIDTH;
        for sample in 0..issued {
            let item = WorkItem::new(cluster, chunk_in_cluster, sample);
            if let Some((index, height)) = self.evaluate(request, item)
                && let Some(out) = slot.get_mut(index - base)
            {
                *out = height;
            }
        }
    }

    /// Sequentially generate the whole request into `out`.
    pub fn fill(&self, request: &HeightRequest<'_>, out: &mut [f32]) -> Result<(), GenerationError> {
        let layout = request.layout(&self.grid);
        layout.check_buffer(out.len())?;
        for (chunk, slot) in out.chunks_mut(layout.samples_per_chunk()).enumerate() {
            let cluster = (chunk / layout.chunks_per_cluster()) as u32;
            let chunk_in_cluster = (chunk % layout.chunks_per_cluster()) as u32;
            self.run_chunk_slot(request, cluster, chunk_in_cluster, slot);
        }
        Ok(())
    }

    /// Sequentially generate one chunk's heights.
    pub fn chunk_heights(&self, chunk_origin: Vec2) -> Vec<f32> {
        (0..self.grid.samples_per_chunk())
            .map(|sample| self.sample_height(chunk_origin, sample))
            .collect()
    }
}

/// Whether a chunk spanning `[chunk_bottom, chunk_bottom + chunk_height)`
/// vertically intersects the terrain described by `heights`.
pub fn heights_contain_surface(chunk_bottom: f32, chunk_height: f32, heights: &[f32]) -> bool {
    let (min, max) = heights
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    max >= chunk_bottom && min < chunk_bottom + chunk_height
}

/// Bilinearly resample a `samples_per_dim²` heightmap onto an `out_dim²` grid
/// covering the same chunk. Corner values are preserved exactly.
pub fn upsample_heights(
    samples: &[f32],
    samples_per_dim: u32,
    out_dim: u32,
) -> Result<Vec<f32>, GenerationError> {
    let n = samples_per_dim as usize;
    if samples_per_dim < 2 {
        return Err(GenerationError::OutOfRange {
            axis: IndexAxis::Sample,
            index: n,
            len: 2,
        });
    }
    if out_dim < 2 {
        return Err(GenerationError::OutOfRange {
            axis: IndexAxis::Sample,
            index: out_dim as usize,
            len: 2,
        });
    }
    if samples.len() != n * n {
        return Err(GenerationError::BufferSizeMismatch {
            expected: n * n,
            actual: samples.len(),
        });
    }

    let m = out_dim as usize;
    let last = (n - 1) as f32;
    let mut out = vec![0.0; m * m];
    for z in 0..m {
        let fz = z as f32 / (m - 1) as f32 * last;
        let z0 = (fz as usize).min(n - 1);
        let z1 = (z0 + 1).min(n - 1);
        let tz = fz - z0 as f32;
        for x in 0..m {
            let fx = x as f32 / (m - 1) as f32 * last;
            let x0 = (fx as usize).min(n - 1);
            let x1 = (x0 + 1).min(n - 1);
            let tx = fx - x0 as f32;

            let s00 = samples[z0 * n + x0];
            let s10 = samples[z0 * n + x1];
            let s01 = samples[z1 * n + x0];
            let s11 = samples[z1 * n + x1];
            let near = s00 + (s10 - s00) * tx;
            let far = s01 + (s11 - s01) * tx;
            out[z * m + x] = near + (far - near) * tz;
        }
    }
    Ok(out)
}
